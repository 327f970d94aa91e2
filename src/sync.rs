//! Optimistic synchronization between the favourites store and the
//! UI-facing projection.
//!
//! Screens read favourite state through [`FavouritesSync`], never from the
//! store directly. A toggle updates the projection before the durable write
//! is issued, so the UI shows the new state immediately:
//!
//! ```text
//! toggle() ──► snapshot ──► project ──► (future) store write
//!                                          │
//!                 ok ──────────────────────┼──────────────── err
//!                 mark stale               │        restore snapshot
//!                                          │
//!                          future dropped: restore, then mark stale
//!                                          ▼
//!                                   next read re-validates
//! ```
//!
//! Store reads that were overtaken by a toggle or an invalidation while in
//! flight are not written into the projection.
//!
//! Concurrent toggles of the same id are not serialized; the store is
//! last-writer-wins.

use crate::backend::CacheBackend;
use crate::client::CatalogClient;
use crate::error::Result;
use crate::model::{FavouritePokemon, NewFavourite, Pokemon};
use crate::projection::{FavouritesProjection, ProjectionSnapshot};
use crate::store::FavouritesRepository;
use crate::transport::CatalogTransport;
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Default size of [`FavouritesSync::recent_favourites`].
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Favourites as the presentation layer sees them.
pub struct FavouritesSync<S: FavouritesRepository> {
    store: Arc<S>,
    projection: FavouritesProjection,
}

impl<S: FavouritesRepository> Clone for FavouritesSync<S> {
    fn clone(&self) -> Self {
        FavouritesSync {
            store: Arc::clone(&self.store),
            projection: self.projection.clone(),
        }
    }
}

impl<S: FavouritesRepository> FavouritesSync<S> {
    /// Wrap an initialized store with an empty projection.
    pub fn new(store: Arc<S>) -> Self {
        FavouritesSync {
            store,
            projection: FavouritesProjection::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn projection(&self) -> &FavouritesProjection {
        &self.projection
    }

    /// Favourite status of `id`, re-validated from the store when the
    /// projection is missing or stale.
    ///
    /// # Errors
    /// Only `Error::NotInitialized`.
    pub async fn is_favourite(&self, id: u32) -> Result<bool> {
        if let Some(entry) = self.projection.status_entry(id) {
            if !entry.stale {
                return Ok(entry.value);
            }
        }

        let generation = self.projection.status_generation(id);
        let value = self.store.exists(id).await?;
        Ok(self.settle_status(id, generation, value))
    }

    /// All favourites, newest first, re-validated when the projection is
    /// missing or stale.
    ///
    /// # Errors
    /// Only `Error::NotInitialized`.
    pub async fn favourites(&self) -> Result<Vec<FavouritePokemon>> {
        if let Some(entry) = self.projection.favourites_entry() {
            if !entry.stale {
                return Ok(entry.value);
            }
        }

        let generation = self.projection.favourites_generation();
        let records = self.store.list_all().await?;
        if self.projection.settle_favourites(generation, records.clone()) {
            return Ok(records);
        }

        debug!("Favourites read overtaken while in flight, keeping the newer projection");
        Ok(self.projection.favourites().unwrap_or(records))
    }

    /// Flip the favourite state of `item`.
    ///
    /// The projection is updated before this returns; the returned future
    /// performs the durable write. It resolves to the new status, or to the
    /// store's error after the projection has been restored to exactly what
    /// it was before the call.
    ///
    /// Dropping the future before it resolves abandons the write. The
    /// projection is then restored and marked stale, so the next read goes
    /// to the store and sees however far the write got.
    pub fn toggle(
        &self,
        item: NewFavourite,
        was_favourite: bool,
    ) -> impl Future<Output = Result<bool>> + '_ {
        let snapshot = self.projection.project_toggle(&item, was_favourite, Utc::now());
        debug!(
            "Projected favourite {} as {}",
            item.id,
            if was_favourite { "removed" } else { "added" }
        );
        let mut pending = PendingToggle {
            projection: &self.projection,
            snapshot: Some(snapshot),
        };

        async move {
            let outcome = if was_favourite {
                self.store.remove(item.id).await
            } else {
                self.store
                    .add(item.id, &item.name, item.image_url.as_deref())
                    .await
            };
            let snapshot = pending.settle();

            match outcome {
                Ok(()) => {
                    self.projection.invalidate_status(item.id);
                    self.projection.invalidate_favourites();
                    debug!("✓ Favourite {} toggle persisted", item.id);
                    Ok(!was_favourite)
                }
                Err(e) => {
                    error!("Favourite {} toggle failed, rolling back: {}", item.id, e);
                    if let Some(snapshot) = snapshot {
                        self.projection.restore(snapshot);
                    }
                    Err(e)
                }
            }
        }
    }

    /// Full catalog entities for every favourite, newest favourite first.
    ///
    /// Entities that fail to load are left out.
    ///
    /// # Errors
    /// Only `Error::NotInitialized`.
    pub async fn favourites_with_details<T, B>(
        &self,
        client: &CatalogClient<T, B>,
    ) -> Result<Vec<Pokemon>>
    where
        T: CatalogTransport,
        B: CacheBackend,
    {
        let mut records = self.favourites().await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let fetched = join_all(records.iter().map(|fav| client.get_by_id(fav.id))).await;

        Ok(records
            .iter()
            .zip(fetched)
            .filter_map(|(fav, result)| match result {
                Ok(pokemon) => Some(pokemon),
                Err(e) => {
                    warn!("Leaving out favourite {} ({}): {}", fav.id, fav.name, e);
                    None
                }
            })
            .collect())
    }

    /// Remove every favourite, one durable delete at a time, then mark all
    /// favourite projections stale. Returns how many were removed.
    ///
    /// # Errors
    /// The first failing delete's error; earlier deletes stay applied.
    pub async fn clear_all(&self) -> Result<usize> {
        let records = self.store.list_all().await?;

        let mut removed = 0;
        let mut outcome = Ok(());
        for fav in &records {
            let result = self.store.remove(fav.id).await;
            self.projection.invalidate_status(fav.id);
            if let Err(e) = result {
                error!("Clearing favourites stopped at {}: {}", fav.id, e);
                outcome = Err(e);
                break;
            }
            removed += 1;
        }

        self.projection.invalidate_favourites();
        self.projection.invalidate_all_statuses();
        outcome?;

        info!("✓ Cleared {} favourites", removed);
        Ok(removed)
    }

    /// Status of each id in `ids`, read from the store concurrently.
    ///
    /// # Errors
    /// Only `Error::NotInitialized`.
    pub async fn bulk_favourite_status(&self, ids: &[u32]) -> Result<HashMap<u32, bool>> {
        let generations: Vec<u64> = ids
            .iter()
            .map(|&id| self.projection.status_generation(id))
            .collect();
        let results = join_all(ids.iter().map(|&id| self.store.exists(id))).await;

        let mut statuses = HashMap::with_capacity(ids.len());
        for ((&id, generation), result) in ids.iter().zip(generations).zip(results) {
            let value = self.settle_status(id, generation, result?);
            statuses.insert(id, value);
        }
        Ok(statuses)
    }

    /// Add each item in order, stopping at the first failure.
    ///
    /// # Errors
    /// The first failing write's error.
    pub async fn add_many(&self, items: &[NewFavourite]) -> Result<()> {
        let mut outcome = Ok(());
        for item in items {
            outcome = self
                .store
                .add(item.id, &item.name, item.image_url.as_deref())
                .await;
            self.projection.invalidate_status(item.id);
            if outcome.is_err() {
                break;
            }
        }

        self.projection.invalidate_favourites();
        outcome
    }

    /// Remove each id in order, stopping at the first failure.
    ///
    /// # Errors
    /// The first failing write's error.
    pub async fn remove_many(&self, ids: &[u32]) -> Result<()> {
        let mut outcome = Ok(());
        for &id in ids {
            outcome = self.store.remove(id).await;
            self.projection.invalidate_status(id);
            if outcome.is_err() {
                break;
            }
        }

        self.projection.invalidate_favourites();
        outcome
    }

    pub async fn favourite_count(&self) -> Result<usize> {
        Ok(self.favourites().await?.len())
    }

    /// Favourites with details whose name contains `term` (ignoring case)
    /// or whose id contains it as digits. A blank term matches everything.
    pub async fn search_favourites<T, B>(
        &self,
        client: &CatalogClient<T, B>,
        term: &str,
    ) -> Result<Vec<Pokemon>>
    where
        T: CatalogTransport,
        B: CacheBackend,
    {
        let all = self.favourites_with_details(client).await?;
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Ok(all);
        }

        Ok(all
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&term) || p.id.to_string().contains(&term))
            .collect())
    }

    /// The `limit` most recently added favourites.
    pub async fn recent_favourites(&self, limit: usize) -> Result<Vec<FavouritePokemon>> {
        let mut records = self.favourites().await?;
        records.truncate(limit);
        Ok(records)
    }

    /// Land a status read that began at `generation`. An overtaken read
    /// reports the newer projected value instead.
    fn settle_status(&self, id: u32, generation: u64, value: bool) -> bool {
        if self.projection.settle_status(id, generation, value) {
            return value;
        }
        debug!("Status read for {} overtaken while in flight", id);
        self.projection.status(id).unwrap_or(value)
    }
}

/// Projection snapshot held by an unfinished toggle.
///
/// If the toggle future is dropped before its write settles, the snapshot
/// is restored and both entries are marked stale.
struct PendingToggle<'a> {
    projection: &'a FavouritesProjection,
    snapshot: Option<ProjectionSnapshot>,
}

impl PendingToggle<'_> {
    fn settle(&mut self) -> Option<ProjectionSnapshot> {
        self.snapshot.take()
    }
}

impl Drop for PendingToggle<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            let id = snapshot.id;
            warn!("Favourite {} toggle abandoned before its write settled", id);
            self.projection.restore(snapshot);
            self.projection.invalidate_status(id);
            self.projection.invalidate_favourites();
        }
    }
}
