//! UI-facing projection of favourite state.
//!
//! Holds two kinds of entries, mirroring what screens read:
//!
//! - per-id favourite status (`bool`)
//! - the aggregate favourites list
//!
//! Each entry is either fresh (served as-is) or stale (served by nobody;
//! the next read re-validates it from the store). Optimistic updates write
//! fresh values and hand back a [`ProjectionSnapshot`] of what they
//! replaced; [`FavouritesProjection::restore`] puts that exact state back,
//! absence included.
//!
//! # Generations
//!
//! Every entry carries a generation that moves on each change: projection,
//! restore, invalidation or an unconditional set. A store read records the
//! generation before it starts and lands through
//! [`settle_status`](FavouritesProjection::settle_status) /
//! [`settle_favourites`](FavouritesProjection::settle_favourites), which
//! refuse the value if anything changed the entry in the meantime.

use crate::model::{FavouritePokemon, NewFavourite};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A projected value and whether it must be re-validated before use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Projected<T> {
    pub value: T,
    pub stale: bool,
}

impl<T> Projected<T> {
    pub fn fresh(value: T) -> Self {
        Projected {
            value,
            stale: false,
        }
    }
}

/// Entries as they were before an optimistic update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectionSnapshot {
    pub id: u32,
    pub status: Option<Projected<bool>>,
    pub favourites: Option<Projected<Vec<FavouritePokemon>>>,
}

type ListEntry = Option<Projected<Vec<FavouritePokemon>>>;

struct Slot<T> {
    entry: Option<Projected<T>>,
    generation: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot {
            entry: None,
            generation: 0,
        }
    }
}

impl<T> Slot<T> {
    fn replace(&mut self, entry: Option<Projected<T>>) {
        self.entry = entry;
        self.generation += 1;
    }

    fn mark_stale(&mut self) {
        if let Some(entry) = self.entry.as_mut() {
            entry.stale = true;
        }
        self.generation += 1;
    }

    /// Apply a read that began at `generation`, unless it was overtaken.
    fn settle(&mut self, generation: u64, value: T) -> bool {
        if self.generation != generation {
            return false;
        }
        self.entry = Some(Projected::fresh(value));
        true
    }
}

/// Shared projection cache; clones see the same entries.
#[derive(Clone, Default)]
pub struct FavouritesProjection {
    statuses: Arc<DashMap<u32, Slot<bool>>>,
    favourites: Arc<RwLock<Slot<Vec<FavouritePokemon>>>>,
}

impl FavouritesProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projected status for `id`, fresh or stale.
    pub fn status(&self, id: u32) -> Option<bool> {
        self.status_entry(id).map(|entry| entry.value)
    }

    pub fn status_entry(&self, id: u32) -> Option<Projected<bool>> {
        self.statuses.get(&id).and_then(|slot| slot.entry.clone())
    }

    /// Projected favourites list, fresh or stale.
    pub fn favourites(&self) -> Option<Vec<FavouritePokemon>> {
        self.favourites_entry().map(|entry| entry.value)
    }

    pub fn favourites_entry(&self) -> ListEntry {
        self.read_list().entry.clone()
    }

    /// Current generation of the status entry for `id`.
    pub fn status_generation(&self, id: u32) -> u64 {
        self.statuses.get(&id).map_or(0, |slot| slot.generation)
    }

    /// Current generation of the favourites list.
    pub fn favourites_generation(&self) -> u64 {
        self.read_list().generation
    }

    pub fn set_status(&self, id: u32, value: bool) {
        self.statuses
            .entry(id)
            .or_default()
            .replace(Some(Projected::fresh(value)));
    }

    pub fn set_favourites(&self, favourites: Vec<FavouritePokemon>) {
        self.write_list().replace(Some(Projected::fresh(favourites)));
    }

    /// Store `value` as the fresh status of `id` if the entry is still at
    /// `generation`. Returns whether it was applied.
    pub fn settle_status(&self, id: u32, generation: u64, value: bool) -> bool {
        self.statuses
            .entry(id)
            .or_default()
            .settle(generation, value)
    }

    /// Store `favourites` as the fresh list if it is still at `generation`.
    /// Returns whether it was applied.
    pub fn settle_favourites(&self, generation: u64, favourites: Vec<FavouritePokemon>) -> bool {
        self.write_list().settle(generation, favourites)
    }

    /// Apply the visible effect of toggling `item` and return what was
    /// there before.
    ///
    /// Status flips to `!was_favourite`. A loaded list loses the matching
    /// entry when un-favouriting, or gains a provisional record stamped
    /// `now` at the front when favouriting. A list that was never loaded
    /// stays unloaded, so the next read still goes to the store.
    pub fn project_toggle(
        &self,
        item: &NewFavourite,
        was_favourite: bool,
        now: DateTime<Utc>,
    ) -> ProjectionSnapshot {
        let mut list = self.write_list();
        let mut status = self.statuses.entry(item.id).or_default();
        let snapshot = ProjectionSnapshot {
            id: item.id,
            status: status.entry.clone(),
            favourites: list.entry.clone(),
        };

        status.replace(Some(Projected::fresh(!was_favourite)));

        let projected = list.entry.take().map(|entry| {
            let mut records = entry.value;
            records.retain(|fav| fav.id != item.id);
            if !was_favourite {
                records.insert(0, FavouritePokemon::provisional(item, now));
            }
            Projected::fresh(records)
        });
        list.replace(projected);

        snapshot
    }

    /// Put back exactly the entries captured in `snapshot`.
    pub fn restore(&self, snapshot: ProjectionSnapshot) {
        let mut list = self.write_list();
        self.statuses
            .entry(snapshot.id)
            .or_default()
            .replace(snapshot.status);
        list.replace(snapshot.favourites);
    }

    /// Mark the status of `id` stale. Reads of `id` already in flight are
    /// refused when they land, even if nothing was projected yet.
    pub fn invalidate_status(&self, id: u32) {
        self.statuses.entry(id).or_default().mark_stale();
    }

    pub fn invalidate_all_statuses(&self) {
        self.statuses.iter_mut().for_each(|mut slot| slot.mark_stale());
    }

    pub fn invalidate_favourites(&self) {
        self.write_list().mark_stale();
    }

    fn read_list(&self) -> RwLockReadGuard<'_, Slot<Vec<FavouritePokemon>>> {
        self.favourites
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_list(&self) -> RwLockWriteGuard<'_, Slot<Vec<FavouritePokemon>>> {
        self.favourites
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, name: &str) -> FavouritePokemon {
        FavouritePokemon {
            id,
            name: name.to_string(),
            image_url: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_project_favourite_prepends() {
        let projection = FavouritesProjection::new();
        projection.set_favourites(vec![record(1, "bulbasaur")]);

        let item = NewFavourite::new(4, "charmander").with_image_url("url4");
        projection.project_toggle(&item, false, Utc::now());

        let list = projection.favourites().unwrap();
        assert_eq!(list.iter().map(|f| f.id).collect::<Vec<_>>(), vec![4, 1]);
        assert_eq!(list[0].image_url, "url4");
        assert_eq!(projection.status(4), Some(true));
    }

    #[test]
    fn test_project_unfavourite_removes() {
        let projection = FavouritesProjection::new();
        projection.set_favourites(vec![record(4, "charmander"), record(1, "bulbasaur")]);
        projection.set_status(4, true);

        projection.project_toggle(&NewFavourite::new(4, "charmander"), true, Utc::now());

        assert_eq!(projection.favourites().unwrap().len(), 1);
        assert_eq!(projection.status(4), Some(false));
    }

    #[test]
    fn test_restore_brings_back_absence() {
        let projection = FavouritesProjection::new();

        let snapshot =
            projection.project_toggle(&NewFavourite::new(25, "pikachu"), false, Utc::now());
        assert!(projection.status_entry(25).is_some());

        projection.restore(snapshot);

        assert_eq!(projection.status_entry(25), None);
        assert_eq!(projection.favourites_entry(), None);
    }

    #[test]
    fn test_unloaded_list_stays_unloaded() {
        let projection = FavouritesProjection::new();
        let generation = projection.favourites_generation();

        projection.project_toggle(&NewFavourite::new(25, "pikachu"), false, Utc::now());

        assert_eq!(projection.favourites_entry(), None);
        assert_ne!(projection.favourites_generation(), generation);
    }

    #[test]
    fn test_read_overtaken_by_toggle_is_refused() {
        let projection = FavouritesProjection::new();
        projection.set_favourites(vec![record(1, "bulbasaur")]);
        let status_generation = projection.status_generation(4);
        let list_generation = projection.favourites_generation();

        projection.project_toggle(&NewFavourite::new(4, "charmander"), false, Utc::now());

        assert!(!projection.settle_status(4, status_generation, false));
        assert!(!projection.settle_favourites(list_generation, vec![record(1, "bulbasaur")]));
        assert_eq!(projection.status(4), Some(true));
        let ids: Vec<u32> = projection.favourites().unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![4, 1]);
    }

    #[test]
    fn test_read_overtaken_by_invalidation_is_refused() {
        let projection = FavouritesProjection::new();
        let generation = projection.status_generation(7);

        projection.invalidate_status(7);

        assert!(!projection.settle_status(7, generation, true));
        assert_eq!(projection.status_entry(7), None);

        let generation = projection.status_generation(7);
        assert!(projection.settle_status(7, generation, true));
        assert_eq!(projection.status_entry(7), Some(Projected::fresh(true)));
    }

    #[test]
    fn test_restore_brings_back_stale_flags() {
        let projection = FavouritesProjection::new();
        projection.set_status(25, false);
        projection.invalidate_status(25);
        projection.set_favourites(vec![]);
        projection.invalidate_favourites();

        let before_status = projection.status_entry(25);
        let before_list = projection.favourites_entry();

        let snapshot =
            projection.project_toggle(&NewFavourite::new(25, "pikachu"), false, Utc::now());
        projection.restore(snapshot);

        assert_eq!(projection.status_entry(25), before_status);
        assert_eq!(projection.favourites_entry(), before_list);
    }

    #[test]
    fn test_invalidate_all_statuses() {
        let projection = FavouritesProjection::new();
        projection.set_status(1, true);
        projection.set_status(2, false);

        projection.invalidate_all_statuses();

        assert!(projection.status_entry(1).unwrap().stale);
        assert!(projection.status_entry(2).unwrap().stale);
        assert_eq!(projection.status(1), Some(true));
    }
}
