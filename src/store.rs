//! Local favourites store.
//!
//! The store exclusively owns one SQLite table:
//!
//! ```sql
//! favourites(id INTEGER PRIMARY KEY, name TEXT NOT NULL, image_url TEXT,
//!            created_at DATETIME DEFAULT CURRENT_TIMESTAMP)
//! ```
//!
//! # Lifecycle
//!
//! A store starts uninitialized. [`SqliteFavouritesStore::initialize`]
//! opens the database and creates the table; until it succeeds every other
//! operation fails with `Error::NotInitialized`.
//!
//! # Failure policy
//!
//! Writes (`add`, `remove`) propagate storage errors. Reads (`exists`,
//! `list_all`) log them and return `false` / an empty list, so status icons
//! and list screens never fail because of the database.

use crate::config::DatabaseLocation;
use crate::error::{Error, Result};
use crate::model::FavouritePokemon;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::OnceCell;

/// Text layout of `created_at`: SQLite's `CURRENT_TIMESTAMP` plus microseconds.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Durable favourites set.
///
/// # Design for Testability
///
/// The synchronization layer only depends on this trait, so tests can
/// substitute a store that stalls or fails on demand.
#[allow(async_fn_in_trait)]
pub trait FavouritesRepository: Send + Sync {
    /// Insert or fully replace the record for `id`; `created_at` is reset.
    ///
    /// # Errors
    /// `Error::NotInitialized` or `Error::Storage`.
    async fn add(&self, id: u32, name: &str, image_url: Option<&str>) -> Result<()>;

    /// Delete the record for `id`. Absent ids are not an error.
    ///
    /// # Errors
    /// `Error::NotInitialized` or `Error::Storage`.
    async fn remove(&self, id: u32) -> Result<()>;

    /// Whether a record for `id` exists. Storage failures read as `false`.
    ///
    /// # Errors
    /// Only `Error::NotInitialized`.
    async fn exists(&self, id: u32) -> Result<bool>;

    /// All records, most recently favourited first. Storage failures read
    /// as an empty list.
    ///
    /// # Errors
    /// Only `Error::NotInitialized`.
    async fn list_all(&self) -> Result<Vec<FavouritePokemon>>;
}

#[derive(sqlx::FromRow)]
struct FavouriteRow {
    id: i64,
    name: String,
    image_url: Option<String>,
    created_at: Option<String>,
}

impl FavouriteRow {
    fn into_record(self) -> Option<FavouritePokemon> {
        let id = match u32::try_from(self.id) {
            Ok(id) => id,
            Err(_) => {
                warn!("Ignoring favourite with out-of-range id {}", self.id);
                return None;
            }
        };

        Some(FavouritePokemon {
            id,
            name: self.name,
            image_url: self.image_url.unwrap_or_default(),
            created_at: self
                .created_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        Ok(naive) => Some(Utc.from_utc_datetime(&naive)),
        Err(e) => {
            warn!("Unreadable favourite timestamp {:?}: {}", raw, e);
            None
        }
    }
}

/// SQLite-backed [`FavouritesRepository`].
pub struct SqliteFavouritesStore {
    location: DatabaseLocation,
    pool: OnceCell<SqlitePool>,
}

impl SqliteFavouritesStore {
    /// Create an uninitialized store for `location`. Nothing is opened yet.
    pub fn new(location: DatabaseLocation) -> Self {
        SqliteFavouritesStore {
            location,
            pool: OnceCell::new(),
        }
    }

    /// Store backed by a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(DatabaseLocation::Memory)
    }

    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// True once `initialize` has succeeded.
    pub fn is_ready(&self) -> bool {
        self.pool.initialized()
    }

    /// Open (or create) the database and ensure the table exists.
    ///
    /// Calling it again after success is a no-op.
    ///
    /// # Errors
    /// Returns `Error::Storage` if the database cannot be opened or the
    /// table cannot be created; the store stays uninitialized.
    pub async fn initialize(&self) -> Result<()> {
        self.pool
            .get_or_try_init(|| async {
                let pool = self.open().await.map_err(|e| {
                    error!("Failed to open favourites database: {}", e);
                    e
                })?;
                Self::create_tables(&pool).await?;
                info!("✓ Favourites store ready ({:?})", self.location);
                Ok::<_, Error>(pool)
            })
            .await?;
        Ok(())
    }

    /// Close the connection pool. The store stays ready, so later writes
    /// fail with `Error::Storage` and reads fall back to their defaults.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("Favourites store closed");
        }
    }

    async fn open(&self) -> Result<SqlitePool> {
        let options = match &self.location {
            DatabaseLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        Error::Storage(format!("cannot create {}: {}", parent.display(), e))
                    })?;
                }
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
            }
            DatabaseLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")?,
        };

        // One connection: an in-memory database lives and dies with it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options.busy_timeout(Duration::from_secs(5)))
            .await?;
        Ok(pool)
    }

    async fn create_tables(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS favourites (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                image_url TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    fn pool(&self) -> Result<&SqlitePool> {
        self.pool.get().ok_or(Error::NotInitialized)
    }
}

impl FavouritesRepository for SqliteFavouritesStore {
    async fn add(&self, id: u32, name: &str, image_url: Option<&str>) -> Result<()> {
        let pool = self.pool()?;
        let created_at = Utc::now().format(TIMESTAMP_FORMAT).to_string();

        sqlx::query(
            "INSERT OR REPLACE INTO favourites (id, name, image_url, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(i64::from(id))
        .bind(name)
        .bind(image_url.unwrap_or(""))
        .bind(&created_at)
        .execute(pool)
        .await
        .map_err(|e| {
            error!("Error adding favourite {}: {}", id, e);
            Error::from(e)
        })?;

        debug!("✓ Favourite {} ({}) stored at {}", id, name, created_at);
        Ok(())
    }

    async fn remove(&self, id: u32) -> Result<()> {
        let pool = self.pool()?;

        sqlx::query("DELETE FROM favourites WHERE id = ?")
            .bind(i64::from(id))
            .execute(pool)
            .await
            .map_err(|e| {
                error!("Error removing favourite {}: {}", id, e);
                Error::from(e)
            })?;

        debug!("✓ Favourite {} removed", id);
        Ok(())
    }

    async fn exists(&self, id: u32) -> Result<bool> {
        let pool = self.pool()?;

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM favourites WHERE id = ?")
            .bind(i64::from(id))
            .fetch_one(pool)
            .await;

        match count {
            Ok(count) => Ok(count > 0),
            Err(e) => {
                warn!("Error checking favourite status of {}: {}", id, e);
                Ok(false)
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<FavouritePokemon>> {
        let pool = self.pool()?;

        // `id` aliases the rowid, so equal timestamps order by id.
        let rows = sqlx::query_as::<_, FavouriteRow>(
            r#"
            SELECT id, name, image_url, CAST(created_at AS TEXT) AS created_at
            FROM favourites
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(pool)
        .await;

        match rows {
            Ok(rows) => Ok(rows
                .into_iter()
                .filter_map(FavouriteRow::into_record)
                .collect()),
            Err(e) => {
                warn!("Error listing favourites: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

// ============================================================================
// In-Memory Test Store
// ============================================================================

/// In-memory [`FavouritesRepository`] for tests.
///
/// Always ready. [`fail_writes`](Self::fail_writes) makes `add` / `remove`
/// return `Error::Storage` without touching the data, which is how rollback
/// paths are exercised; [`fail_writes_after`](Self::fail_writes_after) lets
/// a few writes through first. Clones share state.
#[derive(Clone)]
pub struct InMemoryFavouritesStore {
    records: Arc<Mutex<Vec<FavouritePokemon>>>,
    /// Index of the first write to reject; `usize::MAX` accepts all.
    fail_from: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl Default for InMemoryFavouritesStore {
    fn default() -> Self {
        InMemoryFavouritesStore {
            records: Arc::default(),
            fail_from: Arc::new(AtomicUsize::new(usize::MAX)),
            writes: Arc::default(),
        }
    }
}

impl InMemoryFavouritesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every write from now on, or accept them all again.
    pub fn fail_writes(&self, fail: bool) {
        let from = if fail { self.write_count() } else { usize::MAX };
        self.fail_from.store(from, Ordering::SeqCst);
    }

    /// Accept the next `accepted` writes, then reject the rest.
    pub fn fail_writes_after(&self, accepted: usize) {
        self.fail_from
            .store(self.write_count().saturating_add(accepted), Ordering::SeqCst);
    }

    /// Number of durable writes attempted, failed ones included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_write(&self, op: &str, id: u32) -> Result<()> {
        let index = self.writes.fetch_add(1, Ordering::SeqCst);
        if index >= self.fail_from.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("{} {} rejected", op, id)));
        }
        Ok(())
    }

    fn records(&self) -> MutexGuard<'_, Vec<FavouritePokemon>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FavouritesRepository for InMemoryFavouritesStore {
    async fn add(&self, id: u32, name: &str, image_url: Option<&str>) -> Result<()> {
        self.check_write("add", id)?;
        let mut records = self.records();
        records.retain(|fav| fav.id != id);
        records.insert(
            0,
            FavouritePokemon {
                id,
                name: name.to_string(),
                image_url: image_url.unwrap_or_default().to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn remove(&self, id: u32) -> Result<()> {
        self.check_write("remove", id)?;
        self.records().retain(|fav| fav.id != id);
        Ok(())
    }

    async fn exists(&self, id: u32) -> Result<bool> {
        Ok(self.records().iter().any(|fav| fav.id == id))
    }

    async fn list_all(&self) -> Result<Vec<FavouritePokemon>> {
        Ok(self.records().clone())
    }
}
