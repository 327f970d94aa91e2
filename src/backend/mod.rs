//! Response cache backends.

use crate::error::Result;
use std::time::Duration;

pub mod inmemory;

pub use inmemory::InMemoryBackend;

/// Storage for memoized catalog responses.
///
/// Keys are [`RequestKey`](crate::key::RequestKey) strings, values are
/// enveloped payload bytes. A backend must treat an entry as absent once it
/// is `ttl` old; it never evicts by size.
///
/// **IMPORTANT:** All methods use `&self`; implementations rely on interior
/// mutability so one backend can be shared by every clone of a client.
#[allow(async_fn_in_trait)]
pub trait CacheBackend: Send + Sync + Clone {
    /// Retrieve a still-valid value.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - entry present and younger than its TTL
    /// - `Ok(None)` - never stored, overwritten by a clear, or expired
    ///
    /// # Errors
    /// Returns `Err` if the backend itself fails
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value, unconditionally replacing any previous entry.
    ///
    /// `ttl` of `None` keeps the entry until it is overwritten or cleared.
    ///
    /// # Errors
    /// Returns `Err` if the backend itself fails
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Remove a single entry.
    ///
    /// # Errors
    /// Returns `Err` if the backend itself fails
    async fn delete(&self, key: &str) -> Result<()>;

    /// Drop every entry.
    ///
    /// # Errors
    /// Returns `Err` if the backend itself fails
    async fn clear_all(&self) -> Result<()>;
}
