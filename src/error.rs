//! Error types for the catalog client and the favourites store.

use std::fmt;
use thiserror::Error;

/// Result type for pokedex-kit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a remote fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The catalog answered with a non-2xx status.
    Status(u16),

    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    Transport,

    /// The response body was not the JSON shape we expected.
    Decode,
}

/// Failure of a read-only request against the remote catalog.
///
/// The client never retries on its own; callers decide whether to surface
/// the message or try again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    /// Non-2xx response, e.g. `HTTP 404: Not Found`.
    pub fn status(code: u16, reason: impl fmt::Display) -> Self {
        FetchError {
            kind: FetchErrorKind::Status(code),
            message: format!("HTTP {}: {}", code, reason),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        FetchError {
            kind: FetchErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        FetchError {
            kind: FetchErrorKind::Decode,
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self.kind {
            FetchErrorKind::Status(code) => Some(code),
            _ => None,
        }
    }

    /// True when the catalog reported the resource as absent.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FetchError {}

/// Error types for pokedex-kit.
///
/// Write paths always propagate these. Read paths on the favourites store
/// (`exists`, `list_all`) only ever surface [`Error::NotInitialized`]; any
/// storage failure there is logged and replaced by a safe default.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Remote catalog request failed (4xx/5xx, transport or decode).
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The favourites store was used before `initialize()` succeeded.
    #[error("Favourites store is not initialized")]
    NotInitialized,

    /// Local persistence failed on open or on a write.
    ///
    /// **Recovery:** the caller decides whether to retry or surface it.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Arguments that cannot form a valid catalog request
    /// (zero limit, non-positive id, empty name, page 0).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payload could not be encoded for the response cache.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Cached bytes could not be decoded back into a payload.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Cached bytes do not start with the pokedex-kit magic header.
    #[error("Invalid cache entry: {0}")]
    InvalidCacheEntry(String),

    /// Cached bytes were written by a different schema version.
    #[error("Cache version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// Bad configuration value (environment override, base URL).
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// The underlying fetch failure, if this is one.
    pub fn as_fetch(&self) -> Option<&FetchError> {
        match self {
            Error::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Error::Fetch(FetchError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
            )),
            None => Error::Fetch(FetchError::transport(e.to_string())),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Fetch(FetchError::decode(e.to_string()))
    }
}

impl From<postcard::Error> for Error {
    fn from(e: postcard::Error) -> Self {
        Error::Deserialization(e.to_string())
    }
}
