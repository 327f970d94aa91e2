//! Runtime configuration for the catalog client and the favourites store.
//!
//! Every setting has a default matching the public PokéAPI deployment, so
//! `PokedexConfig::default()` is enough for most apps. Values can be
//! overridden in code with the `with_*` builders or from the environment
//! with [`PokedexConfig::from_env`].
//!
//! ```
//! use pokedex_kit::config::{DatabaseLocation, PokedexConfig};
//! use std::time::Duration;
//!
//! let config = PokedexConfig::default()
//!     .with_cache_ttl(Duration::from_secs(60))
//!     .with_database(DatabaseLocation::Memory);
//! assert_eq!(config.cache_ttl, Duration::from_secs(60));
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Base URL of the public catalog API.
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Validity window of a memoized catalog response.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_DATABASE_FILE: &str = "pokedex.db";

/// Page size used by `get_paginated_pokemon` when the caller passes none.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Where the favourites table lives.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseLocation {
    /// SQLite file on disk, created when missing.
    File(PathBuf),

    /// Private in-memory database; contents vanish with the store.
    Memory,
}

impl Default for DatabaseLocation {
    fn default() -> Self {
        DatabaseLocation::File(PathBuf::from(DEFAULT_DATABASE_FILE))
    }
}

impl DatabaseLocation {
    /// Parse the `POKEDEX_DATABASE_PATH` convention: `:memory:` or a path.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            ":memory:" => DatabaseLocation::Memory,
            path => DatabaseLocation::File(PathBuf::from(path)),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PokedexConfig {
    pub base_url: String,
    #[serde(with = "secs")]
    pub cache_ttl: Duration,
    #[serde(with = "secs")]
    pub request_timeout: Duration,
    pub database: DatabaseLocation,
    pub default_page_size: u32,
}

impl Default for PokedexConfig {
    fn default() -> Self {
        PokedexConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            database: DatabaseLocation::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PokedexConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_database(mut self, database: DatabaseLocation) -> Self {
        self.database = database;
        self
    }

    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size;
        self
    }

    /// Defaults overlaid with `POKEDEX_*` environment variables.
    ///
    /// # Errors
    /// Returns `Error::Config` when a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup, so
    /// callers (and tests) can feed settings from any key-value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = PokedexConfig::default();

        if let Some(url) = lookup("POKEDEX_API_BASE_URL") {
            config.base_url = url;
        }
        if let Some(raw) = lookup("POKEDEX_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(parse_number("POKEDEX_CACHE_TTL_SECS", &raw)?);
        }
        if let Some(raw) = lookup("POKEDEX_REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_number("POKEDEX_REQUEST_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("POKEDEX_DATABASE_PATH") {
            config.database = DatabaseLocation::parse(&raw);
        }

        debug!("Loaded config: {:?}", config);
        Ok(config)
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a whole number, got {:?}", name, raw)))
}

/// `Duration` as whole seconds in config files.
mod secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
