//! # pokedex-kit
//!
//! Data core for a Pokédex application: a read-only catalog client with a
//! time-boxed response cache, and a local favourites store kept in sync
//! with a UI-facing projection.
//!
//! ## Features
//!
//! - **Cached Catalog Reads:** Each logical request is memoized for five minutes; failures are never cached
//! - **Swappable Transport:** reqwest over HTTPS in production, canned responses in tests
//! - **Durable Favourites:** SQLite table with upsert semantics and newest-first listing
//! - **Optimistic Toggles:** The projection flips immediately and rolls back exactly if the write fails
//! - **Production Ready:** Built-in logging, metrics hooks, and typed errors
//!
//! ## Quick Start
//!
//! ```ignore
//! use pokedex_kit::{
//!     CatalogClient, FavouritesSync, NewFavourite, PokedexConfig, SqliteFavouritesStore,
//! };
//! use std::sync::Arc;
//!
//! let config = PokedexConfig::from_env()?;
//! let client = CatalogClient::from_config(&config)?;
//!
//! let store = Arc::new(SqliteFavouritesStore::new(config.database.clone()));
//! store.initialize().await?;
//! let favourites = FavouritesSync::new(store);
//!
//! let pikachu = client.get_by_id(25).await?;
//!
//! // The projection says "favourite" before the write lands.
//! let write = favourites.toggle(
//!     NewFavourite::new(pikachu.id, &pikachu.name).with_image_url(pikachu.image_url()),
//!     false,
//! );
//! assert_eq!(favourites.projection().status(25), Some(true));
//! write.await?;
//!
//! let details = favourites.favourites_with_details(&client).await?;
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! presentation ──► FavouritesSync ──► FavouritesRepository (durable truth)
//!       │                 │
//!       │                 └─ favourites_with_details ─┐
//!       ▼                                             ▼
//!  CatalogClient ──► CacheBackend ──► CatalogTransport ──► remote API
//! ```
//!
//! The two data sources never talk to each other; only the sync layer joins
//! them, and only when asked for favourites with full catalog details.

#[macro_use]
extern crate log;

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod evolution;
pub mod key;
pub mod model;
pub mod observability;
pub mod projection;
pub mod serialization;
pub mod store;
pub mod sync;
pub mod transport;

// Re-exports for convenience
pub use backend::{CacheBackend, InMemoryBackend};
pub use client::CatalogClient;
pub use config::{DatabaseLocation, PokedexConfig};
pub use error::{Error, FetchError, FetchErrorKind, Result};
pub use evolution::EvolutionStage;
pub use key::RequestKey;
pub use model::{
    EvolutionChain, FavouritePokemon, NewFavourite, PaginatedPokemonResponse, Pokemon,
    PokemonListResponse, PokemonSpecies,
};
pub use observability::{ClientMetrics, CountingMetrics, NoOpMetrics};
pub use projection::FavouritesProjection;
pub use store::{FavouritesRepository, InMemoryFavouritesStore, SqliteFavouritesStore};
pub use sync::FavouritesSync;
pub use transport::{CatalogTransport, HttpTransport, InMemoryTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
