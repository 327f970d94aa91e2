//! Remote catalog client with a time-boxed response cache.
//!
//! Every operation follows the same steps:
//!
//! 1. Build a [`RequestKey`] from the operation and its parameters.
//! 2. If the backend holds a valid entry for it, return the cached payload
//!    without touching the network.
//! 3. Otherwise GET the endpoint, decode the JSON, store the payload under
//!    the key (overwriting any previous entry) and return it.
//!
//! Failed requests are never cached, 404s included, and the client never
//! retries. Retry policy belongs to the caller.

use crate::backend::{CacheBackend, InMemoryBackend};
use crate::config::{PokedexConfig, DEFAULT_CACHE_TTL, DEFAULT_PAGE_SIZE};
use crate::error::{Error, Result};
use crate::evolution::EvolutionStage;
use crate::key::RequestKey;
use crate::model::{
    EvolutionChain, PaginatedPokemonResponse, Pokemon, PokemonListResponse, PokemonSpecies,
};
use crate::observability::{ClientMetrics, NoOpMetrics};
use crate::serialization::{decode_payload, encode_payload};
use crate::transport::{CatalogTransport, HttpTransport};
use futures::future::join_all;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Bytes kept verbatim in a path segment: RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Read-only client for the remote catalog.
///
/// Cloning is cheap when the transport is; clones share the response cache.
///
/// # Example
///
/// ```ignore
/// use pokedex_kit::{CatalogClient, PokedexConfig};
///
/// let client = CatalogClient::from_config(&PokedexConfig::default())?;
/// let pikachu = client.get_by_id(25).await?;
/// let again = client.get_by_id(25).await?; // served from cache
/// ```
#[derive(Clone)]
pub struct CatalogClient<T: CatalogTransport, B: CacheBackend = InMemoryBackend> {
    transport: T,
    backend: B,
    metrics: Arc<dyn ClientMetrics>,
    ttl: Duration,
    default_page_size: u32,
}

impl CatalogClient<HttpTransport, InMemoryBackend> {
    /// HTTP client against `config.base_url` with an in-memory cache.
    ///
    /// # Errors
    /// Returns `Error::Config` if the base URL is invalid.
    pub fn from_config(config: &PokedexConfig) -> Result<Self> {
        Ok(CatalogClient::new(HttpTransport::new(config)?, InMemoryBackend::new())
            .with_ttl(config.cache_ttl)
            .with_default_page_size(config.default_page_size))
    }
}

impl<T: CatalogTransport, B: CacheBackend> CatalogClient<T, B> {
    pub fn new(transport: T, backend: B) -> Self {
        CatalogClient {
            transport,
            backend,
            metrics: Arc::new(NoOpMetrics),
            ttl: DEFAULT_CACHE_TTL,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn ClientMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Validity window of cached responses.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// One window of the catalog listing.
    ///
    /// # Errors
    /// `Error::InvalidRequest` if `limit` is 0, `Error::Fetch` otherwise.
    pub async fn list_page(&self, offset: u32, limit: u32) -> Result<PokemonListResponse> {
        if limit == 0 {
            return Err(Error::InvalidRequest("limit must be positive".to_string()));
        }

        self.cached(
            RequestKey::List { offset, limit },
            format!("/pokemon?offset={}&limit={}", offset, limit),
        )
        .await
    }

    /// # Errors
    /// `Error::InvalidRequest` for id 0; `Error::Fetch` with status 404
    /// when the catalog has no such entity.
    pub async fn get_by_id(&self, id: u32) -> Result<Pokemon> {
        ensure_positive("pokemon id", id)?;
        self.cached(RequestKey::PokemonById(id), format!("/pokemon/{}", id))
            .await
    }

    /// Lookup by name, case-insensitively.
    ///
    /// # Errors
    /// `Error::InvalidRequest` for a blank name; `Error::Fetch` otherwise.
    pub async fn get_by_name(&self, name: &str) -> Result<Pokemon> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(Error::InvalidRequest("pokemon name is empty".to_string()));
        }

        let path = format!("/pokemon/{}", utf8_percent_encode(&name, PATH_SEGMENT));
        self.cached(RequestKey::PokemonByName(name), path).await
    }

    pub async fn get_species_by_id(&self, id: u32) -> Result<PokemonSpecies> {
        ensure_positive("species id", id)?;
        self.cached(RequestKey::Species(id), format!("/pokemon-species/{}", id))
            .await
    }

    pub async fn get_evolution_chain_by_id(&self, id: u32) -> Result<EvolutionChain> {
        ensure_positive("evolution chain id", id)?;
        self.cached(
            RequestKey::EvolutionChain(id),
            format!("/evolution-chain/{}", id),
        )
        .await
    }

    /// 1-based page of the listing. `limit` defaults to the configured page
    /// size; the window starts at `(page - 1) * limit`.
    ///
    /// Cached under its own page key, separate from [`list_page`](Self::list_page).
    ///
    /// # Errors
    /// `Error::InvalidRequest` for page 0, limit 0 or an offset overflow.
    pub async fn get_paginated_pokemon(
        &self,
        page: u32,
        limit: Option<u32>,
    ) -> Result<PaginatedPokemonResponse> {
        let limit = limit.unwrap_or(self.default_page_size);
        if page == 0 {
            return Err(Error::InvalidRequest("page numbers start at 1".to_string()));
        }
        if limit == 0 {
            return Err(Error::InvalidRequest("limit must be positive".to_string()));
        }
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| Error::InvalidRequest(format!("page {} is out of range", page)))?;

        let list: PokemonListResponse = self
            .cached(
                RequestKey::Page { page, limit },
                format!("/pokemon?offset={}&limit={}", offset, limit),
            )
            .await?;

        Ok(PaginatedPokemonResponse::from_list(list, page))
    }

    /// Entity plus its species, as a detail screen needs them.
    pub async fn get_pokemon_with_details(&self, id: u32) -> Result<(Pokemon, PokemonSpecies)> {
        let pokemon = self.get_by_id(id).await?;
        let species = self.get_species_by_id(pokemon.id).await?;
        Ok((pokemon, species))
    }

    /// Fetch several entities concurrently.
    ///
    /// Ids that fail are logged and left out; the rest keep input order.
    pub async fn get_pokemon_by_ids(&self, ids: &[u32]) -> Vec<Pokemon> {
        let results = join_all(ids.iter().map(|&id| self.get_by_id(id))).await;

        ids.iter()
            .zip(results)
            .filter_map(|(id, result)| match result {
                Ok(pokemon) => Some(pokemon),
                Err(e) => {
                    warn!("Dropping pokemon {} from batch: {}", id, e);
                    None
                }
            })
            .collect()
    }

    /// Stages of an evolution chain, root first.
    pub async fn get_evolution_stages(&self, chain_id: u32) -> Result<Vec<EvolutionStage>> {
        Ok(self.get_evolution_chain_by_id(chain_id).await?.stages())
    }

    /// Stages of the chain a species belongs to; empty when the species
    /// has no chain.
    pub async fn get_evolution_stages_for_species(
        &self,
        species_id: u32,
    ) -> Result<Vec<EvolutionStage>> {
        let species = self.get_species_by_id(species_id).await?;
        match species.evolution_chain_id() {
            Some(chain_id) => self.get_evolution_stages(chain_id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Drop every cached response. Later calls go to the network
    /// regardless of age.
    pub async fn clear_cache(&self) {
        if let Err(e) = self.backend.clear_all().await {
            error!("Failed to clear response cache: {}", e);
        }
    }

    async fn cached<P>(&self, key: RequestKey, path: String) -> Result<P>
    where
        P: Serialize + DeserializeOwned,
    {
        let cache_key = key.build();

        match self.backend.get(&cache_key).await {
            Ok(Some(bytes)) => match decode_payload::<P>(&bytes) {
                Ok(payload) => {
                    self.metrics.record_hit(&cache_key);
                    return Ok(payload);
                }
                Err(e) => {
                    warn!("Refetching {}: cached entry unreadable ({})", cache_key, e);
                    if let Err(e) = self.backend.delete(&cache_key).await {
                        warn!("Could not drop unreadable entry {}: {}", cache_key, e);
                    }
                }
            },
            Ok(None) => {}
            Err(e) => warn!("Refetching {}: cache backend failed ({})", cache_key, e),
        }

        self.metrics.record_miss(&cache_key);
        let timer = Instant::now();

        let payload = match self.fetch::<P>(&path).await {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.record_error(&cache_key, &e.to_string());
                return Err(e);
            }
        };

        match encode_payload(&payload) {
            Ok(bytes) => {
                if let Err(e) = self.backend.set(&cache_key, bytes, Some(self.ttl)).await {
                    warn!("Could not cache {}: {}", cache_key, e);
                }
            }
            Err(e) => warn!("Could not cache {}: {}", cache_key, e),
        }

        self.metrics.record_fetch(&cache_key, timer.elapsed());
        Ok(payload)
    }

    async fn fetch<P: DeserializeOwned>(&self, path: &str) -> Result<P> {
        let body = self.transport.get(path).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn ensure_positive(what: &str, id: u32) -> Result<()> {
    if id == 0 {
        return Err(Error::InvalidRequest(format!("{} must be positive", what)));
    }
    Ok(())
}
