//! Wire access to the remote catalog.
//!
//! The `CatalogTransport` trait decouples the caching client from the HTTP
//! stack. [`HttpTransport`] is the production implementation on reqwest;
//! [`InMemoryTransport`] serves canned bodies and counts requests, which is
//! how the caching contract is tested without a network.
//!
//! # Error Handling
//!
//! Implementations return `Error::Fetch` for every failure:
//! - non-2xx statuses as `FetchErrorKind::Status(code)`
//! - connection, TLS and timeout problems as `FetchErrorKind::Transport`

use crate::config::PokedexConfig;
use crate::error::{Error, FetchError, Result};
use crate::model::{NamedResource, PokemonListResponse};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Read-only GET access to the catalog.
#[allow(async_fn_in_trait)]
pub trait CatalogTransport: Send + Sync {
    /// GET `path` (relative to the catalog base URL, query included) and
    /// return the raw 2xx body.
    ///
    /// # Errors
    /// Returns `Error::Fetch` on a non-2xx status or transport failure.
    async fn get(&self, path: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed transport against a fixed base URL.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// # Errors
    /// Returns `Error::Config` if the base URL does not parse or the HTTP
    /// client cannot be built.
    pub fn new(config: &PokedexConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("invalid catalog URL {:?}: {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(HttpTransport { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl CatalogTransport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("» GET {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(FetchError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;
        Ok(body.to_vec())
    }
}

// ============================================================================
// In-Memory Test Transport
// ============================================================================

#[derive(Clone, Debug)]
enum Route {
    Body(Vec<u8>),
    Status(u16),
    Transport(String),
}

/// Canned catalog for tests and offline demos.
///
/// Exact paths are registered with [`insert_json`](Self::insert_json) and
/// friends. With [`with_catalog_size`](Self::with_catalog_size) it also
/// answers any `/pokemon?offset=..&limit=..` listing the way the real API
/// does, including a `null` `next` on the last window. Unregistered paths
/// answer 404. Clones share routes and counters.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    routes: Arc<DashMap<String, Route>>,
    hits: Arc<DashMap<String, usize>>,
    log: Arc<Mutex<Vec<String>>>,
    total: Arc<AtomicUsize>,
    catalog_size: Option<u32>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesize listing pages over a catalog of `total` entries named
    /// `pokemon-{id}`.
    pub fn with_catalog_size(mut self, total: u32) -> Self {
        self.catalog_size = Some(total);
        self
    }

    /// Serve `body` for `path`.
    pub fn insert_json(&self, path: impl Into<String>, body: impl Into<String>) {
        self.routes
            .insert(path.into(), Route::Body(body.into().into_bytes()));
    }

    /// Answer `path` with a non-2xx status.
    pub fn insert_status(&self, path: impl Into<String>, status: u16) {
        self.routes.insert(path.into(), Route::Status(status));
    }

    /// Fail `path` before any response arrives.
    pub fn insert_transport_error(&self, path: impl Into<String>, message: impl Into<String>) {
        self.routes
            .insert(path.into(), Route::Transport(message.into()));
    }

    /// Number of requests issued for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.get(path).map(|n| *n.value()).unwrap_or(0)
    }

    /// Number of requests issued overall.
    pub fn total_requests(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Every requested path, in issue order.
    pub fn requests(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn listing(&self, path: &str) -> Option<Vec<u8>> {
        let total = self.catalog_size?;
        let query = path.strip_prefix("/pokemon?")?;

        let mut offset = None;
        let mut limit = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("offset", v)) => offset = v.parse::<u32>().ok(),
                Some(("limit", v)) => limit = v.parse::<u32>().ok(),
                _ => {}
            }
        }
        let (offset, limit) = (offset?, limit?);

        let end = offset.saturating_add(limit).min(total);
        let results = (offset.min(total)..end)
            .map(|i| {
                let id = i + 1;
                NamedResource::new(
                    format!("pokemon-{}", id),
                    format!("https://pokeapi.co/api/v2/pokemon/{}/", id),
                )
            })
            .collect();

        let next = (end < total).then(|| {
            format!(
                "https://pokeapi.co/api/v2/pokemon?offset={}&limit={}",
                end, limit
            )
        });
        let previous = (offset > 0).then(|| {
            format!(
                "https://pokeapi.co/api/v2/pokemon?offset={}&limit={}",
                offset.saturating_sub(limit),
                limit
            )
        });

        let page = PokemonListResponse {
            count: total,
            next,
            previous,
            results,
        };
        serde_json::to_vec(&page).ok()
    }
}

impl CatalogTransport for InMemoryTransport {
    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.hits.entry(path.to_string()).or_insert(0) += 1;
        if let Ok(mut log) = self.log.lock() {
            log.push(path.to_string());
        }

        let route = self.routes.get(path).map(|r| r.value().clone());
        match route {
            Some(Route::Body(body)) => Ok(body),
            Some(Route::Status(code)) => Err(Error::Fetch(FetchError::status(
                code,
                reqwest::StatusCode::from_u16(code)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown"),
            ))),
            Some(Route::Transport(message)) => Err(Error::Fetch(FetchError::transport(message))),
            None => self
                .listing(path)
                .ok_or_else(|| Error::Fetch(FetchError::status(404, "Not Found"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_transport_counts_requests() {
        let transport = InMemoryTransport::new();
        transport.insert_json("/pokemon/1", r#"{"id":1,"name":"bulbasaur"}"#);

        transport.get("/pokemon/1").await.unwrap();
        transport.get("/pokemon/1").await.unwrap();
        let _ = transport.get("/pokemon/2").await;

        assert_eq!(transport.hits("/pokemon/1"), 2);
        assert_eq!(transport.hits("/pokemon/2"), 1);
        assert_eq!(transport.total_requests(), 3);
        assert_eq!(
            transport.requests(),
            vec!["/pokemon/1", "/pokemon/1", "/pokemon/2"]
        );
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let transport = InMemoryTransport::new();
        let err = transport.get("/pokemon/99999").await.unwrap_err();
        assert!(err.as_fetch().is_some_and(|f| f.is_not_found()));
    }

    #[tokio::test]
    async fn test_synthesized_listing_last_window() {
        let transport = InMemoryTransport::new().with_catalog_size(1000);

        let body = transport.get("/pokemon?offset=980&limit=20").await.unwrap();
        let page: PokemonListResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(page.count, 1000);
        assert_eq!(page.results.len(), 20);
        assert_eq!(page.results[0].name, "pokemon-981");
        assert!(page.next.is_none());
        assert!(page.previous.is_some());
    }

    #[test]
    fn test_http_transport_rejects_bad_base_url() {
        let config = PokedexConfig::default().with_base_url("not a url");
        assert!(matches!(HttpTransport::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_http_transport_trims_trailing_slash() {
        let config = PokedexConfig::default().with_base_url("https://pokeapi.co/api/v2/");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "https://pokeapi.co/api/v2");
    }
}
