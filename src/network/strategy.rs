//! Network Cache Strategy Module
//!
//! Route-pattern dispatch of outbound requests to cache-first,
//! network-first, and stale-while-revalidate handling over named response
//! stores.
//!
//! This layer is process-isolated from the tiered cache manager: the two
//! share no entries and never coordinate invalidation. Each must be
//! independently correct when the upstream is slow, offline, or failing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use crate::network::fetch::Fetch;
use crate::network::response::{CachedResponse, FetchRequest};
use crate::network::store::ResponseStore;

// == Strategy Kind ==
/// How requests matching a route are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Serve from the store when present; fetch and store otherwise.
    /// For static assets that change only across deployments.
    CacheFirst,
    /// Always try the network first; fall back to any stored copy
    /// regardless of age. For upstream API calls.
    NetworkFirst,
    /// Serve a stored copy younger than `max_age_ms` without touching the
    /// network; otherwise fetch, falling back to the stale copy on
    /// failure. For bulk data files.
    StaleWhileRevalidate { max_age_ms: u64 },
}

// == Strategy Route ==
/// Maps a URL substring pattern to a named store and a strategy.
#[derive(Debug, Clone)]
pub struct StrategyRoute {
    pub pattern: String,
    pub store: String,
    pub strategy: StrategyKind,
}

impl StrategyRoute {
    pub fn new(
        pattern: impl Into<String>,
        store: impl Into<String>,
        strategy: StrategyKind,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            store: store.into(),
            strategy,
        }
    }

    fn matches(&self, url: &str) -> bool {
        url.contains(&self.pattern)
    }
}

// == Network Cache Strategy ==
/// Request interceptor over named response stores.
///
/// Routes are checked in order; the first match wins. Unmatched URLs go
/// straight to the network and are never stored.
pub struct NetworkCacheStrategy {
    fetcher: Arc<dyn Fetch>,
    routes: Vec<StrategyRoute>,
    stores: RwLock<HashMap<String, ResponseStore>>,
    /// Default cap applied to stores without an explicit limit
    store_max_entries: usize,
    /// Per-store caps overriding the default
    store_limits: HashMap<String, usize>,
    /// Store name and URL of the document served to failed navigations
    offline_fallback: Option<(String, String)>,
}

impl NetworkCacheStrategy {
    // == Constructor ==
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        routes: Vec<StrategyRoute>,
        store_max_entries: usize,
    ) -> Self {
        Self {
            fetcher,
            routes,
            stores: RwLock::new(HashMap::new()),
            store_max_entries,
            store_limits: HashMap::new(),
            offline_fallback: None,
        }
    }

    /// Overrides the entry cap for one named store.
    pub fn with_store_limit(mut self, store: impl Into<String>, max_entries: usize) -> Self {
        self.store_limits.insert(store.into(), max_entries);
        self
    }

    /// Registers the document served to navigations that fail while
    /// offline. The document itself is expected to be precached into
    /// `store` during install.
    pub fn with_offline_fallback(mut self, store: impl Into<String>, url: impl Into<String>) -> Self {
        self.offline_fallback = Some((store.into(), url.into()));
        self
    }

    // == Install ==
    /// Pre-populates `store` with the given asset URLs.
    ///
    /// Individual failures are logged and skipped so one bad asset does
    /// not block the rest. Returns the number of assets stored.
    pub async fn install(&self, store: &str, assets: &[&str]) -> usize {
        let mut stored = 0;
        for url in assets {
            match self.fetcher.fetch(url).await {
                Ok(response) if response.is_success() => {
                    self.store_response(store, response).await;
                    stored += 1;
                }
                Ok(response) => {
                    warn!("precache skipped {url}: status {}", response.status);
                }
                Err(err) => warn!("precache failed for {url}: {err}"),
            }
        }
        info!("precached {stored} of {} assets into {store}", assets.len());
        stored
    }

    // == Activate ==
    /// Drops stores left behind by older deployments: any open store not
    /// named by a route or the offline fallback. Returns the removed
    /// names.
    pub async fn activate(&self) -> Vec<String> {
        let mut recognized: HashSet<&str> =
            self.routes.iter().map(|route| route.store.as_str()).collect();
        if let Some((store, _)) = &self.offline_fallback {
            recognized.insert(store.as_str());
        }

        let mut stores = self.stores.write().await;
        let stale: Vec<String> = stores
            .keys()
            .filter(|name| !recognized.contains(name.as_str()))
            .cloned()
            .collect();
        for name in &stale {
            stores.remove(name);
            info!("removed stale response store {name}");
        }
        stale
    }

    /// Opens (creating if missing) a named store.
    pub async fn open_store(&self, name: &str) {
        self.stores
            .write()
            .await
            .entry(name.to_string())
            .or_default();
    }

    // == Handle ==
    /// Serves one request according to the first matching route.
    pub async fn handle(&self, request: &FetchRequest) -> Result<CachedResponse> {
        match self.routes.iter().find(|route| route.matches(&request.url)) {
            Some(route) => match route.strategy {
                StrategyKind::CacheFirst => self.cache_first(route, request).await,
                StrategyKind::NetworkFirst => self.network_first(route, request).await,
                StrategyKind::StaleWhileRevalidate { max_age_ms } => {
                    self.stale_while_revalidate(route, request, max_age_ms).await
                }
            },
            None => self.fetcher.fetch(&request.url).await,
        }
    }

    /// Check the store first; the network is only for misses. Failed
    /// navigations degrade to the offline document.
    async fn cache_first(
        &self,
        route: &StrategyRoute,
        request: &FetchRequest,
    ) -> Result<CachedResponse> {
        if let Some(stored) = self.stored_response(&route.store, &request.url).await {
            debug!("cache-first hit for {}", request.url);
            return Ok(stored);
        }

        match self.fetcher.fetch(&request.url).await {
            Ok(response) => {
                if response.is_success() {
                    self.store_response(&route.store, response.clone()).await;
                }
                Ok(response)
            }
            Err(err) => {
                if request.is_navigation {
                    if let Some((store, url)) = &self.offline_fallback {
                        if let Some(fallback) = self.stored_response(store, url).await {
                            warn!("serving offline fallback for {}", request.url);
                            return Ok(fallback);
                        }
                    }
                }
                Err(err)
            }
        }
    }

    /// Always try the network; any stored copy, however old, beats a
    /// failure. Non-2xx answers count as failures here.
    async fn network_first(
        &self,
        route: &StrategyRoute,
        request: &FetchRequest,
    ) -> Result<CachedResponse> {
        let failure = match self.fetcher.fetch(&request.url).await {
            Ok(response) if response.is_success() => {
                self.store_response(&route.store, response.clone()).await;
                return Ok(response);
            }
            Ok(response) => CacheError::HttpStatus {
                url: request.url.clone(),
                status: response.status,
            },
            Err(err) => err,
        };

        match self.stored_response(&route.store, &request.url).await {
            Some(stored) => {
                debug!(
                    "network-first falling back to stored copy for {}",
                    request.url
                );
                Ok(stored)
            }
            None => Err(failure),
        }
    }

    /// Serve within the freshness window without fetching; revalidate past
    /// it, keeping the stale copy as the failure fallback.
    async fn stale_while_revalidate(
        &self,
        route: &StrategyRoute,
        request: &FetchRequest,
        max_age_ms: u64,
    ) -> Result<CachedResponse> {
        let stored = self.stored_response(&route.store, &request.url).await;

        if let Some(ref response) = stored {
            if response.age_ms() <= max_age_ms {
                debug!(
                    "serving {} from {} within freshness window",
                    request.url, route.store
                );
                return Ok(response.clone());
            }
        }

        match self.fetcher.fetch(&request.url).await {
            Ok(response) => {
                if response.is_success() {
                    self.store_response(&route.store, response.clone()).await;
                }
                Ok(response)
            }
            Err(err) => match stored {
                Some(stale) => {
                    warn!(
                        "revalidation failed for {}, serving stale copy: {err}",
                        request.url
                    );
                    Ok(stale)
                }
                None => Err(err),
            },
        }
    }

    // == Prune ==
    /// Caps every open store to its entry limit, evicting oldest inserts
    /// first. Returns the total number of entries removed.
    pub async fn prune_stores(&self) -> usize {
        let mut stores = self.stores.write().await;
        let mut removed = 0;
        for (name, store) in stores.iter_mut() {
            let limit = self
                .store_limits
                .get(name)
                .copied()
                .unwrap_or(self.store_max_entries);
            let dropped = store.prune(limit);
            if dropped > 0 {
                debug!("pruned {dropped} entries from {name}");
            }
            removed += dropped;
        }
        removed
    }

    // == Store Counts ==
    /// Entry counts per open store, for diagnostics.
    pub async fn store_counts(&self) -> HashMap<String, usize> {
        self.stores
            .read()
            .await
            .iter()
            .map(|(name, store)| (name.clone(), store.len()))
            .collect()
    }

    async fn stored_response(&self, store: &str, url: &str) -> Option<CachedResponse> {
        self.stores.read().await.get(store)?.get(url).cloned()
    }

    async fn store_response(&self, store: &str, response: CachedResponse) {
        let mut stores = self.stores.write().await;
        stores.entry(store.to_string()).or_default().put(response);
    }
}
