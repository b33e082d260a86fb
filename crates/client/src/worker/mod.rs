//! Offline cache manager.
//!
//! Drives one cache generation through its lifecycle:
//!
//! - **install**: open the store named by the version token and pre-cache
//!   every manifest asset in one atomic write. Any failure discards the
//!   version.
//! - **activate**: delete every store whose name differs from the version
//!   token, concurrently and best-effort, then claim open clients.
//! - **fetch**: only an activated worker intercepts, and only GET requests;
//!   everything else passes through untouched. GET requests are
//!   served cache-first without revalidation, then from the network with the
//!   status left as-is, then from the offline page when the network is
//!   unreachable.

pub mod clients;
pub mod lifecycle;

use std::sync::{Arc, RwLock};

use futures_util::future::{join_all, try_join_all};
use offcache_core::{CacheRequest, CacheStorage, CachedResponse, Error};
use serde::Serialize;
use url::Url;

use crate::fetch::{Network, resolve};

pub use clients::ClientControl;
pub use lifecycle::LifecyclePhase;

/// Version token naming the current cache generation.
pub const CACHE_NAME: &str = "dashboard-cache-v1";

/// Paths pre-cached on install.
pub const PRECACHE_MANIFEST: &[&str] = &["/", "/index.html", "/manifest.json", "/offline.html"];

/// Page served when both cache and network fail.
pub const OFFLINE_PAGE: &str = "/offline.html";

/// Immutable worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub cache_name: String,
    pub manifest: Vec<String>,
    pub offline_page: String,
    /// Origin manifest paths and relative request targets resolve against.
    pub origin: Url,
}

impl WorkerConfig {
    /// Build-time cache name, manifest and offline page for the given origin.
    pub fn new(origin: Url) -> Self {
        Self {
            cache_name: CACHE_NAME.to_string(),
            manifest: PRECACHE_MANIFEST.iter().map(|p| p.to_string()).collect(),
            offline_page: OFFLINE_PAGE.to_string(),
            origin,
        }
    }

    /// The offline page must be pre-cached for the fallback to ever work.
    pub fn validate(&self) -> Result<(), Error> {
        if self.cache_name.trim().is_empty() {
            return Err(Error::InvalidInput("cache name must not be empty".into()));
        }
        if !self.manifest.iter().any(|p| p == &self.offline_page) {
            return Err(Error::InvalidInput(format!(
                "offline page {} is not in the precache manifest",
                self.offline_page
            )));
        }
        Ok(())
    }
}

/// Which step of the fallback chain produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    OfflineFallback,
    /// Network failed and the offline page was not in the cache either.
    Unavailable,
}

/// Result of intercepting a request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Not handled; the host performs its default network handling.
    PassThrough,
    /// Handled. Network responses share the stored-response shape but are
    /// not written to the cache.
    Respond { response: CachedResponse, source: ResponseSource },
}

/// Outcome of a successful install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub cache_name: String,
    pub cached: usize,
}

/// Outcome of an activation. Deletion failures do not fail activation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivationReport {
    pub cache_name: String,
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

/// Point-in-time view of the manager and its stores.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub phase: LifecyclePhase,
    pub cache_name: String,
    pub stores: Vec<String>,
    pub entries: u64,
}

/// The offline cache manager.
///
/// Lifecycle events are delivered by a host through `on_install`,
/// `on_activate` and `on_fetch`; each returns once its work has settled.
pub struct OfflineCacheManager {
    config: WorkerConfig,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    clients: Arc<dyn ClientControl>,
    phase: RwLock<LifecyclePhase>,
}

impl OfflineCacheManager {
    pub fn new(
        config: WorkerConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>,
        clients: Arc<dyn ClientControl>,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config, storage, network, clients, phase: RwLock::new(LifecyclePhase::Parsed) })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn phase(&self) -> LifecyclePhase {
        *self.phase.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Build a request for a target relative to the worker origin.
    pub fn request(&self, method: &str, target: &str) -> Result<CacheRequest, Error> {
        let url = resolve(&self.config.origin, target).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(CacheRequest::new(method, url.as_str()))
    }

    /// Handle the install event.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any manifest asset cannot be fetched
    /// or answers with a non-success status. The phase is then `Redundant`
    /// and nothing has been written to the store.
    ///
    /// Dropping the returned future before it settles also leaves the phase
    /// `Redundant`, so a later install can start over.
    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        let guard = self.enter(LifecyclePhase::can_install, LifecyclePhase::Installing, "install", |_| {
            LifecyclePhase::Redundant
        })?;

        self.clients.skip_waiting().await;

        match self.precache().await {
            Ok(cached) => {
                guard.settle(LifecyclePhase::Installed);
                tracing::info!(cache = %self.config.cache_name, cached, "install complete");
                Ok(InstallReport { cache_name: self.config.cache_name.clone(), cached })
            }
            Err(e) => {
                guard.settle(LifecyclePhase::Redundant);
                tracing::warn!(cache = %self.config.cache_name, error = %e, "install failed; version discarded");
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<usize, Error> {
        let name = &self.config.cache_name;
        self.storage.open(name).await?;

        let requests = self
            .config
            .manifest
            .iter()
            .map(|path| self.request("GET", path))
            .collect::<Result<Vec<_>, _>>()?;

        let fetches = requests.into_iter().map(|request| async move {
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed { url: request.url.clone(), reason: e.to_string() })?
                .into_cached();

            if !response.is_success() {
                return Err(Error::InstallFailed {
                    url: request.url.clone(),
                    reason: format!("status {}", response.status),
                });
            }

            tracing::debug!(url = %request.url, "precached");
            Ok::<_, Error>((request, response))
        });

        let entries = try_join_all(fetches).await?;
        let count = entries.len();
        self.storage.put_all(name, entries).await?;

        Ok(count)
    }

    /// Handle the activate event.
    ///
    /// # Errors
    ///
    /// Returns `Error::Lifecycle` if no install has completed, or a storage
    /// error if the store names cannot be listed. Individual deletion
    /// failures are reported in the `ActivationReport` instead. On error,
    /// or if the future is dropped early, the previous phase is restored.
    pub async fn on_activate(&self) -> Result<ActivationReport, Error> {
        let guard = self.enter(LifecyclePhase::can_activate, LifecyclePhase::Activating, "activate", |previous| {
            previous
        })?;

        let report = match self.prune_stale().await {
            Ok(report) => report,
            Err(e) => {
                guard.abort();
                return Err(e);
            }
        };

        guard.settle(LifecyclePhase::Activated);
        self.clients.claim().await;

        tracing::info!(
            cache = %self.config.cache_name,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "activation complete"
        );

        Ok(report)
    }

    async fn prune_stale(&self) -> Result<ActivationReport, Error> {
        let current = &self.config.cache_name;
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != current)
            .collect();

        let results = join_all(stale.iter().map(|name| async move { (name, self.storage.delete(name).await) })).await;

        let mut report = ActivationReport { cache_name: current.clone(), ..Default::default() };
        for (name, result) in results {
            match result {
                Ok(true) => {
                    tracing::debug!(cache = %name, "deleted stale cache");
                    report.deleted.push(name.clone());
                }
                Ok(false) => tracing::debug!(cache = %name, "stale cache already gone"),
                Err(e) => {
                    tracing::warn!(cache = %name, error = %e, "failed to delete stale cache");
                    report.failed.push(name.clone());
                }
            }
        }

        Ok(report)
    }

    /// Handle a fetch event. Never fails: every error is absorbed by the
    /// fallback chain.
    ///
    /// A worker that has not activated (or never will) does not control any
    /// page, so it leaves every request to the host.
    pub async fn on_fetch(&self, request: &CacheRequest) -> FetchOutcome {
        let phase = self.phase();
        if !phase.is_serving() {
            tracing::trace!(%phase, url = %request.url, "not serving; pass through");
            return FetchOutcome::PassThrough;
        }

        if !request.is_read() {
            tracing::trace!(method = %request.method, url = %request.url, "pass through");
            return FetchOutcome::PassThrough;
        }

        match self.storage.match_request(&self.config.cache_name, request).await {
            Ok(Some(response)) => {
                tracing::debug!(url = %request.url, "cache hit");
                return FetchOutcome::Respond { response, source: ResponseSource::Cache };
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed; treating as miss"),
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                tracing::debug!(url = %request.url, status = response.status.as_u16(), "served from network");
                FetchOutcome::Respond { response: response.into_cached(), source: ResponseSource::Network }
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "network unreachable; serving offline page");
                self.offline_fallback(request).await
            }
        }
    }

    async fn offline_fallback(&self, request: &CacheRequest) -> FetchOutcome {
        let offline = match self.request("GET", &self.config.offline_page) {
            Ok(offline) => offline,
            Err(e) => {
                tracing::warn!(error = %e, "offline page path does not resolve");
                return unavailable(request);
            }
        };

        match self.storage.match_request(&self.config.cache_name, &offline).await {
            Ok(Some(response)) => FetchOutcome::Respond { response, source: ResponseSource::OfflineFallback },
            Ok(None) => {
                tracing::warn!(url = %offline.url, "offline page missing from cache");
                unavailable(request)
            }
            Err(e) => {
                tracing::warn!(url = %offline.url, error = %e, "offline page lookup failed");
                unavailable(request)
            }
        }
    }

    /// Phase, version token, all store names and the current store's size.
    pub async fn status(&self) -> Result<WorkerStatus, Error> {
        let stores = self.storage.keys().await?;
        let entries = self.storage.entry_count(&self.config.cache_name).await?;
        Ok(WorkerStatus { phase: self.phase(), cache_name: self.config.cache_name.clone(), stores, entries })
    }

    /// Move into `next` if `allowed` accepts the current phase. The returned
    /// guard falls back to `on_abort(previous)` unless it is settled.
    fn enter(
        &self, allowed: fn(LifecyclePhase) -> bool, next: LifecyclePhase, event: &str,
        on_abort: fn(LifecyclePhase) -> LifecyclePhase,
    ) -> Result<PhaseGuard<'_>, Error> {
        let mut phase = self.phase.write().unwrap_or_else(|e| e.into_inner());
        let current = *phase;
        if !allowed(current) {
            return Err(Error::Lifecycle(format!("cannot {event} while {current}")));
        }
        *phase = next;
        Ok(PhaseGuard { phase: &self.phase, fallback: on_abort(current), settled: false })
    }
}

/// Holds the phase of an in-flight lifecycle step.
struct PhaseGuard<'a> {
    phase: &'a RwLock<LifecyclePhase>,
    fallback: LifecyclePhase,
    settled: bool,
}

impl PhaseGuard<'_> {
    fn settle(mut self, next: LifecyclePhase) {
        self.settled = true;
        *self.phase.write().unwrap_or_else(|e| e.into_inner()) = next;
    }

    fn abort(self) {
        let fallback = self.fallback;
        self.settle(fallback);
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(phase = %self.fallback, "lifecycle step dropped before settling");
            *self.phase.write().unwrap_or_else(|e| e.into_inner()) = self.fallback;
        }
    }
}

fn unavailable(request: &CacheRequest) -> FetchOutcome {
    let response = CachedResponse {
        url: request.url.clone(),
        status: 503,
        headers: Vec::new(),
        body: Vec::new(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    };
    FetchOutcome::Respond { response, source: ResponseSource::Unavailable }
}
