//! Network-first request handling with an offline cache fallback

use std::fmt;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::edge::{
    CacheVersion, EdgeRequest, EdgeResponse, Fetcher, RequestKey, ResponseStore,
};
use crate::domain::DomainError;

pub const DEFAULT_API_PREFIX: &str = "/api/";

/// Per-request progress, reported in debug logs.
///
/// `Idle -> NetworkAttempt -> Success -> CacheUpdate -> Respond`, or on a
/// transport failure `NetworkAttempt -> Failure -> CacheLookup` ending in
/// `HitRespond` or `MissThrow`. Bypassed requests go straight to `Bypass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Idle,
    NetworkAttempt,
    Success,
    CacheUpdate,
    Respond,
    Failure,
    CacheLookup,
    HitRespond,
    MissThrow,
    Bypass,
}

/// Where a response handed back to the client came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    Passthrough,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Cache => "cache",
            Self::Passthrough => "passthrough",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdgeOutcome {
    pub response: EdgeResponse,
    pub source: ResponseSource,
}

/// Result of activating a cache version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub active: String,
    pub deleted: Vec<String>,
}

/// Network-first strategy over a `Fetcher` and a `ResponseStore`.
///
/// Successful (200) GET responses are written to the active cache in a
/// background task; the client response never waits on that write. When the
/// network fails the exact request is looked up in the active cache, and a
/// miss surfaces the original network error.
pub struct NetworkFirst {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn ResponseStore>,
    active_cache: Arc<RwLock<String>>,
    api_prefix: String,
}

impl fmt::Debug for NetworkFirst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkFirst")
            .field("store", &self.store)
            .field("api_prefix", &self.api_prefix)
            .finish_non_exhaustive()
    }
}

impl NetworkFirst {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn ResponseStore>,
        version: &CacheVersion,
    ) -> Self {
        Self {
            fetcher,
            store,
            active_cache: Arc::new(RwLock::new(version.name())),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
        }
    }

    pub fn with_api_prefix(mut self, api_prefix: impl Into<String>) -> Self {
        self.api_prefix = api_prefix.into();
        self
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    /// Name of the cache new responses are written to
    pub async fn active_cache(&self) -> String {
        self.active_cache.read().await.clone()
    }

    /// API calls and non-GET requests are forwarded without caching
    pub fn is_bypassed(&self, request: &EdgeRequest) -> bool {
        if request.method != Method::GET {
            return true;
        }

        let path = request.path();
        path.starts_with(&self.api_prefix) || path == self.api_prefix.trim_end_matches('/')
    }

    pub async fn handle(&self, request: EdgeRequest) -> Result<EdgeOutcome, DomainError> {
        let key = request.key();
        log_stage(&key, FetchStage::Idle);

        if self.is_bypassed(&request) {
            log_stage(&key, FetchStage::Bypass);
            let response = self.fetcher.fetch(request).await?;
            return Ok(EdgeOutcome {
                response,
                source: ResponseSource::Passthrough,
            });
        }

        let cache_name = self.active_cache().await;

        log_stage(&key, FetchStage::NetworkAttempt);
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                log_stage(&key, FetchStage::Success);
                if response.status == StatusCode::OK {
                    log_stage(&key, FetchStage::CacheUpdate);
                    self.spawn_cache_update(cache_name, key.clone(), response.clone());
                }
                log_stage(&key, FetchStage::Respond);
                Ok(EdgeOutcome {
                    response,
                    source: ResponseSource::Network,
                })
            }
            Err(network_error) => {
                log_stage(&key, FetchStage::Failure);
                warn!(request = %key, error = %network_error, "Network request failed, trying cache");

                log_stage(&key, FetchStage::CacheLookup);
                match self.store.match_request(&cache_name, &key).await {
                    Ok(Some(response)) => {
                        log_stage(&key, FetchStage::HitRespond);
                        Ok(EdgeOutcome {
                            response,
                            source: ResponseSource::Cache,
                        })
                    }
                    Ok(None) => {
                        log_stage(&key, FetchStage::MissThrow);
                        Err(network_error)
                    }
                    Err(store_error) => {
                        warn!(request = %key, error = %store_error, "Cache lookup failed");
                        log_stage(&key, FetchStage::MissThrow);
                        Err(network_error)
                    }
                }
            }
        }
    }

    /// Routes all following requests to `version`, then deletes every other
    /// cache.
    pub async fn activate(&self, version: &CacheVersion) -> Result<Activation, DomainError> {
        let active = version.name();
        *self.active_cache.write().await = active.clone();

        let mut deleted = Vec::new();

        for name in self.store.cache_names().await? {
            if name != active && self.store.delete_cache(&name).await? {
                info!(cache = %name, "Deleted stale response cache");
                deleted.push(name);
            }
        }

        info!(cache = %active, stale = deleted.len(), "Response cache activated");

        Ok(Activation { active, deleted })
    }

    /// Writes are dropped once `cache_name` is no longer active. The read lock
    /// is held across the write so `activate` cannot sweep in between.
    fn spawn_cache_update(&self, cache_name: String, key: RequestKey, response: EdgeResponse) {
        let store = Arc::clone(&self.store);
        let active_cache = Arc::clone(&self.active_cache);
        tokio::spawn(async move {
            let active = active_cache.read().await;
            if *active != cache_name {
                debug!(request = %key, cache = %cache_name, "Cache retired, update dropped");
                return;
            }

            if let Err(e) = store.put(&cache_name, key.clone(), response).await {
                warn!(request = %key, error = %e, "Failed to update response cache");
            }
        });
    }
}

fn log_stage(key: &RequestKey, stage: FetchStage) {
    debug!(request = %key, stage = ?stage, "Edge fetch");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::edge::MockFetcher;
    use crate::infrastructure::edge::InMemoryResponseStore;

    fn version(build_id: &str) -> CacheVersion {
        CacheVersion::new("restnvest", build_id)
    }

    fn edge(fetcher: MockFetcher, store: &InMemoryResponseStore) -> NetworkFirst {
        NetworkFirst::new(Arc::new(fetcher), Arc::new(store.clone()), &version("1"))
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_network_success_is_returned_and_cached() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(EdgeResponse::ok("<html>home</html>")));

        let store = InMemoryResponseStore::new();
        let edge = edge(fetcher, &store);

        let outcome = edge.handle(EdgeRequest::get("/")).await.unwrap();
        assert_eq!(outcome.source, ResponseSource::Network);
        assert_eq!(outcome.response.body, "<html>home</html>");

        settle().await;
        let cached = store
            .match_request("restnvest-1", &EdgeRequest::get("/").key())
            .await
            .unwrap();
        assert_eq!(cached.unwrap().body, "<html>home</html>");
    }

    #[tokio::test]
    async fn test_non_ok_status_is_not_cached() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(EdgeResponse::new(StatusCode::NOT_FOUND, "missing")));

        let store = InMemoryResponseStore::new();
        let edge = edge(fetcher, &store);

        let outcome = edge.handle(EdgeRequest::get("/nope")).await.unwrap();
        assert_eq!(outcome.response.status, StatusCode::NOT_FOUND);

        settle().await;
        assert_eq!(store.entry_count("restnvest-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_cached_response() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(DomainError::upstream("connection refused")));

        let store = InMemoryResponseStore::new();
        store
            .put(
                "restnvest-1",
                EdgeRequest::get("/filings?ticker=AAPL").key(),
                EdgeResponse::ok("cached filings"),
            )
            .await
            .unwrap();
        let edge = edge(fetcher, &store);

        let outcome = edge
            .handle(EdgeRequest::get("/filings?ticker=AAPL"))
            .await
            .unwrap();
        assert_eq!(outcome.source, ResponseSource::Cache);
        assert_eq!(outcome.response.body, "cached filings");
    }

    #[tokio::test]
    async fn test_failure_without_cache_returns_original_error() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(DomainError::upstream("connection refused")));

        let store = InMemoryResponseStore::new();
        let edge = edge(fetcher, &store);

        let err = edge.handle(EdgeRequest::get("/offline")).await.unwrap_err();
        assert!(matches!(err, DomainError::Upstream { .. }));
        assert_eq!(err.to_string(), "Upstream error: connection refused");
    }

    #[tokio::test]
    async fn test_online_then_offline_serves_last_response() {
        let mut fetcher = MockFetcher::new();
        let mut seq = mockall::Sequence::new();
        fetcher
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(EdgeResponse::ok("fresh")));
        fetcher
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(DomainError::upstream("offline")));

        let store = InMemoryResponseStore::new();
        let edge = edge(fetcher, &store);

        edge.handle(EdgeRequest::get("/about")).await.unwrap();
        settle().await;

        let outcome = edge.handle(EdgeRequest::get("/about")).await.unwrap();
        assert_eq!(outcome.source, ResponseSource::Cache);
        assert_eq!(outcome.response.body, "fresh");
    }

    #[tokio::test]
    async fn test_api_requests_are_forwarded_once_and_not_cached() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|request| request.path_and_query == "/api/analysis/business/x")
            .times(1)
            .returning(|_| Ok(EdgeResponse::ok("{}")));

        let store = InMemoryResponseStore::new();
        let edge = edge(fetcher, &store);

        let outcome = edge
            .handle(EdgeRequest::get("/api/analysis/business/x"))
            .await
            .unwrap();
        assert_eq!(outcome.source, ResponseSource::Passthrough);

        settle().await;
        assert!(store.cache_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bypassed_failure_skips_cache() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(DomainError::upstream("offline")));

        let store = InMemoryResponseStore::new();
        store
            .put(
                "restnvest-1",
                EdgeRequest::get("/api/health").key(),
                EdgeResponse::ok("stale"),
            )
            .await
            .unwrap();
        let edge = edge(fetcher, &store);

        let err = edge.handle(EdgeRequest::get("/api/health")).await.unwrap_err();
        assert!(matches!(err, DomainError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_non_get_requests_bypass() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(EdgeResponse::ok("done")));

        let store = InMemoryResponseStore::new();
        let edge = edge(fetcher, &store);

        let outcome = edge
            .handle(EdgeRequest::new(Method::POST, "/contact").with_body("hi"))
            .await
            .unwrap();
        assert_eq!(outcome.source, ResponseSource::Passthrough);

        settle().await;
        assert_eq!(store.entry_count("restnvest-1").await.unwrap(), 0);
    }

    #[test]
    fn test_is_bypassed() {
        let store = InMemoryResponseStore::new();
        let edge = edge(MockFetcher::new(), &store);

        assert!(edge.is_bypassed(&EdgeRequest::get("/api/")));
        assert!(edge.is_bypassed(&EdgeRequest::get("/api")));
        assert!(edge.is_bypassed(&EdgeRequest::get("/api/x?y=1")));
        assert!(edge.is_bypassed(&EdgeRequest::new(Method::DELETE, "/")));
        assert!(!edge.is_bypassed(&EdgeRequest::get("/apiary")));
        assert!(!edge.is_bypassed(&EdgeRequest::get("/index.html")));

        let edge = edge.with_api_prefix("/v1/");
        assert!(edge.is_bypassed(&EdgeRequest::get("/v1/thing")));
        assert!(!edge.is_bypassed(&EdgeRequest::get("/api/thing")));
    }

    #[tokio::test]
    async fn test_activate_deletes_stale_caches_and_switches() {
        let store = InMemoryResponseStore::new();
        let key = EdgeRequest::get("/").key();
        store.put("restnvest-0", key.clone(), EdgeResponse::ok("v0")).await.unwrap();
        store.put("restnvest-1", key.clone(), EdgeResponse::ok("v1")).await.unwrap();
        store.put("other", key.clone(), EdgeResponse::ok("x")).await.unwrap();

        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(DomainError::upstream("offline")));
        let edge = edge(fetcher, &store);

        let activation = edge.activate(&version("2")).await.unwrap();
        assert_eq!(activation.active, "restnvest-2");
        assert_eq!(
            activation.deleted,
            vec!["other", "restnvest-0", "restnvest-1"]
        );
        assert_eq!(edge.active_cache().await, "restnvest-2");
        assert!(store.cache_names().await.unwrap().is_empty());

        // Old versions are gone, so an offline request misses
        assert!(edge.handle(EdgeRequest::get("/")).await.is_err());
    }

    #[tokio::test]
    async fn test_update_for_retired_cache_is_dropped() {
        let store = InMemoryResponseStore::new();
        let edge = edge(MockFetcher::new(), &store);
        let key = EdgeRequest::get("/").key();

        // A fetch that started under version 1 finishes after version 2 took over
        edge.activate(&version("2")).await.unwrap();
        edge.spawn_cache_update(version("1").name(), key.clone(), EdgeResponse::ok("late"));
        settle().await;

        assert!(store.cache_names().await.unwrap().is_empty());

        edge.spawn_cache_update(version("2").name(), key.clone(), EdgeResponse::ok("fresh"));
        settle().await;

        let cached = store.match_request("restnvest-2", &key).await.unwrap();
        assert_eq!(cached.unwrap().body, "fresh");
    }

    #[tokio::test]
    async fn test_activate_keeps_current_cache() {
        let store = InMemoryResponseStore::new();
        let key = EdgeRequest::get("/").key();
        store.put("restnvest-1", key.clone(), EdgeResponse::ok("v1")).await.unwrap();
        store.put("restnvest-0", key, EdgeResponse::ok("v0")).await.unwrap();

        let edge = edge(MockFetcher::new(), &store);
        let activation = edge.activate(&version("1")).await.unwrap();

        assert_eq!(activation.deleted, vec!["restnvest-0"]);
        assert_eq!(store.cache_names().await.unwrap(), vec!["restnvest-1"]);
    }
}
