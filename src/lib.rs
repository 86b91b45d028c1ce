//! Restnvest cache layer
//!
//! Persists AI-generated SEC filing analyses keyed by a deterministic cache
//! key, fronts them with a process-local TTL cache, and ships an offline
//! capable edge proxy:
//! - Business, footnotes and temporal analysis repositories (Postgres or in-memory)
//! - Lazily evicted memory cache
//! - Network-first / cache-fallback edge proxy with versioned response caches

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::Cache;
use infrastructure::cache::{MemoryCache, MemoryCacheConfig};
use infrastructure::services::{AnalysisService, AnalysisServiceConfig};
use infrastructure::storage::{StorageConfig, StorageFactory};
use tracing::info;

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = StorageConfig::from_url(
        config.database.url.as_deref(),
        config.database.max_connections,
        config.database.run_migrations,
    );
    info!("Storage backend: {:?}", storage_config.storage_type());

    let repositories = StorageFactory::create(&storage_config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e))?;

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::with_config(
        MemoryCacheConfig::default().with_default_ttl(config.cache.default_ttl()),
    ));

    let mut service_config = AnalysisServiceConfig::default();
    if !config.cache.enabled {
        info!("Memory cache disabled; every lookup reads the analysis store");
        service_config = service_config.without_memory_cache();
    }

    let analysis_service =
        AnalysisService::with_config(repositories, Arc::clone(&cache), service_config);

    Ok(AppState::new(Arc::new(analysis_service), cache))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_state_is_in_memory() {
        let state = create_app_state().await.unwrap();
        let stats = state.analysis_service.stats().await.unwrap();

        assert_eq!(stats.business, 0);
        assert_eq!(stats.footnotes, 0);
        assert_eq!(stats.temporal, 0);
        assert_eq!(state.cache.size().await.unwrap(), 0);
    }
}
