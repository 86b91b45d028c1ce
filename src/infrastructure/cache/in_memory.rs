//! Process-local TTL cache built on moka

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Configuration for the memory cache
#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    /// TTL applied when `set` is called without one
    pub default_ttl: Duration,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl MemoryCacheConfig {
    /// Sets the default TTL
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    /// Serialized JSON value
    data: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process key/value cache with per-entry expiry.
///
/// No capacity bound and no moka-level TTL: an entry lives until it is
/// overwritten, deleted, or read after its expiry, at which point the read
/// evicts it. Entries that are never read again stay resident until the
/// process exits.
#[derive(Debug)]
pub struct MemoryCache {
    cache: MokaCache<String, CacheEntry>,
    config: MemoryCacheConfig,
}

impl MemoryCache {
    /// Creates a new memory cache with default configuration
    pub fn new() -> Self {
        Self::with_config(MemoryCacheConfig::default())
    }

    /// Creates a new memory cache with the given configuration
    pub fn with_config(config: MemoryCacheConfig) -> Self {
        Self {
            cache: MokaCache::builder().build(),
            config,
        }
    }

    pub fn config(&self) -> &MemoryCacheConfig {
        &self.config
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        match self.cache.get(key).await {
            Some(entry) if entry.is_expired(Instant::now()) => {
                self.cache.remove(key).await;
                debug!(key = %key, "memory cache EXPIRED");
                Ok(None)
            }
            Some(entry) => {
                debug!(key = %key, "memory cache HIT");
                Ok(Some(entry.data))
            }
            None => {
                debug!(key = %key, "memory cache MISS");
                Ok(None)
            }
        }
    }

    async fn set_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let entry = CacheEntry {
            data: value.to_string(),
            expires_at: Instant::now() + ttl,
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}
