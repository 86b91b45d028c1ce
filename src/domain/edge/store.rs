//! Named response caches and their deployment versioning

use std::fmt::{self, Debug};

use async_trait::async_trait;
use chrono::Utc;

use super::message::{EdgeResponse, RequestKey};
use crate::domain::DomainError;

/// Request to response store partitioned into named caches
#[async_trait]
pub trait ResponseStore: Send + Sync + Debug {
    /// Stores a response, replacing any previous one for the same request
    async fn put(
        &self,
        cache_name: &str,
        key: RequestKey,
        response: EdgeResponse,
    ) -> Result<(), DomainError>;

    /// Finds the stored response for exactly this request
    async fn match_request(
        &self,
        cache_name: &str,
        key: &RequestKey,
    ) -> Result<Option<EdgeResponse>, DomainError>;

    /// Names of every cache currently held
    async fn cache_names(&self) -> Result<Vec<String>, DomainError>;

    /// Drops a whole cache; returns whether it existed
    async fn delete_cache(&self, cache_name: &str) -> Result<bool, DomainError>;

    /// Number of responses held in one cache
    async fn entry_count(&self, cache_name: &str) -> Result<usize, DomainError>;
}

/// Deployment-scoped cache name, `<prefix>-<build id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheVersion {
    prefix: String,
    build_id: String,
}

impl CacheVersion {
    pub fn new(prefix: impl Into<String>, build_id: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            build_id: build_id.into(),
        }
    }

    /// Uses the current time in milliseconds as the build id, so every
    /// process start gets a fresh cache.
    pub fn from_start_time(prefix: impl Into<String>) -> Self {
        Self::new(prefix, Utc::now().timestamp_millis().to_string())
    }

    pub fn name(&self) -> String {
        format!("{}-{}", self.prefix, self.build_id)
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.build_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_version_name() {
        let version = CacheVersion::new("restnvest", "1700000000000");
        assert_eq!(version.name(), "restnvest-1700000000000");
        assert_eq!(version.to_string(), version.name());
    }

    #[test]
    fn test_from_start_time_uses_prefix() {
        let version = CacheVersion::from_start_time("restnvest");
        let name = version.name();

        let build_id = name.strip_prefix("restnvest-").unwrap();
        assert!(build_id.parse::<i64>().is_ok());
    }
}
