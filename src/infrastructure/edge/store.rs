//! In-memory named response caches

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::edge::{EdgeResponse, RequestKey, ResponseStore};
use crate::domain::DomainError;

type NamedCaches = HashMap<String, HashMap<RequestKey, EdgeResponse>>;

/// Process-local `ResponseStore`; contents are lost on restart
#[derive(Debug, Clone, Default)]
pub struct InMemoryResponseStore {
    caches: Arc<RwLock<NamedCaches>>,
}

impl InMemoryResponseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseStore for InMemoryResponseStore {
    async fn put(
        &self,
        cache_name: &str,
        key: RequestKey,
        response: EdgeResponse,
    ) -> Result<(), DomainError> {
        let mut caches = self.caches.write().await;
        caches
            .entry(cache_name.to_string())
            .or_default()
            .insert(key, response);
        Ok(())
    }

    async fn match_request(
        &self,
        cache_name: &str,
        key: &RequestKey,
    ) -> Result<Option<EdgeResponse>, DomainError> {
        let caches = self.caches.read().await;
        Ok(caches
            .get(cache_name)
            .and_then(|cache| cache.get(key))
            .cloned())
    }

    async fn cache_names(&self) -> Result<Vec<String>, DomainError> {
        let caches = self.caches.read().await;
        let mut names: Vec<String> = caches.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_cache(&self, cache_name: &str) -> Result<bool, DomainError> {
        let mut caches = self.caches.write().await;
        Ok(caches.remove(cache_name).is_some())
    }

    async fn entry_count(&self, cache_name: &str) -> Result<usize, DomainError> {
        let caches = self.caches.read().await;
        Ok(caches.get(cache_name).map_or(0, HashMap::len))
    }
}
