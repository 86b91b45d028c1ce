//! Application state for shared services

use std::sync::Arc;

use crate::domain::Cache;
use crate::infrastructure::cache::MemoryCache;
use crate::infrastructure::services::AnalysisService;
use crate::infrastructure::storage::AnalysisRepositories;

/// Shared services handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub analysis_service: Arc<AnalysisService>,
    /// The process-wide memory cache, also used by `analysis_service`
    pub cache: Arc<dyn Cache>,
}

impl AppState {
    pub fn new(analysis_service: Arc<AnalysisService>, cache: Arc<dyn Cache>) -> Self {
        Self {
            analysis_service,
            cache,
        }
    }

    /// In-memory repositories and a default memory cache
    pub fn in_memory() -> Self {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
        let service = AnalysisService::new(AnalysisRepositories::in_memory(), Arc::clone(&cache));

        Self::new(Arc::new(service), cache)
    }
}
