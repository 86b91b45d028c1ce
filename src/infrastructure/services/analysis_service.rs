//! Analysis lookup service: memory cache in front of the analysis tables

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::analysis::{
    validate_cache_key, AnalysisKind, AnalysisPayload, CompanySummary, FinePrintAnalysis,
    NewAnalysis, TemporalAnalysis,
};
use crate::domain::cache::{Cache, CacheExt};
use crate::domain::DomainError;
use crate::infrastructure::storage::AnalysisRepositories;

/// Configuration for the analysis service
#[derive(Debug, Clone)]
pub struct AnalysisServiceConfig {
    /// Namespace prefix for memory cache keys
    pub namespace: String,
    /// TTL for memory cache entries; `None` uses the cache's default
    pub memory_ttl: Option<Duration>,
    /// Whether lookups go through the memory cache at all
    pub memory_cache_enabled: bool,
}

impl Default for AnalysisServiceConfig {
    fn default() -> Self {
        Self {
            namespace: "analysis".to_string(),
            memory_ttl: None,
            memory_cache_enabled: true,
        }
    }
}

impl AnalysisServiceConfig {
    pub fn with_memory_ttl(mut self, ttl: Duration) -> Self {
        self.memory_ttl = Some(ttl);
        self
    }

    /// Disables the memory cache; every lookup hits the repository
    pub fn without_memory_cache(mut self) -> Self {
        self.memory_cache_enabled = false;
        self
    }
}

/// Row counts per analysis table plus the memory cache size
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisStats {
    pub business: usize,
    pub footnotes: usize,
    pub temporal: usize,
    pub memory_entries: usize,
}

/// Entry point for cached analysis reads and writes.
///
/// The memory cache is advisory: its failures are logged and the
/// repository stays the source of truth.
#[derive(Debug, Clone)]
pub struct AnalysisService {
    repositories: AnalysisRepositories,
    cache: Arc<dyn Cache>,
    config: AnalysisServiceConfig,
}

impl AnalysisService {
    pub fn new(repositories: AnalysisRepositories, cache: Arc<dyn Cache>) -> Self {
        Self::with_config(repositories, cache, AnalysisServiceConfig::default())
    }

    pub fn with_config(
        repositories: AnalysisRepositories,
        cache: Arc<dyn Cache>,
        config: AnalysisServiceConfig,
    ) -> Self {
        Self {
            repositories,
            cache,
            config,
        }
    }

    pub async fn get_business_by_cache_key(
        &self,
        cache_key: &str,
    ) -> Result<Option<CompanySummary>, DomainError> {
        self.lookup_typed(cache_key).await
    }

    pub async fn insert_business_analysis(
        &self,
        analysis: NewAnalysis<CompanySummary>,
    ) -> Result<(), DomainError> {
        self.insert_typed(analysis).await
    }

    pub async fn get_footnotes_by_cache_key(
        &self,
        cache_key: &str,
    ) -> Result<Option<FinePrintAnalysis>, DomainError> {
        self.lookup_typed(cache_key).await
    }

    pub async fn insert_footnotes_analysis(
        &self,
        analysis: NewAnalysis<FinePrintAnalysis>,
    ) -> Result<(), DomainError> {
        self.insert_typed(analysis).await
    }

    pub async fn get_temporal_by_cache_key(
        &self,
        cache_key: &str,
    ) -> Result<Option<TemporalAnalysis>, DomainError> {
        self.lookup_typed(cache_key).await
    }

    pub async fn insert_temporal_analysis(
        &self,
        analysis: NewAnalysis<TemporalAnalysis>,
    ) -> Result<(), DomainError> {
        self.insert_typed(analysis).await
    }

    pub async fn get_or_compute_business<F, Fut>(
        &self,
        cache_key: &str,
        compute: F,
    ) -> Result<CompanySummary, DomainError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<NewAnalysis<CompanySummary>, DomainError>> + Send,
    {
        self.read_through(cache_key, compute).await
    }

    pub async fn get_or_compute_footnotes<F, Fut>(
        &self,
        cache_key: &str,
        compute: F,
    ) -> Result<FinePrintAnalysis, DomainError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<NewAnalysis<FinePrintAnalysis>, DomainError>> + Send,
    {
        self.read_through(cache_key, compute).await
    }

    pub async fn get_or_compute_temporal<F, Fut>(
        &self,
        cache_key: &str,
        compute: F,
    ) -> Result<TemporalAnalysis, DomainError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<NewAnalysis<TemporalAnalysis>, DomainError>> + Send,
    {
        self.read_through(cache_key, compute).await
    }

    /// Kind-dispatched lookup returning the stored document unchanged
    pub async fn get_json(
        &self,
        kind: AnalysisKind,
        cache_key: &str,
    ) -> Result<Option<Value>, DomainError> {
        self.lookup(kind, cache_key).await
    }

    /// Kind-dispatched insert; the result document is stored as given
    pub async fn insert_json(
        &self,
        kind: AnalysisKind,
        analysis: NewAnalysis<Value>,
    ) -> Result<(), DomainError> {
        self.insert(kind, analysis).await
    }

    pub async fn stats(&self) -> Result<AnalysisStats, DomainError> {
        let (business, footnotes, temporal, memory_entries) = futures::try_join!(
            self.repositories.business.count(),
            self.repositories.footnotes.count(),
            self.repositories.temporal.count(),
            self.cache.size(),
        )?;

        Ok(AnalysisStats {
            business,
            footnotes,
            temporal,
            memory_entries,
        })
    }

    fn memory_key(&self, kind: AnalysisKind, cache_key: &str) -> String {
        format!("{}:{}:{}", self.config.namespace, kind, cache_key)
    }

    async fn lookup(
        &self,
        kind: AnalysisKind,
        cache_key: &str,
    ) -> Result<Option<Value>, DomainError> {
        validate_cache_key(cache_key)?;
        let memory_key = self.memory_key(kind, cache_key);

        if self.config.memory_cache_enabled {
            match self.cache.get::<Value>(&memory_key).await {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => {}
                Err(e) => warn!(key = %memory_key, error = %e, "Memory cache read failed"),
            }
        }

        let stored = self
            .repositories
            .for_kind(kind)
            .get_by_cache_key(cache_key)
            .await?;

        match &stored {
            Some(value) if self.config.memory_cache_enabled => {
                if let Err(e) = self
                    .cache
                    .set(&memory_key, value, self.config.memory_ttl)
                    .await
                {
                    warn!(key = %memory_key, error = %e, "Memory cache write failed");
                }
            }
            Some(_) => {}
            None => debug!(kind = %kind, cache_key = %cache_key, "Analysis not stored"),
        }

        Ok(stored)
    }

    async fn insert(
        &self,
        kind: AnalysisKind,
        analysis: NewAnalysis<Value>,
    ) -> Result<(), DomainError> {
        analysis.validate_for(kind)?;
        self.repositories.for_kind(kind).insert(analysis).await
    }

    async fn lookup_typed<T: AnalysisPayload>(
        &self,
        cache_key: &str,
    ) -> Result<Option<T>, DomainError> {
        self.lookup(T::KIND, cache_key)
            .await?
            .map(|document| T::from_document(cache_key, document))
            .transpose()
    }

    async fn insert_typed<T: AnalysisPayload>(
        &self,
        analysis: NewAnalysis<T>,
    ) -> Result<(), DomainError> {
        self.insert(T::KIND, analysis.into_document()?).await
    }

    async fn read_through<T, F, Fut>(&self, cache_key: &str, compute: F) -> Result<T, DomainError>
    where
        T: AnalysisPayload,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<NewAnalysis<T>, DomainError>> + Send,
    {
        if let Some(value) = self.lookup_typed(cache_key).await? {
            return Ok(value);
        }

        info!(kind = %T::KIND, cache_key = %cache_key, "Computing analysis");

        let mut analysis = compute().await?;
        analysis.cache_key = cache_key.to_string();
        let computed = analysis.result.clone();

        self.insert_typed(analysis).await?;

        // A concurrent writer may have won the insert; serve what was stored.
        Ok(self.lookup_typed(cache_key).await?.unwrap_or(computed))
    }
}
