//! Analysis repository trait

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use super::entity::{AnalysisRecord, NewAnalysis};
use super::key::AnalysisKind;
use crate::domain::DomainError;

/// Cache-key keyed store of analysis results for one analysis kind.
///
/// Results are opaque JSON documents returned exactly as inserted. Rows are
/// insert-once: a second insert for an existing key is a silent no-op and
/// the first stored result is kept. Nothing here updates or deletes a row.
#[async_trait]
pub trait AnalysisRepository: Send + Sync + Debug {
    /// Analysis kind whose table this repository covers
    fn kind(&self) -> AnalysisKind;

    /// Looks up the stored result for a cache key
    async fn get_by_cache_key(&self, cache_key: &str) -> Result<Option<Value>, DomainError> {
        Ok(self.get_record(cache_key).await?.map(|record| record.result))
    }

    /// Looks up the full stored row for a cache key
    async fn get_record(
        &self,
        cache_key: &str,
    ) -> Result<Option<AnalysisRecord<Value>>, DomainError>;

    /// Inserts a row unless one with the same cache key already exists
    async fn insert(&self, analysis: NewAnalysis<Value>) -> Result<(), DomainError>;

    /// Number of stored rows
    async fn count(&self) -> Result<usize, DomainError>;
}
