//! In-memory analysis repository

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::analysis::{AnalysisKind, AnalysisRecord, AnalysisRepository, NewAnalysis};
use crate::domain::DomainError;

/// Process-local analysis repository with the same insert-once semantics as
/// the Postgres one. Used when no database is configured.
#[derive(Debug)]
pub struct InMemoryAnalysisRepository {
    kind: AnalysisKind,
    records: Arc<RwLock<HashMap<String, AnalysisRecord<Value>>>>,
}

impl InMemoryAnalysisRepository {
    pub fn new(kind: AnalysisKind) -> Self {
        Self {
            kind,
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl AnalysisRepository for InMemoryAnalysisRepository {
    fn kind(&self) -> AnalysisKind {
        self.kind
    }

    async fn get_record(
        &self,
        cache_key: &str,
    ) -> Result<Option<AnalysisRecord<Value>>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(cache_key).cloned())
    }

    async fn insert(&self, analysis: NewAnalysis<Value>) -> Result<(), DomainError> {
        let mut records = self.records.write().await;

        match records.entry(analysis.cache_key.clone()) {
            Entry::Occupied(_) => {
                debug!(
                    kind = %self.kind,
                    cache_key = %analysis.cache_key,
                    "Analysis already stored, insert ignored"
                );
            }
            Entry::Vacant(slot) => {
                slot.insert(AnalysisRecord::from_new(analysis, Utc::now()));
            }
        }

        Ok(())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.records.read().await.len())
    }
}
