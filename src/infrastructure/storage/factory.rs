//! Storage factory for runtime backend selection

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::domain::analysis::{AnalysisKind, AnalysisRepository};
use crate::domain::DomainError;
use crate::infrastructure::analysis::{InMemoryAnalysisRepository, PostgresAnalysisRepository};

use super::migrations::run_storage_migrations;
use super::postgres::{connect_pool, PostgresConfig};

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres {
        config: PostgresConfig,
        run_migrations: bool,
    },
}

impl StorageConfig {
    /// Postgres when a URL is present, in-memory otherwise
    pub fn from_url(url: Option<&str>, max_connections: u32, run_migrations: bool) -> Self {
        match url.filter(|u| !u.trim().is_empty()) {
            Some(url) => Self::Postgres {
                config: PostgresConfig::new(url).with_max_connections(max_connections),
                run_migrations,
            },
            None => Self::InMemory,
        }
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres { .. } => StorageType::Postgres,
        }
    }
}

/// The three analysis repositories, one per table
#[derive(Debug, Clone)]
pub struct AnalysisRepositories {
    pub business: Arc<dyn AnalysisRepository>,
    pub footnotes: Arc<dyn AnalysisRepository>,
    pub temporal: Arc<dyn AnalysisRepository>,
}

impl AnalysisRepositories {
    pub fn in_memory() -> Self {
        Self {
            business: Arc::new(InMemoryAnalysisRepository::new(AnalysisKind::Business)),
            footnotes: Arc::new(InMemoryAnalysisRepository::new(AnalysisKind::Footnotes)),
            temporal: Arc::new(InMemoryAnalysisRepository::new(AnalysisKind::Temporal)),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            business: Arc::new(PostgresAnalysisRepository::new(
                pool.clone(),
                AnalysisKind::Business,
            )),
            footnotes: Arc::new(PostgresAnalysisRepository::new(
                pool.clone(),
                AnalysisKind::Footnotes,
            )),
            temporal: Arc::new(PostgresAnalysisRepository::new(pool, AnalysisKind::Temporal)),
        }
    }

    /// Repository backing the table for `kind`
    pub fn for_kind(&self, kind: AnalysisKind) -> &dyn AnalysisRepository {
        match kind {
            AnalysisKind::Business => self.business.as_ref(),
            AnalysisKind::Footnotes => self.footnotes.as_ref(),
            AnalysisKind::Temporal => self.temporal.as_ref(),
        }
    }
}

/// Factory for creating analysis repositories
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates the repositories for the configured backend
    pub async fn create(config: &StorageConfig) -> Result<AnalysisRepositories, DomainError> {
        match config {
            StorageConfig::InMemory => {
                warn!("No database configured; analyses are kept in memory only");
                Ok(AnalysisRepositories::in_memory())
            }
            StorageConfig::Postgres {
                config,
                run_migrations,
            } => {
                let pool = connect_pool(config).await?;

                if *run_migrations {
                    run_storage_migrations(&pool).await?;
                    info!("Storage migrations applied");
                }

                Ok(AnalysisRepositories::postgres(pool))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_from_url() {
        let config = StorageConfig::from_url(Some("postgres://localhost/db"), 5, true);
        assert_eq!(config.storage_type(), StorageType::Postgres);

        match config {
            StorageConfig::Postgres { config, .. } => assert_eq!(config.max_connections, 5),
            StorageConfig::InMemory => panic!("expected postgres"),
        }

        assert_eq!(
            StorageConfig::from_url(None, 5, true).storage_type(),
            StorageType::InMemory
        );
        assert_eq!(
            StorageConfig::from_url(Some("  "), 5, true).storage_type(),
            StorageType::InMemory
        );
    }

    #[tokio::test]
    async fn test_create_in_memory() {
        let repos = StorageFactory::create(&StorageConfig::InMemory).await.unwrap();

        assert_eq!(repos.business.count().await.unwrap(), 0);
        assert_eq!(repos.footnotes.count().await.unwrap(), 0);
        assert_eq!(repos.temporal.count().await.unwrap(), 0);

        for kind in [AnalysisKind::Business, AnalysisKind::Footnotes, AnalysisKind::Temporal] {
            assert_eq!(repos.for_kind(kind).kind(), kind);
        }
    }
}
