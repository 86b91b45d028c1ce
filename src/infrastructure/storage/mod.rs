//! Storage infrastructure - database connectivity and backend selection

mod factory;
pub mod migrations;
mod postgres;

pub use factory::{AnalysisRepositories, StorageConfig, StorageFactory, StorageType};
pub use migrations::{revert_last_migration, run_storage_migrations, Migration, PostgresMigrator};
pub use postgres::{connect_pool, PostgresConfig};
