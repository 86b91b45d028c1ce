//! Migrate command - creates or drops the analysis tables

use clap::Args;
use tracing::{info, warn};

use crate::infrastructure::storage::{
    connect_pool, revert_last_migration, run_storage_migrations, PostgresConfig,
};

#[derive(Args, Clone, Debug)]
pub struct MigrateArgs {
    /// Revert the most recently applied migration instead of applying
    #[arg(long)]
    pub revert: bool,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();

    let url = config
        .database
        .url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("database.url (APP__DATABASE__URL) is required"))?;

    let pool = connect_pool(
        &PostgresConfig::new(url).with_max_connections(config.database.max_connections),
    )
    .await?;

    if args.revert {
        match revert_last_migration(&pool).await? {
            Some(version) => info!("Reverted migration {}", version),
            None => warn!("No applied migrations to revert"),
        }
    } else {
        let applied = run_storage_migrations(&pool).await?;
        info!("Applied {} migration(s)", applied);
    }

    pool.close().await;

    Ok(())
}
