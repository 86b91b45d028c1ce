//! Edge command - network-first proxy with an offline response cache

use std::sync::Arc;

use clap::Args;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::edge::create_edge_router;
use crate::config::EdgeConfig;
use crate::domain::edge::{CacheVersion, Fetcher, ResponseStore};
use crate::infrastructure::edge::{HttpFetcher, InMemoryResponseStore, NetworkFirst};

/// Arguments for the edge command; each overrides the `edge` config section
#[derive(Args, Clone, Debug)]
pub struct EdgeArgs {
    /// Origin to forward requests to
    #[arg(long)]
    pub origin_url: Option<String>,

    /// Build identifier naming the response cache
    #[arg(long)]
    pub build_id: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,
}

impl EdgeArgs {
    fn apply(&self, mut config: EdgeConfig) -> EdgeConfig {
        if let Some(origin_url) = &self.origin_url {
            config.origin_url = origin_url.clone();
        }
        if let Some(build_id) = &self.build_id {
            config.build_id = Some(build_id.clone());
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config
    }
}

/// Run the edge proxy
pub async fn run(args: EdgeArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let edge_config = args.apply(config.edge.clone());

    let version = cache_version(&edge_config);
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&edge_config.origin_url)?);
    let store: Arc<dyn ResponseStore> = Arc::new(InMemoryResponseStore::new());

    let edge = NetworkFirst::new(fetcher, store, &version)
        .with_api_prefix(edge_config.api_prefix.clone());
    edge.activate(&version).await?;

    let app = create_edge_router(Arc::new(edge));

    let addr = super::build_socket_addr(&config.server.host, edge_config.port)?;
    info!(
        "Starting edge proxy on {} (origin {}, cache {})",
        addr, edge_config.origin_url, version
    );

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(super::shutdown_signal())
        .await?;

    info!("Edge proxy shutdown complete");

    Ok(())
}

fn cache_version(config: &EdgeConfig) -> CacheVersion {
    match &config.build_id {
        Some(build_id) => CacheVersion::new(&config.cache_prefix, build_id),
        None => CacheVersion::from_start_time(&config.cache_prefix),
    }
}
