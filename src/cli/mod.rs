//! CLI module for Restnvest
//!
//! Provides subcommands:
//! - `serve`: analysis cache API + static site
//! - `edge`: offline-capable proxy in front of an origin
//! - `migrate`: apply or revert the analysis table migrations

pub mod edge;
pub mod migrate;
pub mod serve;

use std::net::{IpAddr, SocketAddr};

use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Restnvest - cached SEC filing analyses and offline edge proxy
#[derive(Parser)]
#[command(name = "restnvest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the analysis API and static site
    Serve,

    /// Run the network-first edge proxy
    Edge(edge::EdgeArgs),

    /// Apply (or revert) database migrations
    Migrate(migrate::MigrateArgs),
}

/// Loads `.env`, the layered configuration and the global subscriber
fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    });
    logging::init_logging(&config.logging);

    config
}

fn build_socket_addr(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((host.parse::<IpAddr>()?, port)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
