//! Serve command - analysis API plus the static site on one port

use tokio::net::TcpListener;
use tracing::info;

use crate::api::router::create_router_with_state;

/// Run the API server
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap();

    let state = crate::create_app_state_with_config(&config).await?;
    let app = create_router_with_state(state);

    let addr = super::build_socket_addr(&config.server.host, config.server.port)?;
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(super::shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
