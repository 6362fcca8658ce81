//! HTTP surface for calsync.
//!
//! A single read-only endpoint, `GET /api/getEvents`, returning the upcoming
//! events of the configured calendar as a JSON array. Any failure becomes a
//! `500` with the body `Error fetching events`.

mod config;
mod error;
mod routes;
mod state;

use tracing::info;

pub use config::ServerConfig;
pub use error::{ApiError, FETCH_ERROR_BODY, ServerError, ServerResult};
pub use routes::{EVENTS_PATH, router};
pub use state::{AppState, SharedWorkflow};

/// Binds `config`'s address and serves until Ctrl-C.
pub async fn serve(config: &ServerConfig, state: AppState) -> ServerResult<()> {
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!("listening on http://{}{}", addr, EVENTS_PATH);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
