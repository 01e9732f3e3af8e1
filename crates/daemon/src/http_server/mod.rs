use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{ServiceConfig, ServiceState};

pub mod api;
pub mod health;
pub mod terminal;

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("failed to bind {0}: {1}")]
    Bind(std::net::SocketAddr, std::io::Error),
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Every route the daemon serves
pub fn router(state: ServiceState) -> Router {
    Router::new()
        .nest("/_status", health::router(state.clone()))
        .nest("/api", api::router(state.clone()))
        .route("/terminal", get(terminal::handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn bind(config: &ServiceConfig) -> Result<TcpListener, HttpServerError> {
    TcpListener::bind(config.api_addr)
        .await
        .map_err(|e| HttpServerError::Bind(config.api_addr, e))
}

/// Serve until `shutdown_rx` fires, then drain in-flight requests
pub async fn run(
    listener: TcpListener,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "api server listening");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await
        .map_err(HttpServerError::Serve)
}
