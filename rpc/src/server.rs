//! Axum-based RPC server.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::info;

use powrace_coordinator::WorkService;

use crate::error::RpcError;
use crate::handlers;

/// Build the RPC router over `service`.
pub fn build_router(service: Arc<WorkService>) -> Router {
    Router::new()
        .route("/", post(handlers::dispatch))
        .route("/metrics", get(handlers::metrics))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

pub struct RpcServer {
    pub port: u16,
    service: Arc<WorkService>,
}

impl RpcServer {
    pub fn new(port: u16, service: Arc<WorkService>) -> Self {
        Self { port, service }
    }

    /// Serve until `shutdown` fires.
    pub async fn start(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), RpcError> {
        let app = build_router(Arc::clone(&self.service));

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {addr}: {e}")))?;
        info!(%addr, "RPC server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!("RPC server stopped");
        Ok(())
    }
}
