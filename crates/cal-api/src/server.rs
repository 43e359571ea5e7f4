//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use axum::{Router, middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use cal_core::intent::{CheckpointStore, Intent};
use cal_core::{Config, Transcript, TranslatorClient};
use cal_relay::MessageRelay;

use crate::middleware::auth::auth_middleware;
use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub relay: Arc<MessageRelay<Intent>>,
    pub checkpoint: Arc<CheckpointStore>,
    pub transcript: Arc<Transcript>,
    pub translator: Arc<TranslatorClient>,
}

/// Start the HTTP API server
pub async fn start_server(port: u16, state: AppState) -> anyhow::Result<()> {
    let app = Router::new()
        .merge(routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
