// src/api/mod.rs — HTTP surface for the session ledger

pub mod auth;
pub mod handlers;
pub mod types;

use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::TokenVerifier;
use crate::infra::config::ServerConfig;
use crate::ledger::store_server::StoreHandle;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StoreHandle,
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/{id}", get(handlers::read_messages))
        .route("/sessions/{id}", delete(handlers::delete_session))
        .route("/sessions/{id}/messages", post(handlers::append_messages))
        .layer(cors)
        .with_state(state)
}

/// Start the API server on the configured port (blocking).
pub async fn start_server(config: &ServerConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("127.0.0.1:{}", config.port);

    let router = build_router(state);

    tracing::info!("ledger API listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
