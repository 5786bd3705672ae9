//! HTTP surface for the console.
//!
//! JSON over axum:
//! - `POST /api/commands/execute` — submit a command against a host
//! - `GET  /api/commands/history` — last 50 jobs, newest first
//! - `GET  /api/logs/activity`   — last 100 audit events, newest first
//! - `GET  /api/health`          — liveness probe

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::core::ExecutionService;

/// Shared state handed to every handler
pub struct AppState {
    pub service: ExecutionService,

    /// Acting operator id for console submissions (session handling is
    /// outside this service)
    pub operator: String,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

/// Build the router over the given state
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .route("/api/commands/execute", post(routes::execute_command))
        .route("/api/commands/history", get(routes::command_history))
        .route("/api/logs/activity", get(routes::activity_log))
        .with_state(app_state)
        .layer(cors)
}
