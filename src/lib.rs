//! Pentamind - Task router for specialized LLM backends
//!
//! Every task runs through a five-stage pipeline: a cheap classifier infers
//! intent and output format, a deterministic router picks the backend, the
//! executor calls it (with web-search augmentation for research), a verifier
//! checks the output format, and a fallback backend retries once when the
//! result is missing or malformed. Each run returns an explainable report
//! with a scoreboard and a per-stage trace.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
pub mod providers;
pub mod router;
pub mod telemetry;

use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Build the HTTP application over shared state
///
/// Routes: `POST /run`, `POST /infer`, `GET /health`, `GET /metrics`.
pub fn app(state: handlers::AppState) -> axum::Router {
    axum::Router::new()
        .route("/run", post(handlers::run::handler))
        .route("/infer", post(handlers::infer::handler))
        .route("/health", get(handlers::health::handler))
        .route("/metrics", get(handlers::metrics::handler))
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
