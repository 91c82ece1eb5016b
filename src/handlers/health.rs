//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// "ready" when the classifier and fallback providers have credentials,
    /// "unconfigured" otherwise
    pub pipeline: &'static str,
}

/// Health check handler
///
/// Always returns 200 OK; an unconfigured pipeline is reported, not failed.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let pipeline = match state.pipeline().check_configuration() {
        Ok(()) => "ready",
        Err(e) => {
            tracing::debug!(error = %e, "Pipeline is not fully configured");
            "unconfigured"
        }
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            pipeline,
        }),
    )
}
