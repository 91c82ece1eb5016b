//! Pipeline run endpoint
//!
//! Handles POST /run: one full Classifier → Router → Executor → Verifier →
//! Fallback pass per request.

use crate::error::AppError;
use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::router::{RunMode, Task};
use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum allowed input length in characters
pub const MAX_INPUT_LENGTH: usize = 1_000_000;

/// Run request from client
///
/// Validation is enforced during deserialization - invalid instances cannot exist.
#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    task: Task,
    input: String,
    mode: RunMode,
}

impl RunRequest {
    pub fn task(&self) -> Task {
        self.task
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }
}

impl<'de> Deserialize<'de> for RunRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawRunRequest {
            task: Task,
            input: String,
            #[serde(default)]
            mode: RunMode,
        }

        let raw = RawRunRequest::deserialize(deserializer)?;
        validate_text("input", &raw.input).map_err(serde::de::Error::custom)?;

        Ok(RunRequest {
            task: raw.task,
            input: raw.input,
            mode: raw.mode,
        })
    }
}

/// Shared text-field check for request bodies: non-blank and bounded in chars
pub(crate) fn validate_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!(
            "{} cannot be empty or contain only whitespace",
            field
        ));
    }

    let char_count = value.chars().count();
    if char_count > MAX_INPUT_LENGTH {
        return Err(format!(
            "{} exceeds maximum length of {} characters (got {})",
            field, MAX_INPUT_LENGTH, char_count
        ));
    }

    Ok(())
}

/// POST /run handler
///
/// Rejects the request up front when the classifier or fallback provider has
/// no credential. Otherwise always answers 200 with a [`RunReport`]; backend
/// failures show up in its trace, not as HTTP errors.
///
/// [`RunReport`]: crate::pipeline::RunReport
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RunRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!(
        request_id = %request_id,
        task = %request.task(),
        mode = %request.mode(),
        input_length = request.input().chars().count(),
        "Received run request"
    );

    state.pipeline().check_configuration()?;

    let RunRequest { task, input, mode } = request;
    let report = state.pipeline().run(task, input, mode).await;

    tracing::info!(
        request_id = %request_id,
        task = %task,
        backend = %report.winning_backend,
        verified = report.verified,
        fallback_used = report.fallback_used,
        "Run request completed"
    );

    Ok(Json(report))
}
