//! Fallback stage
//!
//! One last attempt against the designated reliable backend, with a
//! task-agnostic prompt. Runs at most once per run.

use super::state::{FallbackTrace, RunState, Stage, StagePayload, TraceRecord};
use super::{CallOverrides, Pipeline, prompts};

/// Placeholder quality for a result produced by the Fallback stage
const FALLBACK_QUALITY: f64 = 0.8;

impl Pipeline {
    /// Re-execute against the fallback backend
    ///
    /// Always marks the fallback as used. On failure the previous result (if
    /// any) is accepted as best effort.
    pub(crate) async fn fallback(&self, mut state: RunState) -> RunState {
        let fallback = self.table().fallback().clone();
        let format = state
            .classification()
            .map(|c| c.output_format)
            .unwrap_or_default();

        let system = format!(
            "{}{}",
            prompts::FALLBACK_SYSTEM_PROMPT,
            prompts::format_instructions(format)
        );
        let user = prompts::user_prompt(state.task(), state.input());

        tracing::info!(backend = %fallback, "Running fallback");
        if let Err(e) = self.metrics().record_fallback() {
            tracing::warn!(error = %e, "Failed to record fallback metric");
        }

        let result = self
            .call_backend(
                &fallback,
                &system,
                &user,
                CallOverrides {
                    timeout: Some(self.config().timeouts.standard()),
                    ..CallOverrides::default()
                },
            )
            .await;

        state.mark_fallback_used();
        let (latency_ms, trace) = match result {
            Ok(completion) => {
                state.annotate(
                    &fallback,
                    completion.latency_ms,
                    FALLBACK_QUALITY,
                    Some("Used as fallback".to_string()),
                );
                let model = self
                    .table()
                    .model_of(&fallback)
                    .unwrap_or_default()
                    .to_string();
                state.choose(fallback.clone(), model);
                state.set_result(Some(completion.text));
                (
                    completion.latency_ms,
                    FallbackTrace {
                        succeeded: true,
                        usage: Some(completion.usage),
                        error: None,
                    },
                )
            }
            Err(e) => {
                tracing::error!(
                    backend = %fallback,
                    error = %e,
                    has_previous_result = state.result().is_some(),
                    "Fallback failed, keeping previous result"
                );
                (
                    0,
                    FallbackTrace {
                        succeeded: false,
                        usage: None,
                        error: Some(e.to_string()),
                    },
                )
            }
        };

        // Best-effort acceptance; stays false when there is nothing to accept
        state.set_verified(true);
        state.record(TraceRecord {
            stage: Stage::Fallback,
            backend: Some(fallback),
            latency_ms,
            payload: StagePayload::Fallback(trace),
        });
        state
    }
}
