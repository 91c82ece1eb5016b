//! Verifier stage
//!
//! Checks the result against the classification's output-format contract.
//! Pure: no backend is contacted.

use super::classifier::OutputFormat;
use super::state::{RunState, Stage, StagePayload, TraceRecord, VerifierTrace};
use std::time::Instant;

/// Check `result` against `format`, returning whether it passed and its notes
pub fn check_format(result: Option<&str>, format: OutputFormat) -> (bool, Vec<String>) {
    let Some(text) = result else {
        return (false, vec!["No result to verify".to_string()]);
    };

    let (passed, note) = match format {
        OutputFormat::Json => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(_) => (true, "Valid JSON".to_string()),
            Err(e) => (false, format!("Invalid JSON: {}", e)),
        },
        OutputFormat::Diff => {
            if text.contains("---") && text.contains("+++") {
                (true, "Diff format valid".to_string())
            } else if text.starts_with("diff") {
                (true, "Diff format detected".to_string())
            } else {
                (false, "Not a valid diff format".to_string())
            }
        }
        OutputFormat::Text => {
            if text.trim().is_empty() {
                (false, "Empty response".to_string())
            } else {
                (true, "Non-empty response".to_string())
            }
        }
    };
    (passed, vec![note])
}

/// Verify the current result and record the outcome
pub fn verify(mut state: RunState) -> RunState {
    let start = Instant::now();
    let format = state
        .classification()
        .map(|c| c.output_format)
        .unwrap_or_default();
    let (passed, notes) = check_format(state.result(), format);

    if passed {
        tracing::info!(format = format.as_str(), notes = ?notes, "Verification passed");
    } else {
        tracing::warn!(format = format.as_str(), notes = ?notes, "Verification failed");
    }

    state.set_verified(passed);
    state.record(TraceRecord {
        stage: Stage::Verifier,
        backend: None,
        latency_ms: start.elapsed().as_millis() as u64,
        payload: StagePayload::Verifier(VerifierTrace {
            passed,
            format,
            notes,
        }),
    });
    state
}
