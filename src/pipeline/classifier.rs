//! Classifier stage
//!
//! Asks a fast auxiliary backend what kind of work the input is and which
//! output format it expects. Any failure degrades to a default classification.

use super::state::{ClassifierTrace, RunState, Stage, StagePayload, TraceRecord};
use super::{CallOverrides, Pipeline, prompts};
use serde::{Deserialize, Serialize};

/// Token budget for the classification reply
const CLASSIFIER_MAX_TOKENS: u32 = 200;

/// Low temperature keeps the JSON reply stable
const CLASSIFIER_TEMPERATURE: f64 = 0.1;

/// Confidence used when the reply could not be parsed
const PARSE_FAILURE_CONFIDENCE: f64 = 0.5;

/// Confidence used when the classifier backend could not be reached
const CALL_FAILURE_CONFIDENCE: f64 = 0.3;

/// Inferred kind of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Code,
    Reasoning,
    #[default]
    General,
}

/// Output format contract checked by the Verifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Diff,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Diff => "diff",
            Self::Json => "json",
        }
    }
}

/// Classification of one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub intent: Intent,
    #[serde(rename = "format")]
    pub output_format: OutputFormat,
    pub needs_citations: bool,
    pub confidence: f64,
}

impl Classification {
    /// General text classification with the given confidence
    pub fn fallback(confidence: f64) -> Self {
        Self {
            intent: Intent::General,
            output_format: OutputFormat::Text,
            needs_citations: false,
            confidence,
        }
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::fallback(PARSE_FAILURE_CONFIDENCE)
    }
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    intent: Intent,
    format: OutputFormat,
    #[serde(default)]
    needs_citations: bool,
    confidence: f64,
}

/// Strip a surrounding markdown code fence, if any
///
/// Models often wrap JSON in ```` ```json ... ``` ```` despite being told not to.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parse and validate a classifier reply
///
/// # Errors
/// Returns a description of the problem when the reply is not a JSON object
/// with known `intent`/`format` values and a finite `confidence` in [0, 1].
pub fn parse_classification(text: &str) -> Result<Classification, String> {
    let raw: RawClassification = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| format!("invalid classification JSON: {}", e))?;

    if !raw.confidence.is_finite() || !(0.0..=1.0).contains(&raw.confidence) {
        return Err(format!(
            "confidence must be between 0.0 and 1.0, got {}",
            raw.confidence
        ));
    }

    Ok(Classification {
        intent: raw.intent,
        output_format: raw.format,
        needs_citations: raw.needs_citations,
        confidence: raw.confidence,
    })
}

impl Pipeline {
    /// Classify the run's input
    ///
    /// Never fails. A backend failure yields the default classification with
    /// confidence 0.3; an unparseable reply yields confidence 0.5.
    pub(crate) async fn classify(&self, mut state: RunState) -> RunState {
        let classifier = self.table().classifier().clone();
        let user = prompts::classifier_user_prompt(state.task(), state.input());

        let result = self
            .call_backend(
                &classifier,
                prompts::CLASSIFIER_SYSTEM_PROMPT,
                &user,
                CallOverrides {
                    max_tokens: Some(CLASSIFIER_MAX_TOKENS),
                    temperature: Some(CLASSIFIER_TEMPERATURE),
                    timeout: Some(self.config().timeouts.classifier()),
                    ..CallOverrides::default()
                },
            )
            .await;

        let (classification, error, latency_ms) = match result {
            Ok(completion) => match parse_classification(&completion.text) {
                Ok(classification) => (classification, None, completion.latency_ms),
                Err(reason) => {
                    tracing::warn!(
                        backend = %classifier,
                        reason = %reason,
                        "Failed to parse classification, using defaults"
                    );
                    (
                        Classification::fallback(PARSE_FAILURE_CONFIDENCE),
                        Some(reason),
                        completion.latency_ms,
                    )
                }
            },
            Err(e) => {
                tracing::warn!(
                    backend = %classifier,
                    error = %e,
                    error_kind = e.kind(),
                    "Classifier call failed, using defaults"
                );
                (
                    Classification::fallback(CALL_FAILURE_CONFIDENCE),
                    Some(e.to_string()),
                    0,
                )
            }
        };

        tracing::info!(
            task = %state.task(),
            intent = ?classification.intent,
            format = classification.output_format.as_str(),
            needs_citations = classification.needs_citations,
            confidence = classification.confidence,
            "Task classified"
        );

        state.set_classification(classification);
        state.record(TraceRecord {
            stage: Stage::Classifier,
            backend: Some(classifier),
            latency_ms,
            payload: StagePayload::Classifier(ClassifierTrace {
                substituted_default: error.is_some(),
                classification,
                error,
            }),
        });
        state
    }
}
