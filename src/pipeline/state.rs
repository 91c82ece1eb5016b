//! Request-scoped run state and trace records
//!
//! `RunState` is owned by exactly one in-flight run and handed by value from
//! stage to stage. Fields are private; the mutators below keep the trace
//! append-only, the scoreboard free of deletions, `fallback_used` monotonic and
//! `verified` false whenever there is no result.

use super::classifier::{Classification, Intent, OutputFormat};
use crate::providers::TokenUsage;
use crate::router::{BackendId, RunMode, ScoreboardEntry, Task};
use serde::Serialize;

/// Placeholder final text when no backend produced a result
pub const NO_RESULT_TEXT: &str = "No result generated";

/// Placeholder winning backend when no backend produced a result
pub const NO_WINNER: &str = "none";

/// Pipeline stage that produced a trace record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Classifier,
    Router,
    Executor,
    Verifier,
    Fallback,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classifier => "classifier",
            Self::Router => "router",
            Self::Executor => "executor",
            Self::Verifier => "verifier",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierTrace {
    pub classification: Classification,
    pub substituted_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouterTrace {
    pub winner: BackendId,
    pub model: String,
    pub reason: String,
    pub intent: Intent,
    pub input_length: usize,
    pub mode: RunMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutorTrace {
    pub search_augmented: bool,
    pub sources_found: usize,
    pub sources: Vec<String>,
    /// Why augmentation was skipped, when it was attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_note: Option<String>,
    pub usage: Option<TokenUsage>,
    pub substituted: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifierTrace {
    pub passed: bool,
    pub format: OutputFormat,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackTrace {
    pub succeeded: bool,
    pub usage: Option<TokenUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Stage-specific trace data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StagePayload {
    Classifier(ClassifierTrace),
    Router(RouterTrace),
    Executor(ExecutorTrace),
    Verifier(VerifierTrace),
    Fallback(FallbackTrace),
}

/// One immutable audit record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRecord {
    pub stage: Stage,
    pub backend: Option<BackendId>,
    pub latency_ms: u64,
    pub payload: StagePayload,
}

/// State of one in-flight run
#[derive(Debug)]
pub struct RunState {
    task: Task,
    input: String,
    mode: RunMode,
    classification: Option<Classification>,
    chosen_backend: Option<BackendId>,
    chosen_model: Option<String>,
    result: Option<String>,
    verified: bool,
    fallback_used: bool,
    scoreboard: Vec<ScoreboardEntry>,
    trace: Vec<TraceRecord>,
}

impl RunState {
    pub fn new(task: Task, input: impl Into<String>, mode: RunMode) -> Self {
        Self {
            task,
            input: input.into(),
            mode,
            classification: None,
            chosen_backend: None,
            chosen_model: None,
            result: None,
            verified: false,
            fallback_used: false,
            scoreboard: Vec::new(),
            trace: Vec::new(),
        }
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.classification.as_ref()
    }

    pub fn chosen_backend(&self) -> Option<&BackendId> {
        self.chosen_backend.as_ref()
    }

    pub fn chosen_model(&self) -> Option<&str> {
        self.chosen_model.as_deref()
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn verified(&self) -> bool {
        self.verified
    }

    pub fn fallback_used(&self) -> bool {
        self.fallback_used
    }

    pub fn scoreboard(&self) -> &[ScoreboardEntry] {
        &self.scoreboard
    }

    pub fn trace(&self) -> &[TraceRecord] {
        &self.trace
    }

    /// Set the classification; later calls are ignored
    pub fn set_classification(&mut self, classification: Classification) {
        if self.classification.is_none() {
            self.classification = Some(classification);
        }
    }

    /// Point the run at a backend and model
    pub fn choose(&mut self, backend: BackendId, model: impl Into<String>) {
        self.chosen_backend = Some(backend);
        self.chosen_model = Some(model.into());
    }

    /// Install the scoreboard; ignored once entries exist
    pub fn set_scoreboard(&mut self, entries: Vec<ScoreboardEntry>) {
        if self.scoreboard.is_empty() {
            self.scoreboard = entries;
        }
    }

    /// Annotate a backend's scoreboard entry in place
    ///
    /// Returns false when the backend has no entry.
    pub fn annotate(
        &mut self,
        backend: &BackendId,
        latency_ms: u64,
        quality: f64,
        note: Option<String>,
    ) -> bool {
        match self.scoreboard.iter_mut().find(|e| &e.backend == backend) {
            Some(entry) => {
                entry.latency_ms = Some(latency_ms);
                entry.quality = Some(quality);
                if let Some(note) = note {
                    entry.note = note;
                }
                true
            }
            None => false,
        }
    }

    /// Replace the result; clearing it also clears `verified`
    pub fn set_result(&mut self, result: Option<String>) {
        if result.is_none() {
            self.verified = false;
        }
        self.result = result;
    }

    /// Record the verification outcome; never true without a result
    pub fn set_verified(&mut self, verified: bool) {
        self.verified = verified && self.result.is_some();
    }

    /// Mark the single fallback attempt as used
    pub fn mark_fallback_used(&mut self) {
        self.fallback_used = true;
    }

    /// Append a trace record
    pub fn record(&mut self, record: TraceRecord) {
        self.trace.push(record);
    }

    /// Whether the Fallback stage should run
    pub fn needs_fallback(&self) -> bool {
        !self.verified && !self.fallback_used
    }

    /// Consume the state into the caller-facing report
    pub fn into_report(self) -> RunReport {
        let winning_backend = match (&self.result, self.chosen_backend) {
            (Some(_), Some(backend)) => backend.to_string(),
            _ => NO_WINNER.to_string(),
        };
        RunReport {
            final_text: self.result.unwrap_or_else(|| NO_RESULT_TEXT.to_string()),
            winning_backend,
            classification: self.classification,
            scoreboard: self.scoreboard,
            trace: self.trace,
            verified: self.verified,
            fallback_used: self.fallback_used,
            task: self.task,
            mode: self.mode,
        }
    }
}

/// Serializable outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    #[serde(rename = "final")]
    pub final_text: String,
    pub winning_backend: String,
    pub classification: Option<Classification>,
    pub scoreboard: Vec<ScoreboardEntry>,
    pub trace: Vec<TraceRecord>,
    pub verified: bool,
    pub fallback_used: bool,
    pub task: Task,
    pub mode: RunMode,
}
