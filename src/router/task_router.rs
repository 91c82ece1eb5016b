//! Deterministic task router
//!
//! Pure CPU logic: the same task and input length always produce the same
//! decision for a given table. No backend is contacted here.

use super::{BackendId, RoutingDecision, RoutingTable, ScoreboardEntry, Task};
use std::sync::Arc;

/// Router over an immutable routing table
#[derive(Debug, Clone)]
pub struct Router {
    table: Arc<RoutingTable>,
}

impl Router {
    /// Create a router over an injected table
    pub fn new(table: Arc<RoutingTable>) -> Self {
        Self { table }
    }

    /// Get the routing table
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Select a backend for a task
    ///
    /// # Routing Logic
    /// - `summarize`: long inputs (above the threshold) go to the long-context
    ///   backend with a length-based model tier, when that backend is available.
    ///   Everything else goes to the fallback backend.
    /// - `research`: the search-augmented backend.
    /// - Other tasks: their table entry.
    /// - A task with no table entry falls back to the fallback backend and the
    ///   decision carries a warning.
    pub fn route(&self, task: Task, input_chars: usize) -> RoutingDecision {
        let Some(assigned) = self.table.backend_for(task) else {
            let warning = format!(
                "No backend configured for task '{}', using fallback backend",
                task
            );
            tracing::warn!(task = %task, fallback = %self.table.fallback(), "{}", warning);
            return self.fallback_decision(
                format!("No routing entry for {} task", task),
                Some(warning),
            );
        };

        match task {
            Task::Summarize => {
                let threshold = self.table.long_context_threshold_chars();
                if input_chars <= threshold {
                    self.fallback_decision(
                        format!(
                            "Input of {} chars fits standard context (threshold {})",
                            input_chars, threshold
                        ),
                        None,
                    )
                } else if !self.table.long_context_available() {
                    self.fallback_decision(
                        format!(
                            "Long input ({} chars) but long-context backend unavailable",
                            input_chars
                        ),
                        None,
                    )
                } else {
                    let model = self
                        .table
                        .tier_model_for(input_chars)
                        .or_else(|| self.table.model_of(assigned))
                        .unwrap_or_default()
                        .to_string();
                    RoutingDecision {
                        backend: assigned.clone(),
                        reason: format!(
                            "Long input ({} chars) routed to long-context model {}",
                            input_chars, model
                        ),
                        model,
                        warning: None,
                    }
                }
            }
            Task::Research => {
                self.decision(assigned, "Research task uses search-augmented backend")
            }
            Task::Solve => self.decision(assigned, "Reasoning task routed to reasoning model"),
            Task::Code => self.decision(assigned, "Code task routed to code model"),
            Task::Rewrite => self.decision(assigned, "Rewrite task routed to editing model"),
        }
    }

    /// Build the scoreboard for a decision
    ///
    /// Lists every catalog backend in configuration order with its static cost
    /// tier. The winner's note records that it was chosen and why.
    pub fn scoreboard(&self, decision: &RoutingDecision) -> Vec<ScoreboardEntry> {
        self.table
            .catalog()
            .iter()
            .map(|entry| ScoreboardEntry {
                backend: entry.id.clone(),
                cost_tier: entry.cost_tier,
                quality: None,
                latency_ms: None,
                note: if entry.id == decision.backend {
                    format!("Chosen: {}", decision.reason)
                } else {
                    entry.note.clone()
                },
            })
            .collect()
    }

    fn decision(&self, backend: &BackendId, reason: &str) -> RoutingDecision {
        RoutingDecision {
            backend: backend.clone(),
            model: self.table.model_of(backend).unwrap_or_default().to_string(),
            reason: reason.to_string(),
            warning: None,
        }
    }

    fn fallback_decision(&self, reason: String, warning: Option<String>) -> RoutingDecision {
        let backend = self.table.fallback().clone();
        RoutingDecision {
            model: self.table.model_of(&backend).unwrap_or_default().to_string(),
            backend,
            reason,
            warning,
        }
    }
}
