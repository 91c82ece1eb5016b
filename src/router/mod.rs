//! Routing logic for Pentamind
//!
//! Maps a task and its input size to one concrete backend from an immutable
//! [`RoutingTable`], and builds the explainability scoreboard for the run.

pub mod backend_id;
pub mod table;
pub mod task_router;

pub use backend_id::BackendId;
pub use table::{CatalogEntry, RoutingTable};
pub use task_router::Router;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of work the caller asks for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Summarize,
    Research,
    Solve,
    Code,
    Rewrite,
}

impl Task {
    /// All task types, in declaration order
    pub const ALL: [Task; 5] = [
        Task::Summarize,
        Task::Research,
        Task::Solve,
        Task::Code,
        Task::Rewrite,
    ];

    /// Convert to string representation for logging, prompts and metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Research => "research",
            Self::Solve => "solve",
            Self::Code => "code",
            Self::Rewrite => "rewrite",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|task| task.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown task '{}', expected one of: summarize, research, solve, code, rewrite",
                    s
                )
            })
    }
}

/// Caller preference between quality, speed and cost
///
/// Recorded in the trace and logs. Routing does not consult it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Best,
    Fast,
    Cheap,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::Fast => "fast",
            Self::Cheap => "cheap",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static cost tier of a backend, shown on the scoreboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CostTier {
    High,
    Med,
    Low,
}

/// Result of a routing decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    /// Which backend to dispatch to
    pub backend: BackendId,
    /// Provider-side model identifier to request
    pub model: String,
    /// Human-readable reason, copied onto the winner's scoreboard entry
    pub reason: String,
    /// Set when the task had no table entry and the fallback backend was chosen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// One row of the explainability scoreboard
///
/// Rows are created by the Router for every catalog backend and annotated in
/// place by later stages. They are never removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreboardEntry {
    pub backend: BackendId,
    pub cost_tier: CostTier,
    pub quality: Option<f64>,
    pub latency_ms: Option<u64>,
    pub note: String,
}
