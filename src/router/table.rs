//! Immutable routing table
//!
//! Built once from configuration and shared by every run. Tests construct
//! their own tables from TOML fixtures to exercise routing in isolation.

use super::{BackendId, CostTier, Task};
use crate::config::{Config, LongContextTier};
use std::collections::BTreeMap;

/// Static description of one backend, as listed on the scoreboard
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: BackendId,
    pub model: String,
    pub cost_tier: CostTier,
    pub note: String,
}

/// Task to backend assignments plus the designated fallback and synthesis backends
#[derive(Debug, Clone)]
pub struct RoutingTable {
    tasks: BTreeMap<Task, BackendId>,
    classifier: BackendId,
    fallback: BackendId,
    synthesis: BackendId,
    catalog: Vec<CatalogEntry>,
    long_context_threshold_chars: usize,
    /// Sorted ascending by `min_chars`
    long_context_tiers: Vec<LongContextTier>,
    long_context_available: bool,
}

impl RoutingTable {
    /// Build the table from a validated configuration
    ///
    /// # Arguments
    /// * `config` - Validated configuration
    /// * `long_context_available` - Whether the summarize backend can actually be
    ///   called (its provider has credentials). When false, long inputs are routed
    ///   to the fallback backend instead.
    pub fn from_config(config: &Config, long_context_available: bool) -> Self {
        let catalog = config
            .backends
            .iter()
            .map(|b| CatalogEntry {
                id: b.id().clone(),
                model: b.model().to_string(),
                cost_tier: b.cost_tier(),
                note: b.note().to_string(),
            })
            .collect();

        let mut long_context_tiers = config.routing.long_context_tiers.clone();
        long_context_tiers.sort_by_key(|tier| tier.min_chars);

        Self {
            tasks: config.routing.tasks.clone(),
            classifier: config.routing.classifier.clone(),
            fallback: config.routing.fallback.clone(),
            synthesis: config.routing.synthesis.clone(),
            catalog,
            long_context_threshold_chars: config.routing.long_context_threshold_chars,
            long_context_tiers,
            long_context_available,
        }
    }

    /// Backend assigned to a task, if any
    pub fn backend_for(&self, task: Task) -> Option<&BackendId> {
        self.tasks.get(&task)
    }

    /// The search-augmented backend (the research assignment)
    pub fn research_backend(&self) -> Option<&BackendId> {
        self.tasks.get(&Task::Research)
    }

    /// The fast backend used by the Classifier
    pub fn classifier(&self) -> &BackendId {
        &self.classifier
    }

    /// The designated reliable backend
    pub fn fallback(&self) -> &BackendId {
        &self.fallback
    }

    /// The reasoning backend used after search augmentation
    pub fn synthesis(&self) -> &BackendId {
        &self.synthesis
    }

    /// Every configured backend in configuration order
    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// Configured model of a backend
    pub fn model_of(&self, id: &BackendId) -> Option<&str> {
        self.catalog
            .iter()
            .find(|entry| &entry.id == id)
            .map(|entry| entry.model.as_str())
    }

    pub fn long_context_threshold_chars(&self) -> usize {
        self.long_context_threshold_chars
    }

    pub fn long_context_available(&self) -> bool {
        self.long_context_available
    }

    /// Model tier for an input of `input_chars` characters
    ///
    /// The tier with the largest `min_chars` not exceeding the input length wins.
    /// Returns `None` when no tier applies; callers then keep the backend's own model.
    pub fn tier_model_for(&self, input_chars: usize) -> Option<&str> {
        self.long_context_tiers
            .iter()
            .rev()
            .find(|tier| tier.min_chars <= input_chars)
            .map(|tier| tier.model.as_str())
    }
}
