//! The five-stage task pipeline
//!
//! Classifier → Router → Executor → Verifier → (Fallback | end).
//!
//! Each stage takes the [`RunState`] by value, appends exactly one trace
//! record and hands it on. Backend failures never escape a stage: each stage
//! decides in one place whether to substitute or degrade.

pub mod classifier;
pub mod executor;
pub mod fallback;
pub mod prompts;
pub mod routing;
pub mod state;
pub mod verifier;

pub use classifier::{Classification, Intent, OutputFormat};
pub use state::{RunReport, RunState, Stage, StagePayload, TraceRecord};

use crate::config::Config;
use crate::error::{AppError, AppResult, ProviderError};
use crate::metrics::Metrics;
use crate::providers::{ChatRequest, Completion, ProviderRegistry};
use crate::router::{BackendId, Router, RoutingTable, RunMode, Task};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Per-call overrides of a backend's configured generation settings
#[derive(Debug, Clone, Default)]
pub struct CallOverrides {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub timeout: Option<Duration>,
}

/// Shared, immutable pipeline context
///
/// Cheap to clone. Holds no per-run state, so one instance serves every
/// concurrent run.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    router: Router,
    registry: ProviderRegistry,
    metrics: Arc<Metrics>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("router", &self.router)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a pipeline over an injected routing table
    pub fn new(
        config: Arc<Config>,
        table: Arc<RoutingTable>,
        registry: ProviderRegistry,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config,
            router: Router::new(table),
            registry,
            metrics,
        }
    }

    /// Create a pipeline whose routing table is derived from configuration
    ///
    /// The long-context route is only enabled when the summarize backend's
    /// provider has an adapter in `registry`.
    pub fn from_config(
        config: Arc<Config>,
        registry: ProviderRegistry,
        metrics: Arc<Metrics>,
    ) -> Self {
        let long_context_available = config
            .routing
            .tasks
            .get(&Task::Summarize)
            .and_then(|id| config.backend(id))
            .is_some_and(|backend| registry.has_provider(backend.provider()));

        if !long_context_available {
            tracing::info!("Long-context backend unavailable, long summaries use the fallback backend");
        }

        let table = Arc::new(RoutingTable::from_config(&config, long_context_available));
        Self::new(config, table, registry, metrics)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn table(&self) -> &RoutingTable {
        self.router.table()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Pre-flight credential check
    ///
    /// The classifier and fallback backends must be callable; without them no
    /// run can produce even a best-effort answer.
    ///
    /// # Errors
    /// `AppError::MissingCredential` naming the first provider whose key is absent.
    pub fn check_configuration(&self) -> AppResult<()> {
        for provider in self.config.required_providers() {
            if !self.registry.has_provider(provider) {
                let env_var = self
                    .registry
                    .missing_env_var(provider)
                    .or_else(|| {
                        self.config
                            .providers
                            .get(provider)
                            .map(|p| p.api_key_env())
                    })
                    .unwrap_or("<unknown>");
                return Err(AppError::MissingCredential {
                    provider: provider.to_string(),
                    env_var: env_var.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Run the full pipeline for one task
    ///
    /// Never fails: backend problems are recorded in the trace and, at worst,
    /// yield the "No result generated" report. Call [`Pipeline::check_configuration`]
    /// first to reject runs that cannot succeed at all.
    pub async fn run(&self, task: Task, input: String, mode: RunMode) -> RunReport {
        let span = tracing::info_span!("run", task = %task, mode = %mode);

        async move {
            let start = Instant::now();
            let state = RunState::new(task, input, mode);

            let stage_start = Instant::now();
            let state = self.classify(state).await;
            self.record_stage(Stage::Classifier, stage_start);

            let stage_start = Instant::now();
            let state = self.route(state);
            self.record_stage(Stage::Router, stage_start);

            let stage_start = Instant::now();
            let state = self.execute(state).await;
            self.record_stage(Stage::Executor, stage_start);

            let stage_start = Instant::now();
            let state = verifier::verify(state);
            self.record_stage(Stage::Verifier, stage_start);

            let state = if state.needs_fallback() {
                let stage_start = Instant::now();
                let state = self.fallback(state).await;
                self.record_stage(Stage::Fallback, stage_start);
                state
            } else {
                state
            };

            let outcome = if state.result().is_none() {
                "no_result"
            } else if state.fallback_used() {
                "fallback"
            } else {
                "verified"
            };
            if let Err(e) = self.metrics.record_run(task.as_str(), outcome) {
                tracing::warn!(error = %e, "Failed to record run metric");
            }

            tracing::info!(
                outcome = outcome,
                backend = state.chosen_backend().map(BackendId::as_str).unwrap_or("none"),
                verified = state.verified(),
                fallback_used = state.fallback_used(),
                trace_len = state.trace().len(),
                latency_ms = start.elapsed().as_millis() as u64,
                "Run completed"
            );

            state.into_report()
        }
        .instrument(span)
        .await
    }

    /// Single-backend call used by the `/infer` endpoint
    ///
    /// # Errors
    /// `UnknownBackend` when the identifier is not configured, otherwise the
    /// provider failure.
    pub async fn infer(
        &self,
        backend: &BackendId,
        system: &str,
        user: &str,
        overrides: CallOverrides,
    ) -> AppResult<Completion> {
        if let Err(message) = BackendId::new(backend.as_str(), &self.config) {
            return Err(AppError::UnknownBackend(message));
        }
        Ok(self.call_backend(backend, system, user, overrides).await?)
    }

    /// Resolve a backend and send one request through its adapter
    pub(crate) async fn call_backend(
        &self,
        id: &BackendId,
        system: &str,
        user: &str,
        overrides: CallOverrides,
    ) -> Result<Completion, ProviderError> {
        let backend = self
            .config
            .backend(id)
            .ok_or_else(|| ProviderError::ConfigMissing {
                backend: id.to_string(),
                reason: "backend is not configured".to_string(),
            })?;

        let result = match self.registry.adapter_for(backend) {
            Ok(adapter) => {
                let request = ChatRequest {
                    backend: id.clone(),
                    model: overrides
                        .model
                        .unwrap_or_else(|| backend.model().to_string()),
                    system: system.to_string(),
                    user: user.to_string(),
                    max_tokens: overrides.max_tokens.unwrap_or(backend.max_tokens()),
                    temperature: overrides.temperature.unwrap_or(backend.temperature()),
                    timeout: overrides
                        .timeout
                        .unwrap_or_else(|| self.config.timeouts.for_backend(backend)),
                };
                adapter.send(request).await
            }
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        if let Err(e) = self.metrics.record_backend_call(id.as_str(), outcome) {
            tracing::warn!(error = %e, "Failed to record backend call metric");
        }

        match &result {
            Ok(completion) => tracing::debug!(
                backend = %id,
                latency_ms = completion.latency_ms,
                total_tokens = completion.usage.total_tokens,
                "Backend call succeeded"
            ),
            Err(e) => tracing::warn!(
                backend = %id,
                error = %e,
                error_kind = e.kind(),
                retryable = e.is_retryable(),
                "Backend call failed"
            ),
        }

        result
    }

    fn record_stage(&self, stage: Stage, started: Instant) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        if let Err(e) = self.metrics.record_stage_duration(stage.as_str(), elapsed_ms) {
            tracing::warn!(stage = stage.as_str(), error = %e, "Failed to record stage duration");
        }
    }
}
