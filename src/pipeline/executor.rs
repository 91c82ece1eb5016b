//! Executor stage
//!
//! Composes the prompts, optionally augments them with web search results,
//! dispatches to the chosen backend and substitutes the fallback backend once
//! if that call fails.

use super::classifier::Classification;
use super::state::{ExecutorTrace, RunState, Stage, StagePayload, TraceRecord};
use super::{CallOverrides, Pipeline, prompts};
use crate::error::SearchError;
use crate::providers::{Completion, SearchResults};
use crate::router::{BackendId, Task};

/// Search results requested when no `[search]` section overrides it
const DEFAULT_MAX_RESULTS: usize = 5;

/// Placeholder quality for a result produced by the Executor
const EXECUTOR_QUALITY: f64 = 0.9;

/// Outcome of the optional search step
#[derive(Debug, Default)]
struct Augmentation {
    context: Option<String>,
    sources: Vec<String>,
    note: Option<String>,
}

impl Pipeline {
    /// Execute the task against the chosen backend
    ///
    /// Never fails. When both the chosen backend and the substitute fail the
    /// result is cleared and both errors land in the trace.
    pub(crate) async fn execute(&self, mut state: RunState) -> RunState {
        let classification = state.classification().copied().unwrap_or_default();
        let table = self.table();

        let mut backend = state
            .chosen_backend()
            .cloned()
            .unwrap_or_else(|| table.fallback().clone());
        let mut model = state
            .chosen_model()
            .map(str::to_string)
            .or_else(|| table.model_of(&backend).map(str::to_string))
            .unwrap_or_default();

        let wants_search =
            state.task() == Task::Research || table.research_backend() == Some(&backend);
        let augmentation = if wants_search {
            self.augment(state.input()).await
        } else {
            Augmentation::default()
        };

        if augmentation.context.is_some() {
            let synthesis = table.synthesis().clone();
            tracing::info!(
                from = %backend,
                to = %synthesis,
                sources = augmentation.sources.len(),
                "Search context found, rerouting to synthesis backend"
            );
            model = table.model_of(&synthesis).unwrap_or_default().to_string();
            backend = synthesis;
            state.choose(backend.clone(), model.clone());
        }

        let system = compose_system_prompt(&classification, augmentation.context.as_deref());
        let user = prompts::user_prompt(state.task(), state.input());

        let primary = self
            .call_backend(
                &backend,
                &system,
                &user,
                CallOverrides {
                    model: Some(model.clone()),
                    ..CallOverrides::default()
                },
            )
            .await;

        let (produced, substituted, errors): (Option<(BackendId, Completion)>, bool, Vec<String>) =
            match primary {
                Ok(completion) => (Some((backend.clone(), completion)), false, Vec::new()),
                Err(primary_err) => {
                    let fallback = table.fallback().clone();
                    tracing::warn!(
                        backend = %backend,
                        substitute = %fallback,
                        error = %primary_err,
                        "Primary backend failed, trying substitute"
                    );
                    match self
                        .call_backend(&fallback, &system, &user, CallOverrides::default())
                        .await
                    {
                        Ok(completion) => (
                            Some((fallback, completion)),
                            true,
                            vec![primary_err.to_string()],
                        ),
                        Err(substitute_err) => {
                            tracing::error!(
                                primary_error = %primary_err,
                                substitute_error = %substitute_err,
                                "Primary and substitute backends both failed"
                            );
                            (
                                None,
                                true,
                                vec![primary_err.to_string(), substitute_err.to_string()],
                            )
                        }
                    }
                }
            };

        let augmented = augmentation.context.is_some();
        let (trace_backend, latency_ms, usage) = match produced {
            Some((producer, completion)) => {
                let note = substituted.then(|| format!("Substitute for {}", backend));
                state.annotate(&producer, completion.latency_ms, EXECUTOR_QUALITY, note);
                if substituted {
                    let model = table.model_of(&producer).unwrap_or_default().to_string();
                    state.choose(producer.clone(), model);
                }

                let mut text = completion.text;
                if augmented && !augmentation.sources.is_empty() {
                    text.push_str(&prompts::sources_footer(&augmentation.sources));
                }
                state.set_result(Some(text));
                (Some(producer), completion.latency_ms, Some(completion.usage))
            }
            None => {
                state.set_result(None);
                (None, 0, None)
            }
        };

        state.record(TraceRecord {
            stage: Stage::Executor,
            backend: trace_backend,
            latency_ms,
            payload: StagePayload::Executor(ExecutorTrace {
                search_augmented: augmented,
                sources_found: augmentation.sources.len(),
                sources: augmentation.sources,
                search_note: augmentation.note,
                usage,
                substituted,
                errors,
            }),
        });
        state
    }

    /// Run the search step, degrading to no augmentation on any problem
    async fn augment(&self, query: &str) -> Augmentation {
        let max_results = self
            .config()
            .search
            .as_ref()
            .map(|s| s.max_results())
            .unwrap_or(DEFAULT_MAX_RESULTS);

        let outcome = match self.registry().search() {
            Ok(adapter) => adapter.search(query, max_results).await,
            Err(e) => Err(e),
        };

        let (augmentation, metric) = match outcome {
            Ok(results) if results.results.is_empty() => (
                Augmentation {
                    note: Some("Search returned no results".to_string()),
                    ..Augmentation::default()
                },
                "empty",
            ),
            Ok(results) => (augmentation_from(&results), "augmented"),
            Err(e) => {
                tracing::warn!(error = %e, "Search unavailable, proceeding without augmentation");
                let metric = match &e {
                    SearchError::ConfigMissing(_) => "unavailable",
                    SearchError::RequestFailed(_) => "failed",
                };
                (
                    Augmentation {
                        note: Some(e.to_string()),
                        ..Augmentation::default()
                    },
                    metric,
                )
            }
        };

        if let Err(e) = self.metrics().record_search(metric) {
            tracing::warn!(error = %e, "Failed to record search metric");
        }
        augmentation
    }
}

fn augmentation_from(results: &SearchResults) -> Augmentation {
    Augmentation {
        context: Some(prompts::search_augmentation(results)),
        sources: prompts::source_lines(results),
        note: None,
    }
}

/// Build the Executor's system prompt
pub fn compose_system_prompt(classification: &Classification, search_context: Option<&str>) -> String {
    let mut system = prompts::system_template(classification.intent).to_string();
    if let Some(context) = search_context {
        system.push_str(context);
    }
    system.push_str(prompts::format_instructions(classification.output_format));
    if classification.needs_citations && search_context.is_none() {
        system.push_str(prompts::citation_instruction());
    }
    system
}
