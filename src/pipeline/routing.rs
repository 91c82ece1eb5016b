//! Router stage

use super::Pipeline;
use super::state::{RouterTrace, RunState, Stage, StagePayload, TraceRecord};
use std::time::Instant;

impl Pipeline {
    /// Choose the backend and build the scoreboard. Cannot fail.
    pub(crate) fn route(&self, mut state: RunState) -> RunState {
        let start = Instant::now();
        let input_length = state.input().chars().count();
        let decision = self.router().route(state.task(), input_length);
        let scoreboard = self.router().scoreboard(&decision);
        let intent = state.classification().map(|c| c.intent).unwrap_or_default();

        tracing::info!(
            task = %state.task(),
            backend = %decision.backend,
            model = %decision.model,
            input_length = input_length,
            mode = %state.mode(),
            reason = %decision.reason,
            "Routing decision made"
        );

        state.choose(decision.backend.clone(), decision.model.clone());
        state.set_scoreboard(scoreboard);
        state.record(TraceRecord {
            stage: Stage::Router,
            backend: Some(decision.backend.clone()),
            latency_ms: start.elapsed().as_millis() as u64,
            payload: StagePayload::Router(RouterTrace {
                winner: decision.backend,
                model: decision.model,
                reason: decision.reason,
                intent,
                input_length,
                mode: state.mode(),
                warning: decision.warning,
            }),
        });
        state
    }
}
