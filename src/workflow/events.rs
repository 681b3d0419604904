//! Step-transition events.
//!
//! The executor reports progress as an ordered event stream over a
//! broadcast channel. Consumers (CLI, tests, embedding UIs) subscribe and
//! render independently; a missing or lagging consumer never affects the
//! run.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::executor::RunOutcome;
use super::plan::PlanStep;

/// Events emitted over the lifetime of one workflow run, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A run was submitted
    RunStarted { run_id: Uuid, objective: String },

    /// The plan was generated and validated; all steps pending
    PlanReady { run_id: Uuid, steps: Vec<PlanStep> },

    /// A step changed status; carries the full updated step
    StepUpdated { run_id: Uuid, step: PlanStep },

    /// The run reached its final outcome
    RunFinished { run_id: Uuid, outcome: RunOutcome },
}

/// Broadcast-backed event emitter.
///
/// Emission never fails from the executor's point of view: send errors
/// (no live receivers) are logged at debug level and dropped.
#[derive(Debug, Clone)]
pub(crate) struct EventSender {
    tx: broadcast::Sender<WorkflowEvent>,
}

impl EventSender {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: WorkflowEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!(error = %e, "No event receivers; dropping event");
        }
    }
}
