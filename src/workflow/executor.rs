//! Sequential workflow execution engine.
//!
//! Drives a generated plan step by step: one step active at a time, each
//! output appended to the shared context before the next step starts, and
//! the whole run halted on the first failure.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::context::RunContext;
use super::error::WorkflowError;
use super::events::{EventSender, WorkflowEvent};
use super::plan::{PlanGenerator, PlanStep};
use crate::agent::{self, ModelProvider};
use crate::core::RunDefaults;

/// Final disposition of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every step finished
    Completed { summary: String },

    /// A step failed; later steps never ran
    Failed { reason: String },

    /// The run was cancelled between steps
    Cancelled,
}

impl RunOutcome {
    /// Whether the run finished all its steps.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed { summary } => write!(f, "Workflow completed: {summary}"),
            Self::Failed { reason } => write!(f, "Workflow failed: {reason}"),
            Self::Cancelled => f.write_str("Workflow cancelled"),
        }
    }
}

/// One finished workflow run.
///
/// The plan shows exactly which steps succeeded, which one failed, and
/// which never ran. Nothing here is persisted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Run identifier
    pub id: Uuid,

    /// The objective the run was started with
    pub objective: String,

    /// All plan steps, with final statuses and results
    pub plan: Vec<PlanStep>,

    /// The accumulated context record
    pub context: RunContext,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run reached its outcome
    pub finished_at: DateTime<Utc>,

    /// Final disposition
    pub outcome: RunOutcome,
}

impl WorkflowRun {
    /// Number of steps that finished successfully.
    pub fn completed_steps(&self) -> usize {
        self.plan.iter().filter(|s| s.status == super::plan::StepStatus::Completed).count()
    }

    /// Whether every step finished.
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Sequential workflow executor.
///
/// Owns the plan and context for the duration of a run; consumers observe
/// through the event stream and the returned `WorkflowRun`.
pub struct WorkflowExecutor {
    provider: Arc<dyn ModelProvider>,
    defaults: RunDefaults,
    max_plan_steps: usize,
    events: EventSender,
    cancel: CancellationToken,
}

impl WorkflowExecutor {
    /// Create an executor over the given provider with default policy.
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            defaults: RunDefaults::default(),
            max_plan_steps: 12,
            events: EventSender::new(256),
            cancel: CancellationToken::new(),
        }
    }

    /// Override the per-capability run defaults.
    pub fn with_defaults(mut self, defaults: RunDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Override the maximum accepted plan length.
    pub fn with_max_plan_steps(mut self, max_plan_steps: usize) -> Self {
        self.max_plan_steps = max_plan_steps;
        self
    }

    /// Subscribe to this executor's event stream.
    ///
    /// Subscribe before calling `run` to observe every transition.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    /// Token that cancels in-progress runs between steps.
    ///
    /// Cancellation is cooperative: an in-flight model call completes and
    /// its result is discarded with the rest of the run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run a workflow for the objective.
    ///
    /// Plan-generation failures return `Err` before any step executes.
    /// Step failures return `Ok` with a `Failed` outcome and the plan
    /// showing the partial work: completed steps keep their results,
    /// steps after the failure stay pending.
    pub async fn run(&self, objective: &str) -> Result<WorkflowRun, WorkflowError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        tracing::info!(%run_id, objective, "Workflow run started");
        self.events.emit(WorkflowEvent::RunStarted {
            run_id,
            objective: objective.to_string(),
        });

        let generator =
            PlanGenerator::new(Arc::clone(&self.provider)).with_max_steps(self.max_plan_steps);
        let mut plan = generator.generate(objective).await.map_err(|e| {
            tracing::warn!(%run_id, error = %e, "Plan generation failed");
            e
        })?;

        self.events.emit(WorkflowEvent::PlanReady { run_id, steps: plan.clone() });

        let mut context = RunContext::new(objective);
        let mut outcome = None;

        for step in &mut plan {
            if self.cancel.is_cancelled() {
                tracing::info!(%run_id, step = step.number, "Run cancelled before step");
                outcome = Some(RunOutcome::Cancelled);
                break;
            }

            step.begin();
            self.events.emit(WorkflowEvent::StepUpdated { run_id, step: step.clone() });
            tracing::info!(%run_id, step = step.number, kind = %step.kind, "Step started");

            let invocation = agent::invoke(
                self.provider.as_ref(),
                step.kind,
                &step.instruction,
                &context,
                &self.defaults,
            )
            .await;

            match invocation {
                Ok(output) => {
                    context.push(step.number, output.clone());
                    step.complete(output);
                    self.events.emit(WorkflowEvent::StepUpdated { run_id, step: step.clone() });
                    tracing::info!(%run_id, step = step.number, "Step completed");
                }
                Err(e) => {
                    let message = e.to_string();
                    step.fail(message.clone());
                    self.events.emit(WorkflowEvent::StepUpdated { run_id, step: step.clone() });
                    tracing::warn!(%run_id, step = step.number, error = %message, "Step failed");

                    outcome = Some(RunOutcome::Failed {
                        reason: format!("step {} ({}) failed: {message}", step.number, step.kind),
                    });
                    break;
                }
            }
        }

        let outcome = outcome.unwrap_or_else(|| RunOutcome::Completed {
            summary: format!("{} steps completed", plan.len()),
        });

        self.events.emit(WorkflowEvent::RunFinished { run_id, outcome: outcome.clone() });
        tracing::info!(%run_id, %outcome, "Workflow run finished");

        Ok(WorkflowRun {
            id: run_id,
            objective: objective.to_string(),
            plan,
            context,
            started_at,
            finished_at: Utc::now(),
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::agent::{ModelError, PromptTemplate};
    use crate::workflow::plan::{StepResult, StepStatus};

    /// Provider that replays a scripted sequence of responses.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<serde_json::Value, ModelError>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<serde_json::Value, ModelError>>) -> Self {
            Self { responses: Mutex::new(responses.into_iter().collect()) }
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn generate_structured(
            &self,
            _template: PromptTemplate,
            _input: &serde_json::Value,
        ) -> Result<serde_json::Value, ModelError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ModelError::NoResponse))
        }

        fn name(&self) -> &str {
            "scripted"
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    fn two_step_plan() -> serde_json::Value {
        serde_json::json!([
            {"kind": "research", "instruction": "research the issue", "summary": "research"},
            {"kind": "draft", "instruction": "draft the contract", "summary": "draft"},
        ])
    }

    #[tokio::test]
    async fn test_successful_run_completes_all_steps() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(two_step_plan()),
            Ok(serde_json::json!({"findings": "case law found", "sources": []})),
            Ok(serde_json::json!({"document": "THE CONTRACT", "notes": ""})),
        ]));

        let executor = WorkflowExecutor::new(provider);
        let run = executor.run("Research X then draft Y").await.unwrap();

        assert!(run.is_success());
        assert!(run.outcome.to_string().contains("2 steps"));
        assert_eq!(run.completed_steps(), 2);

        for step in &run.plan {
            assert_eq!(step.status, StepStatus::Completed);
            assert!(matches!(step.result, Some(StepResult::Output { .. })));
        }
    }

    #[tokio::test]
    async fn test_failed_step_halts_run() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(serde_json::json!([
                {"kind": "research", "instruction": "a", "summary": "s"},
                {"kind": "review", "instruction": "b", "summary": "s"},
                {"kind": "predict", "instruction": "c", "summary": "s"},
            ])),
            Ok(serde_json::json!({"findings": "ok", "sources": []})),
            Err(ModelError::Api { status: 500, body: "overloaded".to_string() }),
        ]));

        let executor = WorkflowExecutor::new(provider);
        let run = executor.run("three step objective").await.unwrap();

        assert!(!run.is_success());
        assert_eq!(run.plan[0].status, StepStatus::Completed);
        assert_eq!(run.plan[1].status, StepStatus::Failed);
        assert_eq!(run.plan[2].status, StepStatus::Pending);
        assert!(run.plan[2].result.is_none());

        match &run.outcome {
            RunOutcome::Failed { reason } => assert!(reason.contains("step 2")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_plan_is_an_error_before_any_step() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(serde_json::json!([]))]));

        let executor = WorkflowExecutor::new(provider);
        let mut rx = executor.subscribe();

        let err = executor.run("impossible objective").await.unwrap_err();
        assert!(err.to_string().contains("empty plan"));

        // RunStarted is emitted, but no step was ever reported
        while let Ok(event) = rx.try_recv() {
            assert!(
                !matches!(event, WorkflowEvent::StepUpdated { .. }),
                "no step event may be emitted for a failed plan"
            );
        }
    }

    #[tokio::test]
    async fn test_cancelled_run_leaves_steps_pending() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(two_step_plan())]));

        let executor = WorkflowExecutor::new(provider);
        executor.cancellation_token().cancel();

        let run = executor.run("cancelled objective").await.unwrap();

        assert_eq!(run.outcome, RunOutcome::Cancelled);
        for step in &run.plan {
            assert_eq!(step.status, StepStatus::Pending);
            assert!(step.result.is_none());
        }
    }
}
