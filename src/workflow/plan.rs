//! Plan generation and step lifecycle.
//!
//! Turns a free-text objective into an ordered, validated list of steps,
//! and owns the per-step state machine.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::PlanError;
use crate::agent::{AgentKind, CapabilityOutput, ModelProvider, PromptTemplate};

/// Lifecycle state of a single step.
///
/// `Pending -> Active -> {Completed | Failed}`; terminal states are
/// absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    /// Not started yet
    Pending,
    /// Currently executing
    Active,
    /// Finished successfully
    Completed,
    /// Finished with an error; nothing after this step runs
    Failed,
}

impl StepStatus {
    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Outcome payload of a finished step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum StepResult {
    /// The capability's typed output
    Output { output: CapabilityOutput },
    /// The error message that stopped the step
    Error { message: String },
}

/// One step of a workflow plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// Position in the plan, ascending from 1
    pub number: u32,

    /// Capability this step delegates to
    pub kind: AgentKind,

    /// Self-contained instruction for that capability
    pub instruction: String,

    /// Short description of the step's intent
    pub summary: String,

    /// Lifecycle state
    pub status: StepStatus,

    /// Present exactly when the status is terminal
    pub result: Option<StepResult>,
}

impl PlanStep {
    /// Create a pending step.
    pub fn new(
        number: u32,
        kind: AgentKind,
        instruction: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            number,
            kind,
            instruction: instruction.into(),
            summary: summary.into(),
            status: StepStatus::Pending,
            result: None,
        }
    }

    /// Transition `Pending -> Active`.
    pub(crate) fn begin(&mut self) {
        debug_assert_eq!(self.status, StepStatus::Pending, "step started twice");
        self.status = StepStatus::Active;
    }

    /// Transition `Active -> Completed`, recording the output.
    pub(crate) fn complete(&mut self, output: CapabilityOutput) {
        debug_assert_eq!(self.status, StepStatus::Active, "completing a step that never started");
        self.status = StepStatus::Completed;
        self.result = Some(StepResult::Output { output });
    }

    /// Transition `Active -> Failed`, recording the error message.
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        debug_assert_eq!(self.status, StepStatus::Active, "failing a step that never started");
        self.status = StepStatus::Failed;
        self.result = Some(StepResult::Error { message: message.into() });
    }

    /// Whether the step reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Step shape as the model returns it, before validation.
#[derive(Debug, Deserialize)]
struct RawPlanStep {
    #[serde(default)]
    number: Option<u32>,
    kind: String,
    instruction: String,
    #[serde(default)]
    summary: String,
}

/// Plan generator backed by the model provider.
pub struct PlanGenerator {
    provider: Arc<dyn ModelProvider>,
    max_steps: usize,
}

impl PlanGenerator {
    /// Create a generator with the default plan-length limit.
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider, max_steps: 12 }
    }

    /// Set the maximum accepted plan length.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Generate and validate a plan for the objective.
    ///
    /// The model does the reasoning; this method's job is to reject
    /// anything that is not a well-formed, non-empty plan over known
    /// agent kinds.
    pub async fn generate(&self, objective: &str) -> Result<Vec<PlanStep>, PlanError> {
        let input = serde_json::json!({ "objective": objective });

        let value =
            self.provider.generate_structured(PromptTemplate::PlanGeneration, &input).await?;

        let plan = parse_plan(value, self.max_steps)?;

        tracing::info!(steps = plan.len(), "Plan generated");
        Ok(plan)
    }
}

/// Validate a raw plan value into pending steps.
///
/// Numbers are assigned from list order, starting at 1. If the model
/// supplied numbers they must already match; no silent reordering.
pub fn parse_plan(value: serde_json::Value, max_steps: usize) -> Result<Vec<PlanStep>, PlanError> {
    let raw: Vec<RawPlanStep> = serde_json::from_value(value)
        .map_err(|e| PlanError::Malformed(e.to_string()))?;

    if raw.is_empty() {
        return Err(PlanError::Empty);
    }

    if raw.len() > max_steps {
        return Err(PlanError::TooLong { len: raw.len(), max: max_steps });
    }

    let mut steps = Vec::with_capacity(raw.len());

    for (idx, raw_step) in raw.into_iter().enumerate() {
        let expected = u32::try_from(idx + 1).expect("plan length fits in u32");

        if let Some(found) = raw_step.number {
            if found != expected {
                return Err(PlanError::BadNumbering { expected, found });
            }
        }

        let kind = AgentKind::from_str(&raw_step.kind).map_err(PlanError::UnknownKind)?;

        if raw_step.instruction.trim().is_empty() {
            return Err(PlanError::Malformed(format!("step {expected} has an empty instruction")));
        }

        let summary = if raw_step.summary.trim().is_empty() {
            format!("{} step", kind)
        } else {
            raw_step.summary
        };

        steps.push(PlanStep::new(expected, kind, raw_step.instruction, summary));
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{DraftOutput, ResearchOutput};

    #[test]
    fn test_parse_valid_plan() {
        let value = serde_json::json!([
            {"kind": "research", "instruction": "find precedents", "summary": "research the issue"},
            {"kind": "draft", "instruction": "draft the motion", "summary": "draft"},
        ]);

        let plan = parse_plan(value, 12).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].number, 1);
        assert_eq!(plan[0].kind, AgentKind::Research);
        assert_eq!(plan[1].number, 2);
        assert_eq!(plan[1].kind, AgentKind::Draft);

        for step in &plan {
            assert_eq!(step.status, StepStatus::Pending);
            assert!(step.result.is_none());
        }
    }

    #[test]
    fn test_parse_accepts_matching_numbers() {
        let value = serde_json::json!([
            {"number": 1, "kind": "research", "instruction": "a", "summary": "s"},
            {"number": 2, "kind": "review", "instruction": "b", "summary": "s"},
        ]);

        let plan = parse_plan(value, 12).unwrap();
        assert_eq!(plan[1].number, 2);
    }

    #[test]
    fn test_parse_rejects_bad_numbering() {
        let value = serde_json::json!([
            {"number": 2, "kind": "research", "instruction": "a", "summary": "s"},
        ]);

        let err = parse_plan(value, 12).unwrap_err();
        assert!(matches!(err, PlanError::BadNumbering { expected: 1, found: 2 }));
    }

    #[test]
    fn test_parse_rejects_empty_plan() {
        let err = parse_plan(serde_json::json!([]), 12).unwrap_err();
        assert!(matches!(err, PlanError::Empty));
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        let value = serde_json::json!([
            {"kind": "summarize", "instruction": "a", "summary": "s"},
        ]);

        let err = parse_plan(value, 12).unwrap_err();
        match err {
            PlanError::UnknownKind(kind) => assert_eq!(kind, "summarize"),
            other => panic!("expected UnknownKind, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_plan(serde_json::json!({"kind": "research"}), 12).unwrap_err();
        assert!(matches!(err, PlanError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_oversized_plan() {
        let steps: Vec<_> = (0..5)
            .map(|_| serde_json::json!({"kind": "research", "instruction": "a", "summary": "s"}))
            .collect();

        let err = parse_plan(serde_json::Value::Array(steps), 3).unwrap_err();
        assert!(matches!(err, PlanError::TooLong { len: 5, max: 3 }));
    }

    #[test]
    fn test_missing_summary_gets_fallback() {
        let value = serde_json::json!([
            {"kind": "predict", "instruction": "assess the case"},
        ]);

        let plan = parse_plan(value, 12).unwrap();
        assert_eq!(plan[0].summary, "predict step");
    }

    #[test]
    fn test_step_lifecycle_sets_result_on_terminal_only() {
        let mut step = PlanStep::new(1, AgentKind::Research, "find precedents", "research");
        assert!(step.result.is_none());

        step.begin();
        assert_eq!(step.status, StepStatus::Active);
        assert!(step.result.is_none());

        step.complete(CapabilityOutput::Research(ResearchOutput {
            findings: "none".to_string(),
            sources: Vec::new(),
        }));
        assert_eq!(step.status, StepStatus::Completed);
        assert!(step.is_terminal());
        assert!(matches!(step.result, Some(StepResult::Output { .. })));
    }

    #[test]
    fn test_failed_step_records_message() {
        let mut step = PlanStep::new(1, AgentKind::Draft, "draft it", "draft");
        step.begin();
        step.fail("service unavailable");

        assert_eq!(step.status, StepStatus::Failed);
        match step.result {
            Some(StepResult::Error { ref message }) => assert_eq!(message, "service unavailable"),
            ref other => panic!("expected error result, got {other:?}"),
        }
    }

    #[test]
    fn test_step_result_serde_roundtrip() {
        let mut step = PlanStep::new(2, AgentKind::Draft, "draft it", "draft");
        step.begin();
        step.complete(CapabilityOutput::Draft(DraftOutput {
            document: "the document".to_string(),
            notes: String::new(),
        }));

        let json = serde_json::to_string(&step).unwrap();
        let parsed: PlanStep = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.number, 2);
        assert_eq!(parsed.status, StepStatus::Completed);
        assert!(matches!(parsed.result, Some(StepResult::Output { .. })));
    }
}
