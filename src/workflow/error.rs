//! Workflow error types.

use crate::agent::ModelError;

/// Reasons a plan cannot be produced.
///
/// All of these are fatal before any step executes.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("model returned an empty plan")]
    Empty,

    #[error("model returned a malformed plan: {0}")]
    Malformed(String),

    #[error("plan step numbering mismatch: expected {expected}, found {found}")]
    BadNumbering { expected: u32, found: u32 },

    #[error("unknown agent kind in plan: {0}")]
    UnknownKind(String),

    #[error("plan has {len} steps, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error(transparent)]
    Provider(#[from] ModelError),
}

/// Run-level failures returned by the workflow entry point.
///
/// Step failures do not appear here: they are recorded on the failing
/// step and reported through the run outcome, so callers still receive
/// the partial plan.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("plan generation failed: {0}")]
    Plan(#[from] PlanError),
}
