//! # Lexflow
//!
//! AI legal workflow orchestrator - plan and run multi-step legal agent
//! workflows from a single objective.
//!
//! Lexflow turns a free-text objective ("research non-compete enforceability
//! in California, then draft a compliant clause") into an ordered plan of
//! agent invocations, executes the plan strictly sequentially against a
//! generative model backend, threads each step's output forward as context,
//! and streams step-status events to consumers.
//!
//! ## Quick Start
//!
//! ```bash
//! # Install
//! cargo install lexflow
//!
//! # Run a workflow (needs ANTHROPIC_API_KEY, or a local Ollama)
//! lexflow run "Research precedents for X, then draft a demand letter"
//!
//! # Preview the plan without executing it
//! lexflow plan "Research precedents for X, then draft a demand letter"
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::format_push_string)]

pub mod agent;
pub mod core;
pub mod workflow;

pub use agent::{
    invoke, probe_backends, AgentKind, CapabilityInput, CapabilityOutput, ClaudeProvider,
    ModelError, ModelProvider, OllamaProvider, PromptTemplate, ProviderManager,
};
pub use core::{Config, RunDefaults};
pub use workflow::{
    ContextEntry, PlanError, PlanGenerator, PlanStep, RunContext, RunOutcome, StepResult,
    StepStatus, WorkflowError, WorkflowEvent, WorkflowExecutor, WorkflowRun,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "lexflow";
