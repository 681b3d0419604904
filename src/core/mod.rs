//! Core types and functionality for Lexflow.
//!
//! This module contains configuration and the run-defaults policy shared by
//! the agent and workflow layers.

mod config;

pub use config::{
    Config, CrossExamineDefaults, DraftDefaults, GeneralConfig, ModelConfig, NegotiateDefaults,
    OllamaConfig, PredictDefaults, RunDefaults,
};
