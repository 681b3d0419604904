//! Generative model integration.
//!
//! Provides the boundary to the hosted model service: a uniform
//! structured-output request per capability, with Claude and Ollama
//! backends.
//!
//! ## Structure
//!
//! - `ModelProvider` - the provider trait (one structured call per request)
//! - `ClaudeProvider` / `OllamaProvider` - concrete backends
//! - `capability` - the six agent kinds and their typed input/output schemas

mod capability;
mod claude;
mod ollama;
mod prompts;

pub use capability::{
    invoke, AgentKind, CapabilityInput, CapabilityOutput, CrossExamineInput, CrossExamineOutput,
    DraftInput, DraftOutput, NegotiateInput, NegotiateOutput, PredictInput, PredictOutput,
    ResearchInput, ResearchOutput, ReviewInput, ReviewOutput,
};
pub use claude::ClaudeProvider;
pub use ollama::OllamaProvider;
pub use prompts::PromptTemplate;

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::ModelConfig;

/// Trait for model provider backends.
///
/// Each call issues exactly one outbound request; retries and rate limiting
/// are the service's concern, not the caller's.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Generate a structured (JSON) response for the given template and
    /// typed input.
    async fn generate_structured(
        &self,
        template: PromptTemplate,
        input: &serde_json::Value,
    ) -> Result<serde_json::Value, ModelError>;

    /// Get the provider name.
    fn name(&self) -> &str;

    /// Check if the provider is available.
    async fn is_available(&self) -> bool;
}

/// Model service error types.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No response from model")]
    NoResponse,

    #[error("Response failed schema validation: {0}")]
    SchemaValidation(String),
}

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid fence regex"));

/// Extract a JSON value from a raw model response.
///
/// Accepts bare JSON, a fenced ```json block, or JSON embedded in
/// surrounding prose (first `{`/`[` to last `}`/`]`).
pub(crate) fn extract_json(text: &str) -> Result<serde_json::Value, ModelError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ModelError::NoResponse);
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let Some(caps) = JSON_FENCE.captures(trimmed) {
        if let Ok(value) = serde_json::from_str(caps[1].trim()) {
            return Ok(value);
        }
    }

    // Last resort: slice from the first opening bracket to the last
    // matching closing bracket.
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if start < end {
                if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                    return Ok(value);
                }
            }
        }
    }

    Err(ModelError::SchemaValidation(format!(
        "response is not valid JSON: {}",
        truncate(trimmed, 200)
    )))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Selects and holds the active model provider.
///
/// Probes backends once at startup in configured order; there is no
/// per-call fallback, so each invocation still maps to exactly one
/// outbound request.
pub struct ProviderManager {
    provider: Arc<dyn ModelProvider>,
}

impl ProviderManager {
    /// Select a provider according to config.
    ///
    /// `provider = "auto"` probes Claude (requires `ANTHROPIC_API_KEY`)
    /// then Ollama; naming a provider requires that provider to be up.
    pub async fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        match config.provider.as_str() {
            "claude" => {
                let claude = ClaudeProvider::from_config(config)?;
                Ok(Self { provider: Arc::new(claude) })
            }
            "ollama" => {
                let ollama = OllamaProvider::from_config(config);
                if !ollama.is_available().await {
                    return Err(ModelError::ProviderNotAvailable(format!(
                        "Ollama not reachable at {}",
                        config.ollama.base_url
                    )));
                }
                Ok(Self { provider: Arc::new(ollama) })
            }
            _ => {
                // Auto-detect: Claude first, then local Ollama
                if let Ok(claude) = ClaudeProvider::from_config(config) {
                    if claude.is_available().await {
                        return Ok(Self { provider: Arc::new(claude) });
                    }
                }

                let ollama = OllamaProvider::from_config(config);
                if ollama.is_available().await {
                    return Ok(Self { provider: Arc::new(ollama) });
                }

                Err(ModelError::ProviderNotAvailable(
                    "no model provider available; set ANTHROPIC_API_KEY for Claude, \
                     or run Ollama locally"
                        .to_string(),
                ))
            }
        }
    }

    /// Wrap an already-constructed provider (used by tests and embedders).
    pub fn with_provider(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    /// Get the active provider.
    pub fn provider(&self) -> Arc<dyn ModelProvider> {
        Arc::clone(&self.provider)
    }

    /// Get the active provider name.
    pub fn active_provider(&self) -> &str {
        self.provider.name()
    }
}

/// Probe all known backends and report availability, for diagnostics.
pub async fn probe_backends(config: &ModelConfig) -> Vec<(String, bool)> {
    let mut report = Vec::new();

    match ClaudeProvider::from_config(config) {
        Ok(claude) => report.push(("claude".to_string(), claude.is_available().await)),
        Err(_) => report.push(("claude".to_string(), false)),
    }

    let ollama = OllamaProvider::from_config(config);
    report.push(("ollama".to_string(), ollama.is_available().await));

    report
}
