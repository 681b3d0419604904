//! Claude API integration.
//!
//! Implements the ModelProvider trait for Claude.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{extract_json, ModelError, ModelProvider, PromptTemplate};
use crate::core::ModelConfig;

/// Claude API provider.
pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeProvider {
    /// Create a provider from config.
    ///
    /// Reads the API key from the ANTHROPIC_API_KEY environment variable.
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            ModelError::ProviderNotAvailable("ANTHROPIC_API_KEY not set".to_string())
        })?;

        let client =
            Client::builder().timeout(Duration::from_secs(config.request_timeout_secs)).build()?;

        Ok(Self {
            client,
            api_key,
            model: config.claude_model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Create with a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Make a request to the Claude API.
    async fn request(&self, system: &str, user_message: &str) -> Result<String, ModelError> {
        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            // Deterministic decoding for structured output
            temperature: 0.0,
            system: system.to_string(),
            messages: vec![Message { role: "user".to_string(), content: user_message.to_string() }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, body });
        }

        let response: ClaudeResponse = response.json().await?;

        response.content.first().map(|c| c.text.clone()).ok_or(ModelError::NoResponse)
    }
}

#[async_trait]
impl ModelProvider for ClaudeProvider {
    async fn generate_structured(
        &self,
        template: PromptTemplate,
        input: &serde_json::Value,
    ) -> Result<serde_json::Value, ModelError> {
        let user_message =
            serde_json::to_string_pretty(input).unwrap_or_else(|_| input.to_string());

        tracing::debug!(template = %template, model = %self.model, "Claude request");

        let text = self.request(template.system_prompt(), &user_message).await?;
        extract_json(&text)
    }

    fn name(&self) -> &str {
        "claude"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Claude API request structure.
#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Message>,
}

/// Message in a Claude request.
#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

/// Claude API response structure.
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
}

/// Content block in a Claude response.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation_fails_without_key() {
        // Clear the env var for this test
        std::env::remove_var("ANTHROPIC_API_KEY");
        let result = ClaudeProvider::from_config(&ModelConfig::default());
        assert!(matches!(result, Err(ModelError::ProviderNotAvailable(_))));
    }

    #[test]
    fn test_request_serializes_expected_shape() {
        let request = ClaudeRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            system: "system prompt".to_string(),
            messages: vec![Message { role: "user".to_string(), content: "{}".to_string() }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-sonnet-4-20250514");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["temperature"], 0.0);
    }
}
