//! Ollama local LLM integration.
//!
//! Implements the ModelProvider trait for Ollama (local LLM).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{extract_json, ModelError, ModelProvider, PromptTemplate};
use crate::core::ModelConfig;

/// Ollama API provider for local LLM.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Create a provider from config.
    ///
    /// OLLAMA_HOST and OLLAMA_MODEL environment variables override the
    /// configured values.
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: std::env::var("OLLAMA_HOST")
                .unwrap_or_else(|_| config.ollama.base_url.clone()),
            model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| config.ollama.model.clone()),
        }
    }

    /// Create with a specific base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Create with a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Make a request to the Ollama API.
    async fn request(&self, prompt: &str) -> Result<String, ModelError> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: "json".to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, body });
        }

        let response: OllamaResponse = response.json().await?;
        Ok(response.response)
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    async fn generate_structured(
        &self,
        template: PromptTemplate,
        input: &serde_json::Value,
    ) -> Result<serde_json::Value, ModelError> {
        let payload = serde_json::to_string_pretty(input).unwrap_or_else(|_| input.to_string());
        let prompt = format!("{}\n\nInput:\n{}", template.system_prompt(), payload);

        tracing::debug!(template = %template, model = %self.model, "Ollama request");

        let text = self.request(&prompt).await?;
        extract_json(&text)
    }

    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        // Try to reach the Ollama API
        let result = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(std::time::Duration::from_secs(2))
            .send()
            .await;

        result.is_ok()
    }
}

/// Ollama API request structure.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: String,
}

/// Ollama API response structure.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        std::env::remove_var("OLLAMA_HOST");
        std::env::remove_var("OLLAMA_MODEL");
        let provider = OllamaProvider::from_config(&ModelConfig::default());
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_with_custom_url() {
        let provider =
            OllamaProvider::from_config(&ModelConfig::default()).with_base_url("http://custom:8080");
        assert_eq!(provider.base_url, "http://custom:8080");
    }

    #[test]
    fn test_with_custom_model() {
        let provider = OllamaProvider::from_config(&ModelConfig::default()).with_model("mistral");
        assert_eq!(provider.model, "mistral");
    }

    #[test]
    fn test_request_asks_for_json() {
        let request = OllamaRequest {
            model: "llama3.2".to_string(),
            prompt: "prompt".to_string(),
            stream: false,
            format: "json".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["format"], "json");
        assert_eq!(json["stream"], false);
    }
}
