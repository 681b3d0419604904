//! Configuration management for Lexflow.
//!
//! Handles loading and saving configuration from TOML files, and holds the
//! run-defaults policy that fills the ancillary fields of capability inputs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Model provider settings
    pub model: ModelConfig,

    /// Per-capability run defaults
    pub defaults: RunDefaults,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format for CLI commands (text, json)
    pub format: String,

    /// Upper bound on accepted plan length; longer plans are rejected
    pub max_plan_steps: usize,
}

/// Model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Provider selection: "auto" probes Claude then Ollama; or name one
    /// of "claude", "ollama" explicitly
    pub provider: String,

    /// Claude model to use
    pub claude_model: String,

    /// Maximum tokens per model response
    pub max_tokens: u32,

    /// Request timeout in seconds for provider calls
    pub request_timeout_secs: u64,

    /// Ollama-specific settings
    pub ollama: OllamaConfig,
}

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama server URL
    pub base_url: String,

    /// Model to use
    pub model: String,
}

/// Ancillary input fields per capability, applied wherever a step's
/// instruction and context do not determine them.
///
/// Overridable per run, through the config file or CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDefaults {
    /// Drafting defaults
    pub draft: DraftDefaults,

    /// Outcome-prediction defaults
    pub predict: PredictDefaults,

    /// Negotiation defaults
    pub negotiate: NegotiateDefaults,

    /// Cross-examination defaults
    pub cross_examine: CrossExamineDefaults,
}

/// Defaults for document drafting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftDefaults {
    /// Kind of document to draft
    pub document_type: String,

    /// Drafting tone
    pub tone: String,

    /// Governing jurisdiction
    pub jurisdiction: String,
}

/// Defaults for case-outcome prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictDefaults {
    /// Case category
    pub case_type: String,

    /// Jurisdiction the case is heard in
    pub jurisdiction: String,

    /// Presiding judge, if known
    pub judge: String,
}

/// Defaults for clause negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiateDefaults {
    /// Who sits across the table
    pub opponent_role: String,

    /// Their negotiating style, if known
    pub opponent_style: String,
}

/// Defaults for witness cross-examination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossExamineDefaults {
    /// Role the examining attorney plays
    pub examiner_role: String,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.lexflow.toml` in current directory
    /// 2. `~/.config/lexflow/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        // Try local config first
        let local_config = PathBuf::from(".lexflow.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        // Try global config
        if let Some(config_dir) = dirs::config_dir() {
            let global_config = config_dir.join("lexflow").join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        // Return defaults
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the global config file.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        let lexflow_dir = config_dir.join("lexflow");
        std::fs::create_dir_all(&lexflow_dir)?;

        let config_path = lexflow_dir.join("config.toml");
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lexflow"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            model: ModelConfig::default(),
            defaults: RunDefaults::default(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { format: "text".to_string(), max_plan_steps: 12 }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "auto".to_string(),
            claude_model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 2048,
            request_timeout_secs: 120,
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:11434".to_string(), model: "llama3.2".to_string() }
    }
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            draft: DraftDefaults::default(),
            predict: PredictDefaults::default(),
            negotiate: NegotiateDefaults::default(),
            cross_examine: CrossExamineDefaults::default(),
        }
    }
}

impl Default for DraftDefaults {
    fn default() -> Self {
        Self {
            document_type: "contract".to_string(),
            tone: "neutral".to_string(),
            jurisdiction: "generic".to_string(),
        }
    }
}

impl Default for PredictDefaults {
    fn default() -> Self {
        Self {
            case_type: "generic".to_string(),
            jurisdiction: "unspecified".to_string(),
            judge: "unspecified".to_string(),
        }
    }
}

impl Default for NegotiateDefaults {
    fn default() -> Self {
        Self {
            opponent_role: "opposing counsel".to_string(),
            opponent_style: "unspecified".to_string(),
        }
    }
}

impl Default for CrossExamineDefaults {
    fn default() -> Self {
        Self { examiner_role: "defense counsel".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.format, "text");
        assert_eq!(config.model.provider, "auto");
        assert_eq!(config.defaults.draft.document_type, "contract");
        assert_eq!(config.defaults.draft.jurisdiction, "generic");
        assert_eq!(config.defaults.predict.judge, "unspecified");
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.model.provider = "ollama".to_string();
        config.defaults.draft.jurisdiction = "California".to_string();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.model.provider, "ollama");
        assert_eq!(parsed.defaults.draft.jurisdiction, "California");
        assert_eq!(parsed.defaults.draft.tone, "neutral");
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let toml_str = r#"
            [model]
            provider = "claude"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.provider, "claude");
        // Unspecified sections keep their defaults
        assert_eq!(config.model.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.general.max_plan_steps, 12);
        assert_eq!(config.defaults.negotiate.opponent_role, "opposing counsel");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [defaults.draft]
            document_type = "memorandum"
            "#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.defaults.draft.document_type, "memorandum");
        assert_eq!(config.defaults.draft.tone, "neutral");
    }
}
