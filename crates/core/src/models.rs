//! # LLM Model Configuration
//!
//! Centralized provider/model selection for every agent in the pipeline.
//! Each agent receives its own [`ModelConfig`] at construction time; there is
//! no shared global client.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported LLM providers.
///
/// API keys are read from the environment by the radkit provider clients:
/// - Anthropic (Claude) - `ANTHROPIC_API_KEY`
/// - OpenAI (GPT) - `OPENAI_API_KEY`
/// - Gemini (Google) - `GEMINI_API_KEY`
/// - OpenRouter (Gateway) - `OPENROUTER_API_KEY`
/// - Grok (xAI) - `XAI_API_KEY`
/// - DeepSeek - `DEEPSEEK_API_KEY`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    Gemini,
    OpenRouter,
    Grok,
    DeepSeek,
}

impl LlmProvider {
    /// Display name for CLI output.
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::Gemini => "Gemini",
            LlmProvider::OpenRouter => "OpenRouter",
            LlmProvider::Grok => "Grok",
            LlmProvider::DeepSeek => "DeepSeek",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Gemini => "GEMINI_API_KEY",
            LlmProvider::OpenRouter => "OPENROUTER_API_KEY",
            LlmProvider::Grok => "XAI_API_KEY",
            LlmProvider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    /// Default model when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "claude-sonnet-4-20250514",
            LlmProvider::OpenAI => "gpt-4o",
            LlmProvider::Gemini => "gemini-2.0-flash-exp",
            LlmProvider::OpenRouter => "anthropic/claude-3.5-sonnet",
            LlmProvider::Grok => "grok-2",
            LlmProvider::DeepSeek => "deepseek-chat",
        }
    }

    /// Whether this provider supports a custom base URL.
    pub fn supports_base_url(&self) -> bool {
        matches!(self, LlmProvider::OpenAI)
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(LlmProvider::Anthropic),
            "openai" => Ok(LlmProvider::OpenAI),
            "gemini" => Ok(LlmProvider::Gemini),
            "openrouter" => Ok(LlmProvider::OpenRouter),
            "grok" | "xai" => Ok(LlmProvider::Grok),
            "deepseek" => Ok(LlmProvider::DeepSeek),
            other => Err(format!("unknown LLM provider '{other}'")),
        }
    }
}

/// Provider + model selection for a single agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// LLM provider to use.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name (e.g. "claude-sonnet-4-20250514", "gpt-4o").
    pub model: String,
    /// Optional base URL override for OpenAI-compatible APIs.
    pub base_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let provider = LlmProvider::default();
        Self {
            model: provider.default_model().to_string(),
            provider,
            base_url: None,
        }
    }
}

impl ModelConfig {
    /// Create a config for a specific provider, using its default model.
    pub fn for_provider(provider: LlmProvider) -> Self {
        Self {
            model: provider.default_model().to_string(),
            provider,
            base_url: None,
        }
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a base URL (only honoured by OpenAI-compatible providers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_anthropic() {
        let config = ModelConfig::default();
        assert_eq!(config.provider, LlmProvider::Anthropic);
        assert!(config.model.contains("claude"));
    }

    #[test]
    fn provider_parsing_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<LlmProvider>(), Ok(LlmProvider::OpenAI));
        assert_eq!("anthropic".parse::<LlmProvider>(), Ok(LlmProvider::Anthropic));
        assert!("claude".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn every_provider_names_a_key_and_model() {
        for provider in [
            LlmProvider::Anthropic,
            LlmProvider::OpenAI,
            LlmProvider::Gemini,
            LlmProvider::OpenRouter,
            LlmProvider::Grok,
            LlmProvider::DeepSeek,
        ] {
            assert!(provider.api_key_env().ends_with("_KEY"));
            assert!(!provider.default_model().is_empty());
        }
    }

    #[test]
    fn base_url_only_for_openai() {
        assert!(LlmProvider::OpenAI.supports_base_url());
        assert!(!LlmProvider::Anthropic.supports_base_url());
    }
}
