//! # Configuration
//!
//! Environment-backed settings for the pipeline and its integrations. The
//! CLI loads `.env` (via dotenvy), builds a [`Config`], and calls
//! [`Config::validate_required`] before any pipeline run; the orchestrator
//! itself never touches the environment.

use crate::models::{LlmProvider, ModelConfig};
use std::str::FromStr;
use thiserror::Error;

/// Configuration loading/validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("{0} is required but not set")]
    MissingCredential(&'static str),
}

/// Unsplash search result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsplashOrderBy {
    #[default]
    Relevant,
    Latest,
}

impl UnsplashOrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnsplashOrderBy::Relevant => "relevant",
            UnsplashOrderBy::Latest => "latest",
        }
    }
}

impl FromStr for UnsplashOrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevant" => Ok(UnsplashOrderBy::Relevant),
            "latest" => Ok(UnsplashOrderBy::Latest),
            other => Err(format!("must be 'relevant' or 'latest', got '{other}'")),
        }
    }
}

/// Unsplash content filtering level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsplashContentFilter {
    Low,
    #[default]
    High,
}

impl UnsplashContentFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnsplashContentFilter::Low => "low",
            UnsplashContentFilter::High => "high",
        }
    }
}

impl FromStr for UnsplashContentFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(UnsplashContentFilter::Low),
            "high" => Ok(UnsplashContentFilter::High),
            other => Err(format!("must be 'low' or 'high', got '{other}'")),
        }
    }
}

/// Unsplash image orientation filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsplashOrientation {
    #[default]
    Landscape,
    Portrait,
    Squarish,
}

impl UnsplashOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnsplashOrientation::Landscape => "landscape",
            UnsplashOrientation::Portrait => "portrait",
            UnsplashOrientation::Squarish => "squarish",
        }
    }
}

impl FromStr for UnsplashOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "landscape" => Ok(UnsplashOrientation::Landscape),
            "portrait" => Ok(UnsplashOrientation::Portrait),
            "squarish" => Ok(UnsplashOrientation::Squarish),
            other => Err(format!(
                "must be 'landscape', 'portrait', or 'squarish', got '{other}'"
            )),
        }
    }
}

/// Unsplash API maximum for the `per_page` query parameter.
pub const UNSPLASH_MAX_PER_PAGE: u32 = 30;

/// Tuning knobs for Unsplash photo searches.
#[derive(Debug, Clone)]
pub struct UnsplashSettings {
    /// Results per search query, 1..=30.
    pub per_page: u32,
    pub order_by: UnsplashOrderBy,
    pub content_filter: UnsplashContentFilter,
    pub orientation: UnsplashOrientation,
}

impl Default for UnsplashSettings {
    fn default() -> Self {
        Self {
            per_page: 10,
            order_by: UnsplashOrderBy::default(),
            content_filter: UnsplashContentFilter::default(),
            orientation: UnsplashOrientation::default(),
        }
    }
}

/// Settings for one pipeline process, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider/model used by every agent unless overridden per-agent.
    pub model: ModelConfig,
    /// Maximum web sources gathered during research.
    pub max_research_sources: usize,
    /// Attempt budget for retried external calls.
    pub max_retries: u32,
    /// Default tracing verbosity (overridable on the CLI).
    pub log_level: String,
    /// Self-hosted SearXNG instance; public instances are used when unset.
    pub searxng_url: Option<String>,
    /// Unsplash API key; image curation degrades to none when unset.
    pub unsplash_access_key: Option<String>,
    /// Medium integration token; medium publishing fails per-platform when unset.
    pub medium_access_token: Option<String>,
    pub unsplash: UnsplashSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            max_research_sources: 5,
            max_retries: 3,
            log_level: "info".to_string(),
            searxng_url: None,
            unsplash_access_key: None,
            medium_access_token: None,
            unsplash: UnsplashSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// The seam exists so configuration parsing stays testable without
    /// mutating process-global environment state.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let provider = match get("LLM_PROVIDER") {
            Some(raw) => raw
                .parse::<LlmProvider>()
                .map_err(|reason| ConfigError::Invalid {
                    var: "LLM_PROVIDER",
                    reason,
                })?,
            None => LlmProvider::default(),
        };

        let mut model = ModelConfig::for_provider(provider);
        if let Some(name) = get("LLM_MODEL").filter(|m| !m.trim().is_empty()) {
            model = model.with_model(name);
        }
        if let Some(url) = get("LLM_BASE_URL").filter(|u| !u.trim().is_empty()) {
            model = model.with_base_url(url);
        }

        let per_page = parse_var(&get, "UNSPLASH_PER_PAGE", 10u32)?;
        if !(1..=UNSPLASH_MAX_PER_PAGE).contains(&per_page) {
            return Err(ConfigError::Invalid {
                var: "UNSPLASH_PER_PAGE",
                reason: format!("must be between 1 and {UNSPLASH_MAX_PER_PAGE}, got {per_page}"),
            });
        }

        Ok(Self {
            model,
            max_research_sources: parse_var(&get, "MAX_RESEARCH_SOURCES", 5usize)?,
            max_retries: parse_var(&get, "MAX_RETRIES", 3u32)?,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            searxng_url: get("SEARXNG_URL").filter(|u| !u.trim().is_empty()),
            unsplash_access_key: get("UNSPLASH_ACCESS_KEY").filter(|k| !k.trim().is_empty()),
            medium_access_token: get("MEDIUM_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()),
            unsplash: UnsplashSettings {
                per_page,
                order_by: parse_var(&get, "UNSPLASH_ORDER_BY", UnsplashOrderBy::default())?,
                content_filter: parse_var(
                    &get,
                    "UNSPLASH_CONTENT_FILTER",
                    UnsplashContentFilter::default(),
                )?,
                orientation: parse_var(
                    &get,
                    "UNSPLASH_ORIENTATION",
                    UnsplashOrientation::default(),
                )?,
            },
        })
    }

    /// Check that the configured LLM provider's API key is present.
    ///
    /// Called once before a pipeline run; never re-checked per stage.
    pub fn validate_required(&self) -> Result<(), ConfigError> {
        let var = self.model.provider.api_key_env();
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingCredential(var)),
        }
    }
}

fn parse_var<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}
