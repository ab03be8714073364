//! Topic request: the immutable input to one pipeline run.

use super::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Writing style applied by the writer agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritingStyle {
    #[default]
    Professional,
    Casual,
    Technical,
    Accessible,
}

impl WritingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            WritingStyle::Professional => "professional",
            WritingStyle::Casual => "casual",
            WritingStyle::Technical => "technical",
            WritingStyle::Accessible => "accessible",
        }
    }
}

impl fmt::Display for WritingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WritingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professional" => Ok(WritingStyle::Professional),
            "casual" => Ok(WritingStyle::Casual),
            "technical" => Ok(WritingStyle::Technical),
            "accessible" => Ok(WritingStyle::Accessible),
            other => Err(format!(
                "unknown style '{other}' (expected professional, casual, technical, or accessible)"
            )),
        }
    }
}

/// Input for one end-to-end content creation run.
///
/// Immutable once [`crate::pipeline::Orchestrator::run`] starts; the
/// orchestrator validates it before any stage executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRequest {
    /// Topic to create content about. Must be non-empty after trimming.
    pub topic: String,
    /// Writing style preference.
    #[serde(default)]
    pub style: WritingStyle,
    /// Target audience description; drives reader-persona generation.
    #[serde(default)]
    pub target_audience: Option<String>,
    /// Publishing destinations, in presentation order. Must be non-empty;
    /// duplicates collapse to the first occurrence.
    pub platforms: Vec<String>,
    /// Output directory for file-based publishing.
    pub output_dir: String,
}

impl TopicRequest {
    /// Build a request with defaults: professional style, no audience,
    /// file publishing into `output/`.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            style: WritingStyle::default(),
            target_audience: None,
            platforms: vec!["file".to_string()],
            output_dir: "output".to_string(),
        }
    }

    pub fn with_style(mut self, style: WritingStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.target_audience = Some(audience.into());
        self
    }

    pub fn with_platforms(mut self, platforms: Vec<String>) -> Self {
        self.platforms = platforms;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Precondition check, run before any stage executes.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.topic.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(
                "topic must not be empty".to_string(),
            ));
        }
        if self.platforms.iter().all(|p| p.trim().is_empty()) {
            return Err(PipelineError::InvalidRequest(
                "at least one publishing platform is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy with trimmed topic and platform duplicates collapsed, keeping
    /// first-occurrence order.
    pub fn normalized(&self) -> Self {
        let mut seen = Vec::new();
        for platform in &self.platforms {
            let platform = platform.trim().to_ascii_lowercase();
            if !platform.is_empty() && !seen.contains(&platform) {
                seen.push(platform);
            }
        }
        Self {
            topic: self.topic.trim().to_string(),
            platforms: seen,
            ..self.clone()
        }
    }
}
