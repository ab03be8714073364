//! Reader persona modelling.

use crate::models::ModelConfig;
use crate::retry::RetryPolicy;
use crate::run_llm;
use radkit::macros::LLMOutput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Who the article is written for.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, LLMOutput)]
pub struct ReaderPersona {
    /// One-paragraph sketch of the typical reader.
    pub persona: String,
    /// "beginner", "intermediate" or "expert".
    pub knowledge_level: String,
    /// Problems the article must address.
    pub pain_points: Vec<String>,
    /// Tone guidance for the writer.
    pub tone: String,
}

impl Default for ReaderPersona {
    fn default() -> Self {
        Self {
            persona: "A curious general reader who found the article through search and wants a \
                      clear, trustworthy introduction to the topic."
                .to_string(),
            knowledge_level: "beginner".to_string(),
            pain_points: Vec::new(),
            tone: "clear and approachable, explain terms on first use".to_string(),
        }
    }
}

impl ReaderPersona {
    /// Render the persona as prompt context for the writer.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Reader: {}\nKnowledge level: {}\nTone: {}",
            self.persona, self.knowledge_level, self.tone
        );
        if !self.pain_points.is_empty() {
            out.push_str("\nPain points:");
            for point in &self.pain_points {
                out.push_str("\n- ");
                out.push_str(point);
            }
        }
        out
    }
}

/// Builds a [`ReaderPersona`] for a topic. Persona modelling is an
/// enhancement, so failures degrade to the default persona instead of
/// failing the writing stage.
pub struct AudienceStrategist {
    config: ModelConfig,
    retry: RetryPolicy,
}

impl AudienceStrategist {
    pub fn new(config: ModelConfig, retry: RetryPolicy) -> Self {
        Self { config, retry }
    }

    pub async fn persona(&self, topic: &str, audience: Option<&str>) -> ReaderPersona {
        let input = match audience {
            Some(audience) => format!("Topic: {topic}\nTarget audience: {audience}"),
            None => format!("Topic: {topic}"),
        };
        match run_llm!(&self.retry, &self.config, ReaderPersona, SYSTEM_PROMPT, input) {
            Ok(persona) => persona,
            Err(error) => {
                tracing::warn!(%error, "persona modelling failed, using default persona");
                ReaderPersona::default()
            }
        }
    }
}

const SYSTEM_PROMPT: &str = include_str!("defaults/persona.md");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_persona_targets_a_general_reader() {
        let persona = ReaderPersona::default();
        assert_eq!(persona.knowledge_level, "beginner");
        assert!(persona.pain_points.is_empty());
    }

    #[test]
    fn render_includes_pain_points_when_present() {
        let persona = ReaderPersona {
            pain_points: vec!["unsure which runtime to pick".to_string()],
            ..ReaderPersona::default()
        };
        let text = persona.render();
        assert!(text.contains("Pain points:"));
        assert!(text.contains("- unsure which runtime to pick"));

        let bare = ReaderPersona::default().render();
        assert!(!bare.contains("Pain points:"));
    }
}
