//! Writing stage: persona, outline, article draft and metadata.

use crate::agents::audience::AudienceStrategist;
use crate::models::ModelConfig;
use crate::pipeline::payload::{ArticlePayload, StagePayload};
use crate::pipeline::request::TopicRequest;
use crate::pipeline::{PipelineContext, PipelineStage, Stage, StageOutcome};
use crate::retry::RetryPolicy;
use crate::run_llm;
use async_trait::async_trait;
use radkit::macros::LLMOutput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const MAX_TAGS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, LLMOutput)]
struct OutlineDraft {
    outline: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, LLMOutput)]
struct ArticleDraft {
    /// Full article in Markdown, starting with a `# ` title heading.
    content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, LLMOutput)]
struct ArticleMetadata {
    meta_description: String,
    tags: Vec<String>,
}

/// Fills the article slot from the research synthesis.
///
/// Any LLM failure here fails the stage; an article pipeline has
/// nothing to publish without a draft. Only the persona step degrades,
/// inside [`AudienceStrategist`].
pub struct WriterAgent {
    config: ModelConfig,
    retry: RetryPolicy,
    audience: AudienceStrategist,
}

impl WriterAgent {
    pub fn new(config: ModelConfig, retry: RetryPolicy) -> Self {
        let audience = AudienceStrategist::new(config.clone(), retry.clone());
        Self {
            config,
            retry,
            audience,
        }
    }

    async fn draft_outline(
        &self,
        request: &TopicRequest,
        persona: &str,
        synthesis: &str,
    ) -> anyhow::Result<String> {
        let input = format!(
            "Topic: {}\nStyle: {}\n\n{persona}\n\nResearch synthesis:\n{synthesis}",
            request.topic, request.style
        );
        let draft = run_llm!(&self.retry, &self.config, OutlineDraft, OUTLINE_PROMPT, input)?;
        Ok(draft.outline)
    }

    async fn draft_article(
        &self,
        request: &TopicRequest,
        persona: &str,
        outline: &str,
        synthesis: &str,
    ) -> anyhow::Result<String> {
        let input = format!(
            "Topic: {}\nStyle: {}\n\n{persona}\n\nOutline:\n{outline}\n\nResearch synthesis:\n{synthesis}",
            request.topic, request.style
        );
        let draft = run_llm!(&self.retry, &self.config, ArticleDraft, ARTICLE_PROMPT, input)?;
        Ok(draft.content)
    }

    async fn metadata(&self, title: &str, content: &str) -> anyhow::Result<ArticleMetadata> {
        let input = format!("Title: {title}\n\n{content}");
        run_llm!(&self.retry, &self.config, ArticleMetadata, METADATA_PROMPT, input)
    }
}

/// Title from the first `# ` heading, or a generic fallback.
fn extract_title(content: &str, topic: &str) -> String {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("# ").map(|t| t.trim().to_string()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("A Comprehensive Guide to {topic}"))
}

/// Trim, drop empties, deduplicate case-insensitively, clamp the count.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_string();
        if tag.is_empty() {
            continue;
        }
        let key = tag.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(tag);
        if out.len() == MAX_TAGS {
            break;
        }
    }
    out
}

#[async_trait]
impl Stage for WriterAgent {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Writing
    }

    async fn execute(&self, ctx: &PipelineContext) -> StageOutcome {
        let request = &ctx.request;
        let Some(research) = ctx.research.as_ref() else {
            return StageOutcome::failure("writing requires a research payload");
        };
        let synthesis = research.synthesis.trim();
        if synthesis.is_empty() {
            return StageOutcome::failure("research synthesis is empty, nothing to write from");
        }

        let persona = self
            .audience
            .persona(&request.topic, request.target_audience.as_deref())
            .await
            .render();

        let outline = match self.draft_outline(request, &persona, synthesis).await {
            Ok(outline) => outline,
            Err(error) => return StageOutcome::failure(format!("outline drafting failed: {error}")),
        };

        let content = match self
            .draft_article(request, &persona, &outline, synthesis)
            .await
        {
            Ok(content) => content,
            Err(error) => return StageOutcome::failure(format!("article drafting failed: {error}")),
        };
        if content.trim().is_empty() {
            return StageOutcome::failure("article draft came back empty");
        }

        let title = extract_title(&content, &request.topic);
        let metadata = match self.metadata(&title, &content).await {
            Ok(metadata) => metadata,
            Err(error) => {
                return StageOutcome::failure(format!("metadata generation failed: {error}"))
            }
        };

        let word_count = content.split_whitespace().count();
        tracing::info!(title = %title, word_count, "article drafted");

        StageOutcome::success(StagePayload::Article(ArticlePayload {
            title,
            content,
            outline,
            meta_description: metadata.meta_description,
            tags: normalize_tags(metadata.tags),
            word_count,
            topic: request.topic.clone(),
        }))
    }
}

const OUTLINE_PROMPT: &str = include_str!("defaults/outline.md");
const ARTICLE_PROMPT: &str = include_str!("defaults/article.md");
const METADATA_PROMPT: &str = include_str!("defaults/metadata.md");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::payload::{ResearchBrief, ResearchPayload};
    use crate::pipeline::TopicRequest;

    fn research_with_synthesis(synthesis: &str) -> ResearchPayload {
        ResearchPayload {
            topic: "static site generators".to_string(),
            analysis: "analysis".to_string(),
            search_results: Vec::new(),
            brief: ResearchBrief::default(),
            synthesis: synthesis.to_string(),
            sources_count: 0,
        }
    }

    #[test]
    fn title_comes_from_first_heading() {
        let content = "intro line\n# The Real Title\n\nBody.";
        assert_eq!(extract_title(content, "x"), "The Real Title");
    }

    #[test]
    fn missing_heading_falls_back_to_generic_title() {
        assert_eq!(
            extract_title("No heading here.", "Rust Macros"),
            "A Comprehensive Guide to Rust Macros"
        );
        assert_eq!(
            extract_title("#  \n", "Rust Macros"),
            "A Comprehensive Guide to Rust Macros"
        );
    }

    #[test]
    fn tags_are_deduplicated_and_clamped() {
        let tags: Vec<String> = [
            "Rust", "rust", " async ", "", "tokio", "web", "http", "server", "cloud", "infra",
            "extra",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let normalized = normalize_tags(tags);
        assert_eq!(normalized.len(), MAX_TAGS);
        assert_eq!(normalized[0], "Rust");
        assert_eq!(normalized[1], "async");
        assert!(!normalized.contains(&"extra".to_string()));
    }

    #[tokio::test]
    async fn empty_synthesis_fails_before_any_drafting() {
        let agent = WriterAgent::new(ModelConfig::default(), RetryPolicy::default());
        let mut ctx = PipelineContext::new(TopicRequest::new("static site generators"));
        ctx.research = Some(research_with_synthesis("   "));

        let outcome = agent.execute(&ctx).await;
        assert!(!outcome.is_ok());
        assert!(outcome.error().unwrap().contains("synthesis is empty"));
    }

    #[tokio::test]
    async fn missing_research_payload_fails() {
        let agent = WriterAgent::new(ModelConfig::default(), RetryPolicy::default());
        let ctx = PipelineContext::new(TopicRequest::new("static site generators"));

        let outcome = agent.execute(&ctx).await;
        assert!(!outcome.is_ok());
        assert!(outcome.error().unwrap().contains("requires a research"));
    }
}
