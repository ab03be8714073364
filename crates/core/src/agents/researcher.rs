//! Research stage: topic analysis, source gathering and brief extraction.

use crate::models::ModelConfig;
use crate::pipeline::payload::{ResearchBrief, ResearchPayload, SearchHit, StagePayload};
use crate::pipeline::{PipelineContext, PipelineStage, Stage, StageOutcome};
use crate::pipeline::request::TopicRequest;
use crate::retry::RetryPolicy;
use crate::run_llm;
use crate::tools::SearchClient;
use async_trait::async_trait;
use radkit::macros::LLMOutput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What the topic analyst returns.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, LLMOutput)]
pub struct TopicAnalysis {
    /// Why the topic matters and which angle to take.
    pub analysis: String,
    /// Subtopics the article should cover.
    pub subtopics: Vec<String>,
}

impl TopicAnalysis {
    fn render(&self) -> String {
        if self.subtopics.is_empty() {
            return self.analysis.clone();
        }
        let subtopics: Vec<String> = self.subtopics.iter().map(|s| format!("- {s}")).collect();
        format!("{}\n\nSubtopics:\n{}", self.analysis, subtopics.join("\n"))
    }
}

/// Fills the research slot.
///
/// Analysis and brief extraction go through the LLM; sources come from
/// the injected [`SearchClient`]. Zero sources is acceptable, an
/// unreachable search backend (after retries) is not.
pub struct ResearchAgent {
    config: ModelConfig,
    search: Arc<dyn SearchClient>,
    max_sources: usize,
    retry: RetryPolicy,
}

impl ResearchAgent {
    pub fn new(
        config: ModelConfig,
        search: Arc<dyn SearchClient>,
        max_sources: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            config,
            search,
            max_sources,
            retry,
        }
    }

    async fn analyze(&self, request: &TopicRequest) -> anyhow::Result<TopicAnalysis> {
        let mut input = format!("Topic: {}\nStyle: {}", request.topic, request.style);
        if let Some(audience) = &request.target_audience {
            input.push_str(&format!("\nTarget audience: {audience}"));
        }
        run_llm!(&self.retry, &self.config, TopicAnalysis, ANALYST_PROMPT, input)
    }

    async fn gather_sources(&self, topic: &str) -> anyhow::Result<Vec<SearchHit>> {
        self.retry
            .run(|| self.search.search(topic, self.max_sources))
            .await
    }

    /// Extract the structured brief. Extraction is an enhancement over
    /// the raw analysis, so failures degrade to an empty brief.
    async fn build_brief(&self, topic: &str, hits: &[SearchHit]) -> ResearchBrief {
        if hits.is_empty() {
            return ResearchBrief::default();
        }
        let input = format!("Topic: {topic}\n\nSearch results:\n{}", format_hits(hits));
        match run_llm!(&self.retry, &self.config, ResearchBrief, BRIEF_PROMPT, input) {
            Ok(brief) => brief,
            Err(error) => {
                tracing::warn!(%error, "brief extraction failed, continuing without a brief");
                ResearchBrief::default()
            }
        }
    }
}

fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "{}. {}\n   {}\n   Source: {}",
                i + 1,
                hit.title,
                hit.body,
                hit.source_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Stage for ResearchAgent {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Researching
    }

    async fn execute(&self, ctx: &PipelineContext) -> StageOutcome {
        let request = &ctx.request;

        let analysis = match self.analyze(request).await {
            Ok(analysis) => analysis,
            Err(error) => return StageOutcome::failure(format!("topic analysis failed: {error}")),
        };

        let hits = match self.gather_sources(&request.topic).await {
            Ok(hits) => hits,
            Err(error) => {
                return StageOutcome::failure(format!("source gathering failed: {error}"))
            }
        };
        if hits.is_empty() {
            tracing::warn!(topic = %request.topic, "no sources found, writing from analysis alone");
        }

        let brief = self.build_brief(&request.topic, &hits).await;
        let analysis_text = analysis.render();
        let synthesis = if brief.is_empty() {
            analysis_text.clone()
        } else {
            brief.render()
        };

        StageOutcome::success(StagePayload::Research(ResearchPayload {
            topic: request.topic.clone(),
            analysis: analysis_text,
            sources_count: hits.len(),
            search_results: hits,
            brief,
            synthesis,
        }))
    }
}

const ANALYST_PROMPT: &str = include_str!("defaults/topic_analyst.md");
const BRIEF_PROMPT: &str = include_str!("defaults/research_brief.md");
