//! Image curation stage.
//!
//! Images are an enhancement. This stage degrades on every external
//! failure and only reports failure when its input contract is broken.

use crate::models::ModelConfig;
use crate::pipeline::payload::{CuratedImage, ImagesPayload, StagePayload};
use crate::pipeline::{PipelineContext, PipelineStage, Stage, StageOutcome};
use crate::retry::RetryPolicy;
use crate::run_llm;
use crate::tools::UnsplashClient;
use async_trait::async_trait;
use radkit::macros::LLMOutput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Ceiling on images attached to one article.
const MAX_IMAGES: usize = 3;
const MAX_QUERIES: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, LLMOutput)]
struct ImageQueryPlan {
    /// Short stock-photo search queries.
    queries: Vec<String>,
}

/// Fills the images slot from Unsplash search results.
pub struct ImageAgent {
    config: ModelConfig,
    unsplash: Option<UnsplashClient>,
    retry: RetryPolicy,
}

impl ImageAgent {
    pub fn new(config: ModelConfig, unsplash: Option<UnsplashClient>, retry: RetryPolicy) -> Self {
        Self {
            config,
            unsplash,
            retry,
        }
    }

    async fn plan_queries(&self, title: &str, meta_description: &str, topic: &str) -> Vec<String> {
        let input = format!("Title: {title}\nDescription: {meta_description}");
        match run_llm!(&self.retry, &self.config, ImageQueryPlan, SYSTEM_PROMPT, input) {
            Ok(plan) if !plan.queries.is_empty() => plan.queries,
            Ok(_) => vec![topic.to_string()],
            Err(error) => {
                tracing::warn!(%error, "image query planning failed, searching the topic directly");
                vec![topic.to_string()]
            }
        }
    }
}

/// Pick up to `limit` images, preferring one per author for visual
/// variety, then filling from the remainder in search order.
fn select_diverse(candidates: Vec<CuratedImage>, limit: usize) -> Vec<CuratedImage> {
    let mut selected: Vec<CuratedImage> = Vec::new();
    let mut leftovers: Vec<CuratedImage> = Vec::new();

    for image in candidates {
        if selected.len() == limit {
            break;
        }
        if selected.iter().any(|s| s.author == image.author) {
            leftovers.push(image);
        } else {
            selected.push(image);
        }
    }
    for image in leftovers {
        if selected.len() == limit {
            break;
        }
        selected.push(image);
    }
    selected
}

#[async_trait]
impl Stage for ImageAgent {
    fn stage(&self) -> PipelineStage {
        PipelineStage::CuratingImages
    }

    async fn execute(&self, ctx: &PipelineContext) -> StageOutcome {
        let Some(article) = ctx.article.as_ref() else {
            return StageOutcome::failure("image curation requires an article payload");
        };

        let Some(client) = &self.unsplash else {
            tracing::info!("no Unsplash access key configured, skipping image curation");
            return StageOutcome::success(StagePayload::Images(ImagesPayload::default()));
        };

        let queries = self
            .plan_queries(&article.title, &article.meta_description, &article.topic)
            .await;

        let mut candidates = Vec::new();
        for query in queries.iter().take(MAX_QUERIES) {
            match self.retry.run(|| client.search_photos(query)).await {
                Ok(images) => candidates.extend(images),
                Err(error) => {
                    tracing::warn!(query = %query, %error, "image search failed, skipping query");
                }
            }
        }

        let images = select_diverse(candidates, MAX_IMAGES);
        for image in &images {
            if let Some(location) = &image.download_location {
                if let Err(error) = client.track_download(location).await {
                    tracing::debug!(%error, "download tracking failed");
                }
            }
        }

        tracing::info!(count = images.len(), "images curated");
        StageOutcome::success(StagePayload::Images(ImagesPayload { images }))
    }
}

const SYSTEM_PROMPT: &str = include_str!("defaults/image_queries.md");
