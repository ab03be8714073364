//! Publishing stage: fan the finished article out to the requested
//! platforms.
//!
//! Individual platform failures are recorded, never fatal; the stage
//! itself only fails when it has no article to publish.

use crate::pipeline::payload::{
    ArticlePayload, CuratedImage, PlatformResult, PublicationPayload, StagePayload,
};
use crate::pipeline::{PipelineContext, PipelineStage, Stage, StageOutcome};
use crate::tools::MediumClient;
use async_trait::async_trait;
use std::path::Path;

const SLUG_MAX_LEN: usize = 60;

pub struct PublisherAgent {
    medium: Option<MediumClient>,
}

impl PublisherAgent {
    pub fn new(medium: Option<MediumClient>) -> Self {
        Self { medium }
    }

    /// Write the article and a metadata sidecar into `output_dir`.
    async fn publish_file(
        &self,
        article: &ArticlePayload,
        images: &[CuratedImage],
        output_dir: &str,
    ) -> PlatformResult {
        let slug = slugify(&article.title);
        let dir = Path::new(output_dir);
        let markdown_path = dir.join(format!("{slug}.md"));
        let metadata_path = dir.join(format!("{slug}_metadata.json"));

        let mut content = article.content.clone();
        if !images.is_empty() {
            content.push_str("\n\n---\n\n## Image Credits\n");
            for image in images {
                content.push_str(&format!(
                    "\n- [{}]({}) by [{}]({})",
                    image.description, image.url, image.author, image.author_url
                ));
            }
        }

        let metadata = serde_json::json!({
            "title": article.title,
            "topic": article.topic,
            "meta_description": article.meta_description,
            "tags": article.tags,
            "word_count": article.word_count,
            "image_count": images.len(),
            "generated_at": chrono::Utc::now().to_rfc3339(),
        });

        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&markdown_path, content).await?;
            tokio::fs::write(&metadata_path, serde_json::to_vec_pretty(&metadata)?).await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        match written {
            Ok(()) => PlatformResult::succeeded("file")
                .with_detail("markdown_file", markdown_path.display().to_string())
                .with_detail("metadata_file", metadata_path.display().to_string()),
            Err(error) => PlatformResult::failed("file", format!("write failed: {error}")),
        }
    }

    async fn publish_medium(&self, article: &ArticlePayload) -> PlatformResult {
        let Some(client) = &self.medium else {
            return PlatformResult::failed("medium", "medium access token not configured");
        };
        match client.publish_draft(article).await {
            Ok(url) => PlatformResult::succeeded("medium").with_detail("url", url),
            Err(error) => PlatformResult::failed("medium", error.to_string()),
        }
    }
}

/// Filesystem-safe slug from a title.
fn slugify(title: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
        if slug.len() >= SLUG_MAX_LEN {
            break;
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "article".to_string()
    } else {
        slug
    }
}

#[async_trait]
impl Stage for PublisherAgent {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Publishing
    }

    async fn execute(&self, ctx: &PipelineContext) -> StageOutcome {
        let Some(article) = ctx.article.as_ref() else {
            return StageOutcome::failure("publishing requires an article payload");
        };
        let images: &[CuratedImage] = ctx
            .images
            .as_ref()
            .map(|payload| payload.images.as_slice())
            .unwrap_or(&[]);

        let mut payload = PublicationPayload::new();
        for platform in &ctx.request.platforms {
            let result = match platform.as_str() {
                "file" => {
                    self.publish_file(article, images, &ctx.request.output_dir)
                        .await
                }
                "medium" => self.publish_medium(article).await,
                other => {
                    PlatformResult::failed(other, format!("platform '{other}' is not supported"))
                }
            };
            if result.success {
                tracing::info!(platform = %platform, "published");
            } else {
                tracing::warn!(
                    platform = %platform,
                    error = result.error.as_deref().unwrap_or(""),
                    "platform publish failed"
                );
            }
            payload.record(result);
        }

        StageOutcome::success(StagePayload::Publication(payload))
    }
}
