//! Publishing drafts to Medium.

use crate::pipeline::payload::ArticlePayload;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_BASE: &str = "https://api.medium.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

// Medium accepts at most five tags per post.
const MAX_TAGS: usize = 5;

/// Client for the Medium publishing API.
pub struct MediumClient {
    client: reqwest::Client,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    data: MeData,
}

#[derive(Debug, Deserialize)]
struct MeData {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostRequest<'a> {
    title: &'a str,
    content_format: &'static str,
    content: &'a str,
    tags: &'a [String],
    publish_status: &'static str,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    url: String,
}

impl MediumClient {
    pub fn new(access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token,
        }
    }

    /// Create a draft post and return its URL.
    pub async fn publish_draft(&self, article: &ArticlePayload) -> Result<String> {
        let user_id = self.authenticated_user_id().await?;
        let tags: Vec<String> = article.tags.iter().take(MAX_TAGS).cloned().collect();
        let request = PostRequest {
            title: &article.title,
            content_format: "markdown",
            content: &article.content,
            tags: &tags,
            publish_status: "draft",
        };

        let response: PostResponse = self
            .client
            .post(format!("{API_BASE}/users/{user_id}/posts"))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .context("medium post request failed")?
            .error_for_status()
            .context("medium rejected the post")?
            .json()
            .await
            .context("medium post response was not valid JSON")?;

        Ok(response.data.url)
    }

    async fn authenticated_user_id(&self) -> Result<String> {
        let response: MeResponse = self
            .client
            .get(format!("{API_BASE}/me"))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("medium authentication request failed")?
            .error_for_status()
            .context("medium rejected the access token")?
            .json()
            .await
            .context("medium user response was not valid JSON")?;
        Ok(response.data.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_request_uses_medium_field_names() {
        let tags = vec!["rust".to_string(), "async".to_string()];
        let request = PostRequest {
            title: "A Title",
            content_format: "markdown",
            content: "# A Title\n\nBody.",
            tags: &tags,
            publish_status: "draft",
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contentFormat"], "markdown");
        assert_eq!(value["publishStatus"], "draft");
        assert_eq!(value["tags"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn me_response_parses() {
        let raw = r#"{"data": {"id": "1c9", "username": "plume"}}"#;
        let parsed: MeResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.id, "1c9");
    }
}
