//! Web search over SearXNG.

use crate::pipeline::payload::SearchHit;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam between the research stage and whichever search backend serves
/// it. Tests substitute an in-memory implementation.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run a query and return up to `max_results` hits.
    ///
    /// `Ok(vec![])` means a backend answered with no results; `Err`
    /// means no backend could be reached at all.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// SearXNG client. Tries the configured instance first, then a short
/// list of public instances, then a local one.
pub struct SearxClient {
    client: reqwest::Client,
    configured_url: Option<String>,
}

impl SearxClient {
    pub fn new(configured_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            configured_url,
        }
    }

    fn endpoints(&self) -> Vec<String> {
        let mut endpoints = Vec::new();
        if let Some(url) = &self.configured_url {
            endpoints.push(format!("{}/search", url.trim_end_matches('/')));
        }
        // Public instances, see https://searx.space/
        endpoints.extend([
            "https://searx.be/search".to_string(),
            "https://search.sapti.me/search".to_string(),
            "https://searx.tiekoetter.com/search".to_string(),
        ]);
        endpoints.push("http://localhost:8888/search".to_string());
        endpoints
    }
}

#[async_trait]
impl SearchClient for SearxClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        for endpoint in self.endpoints() {
            let url = format!("{}?q={}&format=json", endpoint, urlencoding::encode(query));
            let response = match self
                .client
                .get(&url)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
            {
                Ok(response) => response,
                Err(error) => {
                    tracing::debug!(endpoint = %endpoint, %error, "search endpoint unreachable");
                    continue;
                }
            };
            let json = match response.json::<serde_json::Value>().await {
                Ok(json) => json,
                Err(error) => {
                    tracing::debug!(endpoint = %endpoint, %error, "search endpoint returned bad JSON");
                    continue;
                }
            };
            if let Some(results) = json.get("results").and_then(|r| r.as_array()) {
                let hits = results
                    .iter()
                    .take(max_results)
                    .map(|r| SearchHit {
                        title: str_field(r, "title"),
                        body: str_field(r, "content"),
                        source_url: str_field(r, "url"),
                    })
                    .collect();
                return Ok(hits);
            }
        }
        Err(anyhow!("no search backend reachable for query '{query}'"))
    }
}

fn str_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
