//! Unsplash photo search and download tracking.

use crate::config::{UnsplashSettings, UNSPLASH_MAX_PER_PAGE};
use crate::pipeline::payload::CuratedImage;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

const API_BASE: &str = "https://api.unsplash.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the Unsplash search API.
///
/// The API guidelines require registering a download whenever a photo
/// is actually used; [`UnsplashClient::track_download`] does that.
pub struct UnsplashClient {
    client: reqwest::Client,
    access_key: String,
    settings: UnsplashSettings,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
    description: Option<String>,
    alt_description: Option<String>,
    user: PhotoUser,
    links: PhotoLinks,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

#[derive(Debug, Deserialize)]
struct PhotoUser {
    name: String,
    links: UserLinks,
}

#[derive(Debug, Deserialize)]
struct UserLinks {
    html: String,
}

#[derive(Debug, Deserialize)]
struct PhotoLinks {
    download_location: String,
}

impl UnsplashClient {
    pub fn new(access_key: String, settings: UnsplashSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_key,
            settings,
        }
    }

    /// Search photos matching `query`, mapped into curated-image records.
    pub async fn search_photos(&self, query: &str) -> Result<Vec<CuratedImage>> {
        let per_page = self.settings.per_page.min(UNSPLASH_MAX_PER_PAGE);
        let response = self
            .client
            .get(format!("{API_BASE}/search/photos"))
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .query(&[
                ("query", query),
                ("per_page", &per_page.to_string()),
                ("order_by", self.settings.order_by.as_str()),
                ("content_filter", self.settings.content_filter.as_str()),
                ("orientation", self.settings.orientation.as_str()),
            ])
            .send()
            .await
            .context("unsplash search request failed")?
            .error_for_status()
            .context("unsplash search rejected")?;

        let parsed: SearchResponse = response
            .json()
            .await
            .context("unsplash search returned bad JSON")?;
        Ok(parsed.results.into_iter().map(photo_to_curated).collect())
    }

    /// Register a download against the photo's tracking endpoint.
    pub async fn track_download(&self, download_location: &str) -> Result<()> {
        self.client
            .get(download_location)
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .send()
            .await
            .context("unsplash download tracking failed")?
            .error_for_status()
            .context("unsplash download tracking rejected")?;
        Ok(())
    }
}

fn photo_to_curated(photo: Photo) -> CuratedImage {
    let nonblank = |d: &String| !d.trim().is_empty();
    let description = photo
        .description
        .filter(nonblank)
        .or_else(|| photo.alt_description.filter(nonblank))
        .unwrap_or_else(|| format!("Photo by {}", photo.user.name));
    CuratedImage {
        url: photo.urls.regular,
        description,
        author: photo.user.name,
        author_url: photo.user.links.html,
        download_location: Some(photo.links.download_location),
    }
}
