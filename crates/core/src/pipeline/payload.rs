//! Typed payloads produced by the four pipeline stages.
//!
//! Stages exchange these records through the [`super::PipelineContext`];
//! the final report serialises them as JSON objects, so downstream
//! consumers still see the mapping shapes the collaborator contracts
//! describe.

use super::stage::PipelineStage;
use radkit::macros::LLMOutput;
use schemars::JsonSchema;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// One web search result gathered during research.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    /// Snippet/body text from the search backend.
    pub body: String,
    pub source_url: String,
}

/// Structured research extracted from raw search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, LLMOutput)]
pub struct ResearchBrief {
    /// Verifiable statistics with inline source attribution.
    pub key_statistics: Vec<String>,
    /// Quotes with attribution.
    pub expert_quotes: Vec<String>,
    /// Named companies/projects and their relevance.
    pub case_studies: Vec<String>,
    /// Important term -> definition.
    pub key_definitions: HashMap<String, String>,
    /// Common counter-arguments or alternative viewpoints.
    pub counter_arguments: Vec<String>,
}

impl ResearchBrief {
    pub fn is_empty(&self) -> bool {
        self.key_statistics.is_empty()
            && self.expert_quotes.is_empty()
            && self.case_studies.is_empty()
            && self.key_definitions.is_empty()
            && self.counter_arguments.is_empty()
    }

    /// Render the brief as the synthesis text handed to the writer.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();

        push_section(&mut sections, "Key Statistics", &self.key_statistics);
        push_section(&mut sections, "Expert Quotes", &self.expert_quotes);
        push_section(&mut sections, "Case Studies", &self.case_studies);
        if !self.key_definitions.is_empty() {
            let lines: Vec<String> = self
                .key_definitions
                .iter()
                .map(|(term, definition)| format!("- {term}: {definition}"))
                .collect();
            sections.push(format!("Key Definitions:\n{}", lines.join("\n")));
        }
        push_section(&mut sections, "Counter Arguments", &self.counter_arguments);

        sections.join("\n\n")
    }
}

fn push_section(sections: &mut Vec<String>, heading: &str, items: &[String]) {
    if !items.is_empty() {
        let lines: Vec<String> = items.iter().map(|item| format!("- {item}")).collect();
        sections.push(format!("{heading}:\n{}", lines.join("\n")));
    }
}

/// Output of the research stage, consumed by the writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchPayload {
    pub topic: String,
    /// Free-text topic analysis.
    pub analysis: String,
    pub search_results: Vec<SearchHit>,
    pub brief: ResearchBrief,
    /// Rendered brief, or the analysis when no sources were found.
    pub synthesis: String,
    /// Always equals `search_results.len()`.
    pub sources_count: usize,
}

/// Output of the writing stage, consumed by image curation and publishing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlePayload {
    pub title: String,
    /// Markdown article body.
    pub content: String,
    pub outline: String,
    pub meta_description: String,
    /// Unique tags, at most 8 (target 5-8).
    pub tags: Vec<String>,
    /// Whitespace-delimited word count of `content`.
    pub word_count: usize,
    pub topic: String,
}

/// A curated illustration for the article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedImage {
    pub url: String,
    pub description: String,
    pub author: String,
    pub author_url: String,
    /// Unsplash download-tracking endpoint, when sourced from Unsplash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_location: Option<String>,
}

/// Output of the image curation stage. May be empty; never fails the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImagesPayload {
    /// Presentation order; authors are distinct best-effort.
    pub images: Vec<CuratedImage>,
}

/// Result of one platform's publish attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformResult {
    /// Filled from the map key when an entry omits it.
    #[serde(default)]
    pub platform: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Platform-specific fields (file paths, post URLs, ...).
    #[serde(flatten, default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl PlatformResult {
    pub fn succeeded(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            success: true,
            error: None,
            details: serde_json::Map::new(),
        }
    }

    pub fn failed(platform: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            success: false,
            error: Some(error.into()),
            details: serde_json::Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&serde_json::Value> {
        self.details.get(key)
    }
}

/// Per-platform publish results, keyed by platform identifier.
///
/// Entries stay in `TopicRequest::platforms` order regardless of how the
/// publish fan-out completed, and serialise as a JSON object keyed by
/// platform so callers can deterministically associate requests with
/// outcomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublicationPayload {
    results: Vec<PlatformResult>,
}

impl PublicationPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a platform result. A platform recorded twice keeps the
    /// first entry; requested platforms are already deduplicated upstream.
    pub fn record(&mut self, result: PlatformResult) {
        if self.get(&result.platform).is_none() {
            self.results.push(result);
        }
    }

    pub fn get(&self, platform: &str) -> Option<&PlatformResult> {
        self.results.iter().find(|r| r.platform == platform)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlatformResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn any_succeeded(&self) -> bool {
        self.results.iter().any(|r| r.success)
    }
}

impl Serialize for PublicationPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len()))?;
        for result in &self.results {
            map.serialize_entry(&result.platform, result)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PublicationPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PayloadVisitor;

        impl<'de> Visitor<'de> for PayloadVisitor {
            type Value = PublicationPayload;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of platform identifier to publish result")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut payload = PublicationPayload::new();
                while let Some((platform, mut result)) =
                    access.next_entry::<String, PlatformResult>()?
                {
                    // The key is authoritative when the entry omits it.
                    if result.platform.is_empty() {
                        result.platform = platform;
                    }
                    payload.record(result);
                }
                Ok(payload)
            }
        }

        deserializer.deserialize_map(PayloadVisitor)
    }
}

/// Closed set of payloads a stage may emit, one variant per stage slot.
#[derive(Debug, Clone)]
pub enum StagePayload {
    Research(ResearchPayload),
    Article(ArticlePayload),
    Images(ImagesPayload),
    Publication(PublicationPayload),
}

impl StagePayload {
    /// The pipeline stage this payload belongs to.
    pub fn stage(&self) -> PipelineStage {
        match self {
            StagePayload::Research(_) => PipelineStage::Researching,
            StagePayload::Article(_) => PipelineStage::Writing,
            StagePayload::Images(_) => PipelineStage::CuratingImages,
            StagePayload::Publication(_) => PipelineStage::Publishing,
        }
    }
}
