//! Accumulated pipeline state and the final run report.

use super::payload::{
    ArticlePayload, ImagesPayload, PublicationPayload, ResearchPayload, StagePayload,
};
use super::request::TopicRequest;
use super::PipelineError;
use serde::{Deserialize, Serialize};

/// State threaded through a single pipeline run.
///
/// Only the orchestrator writes to the context; stages read the slots
/// filled by their predecessors.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub request: TopicRequest,
    pub research: Option<ResearchPayload>,
    pub article: Option<ArticlePayload>,
    pub images: Option<ImagesPayload>,
    pub publication: Option<PublicationPayload>,
}

impl PipelineContext {
    pub fn new(request: TopicRequest) -> Self {
        Self {
            request,
            research: None,
            article: None,
            images: None,
            publication: None,
        }
    }

    /// Store a stage payload in its slot.
    ///
    /// Refuses to overwrite an already-filled slot; the orchestrator
    /// runs each stage once, so a second write means a wiring bug.
    pub fn absorb(&mut self, payload: StagePayload) -> Result<(), PipelineError> {
        let label = payload.stage().label();
        let occupied = match payload {
            StagePayload::Research(p) => self.research.replace(p).is_some(),
            StagePayload::Article(p) => self.article.replace(p).is_some(),
            StagePayload::Images(p) => self.images.replace(p).is_some(),
            StagePayload::Publication(p) => self.publication.replace(p).is_some(),
        };
        if occupied {
            return Err(PipelineError::StageContract(format!(
                "stage '{label}' produced a payload for an already-filled slot"
            )));
        }
        Ok(())
    }

    /// Final report for a run that reached the end of the stage list.
    pub fn into_completed_report(self) -> PipelineReport {
        PipelineReport {
            topic: self.request.topic,
            status: RunStatus::Completed,
            research: self.research,
            article: self.article,
            images: self.images,
            publication: self.publication,
            error: None,
        }
    }

    /// Final report for a run aborted by a stage failure. Slots the
    /// failed and later stages never filled stay absent.
    pub fn into_failed_report(self, error: impl Into<String>) -> PipelineReport {
        PipelineReport {
            topic: self.request.topic,
            status: RunStatus::Failed,
            research: self.research,
            article: self.article,
            images: self.images,
            publication: self.publication,
            error: Some(error.into()),
        }
    }
}

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Everything a caller learns about a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub topic: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research: Option<ResearchPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<ArticlePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<ImagesPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication: Option<PublicationPayload>,
    /// Set exactly when `status` is [`RunStatus::Failed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PipelineContext {
        PipelineContext::new(TopicRequest::new("rust async runtimes"))
    }

    #[test]
    fn absorb_fills_the_matching_slot() {
        let mut ctx = ctx();
        ctx.absorb(StagePayload::Images(ImagesPayload::default()))
            .unwrap();
        assert!(ctx.images.is_some());
        assert!(ctx.research.is_none());
    }

    #[test]
    fn absorb_rejects_a_second_payload_for_the_same_slot() {
        let mut ctx = ctx();
        ctx.absorb(StagePayload::Images(ImagesPayload::default()))
            .unwrap();
        let err = ctx
            .absorb(StagePayload::Images(ImagesPayload::default()))
            .unwrap_err();
        assert!(matches!(err, PipelineError::StageContract(_)));
    }

    #[test]
    fn failed_report_keeps_earlier_payloads_and_error() {
        let mut ctx = ctx();
        ctx.absorb(StagePayload::Research(ResearchPayload {
            topic: "rust async runtimes".to_string(),
            analysis: "analysis".to_string(),
            search_results: Vec::new(),
            brief: Default::default(),
            synthesis: "analysis".to_string(),
            sources_count: 0,
        }))
        .unwrap();

        let report = ctx.into_failed_report("writing produced an empty draft");
        assert_eq!(report.status, RunStatus::Failed);
        assert!(report.research.is_some());
        assert!(report.article.is_none());
        assert_eq!(
            report.error.as_deref(),
            Some("writing produced an empty draft")
        );

        // Absent slots are omitted from the JSON form entirely.
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("article").is_none());
        assert_eq!(value["status"], "failed");
    }
}
