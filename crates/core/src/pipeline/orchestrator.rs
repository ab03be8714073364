//! Sequential stage orchestration with fail-fast semantics.

use super::context::PipelineContext;
use super::events::{PipelineEvent, PipelineEventKind};
use super::request::TopicRequest;
use super::stage::{PipelineStage, Stage};
use super::{PipelineError, PipelineReport};
use crate::agents::{ImageAgent, PublisherAgent, ResearchAgent, WriterAgent};
use crate::config::Config;
use crate::retry::RetryPolicy;
use crate::tools::{MediumClient, SearchClient, SearxClient, UnsplashClient};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Drives a topic request through research, writing, image curation and
/// publishing, in that order.
///
/// A stage failure aborts the run and produces a [`RunStatus::Failed`]
/// report carrying everything the earlier stages built; it is not an
/// `Err`. Errors are reserved for invalid requests and wiring bugs.
///
/// [`RunStatus::Failed`]: super::RunStatus::Failed
pub struct Orchestrator {
    stages: Vec<Arc<dyn Stage>>,
    events: Option<mpsc::Sender<PipelineEvent>>,
    seq: u64,
}

impl Orchestrator {
    /// Assemble an orchestrator from explicit stage implementations.
    /// Callers must pass them in pipeline order.
    pub fn new(
        research: Arc<dyn Stage>,
        writing: Arc<dyn Stage>,
        images: Arc<dyn Stage>,
        publishing: Arc<dyn Stage>,
    ) -> Self {
        Self {
            stages: vec![research, writing, images, publishing],
            events: None,
            seq: 0,
        }
    }

    /// Wire up the default agents from configuration.
    pub fn from_config(config: &Config) -> Self {
        let retry = RetryPolicy::new(config.max_retries);
        let search: Arc<dyn SearchClient> =
            Arc::new(SearxClient::new(config.searxng_url.clone()));
        let unsplash = config
            .unsplash_access_key
            .as_ref()
            .map(|key| UnsplashClient::new(key.clone(), config.unsplash.clone()));
        let medium = config.medium_access_token.clone().map(MediumClient::new);

        Self::new(
            Arc::new(ResearchAgent::new(
                config.model.clone(),
                search,
                config.max_research_sources,
                retry.clone(),
            )),
            Arc::new(WriterAgent::new(config.model.clone(), retry.clone())),
            Arc::new(ImageAgent::new(config.model.clone(), unsplash, retry)),
            Arc::new(PublisherAgent::new(medium)),
        )
    }

    /// Subscribe a channel to progress events. Dropping the receiver is
    /// harmless; events are best effort.
    pub fn with_event_channel(mut self, tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub async fn run(&mut self, request: TopicRequest) -> Result<PipelineReport, PipelineError> {
        request.validate()?;
        let request = request.normalized();
        tracing::info!(topic = %request.topic, platforms = ?request.platforms, "pipeline started");

        self.seq = 0;
        self.emit(
            PipelineEventKind::PipelineStarted,
            None,
            Some(serde_json::json!({ "topic": request.topic })),
        )
        .await;

        let mut ctx = PipelineContext::new(request);
        let mut state = PipelineStage::NotStarted;

        let stages = self.stages.clone();
        for stage in stages {
            state = state.advance();
            if stage.stage() != state {
                return Err(PipelineError::StageContract(format!(
                    "stage '{}' registered in the '{}' slot",
                    stage.stage().label(),
                    state.label()
                )));
            }

            let label = state.label();
            tracing::info!(stage = label, "stage started");
            self.emit(PipelineEventKind::StageStarted, Some(label), None)
                .await;

            let outcome = stage.execute(&ctx).await;
            if !outcome.is_ok() {
                let detail = outcome
                    .error()
                    .unwrap_or("stage failed without detail")
                    .to_string();
                let message = format!("{label} stage failed: {detail}");
                tracing::error!(stage = label, error = %detail, "stage failed, aborting run");
                self.emit(
                    PipelineEventKind::StageFailed,
                    Some(label),
                    Some(serde_json::json!({ "error": detail })),
                )
                .await;
                self.emit(PipelineEventKind::PipelineFailed, None, None).await;
                return Ok(ctx.into_failed_report(message));
            }

            let payload = outcome.into_payload().ok_or_else(|| {
                PipelineError::StageContract(format!(
                    "stage '{label}' reported success without a payload"
                ))
            })?;
            if payload.stage() != state {
                return Err(PipelineError::StageContract(format!(
                    "stage '{label}' produced a payload for '{}'",
                    payload.stage().label()
                )));
            }
            ctx.absorb(payload)?;

            tracing::info!(stage = label, "stage completed");
            self.emit(PipelineEventKind::StageCompleted, Some(label), None)
                .await;
        }

        tracing::info!(topic = %ctx.request.topic, "pipeline completed");
        self.emit(PipelineEventKind::PipelineCompleted, None, None)
            .await;
        Ok(ctx.into_completed_report())
    }

    async fn emit(
        &mut self,
        kind: PipelineEventKind,
        stage: Option<&str>,
        data: Option<serde_json::Value>,
    ) {
        let Some(tx) = &self.events else { return };
        let mut event = PipelineEvent::new(self.seq, kind);
        self.seq += 1;
        if let Some(stage) = stage {
            event = event.with_stage(stage);
        }
        if let Some(data) = data {
            event = event.with_data(data);
        }
        let _ = tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::outcome::StageOutcome;
    use crate::pipeline::payload::{
        ArticlePayload, CuratedImage, ImagesPayload, PlatformResult, PublicationPayload,
        ResearchPayload, SearchHit, StagePayload,
    };
    use crate::pipeline::RunStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockStage {
        slot: PipelineStage,
        outcome: StageOutcome,
        calls: Arc<AtomicUsize>,
    }

    impl MockStage {
        fn new(slot: PipelineStage, outcome: StageOutcome) -> (Arc<Self>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let stage = Arc::new(Self {
                slot,
                outcome,
                calls: Arc::clone(&calls),
            });
            (stage, calls)
        }
    }

    #[async_trait]
    impl Stage for MockStage {
        fn stage(&self) -> PipelineStage {
            self.slot
        }

        async fn execute(&self, _ctx: &PipelineContext) -> StageOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn research_payload(topic: &str) -> ResearchPayload {
        let search_results: Vec<SearchHit> = (1..=3)
            .map(|i| SearchHit {
                title: format!("Source {i}"),
                body: format!("Snippet {i}."),
                source_url: format!("https://example.com/{i}"),
            })
            .collect();
        ResearchPayload {
            topic: topic.to_string(),
            analysis: "notable angles on the topic".to_string(),
            sources_count: search_results.len(),
            search_results,
            brief: Default::default(),
            synthesis: "notable angles on the topic".to_string(),
        }
    }

    fn article_payload(topic: &str) -> ArticlePayload {
        ArticlePayload {
            title: format!("A Field Guide to {topic}"),
            content: "# A Field Guide\n\nBody text.".to_string(),
            outline: "1. Intro\n2. Body".to_string(),
            meta_description: "A field guide.".to_string(),
            tags: vec!["guide".to_string()],
            word_count: 1300,
            topic: topic.to_string(),
        }
    }

    fn images_payload() -> ImagesPayload {
        ImagesPayload {
            images: vec![CuratedImage {
                url: "https://images.example/1".to_string(),
                description: "a telescope at dusk".to_string(),
                author: "Ada Smith".to_string(),
                author_url: "https://unsplash.com/@ada".to_string(),
                download_location: None,
            }],
        }
    }

    fn publication_payload() -> PublicationPayload {
        let mut payload = PublicationPayload::new();
        payload.record(
            PlatformResult::succeeded("file").with_detail("markdown_file", "output/guide.md"),
        );
        payload
    }

    fn full_orchestrator(topic: &str) -> (Orchestrator, [Arc<AtomicUsize>; 4]) {
        let (research, c1) = MockStage::new(
            PipelineStage::Researching,
            StageOutcome::success(StagePayload::Research(research_payload(topic))),
        );
        let (writing, c2) = MockStage::new(
            PipelineStage::Writing,
            StageOutcome::success(StagePayload::Article(article_payload(topic))),
        );
        let (images, c3) = MockStage::new(
            PipelineStage::CuratingImages,
            StageOutcome::success(StagePayload::Images(images_payload())),
        );
        let (publishing, c4) = MockStage::new(
            PipelineStage::Publishing,
            StageOutcome::success(StagePayload::Publication(publication_payload())),
        );
        (
            Orchestrator::new(research, writing, images, publishing),
            [c1, c2, c3, c4],
        )
    }

    #[tokio::test]
    async fn happy_path_runs_every_stage_once() {
        let topic = "Space Exploration";
        let (mut orchestrator, calls) = full_orchestrator(topic);

        let request = TopicRequest::new(topic)
            .with_style(crate::pipeline::WritingStyle::Casual)
            .with_audience("general audience");
        let report = orchestrator.run(request).await.unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.topic, topic);
        assert!(report.error.is_none());
        assert_eq!(report.research.as_ref().unwrap().sources_count, 3);
        assert_eq!(report.article.as_ref().unwrap().word_count, 1300);
        assert_eq!(report.images.as_ref().unwrap().images.len(), 1);
        let publication = report.publication.unwrap();
        assert!(publication.get("file").unwrap().success);
        for count in &calls {
            assert_eq!(count.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn research_failure_short_circuits_downstream_stages() {
        let (research, c1) = MockStage::new(
            PipelineStage::Researching,
            StageOutcome::failure("search backend unreachable"),
        );
        let (writing, c2) = MockStage::new(
            PipelineStage::Writing,
            StageOutcome::success(StagePayload::Article(article_payload("x"))),
        );
        let (images, c3) = MockStage::new(
            PipelineStage::CuratingImages,
            StageOutcome::success(StagePayload::Images(ImagesPayload::default())),
        );
        let (publishing, c4) = MockStage::new(
            PipelineStage::Publishing,
            StageOutcome::success(StagePayload::Publication(publication_payload())),
        );
        let mut orchestrator = Orchestrator::new(research, writing, images, publishing);

        let report = orchestrator
            .run(TopicRequest::new("quantum error correction"))
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::Failed);
        let error = report.error.unwrap();
        assert!(error.contains("research"));
        assert!(error.contains("search backend unreachable"));
        assert!(report.research.is_none());
        assert!(report.article.is_none());
        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 0);
        assert_eq!(c3.load(Ordering::SeqCst), 0);
        assert_eq!(c4.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn writing_failure_keeps_the_research_payload() {
        let (research, _) = MockStage::new(
            PipelineStage::Researching,
            StageOutcome::success(StagePayload::Research(research_payload("solar sails"))),
        );
        let (writing, _) = MockStage::new(
            PipelineStage::Writing,
            StageOutcome::failure("empty synthesis"),
        );
        let (images, c3) = MockStage::new(
            PipelineStage::CuratingImages,
            StageOutcome::success(StagePayload::Images(ImagesPayload::default())),
        );
        let (publishing, c4) = MockStage::new(
            PipelineStage::Publishing,
            StageOutcome::success(StagePayload::Publication(publication_payload())),
        );
        let mut orchestrator = Orchestrator::new(research, writing, images, publishing);

        let report = orchestrator
            .run(TopicRequest::new("solar sails"))
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::Failed);
        assert!(report.research.is_some());
        assert!(report.article.is_none());
        assert!(report.images.is_none());
        assert_eq!(c3.load(Ordering::SeqCst), 0);
        assert_eq!(c4.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn platform_failures_do_not_fail_the_run() {
        let topic = "marine robotics";
        let mut publication = PublicationPayload::new();
        publication
            .record(PlatformResult::succeeded("file").with_detail("markdown_file", "out/m.md"));
        publication.record(PlatformResult::failed("medium", "token expired"));

        let (research, _) = MockStage::new(
            PipelineStage::Researching,
            StageOutcome::success(StagePayload::Research(research_payload(topic))),
        );
        let (writing, _) = MockStage::new(
            PipelineStage::Writing,
            StageOutcome::success(StagePayload::Article(article_payload(topic))),
        );
        let (images, _) = MockStage::new(
            PipelineStage::CuratingImages,
            StageOutcome::success(StagePayload::Images(ImagesPayload::default())),
        );
        let (publishing, _) = MockStage::new(
            PipelineStage::Publishing,
            StageOutcome::success(StagePayload::Publication(publication)),
        );
        let mut orchestrator = Orchestrator::new(research, writing, images, publishing);

        let report = orchestrator
            .run(TopicRequest::new(topic).with_platforms(vec![
                "file".to_string(),
                "medium".to_string(),
            ]))
            .await
            .unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert!(report.error.is_none());
        let publication = report.publication.unwrap();
        assert!(publication.get("file").unwrap().success);
        let medium = publication.get("medium").unwrap();
        assert!(!medium.success);
        assert!(medium.error.is_some());
    }

    #[tokio::test]
    async fn empty_topic_is_rejected_before_any_stage_runs() {
        let (mut orchestrator, calls) = full_orchestrator("unused");

        let err = orchestrator
            .run(TopicRequest::new("   "))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::InvalidRequest(_)));
        for count in &calls {
            assert_eq!(count.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn mismatched_payload_is_a_contract_violation() {
        let (research, _) = MockStage::new(
            PipelineStage::Researching,
            StageOutcome::success(StagePayload::Images(ImagesPayload::default())),
        );
        let (writing, _) = MockStage::new(
            PipelineStage::Writing,
            StageOutcome::success(StagePayload::Article(article_payload("x"))),
        );
        let (images, _) = MockStage::new(
            PipelineStage::CuratingImages,
            StageOutcome::success(StagePayload::Images(ImagesPayload::default())),
        );
        let (publishing, _) = MockStage::new(
            PipelineStage::Publishing,
            StageOutcome::success(StagePayload::Publication(publication_payload())),
        );
        let mut orchestrator = Orchestrator::new(research, writing, images, publishing);

        let err = orchestrator
            .run(TopicRequest::new("anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::StageContract(_)));
    }

    #[tokio::test]
    async fn events_arrive_in_sequence_order() {
        let (mut orchestrator, _) = full_orchestrator("event ordering");
        let (tx, mut rx) = mpsc::channel(32);
        orchestrator = orchestrator.with_event_channel(tx);

        orchestrator
            .run(TopicRequest::new("event ordering"))
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        // started + 4 * (started, completed) + completed
        assert_eq!(events.len(), 10);
        assert_eq!(events[0].kind, PipelineEventKind::PipelineStarted);
        assert_eq!(events[9].kind, PipelineEventKind::PipelineCompleted);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.seq, i as u64);
        }
        assert_eq!(events[1].stage.as_deref(), Some("research"));
        assert_eq!(events[8].stage.as_deref(), Some("publishing"));
    }
}
