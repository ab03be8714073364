//! The content pipeline: request model, stage contract, orchestrator,
//! and the payloads/report the stages exchange.

pub mod context;
pub mod events;
pub mod orchestrator;
pub mod outcome;
pub mod payload;
pub mod request;
pub mod stage;

pub use context::{PipelineContext, PipelineReport, RunStatus};
pub use events::{PipelineEvent, PipelineEventKind};
pub use orchestrator::Orchestrator;
pub use outcome::StageOutcome;
pub use payload::{
    ArticlePayload, CuratedImage, ImagesPayload, PlatformResult, PublicationPayload,
    ResearchBrief, ResearchPayload, SearchHit, StagePayload,
};
pub use request::{TopicRequest, WritingStyle};
pub use stage::{PipelineStage, Stage};

/// Errors the orchestrator itself can return.
///
/// Stage failures are not errors at this level; they surface as a
/// [`RunStatus::Failed`] report. An `Err` here means the run never
/// started or the stage wiring is broken.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The topic request failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A stage violated the execution contract.
    #[error("stage contract violation: {0}")]
    StageContract(String),
}
