//! Pipeline stage state machine and the stage execution contract.

use super::context::PipelineContext;
use super::outcome::StageOutcome;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where a pipeline run currently is.
///
/// Runs move strictly forward through the working states and end in
/// exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    NotStarted,
    Researching,
    Writing,
    CuratingImages,
    Publishing,
    Completed,
    Failed,
}

impl PipelineStage {
    /// The next working (or terminal success) state. Terminal states
    /// stay where they are.
    pub fn advance(self) -> Self {
        match self {
            PipelineStage::NotStarted => PipelineStage::Researching,
            PipelineStage::Researching => PipelineStage::Writing,
            PipelineStage::Writing => PipelineStage::CuratingImages,
            PipelineStage::CuratingImages => PipelineStage::Publishing,
            PipelineStage::Publishing => PipelineStage::Completed,
            terminal => terminal,
        }
    }

    pub fn fail(self) -> Self {
        PipelineStage::Failed
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Completed | PipelineStage::Failed)
    }

    pub fn is_success(self) -> bool {
        self == PipelineStage::Completed
    }

    /// Human-readable label used in logs and events.
    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::NotStarted => "not_started",
            PipelineStage::Researching => "research",
            PipelineStage::Writing => "writing",
            PipelineStage::CuratingImages => "image_curation",
            PipelineStage::Publishing => "publishing",
            PipelineStage::Completed => "completed",
            PipelineStage::Failed => "failed",
        }
    }
}

/// One unit of pipeline work.
///
/// Implementations read what they need from the [`PipelineContext`] and
/// report through [`StageOutcome`]; they never touch the context
/// directly, which keeps handoffs explicit and the orchestrator the
/// only writer.
#[async_trait]
pub trait Stage: Send + Sync {
    /// The slot this stage fills; its outcome payload must match.
    fn stage(&self) -> PipelineStage;

    async fn execute(&self, ctx: &PipelineContext) -> StageOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_through_all_working_states() {
        let mut stage = PipelineStage::NotStarted;
        let expected = [
            PipelineStage::Researching,
            PipelineStage::Writing,
            PipelineStage::CuratingImages,
            PipelineStage::Publishing,
            PipelineStage::Completed,
        ];
        for want in expected {
            stage = stage.advance();
            assert_eq!(stage, want);
        }
        assert!(stage.is_terminal());
        assert!(stage.is_success());
    }

    #[test]
    fn terminal_states_do_not_advance() {
        assert_eq!(PipelineStage::Completed.advance(), PipelineStage::Completed);
        assert_eq!(PipelineStage::Failed.advance(), PipelineStage::Failed);
    }

    #[test]
    fn any_state_can_fail() {
        assert_eq!(PipelineStage::Writing.fail(), PipelineStage::Failed);
        assert!(PipelineStage::Failed.is_terminal());
        assert!(!PipelineStage::Failed.is_success());
    }
}
