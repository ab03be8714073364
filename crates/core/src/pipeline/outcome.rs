//! The result a stage hands back to the orchestrator.

use super::payload::StagePayload;

/// Outcome of one stage execution.
///
/// Either a payload (success) or an error message (failure); never both,
/// never neither. Constructed only through [`StageOutcome::success`] and
/// [`StageOutcome::failure`] so that invariant holds everywhere.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    ok: bool,
    payload: Option<StagePayload>,
    error: Option<String>,
}

impl StageOutcome {
    pub fn success(payload: StagePayload) -> Self {
        Self {
            ok: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn payload(&self) -> Option<&StagePayload> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<StagePayload> {
        self.payload
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::payload::ImagesPayload;
    use crate::pipeline::stage::PipelineStage;

    #[test]
    fn success_carries_payload_and_no_error() {
        let outcome = StageOutcome::success(StagePayload::Images(ImagesPayload::default()));
        assert!(outcome.is_ok());
        assert!(outcome.error().is_none());
        assert_eq!(
            outcome.payload().map(StagePayload::stage),
            Some(PipelineStage::CuratingImages)
        );
    }

    #[test]
    fn failure_carries_error_and_no_payload() {
        let outcome = StageOutcome::failure("search backend unreachable");
        assert!(!outcome.is_ok());
        assert!(outcome.payload().is_none());
        assert_eq!(outcome.error(), Some("search backend unreachable"));
    }
}
