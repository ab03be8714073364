//! Progress events emitted during a pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineEventKind {
    PipelineStarted,
    StageStarted,
    StageCompleted,
    StageFailed,
    PipelineCompleted,
    PipelineFailed,
}

/// One progress notification.
///
/// `seq` is assigned by the orchestrator and increases monotonically
/// within a run, so subscribers can order events without trusting
/// timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: PipelineEventKind,
    /// Stage label for stage-scoped events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl PipelineEvent {
    pub fn new(seq: u64, kind: PipelineEventKind) -> Self {
        Self {
            seq,
            timestamp: Utc::now(),
            kind,
            stage: None,
            data: None,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_json_omits_empty_fields() {
        let event = PipelineEvent::new(0, PipelineEventKind::PipelineStarted);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "pipeline_started");
        assert!(value.get("stage").is_none());
        assert!(value.get("data").is_none());
    }

    #[test]
    fn stage_events_carry_their_label() {
        let event = PipelineEvent::new(3, PipelineEventKind::StageFailed)
            .with_stage("research")
            .with_data(serde_json::json!({"error": "backend unreachable"}));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["stage"], "research");
        assert_eq!(value["data"]["error"], "backend unreachable");
    }
}
