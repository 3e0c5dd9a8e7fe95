//! Shared wire types for the taskscope activity API.
//!
//! This crate is the single source of truth for the shapes exchanged with
//! the backend: the incremental activity poll endpoint and the per-task
//! push topic. Both transports deliver the same payloads, so the sync layer
//! converges regardless of which one a batch arrived on.

use serde::{Deserialize, Serialize};

// Re-export core model types for convenience
pub use taskscope_core::{ActivityBatch, ContentBlock, MessageEntry, MessageRole, TaskStatus};

/// Response of `GET /api/tasks/{id}/activity?since={cursor}`.
///
/// `total_lines` is the server-side entry count — the batch cursor. A
/// request repeated with an unchanged cursor returns no new messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub task_status: TaskStatus,
    #[serde(default)]
    pub messages: Vec<MessageEntry>,
    pub total_lines: u64,
    #[serde(default)]
    pub has_session: bool,
}

impl ActivityResponse {
    /// Split into the status event and the mergeable batch.
    pub fn into_parts(self) -> (TaskStatus, ActivityBatch) {
        (
            self.task_status,
            ActivityBatch {
                cursor: self.total_lines,
                entries: self.messages,
            },
        )
    }
}

/// One event on a task's push topic (JSON text frames).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    Activity {
        #[serde(default)]
        messages: Vec<MessageEntry>,
        total_lines: u64,
    },
    Status {
        status: TaskStatus,
    },
}

impl PushEvent {
    pub fn into_batch(self) -> Option<ActivityBatch> {
        match self {
            Self::Activity {
                messages,
                total_lines,
            } => Some(ActivityBatch {
                cursor: total_lines,
                entries: messages,
            }),
            Self::Status { .. } => None,
        }
    }
}

/// Response of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_response_parses_wire_statuses() {
        let json = r#"{
            "task_status": "in_progress",
            "messages": [{"role": "assistant", "blocks": [{"type": "text", "text": "hi"}]}],
            "total_lines": 12,
            "has_session": true
        }"#;
        let resp: ActivityResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.task_status, TaskStatus::Running);

        let (status, batch) = resp.into_parts();
        assert_eq!(status, TaskStatus::Running);
        assert_eq!(batch.cursor, 12);
        assert_eq!(batch.entries.len(), 1);
    }

    #[test]
    fn push_event_activity_parses() {
        let json = r#"{"type":"activity","messages":[],"total_lines":3}"#;
        let event: PushEvent = serde_json::from_str(json).unwrap();
        let batch = event.into_batch().unwrap();
        assert_eq!(batch.cursor, 3);
        assert!(batch.entries.is_empty());
    }

    #[test]
    fn push_event_status_parses() {
        let json = r#"{"type":"status","status":"done"}"#;
        let event: PushEvent = serde_json::from_str(json).unwrap();
        match event {
            PushEvent::Status { status } => assert_eq!(status, TaskStatus::Done),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(serde_json::from_str::<PushEvent>(json)
            .unwrap()
            .into_batch()
            .is_none());
    }

    #[test]
    fn unknown_block_kinds_survive_the_wire() {
        let json = r#"{
            "task_status": "queued",
            "messages": [{"role": "system", "blocks": [{"type": "confetti"}]}],
            "total_lines": 1
        }"#;
        let resp: ActivityResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.messages[0].blocks, vec![ContentBlock::Unknown]);
    }
}
