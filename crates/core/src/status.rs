use serde::{Deserialize, Serialize};

/// Upstream lifecycle status of the task a feed monitors.
///
/// The backend reports `queued`/`up_next`, `in_progress`, `in_review`,
/// `done`, `error`; aliases map onto the model vocabulary here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[serde(alias = "up_next")]
    Queued,
    #[serde(alias = "in_progress")]
    Running,
    #[serde(alias = "in_review")]
    AwaitingReview,
    Done,
    Error,
}

impl TaskStatus {
    /// Done/error means no further delivery will ever arrive.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Only queued/running tasks justify keeping a transport alive.
    pub fn keeps_transport_alive(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::AwaitingReview => "awaiting_review",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::TaskStatus;

    #[test]
    fn wire_aliases_parse() {
        for (raw, expected) in [
            ("\"queued\"", TaskStatus::Queued),
            ("\"up_next\"", TaskStatus::Queued),
            ("\"in_progress\"", TaskStatus::Running),
            ("\"running\"", TaskStatus::Running),
            ("\"in_review\"", TaskStatus::AwaitingReview),
            ("\"done\"", TaskStatus::Done),
            ("\"error\"", TaskStatus::Error),
        ] {
            let parsed: TaskStatus = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed, expected, "{raw}");
        }
    }

    #[test]
    fn liveness_classification() {
        assert!(TaskStatus::Queued.keeps_transport_alive());
        assert!(TaskStatus::Running.keeps_transport_alive());
        assert!(!TaskStatus::AwaitingReview.keeps_transport_alive());
        assert!(!TaskStatus::Done.keeps_transport_alive());

        assert!(TaskStatus::Done.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
        assert!(!TaskStatus::AwaitingReview.is_terminal());
    }
}
