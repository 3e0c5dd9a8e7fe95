use taskscope_core::{ActivityBatch, TaskStatus};

/// Everything a transport can deliver to the registry.
///
/// Transports never touch feeds directly; they send one of these over the
/// registry's event channel and the main loop applies it. Every variant
/// carries the feed id so the registry can re-validate existence at apply
/// time — the request may have outlived its feed.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    PushConnected {
        feed_id: String,
    },
    PushConnectFailed {
        feed_id: String,
        error: String,
    },
    PushDisconnected {
        feed_id: String,
        reason: Option<String>,
    },
    /// A frame on the push topic that did not decode.
    PushMalformed {
        feed_id: String,
        error: String,
    },
    /// An activity batch, from either transport.
    Activity {
        feed_id: String,
        batch: ActivityBatch,
    },
    StatusChanged {
        feed_id: String,
        status: TaskStatus,
    },
    /// A successful poll tick: batch plus the status the server reported.
    PollSucceeded {
        feed_id: String,
        status: TaskStatus,
        batch: ActivityBatch,
    },
    PollFailed {
        feed_id: String,
        error: String,
    },
}

impl FeedEvent {
    pub fn feed_id(&self) -> &str {
        match self {
            Self::PushConnected { feed_id }
            | Self::PushConnectFailed { feed_id, .. }
            | Self::PushDisconnected { feed_id, .. }
            | Self::PushMalformed { feed_id, .. }
            | Self::Activity { feed_id, .. }
            | Self::StatusChanged { feed_id, .. }
            | Self::PollSucceeded { feed_id, .. }
            | Self::PollFailed { feed_id, .. } => feed_id,
        }
    }
}
