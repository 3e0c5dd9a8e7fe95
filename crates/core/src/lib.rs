pub mod entry;
pub mod feed;
pub mod merge;
pub mod status;

pub use entry::{ContentBlock, MessageEntry, MessageRole};
pub use feed::{
    ColorScheme, Feed, TransportMode, UiPrefs, DEGRADED_AFTER_FAILURES, LIVE_CONTENT_CAP,
    PERSISTED_CONTENT_CAP,
};
pub use merge::{merge, pruned_content, ActivityBatch, MergeOutcome};
pub use status::TaskStatus;
