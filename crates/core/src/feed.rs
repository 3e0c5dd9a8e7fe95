use serde::{Deserialize, Serialize};

use crate::entry::MessageEntry;
use crate::status::TaskStatus;

/// Maximum entries kept in memory per feed. Oldest are evicted first.
pub const LIVE_CONTENT_CAP: usize = 400;

/// Maximum entries written to the persisted snapshot per feed.
/// Intentionally smaller than the live cap (memory vs. storage trade-off).
pub const PERSISTED_CONTENT_CAP: usize = 50;

/// Poll failures in a row before a feed is surfaced as degraded.
pub const DEGRADED_AFTER_FAILURES: u32 = 3;

/// One monitored activity stream.
#[derive(Debug, Clone)]
pub struct Feed {
    pub id: String,
    pub display_name: String,
    pub icon: Option<String>,
    /// Count of entries delivered so far. Never decreases.
    pub cursor: u64,
    pub content: Vec<MessageEntry>,
    pub status: TaskStatus,
    pub transport: TransportMode,
    pub consecutive_poll_failures: u32,
    pub last_error: Option<String>,
}

impl Feed {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            icon: None,
            cursor: 0,
            content: Vec::new(),
            status: TaskStatus::Queued,
            transport: TransportMode::None,
            consecutive_poll_failures: 0,
            last_error: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.consecutive_poll_failures >= DEGRADED_AFTER_FAILURES
    }
}

/// Which delivery mechanism currently feeds this stream.
///
/// Live handles are owned by the sync layer; this is only the observable
/// mode used for the connection indicator. Persisted snapshots always
/// restore to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    #[default]
    None,
    Push,
    Poll,
}

impl TransportMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Push => "push",
            Self::Poll => "poll",
        }
    }
}

/// Shared monitor-panel preferences, persisted alongside feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiPrefs {
    pub collapsed: bool,
    pub panel_height: u16,
    pub color_scheme: ColorScheme,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            collapsed: false,
            panel_height: 18,
            color_scheme: ColorScheme::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    #[default]
    Dark,
    Light,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_feed_starts_empty_and_unconnected() {
        let feed = Feed::new("task-1", "Fix login bug");
        assert_eq!(feed.cursor, 0);
        assert!(feed.content.is_empty());
        assert_eq!(feed.transport, TransportMode::None);
        assert_eq!(feed.status, TaskStatus::Queued);
        assert!(!feed.is_degraded());
    }

    #[test]
    fn degraded_threshold() {
        let mut feed = Feed::new("task-1", "t");
        feed.consecutive_poll_failures = DEGRADED_AFTER_FAILURES - 1;
        assert!(!feed.is_degraded());
        feed.consecutive_poll_failures = DEGRADED_AFTER_FAILURES;
        assert!(feed.is_degraded());
    }
}
