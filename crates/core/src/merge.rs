use serde::{Deserialize, Serialize};

use crate::entry::MessageEntry;
use crate::feed::{Feed, LIVE_CONTENT_CAP, PERSISTED_CONTENT_CAP};

/// One incremental delivery for a feed, from either transport.
///
/// `cursor` is the total number of entries the server has produced so far,
/// not the batch size; a batch whose cursor is behind the feed's has already
/// been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityBatch {
    pub cursor: u64,
    #[serde(default)]
    pub entries: Vec<MessageEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// New entries were appended (possibly zero, if the server only
    /// reported cursor progress).
    Applied { appended: usize },
    /// Batch cursor was at or behind the feed cursor; nothing changed.
    AlreadySeen,
}

/// Apply a delivered batch to a feed.
///
/// Idempotent on the cursor: push and poll may race for the same feed and
/// either ordering converges to the same state. Evicts oldest entries past
/// `LIVE_CONTENT_CAP` after appending.
pub fn merge(feed: &mut Feed, batch: ActivityBatch) -> MergeOutcome {
    if batch.cursor <= feed.cursor {
        return MergeOutcome::AlreadySeen;
    }

    let appended = batch.entries.len();
    feed.cursor = batch.cursor;
    feed.content.extend(batch.entries);

    if feed.content.len() > LIVE_CONTENT_CAP {
        let excess = feed.content.len() - LIVE_CONTENT_CAP;
        feed.content.drain(..excess);
    }

    MergeOutcome::Applied { appended }
}

/// The tail of a feed's content, capped for the persisted snapshot.
pub fn pruned_content(feed: &Feed) -> Vec<MessageEntry> {
    let skip = feed.content.len().saturating_sub(PERSISTED_CONTENT_CAP);
    feed.content[skip..].to_vec()
}
