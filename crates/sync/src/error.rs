/// Failure taxonomy of the sync core.
///
/// None of these is fatal: every variant degrades exactly one feed to
/// stale/partial data while the rest of the monitor keeps running.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// Push subscribe or established push connection failed; the feed
    /// falls back to polling.
    #[error("push connect failed: {0}")]
    PushConnect(String),

    /// A poll tick failed (network error, non-2xx, undecodable body); the
    /// tick's merge is skipped and the loop reschedules.
    #[error("poll fetch failed: {0}")]
    PollFetch(String),

    /// A delivered frame did not decode; the batch is discarded and the
    /// cursor stays put.
    #[error("malformed batch discarded: {0}")]
    MalformedBatch(String),

    /// A response arrived for a feed that was unregistered while the
    /// request was in flight; the mutation is dropped.
    #[error("feed no longer registered: {0}")]
    StaleFeed(String),

    /// The persisted snapshot could not be read; startup proceeds from an
    /// empty registry.
    #[error("snapshot read failed: {0}")]
    PersistenceRead(String),
}
