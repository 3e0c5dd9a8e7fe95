use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use taskscope_api::PushEvent;
use taskscope_api_client::{ApiClient, Backoff, PushClient, PushFrame};

use crate::event::FeedEvent;

/// A running transport task with its single authoritative cancel point.
///
/// Cancellation signals the task's stop channel and aborts it; dropping the
/// handle without calling [`cancel`](Self::cancel) leaves the task running,
/// so owners cancel explicitly on every teardown path.
pub struct TransportHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TransportHandle {
    pub fn new(stop: watch::Sender<bool>, task: JoinHandle<()>) -> Self {
        Self { stop, task }
    }

    pub fn cancel(self) {
        let _ = self.stop.send(true);
        self.task.abort();
    }
}

/// Spawns the actual delivery tasks for a feed.
///
/// The seam exists so tests can substitute inert transports and drive the
/// registry with synthetic events.
pub trait TransportProvider: Send + Sync {
    fn start_push(
        &self,
        feed_id: &str,
        events: mpsc::UnboundedSender<FeedEvent>,
    ) -> TransportHandle;

    fn start_poll(
        &self,
        feed_id: &str,
        cursor: watch::Receiver<u64>,
        events: mpsc::UnboundedSender<FeedEvent>,
    ) -> TransportHandle;
}

/// Per-feed transport state machine.
///
/// Owns at most one of each handle; after the system settles, at most one
/// of push/poll is live (push wins). The poll loop starts immediately on
/// creation as a safety net and is cancelled the instant push connects, so
/// there is no delivery gap while the push handshake is in flight.
pub struct TransportManager {
    feed_id: String,
    provider: Arc<dyn TransportProvider>,
    events: mpsc::UnboundedSender<FeedEvent>,
    cursor_tx: watch::Sender<u64>,
    push: Option<TransportHandle>,
    push_connected: bool,
    poll: Option<TransportHandle>,
}

impl TransportManager {
    /// Start transports for a feed: poll loop now, push subscribe racing it.
    pub fn start(
        feed_id: &str,
        cursor: u64,
        provider: Arc<dyn TransportProvider>,
        events: mpsc::UnboundedSender<FeedEvent>,
    ) -> Self {
        let (cursor_tx, cursor_rx) = watch::channel(cursor);
        let push = provider.start_push(feed_id, events.clone());
        let poll = provider.start_poll(feed_id, cursor_rx, events.clone());
        Self {
            feed_id: feed_id.to_string(),
            provider,
            events,
            cursor_tx,
            push: Some(push),
            push_connected: false,
            poll: Some(poll),
        }
    }

    /// Let the poll loop see cursor progress made by the other transport.
    pub fn publish_cursor(&self, cursor: u64) {
        self.cursor_tx.send_replace(cursor);
    }

    pub fn on_push_connected(&mut self) {
        self.push_connected = true;
        self.cancel_poll();
    }

    /// Push subscribe failed or an established connection dropped.
    /// Falls back to the poll loop only while the upstream task is live.
    pub fn on_push_lost(&mut self, fall_back_to_poll: bool) {
        self.push_connected = false;
        if let Some(push) = self.push.take() {
            push.cancel();
        }
        if fall_back_to_poll {
            self.ensure_poll();
        } else {
            self.cancel_poll();
        }
    }

    pub fn ensure_poll(&mut self) {
        if self.poll.is_none() {
            debug!("starting poll loop for {}", self.feed_id);
            let poll = self.provider.start_poll(
                &self.feed_id,
                self.cursor_tx.subscribe(),
                self.events.clone(),
            );
            self.poll = Some(poll);
        }
    }

    pub fn cancel_poll(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.cancel();
        }
    }

    /// Cancel both transports unconditionally — safe against transitional
    /// states where neither or both are mid-handshake.
    pub fn cancel_all(&mut self) {
        self.push_connected = false;
        if let Some(push) = self.push.take() {
            push.cancel();
        }
        if let Some(poll) = self.poll.take() {
            poll.cancel();
        }
    }

    pub fn push_active(&self) -> bool {
        self.push_connected
    }

    pub fn poll_active(&self) -> bool {
        self.poll.is_some()
    }
}

/// Default poll cadence; grows toward [`POLL_MAX_INTERVAL`] on failures.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const POLL_MAX_INTERVAL: Duration = Duration::from_secs(30);

/// The real transports: WebSocket push plus HTTP poll.
pub struct NetTransportProvider {
    api: Arc<ApiClient>,
    push: PushClient,
    rt: tokio::runtime::Handle,
    poll_interval: Duration,
}

impl NetTransportProvider {
    pub fn new(api: Arc<ApiClient>, push: PushClient, rt: tokio::runtime::Handle) -> Self {
        Self {
            api,
            push,
            rt,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl TransportProvider for NetTransportProvider {
    fn start_push(
        &self,
        feed_id: &str,
        events: mpsc::UnboundedSender<FeedEvent>,
    ) -> TransportHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let push = self.push.clone();
        let feed_id = feed_id.to_string();

        let task = self.rt.spawn(async move {
            let connect = tokio::select! {
                _ = stop_rx.changed() => return,
                result = push.subscribe(&feed_id) => result,
            };
            let mut sub = match connect {
                Ok(sub) => sub,
                Err(e) => {
                    let _ = events.send(FeedEvent::PushConnectFailed {
                        feed_id,
                        error: e.to_string(),
                    });
                    return;
                }
            };

            let _ = events.send(FeedEvent::PushConnected {
                feed_id: feed_id.clone(),
            });

            loop {
                let frame = tokio::select! {
                    _ = stop_rx.changed() => return,
                    frame = sub.next_frame() => frame,
                };
                match frame {
                    Ok(Some(PushFrame::Event(PushEvent::Activity {
                        messages,
                        total_lines,
                    }))) => {
                        let _ = events.send(FeedEvent::Activity {
                            feed_id: feed_id.clone(),
                            batch: taskscope_core::ActivityBatch {
                                cursor: total_lines,
                                entries: messages,
                            },
                        });
                    }
                    Ok(Some(PushFrame::Event(PushEvent::Status { status }))) => {
                        let _ = events.send(FeedEvent::StatusChanged {
                            feed_id: feed_id.clone(),
                            status,
                        });
                    }
                    Ok(Some(PushFrame::Malformed(error))) => {
                        let _ = events.send(FeedEvent::PushMalformed {
                            feed_id: feed_id.clone(),
                            error,
                        });
                    }
                    Ok(None) => {
                        let _ = events.send(FeedEvent::PushDisconnected {
                            feed_id,
                            reason: None,
                        });
                        return;
                    }
                    Err(e) => {
                        let _ = events.send(FeedEvent::PushDisconnected {
                            feed_id,
                            reason: Some(e.to_string()),
                        });
                        return;
                    }
                }
            }
        });

        TransportHandle::new(stop_tx, task)
    }

    fn start_poll(
        &self,
        feed_id: &str,
        cursor: watch::Receiver<u64>,
        events: mpsc::UnboundedSender<FeedEvent>,
    ) -> TransportHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let api = Arc::clone(&self.api);
        let feed_id = feed_id.to_string();
        let mut backoff = Backoff::new(self.poll_interval, POLL_MAX_INTERVAL);

        let task = self.rt.spawn(async move {
            // First tick fires immediately: the poll loop is the safety net
            // while the push handshake is still in flight.
            loop {
                let since = *cursor.borrow();
                match api.task_activity(&feed_id, since).await {
                    Ok(resp) => {
                        backoff.record_success();
                        let (status, batch) = resp.into_parts();
                        let _ = events.send(FeedEvent::PollSucceeded {
                            feed_id: feed_id.clone(),
                            status,
                            batch,
                        });
                    }
                    Err(e) => {
                        backoff.record_failure();
                        let _ = events.send(FeedEvent::PollFailed {
                            feed_id: feed_id.clone(),
                            error: e.to_string(),
                        });
                    }
                }

                tokio::select! {
                    _ = stop_rx.changed() => return,
                    _ = tokio::time::sleep(backoff.delay()) => {}
                }
            }
        });

        TransportHandle::new(stop_tx, task)
    }
}
