use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use taskscope_core::{
    merge, pruned_content, ActivityBatch, ColorScheme, Feed, MergeOutcome, TaskStatus,
    TransportMode, UiPrefs,
};
use taskscope_store::RegistrySnapshot;

use crate::error::SyncError;
use crate::event::FeedEvent;
use crate::transport::{TransportManager, TransportProvider};

/// How long registry mutations may pool before the next snapshot write.
const SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// The collection of all active feeds plus shared UI preferences.
///
/// This is the only place feeds are mutated. Transports deliver through the
/// event channel returned by [`new`](Self::new); the owning loop drains it
/// into [`handle_event`](Self::handle_event) and calls
/// [`flush_if_dirty`](Self::flush_if_dirty) each turn.
pub struct SessionRegistry {
    feeds: HashMap<String, Feed>,
    managers: HashMap<String, TransportManager>,
    /// Feed ids in pin order — drives tab layout, nothing else.
    order: Vec<String>,
    active_feed_id: Option<String>,
    ui_prefs: UiPrefs,
    provider: Arc<dyn TransportProvider>,
    events_tx: mpsc::UnboundedSender<FeedEvent>,
    snapshot_path: PathBuf,
    dirty: bool,
    last_save: Instant,
}

impl SessionRegistry {
    pub fn new(
        provider: Arc<dyn TransportProvider>,
        snapshot_path: PathBuf,
    ) -> (Self, mpsc::UnboundedReceiver<FeedEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let registry = Self {
            feeds: HashMap::new(),
            managers: HashMap::new(),
            order: Vec::new(),
            active_feed_id: None,
            ui_prefs: UiPrefs::default(),
            provider,
            events_tx,
            snapshot_path,
            dirty: false,
            last_save: Instant::now()
                .checked_sub(SAVE_DEBOUNCE)
                .unwrap_or_else(Instant::now),
        };
        (registry, events_rx)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────

    /// Rebuild feeds from the persisted snapshot and re-spawn a transport
    /// manager for each. Unreadable snapshots start an empty registry.
    pub fn restore(&mut self) {
        let snapshot = match taskscope_store::try_load_from(&self.snapshot_path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("{}", SyncError::PersistenceRead(format!("{e:#}")));
                RegistrySnapshot::default()
            }
        };

        for id in snapshot.feed_ids {
            if self.feeds.contains_key(&id) {
                continue;
            }
            let display_name = snapshot
                .display_names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| id.clone());
            let mut feed = Feed::new(id.clone(), display_name);
            feed.cursor = snapshot.cursors.get(&id).copied().unwrap_or(0);
            feed.content = snapshot.pruned_content.get(&id).cloned().unwrap_or_default();
            // Upstream status is not persisted; assume live and let the
            // first poll response correct it.
            self.insert_and_spawn(feed);
        }

        self.active_feed_id = snapshot
            .active_feed_id
            .filter(|id| self.feeds.contains_key(id))
            .or_else(|| self.order.first().cloned());
        self.ui_prefs = snapshot.ui_prefs;
    }

    /// Pin a feed. Idempotent: re-pinning an existing id only switches the
    /// active tab.
    pub fn register_feed(&mut self, id: &str, display_name: &str) {
        if self.feeds.contains_key(id) {
            self.set_active(id);
            return;
        }
        self.insert_and_spawn(Feed::new(id, display_name));
        self.active_feed_id = Some(id.to_string());
        self.mark_dirty();
    }

    /// Unpin a feed: cancel both transports (even mid-transition), drop it,
    /// and move the active tab to whatever remains.
    pub fn unregister_feed(&mut self, id: &str) {
        if let Some(mut manager) = self.managers.remove(id) {
            manager.cancel_all();
        }
        if self.feeds.remove(id).is_none() {
            return;
        }
        self.order.retain(|other| other != id);
        if self.active_feed_id.as_deref() == Some(id) {
            self.active_feed_id = self.order.first().cloned();
        }
        self.mark_dirty();
    }

    /// Switch the active tab. No transport is created or destroyed.
    pub fn set_active(&mut self, id: &str) -> bool {
        if !self.feeds.contains_key(id) {
            return false;
        }
        if self.active_feed_id.as_deref() != Some(id) {
            self.active_feed_id = Some(id.to_string());
            self.mark_dirty();
        }
        true
    }

    /// Cancel every transport and force a final snapshot write. Called on
    /// monitor teardown, before the terminal is restored.
    pub fn shutdown(&mut self) {
        for manager in self.managers.values_mut() {
            manager.cancel_all();
        }
        self.managers.clear();
        for feed in self.feeds.values_mut() {
            feed.transport = TransportMode::None;
        }
        self.save_now();
    }

    fn insert_and_spawn(&mut self, mut feed: Feed) {
        let manager = TransportManager::start(
            &feed.id,
            feed.cursor,
            Arc::clone(&self.provider),
            self.events_tx.clone(),
        );
        // Poll starts immediately as a safety net; push takes over when the
        // handshake completes.
        feed.transport = TransportMode::Poll;
        self.managers.insert(feed.id.clone(), manager);
        self.order.push(feed.id.clone());
        self.feeds.insert(feed.id.clone(), feed);
    }

    // ── Event application ─────────────────────────────────────────────

    /// Apply one transport delivery. Every arm re-validates that the feed
    /// still exists — in-flight responses may outlive an unpin, and
    /// cancellation of network I/O is best-effort.
    pub fn handle_event(&mut self, event: FeedEvent) {
        let feed_id = event.feed_id().to_string();
        if !self.feeds.contains_key(&feed_id) {
            debug!("{}", SyncError::StaleFeed(feed_id));
            return;
        }

        match event {
            FeedEvent::PushConnected { feed_id } => {
                if let Some(manager) = self.managers.get_mut(&feed_id) {
                    manager.on_push_connected();
                }
                if let Some(feed) = self.feeds.get_mut(&feed_id) {
                    feed.transport = TransportMode::Push;
                    feed.last_error = None;
                }
            }
            FeedEvent::PushConnectFailed { feed_id, error } => {
                self.push_lost(&feed_id, SyncError::PushConnect(error));
            }
            FeedEvent::PushDisconnected { feed_id, reason } => {
                let error = reason.unwrap_or_else(|| "connection closed".to_string());
                self.push_lost(&feed_id, SyncError::PushConnect(error));
            }
            FeedEvent::PushMalformed { feed_id, error } => {
                if let Some(feed) = self.feeds.get_mut(&feed_id) {
                    feed.last_error = Some(SyncError::MalformedBatch(error).to_string());
                }
            }
            FeedEvent::Activity { feed_id, batch } => {
                self.apply_batch(&feed_id, batch);
            }
            FeedEvent::StatusChanged { feed_id, status } => {
                self.apply_status(&feed_id, status);
            }
            FeedEvent::PollSucceeded {
                feed_id,
                status,
                batch,
            } => {
                if let Some(feed) = self.feeds.get_mut(&feed_id) {
                    feed.consecutive_poll_failures = 0;
                    feed.last_error = None;
                }
                self.apply_batch(&feed_id, batch);
                self.apply_status(&feed_id, status);
            }
            FeedEvent::PollFailed { feed_id, error } => {
                if let Some(feed) = self.feeds.get_mut(&feed_id) {
                    feed.consecutive_poll_failures += 1;
                    feed.last_error = Some(SyncError::PollFetch(error).to_string());
                }
            }
        }
    }

    fn push_lost(&mut self, feed_id: &str, error: SyncError) {
        let Some(feed) = self.feeds.get(feed_id) else {
            return;
        };
        let keep_alive = feed.status.keeps_transport_alive();
        if let Some(manager) = self.managers.get_mut(feed_id) {
            manager.on_push_lost(keep_alive);
        }
        if let Some(feed) = self.feeds.get_mut(feed_id) {
            feed.last_error = Some(error.to_string());
            feed.transport = if keep_alive {
                TransportMode::Poll
            } else {
                TransportMode::None
            };
        }
    }

    fn apply_batch(&mut self, feed_id: &str, batch: ActivityBatch) {
        let cursor = {
            let Some(feed) = self.feeds.get_mut(feed_id) else {
                return;
            };
            if feed.status.is_terminal() {
                // Transports are already torn down; a late batch queued
                // before the cancel is dropped rather than merged.
                debug!("dropping batch for terminal feed {feed_id}");
                return;
            }
            match merge(feed, batch) {
                MergeOutcome::Applied { appended } => {
                    if appended > 0 {
                        debug!("{feed_id}: +{appended} entries, cursor {}", feed.cursor);
                    }
                    feed.cursor
                }
                MergeOutcome::AlreadySeen => return,
            }
        };
        if let Some(manager) = self.managers.get(feed_id) {
            manager.publish_cursor(cursor);
        }
        self.mark_dirty();
    }

    fn apply_status(&mut self, feed_id: &str, status: TaskStatus) {
        match self.feeds.get_mut(feed_id) {
            Some(feed) if feed.status != status => feed.status = status,
            _ => return,
        }
        self.mark_dirty();

        if status.is_terminal() {
            if let Some(manager) = self.managers.get_mut(feed_id) {
                manager.cancel_all();
            }
            self.set_transport(feed_id, TransportMode::None);
        } else if !status.keeps_transport_alive() {
            // Awaiting review: stop polling, but an established push
            // subscription may stay open for the final status change.
            let push_active = match self.managers.get_mut(feed_id) {
                Some(manager) => {
                    manager.cancel_poll();
                    manager.push_active()
                }
                None => false,
            };
            self.set_transport(
                feed_id,
                if push_active {
                    TransportMode::Push
                } else {
                    TransportMode::None
                },
            );
        }
    }

    fn set_transport(&mut self, feed_id: &str, mode: TransportMode) {
        if let Some(feed) = self.feeds.get_mut(feed_id) {
            feed.transport = mode;
        }
    }

    // ── Persistence ───────────────────────────────────────────────────

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Debounced save: writes at most once per `SAVE_DEBOUNCE`.
    pub fn flush_if_dirty(&mut self) {
        if self.dirty && self.last_save.elapsed() >= SAVE_DEBOUNCE {
            self.save_now();
        }
    }

    pub fn save_now(&mut self) {
        let snapshot = self.snapshot();
        if let Err(e) = taskscope_store::save_to(&self.snapshot_path, &snapshot) {
            warn!("snapshot save failed: {e:#}");
        }
        self.dirty = false;
        self.last_save = Instant::now();
    }

    fn snapshot(&self) -> RegistrySnapshot {
        let mut snapshot = RegistrySnapshot {
            feed_ids: self.order.clone(),
            active_feed_id: self.active_feed_id.clone(),
            ui_prefs: self.ui_prefs.clone(),
            ..RegistrySnapshot::default()
        };
        for (id, feed) in &self.feeds {
            snapshot
                .display_names
                .insert(id.clone(), feed.display_name.clone());
            snapshot.cursors.insert(id.clone(), feed.cursor);
            snapshot
                .pruned_content
                .insert(id.clone(), pruned_content(feed));
        }
        snapshot
    }

    // ── UI preferences ────────────────────────────────────────────────

    pub fn ui_prefs(&self) -> &UiPrefs {
        &self.ui_prefs
    }

    pub fn toggle_collapsed(&mut self) {
        self.ui_prefs.collapsed = !self.ui_prefs.collapsed;
        self.mark_dirty();
    }

    pub fn set_panel_height(&mut self, height: u16) {
        self.ui_prefs.panel_height = height.clamp(4, 60);
        self.mark_dirty();
    }

    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.ui_prefs.color_scheme = scheme;
        self.mark_dirty();
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    pub fn feed(&self, id: &str) -> Option<&Feed> {
        self.feeds.get(id)
    }

    /// Feeds in pin order, for the tab bar.
    pub fn feeds_ordered(&self) -> impl Iterator<Item = &Feed> {
        self.order.iter().filter_map(|id| self.feeds.get(id))
    }

    pub fn feed_order(&self) -> &[String] {
        &self.order
    }

    pub fn active_feed_id(&self) -> Option<&str> {
        self.active_feed_id.as_deref()
    }

    pub fn active_feed(&self) -> Option<&Feed> {
        self.active_feed_id
            .as_deref()
            .and_then(|id| self.feeds.get(id))
    }

    pub fn push_active(&self, id: &str) -> bool {
        self.managers.get(id).is_some_and(|m| m.push_active())
    }

    pub fn poll_active(&self, id: &str) -> bool {
        self.managers.get(id).is_some_and(|m| m.poll_active())
    }
}
