use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use taskscope_core::ColorScheme;
use taskscope_sync::{FeedEvent, SessionRegistry};

/// Scrollback state of the active feed panel.
///
/// `offset` counts lines back from the tail; zero means the panel follows
/// new output. Scrolling up detaches; End or scrolling back to the tail
/// reattaches.
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowTail {
    pub offset: usize,
}

impl FollowTail {
    pub fn is_following(&self) -> bool {
        self.offset == 0
    }

    pub fn detach_by(&mut self, lines: usize) {
        self.offset = self.offset.saturating_add(lines);
    }

    pub fn advance_by(&mut self, lines: usize) {
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn reattach(&mut self) {
        self.offset = 0;
    }
}

pub struct App {
    pub registry: SessionRegistry,
    events_rx: mpsc::UnboundedReceiver<FeedEvent>,
    pub follow: FollowTail,
    pub server_url: String,
    pub server_ok: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        registry: SessionRegistry,
        events_rx: mpsc::UnboundedReceiver<FeedEvent>,
        server_url: String,
        server_ok: bool,
    ) -> Self {
        Self {
            registry,
            events_rx,
            follow: FollowTail::default(),
            server_url,
            server_ok,
            should_quit: false,
        }
    }

    /// Drain pending transport deliveries into the registry. Background
    /// feeds keep merging here; only the active feed's rendering changes.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.registry.handle_event(event);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }

            // ── Tab multiplexing ──────────────────────────────────────
            KeyCode::Tab | KeyCode::Right => self.cycle_active(1),
            KeyCode::BackTab | KeyCode::Left => self.cycle_active(-1),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if let Some(id) = self.registry.feed_order().get(index).cloned() {
                    self.switch_to(&id);
                }
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.registry.active_feed_id().map(str::to_string) {
                    self.registry.unregister_feed(&id);
                    self.follow.reattach();
                }
            }

            // ── Panel prefs ───────────────────────────────────────────
            KeyCode::Char('c') => self.registry.toggle_collapsed(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let height = self.registry.ui_prefs().panel_height;
                self.registry.set_panel_height(height.saturating_add(2));
            }
            KeyCode::Char('-') => {
                let height = self.registry.ui_prefs().panel_height;
                self.registry.set_panel_height(height.saturating_sub(2));
            }
            KeyCode::Char('s') => {
                let next = match self.registry.ui_prefs().color_scheme {
                    ColorScheme::Dark => ColorScheme::Light,
                    ColorScheme::Light => ColorScheme::Dark,
                };
                self.registry.set_color_scheme(next);
            }

            // ── Scrollback ────────────────────────────────────────────
            KeyCode::Up => self.follow.detach_by(1),
            KeyCode::Down => self.follow.advance_by(1),
            KeyCode::PageUp => self.follow.detach_by(10),
            KeyCode::PageDown => self.follow.advance_by(10),
            KeyCode::End | KeyCode::Char('G') => self.follow.reattach(),

            _ => {}
        }
    }

    /// Switch the visible tab; the feed itself is untouched and background
    /// transports keep running.
    pub fn switch_to(&mut self, id: &str) {
        if self.registry.set_active(id) {
            self.follow.reattach();
        }
    }

    fn cycle_active(&mut self, step: isize) {
        let order = self.registry.feed_order();
        if order.is_empty() {
            return;
        }
        let len = order.len() as isize;
        let current = self
            .registry
            .active_feed_id()
            .and_then(|active| order.iter().position(|id| id == active))
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len) as usize;
        let id = order[next].clone();
        self.switch_to(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::FollowTail;

    #[test]
    fn follow_detach_and_reattach() {
        let mut follow = FollowTail::default();
        assert!(follow.is_following());

        follow.detach_by(5);
        assert!(!follow.is_following());

        follow.advance_by(3);
        follow.advance_by(3);
        assert!(follow.is_following());

        follow.detach_by(10);
        follow.reattach();
        assert!(follow.is_following());
    }
}
