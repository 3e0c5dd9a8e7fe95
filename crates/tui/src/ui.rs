use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use taskscope_core::{Feed, TransportMode};

use crate::app::App;
use crate::render;
use crate::theme::Theme;

pub fn draw(frame: &mut Frame, app: &App) {
    let collapsed = app.registry.ui_prefs().collapsed;
    let panel_height = app.registry.ui_prefs().panel_height;

    let content_height = if collapsed {
        0
    } else {
        panel_height.min(frame.area().height.saturating_sub(4))
    };

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(content_height),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_tab_bar(frame, app, chunks[1]);
    if !collapsed {
        render_feed_panel(frame, app, chunks[2]);
    }
    render_status_line(frame, app, chunks[3]);
    render_footer(frame, chunks[4]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (health, health_color) = if app.server_ok {
        ("online", Theme::ACCENT_GREEN)
    } else {
        ("unreachable", Theme::ACCENT_RED)
    };
    let line = Line::from(vec![
        Span::styled(" taskscope ", Style::new().fg(Theme::TEXT_PRIMARY).bold()),
        Span::styled(&app.server_url, Style::new().fg(Theme::TEXT_SECONDARY)),
        Span::styled(" · ", Style::new().fg(Theme::TEXT_MUTED)),
        Span::styled(health, Style::new().fg(health_color)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(" ", Style::new())];

    for (index, feed) in app.registry.feeds_ordered().enumerate() {
        let is_active = app.registry.active_feed_id() == Some(feed.id.as_str());
        let style = if is_active {
            Style::new()
                .fg(Color::Black)
                .bg(Theme::ACCENT_BLUE)
                .bold()
                .add_modifier(Modifier::UNDERLINED)
        } else {
            Style::new().fg(Theme::TAB_INACTIVE)
        };

        let name = match &feed.icon {
            Some(icon) => format!("{icon} {}", feed.display_name),
            None => feed.display_name.clone(),
        };
        let label = if index < 9 {
            format!(
                " {}:{} {} ",
                index + 1,
                name,
                Theme::status_glyph(feed.status)
            )
        } else {
            format!(" {} {} ", name, Theme::status_glyph(feed.status))
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::styled(" ", Style::new()));
    }

    if app.registry.is_empty() {
        spans.push(Span::styled(
            "no feeds pinned",
            Style::new().fg(Theme::TAB_DIM),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_feed_panel(frame: &mut Frame, app: &App, area: Rect) {
    let Some(feed) = app.registry.active_feed() else {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            "pin a task to start monitoring",
            Style::new().fg(Theme::TEXT_MUTED),
        )))
        .block(Block::new().borders(Borders::ALL).border_style(Theme::BORDER_NORMAL));
        frame.render_widget(placeholder, area);
        return;
    };

    let scheme = app.registry.ui_prefs().color_scheme;
    let mut lines = Vec::new();
    for entry in &feed.content {
        lines.extend(render::entry_lines(entry, scheme));
    }

    let inner_height = area.height.saturating_sub(2) as usize;
    let bottom = lines.len().saturating_sub(app.follow.offset);
    let start = bottom.saturating_sub(inner_height);

    let block = Block::new()
        .borders(Borders::ALL)
        .border_style(Theme::BORDER_NORMAL)
        .title(Span::styled(
            format!(" {} ", feed.display_name),
            Style::new().fg(Theme::TEXT_PRIMARY),
        ));
    let paragraph = Paragraph::new(lines).block(block).scroll((start as u16, 0));
    frame.render_widget(paragraph, area);
}

fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let Some(feed) = app.registry.active_feed() else {
        frame.render_widget(Paragraph::new(""), area);
        return;
    };

    let mut spans = vec![
        Span::styled(" ", Style::new()),
        Span::styled(
            format!(
                "{} {}",
                Theme::transport_glyph(feed.transport),
                feed.transport.as_str()
            ),
            Style::new().fg(transport_color(feed)),
        ),
        Span::styled(" · ", Style::new().fg(Theme::TEXT_MUTED)),
        Span::styled(
            feed.status.to_string(),
            Style::new().fg(Theme::status_color(feed.status)),
        ),
        Span::styled(" · ", Style::new().fg(Theme::TEXT_MUTED)),
        Span::styled(
            format!("{} entries", feed.cursor),
            Style::new().fg(Theme::TEXT_SECONDARY),
        ),
    ];

    if feed.is_degraded() {
        spans.push(Span::styled(" · ", Style::new().fg(Theme::TEXT_MUTED)));
        spans.push(Span::styled(
            "degraded: updates are stale",
            Style::new().fg(Theme::ACCENT_YELLOW).bold(),
        ));
    } else if let Some(error) = &feed.last_error {
        spans.push(Span::styled(" · ", Style::new().fg(Theme::TEXT_MUTED)));
        spans.push(Span::styled(
            error.clone(),
            Style::new().fg(Theme::TEXT_MUTED),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn transport_color(feed: &Feed) -> Color {
    match feed.transport {
        TransportMode::Push => Theme::ACCENT_GREEN,
        TransportMode::Poll => Theme::ACCENT_YELLOW,
        TransportMode::None => Theme::TEXT_MUTED,
    }
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let hints = [
        ("tab", "switch"),
        ("1-9", "jump"),
        ("x", "unpin"),
        ("c", "collapse"),
        ("+/-", "resize"),
        ("q", "quit"),
    ];
    let mut spans = vec![Span::styled(" ", Style::new())];
    for (key, desc) in hints {
        spans.push(Span::styled(key, Style::new().fg(Theme::TEXT_KEY).bold()));
        spans.push(Span::styled(
            format!(" {desc}  "),
            Style::new().fg(Theme::TEXT_KEY_DESC),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::draw;
    use crate::app::App;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::Terminal;
    use std::sync::Arc;
    use taskscope_core::{ActivityBatch, MessageEntry, MessageRole};
    use taskscope_sync::{
        FeedEvent, SessionRegistry, TransportHandle, TransportProvider,
    };
    use tokio::sync::{mpsc, watch};

    struct InertProvider;

    impl TransportProvider for InertProvider {
        fn start_push(
            &self,
            _feed_id: &str,
            _events: mpsc::UnboundedSender<FeedEvent>,
        ) -> TransportHandle {
            inert_handle()
        }

        fn start_poll(
            &self,
            _feed_id: &str,
            _cursor: watch::Receiver<u64>,
            _events: mpsc::UnboundedSender<FeedEvent>,
        ) -> TransportHandle {
            inert_handle()
        }
    }

    fn inert_handle() -> TransportHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let _ = stop_rx.changed().await;
        });
        TransportHandle::new(stop_tx, task)
    }

    fn buffer_to_string(buffer: &Buffer) -> String {
        let area = *buffer.area();
        let mut out = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn test_app(dir: &tempfile::TempDir) -> App {
        let (registry, events_rx) = SessionRegistry::new(
            Arc::new(InertProvider),
            dir.path().join("monitor.json"),
        );
        App::new(
            registry,
            events_rx,
            "http://localhost:8080".to_string(),
            true,
        )
    }

    fn draw_to_string(app: &App) -> String {
        let backend = TestBackend::new(120, 30);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|frame| draw(frame, app)).expect("draw");
        buffer_to_string(terminal.backend().buffer())
    }

    #[tokio::test]
    async fn empty_registry_renders_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);
        let text = draw_to_string(&app);
        assert!(text.contains("no feeds pinned"));
        assert!(text.contains("pin a task to start monitoring"));
    }

    #[tokio::test]
    async fn tabs_show_numbered_feeds_with_the_active_one_selected() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        app.registry.register_feed("alpha", "Alpha");
        app.registry.register_feed("beta", "Beta");

        let text = draw_to_string(&app);
        assert!(text.contains("1:Alpha"));
        assert!(text.contains("2:Beta"));
    }

    #[tokio::test]
    async fn active_feed_content_is_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        app.registry.register_feed("alpha", "Alpha");
        app.registry.handle_event(FeedEvent::Activity {
            feed_id: "alpha".into(),
            batch: ActivityBatch {
                cursor: 1,
                entries: vec![MessageEntry::text(MessageRole::Assistant, "compiling…")],
            },
        });

        let text = draw_to_string(&app);
        assert!(text.contains("compiling…"));
        assert!(text.contains("poll"));
    }

    #[tokio::test]
    async fn collapsed_panel_hides_content_but_keeps_tabs() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        app.registry.register_feed("alpha", "Alpha");
        app.registry.handle_event(FeedEvent::Activity {
            feed_id: "alpha".into(),
            batch: ActivityBatch {
                cursor: 1,
                entries: vec![MessageEntry::text(MessageRole::Assistant, "compiling…")],
            },
        });
        app.registry.toggle_collapsed();

        let text = draw_to_string(&app);
        assert!(text.contains("1:Alpha"));
        assert!(!text.contains("compiling…"));
    }

    #[tokio::test]
    async fn degraded_feed_shows_the_banner() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        app.registry.register_feed("alpha", "Alpha");
        for _ in 0..taskscope_core::DEGRADED_AFTER_FAILURES {
            app.registry.handle_event(FeedEvent::PollFailed {
                feed_id: "alpha".into(),
                error: "timeout".into(),
            });
        }

        let text = draw_to_string(&app);
        assert!(text.contains("degraded"));
    }
}
