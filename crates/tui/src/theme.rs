use ratatui::prelude::*;

use taskscope_core::{ColorScheme, MessageRole, TaskStatus, TransportMode};

pub struct Theme;

impl Theme {
    // ── Border ───────────────────────────────────────────────────────
    pub const BORDER_NORMAL: Color = Color::Rgb(60, 65, 80);

    // ── Text hierarchy ───────────────────────────────────────────────
    pub const TEXT_PRIMARY: Color = Color::White;
    pub const TEXT_SECONDARY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_MUTED: Color = Color::Rgb(80, 85, 100);
    pub const TEXT_CONTENT: Color = Color::Rgb(170, 175, 190);

    // ── Key style (for footer hints) ─────────────────────────────────
    pub const TEXT_KEY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_KEY_DESC: Color = Color::DarkGray;

    // ── Accent ───────────────────────────────────────────────────────
    pub const ACCENT_BLUE: Color = Color::Rgb(100, 180, 240);
    pub const ACCENT_GREEN: Color = Color::Rgb(80, 200, 120);
    pub const ACCENT_RED: Color = Color::Rgb(220, 80, 80);
    pub const ACCENT_YELLOW: Color = Color::Rgb(220, 180, 60);
    pub const ACCENT_PURPLE: Color = Color::Rgb(180, 140, 220);

    // ── Tabs ─────────────────────────────────────────────────────────
    pub const TAB_INACTIVE: Color = Color::Rgb(140, 145, 160);
    pub const TAB_DIM: Color = Color::Rgb(80, 85, 100);

    // ── Detail view colors ───────────────────────────────────────────
    pub const GUTTER: Color = Color::Rgb(55, 60, 75);

    pub fn role_color(role: MessageRole, scheme: ColorScheme) -> Color {
        match (role, scheme) {
            (MessageRole::User, ColorScheme::Dark) => Color::Rgb(80, 180, 100),
            (MessageRole::User, ColorScheme::Light) => Color::Rgb(20, 120, 40),
            (MessageRole::Assistant, ColorScheme::Dark) => Color::Rgb(100, 160, 240),
            (MessageRole::Assistant, ColorScheme::Light) => Color::Rgb(30, 80, 190),
            (MessageRole::ToolResult, _) => Self::ACCENT_YELLOW,
            (MessageRole::System, _) => Color::Gray,
        }
    }

    pub fn status_color(status: TaskStatus) -> Color {
        match status {
            TaskStatus::Queued => Self::TEXT_SECONDARY,
            TaskStatus::Running => Self::ACCENT_GREEN,
            TaskStatus::AwaitingReview => Self::ACCENT_YELLOW,
            TaskStatus::Done => Self::ACCENT_BLUE,
            TaskStatus::Error => Self::ACCENT_RED,
        }
    }

    pub fn status_glyph(status: TaskStatus) -> &'static str {
        match status {
            TaskStatus::Queued => "·",
            TaskStatus::Running => "▶",
            TaskStatus::AwaitingReview => "◆",
            TaskStatus::Done => "✓",
            TaskStatus::Error => "✗",
        }
    }

    /// Glyph for the per-feed connection indicator.
    pub fn transport_glyph(mode: TransportMode) -> &'static str {
        match mode {
            TransportMode::Push => "●",
            TransportMode::Poll => "◌",
            TransportMode::None => "○",
        }
    }
}
