//! Pure presentation mapping from message entries to display lines.
//!
//! No network or mutable state access; the multiplexer calls this for the
//! active feed only.

use ratatui::prelude::*;

use taskscope_core::{ColorScheme, ContentBlock, MessageEntry, MessageRole};

use crate::theme::Theme;

// Per-block-kind truncation. Tool output is cut harder than primary text.
const TEXT_WIDTH: usize = 120;
const TEXT_MAX_LINES: usize = 8;
const THINKING_WIDTH: usize = 100;
const THINKING_MAX_LINES: usize = 2;
const TOOL_RESULT_WIDTH: usize = 80;
const TOOL_RESULT_MAX_LINES: usize = 3;

/// Render one entry to display lines.
///
/// Unknown block kinds contribute nothing; an entry whose blocks are all
/// unknown renders as no lines at all.
pub fn entry_lines(entry: &MessageEntry, scheme: ColorScheme) -> Vec<Line<'static>> {
    let mut body = Vec::new();
    for block in &entry.blocks {
        block_lines(&mut body, block);
    }
    if body.is_empty() {
        return body;
    }

    let (label, color) = role_display(entry.role, scheme);
    let mut lines = vec![Line::from(Span::styled(
        label,
        Style::new().fg(color).bold(),
    ))];
    lines.extend(body);
    lines
}

pub fn role_display(role: MessageRole, scheme: ColorScheme) -> (&'static str, Color) {
    let label = match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "agent",
        MessageRole::ToolResult => "result",
        MessageRole::System => "system",
    };
    (label, Theme::role_color(role, scheme))
}

fn block_lines(lines: &mut Vec<Line<'static>>, block: &ContentBlock) {
    match block {
        ContentBlock::Text { text } => {
            for line in text.lines().take(TEXT_MAX_LINES) {
                lines.push(content_line(
                    truncate(line, TEXT_WIDTH),
                    Style::new().fg(Theme::TEXT_CONTENT),
                ));
            }
        }
        ContentBlock::Thinking { text } => {
            for line in text.lines().take(THINKING_MAX_LINES) {
                lines.push(content_line(
                    truncate(line, THINKING_WIDTH),
                    Style::new().fg(Theme::ACCENT_PURPLE).italic(),
                ));
            }
        }
        ContentBlock::ToolCall { name } => {
            lines.push(content_line(
                format!("→ {name}"),
                Style::new().fg(Theme::ACCENT_YELLOW),
            ));
        }
        ContentBlock::ToolResult { text } => {
            for line in text.lines().take(TOOL_RESULT_MAX_LINES) {
                lines.push(content_line(
                    truncate(line, TOOL_RESULT_WIDTH),
                    Style::new().fg(Theme::TEXT_MUTED),
                ));
            }
        }
        ContentBlock::Unknown => {}
    }
}

fn content_line(text: String, style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled("  | ", Style::new().fg(Theme::GUTTER)),
        Span::styled(text, style),
    ])
}

/// Display-width-aware truncation with an ellipsis past `max` columns.
fn truncate(text: &str, max: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > keep {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn text_entry_gets_a_role_header_and_content() {
        let entry = MessageEntry::text(MessageRole::Assistant, "hello\nworld");
        let lines = entry_lines(&entry, ColorScheme::Dark);
        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&lines[0]), "agent");
        assert!(line_text(&lines[1]).contains("hello"));
        assert!(line_text(&lines[2]).contains("world"));
    }

    #[test]
    fn unknown_blocks_render_as_nothing() {
        let entry = MessageEntry {
            role: MessageRole::System,
            blocks: vec![ContentBlock::Unknown, ContentBlock::Unknown],
        };
        assert!(entry_lines(&entry, ColorScheme::Dark).is_empty());
    }

    #[test]
    fn unknown_blocks_are_skipped_among_known_ones() {
        let entry = MessageEntry {
            role: MessageRole::Assistant,
            blocks: vec![
                ContentBlock::Unknown,
                ContentBlock::ToolCall {
                    name: "shell".to_string(),
                },
            ],
        };
        let lines = entry_lines(&entry, ColorScheme::Dark);
        assert_eq!(lines.len(), 2);
        assert!(line_text(&lines[1]).contains("→ shell"));
    }

    #[test]
    fn tool_output_is_cut_harder_than_text() {
        let long = "x".repeat(200);
        let text_entry = MessageEntry::text(MessageRole::User, long.clone());
        let tool_entry = MessageEntry {
            role: MessageRole::ToolResult,
            blocks: vec![ContentBlock::ToolResult { text: long }],
        };

        let text_line = line_text(&entry_lines(&text_entry, ColorScheme::Dark)[1]);
        let tool_line = line_text(&entry_lines(&tool_entry, ColorScheme::Dark)[1]);
        assert!(text_line.chars().count() > tool_line.chars().count());
        assert!(tool_line.ends_with('…'));
    }

    #[test]
    fn tool_result_line_count_is_capped() {
        let entry = MessageEntry {
            role: MessageRole::ToolResult,
            blocks: vec![ContentBlock::ToolResult {
                text: (0..20).map(|i| format!("line {i}\n")).collect(),
            }],
        };
        let lines = entry_lines(&entry, ColorScheme::Dark);
        // header + capped body
        assert_eq!(lines.len(), 1 + TOOL_RESULT_MAX_LINES);
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("héllo wörld", 6), "héllo…");
        assert_eq!(truncate("short", 10), "short");
    }
}
