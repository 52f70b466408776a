//! UI rendering for the Muse terminal client.
//!
//! Implements the two-view interface:
//! - Header with app title and view tabs
//! - Chat view: message log with formatted code blocks, sources, and input
//! - Image view: prompt input and generation result panel
//! - Bottom: keybind hints

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Screen};
use crate::config::{DEEPAI_API_KEY_VAR, GEMINI_API_KEY_VAR};
use crate::format::{format_message, Segment};
use crate::models::{ChatMessage, Sender};
use crate::state::ImageStatus;
use crate::widgets::InputBox;

// ============================================================================
// Color Theme
// ============================================================================

/// Primary border color
pub const COLOR_BORDER: Color = Color::DarkGray;

/// Accent color for highlights and the active tab
pub const COLOR_ACCENT: Color = Color::White;

/// User message label color
pub const COLOR_USER: Color = Color::Cyan;

/// Assistant message label color
pub const COLOR_ASSISTANT: Color = Color::LightGreen;

/// Dim text for timestamps and hints
pub const COLOR_DIM: Color = Color::DarkGray;

/// Error text color
pub const COLOR_ERROR: Color = Color::Red;

/// Code block text color
pub const COLOR_CODE: Color = Color::Yellow;

/// Citation link color
pub const COLOR_LINK: Color = Color::Blue;

/// Braille spinner frames for in-flight indicators
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

// ============================================================================
// Main UI Rendering
// ============================================================================

/// Render the UI based on the current screen
pub fn render(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(COLOR_BORDER));
    frame.render_widget(outer_block, size);

    let inner = inner_rect(size, 1);
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header with tabs
            Constraint::Min(6),    // View content
            Constraint::Length(1), // Keybind hints
        ])
        .split(inner);

    render_header(frame, main_chunks[0], app);
    match app.screen {
        Screen::Chat => render_chat_view(frame, main_chunks[1], app),
        Screen::ImageGen => render_image_view(frame, main_chunks[1], app),
    }
    render_hints(frame, main_chunks[2], app);
}

/// Get inner rect with margin
fn inner_rect(area: Rect, margin: u16) -> Rect {
    Rect {
        x: area.x + margin,
        y: area.y + margin,
        width: area.width.saturating_sub(margin * 2),
        height: area.height.saturating_sub(margin * 2),
    }
}

fn spinner_frame(tick_count: u64) -> &'static str {
    SPINNER_FRAMES[(tick_count % 10) as usize]
}

// ============================================================================
// Header Section
// ============================================================================

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let tab_style = |selected: bool| {
        if selected {
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(COLOR_DIM)
        }
    };

    let header_line = Line::from(vec![
        Span::styled(
            " MUSE ",
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(COLOR_BORDER)),
        Span::styled("Chat", tab_style(app.screen == Screen::Chat)),
        Span::raw("   "),
        Span::styled("Image", tab_style(app.screen == Screen::ImageGen)),
    ]);

    let header_block = Block::default()
        .borders(Borders::BOTTOM)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(COLOR_BORDER));

    let header = Paragraph::new(header_line).block(header_block);
    frame.render_widget(header, area);
}

// ============================================================================
// Chat View
// ============================================================================

fn render_chat_view(frame: &mut Frame, area: Rect, app: &mut App) {
    if let Some(reason) = app.chat.disabled_reason.clone() {
        render_disabled_panel(frame, area, &reason, GEMINI_API_KEY_VAR);
        return;
    }

    let show_indicator = app.chat.is_awaiting_reply();
    let chunks = if show_indicator {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(4),    // Message log
                Constraint::Length(1), // Thinking indicator
                Constraint::Length(3), // Input box
            ])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(4),    // Message log
                Constraint::Length(3), // Input box
            ])
            .split(area)
    };

    render_message_log(frame, chunks[0], app);
    if show_indicator {
        render_thinking_indicator(frame, chunks[1], app);
        render_input_box(frame, chunks[2], &app.chat_input, "Message", true);
    } else {
        render_input_box(frame, chunks[1], &app.chat_input, "Message", true);
    }
}

fn render_message_log(frame: &mut Frame, area: Rect, app: &mut App) {
    let inner = inner_rect(area, 1);
    let mut lines: Vec<Line> = Vec::new();

    if let Some(error) = &app.chat.last_error {
        lines.push(Line::from(vec![
            Span::styled(
                "⚠ ERROR: ",
                Style::default()
                    .fg(COLOR_ERROR)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(error.clone(), Style::default().fg(COLOR_ERROR)),
        ]));
        lines.push(Line::from(Span::styled(
            "─".repeat((inner.width as usize).min(80)),
            Style::default().fg(COLOR_ERROR),
        )));
    }

    for message in &app.chat.messages {
        lines.push(Line::from(""));
        lines.extend(message_lines(message));
    }

    let viewport_width = inner.width as usize;
    let viewport_height = inner.height as usize;
    let total_lines = estimate_wrapped_line_count(&lines, viewport_width);

    // scroll=0 shows the latest content; clamp so the counter cannot run away
    let max_scroll = total_lines.saturating_sub(viewport_height) as u16;
    app.chat_scroll = app.chat_scroll.min(max_scroll);
    let actual_scroll = max_scroll.saturating_sub(app.chat_scroll);

    let log_widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((actual_scroll, 0));
    frame.render_widget(log_widget, inner);
}

/// Build the display lines for one chat message
fn message_lines(message: &ChatMessage) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let (label, label_color) = match message.sender {
        Sender::User => ("You", COLOR_USER),
        Sender::Assistant => ("Gemini", COLOR_ASSISTANT),
    };
    lines.push(Line::from(vec![
        Span::styled(
            label.to_string(),
            Style::default()
                .fg(label_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", message.timestamp.format("%H:%M")),
            Style::default().fg(COLOR_DIM),
        ),
    ]));

    let body_style = if message.is_error() {
        Style::default().fg(COLOR_ERROR)
    } else {
        Style::default()
    };

    for segment in format_message(&message.text) {
        match segment {
            Segment::Text { lines: text_lines } => {
                for text in text_lines {
                    lines.push(Line::from(Span::styled(format!("  {}", text), body_style)));
                }
            }
            Segment::Code { language, code } => {
                let tag = language.unwrap_or_default();
                lines.push(Line::from(Span::styled(
                    format!("  ┌─ {}", tag),
                    Style::default().fg(COLOR_DIM),
                )));
                for code_line in code.lines() {
                    lines.push(Line::from(vec![
                        Span::styled("  │ ", Style::default().fg(COLOR_DIM)),
                        Span::styled(code_line.to_string(), Style::default().fg(COLOR_CODE)),
                    ]));
                }
                lines.push(Line::from(Span::styled(
                    "  └─",
                    Style::default().fg(COLOR_DIM),
                )));
            }
        }
    }

    if !message.citations.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Sources:",
            Style::default().fg(COLOR_DIM).add_modifier(Modifier::BOLD),
        )));
        for citation in &message.citations {
            lines.push(Line::from(vec![
                Span::styled("  • ", Style::default().fg(COLOR_DIM)),
                Span::styled(
                    citation.title.clone(),
                    Style::default()
                        .fg(COLOR_LINK)
                        .add_modifier(Modifier::UNDERLINED),
                ),
                Span::styled(
                    format!(" ({})", citation.uri),
                    Style::default().fg(COLOR_DIM),
                ),
            ]));
        }
    }

    lines
}

fn render_thinking_indicator(frame: &mut Frame, area: Rect, app: &App) {
    let indicator = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("  {} ", spinner_frame(app.tick_count)),
            Style::default().fg(COLOR_ASSISTANT),
        ),
        Span::styled(
            "Gemini is thinking...",
            Style::default()
                .fg(COLOR_DIM)
                .add_modifier(Modifier::ITALIC),
        ),
    ]));
    frame.render_widget(indicator, area);
}

// ============================================================================
// Image View
// ============================================================================

fn render_image_view(frame: &mut Frame, area: Rect, app: &App) {
    if let Some(reason) = &app.image.disabled_reason {
        render_disabled_panel(frame, area, reason, DEEPAI_API_KEY_VAR);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Prompt input
            Constraint::Min(3),    // Result panel
        ])
        .split(area);

    render_input_box(
        frame,
        chunks[0],
        &app.image_input,
        "Prompt",
        !app.image.is_pending(),
    );
    render_image_result(frame, chunks[1], app);
}

fn render_image_result(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(COLOR_BORDER))
        .title(Span::styled(" Result ", Style::default().fg(COLOR_DIM)));

    let lines: Vec<Line> = match &app.image.status {
        ImageStatus::Idle => vec![
            Line::from(""),
            Line::from(Span::styled(
                "Describe an image and press Enter to generate it.",
                Style::default().fg(COLOR_DIM),
            )),
            Line::from(Span::styled(
                "e.g. \"a watercolor fox in a snowy forest\"",
                Style::default()
                    .fg(COLOR_DIM)
                    .add_modifier(Modifier::ITALIC),
            )),
        ],
        ImageStatus::Pending => vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    format!("{} ", spinner_frame(app.tick_count)),
                    Style::default().fg(COLOR_ASSISTANT),
                ),
                Span::styled(
                    "Your vision is materializing...",
                    Style::default()
                        .fg(COLOR_DIM)
                        .add_modifier(Modifier::ITALIC),
                ),
            ]),
        ],
        ImageStatus::Success { url } => vec![
            Line::from(""),
            Line::from(Span::styled(
                "Image ready:",
                Style::default()
                    .fg(COLOR_ASSISTANT)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                url.clone(),
                Style::default()
                    .fg(COLOR_LINK)
                    .add_modifier(Modifier::UNDERLINED),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Ctrl+O to open it in your browser.",
                Style::default().fg(COLOR_DIM),
            )),
        ],
        ImageStatus::Failed { message } => vec![
            Line::from(""),
            Line::from(Span::styled(
                "Oops, something went wrong:",
                Style::default()
                    .fg(COLOR_ERROR)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                message.clone(),
                Style::default().fg(COLOR_ERROR),
            )),
        ],
    };

    let panel = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}

// ============================================================================
// Shared Components
// ============================================================================

fn render_disabled_panel(frame: &mut Frame, area: Rect, reason: &str, env_var: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(COLOR_BORDER));

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Feature unavailable",
            Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::raw(reason.to_string())),
        Line::from(""),
        Line::from(Span::styled(
            format!("Set the {} environment variable and restart.", env_var),
            Style::default().fg(COLOR_DIM),
        )),
    ];

    let panel = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}

fn render_input_box(frame: &mut Frame, area: Rect, input: &InputBox, title: &str, active: bool) {
    let border_color = if active { COLOR_ACCENT } else { COLOR_DIM };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(COLOR_DIM),
        ));

    let text_style = if active {
        Style::default()
    } else {
        Style::default().fg(COLOR_DIM)
    };
    let widget = Paragraph::new(Span::styled(input.value().to_string(), text_style)).block(block);
    frame.render_widget(widget, area);

    if active {
        frame.set_cursor_position((area.x + 1 + input.cursor_width(), area.y + 1));
    }
}

fn render_hints(frame: &mut Frame, area: Rect, app: &App) {
    let hints = match app.screen {
        Screen::Chat => " Tab: image view │ Enter: send │ ↑/↓ PgUp/PgDn: scroll │ Ctrl+C: quit",
        Screen::ImageGen => " Tab: chat view │ Enter: generate │ Ctrl+O: open image │ Ctrl+C: quit",
    };
    let widget = Paragraph::new(Span::styled(hints, Style::default().fg(COLOR_DIM)));
    frame.render_widget(widget, area);
}

// ============================================================================
// Layout Helpers
// ============================================================================

/// Estimate how many visual lines a set of logical lines occupies after
/// word wrapping at the given viewport width. Empty lines count as one row.
pub fn estimate_wrapped_line_count(lines: &[Line], viewport_width: usize) -> usize {
    if viewport_width == 0 {
        return lines.len();
    }

    lines
        .iter()
        .map(|line| {
            let char_count: usize = line
                .spans
                .iter()
                .map(|s| s.content.chars().count())
                .sum();
            if char_count == 0 {
                1
            } else {
                (char_count + viewport_width - 1) / viewport_width
            }
        })
        .sum()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Citation;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_estimate_wrapped_line_count_empty() {
        let lines: Vec<Line> = Vec::new();
        assert_eq!(estimate_wrapped_line_count(&lines, 80), 0);
    }

    #[test]
    fn test_estimate_wrapped_line_count_short_line() {
        let lines = vec![Line::from("hello")];
        assert_eq!(estimate_wrapped_line_count(&lines, 80), 1);
    }

    #[test]
    fn test_estimate_wrapped_line_count_wrapping() {
        let lines = vec![Line::from("x".repeat(100))];
        assert_eq!(estimate_wrapped_line_count(&lines, 80), 2);
    }

    #[test]
    fn test_estimate_wrapped_line_count_empty_line_counts_one() {
        let lines = vec![Line::from("")];
        assert_eq!(estimate_wrapped_line_count(&lines, 80), 1);
    }

    #[test]
    fn test_message_lines_includes_label_and_timestamp() {
        let message = ChatMessage::user("hi");
        let lines = message_lines(&message);
        let header = line_text(&lines[0]);
        assert!(header.starts_with("You"));
        assert!(header.contains(&message.timestamp.format("%H:%M").to_string()));
    }

    #[test]
    fn test_message_lines_renders_code_block_with_frame() {
        let message = ChatMessage::assistant("a\n```js\nfoo()\n```\nb", Vec::new());
        let rendered: Vec<String> = message_lines(&message).iter().map(line_text).collect();
        assert!(rendered.iter().any(|l| l.contains("┌─ js")));
        assert!(rendered.iter().any(|l| l.contains("│ foo()")));
        assert!(rendered.iter().any(|l| l.contains("└─")));
    }

    #[test]
    fn test_message_lines_lists_sources() {
        let citations = vec![Citation::new("http://a".to_string(), Some("Alpha".to_string()))];
        let message = ChatMessage::assistant("see sources", citations);
        let rendered: Vec<String> = message_lines(&message).iter().map(line_text).collect();
        assert!(rendered.iter().any(|l| l.contains("Sources:")));
        assert!(rendered.iter().any(|l| l.contains("Alpha") && l.contains("http://a")));
    }
}
