//! UI rendering functions.

use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};

use crate::app::{App, AppStatus};
use crate::draw::{DrawnCard, Spread};
use crate::session::Reading;

pub const DISCLAIMER: &str =
    "※ 재미/성찰용입니다. 중요한 결정(의료/법률/투자 등)은 전문가 상담을 고려하세요.";

pub const DRAWING_MESSAGE: &str = "카드가 숨을 고르는 중…";

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Formats a duration as M:SS.
pub fn format_elapsed(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Spinner glyph for the given frame; advances every other frame.
pub fn spinner(frame_count: u64) -> &'static str {
    SPINNER_FRAMES[(frame_count / 2) as usize % SPINNER_FRAMES.len()]
}

/// `☾ 과거 · 18. 달 (The Moon) · 역방향`
pub fn card_line(card: &DrawnCard) -> String {
    format!(
        "{} {} · {} · {}",
        card.card.info().glyph,
        card.position,
        card.card.display_name(),
        card.orientation.label()
    )
}

/// Placeholder shown before the first reading: one glyph and label per slot.
pub fn slot_preview(spread: Spread) -> String {
    spread
        .slot_glyphs()
        .iter()
        .zip(spread.positions())
        .map(|(glyph, position)| format!("{glyph} {position}"))
        .collect::<Vec<_>>()
        .join("   ")
}

/// Plain-text rendering of a reading, shared by the TUI and `tarot ask`.
pub fn reading_lines(reading: &Reading) -> Vec<String> {
    let mut lines = vec![format!("오늘의 기운: {}", reading.theme.label()), String::new()];
    lines.extend(reading.cards.iter().map(card_line));
    lines.push(String::new());
    lines.extend(reading.text.lines().map(str::to_string));
    lines
}

/// Calculate a centered rectangle within the given area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Draw the main UI.
pub fn draw_ui(f: &mut Frame, app: &mut App) {
    app.frame_count = app.frame_count.wrapping_add(1);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Question input
            Constraint::Min(0),    // Reading (flexible)
            Constraint::Length(1), // Disclaimer
            Constraint::Length(3), // Command panel
        ])
        .split(f.area());

    let title = Line::from(vec![
        Span::styled(
            "🔮 Mystic Tarot Master",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "  질문을 적고 Enter를 누르면 카드가 흐름을 속삭여줄 거야",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(title), chunks[0]);

    draw_input(f, app, chunks[1]);
    draw_reading(f, app, chunks[2]);

    f.render_widget(
        Paragraph::new(Span::styled(DISCLAIMER, Style::default().fg(Color::DarkGray))),
        chunks[3],
    );

    draw_command_panel(f, app, chunks[4]);

    if app.show_already_drawing_popup {
        let popup_area = centered_rect(44, 5, f.area());
        f.render_widget(Clear, popup_area);
        let popup = Paragraph::new("이미 카드를 펼치는 중이야. 잠시만 기다려줘.")
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Notice")
                    .style(Style::default().fg(Color::Yellow)),
            );
        f.render_widget(popup, popup_area);
    }
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let counter = format!(
        " {}/{} ",
        app.input.chars().count(),
        app.max_question_chars
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(" 질문 ").left_aligned())
        .title(Line::from(counter).right_aligned())
        .border_style(Style::default().fg(Color::Gray));

    let inner_width = area.width.saturating_sub(2);
    let cursor_col = app.cursor_column();
    // Keep the cursor visible once the question outgrows the box.
    let h_scroll = cursor_col.saturating_sub(inner_width.saturating_sub(1));

    let input = Paragraph::new(app.input.as_str())
        .block(block)
        .scroll((0, h_scroll));
    f.render_widget(input, area);

    f.set_cursor_position((area.x + 1 + cursor_col - h_scroll, area.y + 1));
}

fn draw_reading(f: &mut Frame, app: &mut App, area: Rect) {
    app.reading_pane_height = area.height.saturating_sub(2);
    app.reading_pane_width = area.width;

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.status.border_type())
        .border_style(Style::default().fg(app.status.pulsing_color(app.frame_count)))
        .title(Line::from(format!(" {} ", app.session_id)).left_aligned())
        .title(Line::from(format!(" {} ", app.spread.label())).right_aligned());

    let content: Vec<Line> = match app.session.current() {
        Some(reading) => {
            if reading.from_cache {
                block = block.title_bottom(Line::from(" ✧ 저장된 리딩 ").right_aligned());
            }
            let mut lines: Vec<Line> = reading_lines(reading).into_iter().map(Line::from).collect();
            if let Some(first) = lines.first_mut() {
                *first = first.clone().style(
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                );
            }
            lines
        }
        None => vec![
            Line::from(slot_preview(app.spread)).style(Style::default().fg(Color::DarkGray)),
            Line::from(""),
            Line::from("Tab으로 세 장/다섯 장을 바꿀 수 있어.")
                .style(Style::default().fg(Color::DarkGray)),
        ],
    };

    let panel = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset, 0));
    f.render_widget(panel, area);

    // Scrollbar - only visible when content exceeds viewport
    let visual_lines = app.visual_line_count();
    if visual_lines > app.reading_pane_height {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"));

        let mut scrollbar_state = ScrollbarState::default()
            .content_length(visual_lines as usize)
            .position(app.scroll_offset as usize)
            .viewport_content_length(app.reading_pane_height as usize);

        f.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}

fn draw_command_panel(f: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[Enter] 뽑기  [Tab] 장수  [↑↓] 스크롤  [Esc] 종료";

    let status_color = match app.status {
        AppStatus::Error if app.message_retryable => Color::Yellow,
        status => status.pulsing_color(app.frame_count),
    };
    let status_text = match app.status {
        AppStatus::Idle => "● 준비됨".to_string(),
        AppStatus::Drawing => {
            let elapsed = app
                .draw_started
                .map(|start| format!(" {}", format_elapsed(start.elapsed())))
                .unwrap_or_default();
            format!("{} {}{}", spinner(app.frame_count), DRAWING_MESSAGE, elapsed)
        }
        AppStatus::Error => format!("● {}", app.message.as_deref().unwrap_or("오류")),
    };

    // Right-align the status by display width, not byte length.
    let inner_width = area.width.saturating_sub(2) as usize;
    let used = unicode_width::UnicodeWidthStr::width(shortcuts)
        + unicode_width::UnicodeWidthStr::width(status_text.as_str());
    let spacing = inner_width.saturating_sub(used).max(1);

    let command_line = Line::from(vec![
        Span::styled(shortcuts, Style::default().fg(Color::DarkGray)),
        Span::raw(" ".repeat(spacing)),
        Span::styled(status_text, Style::default().fg(status_color)),
    ]);

    let command_panel = Paragraph::new(command_line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(app.status.border_type())
            .border_style(Style::default().fg(status_color)),
    );
    f.render_widget(command_panel, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, Orientation};
    use crate::classifier::Theme;

    fn sample_reading() -> Reading {
        Reading {
            question: "요즘 너무 불안해요".to_string(),
            theme: Theme::Anxiety,
            cards: vec![
                DrawnCard::new(Card::Moon, "과거", Orientation::Reversed),
                DrawnCard::new(Card::Strength, "현재", Orientation::Upright),
                DrawnCard::new(Card::Star, "미래", Orientation::Upright),
            ],
            text: "첫 문단\n\n둘째 문단".to_string(),
            from_cache: false,
        }
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0:00");
        assert_eq!(format_elapsed(Duration::from_secs(59)), "0:59");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2:05");
    }

    #[test]
    fn test_spinner_cycles() {
        assert_eq!(spinner(0), spinner(1));
        assert_ne!(spinner(0), spinner(2));
        assert_eq!(spinner(0), spinner(20));
    }

    #[test]
    fn test_card_line_format() {
        let card = DrawnCard::new(Card::Moon, "과거", Orientation::Reversed);
        let line = card_line(&card);
        assert!(line.ends_with("과거 · 18. 달 (The Moon) · 역방향"));
        assert!(line.starts_with(Card::Moon.info().glyph));
    }

    #[test]
    fn test_slot_preview() {
        assert_eq!(slot_preview(Spread::Three), "☾ 과거   ☀︎ 현재   ⭐︎ 미래");
        assert!(slot_preview(Spread::Five).ends_with("♁ 흐름의 끝"));
    }

    #[test]
    fn test_reading_lines_layout() {
        let lines = reading_lines(&sample_reading());
        assert_eq!(lines[0], "오늘의 기운: 불안/흔들림");
        assert_eq!(lines[1], "");
        assert!(lines[2].contains("과거 · 18. 달"));
        assert!(lines[4].contains("미래 · 17. 별"));
        assert_eq!(lines[5], "");
        assert_eq!(&lines[6..], ["첫 문단", "", "둘째 문단"]);
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 4);
        let rect = centered_rect(44, 5, area);
        assert_eq!(rect.width, 20);
        assert_eq!(rect.height, 4);

        let rect = centered_rect(10, 2, Rect::new(0, 0, 30, 10));
        assert_eq!((rect.x, rect.y), (10, 4));
    }
}
