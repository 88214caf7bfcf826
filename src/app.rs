//! Application state and core logic for the terminal UI.

use std::sync::Arc;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::Color;
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};
use unicode_width::UnicodeWidthStr;

use crate::draw::Spread;
use crate::error::{GenerateError, ReadingError};
use crate::generator::Generator;
use crate::session::{PendingReading, Prepared, ReadingSession};
use crate::ui::{reading_lines, slot_preview};

/// What the spawned generation task sends back.
pub type GenerationResult = Result<String, GenerateError>;

/// Application status states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Idle,
    Drawing,
    Error,
}

impl AppStatus {
    pub fn border_type(&self) -> BorderType {
        match self {
            AppStatus::Idle => BorderType::Rounded,
            AppStatus::Drawing | AppStatus::Error => BorderType::Double,
        }
    }

    /// Returns the color for this status, with a slow shimmer while drawing
    /// and a pulse for errors (every 15 frames).
    pub fn pulsing_color(&self, frame_count: u64) -> Color {
        let phase = (frame_count / 15).is_multiple_of(2);
        match self {
            AppStatus::Idle => Color::Magenta,
            AppStatus::Drawing if phase => Color::LightMagenta,
            AppStatus::Drawing => Color::Magenta,
            AppStatus::Error if phase => Color::Red,
            AppStatus::Error => Color::Rgb(128, 0, 0),
        }
    }
}

/// Main application state.
pub struct App {
    pub status: AppStatus,
    pub input: String,
    /// Cursor position in characters, not bytes.
    pub cursor: usize,
    pub max_question_chars: usize,
    pub spread: Spread,
    pub session: ReadingSession,
    generator: Arc<dyn Generator>,
    generation_tx: UnboundedSender<GenerationResult>,
    /// The request whose generation task is in flight.
    pending: Option<PendingReading>,
    pub draw_started: Option<Instant>,
    /// Last error shown in the command panel.
    pub message: Option<String>,
    pub message_retryable: bool,
    pub show_already_drawing_popup: bool,
    pub scroll_offset: u16,
    pub reading_pane_height: u16,
    pub reading_pane_width: u16,
    /// Frame counter for animations (incremented each render cycle).
    pub frame_count: u64,
    pub session_id: String,
}

impl App {
    pub fn new(
        session: ReadingSession,
        generator: Arc<dyn Generator>,
        generation_tx: UnboundedSender<GenerationResult>,
        spread: Spread,
        max_question_chars: usize,
        session_id: String,
    ) -> Self {
        Self {
            status: AppStatus::Idle,
            input: String::new(),
            cursor: 0,
            max_question_chars,
            spread,
            session,
            generator,
            generation_tx,
            pending: None,
            draw_started: None,
            message: None,
            message_retryable: false,
            show_already_drawing_popup: false,
            scroll_offset: 0,
            reading_pane_height: 0,
            reading_pane_width: 0,
            frame_count: 0,
            session_id,
        }
    }

    /// Handle one key press. Returns `true` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            return true;
        }

        // Any other key just dismisses the notice.
        if self.show_already_drawing_popup {
            self.show_already_drawing_popup = false;
            return false;
        }

        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Tab => {
                self.spread = self.spread.toggle();
                debug!(spread = ?self.spread, "spread_toggled");
            }
            KeyCode::Up => self.scroll_up(1),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(self.page_size()),
            KeyCode::PageDown => self.scroll_down(self.page_size()),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.input.chars().count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.input.chars().count(),
            KeyCode::Backspace => self.delete_before_cursor(),
            KeyCode::Delete => self.delete_at_cursor(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_char(c)
            }
            _ => {}
        }
        false
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    /// Display column of the cursor; wide characters take two cells.
    pub fn cursor_column(&self) -> u16 {
        self.input[..self.byte_index()].width() as u16
    }

    /// Insert at the cursor unless the question is already at the cap.
    pub fn insert_char(&mut self, c: char) {
        if self.input.chars().count() >= self.max_question_chars {
            return;
        }
        let at = self.byte_index();
        self.input.insert(at, c);
        self.cursor += 1;
    }

    fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.input.remove(at);
    }

    fn delete_at_cursor(&mut self) {
        if self.cursor < self.input.chars().count() {
            let at = self.byte_index();
            self.input.remove(at);
        }
    }

    /// Start a reading for the current question and spread.
    pub fn submit(&mut self) {
        if self.status == AppStatus::Drawing {
            debug!("draw_ignored_while_drawing");
            self.show_already_drawing_popup = true;
            return;
        }

        let question = self.input.clone();
        match self.session.begin(&question, self.spread) {
            Ok(Prepared::Ready(_)) => self.show_reading(),
            Ok(Prepared::Pending(pending)) => self.start_generation(pending),
            Err(e) => self.show_error(&e),
        }
    }

    fn start_generation(&mut self, pending: PendingReading) {
        let generator = Arc::clone(&self.generator);
        let tx = self.generation_tx.clone();
        let system = pending.prompt.system;
        let user = pending.prompt.user.clone();

        tokio::spawn(async move {
            let result = generator.generate(system, &user).await;
            // Receiver is gone only when the app is shutting down.
            let _ = tx.send(result);
        });

        info!(cards = pending.cards.len(), "generation_started");
        self.pending = Some(pending);
        self.status = AppStatus::Drawing;
        self.draw_started = Some(Instant::now());
        self.message = None;
    }

    /// Complete the in-flight request with the task's result.
    pub fn on_generated(&mut self, result: GenerationResult) {
        let Some(pending) = self.pending.take() else {
            debug!("generation_result_without_request");
            return;
        };
        self.draw_started = None;
        match self.session.finish(pending, result) {
            Ok(_) => self.show_reading(),
            Err(e) => self.show_error(&e),
        }
    }

    fn show_reading(&mut self) {
        self.status = AppStatus::Idle;
        self.message = None;
        self.scroll_offset = 0;
    }

    fn show_error(&mut self, error: &ReadingError) {
        self.status = AppStatus::Error;
        self.message = Some(error.to_string());
        self.message_retryable = error.is_retryable();
    }

    fn content_lines(&self) -> Vec<String> {
        match self.session.current() {
            Some(reading) => reading_lines(reading),
            None => vec![slot_preview(self.spread)],
        }
    }

    pub fn visual_line_count(&self) -> u16 {
        if self.reading_pane_width == 0 {
            return 0;
        }
        let content: Vec<Line> = self.content_lines().into_iter().map(Line::from).collect();
        let paragraph = Paragraph::new(content)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        paragraph.line_count(self.reading_pane_width) as u16
    }

    pub fn max_scroll(&self) -> u16 {
        self.visual_line_count()
            .saturating_sub(self.reading_pane_height)
    }

    fn page_size(&self) -> u16 {
        self.reading_pane_height.saturating_sub(1).max(1)
    }

    pub fn scroll_up(&mut self, amount: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: u16) {
        self.scroll_offset = (self.scroll_offset + amount).min(self.max_scroll());
    }
}
