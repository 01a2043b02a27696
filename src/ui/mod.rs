pub mod markdown;
pub mod widgets;

use crate::app::{App, AppMode};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App) {
    // Width available for text is total width - 2 (for borders)
    let available_width = frame.area().width.saturating_sub(2).max(1) as usize;

    let input_lines = if app.input_buffer.is_empty() {
        1
    } else {
        // Approximate wrapping, close enough for auto-resizing
        app.input_buffer.chars().count().div_ceil(available_width)
    };

    // Clamp lines: Min 1, Max 50% of screen height (approx)
    let max_lines = (frame.area().height as usize / 2).saturating_sub(2).max(1);
    let actual_lines = input_lines.clamp(1, max_lines);

    #[allow(clippy::cast_possible_truncation)]
    let input_height = (actual_lines + 2) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),            // Title bar
            Constraint::Min(0),               // Chat history or analysis
            Constraint::Length(1),            // Status line
            Constraint::Length(input_height), // Input field (dynamic height)
            Constraint::Length(1),            // Bottom keymap bar
        ])
        .split(frame.area());

    widgets::render_title_bar(frame, app, chunks[0]);
    match app.mode {
        AppMode::Chat => widgets::render_chat_history(frame, app, chunks[1]),
        AppMode::Verify => widgets::render_verify_pane(frame, app, chunks[1]),
    }
    widgets::render_status_bar(frame, app, chunks[2]);
    widgets::render_input_field(frame, app, chunks[3]);
    widgets::render_bottom_bar(frame, app, chunks[4]);

    if app.show_help {
        widgets::render_help_window(frame, frame.area());
    }
}
