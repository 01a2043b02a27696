use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use civic_assistant::models::MessageRole;
use civic_assistant::session::RequestPhase;

use super::markdown;
use crate::app::{App, AppMode};

/// Suggestions beyond F4 are listed without a key.
const SUGGESTION_KEYS: usize = 4;

/// Parse a theme color name, falling back when it is not recognized.
pub fn theme_color(name: &str, fallback: Color) -> Color {
    name.parse().unwrap_or(fallback)
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.width.saturating_sub(width) / 2;
    let y = area.height.saturating_sub(height) / 2;
    Rect {
        x: area.x + x,
        y: area.y + y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

pub fn render_help_window(frame: &mut Frame, area: Rect) {
    let section = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)))
    };

    let help_text = vec![
        Line::from(Span::styled(
            "Civic Assistant - Keyboard Shortcuts",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("General:"),
        Line::from("  Ctrl+H        - Show/hide this help"),
        Line::from("  Ctrl+L        - Switch language (বাংলা / English)"),
        Line::from("  Tab           - Switch between chat and verify"),
        Line::from("  Ctrl+Q        - Quit application"),
        Line::from("  Ctrl+C twice  - Quit application"),
        Line::from(""),
        section("Chat:"),
        Line::from("  Enter         - Send message"),
        Line::from("  Esc           - Stop the current answer"),
        Line::from("  F1-F4         - Use a suggested question"),
        Line::from("  Ctrl+N        - New conversation"),
        Line::from("  Ctrl+S        - Save conversation"),
        Line::from(""),
        section("Verify:"),
        Line::from("  Enter         - Check the text you typed"),
        Line::from("  /image <path> [text] - Check an image"),
        Line::from(""),
        section("Navigation:"),
        Line::from("  Up/Down       - Scroll"),
        Line::from("  PgUp/PgDn     - Scroll faster"),
        Line::from("  Home/End      - Jump to start/end"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+H or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    let popup = popup_area(area, 60, 27);
    frame.render_widget(Clear, popup);
    frame.render_widget(help_paragraph, popup);
}

pub fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let language = app.language();
    let title = match app.mode {
        AppMode::Chat => language.assistant_title(),
        AppMode::Verify => language.verify_title(),
    };
    let accent = theme_color(&app.theme.border_color, Color::Cyan);

    let line = Line::from(vec![
        Span::styled(
            format!(" {title} "),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("[{}]", language.display_name()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            "Ctrl+C: Quit | Ctrl+H: Help | Tab: Chat/Verify | Ctrl+L: Language | Ctrl+N: New",
            Style::default().fg(Color::DarkGray),
        )
    };

    let bar = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(style);

    frame.render_widget(bar, area);
}

pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(24)])
        .split(area);

    if let Some(notification) = &app.notification {
        let color = if notification.is_error {
            Color::Red
        } else {
            Color::Green
        };
        let text = if notification.is_error {
            format!("{}: {}", app.language().error_title(), notification.text)
        } else {
            notification.text.clone()
        };
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(color)),
            chunks[0],
        );
    }

    let indicator = if app.session.is_streaming() {
        "[...]"
    } else if app.is_analyzing {
        app.language().analyzing()
    } else {
        ""
    };

    let status = Paragraph::new(indicator)
        .alignment(Alignment::Right)
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    frame.render_widget(status, chunks[1]);
}

fn suggestion_line(index: usize, question: &str, keyed: bool) -> Line<'static> {
    let label = if keyed && index < SUGGESTION_KEYS {
        format!("  [F{}] ", index + 1)
    } else {
        "  • ".to_string()
    };
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Yellow)),
        Span::raw(question.to_string()),
    ])
}

/// Everything the chat pane shows, before wrapping and scrolling.
pub fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let language = app.language();
    let transcript = app.session.snapshot();
    let mut lines = Vec::new();

    if transcript.messages.is_empty() && !app.session.is_streaming() {
        lines.push(Line::from(Span::styled(
            language.welcome(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
        for (index, question) in language.suggested_questions().iter().enumerate() {
            lines.push(suggestion_line(index, question, true));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            language.disclaimer(),
            Style::default().fg(Color::DarkGray),
        )));
        return lines;
    }

    let user_color = theme_color(&app.theme.user_message_color, Color::Cyan);
    let assistant_color = theme_color(&app.theme.assistant_message_color, Color::Green);
    let last = transcript.messages.len().saturating_sub(1);
    let settled = !matches!(transcript.phase, RequestPhase::Streaming);

    for (position, message) in transcript.messages.iter().enumerate() {
        let (heading, color) = match message.role {
            MessageRole::User => (language.you(), user_color),
            MessageRole::Assistant => (language.assistant_title(), assistant_color),
        };

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("## {heading}"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));

        match message.role {
            MessageRole::User => {
                lines.extend(message.content.lines().map(|l| Line::from(l.to_string())));
            }
            MessageRole::Assistant => lines.extend(markdown::render_content(&message.content)),
        }

        if !message.follow_ups().is_empty() {
            let keyed = settled && position == last;
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                language.learn_more(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            for (index, question) in message.follow_ups().iter().enumerate() {
                lines.push(suggestion_line(index, question, keyed));
            }
        }
    }

    if app.session.is_streaming() && app.session.draft().is_none() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("## {}", language.assistant_title()),
            Style::default().fg(assistant_color).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("...", Style::default().fg(Color::DarkGray))));
    }

    lines
}

/// Clamp `offset` so the last wrapped line sits at the bottom of `area`.
fn clamp_scroll(lines: &[Line<'_>], area: Rect, offset: usize) -> usize {
    let available_width = (area.width as usize).max(1);
    let total_visual_lines: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(available_width).max(1))
        .sum();

    let max_scroll = total_visual_lines.saturating_sub(area.height as usize);
    offset.min(max_scroll)
}

pub fn render_chat_history(frame: &mut Frame, app: &mut App, area: Rect) {
    let lines = chat_lines(app);

    let actual_scroll = clamp_scroll(&lines, area, app.scroll_offset);
    app.scroll_offset = actual_scroll;

    let chat_history = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(actual_scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(chat_history, area);
}

pub fn render_verify_pane(frame: &mut Frame, app: &mut App, area: Rect) {
    let language = app.language();
    let mut lines = Vec::new();

    if app.is_analyzing {
        lines.push(Line::from(Span::styled(
            language.analyzing(),
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(analysis) = &app.analysis {
        lines.extend(markdown::render_content(analysis));
    } else {
        lines.push(Line::from(Span::styled(
            language.verify_placeholder(),
            Style::default().fg(Color::Gray),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        language.disclaimer(),
        Style::default().fg(Color::DarkGray),
    )));

    let actual_scroll = clamp_scroll(&lines, area, app.verify_scroll);
    app.verify_scroll = actual_scroll;

    let pane = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(actual_scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(pane, area);
}

pub fn render_input_field(frame: &mut Frame, app: &App, area: Rect) {
    let placeholder = match app.mode {
        AppMode::Chat => app.language().chat_placeholder(),
        AppMode::Verify => app.language().verify_placeholder(),
    };
    let border = theme_color(&app.theme.border_color, Color::Cyan);

    let (input_text, input_style) = if app.input_buffer.is_empty() {
        (placeholder, Style::default().fg(Color::Gray))
    } else {
        (
            app.input_buffer.as_str(),
            Style::default().fg(border).add_modifier(Modifier::BOLD),
        )
    };

    let input = Paragraph::new(input_text)
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(input, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::AppEvent;
    use civic_assistant::models::AppConfig;
    use civic_assistant::stream::ChatStreamEvent;
    use civic_assistant::Language;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn english_app() -> App {
        App::new(&AppConfig {
            language: Language::En,
            ..AppConfig::default()
        })
    }

    #[test]
    fn test_theme_color() {
        assert_eq!(theme_color("green", Color::Cyan), Color::Green);
        assert_eq!(theme_color("#ff0000", Color::Cyan), Color::Rgb(255, 0, 0));
        assert_eq!(theme_color("not-a-color", Color::Cyan), Color::Cyan);
    }

    #[test]
    fn test_empty_chat_lines() {
        let app = english_app();
        let lines: Vec<String> = chat_lines(&app).iter().map(text_of).collect();

        assert_eq!(lines[0], Language::En.welcome());
        assert!(lines.contains(&"  [F4] How can I get a birth certificate?".to_string()));
        assert_eq!(lines.last().unwrap(), Language::En.disclaimer());
    }

    #[test]
    fn test_waiting_placeholder_then_follow_ups() {
        let mut app = english_app();
        app.input_buffer = "How do I vote?".to_string();
        let turn = app.begin_chat().unwrap().id;

        let lines: Vec<String> = chat_lines(&app).iter().map(text_of).collect();
        assert_eq!(lines.last().unwrap(), "...");

        for event in [
            ChatStreamEvent::ContentDelta("Visit **www.ecs.gov.bd**".to_string()),
            ChatStreamEvent::FollowUpQuestions(vec!["Where is my centre?".to_string()]),
        ] {
            app.handle_event(AppEvent::Stream { turn, event });
        }

        // Still streaming: follow-ups are shown but not bound to keys yet
        let lines: Vec<String> = chat_lines(&app).iter().map(text_of).collect();
        assert!(lines.contains(&"  • Where is my centre?".to_string()));

        app.handle_event(AppEvent::Stream {
            turn,
            event: ChatStreamEvent::EndOfStream,
        });
        let lines: Vec<String> = chat_lines(&app).iter().map(text_of).collect();
        assert!(lines.contains(&"## You".to_string()));
        assert!(lines.contains(&"Visit www.ecs.gov.bd".to_string()));
        assert!(lines.contains(&"Learn more:".to_string()));
        assert!(lines.contains(&"  [F1] Where is my centre?".to_string()));
    }

    #[test]
    fn test_clamp_scroll() {
        let lines = vec![Line::from("a"), Line::from("b"), Line::from("c"), Line::from("d")];
        let area = Rect::new(0, 0, 10, 2);
        assert_eq!(clamp_scroll(&lines, area, usize::MAX), 2);
        assert_eq!(clamp_scroll(&lines, area, 1), 1);

        let wide = vec![Line::from("x".repeat(25))];
        assert_eq!(clamp_scroll(&wide, area, usize::MAX), 1);
    }
}
