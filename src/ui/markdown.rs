// Light markdown rendering for assistant replies

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Render a whole message body, code fences included.
pub fn render_content(content: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for line in content.lines() {
        if is_code_fence(line) {
            if in_code_block {
                lines.push(Line::from(Span::styled(
                    "└──────────────────────────────",
                    Style::default().fg(Color::DarkGray),
                )));
            } else {
                let lang = extract_code_language(line);
                lines.push(Line::from(Span::styled(
                    format!("┌─ {} ─────────────────────────", lang.as_deref().unwrap_or("code")),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            in_code_block = !in_code_block;
        } else if in_code_block {
            lines.push(Line::from(Span::styled(
                format!("  {line}"),
                Style::default().fg(Color::Green),
            )));
        } else {
            lines.push(render_markdown_line(line));
        }
    }

    lines
}

/// Check if a line is a markdown table row
pub fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.matches('|').count() >= 2
}

/// Check if a line is a table separator (|---|---|)
pub fn is_table_separator(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.starts_with('|') || !trimmed.ends_with('|') {
        return false;
    }

    trimmed.chars().all(|c| c == '|' || c == '-' || c == ' ' || c == ':')
}

fn render_table_row(line: &str) -> Line<'static> {
    let content = line.trim().trim_start_matches('|').trim_end_matches('|');
    let cells: Vec<&str> = content.split('|').map(str::trim).collect();

    Line::from(Span::styled(
        format!("  {}", cells.join(" | ")),
        Style::default().fg(Color::Cyan),
    ))
}

/// `1. text` or `1) text`, returning the number and the rest.
fn split_numbered_item(line: &str) -> Option<(&str, &str)> {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let (number, rest) = line.split_at(digits);
    let rest = rest
        .strip_prefix(". ")
        .or_else(|| rest.strip_prefix(") "))?;
    Some((number, rest))
}

fn heading_level(line: &str) -> Option<(usize, &str)> {
    let level = line.len() - line.trim_start_matches('#').len();
    if level == 0 || level > 6 {
        return None;
    }
    line[level..].strip_prefix(' ').map(|text| (level, text.trim()))
}

/// Render a single line of markdown with basic styling
pub fn render_markdown_line(line: &str) -> Line<'static> {
    if is_table_separator(line) {
        return Line::from("");
    }
    if is_table_row(line) {
        return render_table_row(line);
    }

    if let Some((level, text)) = heading_level(line) {
        let color = match level {
            1 => Color::Yellow,
            2 => Color::Cyan,
            _ => Color::Blue,
        };
        return Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    let indent_len = line.len() - line.trim_start().len();
    let (indent, body) = line.split_at(indent_len);

    let mut spans = Vec::new();
    if !indent.is_empty() {
        spans.push(Span::raw(indent.to_string()));
    }

    if let Some(item) = body.strip_prefix("- ").or_else(|| body.strip_prefix("* ")) {
        spans.push(Span::styled("• ", Style::default().fg(Color::Cyan)));
        spans.extend(render_inline(item));
    } else if let Some((number, item)) = split_numbered_item(body) {
        spans.push(Span::styled(
            format!("{number}. "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
        spans.extend(render_inline(item));
    } else {
        spans.extend(render_inline(body));
    }

    if spans.is_empty() {
        Line::from("")
    } else {
        Line::from(spans)
    }
}

/// Bold, inline code and links inside one line.
fn render_inline(text: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut current_text = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();

                let mut bold_text = String::new();
                let mut found_close = false;
                while let Some(ch) = chars.next() {
                    if ch == '*' && chars.peek() == Some(&'*') {
                        chars.next();
                        found_close = true;
                        break;
                    }
                    bold_text.push(ch);
                }

                if found_close {
                    push_plain(&mut spans, &std::mem::take(&mut current_text));
                    spans.push(Span::styled(
                        bold_text,
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ));
                } else {
                    current_text.push_str("**");
                    current_text.push_str(&bold_text);
                }
            }
            '`' => {
                let mut code_text = String::new();
                let mut found_close = false;
                for ch in chars.by_ref() {
                    if ch == '`' {
                        found_close = true;
                        break;
                    }
                    code_text.push(ch);
                }

                if found_close {
                    push_plain(&mut spans, &std::mem::take(&mut current_text));
                    spans.push(Span::styled(code_text, Style::default().fg(Color::Magenta)));
                } else {
                    current_text.push('`');
                    current_text.push_str(&code_text);
                }
            }
            _ => current_text.push(ch),
        }
    }

    push_plain(&mut spans, &current_text);
    spans
}

pub fn is_link(word: &str) -> bool {
    word.starts_with("https://") || word.starts_with("http://") || word.starts_with("www.")
}

/// Push plain text, underlining anything that looks like a link.
fn push_plain(spans: &mut Vec<Span<'static>>, text: &str) {
    if text.is_empty() {
        return;
    }

    let link_style = Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::UNDERLINED);
    let mut plain = String::new();

    for word in text.split_inclusive(' ') {
        let bare = word.trim_end();
        let link = bare.trim_end_matches(['.', ',', ')', ';', '।']);
        if is_link(link) {
            if !plain.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut plain)));
            }
            spans.push(Span::styled(link.to_string(), link_style));
            plain.push_str(&word[link.len()..]);
        } else {
            plain.push_str(word);
        }
    }

    if !plain.is_empty() {
        spans.push(Span::raw(plain));
    }
}

/// Detect if a line is a code block fence
pub fn is_code_fence(line: &str) -> bool {
    line.trim().starts_with("```")
}

/// Extract language from code fence
pub fn extract_code_language(line: &str) -> Option<String> {
    line.trim()
        .strip_prefix("```")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_render_plain_text() {
        let lines = render_content("Hello world");
        assert_eq!(lines.len(), 1);
        assert_eq!(text_of(&lines[0]), "Hello world");
    }

    #[test]
    fn test_render_bold_text() {
        let line = render_markdown_line("This is **bold** text");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "bold");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_unclosed_bold_is_literal() {
        let line = render_markdown_line("a **b");
        assert_eq!(text_of(&line), "a **b");
    }

    #[test]
    fn test_render_header() {
        let line = render_markdown_line("## নিবন্ধন");
        assert_eq!(text_of(&line), "নিবন্ধন");

        let not_heading = render_markdown_line("#hashtag");
        assert_eq!(text_of(&not_heading), "#hashtag");
    }

    #[test]
    fn test_render_bullet_with_bold() {
        let line = render_markdown_line("- **NID** card");
        assert_eq!(text_of(&line), "• NID card");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_render_numbered_list() {
        let line = render_markdown_line("2. Fill the form");
        assert_eq!(text_of(&line), "2. Fill the form");
        assert_eq!(line.spans[0].content, "2. ");

        let paren = render_markdown_line("3) Submit");
        assert_eq!(text_of(&paren), "3. Submit");

        let year = render_markdown_line("2024 was an election year");
        assert_eq!(year.spans.len(), 1);
    }

    #[test]
    fn test_links_are_highlighted() {
        let line = render_markdown_line("Visit www.ecs.gov.bd. Or call 105");
        assert_eq!(text_of(&line), "Visit www.ecs.gov.bd. Or call 105");

        let link = line
            .spans
            .iter()
            .find(|span| span.content == "www.ecs.gov.bd")
            .unwrap();
        assert!(link.style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_code_fences() {
        let lines = render_content("```bash\nping 999\n```\nafter");
        assert_eq!(lines.len(), 4);
        assert!(text_of(&lines[0]).contains("bash"));
        assert_eq!(text_of(&lines[1]), "  ping 999");
        assert_eq!(text_of(&lines[3]), "after");
    }

    #[test]
    fn test_is_code_fence() {
        assert!(is_code_fence("```"));
        assert!(is_code_fence("```python"));
        assert!(!is_code_fence("code"));
    }

    #[test]
    fn test_extract_code_language() {
        assert_eq!(extract_code_language("```python"), Some("python".to_string()));
        assert_eq!(extract_code_language("```"), None);
    }

    #[test]
    fn test_tables() {
        assert!(is_table_row("| Col1 | Col2 |"));
        assert!(!is_table_row("| Only one pipe"));
        assert!(is_table_separator("|:---|---:|"));
        assert!(!is_table_separator("| Col1 | Col2 |"));
        assert_eq!(text_of(&render_markdown_line("|A|B|")), "  A | B");
    }
}
