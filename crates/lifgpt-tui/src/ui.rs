use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use lifgpt_core::{ChatMessage, Sender};
use unicode_width::UnicodeWidthChar;
use crate::app::{App, InputMode};
use crate::markup;

fn sender_style(sender: Sender) -> Style {
    match sender {
        Sender::User => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        Sender::Assistant => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
    }
}

/// Lines for one chat bubble: sender, body, time, then a blank spacer.
fn message_lines(msg: &ChatMessage) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        msg.sender.display_name(),
        sender_style(msg.sender),
    ))];
    lines.extend(markup::to_lines(&msg.text, Style::default()));
    lines.push(
        Line::from(Span::styled(
            msg.time.clone(),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Right),
    );
    lines.push(Line::default());
    lines
}

/// Rows `paragraph` takes at `width` columns, wrapped exactly as it renders.
fn wrapped_height(paragraph: &Paragraph<'_>, width: u16) -> u16 {
    paragraph.line_count(width).min(u16::MAX as usize) as u16
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Index of the first visible input char such that the cursor cell still
/// fits in `width` columns.
fn input_scroll_offset(input: &str, cursor: usize, width: usize) -> usize {
    if width == 0 {
        return 0;
    }
    let before: Vec<usize> = input.chars().take(cursor).map(char_width).collect();
    let mut start = before.len();
    let mut used = 1; // the cursor cell
    while start > 0 && used + before[start - 1] <= width {
        used += before[start - 1];
        start -= 1;
    }
    start
}

/// The part of `input` from char `offset` on that fits in `width` columns.
fn visible_input(input: &str, offset: usize, width: usize) -> String {
    let mut used = 0;
    input
        .chars()
        .skip(offset)
        .take_while(|&c| {
            used += char_width(c);
            used <= width
        })
        .collect()
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat_screen(app, frame, body_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" lifGPT ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.api_route.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Normal => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" g/G ", key_style),
            Span::styled(" top/bottom ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(if app.session.is_pending() { " waiting " } else { " send " }, label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
            Span::styled(" Ctrl-C ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let error_height = if app.session.last_error().is_some() { 3 } else { 0 };

    let [chat_area, error_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(error_height),
        Constraint::Length(3),
    ])
    .areas(area);

    render_transcript(app, frame, chat_area);

    if let Some(error) = app.session.last_error() {
        let banner = Paragraph::new(Span::styled(error.to_string(), Style::default().fg(Color::Red)))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(banner, error_area);
    }

    render_input(app, frame, input_area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.input_mode == InputMode::Normal {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
        .title(" Chat ");

    let transcript = app.session.transcript();
    let mut lines: Vec<Line> = Vec::new();

    if transcript.is_empty() && !app.session.is_pending() {
        lines.push(Line::from(Span::styled(
            "Ask me anything...",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for msg in transcript {
            lines.extend(message_lines(msg));
        }

        if app.session.is_pending() {
            lines.push(Line::from(Span::styled(
                Sender::Assistant.display_name(),
                sender_style(Sender::Assistant),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("lifGPT is typing{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
    }

    // Inner size minus borders
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    app.update_chat_metrics(wrapped_height(&chat, inner_width), inner_height);

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(if app.session.is_pending() { " Waiting for lifGPT " } else { " Send " });

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders), in display columns
    let inner_width = area.width.saturating_sub(2) as usize;
    let input_text = app.session.input();
    let cursor_pos = app.input_cursor;
    let scroll_offset = input_scroll_offset(input_text, cursor_pos, inner_width);

    let input = if input_text.is_empty() && !editing {
        Paragraph::new(Span::styled("Ask me anything", Style::default().fg(Color::DarkGray)))
    } else {
        Paragraph::new(visible_input(input_text, scroll_offset, inner_width))
            .style(Style::default().fg(Color::Yellow))
    };

    frame.render_widget(input.block(input_block), area);

    // Show cursor when editing
    if editing {
        let cursor_x: usize = input_text
            .chars()
            .skip(scroll_offset)
            .take(cursor_pos.saturating_sub(scroll_offset))
            .map(char_width)
            .sum();
        frame.set_cursor_position((area.x + cursor_x as u16 + 1, area.y + 1));
    }
}
