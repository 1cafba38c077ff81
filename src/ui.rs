use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use crate::app::App;
use crate::markdown::{render_markdown, wrap_plain};
use unicode_width::UnicodeWidthChar;
use crate::state::{ChatRole, CopyOutcome};

const TITLE: &str = "Local Ollama Chatbot";
const PLACEHOLDER: &str = "Ask anything...";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(format!(" {} ", TITLE), Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn label_line(app: &App, index: usize, role: ChatRole) -> Line<'static> {
    let (label, color) = match role {
        ChatRole::User => ("You", Color::Cyan),
        ChatRole::Assistant => ("AI", Color::Yellow),
    };

    let mut label_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
    let mut spans = Vec::new();
    if app.selected_message == Some(index) {
        label_style = label_style.add_modifier(Modifier::REVERSED);
        spans.push(Span::styled("> ", Style::default().fg(color)));
    }
    spans.push(Span::styled(format!("{}:", label), label_style));

    match app.conversation.copy_indicator() {
        Some((i, CopyOutcome::Copied)) if i == index => {
            spans.push(Span::styled(" ✓ copied", Style::default().fg(Color::Green)));
        }
        Some((i, CopyOutcome::Failed)) if i == index => {
            spans.push(Span::styled(" ✗ copy failed", Style::default().fg(Color::Red)));
        }
        _ => {}
    }

    Line::from(spans)
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut message_offsets: Vec<usize> = Vec::new();

    for (i, msg) in app.conversation.messages().iter().enumerate() {
        message_offsets.push(lines.len());
        lines.push(label_line(app, i, msg.role));
        match msg.role {
            ChatRole::User => {
                lines.extend(wrap_plain(&msg.text, inner.width, Style::default().fg(Color::Cyan)));
            }
            ChatRole::Assistant => {
                lines.extend(render_markdown(&msg.text, inner.width));
            }
        }
        lines.push(Line::default());
    }

    if app.conversation.is_awaiting_reply() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("AI is thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // Scroll bookkeeping for the app (inner size, borders excluded)
    app.chat_height = inner.height;
    app.total_chat_lines = lines.len().min(u16::MAX as usize) as u16;
    let max_scroll = app.total_chat_lines.saturating_sub(app.chat_height);

    if app.reveal_selected {
        if let Some(offset) = app.selected_message.and_then(|i| message_offsets.get(i)) {
            let offset = (*offset).min(u16::MAX as usize) as u16;
            if offset < app.chat_scroll || offset >= app.chat_scroll.saturating_add(app.chat_height) {
                app.chat_scroll = offset.min(max_scroll);
            }
            app.follow_bottom = false;
        }
        app.reveal_selected = false;
    }

    app.chat_scroll = if app.follow_bottom {
        max_scroll
    } else {
        app.chat_scroll.min(max_scroll)
    };

    if lines.is_empty() {
        let greeting = Paragraph::new(Text::from(vec![
            Line::default(),
            Line::from(Span::styled(TITLE, Style::default().fg(Color::Cyan).bold())),
            Line::from(Span::styled(
                "Type a message below and press Enter.",
                Style::default().fg(Color::DarkGray),
            )),
        ]))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(greeting, area);
        return;
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    if max_scroll > 0 {
        let mut scrollbar_state = ScrollbarState::new(max_scroll as usize)
            .position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    // Narrow prompt until the conversation starts, then widen.
    let width_pct = if app.conversation.messages().is_empty() { 60 } else { 90 };
    let [input_area] = Layout::horizontal([Constraint::Percentage(width_pct)])
        .flex(Flex::Center)
        .areas(area);

    let awaiting = app.conversation.is_awaiting_reply();
    let (border_color, title) = if awaiting {
        (Color::DarkGray, " Waiting for reply... ")
    } else {
        (Color::Yellow, " Message (Enter to send) ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let draft = app.conversation.draft_input();
    if draft.is_empty() {
        let placeholder = Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
            .block(input_block);
        frame.render_widget(placeholder, input_area);
        if !awaiting {
            frame.set_cursor_position((input_area.x + 1, input_area.y + 1));
        }
        return;
    }

    // Horizontal scrolling keeps the cursor visible (inner width excludes borders)
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_view(draft, app.conversation.draft_cursor(), inner_width);

    let text_color = if awaiting { Color::DarkGray } else { Color::Cyan };
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(input_block);
    frame.render_widget(input, input_area);

    if !awaiting {
        frame.set_cursor_position((input_area.x + cursor_x as u16 + 1, input_area.y + 1));
    }
}

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(1)
}

/// Slice of `draft` that fits in `width` columns with the cursor (a char
/// index) on screen, plus the cursor's column within that slice.
fn input_view(draft: &str, cursor: usize, width: usize) -> (String, usize) {
    let chars: Vec<char> = draft.chars().collect();
    let cursor = cursor.min(chars.len());

    // Leave one column for the cursor itself.
    let mut start = cursor;
    let mut before = 0;
    while start > 0 && before + char_width(chars[start - 1]) + 1 <= width {
        start -= 1;
        before += char_width(chars[start]);
    }

    let mut used = 0;
    let visible: String = chars[start..]
        .iter()
        .take_while(|&&c| {
            used += char_width(c);
            used <= width
        })
        .collect();

    (visible, before)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let awaiting = app.conversation.is_awaiting_reply();
    let (mode_text, mode_style) = if awaiting {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = Vec::new();
    if !awaiting {
        hints.extend(vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
        ]);
    }
    hints.extend(vec![
        Span::styled(" ↑/↓ ", key_style),
        Span::styled(" select ", label_style),
        Span::styled(" Ctrl-Y ", key_style),
        Span::styled(" copy ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
    ]);
    if app.selected_message.is_some() {
        hints.extend(vec![
            Span::styled(" Esc ", key_style),
            Span::styled(" unselect ", label_style),
        ]);
    }
    hints.extend(vec![
        Span::styled(" Ctrl-C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

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
