//! Markdown to styled terminal lines.
//!
//! Replies are pre-wrapped to the chat pane width here so the UI can count
//! rendered lines exactly (needed for scroll-to-bottom).

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const BULLET: &str = "• ";
const QUOTE_BAR: &str = "│ ";
const RULE_CHAR: &str = "─";

pub fn render_markdown(md: &str, width: u16) -> Vec<Line<'static>> {
    let mut renderer = MarkdownRenderer::new(width);
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    for event in Parser::new_ext(md, options) {
        renderer.handle(event);
    }
    renderer.finish()
}

/// Wrap plain text (user messages) to `width` columns, keeping explicit newlines.
pub fn wrap_plain(text: &str, width: u16, style: Style) -> Vec<Line<'static>> {
    let mut renderer = MarkdownRenderer::new(width);
    for line in text.split('\n') {
        if line.is_empty() {
            renderer.lines.push(Line::default());
            continue;
        }
        renderer.push_text(line, style);
        renderer.break_line();
    }
    renderer.lines
}

struct MarkdownRenderer {
    width: usize,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    col: usize,
    styles: Vec<Style>,
    // None = bullet list, Some(n) = ordered list with next number n
    lists: Vec<Option<u64>>,
    hangs: Vec<usize>,
    quote_depth: usize,
    in_code_block: bool,
}

impl MarkdownRenderer {
    fn new(width: u16) -> Self {
        Self {
            width: if width == 0 { 80 } else { width as usize },
            lines: Vec::new(),
            spans: Vec::new(),
            col: 0,
            styles: vec![Style::default()],
            lists: Vec::new(),
            hangs: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
        }
    }

    fn style(&self) -> Style {
        *self.styles.last().unwrap_or(&Style::default())
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let style = self.style().add_modifier(modifier);
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                self.break_line();
                self.blank_line();
            }
            Event::Start(Tag::Heading { level, .. }) => {
                self.break_line();
                self.styles.push(heading_style(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                self.pop_style();
                self.break_line();
                self.blank_line();
            }
            Event::Start(Tag::Strong) => self.push_modifier(Modifier::BOLD),
            Event::Start(Tag::Emphasis) => self.push_modifier(Modifier::ITALIC),
            Event::Start(Tag::Strikethrough) => self.push_modifier(Modifier::CROSSED_OUT),
            Event::Start(Tag::Link { .. }) => {
                let style = self.style().fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
                self.styles.push(style);
            }
            Event::End(TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough | TagEnd::Link) => {
                self.pop_style();
            }
            Event::Start(Tag::CodeBlock(_)) => {
                self.break_line();
                self.in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                self.break_line();
                self.in_code_block = false;
                self.blank_line();
            }
            Event::Start(Tag::List(start)) => {
                self.break_line();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.break_line();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            Event::Start(Tag::Item) => self.start_item(),
            Event::End(TagEnd::Item) => {
                self.break_line();
                self.hangs.pop();
            }
            Event::Start(Tag::BlockQuote(_)) => {
                self.break_line();
                self.quote_depth += 1;
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                self.break_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank_line();
            }
            Event::Text(text) => {
                if self.in_code_block {
                    self.push_code_block(&text);
                } else {
                    let style = self.style();
                    self.push_text(&text, style);
                }
            }
            Event::Code(code) => {
                let style = Style::default().fg(Color::Yellow).bg(Color::DarkGray);
                self.push_text(&format!("`{}`", code), style);
            }
            Event::TaskListMarker(done) => {
                let style = self.style();
                self.push_text(if done { "[x] " } else { "[ ] " }, style);
            }
            Event::SoftBreak => {
                let style = self.style();
                self.push_text(" ", style);
            }
            Event::HardBreak => self.break_line(),
            Event::Rule => {
                self.break_line();
                self.lines.push(Line::from(Span::styled(
                    RULE_CHAR.repeat(self.width),
                    Style::default().fg(Color::DarkGray),
                )));
                self.blank_line();
            }
            _ => {}
        }
    }

    fn start_item(&mut self) {
        self.break_line();
        let indent = "  ".repeat(self.lists.len().saturating_sub(1));
        let marker = match self.lists.last_mut() {
            Some(Some(n)) => {
                let marker = format!("{}. ", n);
                *n += 1;
                marker
            }
            _ => BULLET.to_string(),
        };

        self.begin_line();
        let item_prefix = format!("{}{}", indent, marker);
        self.col += item_prefix.width();
        self.spans.push(Span::styled(item_prefix, Style::default().fg(Color::Cyan)));
        self.hangs.push(self.col - self.quote_prefix_width());
    }

    fn quote_prefix_width(&self) -> usize {
        QUOTE_BAR.width() * self.quote_depth
    }

    /// Start a fresh line with the quote bars and list hang for the current nesting.
    fn begin_line(&mut self) {
        self.col = 0;
        if self.quote_depth > 0 {
            let bars = QUOTE_BAR.repeat(self.quote_depth);
            self.col += bars.width();
            self.spans.push(Span::styled(bars, Style::default().fg(Color::DarkGray)));
        }
    }

    fn continue_line(&mut self) {
        self.begin_line();
        let hang = self.hangs.last().copied().unwrap_or(0);
        if hang > 0 {
            self.spans.push(Span::raw(" ".repeat(hang)));
            self.col += hang;
        }
    }

    fn line_is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    fn break_line(&mut self) {
        // Trailing spaces left by word splitting do not count toward the width.
        if let Some(last) = self.spans.last_mut() {
            if last.content.ends_with(' ') {
                let trimmed = last.content.trim_end_matches(' ').to_string();
                last.content = trimmed.into();
            }
        }
        if !self.line_is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
        self.col = 0;
    }

    fn blank_line(&mut self) {
        let last_is_blank = self.lines.last().map(|l| l.width() == 0).unwrap_or(true);
        if !last_is_blank {
            self.lines.push(Line::default());
        }
    }

    fn push_text(&mut self, text: &str, style: Style) {
        let mut buf = String::new();
        let mut line_started = !self.line_is_empty();

        for word in text.split_inclusive(' ') {
            if !line_started {
                self.continue_line();
                line_started = true;
            }

            let word_width = word.trim_end_matches(' ').width();
            let line_start = self.quote_prefix_width() + self.hangs.last().copied().unwrap_or(0);
            if self.col + word_width > self.width && self.col > line_start {
                if !buf.is_empty() {
                    self.spans.push(Span::styled(std::mem::take(&mut buf), style));
                }
                self.break_line();
                self.continue_line();
                if word.trim().is_empty() {
                    continue;
                }
            }

            if self.col + word_width > self.width {
                // A single word wider than the pane: split it across lines.
                for c in word.chars() {
                    let w = c.width().unwrap_or(0);
                    if self.col + w > self.width && self.col > line_start {
                        self.spans.push(Span::styled(std::mem::take(&mut buf), style));
                        self.break_line();
                        self.continue_line();
                    }
                    buf.push(c);
                    self.col += w;
                }
            } else {
                buf.push_str(word);
                self.col += word.width();
            }
        }

        if !buf.is_empty() {
            self.spans.push(Span::styled(buf, style));
        }
    }

    fn push_code_block(&mut self, text: &str) {
        let style = Style::default().fg(Color::Cyan);
        for segment in text.split_inclusive('\n') {
            let content = segment.trim_end_matches('\n');
            if self.line_is_empty() {
                self.continue_line();
            }

            let mut buf = String::new();
            for c in content.chars() {
                let w = c.width().unwrap_or(0);
                if self.col + w > self.width && !buf.is_empty() {
                    self.spans.push(Span::styled(std::mem::take(&mut buf), style));
                    self.break_line();
                    self.continue_line();
                }
                buf.push(c);
                self.col += w;
            }
            self.spans.push(Span::styled(buf, style));

            if segment.ends_with('\n') {
                self.break_line();
            }
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.break_line();
        while self.lines.last().map(|l| l.width() == 0).unwrap_or(false) {
            self.lines.pop();
        }
        self.lines
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD),
        HeadingLevel::H2 => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        HeadingLevel::H3 => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        _ => Style::default().add_modifier(Modifier::BOLD),
    }
}
