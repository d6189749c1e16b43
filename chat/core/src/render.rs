//! Turn Rendering
//!
//! Projects the conversation log into styled lines that any surface can
//! draw. Participant turns are shown exactly as typed. Assistant turns are
//! parsed as GitHub-flavoured Markdown (paragraphs, headings, emphasis,
//! lists, task lists, quotes, code, links, images, and tables).
//!
//! Server text is data. Raw HTML in an answer comes out as literal text
//! with [`SpanKind::Literal`]; nothing is interpreted beyond Markdown
//! structure.
//!
//! Rendering is pure: the same log always renders to the same lines.

use pulldown_cmark::{Alignment, Event, Options, Parser, Tag};
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::messages::Origin;
use crate::session::{ConversationLog, Turn};

/// Rule drawn for a thematic break
const RULE_WIDTH: usize = 24;

/// What a span represents, for surfaces that color by role
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum SpanKind {
    /// Body text
    #[default]
    Text,
    /// Heading text
    Heading,
    /// Inline or block code
    Code,
    /// Link text or destination
    Link,
    /// List bullets, numbers, task boxes, image brackets
    Marker,
    /// Table and rule drawing characters
    Border,
    /// Block quote bar
    Quote,
    /// Raw HTML shown verbatim
    Literal,
}

/// Visual attributes of a span
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SpanStyle {
    /// Role of the span
    pub kind: SpanKind,
    /// Strong emphasis
    pub bold: bool,
    /// Emphasis
    pub italic: bool,
    /// Struck through
    pub strikethrough: bool,
}

impl SpanStyle {
    fn of(kind: SpanKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }
}

/// A run of text sharing one style
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StyledSpan {
    /// The text
    pub text: String,
    /// How to draw it
    pub style: SpanStyle,
}

impl StyledSpan {
    /// Create a span
    pub fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Terminal display width
    #[must_use]
    pub fn width(&self) -> usize {
        self.text.width()
    }
}

/// One output line
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenderedLine {
    /// Spans left to right
    pub spans: Vec<StyledSpan>,
}

impl RenderedLine {
    fn from_spans(spans: Vec<StyledSpan>) -> Self {
        let mut merged: Vec<StyledSpan> = Vec::with_capacity(spans.len());
        for span in spans.into_iter().filter(|s| !s.text.is_empty()) {
            match merged.last_mut() {
                Some(last) if last.style == span.style => last.text.push_str(&span.text),
                _ => merged.push(span),
            }
        }
        Self { spans: merged }
    }

    /// Text without styling
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Terminal display width
    #[must_use]
    pub fn width(&self) -> usize {
        self.spans.iter().map(StyledSpan::width).sum()
    }

    /// Whether the line has no visible content
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.spans.iter().all(|s| s.text.trim().is_empty())
    }
}

/// A turn ready for display
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedTurn {
    /// Who authored the turn
    pub origin: Origin,
    /// Display lines
    pub lines: Vec<RenderedLine>,
}

impl RenderedTurn {
    /// Lines joined with newlines, without styling
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(RenderedLine::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render every turn of a log
#[must_use]
pub fn render_log(log: &ConversationLog) -> Vec<RenderedTurn> {
    log.iter().map(render_turn).collect()
}

/// Render a single turn
#[must_use]
pub fn render_turn(turn: &Turn) -> RenderedTurn {
    let lines = match turn.origin() {
        Origin::Participant => render_plain(turn.content()),
        Origin::Assistant => render_markdown(turn.content()),
    };
    RenderedTurn {
        origin: turn.origin(),
        lines,
    }
}

/// Render text verbatim, one line per input line
#[must_use]
pub fn render_plain(text: &str) -> Vec<RenderedLine> {
    text.lines()
        .map(|line| RenderedLine::from_spans(vec![StyledSpan::new(line, SpanStyle::default())]))
        .collect()
}

/// Render Markdown into styled lines
#[must_use]
pub fn render_markdown(text: &str) -> Vec<RenderedLine> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut writer = MarkdownWriter::default();
    for event in Parser::new_ext(text, options) {
        writer.event(event);
    }
    writer.finish()
}

/// Open container, popped on the matching end event
enum Frame {
    Paragraph,
    Heading,
    BlockQuote,
    CodeBlock,
    HtmlBlock,
    List,
    Item,
    Table,
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link,
    Image,
    Other,
}

struct ItemFrame {
    /// Bullet or number not yet drawn
    marker: Option<String>,
    /// Indent for continuation lines
    width: usize,
}

struct LinkFrame {
    dest: String,
    text: String,
}

#[derive(Default)]
struct MarkdownWriter {
    lines: Vec<RenderedLine>,
    current: Vec<StyledSpan>,
    frames: Vec<Frame>,
    strong: usize,
    emphasis: usize,
    strikethrough: usize,
    heading: bool,
    code_block: bool,
    quote_depth: usize,
    /// Next number for each open list, `None` for bullets
    lists: Vec<Option<u64>>,
    items: Vec<ItemFrame>,
    link: Option<LinkFrame>,
    table: Option<TableBuilder>,
}

impl MarkdownWriter {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => {
                if let Some(frame) = self.frames.pop() {
                    self.end(frame);
                }
            }
            Event::Text(text) => {
                if self.code_block {
                    self.push_multiline(&text, SpanStyle::of(SpanKind::Code), true);
                } else {
                    if let Some(link) = self.link.as_mut() {
                        link.text.push_str(&text);
                    }
                    self.push(&text, self.style());
                }
            }
            Event::Code(code) => self.push(
                &code,
                SpanStyle {
                    kind: SpanKind::Code,
                    ..self.style()
                },
            ),
            Event::Html(html) | Event::InlineHtml(html) => {
                self.push_multiline(&html, SpanStyle::of(SpanKind::Literal), false);
            }
            Event::FootnoteReference(label) => {
                self.push(&format!("[^{label}]"), SpanStyle::of(SpanKind::Marker));
            }
            Event::SoftBreak => self.push(" ", self.style()),
            Event::HardBreak => self.flush(false),
            Event::Rule => {
                self.flush(false);
                self.push(&"─".repeat(RULE_WIDTH), SpanStyle::of(SpanKind::Border));
                self.flush(false);
                self.end_block();
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push(marker, SpanStyle::of(SpanKind::Marker));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph,
            Tag::Heading { .. } => {
                self.flush(false);
                self.heading = true;
                Frame::Heading
            }
            Tag::BlockQuote(_) => {
                self.flush(false);
                self.quote_depth += 1;
                Frame::BlockQuote
            }
            Tag::CodeBlock(_) => {
                self.flush(false);
                self.code_block = true;
                Frame::CodeBlock
            }
            Tag::HtmlBlock => {
                self.flush(false);
                Frame::HtmlBlock
            }
            Tag::List(start) => {
                self.flush(false);
                self.lists.push(start);
                Frame::List
            }
            Tag::Item => {
                self.flush(false);
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{next}. ");
                        *next += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.items.push(ItemFrame {
                    width: marker.width(),
                    marker: Some(marker),
                });
                Frame::Item
            }
            Tag::Table(alignments) => {
                self.flush(false);
                self.table = Some(TableBuilder::new(alignments));
                Frame::Table
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.start_row();
                }
                Frame::TableHead
            }
            Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.start_row();
                }
                Frame::TableRow
            }
            Tag::TableCell => Frame::TableCell,
            Tag::Emphasis => {
                self.emphasis += 1;
                Frame::Emphasis
            }
            Tag::Strong => {
                self.strong += 1;
                Frame::Strong
            }
            Tag::Strikethrough => {
                self.strikethrough += 1;
                Frame::Strikethrough
            }
            Tag::Link { dest_url, .. } => {
                self.link = Some(LinkFrame {
                    dest: dest_url.to_string(),
                    text: String::new(),
                });
                Frame::Link
            }
            Tag::Image { .. } => {
                self.push("[image: ", SpanStyle::of(SpanKind::Marker));
                Frame::Image
            }
            _ => Frame::Other,
        };
        self.frames.push(frame);
    }

    fn end(&mut self, frame: Frame) {
        match frame {
            Frame::Paragraph => {
                self.flush(false);
                if self.items.is_empty() {
                    self.end_block();
                }
            }
            Frame::Heading => {
                self.flush(false);
                self.heading = false;
                self.end_block();
            }
            Frame::BlockQuote => {
                self.flush(false);
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.end_block();
            }
            Frame::CodeBlock => {
                self.flush(false);
                self.code_block = false;
                if self.items.is_empty() {
                    self.end_block();
                }
            }
            Frame::HtmlBlock => {
                self.flush(false);
                if self.items.is_empty() {
                    self.end_block();
                }
            }
            Frame::List => {
                self.flush(false);
                self.lists.pop();
                if self.lists.is_empty() {
                    self.end_block();
                }
            }
            Frame::Item => {
                self.flush(false);
                self.items.pop();
            }
            Frame::Table => {
                if let Some(table) = self.table.take() {
                    for spans in table.layout() {
                        let mut line = self.prefix();
                        line.extend(spans);
                        self.lines.push(RenderedLine::from_spans(line));
                    }
                }
                self.end_block();
            }
            Frame::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row(true);
                }
            }
            Frame::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row(false);
                }
            }
            Frame::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_cell();
                }
            }
            Frame::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            Frame::Strong => self.strong = self.strong.saturating_sub(1),
            Frame::Strikethrough => self.strikethrough = self.strikethrough.saturating_sub(1),
            Frame::Link => {
                if let Some(link) = self.link.take() {
                    if !link.dest.is_empty() && link.dest != link.text {
                        self.push(&format!(" ({})", link.dest), SpanStyle::of(SpanKind::Marker));
                    }
                }
            }
            Frame::Image => self.push("]", SpanStyle::of(SpanKind::Marker)),
            Frame::Other => {}
        }
    }

    /// Style for inline text at the current nesting
    fn style(&self) -> SpanStyle {
        let kind = if self.heading {
            SpanKind::Heading
        } else if self.link.is_some() {
            SpanKind::Link
        } else {
            SpanKind::Text
        };
        SpanStyle {
            kind,
            bold: self.strong > 0 || self.heading,
            italic: self.emphasis > 0,
            strikethrough: self.strikethrough > 0,
        }
    }

    fn push(&mut self, text: &str, style: SpanStyle) {
        let span = StyledSpan::new(text, style);
        match self.table.as_mut() {
            Some(table) => table.push(span),
            None => self.current.push(span),
        }
    }

    /// Push text that may contain newlines, breaking lines at each one
    fn push_multiline(&mut self, text: &str, style: SpanStyle, keep_empty: bool) {
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.flush(keep_empty);
            }
            if !part.is_empty() {
                self.push(part, style);
            }
        }
    }

    /// Prefix for a new line: quote bars, list indentation, pending markers
    fn prefix(&mut self) -> Vec<StyledSpan> {
        let mut spans = Vec::new();
        if self.quote_depth > 0 {
            spans.push(StyledSpan::new(
                "│ ".repeat(self.quote_depth),
                SpanStyle::of(SpanKind::Quote),
            ));
        }
        for item in &mut self.items {
            match item.marker.take() {
                Some(marker) => spans.push(StyledSpan::new(marker, SpanStyle::of(SpanKind::Marker))),
                None => spans.push(StyledSpan::new(" ".repeat(item.width), SpanStyle::default())),
            }
        }
        if self.code_block {
            spans.push(StyledSpan::new("  ", SpanStyle::default()));
        }
        spans
    }

    /// End the line under construction
    fn flush(&mut self, keep_empty: bool) {
        if self.current.is_empty() && !keep_empty {
            return;
        }
        let mut spans = self.prefix();
        spans.append(&mut self.current);
        self.lines.push(RenderedLine::from_spans(spans));
    }

    /// Separate top-level blocks with one blank line
    fn end_block(&mut self) {
        if self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(RenderedLine::default());
        }
    }

    fn finish(mut self) -> Vec<RenderedLine> {
        self.flush(false);
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

type Cell = Vec<StyledSpan>;

/// Collects table cells, then lays them out with box-drawing borders
struct TableBuilder {
    alignments: Vec<Alignment>,
    rows: Vec<(bool, Vec<Cell>)>,
    row: Vec<Cell>,
    cell: Cell,
}

impl TableBuilder {
    fn new(alignments: Vec<Alignment>) -> Self {
        Self {
            alignments,
            rows: Vec::new(),
            row: Vec::new(),
            cell: Vec::new(),
        }
    }

    fn start_row(&mut self) {
        self.row.clear();
        self.cell.clear();
    }

    fn push(&mut self, span: StyledSpan) {
        self.cell.push(span);
    }

    fn finish_cell(&mut self) {
        let cell = std::mem::take(&mut self.cell);
        self.row.push(cell);
    }

    fn finish_row(&mut self, header: bool) {
        let mut row = std::mem::take(&mut self.row);
        if header {
            for span in row.iter_mut().flatten() {
                span.style.bold = true;
            }
        }
        self.rows.push((header, row));
    }

    fn layout(&self) -> Vec<Vec<StyledSpan>> {
        let columns = self
            .rows
            .iter()
            .map(|(_, row)| row.len())
            .max()
            .unwrap_or(0)
            .max(self.alignments.len());
        if columns == 0 {
            return Vec::new();
        }

        let mut widths = vec![0usize; columns];
        for (_, row) in &self.rows {
            for (col, cell) in row.iter().enumerate() {
                let width: usize = cell.iter().map(StyledSpan::width).sum();
                widths[col] = widths[col].max(width);
            }
        }

        let mut lines = vec![border_line(&widths, '┌', '┬', '┐')];
        for (i, (header, row)) in self.rows.iter().enumerate() {
            lines.push(self.row_line(row, &widths));
            let more = i + 1 < self.rows.len();
            if *header && more {
                lines.push(border_line(&widths, '├', '┼', '┤'));
            }
        }
        lines.push(border_line(&widths, '└', '┴', '┘'));
        lines
    }

    fn row_line(&self, row: &[Cell], widths: &[usize]) -> Vec<StyledSpan> {
        let border = SpanStyle::of(SpanKind::Border);
        let mut spans = vec![StyledSpan::new("│", border)];
        for (col, width) in widths.iter().enumerate() {
            let cell = row.get(col).map(Vec::as_slice).unwrap_or_default();
            let used: usize = cell.iter().map(StyledSpan::width).sum();
            let slack = width.saturating_sub(used);
            let (left, right) = match self.alignments.get(col) {
                Some(Alignment::Right) => (slack, 0),
                Some(Alignment::Center) => (slack / 2, slack - slack / 2),
                _ => (0, slack),
            };
            spans.push(StyledSpan::new(" ".repeat(left + 1), SpanStyle::default()));
            spans.extend(cell.iter().cloned());
            spans.push(StyledSpan::new(" ".repeat(right + 1), SpanStyle::default()));
            spans.push(StyledSpan::new("│", border));
        }
        spans
    }
}

fn border_line(widths: &[usize], left: char, mid: char, right: char) -> Vec<StyledSpan> {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    let mid = mid.to_string();
    let text = format!("{left}{}{right}", segments.join(mid.as_str()));
    vec![StyledSpan::new(text, SpanStyle::of(SpanKind::Border))]
}
