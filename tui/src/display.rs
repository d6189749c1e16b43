//! Display State Types
//!
//! Types that represent what the chat screen shows. They are derived from
//! [`ChatEvent`]s and the controller's log, and turned into wrapped ratatui
//! lines at render time.
//!
//! - [`DisplayState`]: rendered turns, lifecycle flag, spinner
//! - [`wrap_spans`]: width-aware wrapping of styled spans
//! - [`transcript`]: plain-text conversation for headless output

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use textwrap::core::{break_words, Fragment, Word};
use textwrap::wrap_algorithms::wrap_first_fit;
use textwrap::WordSeparator;

use nutri_chat_core::render::render_turn;
use nutri_chat_core::{
    AnswerKind, ChatEvent, ConversationLog, ControllerState, Origin, RenderedTurn, SpanStyle,
    StyledSpan,
};

use crate::theme::{origin_style, span_style};

/// Braille spinner shown while awaiting an answer
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Indent of turn content under its speaker label
const CONTENT_INDENT: &str = "  ";

/// Everything the chat screen needs to draw the conversation
#[derive(Clone, Debug, Default)]
pub struct DisplayState {
    /// Rendered turns, in log order
    pub turns: Vec<RenderedTurn>,
    /// Current lifecycle flag
    pub state: ControllerState,
    /// How the latest assistant turn came about
    pub last_answer: Option<AnswerKind>,
    /// Spinner frame counter
    spinner_tick: usize,
}

impl DisplayState {
    /// Create empty display state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a controller event, reading new turns from the log
    pub fn apply_event(&mut self, event: &ChatEvent, log: &ConversationLog) {
        match event {
            ChatEvent::TurnAppended { index, answer, .. } => {
                let Some(turn) = log.get(*index) else {
                    tracing::warn!(index, "Event for a turn missing from the log");
                    return;
                };
                let rendered = render_turn(turn);
                if *index < self.turns.len() {
                    self.turns[*index] = rendered;
                } else {
                    self.turns.push(rendered);
                }
                if answer.is_some() {
                    self.last_answer = *answer;
                }
            }
            ChatEvent::State { state } => {
                self.state = *state;
                self.spinner_tick = 0;
            }
        }
    }

    /// Advance animations by one frame
    pub fn tick(&mut self) {
        if self.state.is_awaiting() {
            self.spinner_tick = self.spinner_tick.wrapping_add(1);
        }
    }

    /// Current spinner frame
    #[must_use]
    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_tick % SPINNER_FRAMES.len()]
    }

    /// Wrapped, styled lines of the whole conversation
    #[must_use]
    pub fn conversation_lines(&self, width: usize) -> Vec<Line<'static>> {
        let content_width = width.saturating_sub(CONTENT_INDENT.len()).max(1);
        let mut lines = Vec::new();

        for turn in &self.turns {
            lines.push(Line::from(Span::styled(
                turn.origin.label(),
                origin_style(turn.origin),
            )));

            for line in &turn.lines {
                for row in wrap_spans(&line.spans, content_width) {
                    lines.push(styled_row(turn.origin, row));
                }
            }

            lines.push(Line::default());
        }

        lines
    }
}

fn styled_row(origin: Origin, row: Vec<StyledSpan>) -> Line<'static> {
    let mut spans = Vec::with_capacity(row.len() + 1);
    spans.push(Span::styled(CONTENT_INDENT, Style::default()));
    spans.extend(
        row.into_iter()
            .map(|s| Span::styled(s.text, span_style(origin, s.style))),
    );
    Line::from(spans)
}

/// A word of one styled span, laid out by textwrap
#[derive(Debug)]
struct StyledWord<'a> {
    word: Word<'a>,
    style: SpanStyle,
}

impl Fragment for StyledWord<'_> {
    fn width(&self) -> f64 {
        self.word.width()
    }

    fn whitespace_width(&self) -> f64 {
        self.word.whitespace_width()
    }

    fn penalty_width(&self) -> f64 {
        self.word.penalty_width()
    }
}

/// Wrap styled spans to `width` columns
///
/// Breaks at spaces where possible and splits words wider than a whole row.
/// Leading spaces of the first row (indentation, code) are kept; spaces at
/// the end of a row are dropped. An empty input yields one empty row.
#[must_use]
pub fn wrap_spans(spans: &[StyledSpan], width: usize) -> Vec<Vec<StyledSpan>> {
    let width = width.max(1);

    let words: Vec<StyledWord> = spans
        .iter()
        .flat_map(|span| {
            let found = WordSeparator::AsciiSpace.find_words(&span.text);
            break_words(found, width)
                .into_iter()
                .map(move |word| StyledWord {
                    word,
                    style: span.style,
                })
        })
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let line_widths = [width as f64];

    wrap_first_fit(&words, &line_widths)
        .into_iter()
        .enumerate()
        .map(|(row_index, line)| {
            let mut row = Vec::new();
            let last = line.len().saturating_sub(1);
            for (i, styled) in line.iter().enumerate() {
                let word = &styled.word;
                if row_index > 0 && row.is_empty() && word.word.is_empty() {
                    continue;
                }
                push_text(&mut row, word.word, styled.style);
                let tail = if i == last { word.penalty } else { word.whitespace };
                push_text(&mut row, tail, styled.style);
            }
            row
        })
        .collect()
}

fn push_text(row: &mut Vec<StyledSpan>, text: &str, style: SpanStyle) {
    if text.is_empty() {
        return;
    }
    match row.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => row.push(StyledSpan::new(text, style)),
    }
}

/// Conversation as plain text, one labelled block per turn
#[must_use]
pub fn transcript(turns: &[RenderedTurn]) -> String {
    turns
        .iter()
        .map(|turn| {
            let body = turn
                .plain_text()
                .lines()
                .map(|l| format!("{CONTENT_INDENT}{l}").trim_end().to_string())
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}:\n{body}\n", turn.origin.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutri_chat_core::{render_markdown, render_plain, SpanKind};
    use pretty_assertions::assert_eq;

    fn texts(rows: &[Vec<StyledSpan>]) -> Vec<String> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.text.as_str()).collect())
            .collect()
    }

    fn plain(text: &str) -> Vec<StyledSpan> {
        vec![StyledSpan::new(text, SpanStyle::default())]
    }

    #[test]
    fn test_wrap_at_word_boundaries() {
        let rows = wrap_spans(&plain("eat more leafy greens daily"), 10);
        assert_eq!(texts(&rows), vec!["eat more", "leafy", "greens", "daily"]);
    }

    #[test]
    fn test_wrap_rows_fit_width() {
        let text = "a balanced plate is half vegetables, a quarter protein and a quarter grains";
        for width in [5, 9, 13, 20] {
            for row in texts(&wrap_spans(&plain(text), width)) {
                assert!(row.chars().count() <= width, "{row:?} wider than {width}");
                assert!(!row.starts_with(' '), "{row:?} starts with a space");
            }
        }
    }

    #[test]
    fn test_wrap_across_styled_spans() {
        let bold = SpanStyle {
            bold: true,
            ..SpanStyle::default()
        };
        let spans = vec![
            StyledSpan::new("eat ", SpanStyle::default()),
            StyledSpan::new("more fibre", bold),
            StyledSpan::new(" daily", SpanStyle::default()),
        ];
        let rows = wrap_spans(&spans, 9);
        assert_eq!(texts(&rows), vec!["eat more", "fibre", "daily"]);
        assert_eq!(rows[0][1], StyledSpan::new("more", bold));
        assert_eq!(rows[1][0].style, bold);
    }

    #[test]
    fn test_wrap_keeps_first_row_indent() {
        let rows = wrap_spans(&plain("  let x = 1;"), 40);
        assert_eq!(texts(&rows), vec!["  let x = 1;"]);
    }

    #[test]
    fn test_wrap_splits_long_word() {
        let rows = wrap_spans(&plain("abcdefghij"), 4);
        assert_eq!(texts(&rows), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_counts_wide_chars() {
        let rows = wrap_spans(&plain("食物食物"), 4);
        assert_eq!(texts(&rows), vec!["食物", "食物"]);
    }

    #[test]
    fn test_wrap_preserves_styles() {
        let bold = SpanStyle {
            bold: true,
            ..SpanStyle::default()
        };
        let spans = vec![
            StyledSpan::new("Protein ", SpanStyle::default()),
            StyledSpan::new("matters", bold),
        ];
        let rows = wrap_spans(&spans, 40);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1].style, bold);
    }

    #[test]
    fn test_empty_line_is_one_row() {
        assert_eq!(wrap_spans(&[], 10), vec![Vec::<StyledSpan>::new()]);
    }

    #[test]
    fn test_apply_events() {
        let mut log = ConversationLog::new();
        let mut display = DisplayState::new();

        // Build the log the way the controller does, then replay events
        let turns = [
            nutri_chat_core::Turn::participant("hi"),
            nutri_chat_core::Turn::assistant("# Plan"),
        ];
        for (index, turn) in turns.iter().enumerate() {
            log = push(log, turn.clone());
            display.apply_event(
                &ChatEvent::TurnAppended {
                    index,
                    origin: turn.origin(),
                    answer: (index == 1).then_some(AnswerKind::Answered),
                },
                &log,
            );
        }

        assert_eq!(display.turns.len(), 2);
        assert_eq!(display.turns[1].lines[0].spans[0].style.kind, SpanKind::Heading);
        assert_eq!(display.last_answer, Some(AnswerKind::Answered));

        display.apply_event(
            &ChatEvent::State {
                state: ControllerState::Awaiting,
            },
            &log,
        );
        let first = display.spinner();
        display.tick();
        assert_ne!(display.spinner(), first);
    }

    fn push(log: ConversationLog, turn: nutri_chat_core::Turn) -> ConversationLog {
        let mut turns: Vec<_> = log.iter().cloned().collect();
        turns.push(turn);
        turns.into_iter().collect()
    }

    #[test]
    fn test_missing_turn_is_ignored() {
        let mut display = DisplayState::new();
        display.apply_event(
            &ChatEvent::TurnAppended {
                index: 3,
                origin: Origin::Assistant,
                answer: Some(AnswerKind::Failed),
            },
            &ConversationLog::new(),
        );
        assert!(display.turns.is_empty());
    }

    #[test]
    fn test_conversation_lines_layout() {
        let display = DisplayState {
            turns: vec![RenderedTurn {
                origin: Origin::Participant,
                lines: render_plain("What is a macro?"),
            }],
            ..DisplayState::default()
        };

        let lines = display.conversation_lines(40);
        let text: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(text, vec!["You", "  What is a macro?", ""]);
    }

    #[test]
    fn test_transcript() {
        let turns = vec![
            RenderedTurn {
                origin: Origin::Participant,
                lines: render_plain("breakfast?"),
            },
            RenderedTurn {
                origin: Origin::Assistant,
                lines: render_markdown("- oats\n- eggs"),
            },
        ];

        assert_eq!(
            transcript(&turns),
            "You:\n  breakfast?\n\nNutritionist:\n  • oats\n  • eggs\n"
        );
    }
}
