//! Theme and Colors
//!
//! Palette for the nutrition assistant: leafy greens for the participant,
//! warm orange for the assistant, muted grays for chrome.

use ratatui::style::{Color, Modifier, Style};

use nutri_chat_core::{Origin, SpanKind, SpanStyle};

// ============================================================================
// Conversation Colors
// ============================================================================

/// Participant turns - leaf green
pub const PARTICIPANT_GREEN: Color = Color::Rgb(130, 220, 130);

/// Assistant turns - carrot orange
pub const ASSISTANT_ORANGE: Color = Color::Rgb(255, 170, 90);

/// Assistant body text
pub const ASSISTANT_TEXT: Color = Color::Rgb(235, 235, 225);

/// Headings inside answers
pub const HEADING_GOLD: Color = Color::Rgb(255, 215, 120);

/// Inline and block code
pub const CODE_TEAL: Color = Color::Rgb(120, 210, 200);

/// Link text
pub const LINK_BLUE: Color = Color::Rgb(120, 170, 255);

/// List markers, table borders, quote bars
pub const MARKER_GRAY: Color = Color::Rgb(150, 150, 150);

// ============================================================================
// UI Colors
// ============================================================================

/// Header title
pub const TITLE_GREEN: Color = Color::Rgb(90, 190, 110);

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Alert border
pub const ALERT_YELLOW: Color = Color::Rgb(255, 223, 128);

/// Focused form field
pub const FOCUS_GREEN: Color = Color::Rgb(120, 230, 120);

/// Label style for a turn's speaker
#[must_use]
pub fn origin_style(origin: Origin) -> Style {
    let color = match origin {
        Origin::Participant => PARTICIPANT_GREEN,
        Origin::Assistant => ASSISTANT_ORANGE,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Terminal style for a rendered span
#[must_use]
pub fn span_style(origin: Origin, style: SpanStyle) -> Style {
    let base = match origin {
        Origin::Participant => PARTICIPANT_GREEN,
        Origin::Assistant => ASSISTANT_TEXT,
    };

    let mut out = match style.kind {
        SpanKind::Text | SpanKind::Literal => Style::default().fg(base),
        SpanKind::Heading => Style::default()
            .fg(HEADING_GOLD)
            .add_modifier(Modifier::BOLD),
        SpanKind::Code => Style::default().fg(CODE_TEAL),
        SpanKind::Link => Style::default()
            .fg(LINK_BLUE)
            .add_modifier(Modifier::UNDERLINED),
        SpanKind::Marker | SpanKind::Border => Style::default().fg(MARKER_GRAY),
        SpanKind::Quote => Style::default().fg(DIM_GRAY).add_modifier(Modifier::ITALIC),
    };

    if style.bold {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.italic {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.strikethrough {
        out = out.add_modifier(Modifier::CROSSED_OUT);
    }
    out
}
