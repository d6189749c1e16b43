//! TextBlock Widget
//!
//! A borderless, scrollable region of pre-wrapped styled lines, anchored to
//! the bottom so the newest content stays in view.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::StatefulWidget;

/// State for a scrollable text block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBlockState {
    /// Scroll offset (lines from bottom, 0 = latest)
    pub scroll_offset: usize,
    /// Total content lines
    pub total_lines: usize,
    /// Visible rows at last render
    pub viewport: usize,
}

impl TextBlockState {
    /// Scroll towards older content
    pub fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.max_scroll();
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    /// Scroll towards newer content
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Jump to the newest content
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Half a viewport, at least one line
    #[must_use]
    pub fn page(&self) -> usize {
        (self.viewport / 2).max(1)
    }

    fn max_scroll(&self) -> usize {
        self.total_lines.saturating_sub(self.viewport)
    }
}

/// A borderless, scrollable text block
pub struct TextBlock<'a> {
    lines: &'a [Line<'a>],
}

impl<'a> TextBlock<'a> {
    /// Create a block over already wrapped lines
    #[must_use]
    pub fn new(lines: &'a [Line<'a>]) -> Self {
        Self { lines }
    }
}

impl StatefulWidget for TextBlock<'_> {
    type State = TextBlockState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let height = area.height as usize;
        state.total_lines = self.lines.len();
        state.viewport = height;

        // Clamp scroll
        state.scroll_offset = state.scroll_offset.min(state.max_scroll());

        let visible_end = state.total_lines.saturating_sub(state.scroll_offset);
        let visible_start = visible_end.saturating_sub(height);

        for (i, line) in self.lines[visible_start..visible_end].iter().enumerate() {
            let Ok(offset) = u16::try_from(i) else { break };
            buf.set_line(area.x, area.y + offset, line, area.width);
        }
    }
}
