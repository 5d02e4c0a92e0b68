//! Windowed rendering for long row lists.
//!
//! Below `enable_threshold` rows every row is rendered in natural flow.
//! Above it, only the rows in view plus `buffer_rows` on each side are
//! materialized, each placed at `index * row_height`, with a spacer of
//! `row_count * row_height` standing in for the full list.

/// Default height of one row, in scroll units (one terminal line).
pub const DEFAULT_ROW_HEIGHT: u32 = 1;
/// Default number of extra rows materialized above and below the viewport.
pub const DEFAULT_BUFFER_ROWS: usize = 10;
/// Default row count above which windowing kicks in.
pub const DEFAULT_ENABLE_THRESHOLD: usize = 100;

/// Virtualizer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualizerConfig {
    pub row_height: u32,
    pub buffer_rows: usize,
    pub enable_threshold: usize,
}

impl Default for VirtualizerConfig {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            buffer_rows: DEFAULT_BUFFER_ROWS,
            enable_threshold: DEFAULT_ENABLE_THRESHOLD,
        }
    }
}

/// Half-open `[start, end)` range of materialized rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibleWindow {
    pub start: usize,
    pub end: usize,
}

impl VisibleWindow {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// How rows are laid out for the current row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// All rows in natural flow, no offsets, no spacer.
    Natural,
    /// Only the window is materialized; the spacer carries the full height.
    Windowed { spacer_height: u64 },
}

/// Snapshot for status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualStats {
    pub total_rows: usize,
    pub materialized_rows: usize,
    pub enabled: bool,
    pub threshold: usize,
}

/// Compute the window for a given scroll position. Pure.
pub fn compute_window(
    config: &VirtualizerConfig,
    row_count: usize,
    scroll_top: u64,
    viewport_height: u64,
) -> VisibleWindow {
    if row_count <= config.enable_threshold {
        return VisibleWindow {
            start: 0,
            end: row_count,
        };
    }

    let row_height = u64::from(config.row_height.max(1));
    let first = (scroll_top / row_height) as usize;
    let last = (scroll_top + viewport_height).div_ceil(row_height) as usize;

    VisibleWindow {
        start: first.saturating_sub(config.buffer_rows),
        end: row_count.min(last.saturating_add(config.buffer_rows)),
    }
}

/// Scroll-driven window tracker.
///
/// Scroll requests are coalesced and only applied by [`Virtualizer::on_frame`],
/// so a burst of scroll events costs one recompute per frame.
#[derive(Debug)]
pub struct Virtualizer {
    config: VirtualizerConfig,
    row_count: usize,
    scroll_top: u64,
    viewport_height: u64,
    window: VisibleWindow,
    pending_scroll: Option<u64>,
    enabled: bool,
}

impl Virtualizer {
    pub fn new(config: VirtualizerConfig) -> Self {
        Self {
            config,
            row_count: 0,
            scroll_top: 0,
            viewport_height: 0,
            window: VisibleWindow::default(),
            pending_scroll: None,
            enabled: false,
        }
    }

    pub fn row_height(&self) -> u64 {
        u64::from(self.config.row_height.max(1))
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[cfg(test)]
    pub fn scroll_top(&self) -> u64 {
        self.scroll_top
    }

    pub fn viewport_height(&self) -> u64 {
        self.viewport_height
    }

    pub fn window(&self) -> VisibleWindow {
        self.window
    }

    /// The current window as an index range over the rows.
    pub fn visible_range(&self) -> std::ops::Range<usize> {
        self.window.start..self.window.end
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mode(&self) -> RenderMode {
        if self.enabled {
            RenderMode::Windowed {
                spacer_height: self.row_count as u64 * self.row_height(),
            }
        } else {
            RenderMode::Natural
        }
    }

    /// Absolute offset of a row inside the spacer.
    pub fn row_top(&self, index: usize) -> u64 {
        index as u64 * self.row_height()
    }

    fn content_height(&self) -> u64 {
        self.row_count as u64 * self.row_height()
    }

    fn clamp_scroll(&self, scroll_top: u64) -> u64 {
        scroll_top.min(self.content_height().saturating_sub(self.viewport_height))
    }

    /// Replace the row list. Always recomputes, because indices shift even
    /// when `scroll_top` does not.
    pub fn set_row_count(&mut self, row_count: usize) -> VisibleWindow {
        let was_enabled = self.enabled;
        self.row_count = row_count;
        self.enabled = row_count > self.config.enable_threshold;
        if self.enabled != was_enabled {
            tracing::debug!(
                rows = row_count,
                enabled = self.enabled,
                "virtual scrolling mode changed"
            );
        }
        let target = self.pending_scroll.take().unwrap_or(self.scroll_top);
        self.scroll_top = self.clamp_scroll(target);
        self.recompute();
        self.window
    }

    /// Update the viewport height; takes effect on the next frame.
    pub fn set_viewport_height(&mut self, viewport_height: u64) {
        if viewport_height != self.viewport_height {
            self.viewport_height = viewport_height;
            self.pending_scroll.get_or_insert(self.scroll_top);
        }
    }

    /// Record a scroll position. Repeated calls before the next frame
    /// overwrite each other.
    pub fn request_scroll(&mut self, scroll_top: u64) {
        self.pending_scroll = Some(scroll_top);
    }

    /// Scroll by a signed number of rows relative to the latest requested
    /// position.
    pub fn scroll_by_rows(&mut self, delta: i64) {
        let base = self.pending_scroll.unwrap_or(self.scroll_top) as i64;
        let target = base + delta * self.row_height() as i64;
        self.request_scroll(target.max(0) as u64);
    }

    /// Put row `index` at the top of the viewport.
    pub fn scroll_to_index(&mut self, index: usize) {
        self.request_scroll(self.row_top(index));
    }

    /// Scroll the minimum amount needed for row `index` to be fully visible.
    /// Does nothing until a viewport height is known.
    pub fn ensure_visible(&mut self, index: usize) {
        if self.viewport_height == 0 {
            return;
        }
        let current = self.pending_scroll.unwrap_or(self.scroll_top);
        let top = self.row_top(index);
        let bottom = top + self.row_height();
        if top < current {
            self.request_scroll(top);
        } else if bottom > current + self.viewport_height {
            self.request_scroll(bottom.saturating_sub(self.viewport_height));
        }
    }

    /// Apply the coalesced scroll request, once per frame.
    ///
    /// Returns the new window only when it differs from the previous one, so
    /// sub-row scroll deltas cause no re-render.
    pub fn on_frame(&mut self) -> Option<VisibleWindow> {
        let target = self.pending_scroll.take()?;
        self.scroll_top = self.clamp_scroll(target);
        let previous = self.window;
        self.recompute();
        (self.window != previous).then_some(self.window)
    }

    fn recompute(&mut self) {
        self.window = compute_window(
            &self.config,
            self.row_count,
            self.scroll_top,
            self.viewport_height,
        );
    }

    /// Index of the row under a viewport-relative offset, if any.
    pub fn index_at(&self, viewport_offset: u64) -> Option<usize> {
        let index = ((self.scroll_top + viewport_offset) / self.row_height()) as usize;
        (index < self.row_count).then_some(index)
    }

    /// First row at least partially inside the viewport.
    pub fn first_visible_index(&self) -> usize {
        (self.scroll_top / self.row_height()) as usize
    }

    pub fn stats(&self) -> VirtualStats {
        VirtualStats {
            total_rows: self.row_count,
            materialized_rows: self.window.len(),
            enabled: self.enabled,
            threshold: self.config.enable_threshold,
        }
    }
}

impl Default for Virtualizer {
    fn default() -> Self {
        Self::new(VirtualizerConfig::default())
    }
}
