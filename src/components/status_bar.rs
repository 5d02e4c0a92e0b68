use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::tree::virtualize::VirtualStats;

const TREE_HINTS: &str = " /:search  m:move  r:refresh  q:quit ";
const DRAG_HINTS: &str = " j/k:target  Enter:drop  Esc:cancel ";

/// Bottom bar: a status message, or row counts and key hints.
pub struct StatusBarWidget<'a> {
    stats: VirtualStats,
    status_message: Option<&'a str>,
    is_error: bool,
    dragging: bool,
    saving: usize,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(stats: VirtualStats) -> Self {
        Self {
            stats,
            status_message: None,
            is_error: false,
            dragging: false,
            saving: 0,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn dragging(mut self, dragging: bool) -> Self {
        self.dragging = dragging;
        self
    }

    /// Number of order writes still in flight.
    pub fn saving(mut self, in_flight: usize) -> Self {
        self.saving = in_flight;
        self
    }

    fn rows_info(&self) -> String {
        let stats = &self.stats;
        if stats.enabled {
            format!(
                "{} rows ({} drawn, windowed above {})",
                stats.total_rows, stats.materialized_rows, stats.threshold
            )
        } else {
            format!("{} rows", stats.total_rows)
        }
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default().bg(Color::Red).fg(Color::White)
            } else {
                Style::default().fg(Color::Green)
            };
            let display = format!("{:<width$}", msg, width = width);
            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        let hints = if self.dragging { DRAG_HINTS } else { TREE_HINTS };
        let hints_style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM);

        let mut spans = vec![Span::styled(
            format!(" {}", self.rows_info()),
            Style::default().fg(Color::Cyan),
        )];
        if self.saving > 0 {
            spans.push(Span::styled(
                format!("  saving {}…", self.saving),
                Style::default().fg(Color::Yellow),
            ));
        }

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let hints_len = hints.chars().count();
        if used + hints_len <= width {
            spans.push(Span::raw(" ".repeat(width - used - hints_len)));
            spans.push(Span::styled(hints, hints_style));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
