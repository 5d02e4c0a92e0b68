use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// One-line search input above the tree.
pub struct SearchBarWidget<'a> {
    pending: &'a str,
    focused: bool,
    /// Rows shown for the committed query, if one is active.
    match_count: Option<usize>,
    /// The typed text has not been applied yet.
    debouncing: bool,
}

impl<'a> SearchBarWidget<'a> {
    pub fn new(pending: &'a str, focused: bool) -> Self {
        Self {
            pending,
            focused,
            match_count: None,
            debouncing: false,
        }
    }

    pub fn match_count(mut self, count: usize) -> Self {
        self.match_count = Some(count);
        self
    }

    pub fn debouncing(mut self, debouncing: bool) -> Self {
        self.debouncing = debouncing;
        self
    }
}

impl<'a> Widget for SearchBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let prompt_style = if self.focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let input_style = Style::default().fg(Color::White);
        let cursor_style = Style::default().bg(Color::White).fg(Color::Black);
        let hint_style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);

        let mut spans = vec![Span::styled("/ ", prompt_style)];
        if self.pending.is_empty() && !self.focused {
            spans.push(Span::styled("press / to search", hint_style));
        } else {
            spans.push(Span::styled(self.pending, input_style));
            if self.focused {
                spans.push(Span::styled(" ", cursor_style));
            }
        }

        let suffix = match (self.debouncing, self.match_count) {
            (true, _) => Some("…".to_string()),
            (false, Some(1)) => Some("1 match".to_string()),
            (false, Some(n)) => Some(format!("{} matches", n)),
            (false, None) => None,
        };

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);

        if let Some(suffix) = suffix {
            let len = suffix.chars().count() as u16;
            if len + 1 < area.width {
                let x = area.x + area.width - len - 1;
                buf.set_string(x, area.y, suffix, hint_style);
            }
        }
    }
}
