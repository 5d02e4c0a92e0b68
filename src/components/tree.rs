use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget},
};

use crate::tree::view::{RowViewModel, TreeBody};
use crate::tree::{DropPlacement, NodeKind};

/// Renders the tree body: rows from the virtualized window, or an empty state.
pub struct TreeWidget<'a> {
    body: &'a TreeBody,
    /// Index of the row drawn on the first line.
    first_visible: usize,
    /// Total row count when windowed; drives the scrollbar.
    windowed_total: Option<usize>,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(body: &'a TreeBody, first_visible: usize, use_icons: bool) -> Self {
        Self {
            body,
            first_visible,
            windowed_total: None,
            use_icons,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn windowed(mut self, total_rows: usize) -> Self {
        self.windowed_total = Some(total_rows);
        self
    }

    /// Expand arrow for directories, blank for files.
    fn arrow(vm: &RowViewModel) -> &'static str {
        match vm.kind {
            NodeKind::Directory if vm.expanded => "▾ ",
            NodeKind::Directory => "▸ ",
            NodeKind::File => "  ",
        }
    }

    /// Type marker: a fixed-width text badge, or a Nerd Font icon.
    fn marker(&self, vm: &RowViewModel) -> String {
        if !self.use_icons {
            return format!("{:<4} ", vm.badge);
        }
        let icon = match vm.badge {
            "OPEN" => "\u{f07c}",
            "DIR" => "\u{f07b}",
            "MD" => "\u{f48a}",
            "JSON" => "\u{e60b}",
            "YML" => "\u{e615}",
            "JS" => "\u{e74e}",
            "TS" => "\u{e628}",
            "CSS" => "\u{e749}",
            "HTML" => "\u{e736}",
            _ => "\u{f15b}",
        };
        format!("{} ", icon)
    }

    /// One-cell gutter showing drag state.
    fn gutter(vm: &RowViewModel) -> &'static str {
        match vm.drop_indicator {
            Some(DropPlacement::Before) => "▲",
            Some(DropPlacement::After) => "▼",
            None if vm.dragging => "≡",
            None => " ",
        }
    }

    fn row_style(vm: &RowViewModel) -> Style {
        let mut style = match vm.kind {
            NodeKind::Directory => Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            NodeKind::File => Style::default().fg(Color::White),
        };
        if vm.opened {
            style = style.fg(Color::Yellow);
        }
        if vm.dragging {
            style = style.add_modifier(Modifier::DIM);
        }
        if vm.selected {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }
        style
    }

    fn render_message(area: Rect, buf: &mut Buffer, text: &str, style: Style) {
        if area.height == 0 {
            return;
        }
        let line = Line::from(Span::styled(text.to_string(), style));
        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(1));
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        if inner_area.height == 0 || inner_area.width == 0 {
            return;
        }

        let dim = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);
        let rows = match self.body {
            TreeBody::Loading => {
                Self::render_message(inner_area, buf, "Loading…", dim);
                return;
            }
            TreeBody::Failed(message) => {
                let style = Style::default().fg(Color::Red);
                Self::render_message(inner_area, buf, &format!("Failed to load: {}", message), style);
                if inner_area.height > 1 {
                    let below = Rect::new(inner_area.x, inner_area.y + 1, inner_area.width, 1);
                    Self::render_message(below, buf, "Press r to retry", dim);
                }
                return;
            }
            TreeBody::Empty => {
                Self::render_message(inner_area, buf, "No documents", dim);
                return;
            }
            TreeBody::NoMatches => {
                Self::render_message(inner_area, buf, "No matches", dim);
                return;
            }
            TreeBody::Rows(rows) => rows,
        };

        let height = inner_area.height as usize;
        let text_width = if self.windowed_total.is_some() {
            inner_area.width.saturating_sub(1)
        } else {
            inner_area.width
        };

        for vm in rows {
            if vm.index < self.first_visible || vm.index >= self.first_visible + height {
                continue;
            }
            let y = inner_area.y + (vm.index - self.first_visible) as u16;
            let style = Self::row_style(vm);

            if vm.selected {
                buf.set_style(Rect::new(inner_area.x, y, text_width, 1), style);
            }

            let gutter_style = Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD);
            let line = Line::from(vec![
                Span::styled(Self::gutter(vm), gutter_style),
                Span::styled(" ".repeat(vm.indent), style),
                Span::styled(Self::arrow(vm), style),
                Span::styled(self.marker(vm), style.add_modifier(Modifier::DIM)),
                Span::styled(vm.label.as_str(), style),
            ]);
            buf.set_line(inner_area.x, y, &line, text_width);
        }

        if let Some(total) = self.windowed_total {
            let mut state = ScrollbarState::new(total.saturating_sub(height))
                .position(self.first_visible)
                .viewport_content_length(height);
            StatefulWidget::render(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                inner_area,
                buf,
                &mut state,
            );
        }
    }
}
