use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Style},
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, Focus};
use crate::components::search::SearchBarWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;

/// Render the application UI: search bar, tree panel, status bar.
pub fn render(app: &mut App, frame: &mut Frame) {
    let [search_area, tree_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let block = Block::default()
        .title(" Documents ")
        .borders(Borders::ALL)
        .border_style(if app.focus == Focus::Tree {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        });

    // Layout feeds back into the virtualizer before anything is drawn.
    let inner = block.inner(tree_area);
    app.tree_area = inner;
    app.on_frame(inner.height);

    let mut search = SearchBarWidget::new(app.search.pending(), app.focus == Focus::Search)
        .debouncing(
            app.search.is_pending() && app.search.pending().trim() != app.search.committed(),
        );
    if app.tree.is_searching() {
        search = search.match_count(app.tree.rows().len());
    }
    frame.render_widget(search, search_area);

    let body = app.tree_body();
    let mut tree = TreeWidget::new(&body, app.virtualizer.first_visible_index(), app.use_icons)
        .block(block);
    if app.virtualizer.is_enabled() {
        tree = tree.windowed(app.virtualizer.row_count());
    }
    frame.render_widget(tree, tree_area);

    let mut status = StatusBarWidget::new(app.virtualizer.stats())
        .dragging(app.drag.is_some())
        .saving(app.pending_orders.in_flight());
    if let Some(msg) = &app.status_message {
        status = status.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(status, status_area);
}
