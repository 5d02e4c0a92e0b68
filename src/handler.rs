use std::time::Instant;

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, ContextAction, Focus};

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }
    match app.focus {
        Focus::Search => handle_search_key(app, key),
        Focus::Tree => handle_tree_key(app, key),
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    let now = Instant::now();
    match key.code {
        KeyCode::Esc => app.search_cancel(),
        KeyCode::Enter => app.search_submit(),
        KeyCode::Backspace => app.search_backspace(now),
        KeyCode::Down | KeyCode::Tab => app.focus = Focus::Tree,
        KeyCode::Char(c) => app.search_input(c, now),
        _ => {}
    }
}

fn handle_tree_key(app: &mut App, key: KeyEvent) {
    if app.drag.is_some() {
        match key.code {
            KeyCode::Enter | KeyCode::Char('m') => {
                app.drop_drag();
                return;
            }
            KeyCode::Esc => {
                app.cancel_drag();
                return;
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::PageDown => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Char('z') => app.scroll_selection_to_top(),
        KeyCode::Enter | KeyCode::Char(' ') => app.activate_selected(),
        KeyCode::Char('l') | KeyCode::Right => app.expand_selected(),
        KeyCode::Char('h') | KeyCode::Left => app.collapse_selected(),
        KeyCode::Char('/') => app.focus_search(),
        KeyCode::Esc => app.search_cancel(),
        KeyCode::Char('m') => {
            app.begin_drag();
        }
        KeyCode::Char('r') => app.request_refresh(),
        KeyCode::Char('a') => app.context_action(ContextAction::NewFile),
        KeyCode::Char('A') => app.context_action(ContextAction::NewDirectory),
        KeyCode::Char('R') | KeyCode::F(2) => app.context_action(ContextAction::Rename),
        KeyCode::Char('d') | KeyCode::Delete => app.context_action(ContextAction::Delete),
        KeyCode::Char('c') => app.context_action(ContextAction::Menu),
        _ => {}
    }
}

/// Handle a mouse event: click, drag to reorder, wheel to scroll.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.mouse_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.mouse_up(mouse.column, mouse.row),
        MouseEventKind::Down(MouseButton::Right) => {
            if let Some(index) = app.row_at(mouse.column, mouse.row) {
                app.selected_index = index;
                app.context_action(ContextAction::Menu);
            }
        }
        MouseEventKind::ScrollDown => app.scroll_wheel(true),
        MouseEventKind::ScrollUp => app.scroll_wheel(false),
        _ => {}
    }
}
