use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::backend::writer::{PersistOutcome, PersistRequest};
use crate::backend::OrderRequest;
use crate::config::AppConfig;
use crate::tree::reorder::{FailurePolicy, PendingOrders, Resolution};
use crate::tree::search::SearchEngine;
use crate::tree::view::{self, TreeBody, ViewContext};
use crate::tree::virtualize::Virtualizer;
use crate::tree::{DragSession, DropPlacement, FlatRow, LoadState, Node, TreeViewState};

/// How long a status message stays up.
const STATUS_TTL: Duration = Duration::from_secs(3);
/// Rows moved per mouse wheel notch.
const WHEEL_ROWS: i64 = 3;

/// Which widget receives key input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Tree,
    Search,
}

/// File operations the tree delegates to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextAction {
    NewFile,
    NewDirectory,
    Rename,
    Delete,
    Menu,
}

impl ContextAction {
    pub fn label(&self) -> &'static str {
        match self {
            ContextAction::NewFile => "new file",
            ContextAction::NewDirectory => "new directory",
            ContextAction::Rename => "rename",
            ContextAction::Delete => "delete",
            ContextAction::Menu => "menu",
        }
    }
}

/// Hooks through which the tree reports user intent to its host.
pub struct TreeCallbacks {
    pub on_open_file: Box<dyn FnMut(&str)>,
    pub on_toggle_directory: Box<dyn FnMut(&str, bool)>,
    /// Called once per successful reorder with the write to persist.
    pub on_reorder: Box<dyn FnMut(&PersistRequest)>,
    pub on_context_action: Box<dyn FnMut(&FlatRow, ContextAction)>,
}

impl Default for TreeCallbacks {
    fn default() -> Self {
        Self {
            on_open_file: Box::new(|_| {}),
            on_toggle_directory: Box::new(|_, _| {}),
            on_reorder: Box::new(|_| {}),
            on_context_action: Box::new(|_, _| {}),
        }
    }
}

/// A status bar message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub created: Instant,
}

/// Main application state.
pub struct App {
    pub tree: TreeViewState,
    pub virtualizer: Virtualizer,
    pub search: SearchEngine,
    pub drag: Option<DragSession>,
    pub pending_orders: PendingOrders,
    pub failure_policy: FailurePolicy,
    pub selected_index: usize,
    /// Last file handed to `on_open_file`.
    pub opened_path: Option<String>,
    pub focus: Focus,
    pub use_icons: bool,
    pub should_quit: bool,
    pub status_message: Option<StatusMessage>,
    /// Inner area of the tree panel from the last frame, for mouse hit-testing.
    pub tree_area: Rect,
    /// Row under the last left-button press.
    mouse_press: Option<usize>,
    refresh_requested: bool,
    /// Bumped on every refresh; only the newest fetch may land.
    fetch_generation: u64,
    callbacks: TreeCallbacks,
}

impl App {
    pub fn new(config: &AppConfig, callbacks: TreeCallbacks) -> Self {
        Self {
            tree: TreeViewState::new(),
            virtualizer: Virtualizer::new(config.virtualizer()),
            search: SearchEngine::new(config.search_debounce()),
            drag: None,
            pending_orders: PendingOrders::default(),
            failure_policy: config.failure_policy(),
            selected_index: 0,
            opened_path: None,
            focus: Focus::Tree,
            use_icons: config.use_icons(),
            should_quit: false,
            status_message: None,
            tree_area: Rect::default(),
            mouse_press: None,
            refresh_requested: false,
            fetch_generation: 0,
            callbacks,
        }
    }

    // ── Loading ─────────────────────────────────────────────────────────────

    /// Ask for the tree to be (re)fetched. The host spawns the fetch.
    pub fn request_refresh(&mut self) {
        self.refresh_requested = true;
        self.fetch_generation += 1;
        self.begin_loading();
    }

    /// Returns and clears the pending refresh request, as the generation
    /// the spawned fetch must report back with.
    pub fn take_refresh_request(&mut self) -> Option<u64> {
        std::mem::take(&mut self.refresh_requested).then_some(self.fetch_generation)
    }

    /// Apply a fetch result unless a newer refresh was requested after it
    /// started.
    pub fn handle_fetch_result(
        &mut self,
        generation: u64,
        result: std::result::Result<Node, String>,
    ) {
        if generation != self.fetch_generation {
            tracing::debug!(
                generation,
                current = self.fetch_generation,
                "ignoring stale tree fetch"
            );
            return;
        }
        self.handle_tree_loaded(result);
    }

    pub fn begin_loading(&mut self) {
        self.drag = None;
        self.mouse_press = None;
        self.tree.load_state = LoadState::Loading;
    }

    /// Apply a finished fetch. The new tree replaces the old one wholesale,
    /// so in-flight order writes no longer refer to anything local.
    pub fn handle_tree_loaded(&mut self, result: std::result::Result<Node, String>) {
        let keep = self.selected_path();
        self.drag = None;
        self.pending_orders.clear();
        match result {
            Ok(root) => {
                tracing::info!(nodes = root.count(), "tree loaded");
                self.tree.load(root);
            }
            Err(message) => {
                tracing::error!(error = %message, "failed to load tree");
                self.set_error(format!("Failed to load tree: {}", message));
                self.tree.fail(message);
            }
        }
        self.rows_changed(keep.as_deref());
    }

    /// Resync the virtualizer and selection after the rows were regenerated.
    fn rows_changed(&mut self, keep_path: Option<&str>) {
        let len = self.tree.rows().len();
        self.virtualizer.set_row_count(len);
        if let Some(index) = keep_path.and_then(|p| self.tree.find_index_by_path(p)) {
            self.selected_index = index;
        } else {
            self.selected_index = self.selected_index.min(len.saturating_sub(1));
        }
        self.virtualizer.ensure_visible(self.selected_index);
    }

    // ── Selection ───────────────────────────────────────────────────────────

    pub fn selected_row(&self) -> Option<&FlatRow> {
        self.tree.rows().get(self.selected_index)
    }

    pub fn selected_path(&self) -> Option<String> {
        self.selected_row().map(|row| row.path.clone())
    }

    fn select(&mut self, index: usize) {
        let len = self.tree.rows().len();
        if len == 0 {
            return;
        }
        self.selected_index = index.min(len - 1);
        self.virtualizer.ensure_visible(self.selected_index);
        self.retarget_drag();
    }

    pub fn select_next(&mut self) {
        self.select(self.selected_index.saturating_add(1));
    }

    pub fn select_previous(&mut self) {
        self.select(self.selected_index.saturating_sub(1));
    }

    pub fn select_first(&mut self) {
        self.select(0);
    }

    pub fn select_last(&mut self) {
        self.select(usize::MAX);
    }

    fn page_rows(&self) -> usize {
        (self.virtualizer.viewport_height() / self.virtualizer.row_height()).max(1) as usize
    }

    /// Scroll so the selected row sits at the top of the viewport.
    pub fn scroll_selection_to_top(&mut self) {
        self.virtualizer.scroll_to_index(self.selected_index);
    }

    pub fn page_down(&mut self) {
        self.select(self.selected_index.saturating_add(self.page_rows()));
    }

    pub fn page_up(&mut self) {
        self.select(self.selected_index.saturating_sub(self.page_rows()));
    }

    // ── Tree actions ────────────────────────────────────────────────────────

    /// Open the selected file, or toggle the selected directory.
    pub fn activate_selected(&mut self) {
        let Some(row) = self.selected_row().cloned() else {
            return;
        };
        if row.is_dir() {
            self.toggle_path(&row.path);
        } else {
            tracing::info!(path = %row.path, "open file");
            self.opened_path = Some(row.path.clone());
            (self.callbacks.on_open_file)(&row.path);
        }
    }

    /// Flip a directory and report the new state to the host.
    pub fn toggle_path(&mut self, path: &str) -> bool {
        let keep = self.selected_path();
        if !self.tree.toggle(path) {
            return false;
        }
        let expanded = self.tree.is_expanded(path);
        (self.callbacks.on_toggle_directory)(path, expanded);
        self.rows_changed(keep.as_deref());
        true
    }

    /// Expand the selected directory if it is closed.
    pub fn expand_selected(&mut self) {
        if let Some(row) = self.selected_row().cloned() {
            if row.is_dir() && !self.tree.is_expanded(&row.path) {
                self.toggle_path(&row.path);
            }
        }
    }

    /// Collapse the selected directory, or jump to its parent row.
    pub fn collapse_selected(&mut self) {
        let Some(row) = self.selected_row().cloned() else {
            return;
        };
        if row.is_dir() && self.tree.is_expanded(&row.path) && !self.tree.is_searching() {
            self.toggle_path(&row.path);
        } else if let Some(parent) = self.tree.find_index_by_path(&row.parent_path) {
            self.select(parent);
        }
    }

    pub fn context_action(&mut self, action: ContextAction) {
        if let Some(row) = self.selected_row().cloned() {
            tracing::debug!(path = %row.path, action = action.label(), "context action");
            (self.callbacks.on_context_action)(&row, action);
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // ── Search ──────────────────────────────────────────────────────────────

    pub fn focus_search(&mut self) {
        self.focus = Focus::Search;
    }

    pub fn search_input(&mut self, c: char, now: Instant) {
        self.search.input_char(c, now);
    }

    pub fn search_backspace(&mut self, now: Instant) {
        self.search.delete_char(now);
    }

    /// Commit the typed query without waiting and go back to the tree.
    pub fn search_submit(&mut self) {
        if let Some(query) = self.search.commit_now() {
            self.apply_query(&query);
        }
        self.focus = Focus::Tree;
    }

    /// Clear the query immediately and go back to the tree.
    pub fn search_cancel(&mut self) {
        if let Some(query) = self.search.clear() {
            self.apply_query(&query);
        }
        self.focus = Focus::Tree;
    }

    fn apply_query(&mut self, query: &str) {
        let keep = self.selected_path();
        if !query.is_empty() && self.drag.take().is_some() {
            self.set_status("Drag cancelled by search");
        }
        self.tree.set_query(query);
        self.rows_changed(keep.as_deref());
    }

    /// Periodic work: the search debounce and status expiry.
    pub fn tick(&mut self, now: Instant) {
        if let Some(query) = self.search.poll(now) {
            self.apply_query(&query);
        }
        self.clear_expired_status(now);
    }

    // ── Drag and drop ───────────────────────────────────────────────────────

    /// Pick up the selected row. Refused while searching.
    pub fn begin_drag(&mut self) -> bool {
        let Some(row) = self.selected_row() else {
            return false;
        };
        match DragSession::start(row, self.tree.is_searching()) {
            Some(session) => {
                tracing::debug!(path = %session.dragged_path, "drag started");
                self.drag = Some(session);
                true
            }
            None => {
                self.set_status("Clear the search to reorder");
                false
            }
        }
    }

    /// Point the drop indicator at the selected row.
    ///
    /// Cells are too coarse for a midpoint test, so the placement follows
    /// the direction of travel: above the dragged row inserts before,
    /// below inserts after.
    fn retarget_drag(&mut self) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let rows = self.tree.rows();
        let Some(target) = rows.get(self.selected_index) else {
            return;
        };
        let dragged_index = rows.iter().position(|r| r.path == drag.dragged_path);
        let placement = match dragged_index {
            Some(i) if self.selected_index < i => DropPlacement::Before,
            _ => DropPlacement::After,
        };
        if !drag.drag_over(target, placement) {
            if let Some(current) = drag.target_path.clone() {
                drag.leave(&current);
            }
        }
    }

    pub fn cancel_drag(&mut self) {
        if self.drag.take().is_some() {
            tracing::debug!("drag cancelled");
        }
    }

    /// Drop the dragged row at the current target, reorder locally and hand
    /// the write to the host.
    pub fn drop_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let Some(target) = drag.target_path.clone() else {
            return false;
        };
        let Some(outcome) = self.tree.reorder(
            &drag.dragged_parent_path,
            &drag.dragged_path,
            &target,
            drag.placement(),
        ) else {
            tracing::warn!(
                dragged = %drag.dragged_path,
                target = %target,
                "reorder rejected"
            );
            return false;
        };

        let ticket = self.pending_orders.issue(&outcome);
        tracing::info!(
            ticket,
            parent = %outcome.parent_path,
            order = ?outcome.order,
            "reorder issued"
        );
        let request = PersistRequest {
            ticket,
            request: OrderRequest {
                parent_path: outcome.parent_path,
                order: outcome.order,
            },
        };
        (self.callbacks.on_reorder)(&request);
        self.rows_changed(Some(&drag.dragged_path));
        true
    }

    /// Settle an order write according to the failure policy.
    pub fn handle_persist_outcome(&mut self, outcome: PersistOutcome) {
        let resolution =
            self.pending_orders
                .resolve(outcome.ticket, outcome.result.is_ok(), self.failure_policy);
        let parent = display_parent(&outcome.parent_path);
        let error = outcome.result.err().unwrap_or_default();
        match resolution {
            Resolution::Confirmed => {
                tracing::debug!(ticket = outcome.ticket, "order confirmed");
            }
            Resolution::Kept => {
                tracing::warn!(
                    ticket = outcome.ticket,
                    parent = %outcome.parent_path,
                    error = %error,
                    "order not saved, keeping local order"
                );
                self.set_error(format!("Saving order of {} failed: {}", parent, error));
            }
            Resolution::Rollback {
                parent_path,
                previous,
            } => {
                let keep = self.selected_path();
                if self.tree.restore_order(&parent_path, &previous) {
                    tracing::info!(parent = %parent_path, "order rolled back");
                    self.rows_changed(keep.as_deref());
                }
                self.set_error(format!(
                    "Saving order of {} failed: {}; restored previous order",
                    parent, error
                ));
            }
            Resolution::Superseded => {
                tracing::info!(
                    ticket = outcome.ticket,
                    parent = %outcome.parent_path,
                    "failed order superseded by a newer one"
                );
                self.set_error(format!("Saving order of {} failed: {}", parent, error));
            }
            Resolution::Unknown => {
                tracing::debug!(ticket = outcome.ticket, "completion for a discarded order");
            }
        }
    }

    // ── Mouse ───────────────────────────────────────────────────────────────

    /// Row under a screen position inside the tree panel.
    pub fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.tree_area;
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        if !inside {
            return None;
        }
        let offset = u64::from(row - area.y) * self.virtualizer.row_height();
        self.virtualizer
            .index_at(offset)
            .filter(|index| self.virtualizer.window().contains(*index))
    }

    pub fn mouse_down(&mut self, column: u16, row: u16) {
        self.focus = Focus::Tree;
        self.mouse_press = self.row_at(column, row);
        if let Some(index) = self.mouse_press {
            self.select(index);
        }
    }

    /// Pointer moved with the button held. Leaving the pressed row starts
    /// a drag.
    pub fn mouse_drag(&mut self, column: u16, row: u16) {
        let Some(index) = self.row_at(column, row) else {
            return;
        };
        if self.drag.is_none() {
            match self.mouse_press {
                Some(pressed) if pressed != index => {
                    self.selected_index = pressed;
                    if !self.begin_drag() {
                        self.mouse_press = None;
                        return;
                    }
                }
                _ => return,
            }
        }
        self.select(index);
    }

    /// Button released: drop an active drag, or treat it as a click.
    pub fn mouse_up(&mut self, column: u16, row: u16) {
        let pressed = self.mouse_press.take();
        if self.drag.is_some() {
            self.drop_drag();
            return;
        }
        if pressed.is_some() && pressed == self.row_at(column, row) {
            self.activate_selected();
        }
    }

    pub fn scroll_wheel(&mut self, down: bool) {
        self.virtualizer
            .scroll_by_rows(if down { WHEEL_ROWS } else { -WHEEL_ROWS });
    }

    // ── Frame ───────────────────────────────────────────────────────────────

    /// Per-frame layout sync: viewport size in lines, then the coalesced
    /// scroll is applied once.
    pub fn on_frame(&mut self, viewport_lines: u16) {
        let height = u64::from(viewport_lines) * self.virtualizer.row_height();
        let resized = height != self.virtualizer.viewport_height();
        self.virtualizer.set_viewport_height(height);
        if resized {
            self.virtualizer.ensure_visible(self.selected_index);
        }
        if let Some(window) = self.virtualizer.on_frame() {
            tracing::trace!(start = window.start, end = window.end, "window moved");
        }
    }

    pub fn tree_body(&self) -> TreeBody {
        let ctx = ViewContext {
            selected_index: (!self.tree.rows().is_empty()).then_some(self.selected_index),
            opened_path: self.opened_path.as_deref(),
            drag: self.drag.as_ref(),
        };
        view::tree_body(&self.tree, &self.virtualizer, ctx)
    }

    // ── Status ──────────────────────────────────────────────────────────────

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: false,
            created: Instant::now(),
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: true,
            created: Instant::now(),
        });
    }

    /// Drop the status message once it has been up for a few seconds.
    pub fn clear_expired_status(&mut self, now: Instant) {
        if let Some(msg) = &self.status_message {
            if now.saturating_duration_since(msg.created) > STATUS_TTL {
                self.status_message = None;
            }
        }
    }
}

fn display_parent(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorded {
        opened: Vec<String>,
        toggled: Vec<(String, bool)>,
        reorders: Vec<PersistRequest>,
        actions: Vec<(String, ContextAction)>,
    }

    fn recording_callbacks() -> (Rc<RefCell<Recorded>>, TreeCallbacks) {
        let log = Rc::new(RefCell::new(Recorded::default()));
        let (a, b, c, d) = (log.clone(), log.clone(), log.clone(), log.clone());
        let callbacks = TreeCallbacks {
            on_open_file: Box::new(move |p| a.borrow_mut().opened.push(p.to_string())),
            on_toggle_directory: Box::new(move |p, e| {
                b.borrow_mut().toggled.push((p.to_string(), e))
            }),
            on_reorder: Box::new(move |r| c.borrow_mut().reorders.push(r.clone())),
            on_context_action: Box::new(move |row, action| {
                d.borrow_mut().actions.push((row.path.clone(), action))
            }),
        };
        (log, callbacks)
    }

    fn sample_tree() -> Node {
        Node::directory(
            "src",
            "",
            vec![
                Node::directory(
                    "guide",
                    "guide",
                    vec![
                        Node::file("intro.md", "guide/intro.md"),
                        Node::file("setup.md", "guide/setup.md"),
                        Node::file("usage.md", "guide/usage.md"),
                    ],
                ),
                Node::file("readme.md", "readme.md"),
            ],
        )
    }

    fn setup_app(config: &AppConfig) -> (Rc<RefCell<Recorded>>, App) {
        let (log, callbacks) = recording_callbacks();
        let mut app = App::new(config, callbacks);
        app.handle_tree_loaded(Ok(sample_tree()));
        app.tree_area = Rect::new(1, 2, 40, 10);
        app.on_frame(10);
        (log, app)
    }

    fn paths(app: &App) -> Vec<&str> {
        app.tree.rows().iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn select_next_clamps_at_end() {
        let (_log, mut app) = setup_app(&AppConfig::default());
        app.select_next();
        app.select_next();
        app.select_next();
        assert_eq!(app.selected_index, 1);
        app.select_first();
        assert_eq!(app.selected_index, 0);
        app.select_previous();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn activate_toggles_directory_and_opens_file() {
        let (log, mut app) = setup_app(&AppConfig::default());
        app.activate_selected();
        assert_eq!(paths(&app)[1], "guide/intro.md");
        assert_eq!(log.borrow().toggled, vec![("guide".to_string(), true)]);

        app.select_next();
        app.activate_selected();
        assert_eq!(log.borrow().opened, vec!["guide/intro.md".to_string()]);
        assert_eq!(app.opened_path.as_deref(), Some("guide/intro.md"));
    }

    #[test]
    fn collapse_from_child_jumps_to_parent() {
        let (_log, mut app) = setup_app(&AppConfig::default());
        app.expand_selected();
        app.select_next();
        app.collapse_selected();
        assert_eq!(app.selected_path().as_deref(), Some("guide"));
        app.collapse_selected();
        assert!(!app.tree.is_expanded("guide"));
    }

    #[test]
    fn selection_follows_path_across_toggle() {
        let (_log, mut app) = setup_app(&AppConfig::default());
        app.select_last();
        assert_eq!(app.selected_path().as_deref(), Some("readme.md"));
        app.toggle_path("guide");
        assert_eq!(app.selected_path().as_deref(), Some("readme.md"));
        assert_eq!(app.selected_index, 4);
    }

    #[test]
    fn search_debounce_then_commit() {
        let (_log, mut app) = setup_app(&AppConfig::default());
        let t0 = Instant::now();
        app.focus_search();
        for c in "setup".chars() {
            app.search_input(c, t0);
        }
        app.tick(t0 + Duration::from_millis(100));
        assert_eq!(app.tree.query(), "");
        app.tick(t0 + Duration::from_millis(300));
        assert_eq!(app.tree.query(), "setup");
        assert_eq!(paths(&app), vec!["guide", "guide/setup.md"]);
        assert!(app.tree.is_expanded("guide"));
    }

    #[test]
    fn search_cancel_clears_immediately() {
        let (_log, mut app) = setup_app(&AppConfig::default());
        app.focus_search();
        app.search_input('z', Instant::now());
        app.search_submit();
        assert!(matches!(app.tree_body(), TreeBody::NoMatches));
        app.focus_search();
        app.search_cancel();
        assert_eq!(app.focus, Focus::Tree);
        assert_eq!(app.tree.query(), "");
        assert_eq!(paths(&app), vec!["guide", "readme.md"]);
    }

    #[test]
    fn drag_refused_while_searching() {
        let (_log, mut app) = setup_app(&AppConfig::default());
        app.search_input('m', Instant::now());
        app.search_submit();
        assert!(!app.begin_drag());
        assert!(app.drag.is_none());
        assert!(app.status_message.is_some());
    }

    #[test]
    fn keyboard_drag_reorders_and_reports() {
        let (log, mut app) = setup_app(&AppConfig::default());
        app.expand_selected();
        app.select_next(); // guide/intro.md
        assert!(app.begin_drag());
        app.select_next(); // setup.md, below: after
        app.select_next(); // usage.md, below: after
        assert_eq!(
            app.drag.as_ref().and_then(|d| d.target_path.as_deref()),
            Some("guide/usage.md")
        );
        assert!(app.drop_drag());
        assert_eq!(
            paths(&app),
            vec!["guide", "guide/setup.md", "guide/usage.md", "guide/intro.md", "readme.md"]
        );
        assert_eq!(app.selected_path().as_deref(), Some("guide/intro.md"));

        let log = log.borrow();
        assert_eq!(log.reorders.len(), 1);
        assert_eq!(log.reorders[0].ticket, 1);
        assert_eq!(log.reorders[0].request.parent_path, "guide");
        assert_eq!(
            log.reorders[0].request.order,
            vec!["setup.md", "usage.md", "intro.md"]
        );
    }

    #[test]
    fn keyboard_drag_upwards_inserts_before() {
        let (log, mut app) = setup_app(&AppConfig::default());
        app.expand_selected();
        app.select_last(); // readme.md, top-level
        assert!(app.begin_drag());
        app.select_first(); // guide, above: before
        assert!(app.drop_drag());
        assert_eq!(paths(&app)[0], "readme.md");
        assert_eq!(log.borrow().reorders[0].request.parent_path, "");
    }

    #[test]
    fn drag_over_other_parent_clears_target() {
        let (log, mut app) = setup_app(&AppConfig::default());
        app.expand_selected();
        app.select_next(); // guide/intro.md
        app.begin_drag();
        app.select_next(); // guide/setup.md
        app.select_last(); // readme.md: other parent
        assert!(app.drag.as_ref().is_some_and(|d| d.target_path.is_none()));
        assert!(!app.drop_drag());
        assert!(log.borrow().reorders.is_empty());
        assert_eq!(paths(&app)[1], "guide/intro.md");
    }

    #[test]
    fn mouse_drag_and_click() {
        let (log, mut app) = setup_app(&AppConfig::default());
        app.expand_selected();
        // tree_area starts at y = 2; rows: guide, intro, setup, usage, readme
        app.mouse_down(5, 3);
        app.mouse_drag(5, 5);
        assert!(app.drag.is_some());
        app.mouse_up(5, 5);
        assert_eq!(paths(&app)[1..4], ["guide/setup.md", "guide/usage.md", "guide/intro.md"]);
        assert_eq!(log.borrow().reorders.len(), 1);

        app.mouse_down(5, 6);
        app.mouse_up(5, 6);
        assert_eq!(log.borrow().opened, vec!["readme.md".to_string()]);
        assert_eq!(app.row_at(0, 3), None);
    }

    #[test]
    fn failed_write_keeps_order_by_default() {
        let (log, mut app) = setup_app(&AppConfig::default());
        app.expand_selected();
        app.select_next();
        app.begin_drag();
        app.select_next();
        app.drop_drag();
        let ticket = log.borrow().reorders[0].ticket;
        app.handle_persist_outcome(PersistOutcome {
            ticket,
            parent_path: "guide".into(),
            result: Err("HTTP 500".into()),
        });
        assert_eq!(paths(&app)[1], "guide/setup.md");
        assert!(app.status_message.as_ref().is_some_and(|m| m.is_error));
    }

    #[test]
    fn failed_write_rolls_back_when_configured() {
        let mut config = AppConfig::default();
        config.reorder.on_failure = Some("rollback".into());
        let (log, mut app) = setup_app(&config);
        app.expand_selected();
        app.select_next();
        app.begin_drag();
        app.select_next();
        app.drop_drag();
        assert_eq!(paths(&app)[1], "guide/setup.md");
        let ticket = log.borrow().reorders[0].ticket;
        app.handle_persist_outcome(PersistOutcome {
            ticket,
            parent_path: "guide".into(),
            result: Err("HTTP 500".into()),
        });
        assert_eq!(
            paths(&app)[1..4],
            ["guide/intro.md", "guide/setup.md", "guide/usage.md"]
        );
    }

    #[test]
    fn stale_failure_does_not_undo_newer_reorder() {
        let mut config = AppConfig::default();
        config.reorder.on_failure = Some("rollback".into());
        let (log, mut app) = setup_app(&config);
        app.expand_selected();
        for _ in 0..2 {
            app.select(1);
            app.begin_drag();
            app.select(2);
            app.drop_drag();
        }
        // Two swaps of the first two children: back to the loaded order.
        let first = log.borrow().reorders[0].ticket;
        app.handle_persist_outcome(PersistOutcome {
            ticket: first,
            parent_path: "guide".into(),
            result: Err("timeout".into()),
        });
        assert_eq!(
            paths(&app)[1..4],
            ["guide/intro.md", "guide/setup.md", "guide/usage.md"]
        );
        assert_eq!(app.pending_orders.in_flight(), 1);
    }

    #[test]
    fn two_failed_writes_roll_back_to_saved_order() {
        let mut config = AppConfig::default();
        config.reorder.on_failure = Some("rollback".into());
        let (log, mut app) = setup_app(&config);
        app.expand_selected();
        app.select(1); // intro
        app.begin_drag();
        app.select(2); // setup, below: after
        app.drop_drag();
        app.select(3); // usage
        app.begin_drag();
        app.select(1); // setup, above: before
        app.drop_drag();
        assert_eq!(
            paths(&app)[1..4],
            ["guide/usage.md", "guide/setup.md", "guide/intro.md"]
        );

        let tickets: Vec<u64> = log.borrow().reorders.iter().map(|r| r.ticket).collect();
        for ticket in tickets {
            app.handle_persist_outcome(PersistOutcome {
                ticket,
                parent_path: "guide".into(),
                result: Err("down".into()),
            });
        }
        assert_eq!(
            paths(&app)[1..4],
            ["guide/intro.md", "guide/setup.md", "guide/usage.md"]
        );
        assert_eq!(app.pending_orders.in_flight(), 0);
    }

    #[test]
    fn stale_fetch_result_is_ignored() {
        let (_log, mut app) = setup_app(&AppConfig::default());
        app.request_refresh();
        let older = app.take_refresh_request().unwrap();
        app.request_refresh();
        let newer = app.take_refresh_request().unwrap();
        assert!(newer > older);

        let newest_tree = Node::directory("src", "", vec![Node::file("new.md", "new.md")]);
        app.handle_fetch_result(newer, Ok(newest_tree));
        app.handle_fetch_result(older, Ok(sample_tree()));
        assert_eq!(paths(&app), vec!["new.md"]);
    }

    #[test]
    fn refresh_discards_pending_orders() {
        let (log, mut app) = setup_app(&AppConfig::default());
        app.expand_selected();
        app.select_next();
        app.begin_drag();
        app.select_next();
        app.drop_drag();
        app.request_refresh();
        assert!(app.take_refresh_request().is_some());
        assert!(app.take_refresh_request().is_none());
        assert!(matches!(app.tree_body(), TreeBody::Loading));
        app.handle_tree_loaded(Ok(sample_tree()));
        assert_eq!(app.pending_orders.in_flight(), 0);
        let ticket = log.borrow().reorders[0].ticket;
        app.handle_persist_outcome(PersistOutcome {
            ticket,
            parent_path: "guide".into(),
            result: Ok(()),
        });
        assert!(app.tree.is_expanded("guide"));
    }

    #[test]
    fn fetch_failure_shows_failed_state() {
        let (_log, mut app) = setup_app(&AppConfig::default());
        app.handle_tree_loaded(Err("connection refused".into()));
        assert_eq!(app.tree_body(), TreeBody::Failed("connection refused".into()));
        assert!(app.selected_row().is_none());
        assert!(app.status_message.as_ref().is_some_and(|m| m.is_error));
    }

    #[test]
    fn context_action_reports_selected_row() {
        let (log, mut app) = setup_app(&AppConfig::default());
        app.select_last();
        app.context_action(ContextAction::Rename);
        assert_eq!(
            log.borrow().actions,
            vec![("readme.md".to_string(), ContextAction::Rename)]
        );
    }

    #[test]
    fn status_expires() {
        let (_log, mut app) = setup_app(&AppConfig::default());
        app.set_status("saved");
        let created = app.status_message.as_ref().map(|m| m.created).unwrap();
        app.clear_expired_status(created + Duration::from_secs(1));
        assert!(app.status_message.is_some());
        app.clear_expired_status(created + Duration::from_secs(5));
        assert!(app.status_message.is_none());
    }

    #[test]
    fn large_tree_windowing_and_scroll() {
        let children = (0..1000)
            .map(|i| Node::file(format!("n{:04}.md", i), format!("n{:04}.md", i)))
            .collect();
        let (_log, callbacks) = recording_callbacks();
        let mut app = App::new(&AppConfig::default(), callbacks);
        app.handle_tree_loaded(Ok(Node::directory("src", "", children)));
        app.tree_area = Rect::new(0, 0, 40, 20);
        app.on_frame(20);
        assert!(app.virtualizer.is_enabled());
        assert_eq!(app.virtualizer.visible_range(), 0..30);

        app.scroll_wheel(true);
        app.scroll_wheel(true);
        app.on_frame(20);
        assert_eq!(app.virtualizer.scroll_top(), 6);
        assert_eq!(app.row_at(0, 0), Some(6));

        app.select(500);
        app.scroll_selection_to_top();
        app.on_frame(20);
        assert_eq!(app.virtualizer.first_visible_index(), 500);
        assert_eq!(app.row_at(0, 0), Some(500));

        app.select_last();
        app.on_frame(20);
        assert_eq!(app.virtualizer.visible_range(), 970..1000);
        match app.tree_body() {
            TreeBody::Rows(rows) => assert_eq!(rows.len(), 30),
            other => panic!("unexpected body {:?}", other),
        }
    }
}
