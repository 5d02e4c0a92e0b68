use super::flatten::FlatRow;
use super::node::NodeKind;
use super::reorder::{DragSession, DropPlacement};
use super::virtualize::{RenderMode, Virtualizer};
use super::{LoadState, TreeViewState};

/// Indentation added per depth level, in cells.
pub const INDENT_STEP: usize = 2;

/// Everything a renderer needs to draw one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowViewModel {
    pub index: usize,
    pub path: String,
    pub label: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub indent: usize,
    /// Absolute position inside the spacer; `None` in natural flow.
    pub offset: Option<u64>,
    pub expanded: bool,
    pub badge: &'static str,
    pub draggable: bool,
    /// Cursor row.
    pub selected: bool,
    /// Last file handed to `on_open_file`.
    pub opened: bool,
    pub dragging: bool,
    pub drop_indicator: Option<DropPlacement>,
}

/// What the tree area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeBody {
    Loading,
    Failed(String),
    /// Loaded, but the tree has no entries.
    Empty,
    /// A query is active and nothing matched.
    NoMatches,
    Rows(Vec<RowViewModel>),
}

/// Interaction state that decorates rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct ViewContext<'a> {
    pub selected_index: Option<usize>,
    pub opened_path: Option<&'a str>,
    pub drag: Option<&'a DragSession>,
}

/// Short type badge, by kind and extension.
pub fn badge_for(row: &FlatRow, expanded: bool) -> &'static str {
    if row.kind == NodeKind::Directory {
        return if expanded { "OPEN" } else { "DIR" };
    }
    let ext = row
        .name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "md" | "markdown" => "MD",
        "yml" | "yaml" => "YML",
        "json" => "JSON",
        "txt" => "TXT",
        "js" => "JS",
        "ts" => "TS",
        "css" => "CSS",
        "html" => "HTML",
        _ => "FILE",
    }
}

/// Build view-models for the rows in the virtualizer's current window.
pub fn row_view_models(
    state: &TreeViewState,
    virtualizer: &Virtualizer,
    ctx: ViewContext<'_>,
) -> Vec<RowViewModel> {
    let rows = state.rows();
    let range = virtualizer.visible_range();
    let windowed = matches!(virtualizer.mode(), RenderMode::Windowed { .. });
    let draggable = !state.is_searching();
    let end = range.end.min(rows.len());
    let start = range.start.min(end);

    rows[start..end]
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let index = start + i;
            let expanded = row.is_dir() && shows_children(rows, index, state);
            RowViewModel {
                index,
                path: row.path.clone(),
                label: row.label.clone(),
                kind: row.kind,
                depth: row.depth,
                indent: row.depth * INDENT_STEP,
                offset: windowed.then(|| virtualizer.row_top(index)),
                expanded,
                badge: badge_for(row, expanded),
                draggable,
                selected: ctx.selected_index == Some(index),
                opened: ctx.opened_path == Some(row.path.as_str()),
                dragging: ctx.drag.is_some_and(|d| d.dragged_path == row.path),
                drop_indicator: ctx.drag.and_then(|d| d.indicator_for(&row.path)),
            }
        })
        .collect()
}

/// Whether the directory at `index` is drawn open. A search shows every
/// directory on a path to a match, whatever the expansion set says, so there
/// it depends on a child row actually following.
fn shows_children(rows: &[FlatRow], index: usize, state: &TreeViewState) -> bool {
    if state.is_searching() {
        rows.get(index + 1)
            .is_some_and(|next| next.parent_path == rows[index].path)
    } else {
        state.is_expanded(&rows[index].path)
    }
}

/// The whole tree area for the current state.
pub fn tree_body(
    state: &TreeViewState,
    virtualizer: &Virtualizer,
    ctx: ViewContext<'_>,
) -> TreeBody {
    match &state.load_state {
        LoadState::Idle | LoadState::Loading => TreeBody::Loading,
        LoadState::Failed(message) => TreeBody::Failed(message.clone()),
        LoadState::Ready if state.rows().is_empty() => {
            if state.is_searching() {
                TreeBody::NoMatches
            } else {
                TreeBody::Empty
            }
        }
        LoadState::Ready => TreeBody::Rows(row_view_models(state, virtualizer, ctx)),
    }
}
