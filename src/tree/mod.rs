//! Tree model, flattening, search, windowing and sibling reordering.

pub mod flatten;
pub mod node;
pub mod reorder;
pub mod search;
pub mod view;
pub mod virtualize;

use std::collections::HashSet;

pub use flatten::{flatten, FlatRow};
pub use node::{Node, NodeKind};
pub use reorder::{DragSession, DropPlacement, ReorderOutcome};

/// Where the tree data currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing requested yet.
    Idle,
    Loading,
    Ready,
    /// Terminal until the user refreshes.
    Failed(String),
}

/// Owned state of the tree view: the data plus everything derived from it.
///
/// Rows are regenerated wholesale whenever the tree, the expansion set or
/// the committed query changes.
#[derive(Debug)]
pub struct TreeViewState {
    root: Option<Node>,
    expanded: HashSet<String>,
    query: String,
    rows: Vec<FlatRow>,
    pub load_state: LoadState,
}

impl TreeViewState {
    pub fn new() -> Self {
        Self {
            root: None,
            expanded: HashSet::new(),
            query: String::new(),
            rows: Vec::new(),
            load_state: LoadState::Idle,
        }
    }

    #[cfg(test)]
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    #[cfg(test)]
    pub fn expanded(&self) -> &HashSet<String> {
        &self.expanded
    }

    #[cfg(test)]
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_searching(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path)
    }

    pub fn find(&self, path: &str) -> Option<&Node> {
        self.root.as_ref()?.find(path)
    }

    /// Find the rows index of a node by its path.
    pub fn find_index_by_path(&self, path: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.path == path)
    }

    /// Replace the tree wholesale.
    ///
    /// The expansion set survives, minus paths that are no longer
    /// directories in the new tree.
    pub fn load(&mut self, root: Node) {
        let mut dirs = HashSet::new();
        root.directory_paths(&mut dirs);
        self.expanded.retain(|path| dirs.contains(path));
        self.root = Some(root);
        self.load_state = LoadState::Ready;
        if self.is_searching() {
            self.auto_expand();
        }
        self.reflatten();
    }

    /// Drop the tree after a failed fetch. No stale rows are kept.
    pub fn fail(&mut self, message: String) {
        self.root = None;
        self.rows.clear();
        self.load_state = LoadState::Failed(message);
    }

    /// Flip a directory open or closed.
    ///
    /// Returns `false` without touching anything when `path` is not a
    /// directory in the current tree.
    pub fn toggle(&mut self, path: &str) -> bool {
        let is_dir = self.find(path).is_some_and(Node::is_dir);
        if !is_dir {
            return false;
        }
        if !self.expanded.remove(path) {
            self.expanded.insert(path.to_string());
        }
        self.reflatten();
        true
    }

    /// Apply a committed search query. A non-empty query opens every
    /// directory that leads to a match; an empty one closes nothing.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        if self.is_searching() {
            self.auto_expand();
        }
        self.reflatten();
    }

    fn auto_expand(&mut self) {
        if let Some(root) = &self.root {
            let added = search::expand_matches(root, &self.query, &mut self.expanded);
            tracing::debug!(query = %self.query, added, "auto-expanded directories");
        }
    }

    /// Move a node among its siblings and re-flatten.
    pub fn reorder(
        &mut self,
        parent_path: &str,
        dragged_path: &str,
        target_path: &str,
        placement: DropPlacement,
    ) -> Option<ReorderOutcome> {
        let root = self.root.as_mut()?;
        let outcome =
            reorder::reorder_siblings(root, parent_path, dragged_path, target_path, placement)?;
        self.reflatten();
        Some(outcome)
    }

    /// Put a parent's children back in a previous order and re-flatten.
    pub fn restore_order(&mut self, parent_path: &str, previous: &[String]) -> bool {
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        let restored = reorder::restore_order(root, parent_path, previous);
        if restored {
            self.reflatten();
        }
        restored
    }

    /// Rebuild `rows` from the tree, expansion set and query.
    pub fn reflatten(&mut self) {
        self.rows = match &self.root {
            Some(root) => flatten(root, &self.expanded, &self.query),
            None => Vec::new(),
        };
        tracing::debug!(rows = self.rows.len(), query = %self.query, "flattened tree");
    }
}

impl Default for TreeViewState {
    fn default() -> Self {
        Self::new()
    }
}
