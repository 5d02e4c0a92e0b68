use std::collections::HashMap;

use super::flatten::FlatRow;
use super::node::Node;

/// Where the dragged node lands relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPlacement {
    Before,
    After,
}

/// Vertical extent of a rendered row, in the same units as the pointer.
///
/// For renderers with sub-row pointer precision; terminal cells are too
/// coarse, so the TUI places drops by direction of travel instead.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBounds {
    pub top: f64,
    pub height: f64,
}

#[allow(dead_code)]
impl RowBounds {
    /// Strictly below the midpoint means after; at or above means before.
    pub fn placement_for(&self, pointer_y: f64) -> DropPlacement {
        if pointer_y > self.top + self.height / 2.0 {
            DropPlacement::After
        } else {
            DropPlacement::Before
        }
    }
}

/// One in-progress drag gesture. Only visual state changes until drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub dragged_path: String,
    pub dragged_parent_path: String,
    pub target_path: Option<String>,
    pub insert_after: bool,
}

impl DragSession {
    /// Start dragging `row`. Refused while a search filter is active.
    pub fn start(row: &FlatRow, searching: bool) -> Option<Self> {
        if searching {
            return None;
        }
        Some(Self {
            dragged_path: row.path.clone(),
            dragged_parent_path: row.parent_path.clone(),
            target_path: None,
            insert_after: false,
        })
    }

    /// Only siblings under the same parent, other than the dragged row itself.
    pub fn is_valid_target(&self, row: &FlatRow) -> bool {
        row.parent_path == self.dragged_parent_path && row.path != self.dragged_path
    }

    /// Move the drop indicator onto `target`. Invalid targets are ignored.
    pub fn drag_over(&mut self, target: &FlatRow, placement: DropPlacement) -> bool {
        if !self.is_valid_target(target) {
            return false;
        }
        self.target_path = Some(target.path.clone());
        self.insert_after = placement == DropPlacement::After;
        true
    }

    /// Pointer variant: placement comes from the target's vertical midpoint.
    #[allow(dead_code)]
    pub fn drag_over_at(&mut self, target: &FlatRow, bounds: RowBounds, pointer_y: f64) -> bool {
        self.drag_over(target, bounds.placement_for(pointer_y))
    }

    /// The pointer left `path`; drop its indicator if it was showing one.
    pub fn leave(&mut self, path: &str) {
        if self.target_path.as_deref() == Some(path) {
            self.target_path = None;
        }
    }

    pub fn placement(&self) -> DropPlacement {
        if self.insert_after {
            DropPlacement::After
        } else {
            DropPlacement::Before
        }
    }

    /// Indicator to draw on the row at `path`, if any.
    pub fn indicator_for(&self, path: &str) -> Option<DropPlacement> {
        (self.target_path.as_deref() == Some(path)).then(|| self.placement())
    }
}

/// Result of a successful in-memory reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderOutcome {
    pub parent_path: String,
    /// Child paths before the move, for rollback.
    pub previous: Vec<String>,
    /// Child paths after the move.
    pub current: Vec<String>,
    /// Child names after the move, as sent to the backend.
    pub order: Vec<String>,
}

/// Move `dragged_path` next to `target_path` among the children of `parent_path`.
///
/// The dragged node is removed first and the target is looked up again in
/// the shortened list, so moving a node downwards does not land one slot
/// too far. Returns `None` and leaves the tree untouched when either node is
/// not a child of that parent.
pub fn reorder_siblings(
    root: &mut Node,
    parent_path: &str,
    dragged_path: &str,
    target_path: &str,
    placement: DropPlacement,
) -> Option<ReorderOutcome> {
    if dragged_path == target_path {
        return None;
    }
    let parent = root.find_mut(parent_path)?;
    let children = &mut parent.children;

    let dragged_index = children.iter().position(|c| c.path == dragged_path)?;
    if !children.iter().any(|c| c.path == target_path) {
        return None;
    }
    let previous: Vec<String> = children.iter().map(|c| c.path.clone()).collect();

    let dragged = children.remove(dragged_index);
    let target_index = children.iter().position(|c| c.path == target_path)?;
    let insert_index = match placement {
        DropPlacement::Before => target_index,
        DropPlacement::After => target_index + 1,
    };
    children.insert(insert_index, dragged);

    Some(ReorderOutcome {
        parent_path: parent_path.to_string(),
        previous,
        current: children.iter().map(|c| c.path.clone()).collect(),
        order: children.iter().map(|c| c.name.clone()).collect(),
    })
}

/// Put the children of `parent_path` back into `previous` path order.
///
/// Children not listed in `previous` keep their relative order at the end.
pub fn restore_order(root: &mut Node, parent_path: &str, previous: &[String]) -> bool {
    let Some(parent) = root.find_mut(parent_path) else {
        return false;
    };
    let rank: HashMap<&str, usize> = previous
        .iter()
        .enumerate()
        .map(|(i, p)| (p.as_str(), i))
        .collect();
    parent
        .children
        .sort_by_key(|c| rank.get(c.path.as_str()).copied().unwrap_or(usize::MAX));
    true
}

/// What to do with the optimistic order when persisting it fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Keep the local order and only log.
    #[default]
    Keep,
    /// Restore the order from before the drop.
    Rollback,
}

impl FailurePolicy {
    /// Parse from config; anything but "rollback" keeps.
    pub fn from_config(s: &str) -> Self {
        match s {
            "rollback" => FailurePolicy::Rollback,
            _ => FailurePolicy::Keep,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FailurePolicy::Keep => "keep",
            FailurePolicy::Rollback => "rollback",
        }
    }
}

/// What a persistence completion means for the local tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Saved; nothing to do.
    Confirmed,
    /// Failed, local order kept.
    Kept,
    /// Failed, restore this parent to `previous`, the last order the
    /// backend is known to hold.
    Rollback {
        parent_path: String,
        previous: Vec<String>,
    },
    /// Failed, but a newer reorder of the same parent was issued since.
    Superseded,
    /// Ticket not known (e.g. cleared by a refresh).
    Unknown,
}

#[derive(Debug, Clone)]
struct PendingEntry {
    parent_path: String,
    current: Vec<String>,
}

/// Ledger of in-flight order writes, keyed by a monotonically increasing ticket.
///
/// Writes are delivered in issue order, so the backend holds the order of
/// the newest confirmed write, or the loaded order when none succeeded.
/// `persisted` tracks exactly that per parent.
#[derive(Debug, Default)]
pub struct PendingOrders {
    next_ticket: u64,
    entries: HashMap<u64, PendingEntry>,
    latest: HashMap<String, u64>,
    persisted: HashMap<String, Vec<String>>,
}

impl PendingOrders {
    /// Register a reorder and return its ticket.
    pub fn issue(&mut self, outcome: &ReorderOutcome) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.persisted
            .entry(outcome.parent_path.clone())
            .or_insert_with(|| outcome.previous.clone());
        self.entries.insert(
            ticket,
            PendingEntry {
                parent_path: outcome.parent_path.clone(),
                current: outcome.current.clone(),
            },
        );
        self.latest.insert(outcome.parent_path.clone(), ticket);
        ticket
    }

    pub fn in_flight(&self) -> usize {
        self.entries.len()
    }

    /// Settle a ticket according to the result and policy.
    pub fn resolve(&mut self, ticket: u64, succeeded: bool, policy: FailurePolicy) -> Resolution {
        let Some(entry) = self.entries.remove(&ticket) else {
            return Resolution::Unknown;
        };
        let is_latest = self.latest.get(&entry.parent_path) == Some(&ticket);
        if is_latest {
            self.latest.remove(&entry.parent_path);
        }

        if succeeded {
            self.persisted.insert(entry.parent_path, entry.current);
            return Resolution::Confirmed;
        }
        match policy {
            FailurePolicy::Keep => Resolution::Kept,
            FailurePolicy::Rollback if is_latest => {
                let previous = self
                    .persisted
                    .get(&entry.parent_path)
                    .cloned()
                    .unwrap_or_default();
                Resolution::Rollback {
                    parent_path: entry.parent_path,
                    previous,
                }
            }
            FailurePolicy::Rollback => Resolution::Superseded,
        }
    }

    /// Forget everything, e.g. after the tree was replaced.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.latest.clear();
        self.persisted.clear();
    }
}
