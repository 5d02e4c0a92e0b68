use std::collections::HashSet;

use super::node::{Node, NodeKind};
use super::search::Matcher;

/// A flattened representation of a tree node for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub path: String,
    pub name: String,
    pub label: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub parent_path: String,
    pub child_count: usize,
}

impl FlatRow {
    fn new(node: &Node, parent_path: &str, depth: usize) -> Self {
        Self {
            path: node.path.clone(),
            name: node.name.clone(),
            label: node.label().to_string(),
            kind: node.kind,
            depth,
            parent_path: parent_path.to_string(),
            child_count: node.children.len(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// Flatten the tree below `root` into visible rows, depth-first pre-order.
///
/// The root itself is not a row. Without a query, a directory's children
/// appear only when its path is in `expanded`. With a query, every directory
/// is traversed and a node survives iff it or a descendant matches.
pub fn flatten(root: &Node, expanded: &HashSet<String>, query: &str) -> Vec<FlatRow> {
    let mut rows = Vec::new();
    match Matcher::new(query) {
        Some(matcher) => {
            for child in &root.children {
                flatten_filtered(child, &root.path, 0, &matcher, &mut rows);
            }
        }
        None => {
            for child in &root.children {
                flatten_node(child, &root.path, 0, expanded, &mut rows);
            }
        }
    }
    rows
}

fn flatten_node(
    node: &Node,
    parent_path: &str,
    depth: usize,
    expanded: &HashSet<String>,
    rows: &mut Vec<FlatRow>,
) {
    rows.push(FlatRow::new(node, parent_path, depth));

    if node.is_dir() && expanded.contains(&node.path) {
        for child in &node.children {
            flatten_node(child, &node.path, depth + 1, expanded, rows);
        }
    }
}

/// Push the node, then its surviving descendants; roll back if nothing in
/// the subtree matched. Returns whether the subtree matched.
fn flatten_filtered(
    node: &Node,
    parent_path: &str,
    depth: usize,
    matcher: &Matcher,
    rows: &mut Vec<FlatRow>,
) -> bool {
    let mark = rows.len();
    rows.push(FlatRow::new(node, parent_path, depth));

    let mut child_matches = false;
    for child in &node.children {
        if flatten_filtered(child, &node.path, depth + 1, matcher, rows) {
            child_matches = true;
        }
    }

    if child_matches || matcher.label_matches(node) {
        true
    } else {
        rows.truncate(mark);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(rows: &[FlatRow]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    fn set(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    /// `{ root: [dirA -> [f1, f2], dirB -> [f3]] }`
    fn two_dirs() -> Node {
        Node::directory(
            "src",
            "",
            vec![
                Node::directory(
                    "dirA",
                    "dirA",
                    vec![Node::file("f1", "dirA/f1"), Node::file("f2", "dirA/f2")],
                ),
                Node::directory("dirB", "dirB", vec![Node::file("f3", "dirB/f3")]),
            ],
        )
    }

    fn deep() -> Node {
        Node::directory(
            "src",
            "",
            vec![
                Node::directory(
                    "a",
                    "a",
                    vec![Node::directory(
                        "b",
                        "a/b",
                        vec![
                            Node::directory("c", "a/b/c", vec![Node::file("target.md", "a/b/c/target.md")]),
                            Node::file("other.md", "a/b/other.md"),
                        ],
                    )],
                ),
                Node::directory("x", "x", vec![Node::directory("y", "x/y", vec![Node::file("z.md", "x/y/z.md")])]),
                Node::file("readme.md", "readme.md"),
            ],
        )
    }

    #[test]
    fn collapsed_tree_yields_top_level_rows() {
        let rows = flatten(&two_dirs(), &HashSet::new(), "");
        assert_eq!(names(&rows), vec!["dirA", "dirB"]);
        assert!(rows.iter().all(|r| r.depth == 0));
        assert!(rows.iter().all(|r| r.parent_path.is_empty()));
    }

    #[test]
    fn expanded_directory_shows_children_in_order() {
        let rows = flatten(&two_dirs(), &set(&["dirA"]), "");
        assert_eq!(names(&rows), vec!["dirA", "f1", "f2", "dirB"]);
        assert_eq!(rows[1].depth, 1);
        assert_eq!(rows[1].parent_path, "dirA");
    }

    #[test]
    fn no_directory_first_sort() {
        let root = Node::directory(
            "src",
            "",
            vec![
                Node::file("z.md", "z.md"),
                Node::directory("a", "a", vec![]),
                Node::file("b.md", "b.md"),
            ],
        );
        let rows = flatten(&root, &HashSet::new(), "");
        assert_eq!(names(&rows), vec!["z.md", "a", "b.md"]);
    }

    #[test]
    fn expanded_child_under_collapsed_parent_is_hidden() {
        let rows = flatten(&deep(), &set(&["a/b"]), "");
        assert_eq!(names(&rows), vec!["a", "x", "readme.md"]);
    }

    #[test]
    fn flatten_is_deterministic() {
        let root = deep();
        let expanded = set(&["a", "a/b", "x"]);
        assert_eq!(flatten(&root, &expanded, ""), flatten(&root, &expanded, ""));
        assert_eq!(flatten(&root, &expanded, "md"), flatten(&root, &expanded, "md"));
    }

    #[test]
    fn row_count_never_exceeds_node_count() {
        let root = deep();
        let all_dirs = set(&["a", "a/b", "a/b/c", "x", "x/y"]);
        let rows = flatten(&root, &all_dirs, "");
        // Every node except the root is a row when everything is expanded.
        assert_eq!(rows.len(), root.count() - 1);
        assert!(flatten(&root, &HashSet::new(), "m").len() <= root.count());
    }

    #[test]
    fn deep_match_keeps_ancestors_and_drops_unrelated() {
        let rows = flatten(&deep(), &HashSet::new(), "target");
        assert_eq!(names(&rows), vec!["a", "b", "c", "target.md"]);
        assert_eq!(rows[3].depth, 3);
    }

    #[test]
    fn search_traverses_regardless_of_expansion() {
        let rows = flatten(&deep(), &HashSet::new(), ".md");
        assert_eq!(
            names(&rows),
            vec!["a", "b", "c", "target.md", "other.md", "x", "y", "z.md", "readme.md"]
        );
    }

    #[test]
    fn matching_directory_without_matching_children_drops_children() {
        let rows = flatten(&two_dirs(), &set(&["dirA"]), "dira");
        assert_eq!(names(&rows), vec!["dirA"]);
    }

    #[test]
    fn search_inclusion_equals_subtree_predicate() {
        let root = deep();
        let matcher = Matcher::new("z").unwrap();
        let rows = flatten(&root, &HashSet::new(), "z");
        for row in &rows {
            assert!(matcher.subtree_matches(root.find(&row.path).unwrap()));
        }
        assert_eq!(names(&rows), vec!["x", "y", "z.md"]);
    }

    #[test]
    fn empty_tree_and_no_match_are_both_empty() {
        let empty = Node::directory("src", "", vec![]);
        assert!(flatten(&empty, &HashSet::new(), "").is_empty());
        assert!(flatten(&two_dirs(), &HashSet::new(), "nothing-here").is_empty());
    }

    #[test]
    fn file_root_has_no_rows() {
        let root = Node::file("lonely.md", "lonely.md");
        assert!(flatten(&root, &HashSet::new(), "").is_empty());
    }

    #[test]
    fn child_count_is_recorded() {
        let rows = flatten(&two_dirs(), &HashSet::new(), "");
        assert_eq!(rows[0].child_count, 2);
        assert_eq!(rows[1].child_count, 1);
    }
}
