use std::collections::HashSet;

use serde_json::Value;

/// Type of tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

impl NodeKind {
    /// Parse the backend's `type` field.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "directory" => Some(NodeKind::Directory),
            "file" => Some(NodeKind::File),
            _ => None,
        }
    }
}

/// A node in the document tree.
///
/// `path` is the identity key: lookups, selection and drag matching all go
/// through it. Child order is render order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub display_name: Option<String>,
    pub path: String,
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Node {
    /// Create a file node.
    #[cfg(test)]
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            path: path.into(),
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    /// Create a directory node with the given children.
    pub fn directory(name: impl Into<String>, path: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            path: path.into(),
            kind: NodeKind::Directory,
            children,
        }
    }

    #[cfg(test)]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// The text shown for this node: the display name when present, else the name.
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(display) if !display.is_empty() => display,
            _ => &self.name,
        }
    }

    /// Find a node by path, including `self`.
    pub fn find(&self, target: &str) -> Option<&Node> {
        if self.path == target {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(target))
    }

    /// Find a mutable reference to a node by path, including `self`.
    pub fn find_mut(&mut self, target: &str) -> Option<&mut Node> {
        if self.path == target {
            return Some(self);
        }
        for child in self.children.iter_mut() {
            if let Some(found) = child.find_mut(target) {
                return Some(found);
            }
        }
        None
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    /// Collect every directory path in this subtree.
    pub fn directory_paths(&self, out: &mut HashSet<String>) {
        if self.is_dir() {
            out.insert(self.path.clone());
            for child in &self.children {
                child.directory_paths(out);
            }
        }
    }

    /// Build a tree from the backend's JSON, degrading malformed entries.
    ///
    /// Missing names fall back to the last path segment, missing paths are
    /// derived from the parent, directories without `children` are childless,
    /// non-object children are skipped and duplicate paths are dropped.
    pub fn from_json(value: &Value) -> Node {
        let mut seen = HashSet::new();
        node_from_value(value, None, &mut seen).unwrap_or_else(|| Node::directory("", "", Vec::new()))
    }
}

fn node_from_value(value: &Value, parent: Option<&str>, seen: &mut HashSet<String>) -> Option<Node> {
    let obj = value.as_object()?;

    let raw_name = obj.get("name").and_then(Value::as_str);
    let raw_path = obj.get("path").and_then(Value::as_str);

    let path = match (raw_path, parent) {
        (Some(p), _) => p.to_string(),
        (None, None) => String::new(),
        (None, Some("")) => raw_name.unwrap_or_default().to_string(),
        (None, Some(parent)) => format!("{}/{}", parent, raw_name.unwrap_or_default()),
    };

    if !seen.insert(path.clone()) {
        tracing::warn!(path = %path, "dropping node with duplicate path");
        return None;
    }

    let name = match raw_name {
        Some(n) => n.to_string(),
        None => path.rsplit('/').next().unwrap_or_default().to_string(),
    };

    let raw_children = obj.get("children").and_then(Value::as_array);
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(NodeKind::from_wire)
        .unwrap_or(if raw_children.is_some() {
            NodeKind::Directory
        } else {
            NodeKind::File
        });

    let children = match (kind, raw_children) {
        (NodeKind::Directory, Some(items)) => items
            .iter()
            .filter_map(|child| node_from_value(child, Some(&path), seen))
            .collect(),
        _ => Vec::new(),
    };

    let display_name = obj
        .get("displayName")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Some(Node {
        name,
        display_name,
        path,
        kind,
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_well_formed() {
        let value = json!({
            "name": "src", "path": "", "type": "directory",
            "children": [
                { "name": "guide", "path": "guide", "type": "directory", "children": [
                    { "name": "01-intro.md", "path": "guide/01-intro.md", "type": "file", "displayName": "intro" }
                ]},
                { "name": "readme.md", "path": "readme.md", "type": "file" }
            ]
        });
        let root = Node::from_json(&value);
        assert!(root.is_dir());
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].children[0].label(), "intro");
        assert_eq!(root.children[1].kind, NodeKind::File);
        assert_eq!(root.count(), 4);
    }

    #[test]
    fn directory_without_children_is_childless() {
        let root = Node::from_json(&json!({
            "name": "src", "path": "", "type": "directory",
            "children": [{ "name": "empty", "path": "empty", "type": "directory" }]
        }));
        let empty = root.find("empty").unwrap();
        assert!(empty.is_dir());
        assert!(empty.children.is_empty());
    }

    #[test]
    fn missing_fields_degrade_to_defaults() {
        let root = Node::from_json(&json!({
            "path": "",
            "children": [
                { "path": "docs/a.md" },
                { "name": "b.md", "type": "file" },
                { "name": "weird", "type": "symlink" },
                42,
                "not a node"
            ]
        }));
        // No type but a children array: directory.
        assert!(root.is_dir());
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[0].name, "a.md");
        assert_eq!(root.children[0].kind, NodeKind::File);
        assert_eq!(root.children[1].path, "b.md");
        assert_eq!(root.children[2].kind, NodeKind::File);
    }

    #[test]
    fn derived_paths_nest_under_parent() {
        let root = Node::from_json(&json!({
            "name": "src", "path": "",
            "children": [{ "name": "guide", "type": "directory", "children": [{ "name": "x.md" }] }]
        }));
        assert!(root.find("guide/x.md").is_some());
    }

    #[test]
    fn duplicate_paths_are_dropped() {
        let root = Node::from_json(&json!({
            "name": "src", "path": "", "type": "directory",
            "children": [
                { "name": "a.md", "path": "a.md", "type": "file" },
                { "name": "a copy.md", "path": "a.md", "type": "file" }
            ]
        }));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "a.md");
    }

    #[test]
    fn non_object_root_becomes_empty_directory() {
        let root = Node::from_json(&json!([1, 2, 3]));
        assert!(root.is_dir());
        assert!(root.children.is_empty());
    }

    #[test]
    fn label_falls_back_to_name() {
        let node = Node::file("a.md", "a.md").with_display_name("");
        assert_eq!(node.label(), "a.md");
    }

    #[test]
    fn find_mut_reaches_nested_node() {
        let mut root = Node::directory(
            "src",
            "",
            vec![Node::directory("d", "d", vec![Node::file("f", "d/f")])],
        );
        root.find_mut("d/f").unwrap().name = "g".into();
        assert_eq!(root.find("d/f").unwrap().name, "g");
        assert!(root.find_mut("missing").is_none());
    }
}
