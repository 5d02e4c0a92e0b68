use std::collections::HashSet;
use std::time::{Duration, Instant};

use super::node::Node;

/// Default quiet period before a typed query is committed.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Case-insensitive substring matcher over node labels.
///
/// This is the single inclusion predicate shared by flattening and
/// auto-expansion.
#[derive(Debug, Clone)]
pub struct Matcher {
    needle: String,
}

impl Matcher {
    /// Build a matcher, or `None` for an empty query.
    pub fn new(query: &str) -> Option<Self> {
        if query.is_empty() {
            return None;
        }
        Some(Self {
            needle: query.to_lowercase(),
        })
    }

    /// Whether the node's own label contains the query.
    pub fn label_matches(&self, node: &Node) -> bool {
        node.label().to_lowercase().contains(&self.needle)
    }

    /// Whether the node or any of its descendants matches.
    #[cfg(test)]
    pub fn subtree_matches(&self, node: &Node) -> bool {
        self.label_matches(node) || node.children.iter().any(|c| self.subtree_matches(c))
    }
}

/// Add every directory below `root` whose subtree contains a match.
///
/// Returns how many paths were newly inserted. Nothing is ever removed.
pub fn expand_matches(root: &Node, query: &str, expanded: &mut HashSet<String>) -> usize {
    let Some(matcher) = Matcher::new(query) else {
        return 0;
    };
    let before = expanded.len();
    for child in &root.children {
        expand_node(child, &matcher, expanded);
    }
    expanded.len() - before
}

/// Post-order walk; returns whether this subtree contains a match.
fn expand_node(node: &Node, matcher: &Matcher, expanded: &mut HashSet<String>) -> bool {
    let mut child_matches = false;
    for child in &node.children {
        if expand_node(child, matcher, expanded) {
            child_matches = true;
        }
    }
    if child_matches && node.is_dir() {
        expanded.insert(node.path.clone());
    }
    child_matches || matcher.label_matches(node)
}

/// Debounced search input.
///
/// Keystrokes edit `pending`; a single deadline is re-armed on every edit and
/// the query is committed only once it passes without further input.
#[derive(Debug)]
pub struct SearchEngine {
    pending: String,
    committed: String,
    deadline: Option<Instant>,
    debounce: Duration,
}

impl SearchEngine {
    pub fn new(debounce: Duration) -> Self {
        Self {
            pending: String::new(),
            committed: String::new(),
            deadline: None,
            debounce,
        }
    }

    /// The text as typed, not yet necessarily committed.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// The query currently applied to the tree.
    pub fn committed(&self) -> &str {
        &self.committed
    }

    /// Whether a commit is scheduled.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn input_char(&mut self, c: char, now: Instant) {
        self.pending.push(c);
        self.rearm(now);
    }

    pub fn delete_char(&mut self, now: Instant) {
        if self.pending.pop().is_some() {
            self.rearm(now);
        }
    }

    #[cfg(test)]
    pub fn set_pending(&mut self, text: &str, now: Instant) {
        self.pending = text.to_string();
        self.rearm(now);
    }

    fn rearm(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    /// Commit the pending query if the quiet period has elapsed.
    ///
    /// Returns the new committed query only when it differs from the old one.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.commit_now(),
            _ => None,
        }
    }

    /// Commit immediately, skipping the debounce.
    pub fn commit_now(&mut self) -> Option<String> {
        self.deadline = None;
        let query = self.pending.trim().to_string();
        if query == self.committed {
            return None;
        }
        self.committed = query.clone();
        Some(query)
    }

    /// Clear the input and commit the empty query right away.
    pub fn clear(&mut self) -> Option<String> {
        self.pending.clear();
        self.commit_now()
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::directory(
            "src",
            "",
            vec![
                Node::directory(
                    "dirA",
                    "dirA",
                    vec![Node::file("f1", "dirA/f1"), Node::file("f2", "dirA/f2")],
                ),
                Node::directory(
                    "dirB",
                    "dirB",
                    vec![Node::directory(
                        "deep",
                        "dirB/deep",
                        vec![Node::file("Needle.md", "dirB/deep/Needle.md")],
                    )],
                ),
            ],
        )
    }

    #[test]
    fn matcher_is_case_insensitive() {
        let m = Matcher::new("NEEDLE").unwrap();
        assert!(m.label_matches(&Node::file("needle.md", "needle.md")));
        assert!(!m.label_matches(&Node::file("hay.md", "hay.md")));
    }

    #[test]
    fn matcher_uses_display_name() {
        let m = Matcher::new("intro").unwrap();
        let node = Node::file("01-intro.md", "01-intro.md").with_display_name("Introduction");
        assert!(m.label_matches(&node));
        let m = Matcher::new("01-").unwrap();
        assert!(!m.label_matches(&node));
    }

    #[test]
    fn empty_query_has_no_matcher() {
        assert!(Matcher::new("").is_none());
    }

    #[test]
    fn subtree_matches_sees_descendants() {
        let root = sample();
        let m = Matcher::new("needle").unwrap();
        assert!(m.subtree_matches(root.find("dirB").unwrap()));
        assert!(!m.subtree_matches(root.find("dirA").unwrap()));
    }

    #[test]
    fn expand_matches_adds_ancestors_only() {
        let root = sample();
        let mut expanded = HashSet::new();
        let added = expand_matches(&root, "needle", &mut expanded);
        assert_eq!(added, 2);
        assert!(expanded.contains("dirB"));
        assert!(expanded.contains("dirB/deep"));
        assert!(!expanded.contains("dirA"));
    }

    #[test]
    fn expand_matches_never_removes() {
        let root = sample();
        let mut expanded: HashSet<String> = ["dirA".to_string()].into_iter().collect();
        expand_matches(&root, "needle", &mut expanded);
        assert!(expanded.contains("dirA"));
        assert_eq!(expand_matches(&root, "", &mut expanded), 0);
        assert_eq!(expanded.len(), 3);
    }

    #[test]
    fn debounce_commits_after_quiet_period() {
        let t0 = Instant::now();
        let mut search = SearchEngine::new(Duration::from_millis(300));
        search.input_char('f', t0);
        search.input_char('3', t0 + Duration::from_millis(100));
        assert_eq!(search.poll(t0 + Duration::from_millis(350)), None);
        assert_eq!(
            search.poll(t0 + Duration::from_millis(400)),
            Some("f3".to_string())
        );
        assert_eq!(search.committed(), "f3");
        assert!(!search.is_pending());
    }

    #[test]
    fn debounce_only_commits_final_input() {
        let t0 = Instant::now();
        let mut search = SearchEngine::new(Duration::from_millis(300));
        for (i, c) in "abc".chars().enumerate() {
            search.input_char(c, t0 + Duration::from_millis(i as u64 * 50));
        }
        assert_eq!(search.poll(t0 + Duration::from_millis(200)), None);
        assert_eq!(
            search.poll(t0 + Duration::from_millis(1000)),
            Some("abc".to_string())
        );
        assert_eq!(search.poll(t0 + Duration::from_millis(2000)), None);
    }

    #[test]
    fn commit_trims_and_skips_unchanged() {
        let t0 = Instant::now();
        let mut search = SearchEngine::default();
        search.set_pending("  guide ", t0);
        assert_eq!(search.commit_now(), Some("guide".to_string()));
        search.set_pending("guide", t0);
        assert_eq!(search.commit_now(), None);
    }

    #[test]
    fn clear_commits_empty_immediately() {
        let t0 = Instant::now();
        let mut search = SearchEngine::default();
        search.set_pending("x", t0);
        search.commit_now();
        assert_eq!(search.clear(), Some(String::new()));
        assert_eq!(search.pending(), "");
        assert!(!search.is_pending());
    }

    #[test]
    fn delete_on_empty_does_not_arm() {
        let mut search = SearchEngine::default();
        search.delete_char(Instant::now());
        assert!(!search.is_pending());
    }
}
