// src/model.rs
// =============================================================================
// Data types shared by the engine, the view providers, and the sinks.
//
// - Node: one directory or file produced by a view snapshot
// - TraversalContext: where the engine currently is (owned per call frame)
// - Statistics / Report: counters and the final summary of a run
// - MatchRecord: one file name that matched a keyword
// =============================================================================

use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
    File,
}

impl NodeKind {
    /// Prefix used on item log lines.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Directory => "DIRECTORY",
            NodeKind::File => "FILE",
        }
    }
}

/// A row in a rendered tree widget.
///
/// Rows are not stable identities across renders, so the handle carries the
/// row position together with the reference text used to re-find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHandle {
    pub index: usize,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeHandle {
    Url(Url),
    Row(RowHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub name: String,
    pub handle: NodeHandle,
    /// Ancestor names, root first. Does not include `name`.
    pub path: Vec<String>,
    pub match_tag: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind, name: impl Into<String>, handle: NodeHandle, path: Vec<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            handle,
            path,
            match_tag: None,
        }
    }

    pub fn with_match_tag(self, tag: Option<String>) -> Self {
        Self {
            match_tag: tag,
            ..self
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Slash-joined ancestor path (the node's directory).
    pub fn directory(&self) -> String {
        self.path.join("/")
    }

    /// Slash-joined path including the node's own name.
    pub fn full_path(&self) -> String {
        let mut parts = self.path.clone();
        parts.push(self.name.clone());
        parts.join("/")
    }

    /// Absolute URL for link-based nodes, full path for widget rows.
    pub fn location_display(&self) -> String {
        match &self.handle {
            NodeHandle::Url(url) => url.to_string(),
            NodeHandle::Row(_) => self.full_path(),
        }
    }

    /// Number of names in the full path; bounded by the max depth.
    pub fn path_len(&self) -> usize {
        self.path.len() + 1
    }
}

/// Where the engine is. A child context is a new value derived from its
/// parent; contexts are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalContext {
    pub location: Option<Url>,
    pub depth: usize,
    pub path: Vec<String>,
}

impl TraversalContext {
    pub fn root(location: Option<Url>) -> Self {
        Self {
            location,
            depth: 0,
            path: Vec::new(),
        }
    }

    pub fn child(&self, node: &Node) -> Self {
        let location = match &node.handle {
            NodeHandle::Url(url) => Some(url.clone()),
            NodeHandle::Row(_) => None,
        };

        let mut path = self.path.clone();
        path.push(node.name.clone());

        Self {
            location,
            depth: self.depth + 1,
            path,
        }
    }

    /// Human-readable label for log lines.
    pub fn describe(&self) -> String {
        match &self.location {
            Some(url) => url.to_string(),
            None if self.path.is_empty() => "/".to_string(),
            None => self.path.join("/"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub directories: usize,
    pub files: usize,
    pub warnings: usize,
    pub errors: usize,
    pub matches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub keyword: String,
    pub directory: String,
    pub file_name: String,
}

/// Final summary handed to the top-level driver.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub stats: Statistics,
    pub visited: usize,
    pub duration_secs: f64,
    pub interrupted: bool,
    pub matches: Vec<MatchRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, kind: NodeKind, path: &[&str]) -> Node {
        Node::new(
            kind,
            name,
            NodeHandle::Row(RowHandle {
                index: 1,
                reference: name.to_string(),
            }),
            path.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_full_path_and_directory() {
        let node = row("report.pdf", NodeKind::File, &["docs", "2024"]);
        assert_eq!(node.directory(), "docs/2024");
        assert_eq!(node.full_path(), "docs/2024/report.pdf");
        assert_eq!(node.location_display(), "docs/2024/report.pdf");
        assert_eq!(node.path_len(), 3);
    }

    #[test]
    fn test_child_context_extends_path() {
        let root = TraversalContext::root(None);
        let dir = row("docs", NodeKind::Directory, &[]);
        let child = root.child(&dir);

        assert_eq!(child.depth, 1);
        assert_eq!(child.path, vec!["docs".to_string()]);
        assert!(child.location.is_none());
        // The parent is untouched
        assert!(root.path.is_empty());
    }

    #[test]
    fn test_child_context_takes_url_location() {
        let base = Url::parse("http://example.com/pub/").unwrap();
        let root = TraversalContext::root(Some(base));
        let dir = Node::new(
            NodeKind::Directory,
            "a",
            NodeHandle::Url(Url::parse("http://example.com/pub/a/").unwrap()),
            vec![],
        );
        let child = root.child(&dir);
        assert_eq!(child.describe(), "http://example.com/pub/a/");
    }
}
