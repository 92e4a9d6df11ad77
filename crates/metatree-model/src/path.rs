//! Slash-separated paths addressing nodes below a subtree.
//!
//! Segments are dictionary keys or list indices. `~1` and `~0` escape `/` and
//! `~` inside keys, the same way JSON Pointer does.

use std::borrow::Cow;

use crate::node::{NodeId, NodeKey, NodeKind, ValueShape};
use crate::tree::DocumentTree;

impl DocumentTree {
    /// Follow `path` from `from`. Empty segments are ignored, so `""` and `"/"`
    /// resolve to `from` itself.
    #[must_use]
    pub fn resolve(&self, from: NodeId, path: &str) -> Option<NodeId> {
        let mut current = from;
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            let segment = unescape_segment(segment);
            let node = self.node(current)?;
            current = match node.shape()? {
                ValueShape::Dict => self.child_by_name(current, &segment)?,
                ValueShape::List => node.child_at(segment.parse().ok()?).ok()?,
                ValueShape::Scalar => return None,
            };
        }
        Some(current)
    }

    /// Path of `id` relative to the loaded source that contains it.
    ///
    /// Returns `None` for Root and for stale handles;
    /// a source node itself yields `""`.
    #[must_use]
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = id;
        loop {
            let node = self.node(current)?;
            let parent = node.parent()?;
            if parent == self.root() {
                break;
            }
            if node.kind() != NodeKind::Scalar
                && let Some(key) = node.key()
            {
                segments.push(match key {
                    NodeKey::Index(index) => index.to_string(),
                    NodeKey::Name(name) => escape_segment(name).into_owned(),
                });
            }
            current = parent;
        }
        segments.reverse();
        Some(segments.join("/"))
    }

    /// Scalar child of a scalar-valued entry; a Scalar node maps to itself.
    #[must_use]
    pub fn value_node(&self, entry: NodeId) -> Option<NodeId> {
        let node = self.node(entry)?;
        match (node.kind(), node.shape()) {
            (NodeKind::Scalar, _) => Some(entry),
            (_, Some(ValueShape::Scalar)) => node.children().first().copied(),
            _ => None,
        }
    }
}

/// Escape `~` and `/` inside a key.
#[must_use]
pub fn escape_segment(key: &str) -> Cow<'_, str> {
    if key.contains(['~', '/']) {
        Cow::Owned(key.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(key)
    }
}

/// Reverse [`escape_segment`].
#[must_use]
pub fn unescape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

#[cfg(test)]
mod tests {
    use metatree_document::Document;

    use super::*;

    #[test]
    fn resolves_and_reconstructs_paths() {
        let mut tree = DocumentTree::new();
        let document = Document::dict([(
            "info",
            Document::dict([
                (
                    "files",
                    Document::list([Document::dict([("length", Document::from(1))])]),
                ),
                ("a/b~c", Document::from("odd")),
            ]),
        )]);
        let source = tree.add_root("/tmp/x.torrent", &document).expect("added");

        let length = tree.resolve(source, "info/files/0/length").expect("length");
        assert_eq!(tree.path_of(length).as_deref(), Some("info/files/0/length"));
        let leaf = tree.value_node(length).expect("leaf");
        assert_eq!(tree.path_of(leaf).as_deref(), Some("info/files/0/length"));

        let odd = tree.resolve(source, "/info/a~1b~0c/").expect("escaped");
        assert_eq!(tree.path_of(odd).as_deref(), Some("info/a~1b~0c"));

        assert_eq!(tree.resolve(source, ""), Some(source));
        assert_eq!(tree.path_of(source).as_deref(), Some(""));
        assert_eq!(tree.path_of(tree.root()), None);
        assert_eq!(tree.resolve(source, "info/files/3"), None);
        assert_eq!(tree.resolve(source, "info/files/x"), None);
        assert_eq!(tree.resolve(source, "info/files/0/length/deeper"), None);
    }

    #[test]
    fn escaping_round_trips() {
        assert_eq!(escape_segment("plain"), Cow::Borrowed("plain"));
        assert_eq!(escape_segment("a/b~c"), "a~1b~0c");
        assert_eq!(unescape_segment("a~1b~0c"), "a/b~c");
        assert_eq!(unescape_segment("~01"), "~1");
    }
}
