//! Presentation adapter: turns node snapshots into display text.
//!
//! Previews never modify the stored value; binary payloads are truncated for
//! display only.

use std::fmt::Write as _;

use metatree_document::Scalar;

use crate::navigation::{NodeData, TreeNavigation};
use crate::node::{NodeId, NodeKey, NodeKind, ValueShape};

/// Default number of bytes shown for binary previews.
pub const DEFAULT_PREVIEW_BYTES: usize = 20;

/// Icon-like role of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayHint {
    /// The Root node.
    Root,
    /// A dictionary container.
    Dict,
    /// A list container.
    List,
    /// An entry or slot holding a scalar.
    Field,
    /// Integer scalar.
    Integer,
    /// Text scalar.
    Text,
    /// Binary scalar.
    Binary,
}

impl DisplayHint {
    /// Machine-friendly name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Dict => "dict",
            Self::List => "list",
            Self::Field => "field",
            Self::Integer => "integer",
            Self::Text => "text",
            Self::Binary => "binary",
        }
    }
}

/// Maps [`NodeData`] to labels and previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePresenter {
    preview_bytes: usize,
}

impl Default for NodePresenter {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_BYTES)
    }
}

impl NodePresenter {
    /// Presenter truncating binary previews after `preview_bytes` bytes.
    #[must_use]
    pub const fn new(preview_bytes: usize) -> Self {
        Self { preview_bytes }
    }

    /// Configured truncation limit.
    #[must_use]
    pub const fn preview_bytes(&self) -> usize {
        self.preview_bytes
    }

    /// Display role of a row.
    #[must_use]
    pub const fn hint(&self, data: &NodeData) -> DisplayHint {
        match (data.kind, &data.value, data.shape) {
            (NodeKind::Root, _, _) => DisplayHint::Root,
            (_, Some(Scalar::Integer(_)), _) => DisplayHint::Integer,
            (_, Some(Scalar::Text(_)), _) => DisplayHint::Text,
            (_, Some(Scalar::Bytes(_)), _) => DisplayHint::Binary,
            (_, None, Some(ValueShape::List)) => DisplayHint::List,
            (_, None, Some(ValueShape::Dict)) => DisplayHint::Dict,
            (_, None, _) => DisplayHint::Field,
        }
    }

    /// Row label: the entry name, `[i]` for list slots, `<root>` for Root.
    #[must_use]
    pub fn label(&self, data: &NodeData) -> String {
        match (&data.kind, &data.key) {
            (NodeKind::Root, _) => "<root>".to_string(),
            (_, Some(NodeKey::Name(name))) => name.clone(),
            (_, Some(NodeKey::Index(index))) => format!("[{index}]"),
            (_, None) => String::new(),
        }
    }

    /// Value preview for scalars, element counts for containers.
    #[must_use]
    pub fn preview(&self, data: &NodeData) -> String {
        match (&data.value, data.shape) {
            (Some(value), _) => self.preview_scalar(value),
            (None, Some(ValueShape::List)) => format!("list ({} items)", data.child_count),
            (None, Some(ValueShape::Dict)) => format!("dict ({} entries)", data.child_count),
            (None, _) => String::new(),
        }
    }

    /// Preview of a single scalar value.
    #[must_use]
    pub fn preview_scalar(&self, value: &Scalar) -> String {
        match value {
            Scalar::Integer(value) => value.to_string(),
            Scalar::Text(text) => format!("{text:?}"),
            Scalar::Bytes(bytes) => {
                let shown = bytes.len().min(self.preview_bytes);
                let mut out = String::with_capacity(shown * 2 + 16);
                for byte in &bytes[..shown] {
                    let _ = write!(out, "{byte:02x}");
                }
                if shown < bytes.len() {
                    let _ = write!(out, "... ({} bytes)", bytes.len());
                }
                out
            }
        }
    }

    /// One display line for `id`: label, preview, and a `*` marker on edited
    /// rows. `None` for stale handles.
    ///
    /// An entry holding a scalar is shown with its value inline.
    #[must_use]
    pub fn render_row(&self, navigation: &dyn TreeNavigation, id: NodeId) -> Option<String> {
        let data = navigation.data(id)?;
        let marker = if data.edited { "*" } else { "" };
        let label = self.label(&data);
        let preview = if data.shape == Some(ValueShape::Scalar) {
            navigation
                .child_at(id, 0)
                .ok()
                .and_then(|leaf| navigation.data(leaf))
                .map(|leaf| self.preview(&leaf))
                .unwrap_or_default()
        } else {
            self.preview(&data)
        };
        Some(if preview.is_empty() {
            format!("{label}{marker}")
        } else {
            format!("{label}{marker}: {preview}")
        })
    }
}

#[cfg(test)]
mod tests {
    use metatree_document::Document;

    use super::*;
    use crate::tree::DocumentTree;

    #[test]
    fn binary_previews_are_truncated_for_display_only() {
        let presenter = NodePresenter::new(4);
        let pieces = Scalar::Bytes(vec![0xab; 40]);
        assert_eq!(presenter.preview_scalar(&pieces), "abababab... (40 bytes)");
        assert_eq!(
            presenter.preview_scalar(&Scalar::Bytes(vec![1, 2])),
            "0102"
        );
        assert_eq!(presenter.preview_scalar(&Scalar::from("x")), "\"x\"");
    }

    #[test]
    fn rows_render_with_hints_and_edit_markers() {
        let mut tree = DocumentTree::new();
        let source = tree
            .add_root(
                "a.torrent",
                &Document::dict([
                    ("length", Document::from(5)),
                    ("files", Document::list([Document::from("f")])),
                    ("pieces", Document::from(vec![0_u8; 30])),
                ]),
            )
            .expect("added");
        let presenter = NodePresenter::default();

        let length = tree.resolve(source, "length").expect("length");
        assert_eq!(presenter.render_row(&tree, length).as_deref(), Some("length: 5"));
        let files = tree.resolve(source, "files").expect("files");
        assert_eq!(
            presenter.render_row(&tree, files).as_deref(),
            Some("files: list (1 items)")
        );
        let slot = tree.resolve(files, "0").expect("slot");
        assert_eq!(presenter.render_row(&tree, slot).as_deref(), Some("[0]: \"f\""));

        let root = tree.data(tree.root()).expect("root");
        assert_eq!(presenter.hint(&root), DisplayHint::Root);
        assert_eq!(presenter.label(&root), "<root>");
        let pieces = tree
            .resolve(source, "pieces")
            .and_then(|entry| tree.value_node(entry))
            .and_then(|leaf| tree.data(leaf))
            .expect("pieces");
        assert_eq!(presenter.hint(&pieces), DisplayHint::Binary);
        assert!(presenter.preview(&pieces).ends_with("... (30 bytes)"));

        let leaf = tree.value_node(length).expect("leaf");
        tree.set_scalar(leaf, 6).expect("edited");
        assert_eq!(presenter.render_row(&tree, length).as_deref(), Some("length*: 6"));
        let entry = tree.data(length).expect("entry");
        assert_eq!(presenter.hint(&entry), DisplayHint::Field);
    }
}
