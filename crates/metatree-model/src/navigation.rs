//! Navigation contract consumed by presentation layers.

use metatree_document::{Document, Scalar};

use crate::error::TreeResult;
use crate::node::{NodeId, NodeKey, NodeKind, ValueShape};
use crate::tree::DocumentTree;

/// Snapshot of the displayable state of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Role of the node.
    pub kind: NodeKind,
    /// Key within the parent.
    pub key: Option<NodeKey>,
    /// Effective scalar value for Scalar nodes.
    pub value: Option<Scalar>,
    /// Shape of a container's value.
    pub shape: Option<ValueShape>,
    /// Edited flag.
    pub edited: bool,
    /// Number of child rows.
    pub child_count: usize,
}

/// Minimal operation set a tree-shaped view needs.
///
/// Views address rows through [`NodeId`] handles only and never see the
/// internal node representation.
pub trait TreeNavigation {
    /// Number of child rows under `parent`; 0 for a stale handle.
    fn row_count(&self, parent: NodeId) -> usize;

    /// Child of `parent` at `row`.
    ///
    /// # Errors
    ///
    /// Fails for a stale parent or a row outside `0..row_count(parent)`.
    fn child_at(&self, parent: NodeId, row: usize) -> TreeResult<NodeId>;

    /// Parent of `node`; `None` for Root and stale handles.
    fn parent_of(&self, node: NodeId) -> Option<NodeId>;

    /// Displayable state of `node`; `None` for stale handles.
    fn data(&self, node: NodeId) -> Option<NodeData>;

    /// Replace the value at `node`; returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Fails for a stale node or an unbuildable value.
    fn set_data(&mut self, node: NodeId, value: Document) -> TreeResult<bool>;
}

impl TreeNavigation for DocumentTree {
    fn row_count(&self, parent: NodeId) -> usize {
        self.node(parent).map_or(0, |node| node.child_count())
    }

    fn child_at(&self, parent: NodeId, row: usize) -> TreeResult<NodeId> {
        self.get(parent)?.child_at(row)
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent()
    }

    fn data(&self, node: NodeId) -> Option<NodeData> {
        let node = self.node(node)?;
        Some(NodeData {
            kind: node.kind(),
            key: node.key().cloned(),
            value: node.effective_value().cloned(),
            shape: node.shape(),
            edited: node.is_edited(),
            child_count: node.child_count(),
        })
    }

    fn set_data(&mut self, node: NodeId, value: Document) -> TreeResult<bool> {
        self.set_value(node, &value)
    }
}
