//! Tree node types.

use std::fmt::{self, Display, Formatter};

use metatree_document::Scalar;

use crate::error::{TreeError, TreeResult};

/// Generational handle to a node in a [`DocumentTree`](crate::DocumentTree).
///
/// A handle outlives the node it names; once the node is removed the handle is
/// stale and never resolves to a later node reusing the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Display for NodeId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}v{}", self.index, self.generation)
    }
}

/// Position of a node inside its parent container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    /// List position.
    Index(usize),
    /// Dictionary key or source identifier.
    Name(String),
}

impl Display for NodeKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(formatter, "{index}"),
            Self::Name(name) => formatter.write_str(name),
        }
    }
}

/// Role a node plays in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The single top-level node.
    Root,
    /// Entry of a dictionary, keyed by name.
    MapEntry,
    /// Slot of a list, keyed by index.
    ListSlot,
    /// Leaf holding a scalar.
    Scalar,
}

/// Shape of the value a container node holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    /// Exactly one Scalar child.
    Scalar,
    /// `ListSlot` children ordered by index.
    List,
    /// `MapEntry` children in insertion order.
    Dict,
}

impl ValueShape {
    /// Short machine-friendly name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::List => "list",
            Self::Dict => "dict",
        }
    }
}

/// One addressable position in the tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) key: Option<NodeKey>,
    pub(crate) value: Option<Scalar>,
    pub(crate) pending: Option<Scalar>,
    pub(crate) shape: Option<ValueShape>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) edited: bool,
    pub(crate) reshaped: bool,
}

impl Node {
    pub(crate) const fn container(
        kind: NodeKind,
        key: Option<NodeKey>,
        shape: ValueShape,
        parent: Option<NodeId>,
    ) -> Self {
        Self {
            kind,
            key,
            value: None,
            pending: None,
            shape: Some(shape),
            parent,
            children: Vec::new(),
            edited: false,
            reshaped: false,
        }
    }

    pub(crate) const fn leaf(value: Scalar, parent: NodeId) -> Self {
        Self {
            kind: NodeKind::Scalar,
            key: None,
            value: Some(value),
            pending: None,
            shape: None,
            parent: Some(parent),
            children: Vec::new(),
            edited: false,
            reshaped: false,
        }
    }

    /// Role of this node.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Key within the parent; `None` for Root and Scalar nodes.
    #[must_use]
    pub const fn key(&self) -> Option<&NodeKey> {
        self.key.as_ref()
    }

    /// Value loaded from the source; `None` for containers.
    #[must_use]
    pub const fn value(&self) -> Option<&Scalar> {
        self.value.as_ref()
    }

    /// Value recorded by an edit, if any.
    #[must_use]
    pub const fn pending_value(&self) -> Option<&Scalar> {
        self.pending.as_ref()
    }

    /// Value that write-back will emit: the pending edit, else the loaded value.
    #[must_use]
    pub fn effective_value(&self) -> Option<&Scalar> {
        self.pending.as_ref().or(self.value.as_ref())
    }

    /// Shape of the held value; `None` for Scalar nodes.
    #[must_use]
    pub const fn shape(&self) -> Option<ValueShape> {
        self.shape
    }

    /// Parent handle; `None` for Root.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Whether this node or any descendant carries an edit.
    #[must_use]
    pub const fn is_edited(&self) -> bool {
        self.edited
    }

    /// Whether this container's own child set was changed.
    #[must_use]
    pub const fn is_reshaped(&self) -> bool {
        self.reshaped
    }

    /// Whether this node has at least one child.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Child handles in row order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Child at `row`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::IndexOutOfRange`] when `row >= child_count()`.
    pub fn child_at(&self, row: usize) -> TreeResult<NodeId> {
        self.children
            .get(row)
            .copied()
            .ok_or(TreeError::IndexOutOfRange {
                row,
                len: self.children.len(),
            })
    }

    pub(crate) const fn has_own_change(&self) -> bool {
        self.pending.is_some() || self.reshaped
    }

    pub(crate) fn shape_name(&self) -> &'static str {
        self.shape.map_or("scalar leaf", ValueShape::name)
    }
}
