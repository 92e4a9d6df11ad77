//! Arena-backed document tree: construction and structural mutation.

use std::fmt::{self, Debug, Formatter};

use metatree_document::bencode::{DEFAULT_MAX_DEPTH, MAX_SUPPORTED_DEPTH};
use metatree_document::{Document, Scalar};
use tracing::debug;

use crate::error::{BuildError, TreeError, TreeResult};
use crate::node::{Node, NodeId, NodeKey, NodeKind, ValueShape};
use crate::observer::{OpenBracket, StructureChange, TreeObserver};

/// Limits applied while materializing documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildLimits {
    /// Maximum container nesting accepted from a single document.
    pub max_depth: usize,
}

impl Default for BuildLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Forest of loaded documents under a single Root node.
///
/// The tree is not synchronized: it is owned and mutated by one control flow.
/// Observers are notified synchronously around every structural change.
pub struct DocumentTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    live: usize,
    limits: BuildLimits,
    observers: Vec<Box<dyn TreeObserver>>,
    bracket: Option<OpenBracket>,
}

impl Debug for DocumentTree {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DocumentTree")
            .field("root", &self.root)
            .field("live", &self.live)
            .field("limits", &self.limits)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    /// Construct an empty tree with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(BuildLimits::default())
    }

    /// Construct an empty tree with explicit limits. `max_depth` is capped at
    /// [`MAX_SUPPORTED_DEPTH`].
    #[must_use]
    pub fn with_limits(limits: BuildLimits) -> Self {
        let limits = BuildLimits {
            max_depth: limits.max_depth.min(MAX_SUPPORTED_DEPTH),
        };
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            live: 0,
            limits,
            observers: Vec::new(),
            bracket: None,
        };
        tree.root = tree.alloc(Node::container(
            NodeKind::Root,
            None,
            ValueShape::Dict,
            None,
        ));
        tree
    }

    /// Handle of the Root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Limits applied by build operations.
    #[must_use]
    pub const fn limits(&self) -> BuildLimits {
        self.limits
    }

    /// Number of live nodes, Root included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Whether Root owns no subtrees.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node(self.root).is_none_or(|root| !root.has_children())
    }

    /// Attach an observer that receives every subsequent structural change.
    pub fn subscribe(&mut self, observer: impl TreeObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Whether `id` names a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Live node for `id`.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Live node for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] when the node has been removed.
    pub fn get(&self, id: NodeId) -> TreeResult<&Node> {
        self.node(id).ok_or(TreeError::StaleNode { node: id })
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> TreeResult<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(TreeError::StaleNode { node: id })
    }

    /// Child of `parent` at `row`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] for a removed parent and
    /// [`TreeError::IndexOutOfRange`] for a row outside `0..child_count`.
    pub fn child_at(&self, parent: NodeId, row: usize) -> TreeResult<NodeId> {
        self.get(parent)?.child_at(row)
    }

    /// Row of `id` within its parent; 0 for Root and for detached nodes.
    #[must_use]
    pub fn index_in_parent(&self, id: NodeId) -> usize {
        self.node(id)
            .and_then(Node::parent)
            .and_then(|parent| self.node(parent))
            .and_then(|parent| parent.children.iter().position(|child| *child == id))
            .unwrap_or(0)
    }

    /// Loaded source subtrees in load order.
    #[must_use]
    pub fn source_roots(&self) -> &[NodeId] {
        self.node(self.root).map_or(&[][..], Node::children)
    }

    /// Subtree loaded under `source_id`.
    #[must_use]
    pub fn find_source(&self, source_id: &str) -> Option<NodeId> {
        self.child_by_name(self.root, source_id)
    }

    /// Loaded sources that carry at least one edit.
    #[must_use]
    pub fn edited_roots(&self) -> Vec<NodeId> {
        self.source_roots()
            .iter()
            .copied()
            .filter(|id| self.node(*id).is_some_and(Node::is_edited))
            .collect()
    }

    /// Materialize `document` under the container `into`.
    ///
    /// An empty container takes the document's shape. A container that already
    /// has children only accepts a document of the same shape, and the new rows
    /// are appended. Nothing is attached when validation fails. A container below
    /// Root that gains rows or changes shape counts as reshaped.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Build`] for depth, shape or key conflicts,
    /// [`TreeError::ShapeMismatch`] when `into` is a Scalar node, and
    /// [`TreeError::StaleNode`] when `into` has been removed.
    pub fn build(&mut self, document: &Document, into: NodeId) -> TreeResult<()> {
        self.check_depth(document)?;
        let target = self.get(into)?;
        let Some(shape) = target.shape else {
            return Err(TreeError::ShapeMismatch {
                node: into,
                expected: "container",
                found: target.shape_name(),
            });
        };
        let incoming = shape_of(document);
        let existing = target.children.len();
        if existing > 0 {
            if incoming != shape || incoming == ValueShape::Scalar {
                return Err(BuildError::ShapeConflict {
                    expected: shape.name(),
                    found: document.type_name(),
                }
                .into());
            }
            if let Document::Dict(entries) = document
                && let Some(key) = entries
                    .keys()
                    .find(|key| self.child_by_name(into, key).is_some())
            {
                return Err(BuildError::DuplicateKey { key: key.clone() }.into());
            }
        }

        self.get_mut(into)?.shape = Some(incoming);
        let count = row_count_of(document);
        if count > 0 {
            self.begin_insert(into, existing, existing + count - 1);
            let result = self.materialize(document, into, existing);
            self.end_insert();
            result?;
        }

        if into == self.root {
            self.refresh_edited(into)
        } else if count > 0 || incoming != shape {
            self.mark_reshaped(into)
        } else {
            Ok(())
        }
    }

    /// Append a new source subtree keyed by `source_id` under Root.
    ///
    /// All-or-nothing: validation runs before any node is allocated.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Build`] when the document is too deep, when Root
    /// holds a non-dictionary value, or when `source_id` is already loaded.
    pub fn add_root(
        &mut self,
        source_id: impl Into<String>,
        document: &Document,
    ) -> TreeResult<NodeId> {
        let source_id = source_id.into();
        self.check_depth(document)?;
        let root = self.root;
        let root_node = self.get(root)?;
        if root_node.shape != Some(ValueShape::Dict) && root_node.has_children() {
            return Err(BuildError::ShapeConflict {
                expected: root_node.shape_name(),
                found: "dict",
            }
            .into());
        }
        if self.child_by_name(root, &source_id).is_some() {
            return Err(BuildError::DuplicateKey { key: source_id }.into());
        }

        let row = root_node.children.len();
        self.get_mut(root)?.shape = Some(ValueShape::Dict);
        self.begin_insert(root, row, row);
        let entry = self.alloc(Node::container(
            NodeKind::MapEntry,
            Some(NodeKey::Name(source_id.clone())),
            shape_of(document),
            Some(root),
        ));
        let result = self
            .get_mut(root)
            .map(|root| root.children.push(entry))
            .and_then(|()| self.materialize(document, entry, 0));
        self.end_insert();
        result?;

        debug!(source = %source_id, node = %entry, row, "source subtree added");
        Ok(entry)
    }

    /// Append a source subtree from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnsupportedShape`] for `null`, booleans and
    /// non-integer numbers, plus every error of [`DocumentTree::add_root`].
    pub fn add_json_root(
        &mut self,
        source_id: impl Into<String>,
        value: &serde_json::Value,
    ) -> TreeResult<NodeId> {
        let document = Document::from_json(value).map_err(BuildError::from)?;
        self.add_root(source_id, &document)
    }

    /// Append `key → document` to the dictionary container `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::ShapeMismatch`] when `parent` is not a dictionary and
    /// [`TreeError::Build`] for duplicate keys or excessive depth.
    pub fn insert_entry(
        &mut self,
        parent: NodeId,
        key: impl Into<String>,
        document: &Document,
    ) -> TreeResult<NodeId> {
        let key = key.into();
        self.check_depth(document)?;
        let node = self.get(parent)?;
        if node.shape != Some(ValueShape::Dict) {
            return Err(TreeError::ShapeMismatch {
                node: parent,
                expected: "dict",
                found: node.shape_name(),
            });
        }
        if self.child_by_name(parent, &key).is_some() {
            return Err(BuildError::DuplicateKey { key }.into());
        }

        let row = node.children.len();
        self.begin_insert(parent, row, row);
        let entry = self.alloc(Node::container(
            NodeKind::MapEntry,
            Some(NodeKey::Name(key)),
            shape_of(document),
            Some(parent),
        ));
        let result = self
            .get_mut(parent)
            .map(|node| node.children.push(entry))
            .and_then(|()| self.materialize(document, entry, 0));
        self.end_insert();
        result?;

        self.mark_reshaped(parent)?;
        Ok(entry)
    }

    /// Insert `document` into the list container `parent` at `index`, shifting
    /// later slots down by one.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::ShapeMismatch`] when `parent` is not a list,
    /// [`TreeError::IndexOutOfRange`] when `index > len`, and
    /// [`TreeError::Build`] for excessive depth.
    pub fn insert_item(
        &mut self,
        parent: NodeId,
        index: usize,
        document: &Document,
    ) -> TreeResult<NodeId> {
        self.check_depth(document)?;
        let node = self.get(parent)?;
        if node.shape != Some(ValueShape::List) {
            return Err(TreeError::ShapeMismatch {
                node: parent,
                expected: "list",
                found: node.shape_name(),
            });
        }
        let len = node.children.len();
        if index > len {
            return Err(TreeError::IndexOutOfRange { row: index, len });
        }

        self.begin_insert(parent, index, index);
        let slot = self.alloc(Node::container(
            NodeKind::ListSlot,
            Some(NodeKey::Index(index)),
            shape_of(document),
            Some(parent),
        ));
        let result = self
            .get_mut(parent)
            .map(|node| node.children.insert(index, slot))
            .and_then(|()| self.materialize(document, slot, 0));
        self.end_insert();
        result?;

        self.renumber(parent, index + 1)?;
        self.mark_reshaped(parent)?;
        Ok(slot)
    }

    /// Detach and discard `id` with all of its descendants.
    ///
    /// Removing a Scalar leaf removes the entry that holds it. Removing a node
    /// that is already gone is a no-op and returns `false`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::RootRemoval`] for Root; use [`DocumentTree::clear`].
    pub fn remove_subtree(&mut self, id: NodeId) -> TreeResult<bool> {
        let Some(node) = self.node(id) else {
            return Ok(false);
        };
        if id == self.root {
            return Err(TreeError::RootRemoval);
        }
        let Some(mut parent) = node.parent else {
            return Ok(false);
        };
        let mut target = id;
        if node.kind == NodeKind::Scalar && parent != self.root {
            target = parent;
            let Some(holder_parent) = self.get(parent)?.parent else {
                return Ok(false);
            };
            parent = holder_parent;
        }

        let row = self.row_of(parent, target)?;
        self.begin_remove(parent, row, row);
        let detached = self.get_mut(parent).map(|node| node.children.remove(row));
        let released = detached.map(|child| self.release(child));
        self.end_remove();
        let released = released?;

        if self.get(parent)?.shape == Some(ValueShape::List) {
            self.renumber(parent, row)?;
        }
        if parent == self.root {
            let root = self.get_mut(parent)?;
            if root.children.is_empty() {
                root.shape = Some(ValueShape::Dict);
            }
            self.refresh_edited(parent)?;
        } else {
            self.mark_reshaped(parent)?;
        }

        debug!(node = %target, released, "subtree removed");
        Ok(true)
    }

    /// Remove every loaded subtree and reset Root.
    pub fn clear(&mut self) {
        let root = self.root;
        let count = self.node(root).map_or(0, Node::child_count);
        if count > 0 {
            self.begin_remove(root, 0, count - 1);
        }
        let children = self
            .get_mut(root)
            .map(|node| {
                node.shape = Some(ValueShape::Dict);
                node.pending = None;
                node.edited = false;
                node.reshaped = false;
                std::mem::take(&mut node.children)
            })
            .unwrap_or_default();
        let released: usize = children.into_iter().map(|child| self.release(child)).sum();
        if count > 0 {
            self.end_remove();
        }
        debug!(released, "tree cleared");
    }

    /// Replace the value at `id` with `document`.
    ///
    /// Returns `false` without touching any flag when `document` equals the
    /// current effective value. A Scalar node receiving a scalar records a pending
    /// value; every other change rebuilds the container's children. The node and
    /// all of its ancestors are then flagged as edited.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] for a removed node and
    /// [`TreeError::Build`] when the replacement is too deep.
    pub fn set_value(&mut self, id: NodeId, document: &Document) -> TreeResult<bool> {
        let node = self.get(id)?;
        match (node.kind, node.shape, document) {
            (NodeKind::Scalar, _, Document::Scalar(value)) => {
                if node.effective_value() == Some(value) {
                    return Ok(false);
                }
                self.get_mut(id)?.pending = Some(value.clone());
                self.notify(&StructureChange::DataChanged { node: id });
                self.mark_edited(id)?;
                debug!(node = %id, "scalar value edited");
                Ok(true)
            }
            (NodeKind::Scalar, _, _) => {
                let holder = node.parent.ok_or(TreeError::StaleNode { node: id })?;
                self.set_value(holder, document)
            }
            (_, Some(ValueShape::Scalar), Document::Scalar(_)) => {
                let leaf = node.child_at(0)?;
                self.set_value(leaf, document)
            }
            _ => {
                if self.serialize(id)? == *document {
                    return Ok(false);
                }
                self.replace_contents(id, document)?;
                Ok(true)
            }
        }
    }

    /// Replace a scalar value; see [`DocumentTree::set_value`].
    ///
    /// # Errors
    ///
    /// Same as [`DocumentTree::set_value`].
    pub fn set_scalar(&mut self, id: NodeId, value: impl Into<Scalar>) -> TreeResult<bool> {
        self.set_value(id, &Document::Scalar(value.into()))
    }

    fn replace_contents(&mut self, id: NodeId, document: &Document) -> TreeResult<()> {
        self.check_depth(document)?;
        let count = self.get(id)?.children.len();
        if count > 0 {
            self.begin_remove(id, 0, count - 1);
            let children = self
                .get_mut(id)
                .map(|node| std::mem::take(&mut node.children));
            let released = children.map(|children| {
                children
                    .into_iter()
                    .map(|child| self.release(child))
                    .sum::<usize>()
            });
            self.end_remove();
            released?;
        }

        self.get_mut(id)?.shape = Some(shape_of(document));
        let rows = row_count_of(document);
        if rows > 0 {
            self.begin_insert(id, 0, rows - 1);
            let result = self.materialize(document, id, 0);
            self.end_insert();
            result?;
        }
        self.mark_reshaped(id)?;
        debug!(node = %id, rows, "container contents replaced");
        Ok(())
    }

    fn materialize(&mut self, document: &Document, parent: NodeId, offset: usize) -> TreeResult<()> {
        match document {
            Document::Scalar(value) => {
                let leaf = self.alloc(Node::leaf(value.clone(), parent));
                self.get_mut(parent)?.children.push(leaf);
            }
            Document::List(items) => {
                for (position, item) in items.iter().enumerate() {
                    let slot = self.alloc(Node::container(
                        NodeKind::ListSlot,
                        Some(NodeKey::Index(offset + position)),
                        shape_of(item),
                        Some(parent),
                    ));
                    self.get_mut(parent)?.children.push(slot);
                    self.materialize(item, slot, 0)?;
                }
            }
            Document::Dict(entries) => {
                for (key, value) in entries {
                    let entry = self.alloc(Node::container(
                        NodeKind::MapEntry,
                        Some(NodeKey::Name(key.clone())),
                        shape_of(value),
                        Some(parent),
                    ));
                    self.get_mut(parent)?.children.push(entry);
                    self.materialize(value, entry, 0)?;
                }
            }
        }
        Ok(())
    }

    fn check_depth(&self, document: &Document) -> Result<(), BuildError> {
        let depth = document.depth();
        if depth > self.limits.max_depth {
            return Err(BuildError::DepthExceeded {
                depth,
                limit: self.limits.max_depth,
            });
        }
        Ok(())
    }

    pub(crate) fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)?.children.iter().copied().find(|child| {
            self.node(*child)
                .is_some_and(|node| matches!(&node.key, Some(NodeKey::Name(key)) if key == name))
        })
    }

    fn row_of(&self, parent: NodeId, child: NodeId) -> TreeResult<usize> {
        self.get(parent)?
            .children
            .iter()
            .position(|candidate| *candidate == child)
            .ok_or(TreeError::StaleNode { node: child })
    }

    fn renumber(&mut self, parent: NodeId, from: usize) -> TreeResult<()> {
        let children = self.get(parent)?.children.clone();
        for (row, child) in children.into_iter().enumerate().skip(from) {
            self.get_mut(child)?.key = Some(NodeKey::Index(row));
            self.notify(&StructureChange::DataChanged { node: child });
        }
        Ok(())
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).expect("node arena exhausted");
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Free `id` and its descendants; returns the number of nodes released.
    fn release(&mut self, id: NodeId) -> usize {
        let mut released = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(slot) = self.slots.get_mut(next.index as usize)
                && slot.generation == next.generation
                && let Some(node) = slot.node.take()
            {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(next.index);
                self.live -= 1;
                released += 1;
                stack.extend(node.children);
            }
        }
        released
    }

    pub(crate) fn notify(&mut self, change: &StructureChange) {
        for observer in &mut self.observers {
            observer.on_change(change);
        }
    }

    fn begin_insert(&mut self, parent: NodeId, first: usize, last: usize) {
        debug_assert!(self.bracket.is_none(), "structural bracket already open");
        self.bracket = Some(OpenBracket::Insert {
            parent,
            first,
            last,
        });
        self.notify(&StructureChange::RowsAboutToBeInserted {
            parent,
            first,
            last,
        });
    }

    fn end_insert(&mut self) {
        let bracket = self.bracket.take();
        debug_assert!(
            matches!(bracket, Some(OpenBracket::Insert { .. })),
            "rows inserted without an open insert bracket"
        );
        if let Some(OpenBracket::Insert {
            parent,
            first,
            last,
        }) = bracket
        {
            self.notify(&StructureChange::RowsInserted {
                parent,
                first,
                last,
            });
        }
    }

    fn begin_remove(&mut self, parent: NodeId, first: usize, last: usize) {
        debug_assert!(self.bracket.is_none(), "structural bracket already open");
        self.bracket = Some(OpenBracket::Remove {
            parent,
            first,
            last,
        });
        self.notify(&StructureChange::RowsAboutToBeRemoved {
            parent,
            first,
            last,
        });
    }

    fn end_remove(&mut self) {
        let bracket = self.bracket.take();
        debug_assert!(
            matches!(bracket, Some(OpenBracket::Remove { .. })),
            "rows removed without an open remove bracket"
        );
        if let Some(OpenBracket::Remove {
            parent,
            first,
            last,
        }) = bracket
        {
            self.notify(&StructureChange::RowsRemoved {
                parent,
                first,
                last,
            });
        }
    }
}

const fn shape_of(document: &Document) -> ValueShape {
    match document {
        Document::Scalar(_) => ValueShape::Scalar,
        Document::List(_) => ValueShape::List,
        Document::Dict(_) => ValueShape::Dict,
    }
}

fn row_count_of(document: &Document) -> usize {
    match document {
        Document::Scalar(_) => 1,
        Document::List(items) => items.len(),
        Document::Dict(entries) => entries.len(),
    }
}
