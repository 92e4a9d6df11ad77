//! Edit tracking.
//!
//! A node is edited when it has a pending value, when its own child set was
//! reshaped, or when any descendant is edited. Flags only ever flip to `true`
//! through an actual change; removal is the one path that recomputes them.

use crate::error::TreeResult;
use crate::node::{Node, NodeId};
use crate::observer::StructureChange;
use crate::tree::DocumentTree;

impl DocumentTree {
    /// Flag `id` and its ancestors as edited.
    ///
    /// Stops at the first node already flagged: its ancestors are flagged too.
    pub(crate) fn mark_edited(&mut self, id: NodeId) -> TreeResult<()> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.get_mut(current)?;
            if node.edited {
                break;
            }
            node.edited = true;
            cursor = node.parent;
            if current != id {
                self.notify(&StructureChange::DataChanged { node: current });
            }
        }
        Ok(())
    }

    /// Record that the child set of container `id` changed.
    pub(crate) fn mark_reshaped(&mut self, id: NodeId) -> TreeResult<()> {
        self.get_mut(id)?.reshaped = true;
        self.notify(&StructureChange::DataChanged { node: id });
        self.mark_edited(id)
    }

    /// Recompute flags from `id` upward after children went away.
    pub(crate) fn refresh_edited(&mut self, id: NodeId) -> TreeResult<()> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.get(current)?;
            let edited = node.has_own_change() || self.any_child_edited(node);
            if edited == node.edited {
                break;
            }
            cursor = node.parent;
            self.get_mut(current)?.edited = edited;
            self.notify(&StructureChange::DataChanged { node: current });
        }
        Ok(())
    }

    fn any_child_edited(&self, node: &Node) -> bool {
        node.children
            .iter()
            .any(|child| self.node(*child).is_some_and(Node::is_edited))
    }

    /// Returns the first node whose edited flag disagrees with its own change
    /// and its children's flags, or `None` when every flag is consistent.
    #[must_use]
    pub fn find_inconsistent_edit_flag(&self) -> Option<NodeId> {
        let mut stack = vec![self.root()];
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            let expected = node.has_own_change() || self.any_child_edited(node);
            if expected != node.is_edited() {
                return Some(current);
            }
            stack.extend(node.children().iter().copied());
        }
        None
    }
}
