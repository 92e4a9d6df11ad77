//! Write-back: reconstructing documents from the tree.
//!
//! No type coercion happens here. A caller editing an integer field through a
//! text surface converts the input before calling `set_value`.

use metatree_document::Document;

use crate::error::{TreeError, TreeResult};
use crate::node::{Node, NodeId, NodeKey, ValueShape};
use crate::tree::DocumentTree;

impl DocumentTree {
    /// Reconstruct the document rooted at `id`, applying pending edits.
    ///
    /// Serializing Root yields a dictionary keyed by source identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] when `id` has been removed.
    pub fn serialize(&self, id: NodeId) -> TreeResult<Document> {
        let node = self.get(id)?;
        match node.shape() {
            None => node
                .effective_value()
                .cloned()
                .map(Document::Scalar)
                .ok_or(TreeError::ShapeMismatch {
                    node: id,
                    expected: "scalar leaf",
                    found: "container",
                }),
            Some(ValueShape::Scalar) => self.serialize(node.child_at(0)?),
            Some(ValueShape::List) => node
                .children()
                .iter()
                .map(|child| self.serialize(*child))
                .collect::<TreeResult<Vec<_>>>()
                .map(Document::List),
            Some(ValueShape::Dict) => {
                let mut entries = Vec::with_capacity(node.child_count());
                for child in node.children() {
                    entries.push((entry_name(self.get(*child)?), self.serialize(*child)?));
                }
                Ok(Document::dict(entries))
            }
        }
    }

    /// Reconstruct the document rooted at `id`, copying unedited branches from
    /// `base`.
    ///
    /// `base` must be the document the subtree was built from. Only branches
    /// carrying an edit are re-derived; a reshaped container is re-derived whole.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleNode`] when `id` has been removed.
    pub fn serialize_with_base(&self, id: NodeId, base: &Document) -> TreeResult<Document> {
        let node = self.get(id)?;
        if !node.is_edited() {
            return Ok(base.clone());
        }
        if node.is_reshaped() {
            return self.serialize(id);
        }
        match (node.shape(), base) {
            (Some(ValueShape::Scalar), _) => self.serialize_with_base(node.child_at(0)?, base),
            (Some(ValueShape::List), Document::List(items))
                if items.len() == node.child_count() =>
            {
                node.children()
                    .iter()
                    .zip(items)
                    .map(|(child, item)| self.serialize_with_base(*child, item))
                    .collect::<TreeResult<Vec<_>>>()
                    .map(Document::List)
            }
            (Some(ValueShape::Dict), Document::Dict(original)) => {
                let mut entries = Vec::with_capacity(node.child_count());
                for child in node.children() {
                    let name = entry_name(self.get(*child)?);
                    let value = match original.get(&name) {
                        Some(fragment) => self.serialize_with_base(*child, fragment)?,
                        None => self.serialize(*child)?,
                    };
                    entries.push((name, value));
                }
                Ok(Document::dict(entries))
            }
            _ => self.serialize(id),
        }
    }
}

fn entry_name(node: &Node) -> String {
    match node.key() {
        Some(NodeKey::Name(name)) => name.clone(),
        Some(NodeKey::Index(index)) => index.to_string(),
        None => String::new(),
    }
}
