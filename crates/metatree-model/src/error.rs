//! Error types for tree construction and navigation.

use metatree_document::ShapeError;
use thiserror::Error;

use crate::node::NodeId;

/// Failure while materializing a document into the tree.
///
/// Construction is atomic: when a build fails nothing has been attached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Value has no document representation.
    #[error("unsupported document shape")]
    UnsupportedShape {
        /// Path of the offending value inside the source.
        path: String,
        /// Name of the offending shape.
        found: &'static str,
    },
    /// Document nests deeper than the configured limit.
    #[error("document nesting too deep")]
    DepthExceeded {
        /// Nesting depth of the rejected document.
        depth: usize,
        /// Configured nesting limit.
        limit: usize,
    },
    /// Target container already holds a value of another shape.
    #[error("document shape conflicts with target container")]
    ShapeConflict {
        /// Shape held by the target container.
        expected: &'static str,
        /// Shape of the incoming document.
        found: &'static str,
    },
    /// Dictionary key already exists under the target container.
    #[error("duplicate dictionary key")]
    DuplicateKey {
        /// The colliding key.
        key: String,
    },
}

impl From<ShapeError> for BuildError {
    fn from(err: ShapeError) -> Self {
        Self::UnsupportedShape {
            path: err.path,
            found: err.found,
        }
    }
}

/// Primary error type for tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Node handle refers to a node that has been removed.
    #[error("node is no longer part of the tree")]
    StaleNode {
        /// The stale handle.
        node: NodeId,
    },
    /// Row index outside `0..len`.
    #[error("row index out of range")]
    IndexOutOfRange {
        /// Requested row.
        row: usize,
        /// Number of rows available.
        len: usize,
    },
    /// Root owns the whole forest and is only reset through `clear`.
    #[error("root node cannot be removed")]
    RootRemoval,
    /// Operation needs a container of another shape.
    #[error("node has the wrong shape for this operation")]
    ShapeMismatch {
        /// Node the operation targeted.
        node: NodeId,
        /// Shape the operation needs.
        expected: &'static str,
        /// Shape the node holds.
        found: &'static str,
    },
    /// Document could not be materialized.
    #[error("failed to build document subtree")]
    Build(#[from] BuildError),
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
