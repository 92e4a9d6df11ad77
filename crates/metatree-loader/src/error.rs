//! # Design
//!
//! - Keep error messages constant; store the failing source in fields.
//! - Parse failures are per source: the agent reports them and keeps loading.

use std::path::{Path, PathBuf};

use metatree_document::BencodeError;
use metatree_model::TreeError;
use thiserror::Error;

/// Failure to turn one source into a published subtree.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source could not be read.
    #[error("failed to read source")]
    Read {
        /// Source path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The source is larger than the configured limit.
    #[error("source exceeds size limit")]
    TooLarge {
        /// Source path.
        path: PathBuf,
        /// Observed size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },
    /// The source content is not a valid document.
    #[error("failed to decode source")]
    Decode {
        /// Source path.
        path: PathBuf,
        /// Decoder error with byte offset.
        source: BencodeError,
    },
    /// The parse task panicked or was cancelled.
    #[error("parse task failed")]
    Worker {
        /// Source path.
        path: PathBuf,
        /// Join error detail.
        detail: String,
    },
    /// The parsed document could not be attached to the tree.
    #[error("failed to publish source")]
    Publish {
        /// Source identifier under Root.
        source_id: String,
        /// Tree rejection.
        source: TreeError,
    },
}

impl LoadError {
    /// Path of the failing source, when the failure happened before publication.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. }
            | Self::TooLarge { path, .. }
            | Self::Decode { path, .. }
            | Self::Worker { path, .. } => Some(path),
            Self::Publish { .. } => None,
        }
    }
}

/// Convenience alias for loader results.
pub type LoadResult<T> = Result<T, LoadError>;
