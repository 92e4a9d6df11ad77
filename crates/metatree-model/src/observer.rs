//! Structural-change notifications for attached presentation layers.
//!
//! Every insertion or removal of a contiguous run of rows is bracketed: the
//! "about to" event carries the final row range and is delivered before the
//! mutation, the closing event after it.

use std::sync::{Arc, Mutex};

use crate::node::NodeId;

/// Change announced to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureChange {
    /// Rows `first..=last` will be inserted under `parent`.
    RowsAboutToBeInserted {
        /// Container receiving the rows.
        parent: NodeId,
        /// First inserted row.
        first: usize,
        /// Last inserted row.
        last: usize,
    },
    /// Rows `first..=last` were inserted under `parent`.
    RowsInserted {
        /// Container that received the rows.
        parent: NodeId,
        /// First inserted row.
        first: usize,
        /// Last inserted row.
        last: usize,
    },
    /// Rows `first..=last` will be removed from `parent`.
    RowsAboutToBeRemoved {
        /// Container losing the rows.
        parent: NodeId,
        /// First removed row.
        first: usize,
        /// Last removed row.
        last: usize,
    },
    /// Rows `first..=last` were removed from `parent`.
    RowsRemoved {
        /// Container that lost the rows.
        parent: NodeId,
        /// First removed row.
        first: usize,
        /// Last removed row.
        last: usize,
    },
    /// Value, key or edit flag of `node` changed.
    DataChanged {
        /// The changed node.
        node: NodeId,
    },
}

impl StructureChange {
    /// Machine-friendly discriminator.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RowsAboutToBeInserted { .. } => "rows_about_to_be_inserted",
            Self::RowsInserted { .. } => "rows_inserted",
            Self::RowsAboutToBeRemoved { .. } => "rows_about_to_be_removed",
            Self::RowsRemoved { .. } => "rows_removed",
            Self::DataChanged { .. } => "data_changed",
        }
    }
}

/// Receiver of structural-change notifications.
pub trait TreeObserver: Send {
    /// Handle one change. Called synchronously from the mutating operation.
    fn on_change(&mut self, change: &StructureChange);
}

/// Observer that records every change behind a shared handle.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    changes: Arc<Mutex<Vec<StructureChange>>>,
}

impl RecordingObserver {
    /// Construct an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the changes recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the change log mutex has been poisoned.
    #[must_use]
    pub fn changes(&self) -> Vec<StructureChange> {
        self.changes
            .lock()
            .expect("change log mutex poisoned")
            .clone()
    }

    /// Drain the recorded changes.
    ///
    /// # Panics
    ///
    /// Panics if the change log mutex has been poisoned.
    pub fn take(&self) -> Vec<StructureChange> {
        std::mem::take(&mut *self.changes.lock().expect("change log mutex poisoned"))
    }
}

impl TreeObserver for RecordingObserver {
    fn on_change(&mut self, change: &StructureChange) {
        self.changes
            .lock()
            .expect("change log mutex poisoned")
            .push(change.clone());
    }
}

/// Open bracket tracked by the tree between an "about to" and its closing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenBracket {
    Insert { parent: NodeId, first: usize, last: usize },
    Remove { parent: NodeId, first: usize, last: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_clones_share_the_log() {
        let recorder = RecordingObserver::new();
        let mut handle = recorder.clone();
        let node = NodeId {
            index: 0,
            generation: 0,
        };
        handle.on_change(&StructureChange::DataChanged { node });
        assert_eq!(recorder.changes().len(), 1);
        assert_eq!(recorder.take()[0].kind(), "data_changed");
        assert!(recorder.changes().is_empty());
    }
}
