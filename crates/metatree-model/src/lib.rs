#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Editable tree model over nested documents.
//!
//! A [`DocumentTree`] owns one Root node and one subtree per loaded source.
//! Nodes live in a generational arena addressed by [`NodeId`]; edits are
//! tracked per node and propagated to ancestors so write-back can touch only
//! the branches that changed.
//!
//! Layout: `node.rs` (node types), `tree.rs` (arena, build, mutation),
//! `edit.rs` (edit propagation), `serialize.rs` (write-back), `observer.rs`
//! (structural-change brackets), `navigation.rs` (view contract), `path.rs`
//! (slash paths), `present.rs` (display adapter), `error.rs`.

pub mod edit;
pub mod error;
pub mod navigation;
pub mod node;
pub mod observer;
pub mod path;
pub mod present;
pub mod serialize;
pub mod tree;

pub use error::{BuildError, TreeError, TreeResult};
pub use navigation::{NodeData, TreeNavigation};
pub use node::{Node, NodeId, NodeKey, NodeKind, ValueShape};
pub use observer::{RecordingObserver, StructureChange, TreeObserver};
pub use present::{DisplayHint, NodePresenter};
pub use tree::{BuildLimits, DocumentTree};
