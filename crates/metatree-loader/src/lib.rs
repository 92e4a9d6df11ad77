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

//! Loads source files off the caller's control flow and publishes them into a
//! [`metatree_model::DocumentTree`] strictly in input order.
//!
//! Layout: `parser.rs` (parser seam and bencode file parser), `agent.rs`
//! (driver task, handle, outcomes), `error.rs`.

pub mod agent;
pub mod error;
pub mod parser;

pub use agent::{
    FailedSource, LoadAgent, LoadHandle, LoadOptions, LoadOutcome, LoadReport, ParsedSource,
    PublishedSource,
};
pub use error::{LoadError, LoadResult};
pub use parser::{BencodeFileParser, DocumentParser};
