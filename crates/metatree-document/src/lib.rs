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

//! Document values shared by the tree model, the loader and the CLI.
//!
//! Layout: `value.rs` (`Document`/`Scalar`), `bencode.rs` (strict codec),
//! `json.rs` (JSON bridge), `error.rs` (codec and shape errors).

pub mod bencode;
pub mod error;
pub mod json;
pub mod value;

pub use error::{BencodeError, BencodeResult, ShapeError};
pub use value::{Document, Scalar};
