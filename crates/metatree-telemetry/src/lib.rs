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

//! Telemetry primitives shared across the metatree workspace.
//!
//! Layout: `init.rs` (subscriber installation, build SHA), `context.rs`
//! (command span guard), `error.rs`.

pub mod context;
pub mod error;
pub mod init;

pub use context::CommandSpan;
pub use error::{TelemetryError, TelemetryResult};
pub use init::{LogFormat, LoggingConfig, build_sha, init_logging};
