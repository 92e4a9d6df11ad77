//! Built-in configuration values.
//!
//! # Design
//! - Keep every default in one place so the model, the loader and the docs agree.

/// Log filter used when neither the file nor `RUST_LOG` sets one.
pub const LOG_LEVEL: &str = "warn";
/// Bytes of binary values shown in previews.
pub const PREVIEW_BYTES: usize = 20;
/// Maximum container nesting accepted from one document.
pub const MAX_DEPTH: usize = 256;
/// Largest source file the loader reads.
pub const MAX_SOURCE_BYTES: u64 = 64 * 1024 * 1024;
/// Sources parsed ahead of publication.
pub const PARSE_CONCURRENCY: usize = 1;
/// Capacity of the loader result channel.
pub const CHANNEL_CAPACITY: usize = 16;
