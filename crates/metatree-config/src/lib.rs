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

//! Layered configuration: built-in defaults, an optional JSON file, then
//! `METATREE_*` environment overrides, validated as a whole.
//!
//! Layout: `model.rs` (typed config), `defaults.rs` (built-in values),
//! `loader.rs` (layering), `validate.rs` (range checks), `error.rs`.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_PATH_ENV, ConfigLoader, ENV_PREFIX};
pub use model::{LogOutput, LoggingSettings, TreeConfig};
pub use validate::validate;
