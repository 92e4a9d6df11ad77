//! Configuration failures.
//!
//! Messages are fixed; the offending key, value or file travels in fields.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reasons a configuration cannot be produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting parsed but is not acceptable.
    #[error("configuration value rejected")]
    InvalidValue {
        /// Dotted setting name (`logging.level`) or environment variable name.
        key: String,
        /// Rejected value as written.
        value: String,
        /// Fixed, machine-readable reason such as `below minimum`.
        reason: &'static str,
    },
    /// A `METATREE_*` variable names no setting.
    #[error("unrecognised environment override")]
    UnknownVariable {
        /// Full variable name.
        name: String,
    },
    /// The configuration file is not a JSON object of known settings.
    #[error("malformed configuration file")]
    MalformedFile {
        /// File that was read.
        path: PathBuf,
        /// Deserializer error with line and column.
        source: serde_json::Error,
    },
    /// The configuration file could not be read.
    #[error("configuration file unreadable")]
    ReadFile {
        /// File that was requested.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl ConfigError {
    pub(crate) fn rejected(key: &str, value: impl ToString, reason: &'static str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        }
    }

    /// Key of the offending setting, when the error concerns one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { key, .. } => Some(key),
            Self::UnknownVariable { name } => Some(name),
            Self::MalformedFile { .. } | Self::ReadFile { .. } => None,
        }
    }
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
