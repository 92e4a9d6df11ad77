//! Typed configuration model.
//!
//! # Design
//! - Pure data carriers; loading lives in `loader.rs`, range checks in `validate.rs`.
//! - Every field has a default, so a file only names what it changes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::ConfigError;

/// Effective configuration for tree, loader and presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeConfig {
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Bytes of binary values shown in previews.
    pub preview_bytes: usize,
    /// Maximum container nesting accepted from one document.
    pub max_depth: usize,
    /// Largest source file the loader reads.
    pub max_source_bytes: u64,
    /// Sources parsed ahead of publication.
    pub parse_concurrency: usize,
    /// Capacity of the loader result channel.
    pub channel_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            logging: LoggingSettings::default(),
            preview_bytes: defaults::PREVIEW_BYTES,
            max_depth: defaults::MAX_DEPTH,
            max_source_bytes: defaults::MAX_SOURCE_BYTES,
            parse_concurrency: defaults::PARSE_CONCURRENCY,
            channel_capacity: defaults::CHANNEL_CAPACITY,
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Filter directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Output format.
    pub format: LogOutput,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            format: LogOutput::Auto,
        }
    }
}

/// Log output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Pretty in debug builds, JSON otherwise.
    #[default]
    Auto,
    /// Human-readable lines.
    Pretty,
    /// Structured JSON objects.
    Json,
}

impl LogOutput {
    /// Render the format as its lowercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl FromStr for LogOutput {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "auto" => Ok(Self::Auto),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::rejected(
                "logging.format",
                other,
                "must be one of auto, pretty, json",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_fill_in_defaults() {
        let config: TreeConfig =
            serde_json::from_str(r#"{"preview_bytes": 8, "logging": {"format": "json"}}"#)
                .expect("parsed");
        assert_eq!(config.preview_bytes, 8);
        assert_eq!(config.logging.format, LogOutput::Json);
        assert_eq!(config.logging.level, defaults::LOG_LEVEL);
        assert_eq!(config.max_depth, defaults::MAX_DEPTH);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<TreeConfig>(r#"{"preview": 8}"#);
        assert!(result.is_err());
        assert!("xml".parse::<LogOutput>().is_err());
        assert_eq!("pretty".parse::<LogOutput>().ok(), Some(LogOutput::Pretty));
    }
}
