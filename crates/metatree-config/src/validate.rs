//! Range checks applied to the fully layered configuration.

use metatree_document::bencode::MAX_SUPPORTED_DEPTH;

use crate::error::{ConfigError, ConfigResult};
use crate::model::TreeConfig;

const MAX_PREVIEW_BYTES: usize = 4096;
const MAX_CONCURRENCY: usize = 64;
const MAX_CHANNEL_CAPACITY: usize = 4096;

/// Validate `config`, reporting the first offending field.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for empty log filters and for numeric
/// fields outside their accepted range.
pub fn validate(config: &TreeConfig) -> ConfigResult<()> {
    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::rejected(
            "logging.level",
            &config.logging.level,
            "must not be empty",
        ));
    }
    check_range("preview_bytes", config.preview_bytes, 1, MAX_PREVIEW_BYTES)?;
    check_range("max_depth", config.max_depth, 1, MAX_SUPPORTED_DEPTH)?;
    check_range("parse_concurrency", config.parse_concurrency, 1, MAX_CONCURRENCY)?;
    check_range("channel_capacity", config.channel_capacity, 1, MAX_CHANNEL_CAPACITY)?;
    if config.max_source_bytes == 0 {
        return Err(ConfigError::rejected("max_source_bytes", 0, "must be positive"));
    }
    Ok(())
}

fn check_range(key: &str, value: usize, min: usize, max: usize) -> ConfigResult<()> {
    let reason = if value < min {
        "below minimum"
    } else if value > max {
        "above maximum"
    } else {
        return Ok(());
    };
    Err(ConfigError::rejected(key, value, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&TreeConfig::default()).is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = TreeConfig {
            parse_concurrency: 0,
            ..TreeConfig::default()
        };
        match validate(&config) {
            Err(ConfigError::InvalidValue { key, reason, .. }) => {
                assert_eq!(key, "parse_concurrency");
                assert_eq!(reason, "below minimum");
            }
            other => panic!("expected rejected value, got {other:?}"),
        }
    }

    #[test]
    fn oversized_preview_and_empty_level_are_rejected() {
        let mut config = TreeConfig {
            preview_bytes: MAX_PREVIEW_BYTES + 1,
            ..TreeConfig::default()
        };
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidValue { reason: "above maximum", .. })
        ));
        config.preview_bytes = 1;
        config.logging.level = "  ".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidValue { reason: "must not be empty", .. })
        ));
    }

    #[test]
    fn nesting_is_capped_at_the_supported_depth() {
        let mut config = TreeConfig {
            max_depth: MAX_SUPPORTED_DEPTH,
            ..TreeConfig::default()
        };
        assert!(validate(&config).is_ok());
        config.max_depth = MAX_SUPPORTED_DEPTH + 1;
        match validate(&config) {
            Err(ConfigError::InvalidValue { key, reason, .. }) => {
                assert_eq!(key, "max_depth");
                assert_eq!(reason, "above maximum");
            }
            other => panic!("expected rejected value, got {other:?}"),
        }
    }
}
