//! Configuration layering.
//!
//! # Design
//! - Layers apply in a fixed order: defaults, file, environment.
//! - The environment is passed in as a map so callers and tests never mutate
//!   the process environment.
//! - Validation runs once on the merged result.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::TreeConfig;
use crate::validate::validate;

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "METATREE_";
/// Variable naming the configuration file; consumed by the CLI, not an override.
pub const CONFIG_PATH_ENV: &str = "METATREE_CONFIG";

/// Builder collecting configuration layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl ConfigLoader {
    /// Loader with only the built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer the JSON file at `path` over the defaults.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Layer the `METATREE_*` entries of `vars` over the file. Other entries are
    /// ignored.
    #[must_use]
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env.extend(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .filter(|(key, _)| key.starts_with(ENV_PREFIX) && key != CONFIG_PATH_ENV),
        );
        self
    }

    /// Layer the current process environment.
    #[must_use]
    pub fn with_process_env(self) -> Self {
        self.with_env(std::env::vars())
    }

    /// Merge every layer and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadFile`]/[`ConfigError::MalformedFile`] for an
    /// unreadable or malformed file, [`ConfigError::UnknownVariable`] for an
    /// unrecognised `METATREE_*` variable, and [`ConfigError::InvalidValue`] for
    /// values that fail to parse or validate.
    pub fn load(&self) -> ConfigResult<TreeConfig> {
        let mut config = match &self.file {
            Some(path) => from_file(path)?,
            None => TreeConfig::default(),
        };
        for (key, value) in &self.env {
            apply_env(&mut config, key, value)?;
        }
        validate(&config)?;
        debug!(
            file = ?self.file,
            overrides = self.env.len(),
            "configuration loaded"
        );
        Ok(config)
    }
}

/// Read a configuration file; absent fields keep their defaults.
///
/// # Errors
///
/// Returns [`ConfigError::ReadFile`] when the file cannot be read and
/// [`ConfigError::MalformedFile`] when it is not a valid configuration document.
pub fn from_file(path: &Path) -> ConfigResult<TreeConfig> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::MalformedFile {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env(config: &mut TreeConfig, key: &str, value: &str) -> ConfigResult<()> {
    let field = key.strip_prefix(ENV_PREFIX).unwrap_or(key);
    match field {
        "LOG_LEVEL" => config.logging.level = value.to_string(),
        "LOG_FORMAT" => config.logging.format = value.parse()?,
        "PREVIEW_BYTES" => config.preview_bytes = parse_number(key, value)?,
        "MAX_DEPTH" => config.max_depth = parse_number(key, value)?,
        "MAX_SOURCE_BYTES" => config.max_source_bytes = parse_number(key, value)?,
        "PARSE_CONCURRENCY" => config.parse_concurrency = parse_number(key, value)?,
        "CHANNEL_CAPACITY" => config.channel_capacity = parse_number(key, value)?,
        _ => {
            return Err(ConfigError::UnknownVariable {
                name: key.to_string(),
            });
        }
    }
    Ok(())
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::rejected(key, value, "must be a non-negative integer"))
}
