//! Subscriber installation for the `metatree` binary and test harnesses.
//!
//! One registry carries an `EnvFilter` and exactly one of two fmt layers, both
//! writing to stderr. Stdout belongs to command output.

use std::io;

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{TelemetryError, TelemetryResult};

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG`, when set and valid, replaces `config.level`.
///
/// # Errors
///
/// Returns [`TelemetryError::SubscriberInstall`] when a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig<'_>) -> TelemetryResult<()> {
    let _ = BUILD_SHA.set(config.build_sha.to_string());

    let (json, pretty) = match config.format {
        LogFormat::Json => (
            Some(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(io::stderr),
            ),
            None,
        ),
        LogFormat::Pretty => (
            None,
            Some(fmt::layer().with_target(false).with_writer(io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter_for(config.level))
        .with(json)
        .with(pretty)
        .try_init()
        .map_err(|err| TelemetryError::SubscriberInstall {
            detail: err.to_string(),
        })?;
    tracing::debug!(format = config.format.as_str(), level = config.level, "logging initialised");
    Ok(())
}

/// Build identifier recorded by [`init_logging`]; `dev` before installation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Inputs to [`init_logging`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingConfig<'a> {
    /// Filter directive such as `info` or `metatree_loader=debug`.
    pub level: &'a str,
    /// Line format.
    pub format: LogFormat,
    /// Identifier stamped on the command span.
    pub build_sha: &'a str,
}

/// Line format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Pretty for debug builds, JSON for release builds.
    #[must_use]
    pub const fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
