//! Error types for telemetry operations.

use thiserror::Error;

/// Errors raised by telemetry helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    /// A global subscriber is already installed or the filter was rejected.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Installer error detail.
        detail: String,
    },
}

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
