//! Process-wide command span.
//!
//! The span is entered once and stays entered until the guard drops, so every
//! event a command emits carries the command name and build identifier.

use tracing::field::{self, Empty};
use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard holding the `command` span entered.
pub struct CommandSpan {
    span: &'static Span,
    _entered: Entered<'static>,
}

impl CommandSpan {
    /// Enter the span for the command `name`.
    #[must_use]
    pub fn enter(name: &str) -> Self {
        let span: &'static Span = Box::leak(Box::new(tracing::info_span!(
            "command",
            command = name,
            build_sha = %build_sha(),
            outcome = Empty,
        )));
        Self {
            span,
            _entered: span.enter(),
        }
    }

    /// Record how the command ended, e.g. `success` or `error`.
    pub fn record_outcome(&self, outcome: &str) {
        self.span.record("outcome", field::display(outcome));
    }
}

impl std::fmt::Debug for CommandSpan {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CommandSpan")
            .field("span", self.span)
            .finish_non_exhaustive()
    }
}
