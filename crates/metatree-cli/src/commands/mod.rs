//! Command handlers.

pub(crate) mod edit;
pub(crate) mod show;
