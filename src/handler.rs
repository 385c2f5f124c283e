//! Event handler capability
//!
//! Subscribers implement [`EventHandler`] and are registered on the store.
//! Dispatch is in-process: the store awaits each handler to completion, in
//! registration order, before moving on. A handler error aborts the
//! remaining dispatch and surfaces to the caller of commit/replay.

use std::fmt;

use async_trait::async_trait;

use crate::domain::DomainEvent;

/// Error raised by a subscriber while reacting to an event.
///
/// The store does not interpret, wrap further, or retry these; whatever the
/// subscriber reports is what the caller of commit/replay sees.
#[derive(Debug)]
pub struct HandlerError(anyhow::Error);

impl HandlerError {
    /// Wrap an arbitrary error.
    pub fn new(source: impl Into<anyhow::Error>) -> Self {
        Self(source.into())
    }

    /// Build from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(anyhow::Error::msg(message.to_string()))
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(source: anyhow::Error) -> Self {
        Self(source)
    }
}

/// A subscriber to committed or replayed events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name this handler is registered under; removal is by name.
    fn name(&self) -> &str;

    /// React to one event. Called once per event, in commit order.
    async fn handle(&self, event: &dyn DomainEvent) -> Result<(), HandlerError>;
}
