//! Event Store Errors
//!
//! Error types for commit, load and replay operations.

use crate::handler::HandlerError;
use crate::records::StorageError;

/// Errors that can occur in the event store
#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    /// A stored type identifier has no registered event type
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// A stored payload does not match its declared event type
    #[error("failed to decode payload for event type {event_type}: {source}")]
    Deserialization {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// A command or event payload could not be serialized for storage
    #[error("failed to encode payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The record store failed or is unreachable
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A subscriber failed during dispatch
    #[error("handler {handler} failed: {source}")]
    Handler {
        handler: String,
        #[source]
        source: HandlerError,
    },
}

impl EventStoreError {
    /// Whether this error came from a subscriber rather than the store
    /// itself. When it did, the triggering events were already persisted.
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, EventStoreError::Handler { .. })
    }
}
