//! Event type registry
//!
//! Maps a stored type identifier back to a factory that reconstructs the
//! concrete event from its payload. Every event type the store may
//! encounter registers itself here at startup; lookups against unknown
//! identifiers are surfaced by the store as
//! [`EventStoreError::UnknownEventType`](crate::event_store::EventStoreError).

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::domain::DomainEvent;

/// Reconstruction function: stored payload in, concrete event out.
pub type EventFactory =
    fn(serde_json::Value) -> Result<Box<dyn DomainEvent>, serde_json::Error>;

/// Registration table from event type identifier to its factory.
///
/// Built once at startup and shared (typically behind an `Arc`) by every
/// store instance; a type resolved during one load or replay never needs
/// to be resolved again because the whole table is in place up front.
#[derive(Default)]
pub struct EventTypeRegistry {
    known: HashMap<String, EventFactory>,
}

impl EventTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            known: HashMap::new(),
        }
    }

    /// Register an event type under its identifier.
    ///
    /// Re-registering an identifier replaces the previous factory.
    pub fn register<E>(&mut self, event_type: &str)
    where
        E: DomainEvent + DeserializeOwned + 'static,
    {
        let factory: EventFactory = |payload| {
            serde_json::from_value::<E>(payload).map(|event| Box::new(event) as Box<dyn DomainEvent>)
        };
        self.known.insert(event_type.to_string(), factory);
    }

    /// Resolve a type identifier to its factory, if registered.
    pub fn lookup(&self, event_type: &str) -> Option<EventFactory> {
        self.known.get(event_type).copied()
    }

    /// Whether the identifier has a registered factory.
    pub fn contains(&self, event_type: &str) -> bool {
        self.known.contains_key(event_type)
    }

    /// Number of registered event types.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Whether no event types are registered.
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
