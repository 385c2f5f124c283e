//! Event Store
//!
//! Core coordinator: persists a command together with the events it
//! produced, publishes committed events to registered handlers, loads an
//! aggregate's history, and replays raw event streams through the current
//! handlers without persisting anything.

use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::domain::{Command, DomainEvent};
use crate::handler::EventHandler;
use crate::records::{NewCommandRecord, NewEventRecord, RawEventRecord, RecordStore};
use crate::registry::EventTypeRegistry;

use super::EventStoreError;

/// Event store over a record persistence gateway `R`.
///
/// One long-lived instance owns the handler list and shares the event type
/// registry built at startup. All operations are plain awaited calls:
/// nothing is queued, spawned, or retried.
pub struct EventStore<R: RecordStore> {
    records: R,
    registry: Arc<EventTypeRegistry>,
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl<R: RecordStore> EventStore<R> {
    /// Create a new event store over a record gateway and a registry.
    pub fn new(records: R, registry: Arc<EventTypeRegistry>) -> Self {
        Self {
            records,
            registry,
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// The underlying record gateway.
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Register a handler. Affects only future commits and replays.
    pub fn add_handler(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.write().unwrap().push(handler);
    }

    /// Remove every handler registered under the given name.
    ///
    /// Returns how many were removed. Dispatches already in flight keep
    /// the handler snapshot they started with.
    pub fn remove_handler(&self, name: &str) -> usize {
        let mut handlers = self.handlers.write().unwrap();
        let before = handlers.len();
        handlers.retain(|handler| handler.name() != name);
        before - handlers.len()
    }

    /// Number of currently registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().unwrap().len()
    }

    /// Persist the command and its events, then publish the events to the
    /// registered handlers.
    ///
    /// Events are persisted in the order given and published in that same
    /// order, each to every handler in registration order. Publication
    /// starts only after the records are durably written; a persistence
    /// failure means no handler runs. A handler failure aborts the
    /// remaining dispatch and surfaces to the caller; events persisted
    /// and handlers already run are left as they are.
    ///
    /// Returns the identity of the new command record. An empty event
    /// slice still persists the command.
    pub async fn commit(
        &self,
        command: &dyn Command,
        events: &[Box<dyn DomainEvent>],
    ) -> Result<Uuid, EventStoreError> {
        let command_record = NewCommandRecord {
            command_type: command.command_type().to_string(),
            payload: command.to_payload()?,
        };

        let mut event_records = Vec::with_capacity(events.len());
        for event in events {
            event_records.push(NewEventRecord {
                aggregate_id: event.aggregate_id(),
                sequence_number: event.sequence_number(),
                event_type: event.event_type().to_string(),
                payload: event.to_payload()?,
            });
        }

        let command_record_id = self.records.append(command_record, &event_records).await?;

        tracing::debug!(
            command_record_id = %command_record_id,
            command_type = %command.command_type(),
            event_count = events.len(),
            "Events committed, publishing"
        );

        let handlers = self.handlers_snapshot();
        for event in events {
            self.dispatch(event.as_ref(), &handlers).await?;
        }

        Ok(command_record_id)
    }

    /// All events for the aggregate, ordered by sequence number.
    ///
    /// Read-only: nothing is dispatched. An aggregate with no history
    /// yields an empty vector.
    pub async fn load(
        &self,
        aggregate_id: Uuid,
    ) -> Result<Vec<Box<dyn DomainEvent>>, EventStoreError> {
        let rows = self.records.events_for_aggregate(aggregate_id).await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            events.push(self.materialize(row)?);
        }

        tracing::debug!(
            aggregate_id = %aggregate_id,
            event_count = events.len(),
            "Loaded events"
        );

        Ok(events)
    }

    /// Replay a raw event stream through the currently registered
    /// handlers.
    ///
    /// The stream is pulled one item at a time, so a full history never
    /// needs to be resident in memory. Each item is resolved and decoded
    /// exactly as in [`load`](Self::load), then dispatched like a freshly
    /// committed event, except that nothing is persisted. A resolution,
    /// decode, or handler failure stops the replay at that item; prior
    /// dispatches stand.
    pub async fn replay<I>(&self, stream: I) -> Result<(), EventStoreError>
    where
        I: IntoIterator<Item = RawEventRecord>,
    {
        let handlers = self.handlers_snapshot();
        let mut replayed = 0usize;

        for row in stream {
            let event = self.materialize(row)?;
            self.dispatch(event.as_ref(), &handlers).await?;
            replayed += 1;
        }

        tracing::info!(event_count = replayed, "Replay complete");
        Ok(())
    }

    /// Resolve a raw record's type identifier and decode its payload.
    fn materialize(&self, row: RawEventRecord) -> Result<Box<dyn DomainEvent>, EventStoreError> {
        let factory = self
            .registry
            .lookup(&row.event_type)
            .ok_or_else(|| EventStoreError::UnknownEventType(row.event_type.clone()))?;

        factory(row.payload).map_err(|source| EventStoreError::Deserialization {
            event_type: row.event_type,
            source,
        })
    }

    /// Push one event to every handler, in registration order.
    async fn dispatch(
        &self,
        event: &dyn DomainEvent,
        handlers: &[Arc<dyn EventHandler>],
    ) -> Result<(), EventStoreError> {
        for handler in handlers {
            handler
                .handle(event)
                .await
                .map_err(|source| EventStoreError::Handler {
                    handler: handler.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Snapshot of the handler list, taken under the read lock and
    /// released before any await.
    fn handlers_snapshot(&self) -> Vec<Arc<dyn EventHandler>> {
        self.handlers.read().unwrap().clone()
    }
}
