//! factlog
//!
//! Append-only domain event store. Commands are persisted together with
//! the events they produced, committed events are published synchronously
//! to registered handlers, and stored (or externally supplied) raw event
//! streams can be replayed through the current handlers without being
//! persisted again.

pub mod config;
pub mod db;
pub mod domain;
pub mod event_store;
pub mod handler;
pub mod records;
pub mod registry;

pub use config::{Config, ConfigError};
pub use domain::{Command, DomainEvent};
pub use event_store::{EventStore, EventStoreError};
pub use handler::{EventHandler, HandlerError};
pub use records::{
    InMemoryRecordStore, NewCommandRecord, NewEventRecord, PgRecordStore, RawEventRecord,
    RecordStore, StorageError, StoredEventRecord,
};
pub use registry::{EventFactory, EventTypeRegistry};
