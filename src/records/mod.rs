//! Record persistence gateway
//!
//! The narrow interface the event store persists through: one command
//! record per commit, its event records as children, and an ordered
//! read-back per aggregate. Ships a PostgreSQL implementation and an
//! in-memory implementation for tests.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;

/// Command record ready to be persisted. The gateway assigns its identity.
#[derive(Debug, Clone)]
pub struct NewCommandRecord {
    pub command_type: String,
    pub payload: serde_json::Value,
}

/// Event record ready to be persisted as a child of a command record.
#[derive(Debug, Clone)]
pub struct NewEventRecord {
    pub aggregate_id: Uuid,
    pub sequence_number: i64,
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// Raw event row as read back from storage: type identifier plus payload.
///
/// This is also the item type of a replay stream.
#[derive(Debug, Clone)]
pub struct RawEventRecord {
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// Fully described event row, for auditing and debugging reads.
#[derive(Debug, Clone)]
pub struct StoredEventRecord {
    pub id: Uuid,
    pub command_record_id: Uuid,
    pub aggregate_id: Uuid,
    pub sequence_number: i64,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Errors surfaced by a record store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Another writer already persisted this (aggregate, sequence) pair.
    #[error(
        "sequence conflict for aggregate {aggregate_id}: sequence {sequence_number} already exists"
    )]
    SequenceConflict {
        aggregate_id: Uuid,
        sequence_number: i64,
    },

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Storage backend cannot be reached
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Whether this error is a sequence conflict.
    pub fn is_sequence_conflict(&self) -> bool {
        matches!(self, StorageError::SequenceConflict { .. })
    }
}

/// Persistence gateway for command and event records.
///
/// `append` is atomic: either the command record and every one of its event
/// records are persisted, or nothing is. The store relies on this to
/// guarantee that no event is ever published without having been persisted
/// first.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist one command record and its child event records, in order,
    /// within a single transaction. Returns the command record's identity.
    async fn append(
        &self,
        command: NewCommandRecord,
        events: &[NewEventRecord],
    ) -> Result<Uuid, StorageError>;

    /// All event records for the aggregate, ordered ascending by sequence
    /// number. Unknown aggregates yield an empty list.
    async fn events_for_aggregate(
        &self,
        aggregate_id: Uuid,
    ) -> Result<Vec<RawEventRecord>, StorageError>;
}
