//! In-memory record store
//!
//! Keeps command and event records in mutex-guarded vectors while honoring
//! the same contract as the PostgreSQL store, including the sequence
//! uniqueness check. Intended for tests and as a lightweight test double
//! for downstream crates.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    NewCommandRecord, NewEventRecord, RawEventRecord, RecordStore, StorageError, StoredEventRecord,
};

#[derive(Debug, Clone)]
struct StoredCommand {
    id: Uuid,
    command_type: String,
    payload: serde_json::Value,
}

#[derive(Debug, Clone)]
struct StoredEventRow {
    id: Uuid,
    command_record_id: Uuid,
    aggregate_id: Uuid,
    sequence_number: i64,
    event_type: String,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl StoredEventRow {
    fn to_record(&self) -> StoredEventRecord {
        StoredEventRecord {
            id: self.id,
            command_record_id: self.command_record_id,
            aggregate_id: self.aggregate_id,
            sequence_number: self.sequence_number,
            event_type: self.event_type.clone(),
            payload: self.payload.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    commands: Vec<StoredCommand>,
    // Insert order doubles as the global position.
    events: Vec<StoredEventRow>,
}

/// Record store holding everything in memory.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    inner: Mutex<Inner>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted command records.
    pub fn command_count(&self) -> usize {
        self.inner.lock().unwrap().commands.len()
    }

    /// Number of persisted event records across all aggregates.
    pub fn event_count(&self) -> usize {
        self.inner.lock().unwrap().events.len()
    }

    /// Type identifiers of the persisted commands, in insert order.
    pub fn command_types(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .commands
            .iter()
            .map(|c| c.command_type.clone())
            .collect()
    }

    /// Identities of the persisted commands, in insert order.
    pub fn command_ids(&self) -> Vec<Uuid> {
        self.inner
            .lock()
            .unwrap()
            .commands
            .iter()
            .map(|c| c.id)
            .collect()
    }

    /// Payload persisted for the given command record.
    pub fn command_payload(&self, command_record_id: Uuid) -> Option<serde_json::Value> {
        self.inner
            .lock()
            .unwrap()
            .commands
            .iter()
            .find(|c| c.id == command_record_id)
            .map(|c| c.payload.clone())
    }

    /// The full raw event history in global insert order.
    ///
    /// Useful as a replay source.
    pub fn all_events(&self) -> Vec<RawEventRecord> {
        self.inner
            .lock()
            .unwrap()
            .events
            .iter()
            .map(|row| RawEventRecord {
                event_type: row.event_type.clone(),
                payload: row.payload.clone(),
            })
            .collect()
    }

    /// Full event rows for an aggregate (for debugging/auditing).
    pub fn stored_events(&self, aggregate_id: Uuid) -> Vec<StoredEventRecord> {
        let inner = self.inner.lock().unwrap();

        let mut rows: Vec<&StoredEventRow> = inner
            .events
            .iter()
            .filter(|row| row.aggregate_id == aggregate_id)
            .collect();
        rows.sort_by_key(|row| row.sequence_number);

        rows.into_iter().map(StoredEventRow::to_record).collect()
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn append(
        &self,
        command: NewCommandRecord,
        events: &[NewEventRecord],
    ) -> Result<Uuid, StorageError> {
        let mut inner = self.inner.lock().unwrap();

        // Reject the whole batch up front so a conflict leaves nothing
        // behind, matching the transactional Postgres behavior. The batch
        // is also checked against itself.
        for (idx, event) in events.iter().enumerate() {
            let taken = inner.events.iter().any(|row| {
                row.aggregate_id == event.aggregate_id
                    && row.sequence_number == event.sequence_number
            }) || events[..idx].iter().any(|prior| {
                prior.aggregate_id == event.aggregate_id
                    && prior.sequence_number == event.sequence_number
            });
            if taken {
                return Err(StorageError::SequenceConflict {
                    aggregate_id: event.aggregate_id,
                    sequence_number: event.sequence_number,
                });
            }
        }

        let command_record_id = Uuid::new_v4();
        inner.commands.push(StoredCommand {
            id: command_record_id,
            command_type: command.command_type,
            payload: command.payload,
        });

        for event in events {
            inner.events.push(StoredEventRow {
                id: Uuid::new_v4(),
                command_record_id,
                aggregate_id: event.aggregate_id,
                sequence_number: event.sequence_number,
                event_type: event.event_type.clone(),
                payload: event.payload.clone(),
                created_at: Utc::now(),
            });
        }

        Ok(command_record_id)
    }

    async fn events_for_aggregate(
        &self,
        aggregate_id: Uuid,
    ) -> Result<Vec<RawEventRecord>, StorageError> {
        let inner = self.inner.lock().unwrap();

        let mut rows: Vec<&StoredEventRow> = inner
            .events
            .iter()
            .filter(|row| row.aggregate_id == aggregate_id)
            .collect();
        rows.sort_by_key(|row| row.sequence_number);

        Ok(rows
            .into_iter()
            .map(|row| RawEventRecord {
                event_type: row.event_type.clone(),
                payload: row.payload.clone(),
            })
            .collect())
    }
}
