//! PostgreSQL record store
//!
//! Persists command and event records through `sqlx` with parameterized
//! queries. Schema lives in `migrations/0001_create_records.sql`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    NewCommandRecord, NewEventRecord, RawEventRecord, RecordStore, StorageError, StoredEventRecord,
};

/// Record store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Create a new record store with a database pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The full raw event history in global insert order.
    ///
    /// Useful as a replay source; callers wanting a substream query the
    /// records themselves.
    pub async fn all_events(&self) -> Result<Vec<RawEventRecord>, StorageError> {
        let rows: Vec<(String, serde_json::Value)> = sqlx::query_as(
            r#"
            SELECT event_type, event_json
            FROM event_records
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(event_type, payload)| RawEventRecord {
                event_type,
                payload,
            })
            .collect())
    }

    /// Full event rows for an aggregate (for debugging/auditing).
    pub async fn stored_events(
        &self,
        aggregate_id: Uuid,
    ) -> Result<Vec<StoredEventRecord>, StorageError> {
        let rows: Vec<(
            Uuid,
            Uuid,
            Uuid,
            i64,
            String,
            serde_json::Value,
            DateTime<Utc>,
        )> = sqlx::query_as(
            r#"
            SELECT id, command_record_id, aggregate_id, sequence_number,
                   event_type, event_json, created_at
            FROM event_records
            WHERE aggregate_id = $1
            ORDER BY sequence_number ASC
            "#,
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, command_record_id, aggregate_id, sequence_number, event_type, payload, created_at)| {
                    StoredEventRecord {
                        id,
                        command_record_id,
                        aggregate_id,
                        sequence_number,
                        event_type,
                        payload,
                        created_at,
                    }
                },
            )
            .collect())
    }
}

#[async_trait::async_trait]
impl RecordStore for PgRecordStore {
    async fn append(
        &self,
        command: NewCommandRecord,
        events: &[NewEventRecord],
    ) -> Result<Uuid, StorageError> {
        let mut tx = self.pool.begin().await?;

        let command_record_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO command_records (id, command_type, command_json)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&command.command_type)
        .bind(&command.payload)
        .fetch_one(&mut *tx)
        .await?;

        for event in events {
            sqlx::query(
                r#"
                INSERT INTO event_records (
                    id, command_record_id, aggregate_id,
                    sequence_number, event_type, event_json
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(command_record_id)
            .bind(event.aggregate_id)
            .bind(event.sequence_number)
            .bind(&event.event_type)
            .bind(&event.payload)
            .execute(&mut *tx)
            .await
            .map_err(|err| map_insert_error(err, event))?;
        }

        tx.commit().await?;

        tracing::debug!(
            command_record_id = %command_record_id,
            command_type = %command.command_type,
            event_count = events.len(),
            "Command and event records persisted"
        );

        Ok(command_record_id)
    }

    async fn events_for_aggregate(
        &self,
        aggregate_id: Uuid,
    ) -> Result<Vec<RawEventRecord>, StorageError> {
        let rows: Vec<(String, serde_json::Value)> = sqlx::query_as(
            r#"
            SELECT event_type, event_json
            FROM event_records
            WHERE aggregate_id = $1
            ORDER BY sequence_number ASC
            "#,
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(event_type, payload)| RawEventRecord {
                event_type,
                payload,
            })
            .collect())
    }
}

/// Map a unique violation on (aggregate_id, sequence_number) to the typed
/// conflict error; everything else stays a database error.
fn map_insert_error(err: sqlx::Error, event: &NewEventRecord) -> StorageError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return StorageError::SequenceConflict {
                aggregate_id: event.aggregate_id,
                sequence_number: event.sequence_number,
            };
        }
    }
    StorageError::Database(err)
}

// Database-backed behavior (append atomicity, ordered read-back, conflict
// on duplicate sequence numbers) is covered by the integration suite
// against the in-memory store, which implements the same contract; running
// these paths against PostgreSQL requires DATABASE_URL and the migrations
// applied.
