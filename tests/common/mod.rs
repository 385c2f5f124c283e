//! Common test fixtures
//!
//! A small account ledger domain plus handlers and gateways used across
//! the integration tests.

use std::any::Any;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use factlog::{
    Command, DomainEvent, EventHandler, EventStore, EventTypeRegistry, HandlerError,
    InMemoryRecordStore, NewCommandRecord, NewEventRecord, RawEventRecord, RecordStore,
    StorageError,
};

// =========================================================================
// Fixture events
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountOpened {
    pub aggregate_id: Uuid,
    pub sequence_number: i64,
    pub owner: String,
}

impl DomainEvent for AccountOpened {
    fn event_type(&self) -> &'static str {
        "AccountOpened"
    }

    fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    fn sequence_number(&self) -> i64 {
        self.sequence_number
    }

    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FundsDeposited {
    pub aggregate_id: Uuid,
    pub sequence_number: i64,
    pub amount_cents: i64,
}

impl DomainEvent for FundsDeposited {
    fn event_type(&self) -> &'static str {
        "FundsDeposited"
    }

    fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    fn sequence_number(&self) -> i64 {
        self.sequence_number
    }

    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =========================================================================
// Fixture commands
// =========================================================================

#[derive(Debug, Serialize)]
pub struct OpenAccount {
    pub owner: String,
}

impl Command for OpenAccount {
    fn command_type(&self) -> &'static str {
        "OpenAccount"
    }

    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[derive(Debug, Serialize)]
pub struct DepositFunds {
    pub amount_cents: i64,
}

impl Command for DepositFunds {
    fn command_type(&self) -> &'static str {
        "DepositFunds"
    }

    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

// =========================================================================
// Handlers
// =========================================================================

/// Appends "name:event_type:sequence" to a shared journal on every event,
/// so tests can assert the exact interleaving across handlers.
pub struct RecordingHandler {
    name: String,
    journal: Arc<Mutex<Vec<String>>>,
}

impl RecordingHandler {
    pub fn new(name: &str, journal: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            journal,
        })
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &dyn DomainEvent) -> Result<(), HandlerError> {
        self.journal.lock().unwrap().push(format!(
            "{}:{}:{}",
            self.name,
            event.event_type(),
            event.sequence_number()
        ));
        Ok(())
    }
}

/// Fails on every event it receives.
pub struct FailingHandler {
    name: String,
}

impl FailingHandler {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
        })
    }
}

#[async_trait]
impl EventHandler for FailingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &dyn DomainEvent) -> Result<(), HandlerError> {
        Err(HandlerError::msg(format!(
            "refusing event {} at sequence {}",
            event.event_type(),
            event.sequence_number()
        )))
    }
}

// =========================================================================
// Gateways
// =========================================================================

/// Gateway whose writes and reads always fail, for persist-before-publish
/// assertions.
pub struct FailingRecordStore;

#[async_trait]
impl RecordStore for FailingRecordStore {
    async fn append(
        &self,
        _command: NewCommandRecord,
        _events: &[NewEventRecord],
    ) -> Result<Uuid, StorageError> {
        Err(StorageError::Unavailable("record store offline".to_string()))
    }

    async fn events_for_aggregate(
        &self,
        _aggregate_id: Uuid,
    ) -> Result<Vec<RawEventRecord>, StorageError> {
        Err(StorageError::Unavailable("record store offline".to_string()))
    }
}

// =========================================================================
// Builders
// =========================================================================

/// Registry with every fixture event type registered.
pub fn registry() -> Arc<EventTypeRegistry> {
    let mut registry = EventTypeRegistry::new();
    registry.register::<AccountOpened>("AccountOpened");
    registry.register::<FundsDeposited>("FundsDeposited");
    Arc::new(registry)
}

/// Event store over a fresh in-memory gateway.
pub fn new_store() -> EventStore<InMemoryRecordStore> {
    init_tracing();
    EventStore::new(InMemoryRecordStore::new(), registry())
}

/// Initialize tracing output for tests; repeated calls are a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn journal() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn opened(aggregate_id: Uuid, sequence_number: i64, owner: &str) -> Box<dyn DomainEvent> {
    Box::new(AccountOpened {
        aggregate_id,
        sequence_number,
        owner: owner.to_string(),
    })
}

pub fn deposited(
    aggregate_id: Uuid,
    sequence_number: i64,
    amount_cents: i64,
) -> Box<dyn DomainEvent> {
    Box::new(FundsDeposited {
        aggregate_id,
        sequence_number,
        amount_cents,
    })
}
