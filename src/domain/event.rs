//! Domain event trait
//!
//! Events are immutable facts that have happened in the system. They are
//! produced by aggregate logic outside this crate and handed to the event
//! store already carrying their aggregate identity and sequence number.

use std::any::Any;
use std::fmt::Debug;

use uuid::Uuid;

/// A domain event as the store sees it.
///
/// The store never inspects the payload beyond serializing it; the type
/// identifier is what links a stored record back to its concrete Rust type
/// through the [`EventTypeRegistry`](crate::registry::EventTypeRegistry).
///
/// Sequence numbers are assigned by the aggregate root, not by the store,
/// and must be strictly increasing within one aggregate's history.
///
/// Implementors should derive `Deserialize` with
/// `#[serde(deny_unknown_fields)]` so that stored payloads are decoded
/// strictly when loaded back.
pub trait DomainEvent: Debug + Send + Sync {
    /// Type identifier under which this event is registered and stored.
    fn event_type(&self) -> &'static str;

    /// The aggregate this event belongs to.
    fn aggregate_id(&self) -> Uuid;

    /// Position of this event within its aggregate's history.
    fn sequence_number(&self) -> i64;

    /// Serialize the event into its stored payload form.
    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Downcast support for subscribers that need the concrete type.
    fn as_any(&self) -> &dyn Any;
}
