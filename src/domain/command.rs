//! Command trait
//!
//! A command is the request that caused a batch of events. The store
//! persists it once per commit as the parent record of that commit's
//! events; it never executes or validates commands.

use std::fmt::Debug;

/// A command as the store sees it: a type identifier and a payload.
pub trait Command: Debug + Send + Sync {
    /// Type identifier stored alongside the command payload.
    fn command_type(&self) -> &'static str;

    /// Serialize the command into its stored payload form.
    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error>;
}
