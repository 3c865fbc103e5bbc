//! System Log Model

use serde::{Deserialize, Serialize};

/// Append-only system log entry
///
/// Capped at a maximum retained count; oldest entries are evicted first and
/// are not recoverable under quota pressure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    /// Action tag, e.g. `checkout_completed`, `ledger_degraded`
    pub action: String,
    pub details: String,
    /// ISO-8601 timestamp
    pub timestamp: String,
    /// Staff member who triggered the action, when known
    pub actor_id: Option<String>,
}

impl LogEntry {
    pub fn new(action: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: crate::util::new_id(),
            action: action.into(),
            details: details.into(),
            timestamp: crate::util::now_iso(),
            actor_id: None,
        }
    }

    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }
}
