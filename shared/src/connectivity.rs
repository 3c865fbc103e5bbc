//! Connectivity state types

use serde::{Deserialize, Serialize};

/// Link quality classification from the last reachability probe
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectivityStatus {
    Connected,
    Unstable,
    #[default]
    Disconnected,
}

/// Point-in-time view of the connectivity service
///
/// `is_online_mode` is operator intent and independent of the probe result;
/// the effective mode for checkout decisions is
/// `is_online_mode && status == Connected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivitySnapshot {
    pub status: ConnectivityStatus,
    pub is_online_mode: bool,
    /// Number of queued actions waiting for replay
    pub pending_actions: usize,
}

impl ConnectivitySnapshot {
    pub fn effective_online(&self) -> bool {
        self.is_online_mode && self.status == ConnectivityStatus::Connected
    }
}
