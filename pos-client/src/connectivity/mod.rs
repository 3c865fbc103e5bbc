//! Connectivity monitoring
//!
//! Periodically probes a fixed endpoint and classifies link quality by round
//! trip time. The probe is a best-effort heuristic, not a transport: it
//! never fails its caller — every transport error, timeout or abort resolves
//! to `Disconnected`, and the retry cadence is the polling interval itself.
//!
//! Operator intent is tracked separately as `is_online_mode` ("force offline
//! mode" toggle); the effective mode for all downstream decisions is
//! `is_online_mode && status == Connected`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use shared::{ConnectivitySnapshot, ConnectivityStatus};
use tokio::sync::{Notify, watch};
use tokio::time::{Instant, interval, timeout};
use tokio_util::sync::CancellationToken;

use crate::core::Config;

/// RTT below this is a healthy link (exclusive)
const CONNECTED_MAX_RTT_MS: u128 = 1000;
/// RTT up to this is usable but degraded (inclusive); beyond is as good as down
const UNSTABLE_MAX_RTT_MS: u128 = 2000;

/// Classify a probe round trip time
pub fn classify(rtt: Duration) -> ConnectivityStatus {
    let ms = rtt.as_millis();
    if ms < CONNECTED_MAX_RTT_MS {
        ConnectivityStatus::Connected
    } else if ms <= UNSTABLE_MAX_RTT_MS {
        ConnectivityStatus::Unstable
    } else {
        ConnectivityStatus::Disconnected
    }
}

/// Connectivity monitor service
///
/// Owned service object injected into the checkout flow; publishes status on
/// a watch channel so consumers read the last known classification without
/// ever blocking on a fresh probe.
pub struct ConnectivityMonitor {
    client: reqwest::Client,
    probe_url: String,
    probe_timeout: Duration,
    probe_interval: Duration,
    status_tx: watch::Sender<ConnectivityStatus>,
    online_mode: AtomicBool,
    reprobe: Notify,
}

impl ConnectivityMonitor {
    pub fn new(config: &Config) -> Self {
        let (status_tx, _) = watch::channel(ConnectivityStatus::Disconnected);
        Self {
            client: reqwest::Client::new(),
            probe_url: config.probe_url.clone(),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
            probe_interval: Duration::from_secs(config.probe_interval_secs),
            status_tx,
            online_mode: AtomicBool::new(true),
            reprobe: Notify::new(),
        }
    }

    /// Run the monitor loop
    ///
    /// Probes immediately on start, then on every interval tick, plus on
    /// every host-online nudge. Stops when `shutdown` is cancelled.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let mut ticker = interval(self.probe_interval);
        tracing::info!(url = %self.probe_url, "connectivity monitor started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("connectivity monitor stopped");
                    break;
                }
                _ = ticker.tick() => self.probe_and_publish().await,
                _ = self.reprobe.notified() => self.probe_and_publish().await,
            }
        }
    }

    /// Single bounded reachability check
    ///
    /// Any HTTP response counts as reachable; classification is purely by
    /// round trip time. Errors never propagate.
    pub async fn probe(&self) -> ConnectivityStatus {
        let started = Instant::now();
        match timeout(self.probe_timeout, self.client.head(&self.probe_url).send()).await {
            Ok(Ok(_response)) => classify(started.elapsed()),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "probe transport failure");
                ConnectivityStatus::Disconnected
            }
            Err(_) => {
                tracing::debug!(timeout_ms = self.probe_timeout.as_millis() as u64, "probe aborted");
                ConnectivityStatus::Disconnected
            }
        }
    }

    async fn probe_and_publish(&self) {
        let status = self.probe().await;
        let changed = self.status_tx.send_if_modified(|current| {
            if *current != status {
                *current = status;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::info!(?status, "connectivity status changed");
        }
    }

    /// Last known classification (never blocks on a probe)
    pub fn status(&self) -> ConnectivityStatus {
        *self.status_tx.borrow()
    }

    /// Subscribe to classification changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.status_tx.subscribe()
    }

    /// Nudge from the host platform's offline→online transition: probe now
    /// instead of waiting for the next tick.
    pub fn notify_host_online(&self) {
        self.reprobe.notify_one();
    }

    /// Operator-chosen online mode
    pub fn is_online_mode(&self) -> bool {
        self.online_mode.load(Ordering::Relaxed)
    }

    pub fn set_online_mode(&self, online: bool) {
        self.online_mode.store(online, Ordering::Relaxed);
        tracing::info!(online, "online mode set");
    }

    /// Flip the operator mode, returning the new value
    pub fn toggle_mode(&self) -> bool {
        let was = self.online_mode.fetch_xor(true, Ordering::Relaxed);
        !was
    }

    /// Effective mode gating checkout: operator intent AND a connected probe
    pub fn effective_online(&self) -> bool {
        self.is_online_mode() && self.status() == ConnectivityStatus::Connected
    }

    /// Point-in-time view for the host, with the queue depth filled in
    pub fn snapshot(&self, pending_actions: usize) -> ConnectivitySnapshot {
        ConnectivitySnapshot {
            status: self.status(),
            is_online_mode: self.is_online_mode(),
            pending_actions,
        }
    }

    /// Force the published classification (for testing consumers)
    #[cfg(test)]
    pub(crate) fn set_status(&self, status: ConnectivityStatus) {
        self.status_tx.send_replace(status);
    }
}
