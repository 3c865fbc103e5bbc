//! Client configuration
//!
//! All settings can be overridden through environment variables:
//!
//! | Environment variable | Default | Meaning |
//! |----------------------|---------|---------|
//! | WORK_DIR | ./pos-data | Directory holding the record store |
//! | STORE_QUOTA_BYTES | 5242880 | Byte quota over all persisted collections |
//! | PROBE_URL | <https://www.gstatic.com/generate_204> | Reachability probe endpoint |
//! | PROBE_INTERVAL_SECS | 30 | Probe polling interval |
//! | PROBE_TIMEOUT_MS | 3000 | Per-probe abort timeout |
//! | BACKEND_LATENCY_MS | 800 | Simulated order backend latency |

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the record store file
    pub work_dir: String,
    /// Byte quota across all persisted collections
    pub store_quota_bytes: u64,
    /// Endpoint for the reachability probe (HEAD request)
    pub probe_url: String,
    /// Probe polling interval in seconds
    pub probe_interval_secs: u64,
    /// Per-probe abort timeout in milliseconds
    pub probe_timeout_ms: u64,
    /// Latency of the simulated order backend in milliseconds
    pub backend_latency_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: "./pos-data".to_string(),
            store_quota_bytes: 5 * 1024 * 1024,
            probe_url: "https://www.gstatic.com/generate_204".to_string(),
            probe_interval_secs: 30,
            probe_timeout_ms: 3000,
            backend_latency_ms: 800,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or(defaults.work_dir),
            store_quota_bytes: env_parse("STORE_QUOTA_BYTES", defaults.store_quota_bytes),
            probe_url: std::env::var("PROBE_URL").unwrap_or(defaults.probe_url),
            probe_interval_secs: env_parse("PROBE_INTERVAL_SECS", defaults.probe_interval_secs),
            probe_timeout_ms: env_parse("PROBE_TIMEOUT_MS", defaults.probe_timeout_ms),
            backend_latency_ms: env_parse("BACKEND_LATENCY_MS", defaults.backend_latency_ms),
        }
    }

    /// Override the storage location and quota
    ///
    /// Mostly used by tests pointing the store at a temp directory.
    pub fn with_overrides(work_dir: impl Into<String>, store_quota_bytes: u64) -> Self {
        let mut config = Self::default();
        config.work_dir = work_dir.into();
        config.store_quota_bytes = store_quota_bytes;
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
