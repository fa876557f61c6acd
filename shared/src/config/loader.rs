use serde::Deserialize;

use crate::error::WatchError;

/// Root configuration for walwatch.
///
/// Loaded from TOML files via the `config` crate with environment-variable
/// overrides (prefix: `WALWATCH_`). Command-line arguments are applied on top
/// by the binary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchConfig {
    /// Nodes to poll.
    #[serde(default)]
    pub nodes: NodesConfig,
    /// Poll loop settings.
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Observability settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Connection targets.
#[derive(Debug, Clone, Deserialize)]
pub struct NodesConfig {
    /// Connection string of the primary.
    #[serde(default)]
    pub primary: Option<String>,
    /// Connection strings of the replicas, in display order.
    #[serde(default)]
    pub replicas: Vec<String>,
    /// Application name shown in `pg_stat_activity`.
    #[serde(default = "default_app_name")]
    pub application_name: String,
}

/// What to do when the primary cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryFailurePolicy {
    /// Stop the monitor and exit with the error.
    Fatal,
    /// Show the failure and try again on the next tick.
    SkipRound,
}

impl std::str::FromStr for PrimaryFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fatal" => Ok(Self::Fatal),
            "skip_round" | "skip-round" => Ok(Self::SkipRound),
            other => Err(format!("unknown primary failure policy '{}'", other)),
        }
    }
}

/// Poll loop configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between the start of consecutive rounds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Upper bound on a single node fetch, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    /// Round-level policy for primary fetch failures.
    #[serde(default = "default_primary_failure")]
    pub on_primary_failure: PrimaryFailurePolicy,
    /// Segment-sized slots per segment id in the offset space.
    #[serde(default = "default_slots_per_segment_id")]
    pub slots_per_segment_id: i64,
    /// Offset at which the last slot of a segment id begins.
    #[serde(default = "default_slot_offset_ceiling")]
    pub slot_offset_ceiling: i64,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level filter (e.g. `info`, `debug`, `trace`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Write logs to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Prometheus textfile written after every round.
    #[serde(default)]
    pub metrics_textfile: Option<String>,
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            primary: None,
            replicas: Vec::new(),
            application_name: default_app_name(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
            on_primary_failure: default_primary_failure(),
            slots_per_segment_id: default_slots_per_segment_id(),
            slot_offset_ceiling: default_slot_offset_ceiling(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
            metrics_textfile: None,
        }
    }
}

impl WatchConfig {
    /// Reject values the monitor cannot run with.
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.nodes.primary.as_deref().map_or(true, str::is_empty) {
            return Err(invalid("nodes.primary", "a primary connection string is required"));
        }
        if self.monitor.poll_interval_secs == 0 {
            return Err(invalid("monitor.poll_interval_secs", "must be at least 1"));
        }
        if self.monitor.fetch_timeout_secs == 0 {
            return Err(invalid("monitor.fetch_timeout_secs", "must be at least 1"));
        }
        if self.monitor.slots_per_segment_id <= 0 {
            return Err(invalid("monitor.slots_per_segment_id", "must be positive"));
        }
        if self.monitor.slot_offset_ceiling <= 0 {
            return Err(invalid("monitor.slot_offset_ceiling", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> WatchError {
    WatchError::ConfigInvalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

// ── Default value functions ─────────────────────────────────────────

fn default_app_name() -> String {
    "walwatch".to_string()
}
fn default_poll_interval() -> u64 {
    5
}
fn default_fetch_timeout() -> u64 {
    10
}
fn default_primary_failure() -> PrimaryFailurePolicy {
    PrimaryFailurePolicy::Fatal
}
fn default_slots_per_segment_id() -> i64 {
    255
}
fn default_slot_offset_ceiling() -> i64 {
    0xFF00_0000
}
fn default_log_level() -> String {
    "info".to_string()
}
