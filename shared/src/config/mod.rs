pub mod loader;

pub use loader::{
    MonitorConfig, NodesConfig, ObservabilityConfig, PrimaryFailurePolicy, WatchConfig,
};

use crate::error::WatchError;
use std::path::Path;

/// Load configuration from TOML files with environment-variable overrides.
///
/// Resolution order:
/// 1. `config/default.toml`: base configuration (optional)
/// 2. `config/{env}.toml`: environment overlay (optional)
/// 3. Environment variables with prefix `WALWATCH_` (double underscore for nesting)
///
/// # Example
///
/// `WALWATCH_MONITOR__POLL_INTERVAL_SECS=2` overrides
/// `monitor.poll_interval_secs`.
pub fn load_config(config_dir: &Path, env: &str) -> Result<WatchConfig, WatchError> {
    load_with_environment(config_dir, env, environment())
}

/// `WALWATCH_MONITOR__POLL_INTERVAL_SECS` maps to `monitor.poll_interval_secs`:
/// a single underscore after the prefix, double underscores for nesting.
fn environment() -> config::Environment {
    config::Environment::with_prefix("WALWATCH")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn load_with_environment(
    config_dir: &Path,
    env: &str,
    environment: config::Environment,
) -> Result<WatchConfig, WatchError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(config_dir.join("default.toml")).required(false))
        .add_source(config::File::from(config_dir.join(format!("{}.toml", env))).required(false))
        .add_source(environment)
        .build()
        .map_err(|e| WatchError::ConfigLoadFailed(Box::new(e)))?;

    settings
        .try_deserialize()
        .map_err(|e| WatchError::ConfigLoadFailed(Box::new(e)))
}
