use tracing::info;

/// Tokio runtime configuration.
///
/// Rounds run one at a time; the extra worker only serves concurrent replica
/// fetches and the connection tasks of the database driver.
pub struct RuntimeConfig {
  /// Number of Tokio worker threads.
  pub worker_threads: usize,
  /// Thread name prefix.
  pub thread_name: String,
}

impl Default for RuntimeConfig {
  fn default() -> Self {
    Self {
      worker_threads: 2,
      thread_name: "walwatch-worker".to_string(),
    }
  }
}

impl RuntimeConfig {
  /// Build a Tokio runtime from this config.
  pub fn build_runtime(&self) -> anyhow::Result<tokio::runtime::Runtime> {
    let rt = tokio::runtime::Builder::new_multi_thread()
      .worker_threads(self.worker_threads)
      .thread_name(&self.thread_name)
      .enable_all()
      .build()?;

    info!(workers = self.worker_threads, "tokio runtime configured");

    Ok(rt)
  }
}
