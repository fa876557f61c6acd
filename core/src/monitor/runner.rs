use crate::daemon::ShutdownSignal;
use crate::metrics::MetricsRegistry;
use crate::poll::PollRound;
use crate::render::{Dashboard, Renderer, RoundFailure};
use crate::snapshot::SnapshotSource;
use shared::config::PrimaryFailurePolicy;
use shared::error::{Result, WatchError};
use shared::node::Topology;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSummary {
  pub rounds_completed: u64,
  pub rounds_failed: u64,
}

/// Drives poll rounds on a fixed interval until cancelled.
///
/// Rounds never overlap: the next tick is only awaited after the previous
/// round has been rendered. A tick missed because a round ran long is
/// delayed rather than bursted.
pub struct MonitorLoop<S, R> {
  round: PollRound<S>,
  topology: Topology,
  renderer: R,
  interval: Duration,
  on_primary_failure: PrimaryFailurePolicy,
  metrics: Option<MetricsRegistry>,
  metrics_textfile: Option<PathBuf>,
}

impl<S: SnapshotSource, R: Renderer> MonitorLoop<S, R> {
  pub fn new(round: PollRound<S>, topology: Topology, renderer: R, interval: Duration) -> Self {
    Self {
      round,
      topology,
      renderer,
      interval,
      on_primary_failure: PrimaryFailurePolicy::Fatal,
      metrics: None,
      metrics_textfile: None,
    }
  }

  pub fn with_failure_policy(mut self, policy: PrimaryFailurePolicy) -> Self {
    self.on_primary_failure = policy;
    self
  }

  pub fn with_metrics(mut self, metrics: MetricsRegistry, textfile: Option<PathBuf>) -> Self {
    self.metrics = Some(metrics);
    self.metrics_textfile = textfile;
    self
  }

  /// Run until `shutdown` fires or a round fails under the fatal policy.
  pub async fn run(&mut self, mut shutdown: ShutdownSignal) -> Result<MonitorSummary> {
    let mut summary = MonitorSummary::default();
    let mut ticker = tokio::time::interval(self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
      replicas = self.topology.replicas().len(),
      interval_ms = self.interval.as_millis() as u64,
      policy = ?self.on_primary_failure,
      "monitor loop started"
    );

    let mut round_no: u64 = 0;
    loop {
      if shutdown.is_triggered() {
        break;
      }
      tokio::select! {
        biased;
        _ = shutdown.triggered() => break,
        _ = ticker.tick() => {}
      }

      round_no += 1;
      // Dropping the round future on shutdown aborts any in-flight fetch.
      let outcome = tokio::select! {
        biased;
        _ = shutdown.triggered() => {
          debug!(round = round_no, "round cancelled mid-fetch");
          break;
        }
        outcome = self.round.run(round_no, &self.topology) => outcome,
      };

      match outcome {
        Ok(report) => {
          if let Some(metrics) = &self.metrics {
            metrics.record_round(&report);
          }
          self
            .renderer
            .render_round(&Dashboard::from_report(&report))
            .map_err(WatchError::Internal)?;
          summary.rounds_completed += 1;
        }
        Err(err) => {
          summary.rounds_failed += 1;
          if let Some(metrics) = &self.metrics {
            metrics.record_failure();
          }
          match self.on_primary_failure {
            PrimaryFailurePolicy::Fatal => {
              error!(round = round_no, error = %err.chain_message(), "round failed, stopping");
              self.export_metrics();
              return Err(err);
            }
            PrimaryFailurePolicy::SkipRound => {
              warn!(round = round_no, error = %err.chain_message(), "round failed, skipping");
              self
                .renderer
                .render_failure(&RoundFailure::new(round_no, &err))
                .map_err(WatchError::Internal)?;
            }
          }
        }
      }

      self.export_metrics();
    }

    info!(
      completed = summary.rounds_completed,
      failed = summary.rounds_failed,
      "monitor loop stopped"
    );
    Ok(summary)
  }

  fn export_metrics(&self) {
    if let (Some(metrics), Some(path)) = (&self.metrics, &self.metrics_textfile) {
      if let Err(e) = metrics.write_textfile(path) {
        warn!(path = %path.display(), error = %e, "failed to write metrics textfile");
      }
    }
  }
}
