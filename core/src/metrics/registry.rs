use crate::poll::RoundReport;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, IntGaugeVec, Opts, Registry};
use std::path::Path;

/// Label for the configured node, `replica#N`.
pub const LABEL_NODE: &str = "node";
/// Label for the replica `host:port`.
pub const LABEL_REPLICA: &str = "replica";

const REPLICA_LABELS: &[&str] = &[LABEL_NODE, LABEL_REPLICA];

/// Central Prometheus metrics registry for walwatch.
pub struct MetricsRegistry {
  pub registry: Registry,
  // Round metrics
  pub rounds_completed: IntCounter,
  pub rounds_failed: IntCounter,
  pub round_duration: Histogram,
  // Primary metrics
  pub primary_position_bytes: IntGauge,
  pub retention_segments: IntGauge,
  // Replica metrics
  pub replay_lag_segments: IntGaugeVec,
  pub receive_lag_segments: IntGaugeVec,
  pub backlog_bytes: IntGaugeVec,
  pub replica_status: IntGaugeVec,
}

impl MetricsRegistry {
  pub fn new() -> anyhow::Result<Self> {
    let registry = Registry::new();

    let rounds_completed = IntCounter::new(
      "walwatch_rounds_completed_total",
      "Poll rounds that produced a dashboard",
    )?;
    let rounds_failed = IntCounter::new(
      "walwatch_rounds_failed_total",
      "Poll rounds aborted by a primary failure",
    )?;
    let round_duration = Histogram::with_opts(
      HistogramOpts::new("walwatch_round_duration_seconds", "Time spent fetching one round")
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
    )?;

    let primary_position_bytes = IntGauge::new(
      "walwatch_primary_position_bytes",
      "Primary write position as a flat byte address",
    )?;
    let retention_segments = IntGauge::new(
      "walwatch_primary_retention_segments",
      "Segments the primary keeps locally",
    )?;

    let replay_lag_segments = IntGaugeVec::new(
      Opts::new(
        "walwatch_replica_replay_lag_segments",
        "Segments between primary write and replica replay position",
      ),
      REPLICA_LABELS,
    )?;
    let receive_lag_segments = IntGaugeVec::new(
      Opts::new(
        "walwatch_replica_receive_lag_segments",
        "Segments between primary write and replica receive position",
      ),
      REPLICA_LABELS,
    )?;
    let backlog_bytes = IntGaugeVec::new(
      Opts::new("walwatch_replica_backlog_bytes", "Approximate WAL bytes left to replay"),
      REPLICA_LABELS,
    )?;
    let replica_status = IntGaugeVec::new(
      Opts::new(
        "walwatch_replica_status",
        "0 streaming possible, 1 archive recovery required, 2 not a replica, 3 unknown",
      ),
      REPLICA_LABELS,
    )?;

    // Register all metrics
    registry.register(Box::new(rounds_completed.clone()))?;
    registry.register(Box::new(rounds_failed.clone()))?;
    registry.register(Box::new(round_duration.clone()))?;
    registry.register(Box::new(primary_position_bytes.clone()))?;
    registry.register(Box::new(retention_segments.clone()))?;
    registry.register(Box::new(replay_lag_segments.clone()))?;
    registry.register(Box::new(receive_lag_segments.clone()))?;
    registry.register(Box::new(backlog_bytes.clone()))?;
    registry.register(Box::new(replica_status.clone()))?;

    Ok(Self {
      registry,
      rounds_completed,
      rounds_failed,
      round_duration,
      primary_position_bytes,
      retention_segments,
      replay_lag_segments,
      receive_lag_segments,
      backlog_bytes,
      replica_status,
    })
  }

  /// Update every gauge from a completed round.
  ///
  /// Replicas without a measurement have their lag series removed so a
  /// scrape never sees a previous round's value as current.
  pub fn record_round(&self, report: &RoundReport) {
    self.rounds_completed.inc();
    self.round_duration.observe(report.elapsed.as_secs_f64());
    self
      .primary_position_bytes
      .set(report.primary.current_position.as_u64() as i64);
    self.retention_segments.set(report.primary.retention_segments);

    for replica in &report.replicas {
      let node = replica.node.to_string();
      let labels = [node.as_str(), replica.address.as_str()];
      self
        .replica_status
        .with_label_values(&labels)
        .set(replica.status.code());

      match replica.replay_lag() {
        Some(lag) => {
          self
            .replay_lag_segments
            .with_label_values(&labels)
            .set(lag.segment_count_delta);
          self.backlog_bytes.with_label_values(&labels).set(lag.backlog_bytes);
        }
        None => {
          let _ = self.replay_lag_segments.remove_label_values(&labels);
          let _ = self.backlog_bytes.remove_label_values(&labels);
        }
      }
      match replica.receive_lag() {
        Some(lag) => self
          .receive_lag_segments
          .with_label_values(&labels)
          .set(lag.segment_count_delta),
        None => {
          let _ = self.receive_lag_segments.remove_label_values(&labels);
        }
      }
    }
  }

  /// Count a failed round and drop every per-replica series, since none of
  /// them describe the current state any more.
  pub fn record_failure(&self) {
    self.rounds_failed.inc();
    self.replay_lag_segments.reset();
    self.receive_lag_segments.reset();
    self.backlog_bytes.reset();
    self.replica_status.reset();
  }

  /// Encode all metrics in Prometheus text format.
  pub fn encode(&self) -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let families = self.registry.gather();
    let mut buf = Vec::new();
    encoder.encode(&families, &mut buf).unwrap_or_default();
    String::from_utf8(buf).unwrap_or_default()
  }

  /// Write the text exposition to `path` for a textfile collector.
  ///
  /// Written to a sibling temp file first and renamed, so a collector never
  /// reads a half-written file.
  pub fn write_textfile(&self, path: &Path) -> anyhow::Result<()> {
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, self.encode())?;
    std::fs::rename(&tmp, path)?;
    Ok(())
  }
}
