use crate::poll::{ReplicaOutcome, ReplicaReport, RoundReport};
use crate::risk::RiskStatus;
use shared::error::WatchError;

/// Shown in receive columns when the node has never streamed.
pub const NO_STREAMING: &str = "no streaming data";
const NOT_APPLICABLE: &str = "-";

/// Header line of a dashboard frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRow {
  pub round: u64,
  pub taken_at: String,
  pub primary_address: String,
  pub primary_position: String,
  pub segment_size: String,
  pub retention: String,
}

/// One replica line, every field already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRow {
  pub address: String,
  pub status: RiskStatus,
  /// Status text; a node failure label replaces the status name.
  pub status_label: String,
  pub replayed_position: String,
  pub replay_segment_id_delta: String,
  pub replay_segment_count_delta: String,
  pub received_position: String,
  pub receive_segment_id_delta: String,
  pub receive_segment_count_delta: String,
  pub backlog: String,
  pub note: Option<String>,
}

/// A complete frame, built from one round report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
  pub header: HeaderRow,
  pub rows: Vec<DashboardRow>,
}

impl Dashboard {
  pub fn from_report(report: &RoundReport) -> Self {
    let header = HeaderRow {
      round: report.round,
      taken_at: report.taken_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
      primary_address: report.primary.address.clone(),
      primary_position: report.primary.current_position.to_string(),
      segment_size: format_bytes(report.primary.segment_size_bytes),
      retention: format!("{} segments", report.primary.retention_segments),
    };
    Self {
      header,
      rows: report.replicas.iter().map(DashboardRow::from_report).collect(),
    }
  }
}

impl DashboardRow {
  pub fn from_report(replica: &ReplicaReport) -> Self {
    let mut row = DashboardRow {
      address: replica.address.clone(),
      status: replica.status,
      status_label: replica.status.as_str().to_string(),
      replayed_position: NOT_APPLICABLE.into(),
      replay_segment_id_delta: NOT_APPLICABLE.into(),
      replay_segment_count_delta: NOT_APPLICABLE.into(),
      received_position: NOT_APPLICABLE.into(),
      receive_segment_id_delta: NOT_APPLICABLE.into(),
      receive_segment_count_delta: NOT_APPLICABLE.into(),
      backlog: NOT_APPLICABLE.into(),
      note: None,
    };

    match &replica.outcome {
      ReplicaOutcome::NotAReplica => {}
      ReplicaOutcome::Measured {
        replayed,
        received,
        replay,
        receive,
      } => {
        row.replayed_position = replayed.to_string();
        row.replay_segment_id_delta = replay.segment_id_delta.to_string();
        row.replay_segment_count_delta = replay.segment_count_delta.to_string();
        row.backlog = format_bytes(replay.backlog_bytes);
        match (received, receive) {
          (Some(pos), Some(lag)) => {
            row.received_position = pos.to_string();
            row.receive_segment_id_delta = lag.segment_id_delta.to_string();
            row.receive_segment_count_delta = lag.segment_count_delta.to_string();
          }
          _ => {
            row.received_position = NO_STREAMING.into();
            row.receive_segment_id_delta = NO_STREAMING.into();
            row.receive_segment_count_delta = NO_STREAMING.into();
          }
        }
        if replay.is_inverted() {
          row.note = Some("replica reported ahead of primary".into());
        }
      }
      ReplicaOutcome::Failed(failure) => {
        row.status_label = failure.label.to_string();
        row.note = Some(failure.message.clone());
      }
    }
    row
  }
}

/// A round that produced no dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundFailure {
  pub round: u64,
  pub taken_at: String,
  pub label: String,
  pub message: String,
}

impl RoundFailure {
  pub fn new(round: u64, err: &WatchError) -> Self {
    Self {
      round,
      taken_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
      label: err.status_label().to_string(),
      message: err.chain_message(),
    }
  }
}

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Human-scaled, signed byte count (`-1.5 GiB`, `512 B`).
pub fn format_bytes(bytes: i64) -> String {
  let sign = if bytes < 0 { "-" } else { "" };
  let magnitude = bytes.unsigned_abs();
  if magnitude < 1024 {
    return format!("{}{} B", sign, magnitude);
  }
  let mut value = magnitude as f64;
  let mut unit = 0;
  while value >= 1024.0 && unit < UNITS.len() - 1 {
    value /= 1024.0;
    unit += 1;
  }
  format!("{}{:.1} {}", sign, value, UNITS[unit])
}
