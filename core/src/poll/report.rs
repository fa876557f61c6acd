use crate::lag::LagMetrics;
use crate::risk::RiskStatus;
use chrono::{DateTime, Utc};
use shared::error::{FaultCategory, WatchError};
use shared::lsn::Position;
use shared::node::NodeId;
use std::time::Duration;

/// Primary summary for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimarySummary {
  pub address: String,
  pub current_position: Position,
  pub segment_size_bytes: i64,
  pub retention_segments: i64,
}

/// Why a replica could not be measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFailure {
  pub category: FaultCategory,
  pub label: &'static str,
  pub message: String,
}

impl From<&WatchError> for NodeFailure {
  fn from(err: &WatchError) -> Self {
    Self {
      category: err.category(),
      label: err.status_label(),
      message: err.chain_message(),
    }
  }
}

/// Per-replica result of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaOutcome {
  /// Node is not in recovery; nothing was compared.
  NotAReplica,
  Measured {
    replayed: Position,
    received: Option<Position>,
    replay: LagMetrics,
    /// `None` when the node has never streamed.
    receive: Option<LagMetrics>,
  },
  Failed(NodeFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaReport {
  pub node: NodeId,
  pub address: String,
  pub status: RiskStatus,
  pub outcome: ReplicaOutcome,
}

impl ReplicaReport {
  pub fn replay_lag(&self) -> Option<&LagMetrics> {
    match &self.outcome {
      ReplicaOutcome::Measured { replay, .. } => Some(replay),
      _ => None,
    }
  }

  pub fn receive_lag(&self) -> Option<&LagMetrics> {
    match &self.outcome {
      ReplicaOutcome::Measured { receive, .. } => receive.as_ref(),
      _ => None,
    }
  }
}

/// Everything one round measured, in configured replica order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
  pub round: u64,
  pub taken_at: DateTime<Utc>,
  pub elapsed: Duration,
  pub primary: PrimarySummary,
  pub replicas: Vec<ReplicaReport>,
}
