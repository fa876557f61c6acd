use std::fmt;

/// Operational risk of a replica, derived from the current round only.
///
/// There is no memory across rounds, so a replica hovering around the
/// retention limit can flip between the two active states from one round to
/// the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskStatus {
  /// The primary still holds every segment the replica needs.
  StreamingPossible,
  /// The replica needs segments the primary no longer keeps locally.
  RecoveryFromArchiveRequired,
  /// The node is not in recovery mode.
  NotAReplica,
  /// The node could not be measured this round.
  Unknown,
}

impl RiskStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      RiskStatus::StreamingPossible => "STREAMING_POSSIBLE",
      RiskStatus::RecoveryFromArchiveRequired => "RECOVERY_FROM_ARCHIVE_REQUIRED",
      RiskStatus::NotAReplica => "NOT_A_REPLICA",
      RiskStatus::Unknown => "UNKNOWN",
    }
  }

  /// Numeric code exported as a gauge value.
  pub fn code(self) -> i64 {
    match self {
      RiskStatus::StreamingPossible => 0,
      RiskStatus::RecoveryFromArchiveRequired => 1,
      RiskStatus::NotAReplica => 2,
      RiskStatus::Unknown => 3,
    }
  }
}

impl fmt::Display for RiskStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Classify from the replay segment distance and the primary's retention
/// window. Streaming is possible only while the distance stays strictly
/// below the window.
pub fn classify(segment_count_delta: i64, retention_segments: i64) -> RiskStatus {
  if retention_segments > segment_count_delta {
    RiskStatus::StreamingPossible
  } else {
    RiskStatus::RecoveryFromArchiveRequired
  }
}
