use super::report::{NodeFailure, PrimarySummary, ReplicaOutcome, ReplicaReport, RoundReport};
use crate::lag::{compute_lag, AddressingScheme};
use crate::risk::{classify, RiskStatus};
use crate::snapshot::{PrimarySnapshot, ReplicaSnapshot, ReplicaState, SnapshotSource};
use chrono::Utc;
use futures::future::join_all;
use shared::error::{Result, WatchError};
use shared::node::{NodeTarget, Topology};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One measurement cycle: fetch every node, then compute.
///
/// Nothing is computed until every fetch of the round has finished, so a
/// report never mixes fresh and partial data. Reads are not coordinated
/// across nodes; positions may be slightly inconsistent with each other.
pub struct PollRound<S> {
  source: S,
  addressing: AddressingScheme,
  fetch_timeout: Duration,
}

impl<S: SnapshotSource> PollRound<S> {
  pub fn new(source: S, addressing: AddressingScheme, fetch_timeout: Duration) -> Self {
    Self {
      source,
      addressing,
      fetch_timeout,
    }
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  /// Run one round.
  ///
  /// A primary failure aborts the round. Replica failures are isolated to
  /// that replica's row.
  pub async fn run(&self, round: u64, topology: &Topology) -> Result<RoundReport> {
    let started = Instant::now();
    let taken_at = Utc::now();

    let primary_target = topology.primary();
    let record = self
      .bounded(primary_target, self.source.fetch_primary(primary_target))
      .await?;
    let primary = PrimarySnapshot::from_record(primary_target.id, record, self.addressing)?;

    let fetches = topology.replicas().iter().map(|target| async move {
      let fetched = self
        .bounded(target, self.source.fetch_replica(target))
        .await
        .and_then(|record| ReplicaSnapshot::from_record(target.id, record));
      (target, fetched)
    });
    // join_all yields results in input order regardless of completion order.
    let fetched = join_all(fetches).await;

    let replicas = fetched
      .into_iter()
      .map(|(target, result)| match result {
        Ok(snapshot) => measure_replica(&primary, &snapshot),
        Err(err) => failed_replica(target, &err),
      })
      .collect();

    let report = RoundReport {
      round,
      taken_at,
      elapsed: started.elapsed(),
      primary: PrimarySummary {
        address: primary.address(),
        current_position: primary.current_position,
        segment_size_bytes: primary.segments.segment_size_bytes,
        retention_segments: primary.segments.retention_segments,
      },
      replicas,
    };

    debug!(
      round,
      replicas = report.replicas.len(),
      elapsed_ms = report.elapsed.as_millis() as u64,
      primary = %report.primary.current_position,
      "poll round complete"
    );

    Ok(report)
  }

  async fn bounded<T, F>(&self, target: &NodeTarget, fetch: F) -> Result<T>
  where
    F: Future<Output = Result<T>>,
  {
    match tokio::time::timeout(self.fetch_timeout, fetch).await {
      Ok(result) => result,
      Err(_) => Err(WatchError::unreachable(
        target.id,
        format!("no answer within {:?}", self.fetch_timeout),
      )),
    }
  }
}

/// Compare one replica snapshot against the primary.
pub fn measure_replica(primary: &PrimarySnapshot, replica: &ReplicaSnapshot) -> ReplicaReport {
  let (status, outcome) = match replica.state {
    ReplicaState::NotInRecovery => (RiskStatus::NotAReplica, ReplicaOutcome::NotAReplica),
    ReplicaState::Recovering { replayed, received } => {
      let cfg = &primary.segments;
      let replay = compute_lag(primary.current_position, replayed, cfg);
      let receive = received.map(|pos| compute_lag(primary.current_position, pos, cfg));
      if replay.is_inverted() {
        debug!(
          node = %replica.node,
          primary = %primary.current_position,
          replayed = %replayed,
          "replica appears ahead of primary"
        );
      }
      (
        classify(replay.segment_count_delta, cfg.retention_segments),
        ReplicaOutcome::Measured {
          replayed,
          received,
          replay,
          receive,
        },
      )
    }
  };

  ReplicaReport {
    node: replica.node,
    address: replica.address(),
    status,
    outcome,
  }
}

fn failed_replica(target: &NodeTarget, err: &WatchError) -> ReplicaReport {
  warn!(node = %target.id, address = %target.address(), error = %err.chain_message(), "replica fetch failed");
  ReplicaReport {
    node: target.id,
    address: target.address(),
    status: RiskStatus::Unknown,
    outcome: ReplicaOutcome::Failed(NodeFailure::from(err)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::snapshot::fake::{topology, FakeSource};
  use shared::error::FaultCategory;
  use shared::node::NodeId;

  const PRIMARY: &str = "3E/5B05DE30";

  fn round(source: FakeSource) -> PollRound<FakeSource> {
    PollRound::new(source, AddressingScheme::LEGACY, Duration::from_millis(200))
  }

  #[tokio::test]
  async fn identical_replica_streams_with_zero_lag() {
    let poll = round(FakeSource::new().primary(PRIMARY, 64).replica(0, true, Some(PRIMARY), Some(PRIMARY)));
    let report = poll.run(1, &topology(1)).await.unwrap();

    let replica = &report.replicas[0];
    assert_eq!(replica.status, RiskStatus::StreamingPossible);
    assert_eq!(replica.replay_lag().unwrap().segment_count_delta, 0);
    assert_eq!(replica.receive_lag().unwrap().backlog_bytes, 0);
    assert_eq!(report.primary.segment_size_bytes, 16 * 1024 * 1024);
  }

  #[tokio::test]
  async fn replica_65_segment_ids_behind_needs_archive() {
    // Segment id 0x3E is below 65, so start from a primary further along.
    let primary = "80/5B05DE30";
    let behind = format!("{:X}/5B05DE30", 0x80 - 65);
    let poll = round(FakeSource::new().primary(primary, 64).replica(0, true, Some(&behind), None));
    let report = poll.run(1, &topology(1)).await.unwrap();

    let replica = &report.replicas[0];
    assert_eq!(replica.replay_lag().unwrap().segment_id_delta, 65);
    assert_eq!(replica.status, RiskStatus::RecoveryFromArchiveRequired);
  }

  #[tokio::test]
  async fn never_streamed_replica_has_no_receive_metrics() {
    let poll = round(FakeSource::new().primary(PRIMARY, 64).replica(0, true, Some("3E/5B000000"), None));
    let report = poll.run(1, &topology(1)).await.unwrap();

    let replica = &report.replicas[0];
    assert_eq!(replica.replay_lag().unwrap().segment_count_delta, 1);
    assert!(replica.receive_lag().is_none());
    assert_eq!(replica.status, RiskStatus::StreamingPossible);
  }

  #[tokio::test]
  async fn non_replica_is_not_measured() {
    let poll = round(FakeSource::new().primary(PRIMARY, 64).replica(0, false, Some("0/0"), Some("0/0")));
    let report = poll.run(1, &topology(1)).await.unwrap();

    let replica = &report.replicas[0];
    assert_eq!(replica.status, RiskStatus::NotAReplica);
    assert_eq!(replica.outcome, ReplicaOutcome::NotAReplica);
    assert!(replica.replay_lag().is_none());
  }

  #[tokio::test]
  async fn unreachable_replica_is_isolated() {
    let poll = round(
      FakeSource::new()
        .primary(PRIMARY, 64)
        .unreachable(NodeId::Replica(0))
        .replica(1, true, Some(PRIMARY), None),
    );
    let report = poll.run(1, &topology(2)).await.unwrap();

    assert_eq!(report.replicas[0].status, RiskStatus::Unknown);
    match &report.replicas[0].outcome {
      ReplicaOutcome::Failed(failure) => {
        assert_eq!(failure.category, FaultCategory::Connectivity);
        assert_eq!(failure.label, "UNREACHABLE");
      }
      other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(report.replicas[1].status, RiskStatus::StreamingPossible);
  }

  #[tokio::test]
  async fn malformed_replica_data_is_a_data_fault() {
    let poll = round(FakeSource::new().primary(PRIMARY, 64).replica(0, true, Some("bogus"), None));
    let report = poll.run(1, &topology(1)).await.unwrap();

    match &report.replicas[0].outcome {
      ReplicaOutcome::Failed(failure) => assert_eq!(failure.category, FaultCategory::Data),
      other => panic!("unexpected outcome {:?}", other),
    }
  }

  #[tokio::test]
  async fn primary_failure_aborts_the_round() {
    let poll = round(
      FakeSource::new()
        .unreachable(NodeId::Primary)
        .replica(0, true, Some(PRIMARY), None),
    );
    let err = poll.run(1, &topology(1)).await.unwrap_err();
    assert_eq!(err.node(), Some(NodeId::Primary));
    assert_eq!(err.category(), FaultCategory::Connectivity);
    assert_eq!(poll.source().fetch_count(), 1);
  }

  #[tokio::test]
  async fn slow_replica_times_out_as_unreachable() {
    let poll = round(
      FakeSource::new()
        .primary(PRIMARY, 64)
        .replica(0, true, Some(PRIMARY), None)
        .delayed(NodeId::Replica(0), Duration::from_secs(5)),
    );
    let report = poll.run(1, &topology(1)).await.unwrap();
    assert_eq!(report.replicas[0].status, RiskStatus::Unknown);
  }

  #[tokio::test]
  async fn order_follows_configuration_not_completion() {
    let poll = round(
      FakeSource::new()
        .primary(PRIMARY, 64)
        .replica(0, true, Some(PRIMARY), None)
        .replica(1, true, Some("3E/0"), None)
        .delayed(NodeId::Replica(0), Duration::from_millis(50)),
    );
    let report = poll.run(1, &topology(2)).await.unwrap();
    let nodes: Vec<_> = report.replicas.iter().map(|r| r.node).collect();
    assert_eq!(nodes, vec![NodeId::Replica(0), NodeId::Replica(1)]);
  }
}
