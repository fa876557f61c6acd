#![cfg(test)]
use crate::pgsql::fixtures::{load_test_topology, APPLICATION_NAME};
use std::time::Duration;
use walwatch_core::lag::AddressingScheme;
use walwatch_core::poll::{PollRound, ReplicaOutcome};
use walwatch_core::risk::RiskStatus;
use walwatch_pgsql::PgSnapshotSource;

#[tokio::test]
#[ignore]
async fn test_single_round_against_live_cluster() {
  let topology = load_test_topology();
  let source = PgSnapshotSource::new(&topology, APPLICATION_NAME);
  let round = PollRound::new(source, AddressingScheme::LEGACY, Duration::from_secs(10));

  let report = round.run(1, &topology).await.expect("Round failed");
  assert_eq!(report.replicas.len(), topology.replicas().len());

  for (replica, target) in report.replicas.iter().zip(topology.replicas()) {
    assert_eq!(replica.node, target.id);
    println!("{} -> {}", replica.address, replica.status);
    match &replica.outcome {
      ReplicaOutcome::Measured { replay, .. } => {
        assert_ne!(replica.status, RiskStatus::NotAReplica);
        assert!(replay.segment_count_delta >= -1, "replica far ahead: {:?}", replay);
      }
      ReplicaOutcome::NotAReplica => assert_eq!(replica.status, RiskStatus::NotAReplica),
      ReplicaOutcome::Failed(failure) => {
        assert_eq!(replica.status, RiskStatus::Unknown);
        println!("  {}: {}", failure.label, failure.message);
      }
    }
  }
}

#[tokio::test]
#[ignore]
async fn test_connections_are_reused_across_rounds() {
  let topology = load_test_topology();
  let source = PgSnapshotSource::new(&topology, APPLICATION_NAME);
  let round = PollRound::new(source, AddressingScheme::LEGACY, Duration::from_secs(10));

  let first = round.run(1, &topology).await.expect("First round failed");
  let second = round.run(2, &topology).await.expect("Second round failed");
  assert_eq!(second.round, 2);
  // The primary write position never moves backwards.
  assert!(!first
    .primary
    .current_position
    .is_ahead_of(second.primary.current_position));
}
