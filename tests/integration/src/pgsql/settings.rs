#![cfg(test)]
use crate::pgsql::fixtures::{load_test_topology, APPLICATION_NAME};
use walwatch_core::lag::SegmentSizeConfig;
use walwatch_core::snapshot::SnapshotSource;
use walwatch_pgsql::connector::{ConnectorConfig, PgClient};
use walwatch_pgsql::settings;
use walwatch_pgsql::PgSnapshotSource;

#[tokio::test]
#[ignore]
async fn test_primary_settings_are_usable() {
  let topology = load_test_topology();
  let target = topology.primary();
  let client = PgClient::connect(ConnectorConfig::for_target(target, APPLICATION_NAME))
    .await
    .expect("Failed to connect with PgClient");

  assert!(client.server_version_num() > 0);

  let rows = client.wal_settings().await.expect("Failed to read settings");
  let wal = settings::interpret(target.id, &rows).expect("Settings not interpretable");
  assert!(wal.segment_size_bytes() > 0);
  assert!(wal.retention_segments >= 0);

  let position = client.current_position().await.expect("Failed to read position");
  assert!(position.contains('/'), "unexpected position {}", position);
}

#[tokio::test]
#[ignore]
async fn test_primary_record_round_trips_through_snapshot() {
  let topology = load_test_topology();
  let source = PgSnapshotSource::new(&topology, APPLICATION_NAME);

  let record = source
    .fetch_primary(topology.primary())
    .await
    .expect("Failed to fetch primary");
  let cfg = SegmentSizeConfig::from_settings(
    record.segment_size_setting,
    record.segment_size_unit,
    record.retention_segments,
  );
  println!("primary {} segment size {} bytes", record.current_position, cfg.segment_size_bytes);
  assert_eq!(record.host, topology.primary().host);
}
