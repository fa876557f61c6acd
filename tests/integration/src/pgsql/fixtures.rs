use shared::node::{NodeId, Topology};
use walwatch_pgsql::connector::resolve_target;

pub const APPLICATION_NAME: &str = "walwatch_integration_test";

/// Build a topology from `WALWATCH_TEST_PRIMARY` and the optional
/// comma-separated `WALWATCH_TEST_REPLICAS`.
pub fn load_test_topology() -> Topology {
  dotenvy::from_path("../../env/.env").ok();

  let primary_dsn =
    std::env::var("WALWATCH_TEST_PRIMARY").expect("WALWATCH_TEST_PRIMARY must be set");
  let replica_dsns = std::env::var("WALWATCH_TEST_REPLICAS").unwrap_or_default();

  let primary = resolve_target(NodeId::Primary, &primary_dsn).expect("bad primary DSN");
  let replicas = replica_dsns
    .split(',')
    .map(str::trim)
    .filter(|dsn| !dsn.is_empty())
    .enumerate()
    .map(|(i, dsn)| resolve_target(NodeId::Replica(i), dsn).expect("bad replica DSN"))
    .collect();

  Topology::new(primary, replicas)
}
