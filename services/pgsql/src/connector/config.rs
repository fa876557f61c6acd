use shared::error::WatchError;
use shared::node::{NodeId, NodeTarget};
use tokio_postgres::config::Host;

const DEFAULT_PORT: u16 = 5432;

/// Connection configuration for one monitored node.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
  pub node: NodeId,
  /// PostgreSQL connection string.
  pub connection_string: String,
  /// Application name visible in `pg_stat_activity`.
  pub application_name: String,
}

impl ConnectorConfig {
  pub fn for_target(target: &NodeTarget, application_name: &str) -> Self {
    Self {
      node: target.id,
      connection_string: target.dsn.clone(),
      application_name: application_name.to_string(),
    }
  }

  /// Parsed driver config, with the application name filled in unless the
  /// connection string already sets one.
  pub fn pg_config(&self) -> Result<tokio_postgres::Config, tokio_postgres::Error> {
    let mut pg: tokio_postgres::Config = self.connection_string.parse()?;
    if pg.get_application_name().is_none() {
      pg.application_name(&self.application_name);
    }
    Ok(pg)
  }
}

/// Build a node descriptor from a connection string, resolving the host and
/// port shown on the dashboard.
///
/// Accepts both `key=value` and `postgresql://` forms. Only the first host
/// of a multi-host string is displayed.
pub fn resolve_target(id: NodeId, dsn: &str) -> Result<NodeTarget, WatchError> {
  let pg: tokio_postgres::Config = dsn.parse().map_err(|e| WatchError::ConfigInvalid {
    key: format!("{} connection string", id),
    reason: format!("{}", e),
  })?;

  let host = match pg.get_hosts().first() {
    Some(Host::Tcp(name)) => name.clone(),
    #[cfg(unix)]
    Some(Host::Unix(path)) => path.display().to_string(),
    None => "localhost".to_string(),
  };
  let port = pg.get_ports().first().copied().unwrap_or(DEFAULT_PORT);

  Ok(NodeTarget {
    id,
    dsn: dsn.to_string(),
    host,
    port,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolves_key_value_dsn() {
    let target = resolve_target(NodeId::Primary, "host=db0.internal port=6432 user=monitor").unwrap();
    assert_eq!(target.host, "db0.internal");
    assert_eq!(target.port, 6432);
    assert_eq!(target.address(), "db0.internal:6432");
  }

  #[test]
  fn resolves_url_dsn_with_default_port() {
    let target = resolve_target(NodeId::Replica(1), "postgresql://monitor@db1.internal/postgres").unwrap();
    assert_eq!(target.host, "db1.internal");
    assert_eq!(target.port, 5432);
    assert_eq!(target.id, NodeId::Replica(1));
  }

  #[test]
  fn missing_host_defaults_to_localhost() {
    let target = resolve_target(NodeId::Primary, "user=monitor").unwrap();
    assert_eq!(target.address(), "localhost:5432");
  }

  #[test]
  fn invalid_dsn_is_a_config_error() {
    let err = resolve_target(NodeId::Replica(0), "port=notanumber").unwrap_err();
    assert!(matches!(err, WatchError::ConfigInvalid { .. }));
  }

  #[test]
  fn application_name_is_filled_in_unless_given() {
    let target = resolve_target(NodeId::Primary, "host=db0").unwrap();
    let cfg = ConnectorConfig::for_target(&target, "walwatch");
    assert_eq!(cfg.pg_config().unwrap().get_application_name(), Some("walwatch"));

    let target = resolve_target(NodeId::Primary, "host=db0 application_name=ops").unwrap();
    let cfg = ConnectorConfig::for_target(&target, "walwatch");
    assert_eq!(cfg.pg_config().unwrap().get_application_name(), Some("ops"));
  }
}
