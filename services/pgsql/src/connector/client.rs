use super::config::ConnectorConfig;
use super::queries::{self, PositionQueries};
use std::collections::HashMap;
use tokio_postgres::{Client, NoTls};
use tracing::{info, warn};

/// One row of `pg_settings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSetting {
  pub setting: String,
  pub unit: Option<String>,
}

/// What a node reports about its recovery state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryStatus {
  pub in_recovery: bool,
  pub replayed: Option<String>,
  pub received: Option<String>,
}

/// Connection to one monitored PostgreSQL node.
///
/// Only read-only catalog functions are called; the monitor never changes
/// replication state.
pub struct PgClient {
  client: Client,
  server_version_num: i32,
  queries: PositionQueries,
}

impl PgClient {
  /// Connect and read the server version.
  ///
  /// The driver's connection future is spawned onto the runtime; it ends
  /// when the client is dropped or the server goes away.
  pub async fn connect(config: ConnectorConfig) -> Result<Self, tokio_postgres::Error> {
    let (client, connection) = config.pg_config()?.connect(NoTls).await?;

    let node = config.node;
    tokio::spawn(async move {
      if let Err(e) = connection.await {
        warn!(node = %node, error = %e, "connection closed with error");
      }
    });

    let row = client.query_one(queries::SERVER_VERSION, &[]).await?;
    let server_version_num: i32 = row.get(0);

    info!(
        node = %config.node,
        app_name = %config.application_name,
        server_version_num,
        "connected to PostgreSQL node"
    );

    Ok(Self {
      client,
      server_version_num,
      queries: PositionQueries::for_version(server_version_num),
    })
  }

  pub fn server_version_num(&self) -> i32 {
    self.server_version_num
  }

  /// True once the underlying connection has gone away.
  pub fn is_closed(&self) -> bool {
    self.client.is_closed()
  }

  /// Query the current WAL write position as `X/Y` text.
  pub async fn current_position(&self) -> Result<String, tokio_postgres::Error> {
    let row = self.client.query_one(self.queries.current, &[]).await?;
    Ok(row.get(0))
  }

  /// Query recovery flag and last replayed/received positions.
  pub async fn recovery_status(&self) -> Result<RecoveryStatus, tokio_postgres::Error> {
    let row = self.client.query_one(self.queries.recovery, &[]).await?;
    Ok(RecoveryStatus {
      in_recovery: row.get(0),
      replayed: row.get(1),
      received: row.get(2),
    })
  }

  /// Read the WAL geometry and retention settings. Settings the server does
  /// not have are simply absent from the map.
  pub async fn wal_settings(&self) -> Result<HashMap<String, ServerSetting>, tokio_postgres::Error> {
    let names: Vec<&str> = queries::SETTING_NAMES.to_vec();
    let rows = self
      .client
      .query(queries::SEGMENT_SETTINGS, &[&names])
      .await?;
    Ok(
      rows
        .iter()
        .map(|r| {
          (
            r.get::<_, String>(0),
            ServerSetting {
              setting: r.get(1),
              unit: r.get(2),
            },
          )
        })
        .collect(),
    )
  }
}
