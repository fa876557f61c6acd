use crate::connector::{ConnectorConfig, PgClient};
use crate::settings;
use async_trait::async_trait;
use shared::error::{Result, WatchError};
use shared::node::{NodeId, NodeTarget, Topology};
use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use walwatch_core::snapshot::{PrimaryRecord, ReplicaRecord, SnapshotSource};

/// `SnapshotSource` backed by one PostgreSQL connection per node.
///
/// Connections are opened on first use, reused across rounds, and reopened
/// after the server closes them. Each node has its own slot, so concurrent
/// fetches never contend with each other.
pub struct PgSnapshotSource {
  application_name: String,
  connections: HashMap<NodeId, Mutex<Option<PgClient>>>,
}

impl PgSnapshotSource {
  pub fn new(topology: &Topology, application_name: &str) -> Self {
    let connections = std::iter::once(topology.primary())
      .chain(topology.replicas())
      .map(|target| (target.id, Mutex::new(None)))
      .collect();
    Self {
      application_name: application_name.to_string(),
      connections,
    }
  }

  /// Lock the node's connection slot, connecting first if it is empty or
  /// the previous connection has closed.
  async fn connected(&self, target: &NodeTarget) -> Result<MutexGuard<'_, Option<PgClient>>> {
    let slot = self.connections.get(&target.id).ok_or_else(|| {
      WatchError::Internal(anyhow::anyhow!("{} is not part of the topology", target.id))
    })?;
    let mut guard = slot.lock().await;

    if guard.as_ref().map_or(false, PgClient::is_closed) {
      info!(node = %target.id, address = %target.address(), "connection lost, reconnecting");
      *guard = None;
    }
    if guard.is_none() {
      let config = ConnectorConfig::for_target(target, &self.application_name);
      let client = PgClient::connect(config)
        .await
        .map_err(|e| WatchError::unreachable(target.id, e))?;
      *guard = Some(client);
    }
    Ok(guard)
  }
}

fn query_failed(node: NodeId, query: &'static str, err: tokio_postgres::Error) -> WatchError {
  // A closed connection is a reachability problem, not a bad query.
  if err.is_closed() {
    WatchError::unreachable(node, err)
  } else {
    WatchError::QueryFailed {
      node,
      query,
      source: Box::new(err),
    }
  }
}

#[async_trait]
impl SnapshotSource for PgSnapshotSource {
  async fn fetch_primary(&self, node: &NodeTarget) -> Result<PrimaryRecord> {
    let id = node.id;
    let guard = self.connected(node).await?;
    let client = guard
      .as_ref()
      .ok_or_else(|| WatchError::unreachable(id, "no connection"))?;

    let current_position = client
      .current_position()
      .await
      .map_err(|e| query_failed(id, "current position", e))?;
    let rows = client
      .wal_settings()
      .await
      .map_err(|e| query_failed(id, "wal settings", e))?;
    drop(guard);

    let wal = settings::interpret(id, &rows)?;
    debug!(node = %id, position = %current_position, segment_bytes = wal.segment_size_bytes(), "fetched primary");

    Ok(PrimaryRecord {
      host: node.host.clone(),
      port: node.port,
      current_position,
      segment_size_setting: wal.segment_size_setting,
      segment_size_unit: wal.segment_size_unit,
      retention_segments: wal.retention_segments,
    })
  }

  async fn fetch_replica(&self, node: &NodeTarget) -> Result<ReplicaRecord> {
    let id = node.id;
    let guard = self.connected(node).await?;
    let client = guard
      .as_ref()
      .ok_or_else(|| WatchError::unreachable(id, "no connection"))?;

    let status = client
      .recovery_status()
      .await
      .map_err(|e| query_failed(id, "recovery status", e))?;
    drop(guard);

    debug!(node = %id, in_recovery = status.in_recovery, replayed = ?status.replayed, "fetched replica");

    Ok(ReplicaRecord {
      host: node.host.clone(),
      port: node.port,
      in_recovery: status.in_recovery,
      replayed_position: status.replayed,
      received_position: status.received,
    })
  }
}
