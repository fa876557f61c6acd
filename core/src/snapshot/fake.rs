//! In-memory `SnapshotSource` for exercising rounds without a database.

use super::source::SnapshotSource;
use super::types::{PrimaryRecord, ReplicaRecord};
use async_trait::async_trait;
use shared::error::{Result, WatchError};
use shared::node::{NodeId, NodeTarget, Topology};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
enum Reply {
  Primary(PrimaryRecord),
  Replica(ReplicaRecord),
  Unreachable,
}

/// Clones share state, so a test can keep a handle after the source has
/// been moved into a round.
#[derive(Clone, Default)]
pub struct FakeSource {
  replies: Arc<Mutex<HashMap<NodeId, Reply>>>,
  delays: Arc<Mutex<HashMap<NodeId, Duration>>>,
  fetches: Arc<AtomicUsize>,
}

impl FakeSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn primary(self, position: &str, retention_segments: i64) -> Self {
    self.set(
      NodeId::Primary,
      Reply::Primary(PrimaryRecord {
        host: "primary.local".into(),
        port: 5432,
        current_position: position.into(),
        segment_size_setting: 16 * 1024 * 1024,
        segment_size_unit: 1,
        retention_segments,
      }),
    );
    self
  }

  pub fn replica(
    self,
    ordinal: usize,
    in_recovery: bool,
    replayed: Option<&str>,
    received: Option<&str>,
  ) -> Self {
    self.set(
      NodeId::Replica(ordinal),
      Reply::Replica(ReplicaRecord {
        host: format!("replica{}.local", ordinal),
        port: 5432,
        in_recovery,
        replayed_position: replayed.map(String::from),
        received_position: received.map(String::from),
      }),
    );
    self
  }

  pub fn unreachable(self, node: NodeId) -> Self {
    self.set(node, Reply::Unreachable);
    self
  }

  pub fn delayed(self, node: NodeId, delay: Duration) -> Self {
    self.delays.lock().unwrap().insert(node, delay);
    self
  }

  /// Replace the primary's position between rounds.
  pub fn move_primary(&self, position: &str) {
    let mut replies = self.replies.lock().unwrap();
    if let Some(Reply::Primary(record)) = replies.get_mut(&NodeId::Primary) {
      record.current_position = position.into();
    }
  }

  pub fn fetch_count(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }

  fn set(&self, node: NodeId, reply: Reply) {
    self.replies.lock().unwrap().insert(node, reply);
  }

  async fn reply(&self, node: &NodeTarget) -> Option<Reply> {
    self.fetches.fetch_add(1, Ordering::SeqCst);
    let delay = self.delays.lock().unwrap().get(&node.id).copied();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    self.replies.lock().unwrap().get(&node.id).cloned()
  }
}

#[async_trait]
impl SnapshotSource for FakeSource {
  async fn fetch_primary(&self, node: &NodeTarget) -> Result<PrimaryRecord> {
    match self.reply(node).await {
      Some(Reply::Primary(record)) => Ok(record),
      _ => Err(WatchError::unreachable(node.id, "connection refused")),
    }
  }

  async fn fetch_replica(&self, node: &NodeTarget) -> Result<ReplicaRecord> {
    match self.reply(node).await {
      Some(Reply::Replica(record)) => Ok(record),
      _ => Err(WatchError::unreachable(node.id, "connection refused")),
    }
  }
}

pub fn topology(replicas: usize) -> Topology {
  let target = |id: NodeId, host: String| NodeTarget {
    id,
    dsn: format!("host={}", host),
    host,
    port: 5432,
  };
  Topology::new(
    target(NodeId::Primary, "primary.local".into()),
    (0..replicas)
      .map(|i| target(NodeId::Replica(i), format!("replica{}.local", i)))
      .collect(),
  )
}
