use super::types::{PrimaryRecord, ReplicaRecord};
use async_trait::async_trait;
use shared::error::Result;
use shared::node::NodeTarget;

/// Narrow fetch interface to the database layer.
///
/// Implementations own their connections. The poll round only ever sees the
/// records they return. Errors must name the node and distinguish
/// unreachable nodes from nodes that answered with unusable data.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
  async fn fetch_primary(&self, node: &NodeTarget) -> Result<PrimaryRecord>;

  async fn fetch_replica(&self, node: &NodeTarget) -> Result<ReplicaRecord>;
}
