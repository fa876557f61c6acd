use crate::lag::{AddressingScheme, SegmentSizeConfig};
use shared::error::WatchError;
use shared::lsn::Position;
use shared::node::NodeId;

/// Raw primary fetch as returned by the database collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryRecord {
  pub host: String,
  pub port: u16,
  /// Current write position, `X/Y` hex.
  pub current_position: String,
  /// `wal_segment_size` as reported by the server.
  pub segment_size_setting: i64,
  /// Bytes per unit of `segment_size_setting` (the block size on servers
  /// that report segment size in blocks, 1 when reported in bytes).
  pub segment_size_unit: i64,
  pub retention_segments: i64,
}

/// Raw replica fetch as returned by the database collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaRecord {
  pub host: String,
  pub port: u16,
  pub in_recovery: bool,
  pub replayed_position: Option<String>,
  /// Absent when streaming replication was never active.
  pub received_position: Option<String>,
}

/// Primary state for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimarySnapshot {
  pub node: NodeId,
  pub host: String,
  pub port: u16,
  pub current_position: Position,
  pub segments: SegmentSizeConfig,
}

impl PrimarySnapshot {
  pub fn from_record(
    node: NodeId,
    record: PrimaryRecord,
    addressing: AddressingScheme,
  ) -> Result<Self, WatchError> {
    let current_position = parse_position(node, "current", &record.current_position)?;

    if record.segment_size_setting <= 0 {
      return Err(WatchError::InvalidSetting {
        node,
        setting: "wal_segment_size",
        value: record.segment_size_setting.to_string(),
      });
    }
    if record.segment_size_unit <= 0 {
      return Err(WatchError::InvalidSetting {
        node,
        setting: "wal_block_size",
        value: record.segment_size_unit.to_string(),
      });
    }
    if record.retention_segments < 0 {
      return Err(WatchError::InvalidSetting {
        node,
        setting: "wal_keep_segments",
        value: record.retention_segments.to_string(),
      });
    }

    let segments = SegmentSizeConfig::from_settings(
      record.segment_size_setting,
      record.segment_size_unit,
      record.retention_segments,
    )
    .with_addressing(addressing);

    Ok(Self {
      node,
      host: record.host,
      port: record.port,
      current_position,
      segments,
    })
  }

  pub fn address(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }
}

/// What a replica reported about its recovery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaState {
  /// Not in recovery. Positions are not read for such nodes.
  NotInRecovery,
  Recovering {
    replayed: Position,
    received: Option<Position>,
  },
}

/// Replica state for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSnapshot {
  pub node: NodeId,
  pub host: String,
  pub port: u16,
  pub state: ReplicaState,
}

impl ReplicaSnapshot {
  pub fn from_record(node: NodeId, record: ReplicaRecord) -> Result<Self, WatchError> {
    let state = if !record.in_recovery {
      ReplicaState::NotInRecovery
    } else {
      let replayed = match record.replayed_position.as_deref() {
        Some(token) => parse_position(node, "replayed", token)?,
        None => {
          return Err(WatchError::MissingPosition {
            node,
            field: "replayed",
          })
        }
      };
      let received = record
        .received_position
        .as_deref()
        .map(|token| parse_position(node, "received", token))
        .transpose()?;
      ReplicaState::Recovering { replayed, received }
    };

    Ok(Self {
      node,
      host: record.host,
      port: record.port,
      state,
    })
  }

  pub fn address(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }
}

fn parse_position(node: NodeId, field: &'static str, token: &str) -> Result<Position, WatchError> {
  Position::parse(token).map_err(|source| WatchError::MalformedPosition {
    node,
    field,
    source,
  })
}
