use crate::connector::ServerSetting;
use shared::error::WatchError;
use shared::node::NodeId;
use std::collections::HashMap;

const MIB: i64 = 1024 * 1024;

/// Segment geometry and retention as read from `pg_settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalSettings {
  /// `wal_segment_size` as reported.
  pub segment_size_setting: i64,
  /// Bytes per unit of `segment_size_setting`.
  pub segment_size_unit: i64,
  pub retention_segments: i64,
}

impl WalSettings {
  pub fn segment_size_bytes(&self) -> i64 {
    self.segment_size_setting.saturating_mul(self.segment_size_unit)
  }
}

/// Interpret the settings rows.
///
/// Before PostgreSQL 11 `wal_segment_size` is reported in `8kB` blocks, so
/// its unit is the block size; later releases report bytes. Retention comes
/// from `wal_keep_segments`, or from `wal_keep_size` (megabytes) on
/// releases that replaced it.
pub fn interpret(node: NodeId, rows: &HashMap<String, ServerSetting>) -> Result<WalSettings, WatchError> {
  let segment = require(node, rows, "wal_segment_size")?;
  let segment_size_setting = parse_int(node, "wal_segment_size", &segment.setting)?;

  let segment_size_unit = match segment.unit.as_deref() {
    None | Some("B") => 1,
    Some("kB") => 1024,
    Some("MB") => MIB,
    Some(_) => {
      // Block-sized unit such as "8kB"; the block size setting is authoritative.
      let block = require(node, rows, "wal_block_size")?;
      parse_int(node, "wal_block_size", &block.setting)?
    }
  };

  let retention_segments = match rows.get("wal_keep_segments") {
    Some(keep) => parse_int(node, "wal_keep_segments", &keep.setting)?,
    None => {
      let keep = rows
        .get("wal_keep_size")
        .ok_or_else(|| WatchError::MissingConfiguration {
          node,
          setting: "wal_keep_segments".to_string(),
        })?;
      let keep_mb = parse_int(node, "wal_keep_size", &keep.setting)?;
      let segment_bytes = segment_size_setting.saturating_mul(segment_size_unit);
      if segment_bytes <= 0 {
        return Err(WatchError::InvalidSetting {
          node,
          setting: "wal_segment_size",
          value: segment_size_setting.to_string(),
        });
      }
      keep_mb.saturating_mul(MIB) / segment_bytes
    }
  };

  Ok(WalSettings {
    segment_size_setting,
    segment_size_unit,
    retention_segments,
  })
}

fn require<'a>(
  node: NodeId,
  rows: &'a HashMap<String, ServerSetting>,
  name: &str,
) -> Result<&'a ServerSetting, WatchError> {
  rows.get(name).ok_or_else(|| WatchError::MissingConfiguration {
    node,
    setting: name.to_string(),
  })
}

fn parse_int(node: NodeId, name: &'static str, raw: &str) -> Result<i64, WatchError> {
  raw.trim().parse::<i64>().map_err(|_| WatchError::InvalidSetting {
    node,
    setting: name,
    value: raw.to_string(),
  })
}
