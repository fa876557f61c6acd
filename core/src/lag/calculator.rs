use super::segment::SegmentSizeConfig;
use shared::lsn::Position;

/// Distance between a primary position and a replica position.
///
/// Deltas are signed and never clamped: a replica that appears ahead of the
/// primary (two independent reads racing each other) yields negative values,
/// which are shown as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagMetrics {
  /// `primary.segment_id - replica.segment_id`.
  pub segment_id_delta: i64,
  /// Distance in whole segments, slot-adjusted.
  pub segment_count_delta: i64,
  pub primary_segment_id: u32,
  pub replica_segment_id: u32,
  pub primary_segment_slot: i64,
  pub replica_segment_slot: i64,
  /// `segment_count_delta * segment_size_bytes`.
  pub backlog_bytes: i64,
}

impl LagMetrics {
  /// True when the replica looks ahead of the primary.
  pub fn is_inverted(&self) -> bool {
    self.segment_count_delta < 0
  }
}

/// Number of segment-sized slots already consumed inside the offset space of
/// the position's segment id.
///
/// Integer division truncates toward zero, so offsets past the ceiling still
/// land in the last slot rather than rounding down into a new one.
pub fn local_segment_slot(byte_offset: u32, cfg: &SegmentSizeConfig) -> i64 {
  saturate(wide_slot(byte_offset, cfg))
}

fn wide_slot(byte_offset: u32, cfg: &SegmentSizeConfig) -> i128 {
  debug_assert!(cfg.segment_size_bytes > 0, "segment size must be positive");
  let scheme = cfg.addressing;
  1 + scheme.slots_per_segment_id as i128
    - ((scheme.offset_ceiling as i128 - byte_offset as i128) / cfg.segment_size_bytes as i128)
}

/// Slot number counted from the start of the WAL.
fn global_slot(segment_id: u32, byte_offset: u32, cfg: &SegmentSizeConfig) -> i128 {
  segment_id as i128 * cfg.addressing.slots_per_segment_id as i128 + wide_slot(byte_offset, cfg)
}

/// Clamp to the i64 range. Only reachable with positions at opposite ends of
/// the WAL or with an oversized addressing scheme.
fn saturate(value: i128) -> i64 {
  i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Compare a replica position against the primary's write position.
///
/// `cfg.segment_size_bytes` must be positive; snapshot construction
/// guarantees it for values fetched from a server. Arithmetic is carried out
/// in 128 bits and saturated into the result, so no input pair can overflow.
pub fn compute_lag(primary: Position, replica: Position, cfg: &SegmentSizeConfig) -> LagMetrics {
  let count_delta = global_slot(primary.segment_id, primary.byte_offset, cfg)
    - global_slot(replica.segment_id, replica.byte_offset, cfg);

  LagMetrics {
    segment_id_delta: primary.segment_id as i64 - replica.segment_id as i64,
    segment_count_delta: saturate(count_delta),
    primary_segment_id: primary.segment_id,
    replica_segment_id: replica.segment_id,
    primary_segment_slot: local_segment_slot(primary.byte_offset, cfg),
    replica_segment_slot: local_segment_slot(replica.byte_offset, cfg),
    backlog_bytes: saturate(count_delta.saturating_mul(cfg.segment_size_bytes as i128)),
  }
}
