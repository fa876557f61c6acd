use shared::config::MonitorConfig;

/// How a segment id's 4-byte offset space is divided into segment-sized slots.
///
/// The legacy layout reserves 255 slots per id, with the last slot beginning
/// at `0xFF000000`. Servers built with a different addressing width need
/// different values; both are configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressingScheme {
  /// Slots per segment id. Also the multiplier turning a segment id into a
  /// global slot count.
  pub slots_per_segment_id: i64,
  /// Offset at which the last slot begins.
  pub offset_ceiling: i64,
}

impl AddressingScheme {
  pub const LEGACY: AddressingScheme = AddressingScheme {
    slots_per_segment_id: 255,
    offset_ceiling: 0xFF00_0000,
  };

  pub fn from_config(cfg: &MonitorConfig) -> Self {
    Self {
      slots_per_segment_id: cfg.slots_per_segment_id,
      offset_ceiling: cfg.slot_offset_ceiling,
    }
  }
}

impl Default for AddressingScheme {
  fn default() -> Self {
    Self::LEGACY
  }
}

/// Segment geometry and retention window of the primary.
///
/// Rebuilt from the primary's settings every round; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSizeConfig {
  /// Size of one WAL segment in bytes.
  pub segment_size_bytes: i64,
  /// Segments the primary keeps on local disk.
  pub retention_segments: i64,
  pub addressing: AddressingScheme,
}

impl SegmentSizeConfig {
  pub fn new(segment_size_bytes: i64, retention_segments: i64) -> Self {
    Self {
      segment_size_bytes,
      retention_segments,
      addressing: AddressingScheme::LEGACY,
    }
  }

  /// Build from the two server settings whose product is the segment size
  /// (the `wal_segment_size` setting and the size of its unit).
  /// The product saturates rather than overflowing on absurd settings.
  pub fn from_settings(segment_size_setting: i64, unit_bytes: i64, retention_segments: i64) -> Self {
    Self::new(segment_size_setting.saturating_mul(unit_bytes), retention_segments)
  }

  pub fn with_addressing(mut self, addressing: AddressingScheme) -> Self {
    self.addressing = addressing;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn segment_size_is_product_of_settings() {
    // Pre-11 servers report wal_segment_size in 8kB blocks.
    let cfg = SegmentSizeConfig::from_settings(2048, 8192, 64);
    assert_eq!(cfg.segment_size_bytes, 16 * 1024 * 1024);
    assert_eq!(cfg.retention_segments, 64);
    assert_eq!(cfg.addressing, AddressingScheme::LEGACY);
  }

  #[test]
  fn oversized_settings_saturate() {
    let cfg = SegmentSizeConfig::from_settings(i64::MAX, 8192, 64);
    assert_eq!(cfg.segment_size_bytes, i64::MAX);
  }

  #[test]
  fn addressing_follows_monitor_config() {
    let mut monitor = MonitorConfig::default();
    monitor.slots_per_segment_id = 256;
    monitor.slot_offset_ceiling = 0x1_0000_0000;
    let scheme = AddressingScheme::from_config(&monitor);
    assert_eq!(scheme.slots_per_segment_id, 256);
    assert_eq!(scheme.offset_ceiling, 0x1_0000_0000);
  }
}
