pub mod calculator;
pub mod segment;

pub use calculator::{compute_lag, local_segment_slot, LagMetrics};
pub use segment::{AddressingScheme, SegmentSizeConfig};
