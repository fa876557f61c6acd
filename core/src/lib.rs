pub mod daemon;
pub mod lag;
pub mod metrics;
pub mod monitor;
pub mod poll;
pub mod render;
pub mod risk;
pub mod snapshot;
