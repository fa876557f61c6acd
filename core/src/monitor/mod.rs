pub mod runner;

pub use runner::{MonitorLoop, MonitorSummary};
