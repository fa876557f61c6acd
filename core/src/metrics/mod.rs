pub mod registry;

pub use registry::{MetricsRegistry, LABEL_NODE, LABEL_REPLICA};
