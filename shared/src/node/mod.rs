pub mod types;

pub use types::{NodeId, NodeTarget, Topology};
