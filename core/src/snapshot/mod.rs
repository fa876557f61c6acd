pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use source::SnapshotSource;
pub use types::{PrimaryRecord, PrimarySnapshot, ReplicaRecord, ReplicaSnapshot, ReplicaState};
