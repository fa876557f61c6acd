pub mod connector;
pub mod settings;
pub mod source;

pub use source::PgSnapshotSource;
