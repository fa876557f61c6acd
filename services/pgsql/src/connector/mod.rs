pub mod client;
pub mod config;
pub mod queries;

pub use client::{PgClient, RecoveryStatus, ServerSetting};
pub use config::{resolve_target, ConnectorConfig};
pub use queries::PositionQueries;
