pub mod types;

pub use types::{FaultCategory, WatchError};

/// Shorthand Result type used throughout walwatch.
pub type Result<T> = std::result::Result<T, WatchError>;
