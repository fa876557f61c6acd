pub mod types;

pub use types::{Position, PositionParseError};
