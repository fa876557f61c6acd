use crate::lsn::PositionParseError;
use crate::node::NodeId;
use thiserror::Error;

/// Top-level error type for walwatch.
///
/// Fetch errors always carry the node they came from so a poll round can
/// render a per-node error state instead of failing as a whole.
#[derive(Debug, Error)]
pub enum WatchError {
    // ── Connectivity ───────────────────────────────────────────
    #[error("{node}: could not reach node")]
    Unreachable {
        node: NodeId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{node}: query '{query}' failed")]
    QueryFailed {
        node: NodeId,
        query: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Data integrity ─────────────────────────────────────────
    #[error("{node}: unparseable {field} position")]
    MalformedPosition {
        node: NodeId,
        field: &'static str,
        #[source]
        source: PositionParseError,
    },

    #[error("{node}: node in recovery reported no {field} position")]
    MissingPosition { node: NodeId, field: &'static str },

    #[error("{node}: server setting '{setting}' is missing")]
    MissingConfiguration { node: NodeId, setting: String },

    #[error("{node}: server setting '{setting}' has unusable value '{value}'")]
    InvalidSetting {
        node: NodeId,
        setting: &'static str,
        value: String,
    },

    // ── Config ─────────────────────────────────────────────────
    #[error("config: failed to load configuration")]
    ConfigLoadFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("config: invalid value for '{key}': {reason}")]
    ConfigInvalid { key: String, reason: String },

    // ── Generic ────────────────────────────────────────────────
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Coarse classification used to pick a recovery policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCategory {
    /// The node could not be reached or did not answer.
    Connectivity,
    /// The node answered with data that cannot be used.
    Data,
    /// Local configuration problem.
    Configuration,
    Internal,
}

impl WatchError {
    pub fn category(&self) -> FaultCategory {
        match self {
            WatchError::Unreachable { .. } | WatchError::QueryFailed { .. } => {
                FaultCategory::Connectivity
            }
            WatchError::MalformedPosition { .. }
            | WatchError::MissingPosition { .. }
            | WatchError::MissingConfiguration { .. }
            | WatchError::InvalidSetting { .. } => FaultCategory::Data,
            WatchError::ConfigLoadFailed(_) | WatchError::ConfigInvalid { .. } => {
                FaultCategory::Configuration
            }
            WatchError::Internal(_) => FaultCategory::Internal,
        }
    }

    /// The node this error is attributed to, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            WatchError::Unreachable { node, .. }
            | WatchError::QueryFailed { node, .. }
            | WatchError::MalformedPosition { node, .. }
            | WatchError::MissingPosition { node, .. }
            | WatchError::MissingConfiguration { node, .. }
            | WatchError::InvalidSetting { node, .. } => Some(*node),
            _ => None,
        }
    }

    /// Short label shown in the dashboard status column.
    pub fn status_label(&self) -> &'static str {
        match self.category() {
            FaultCategory::Connectivity => "UNREACHABLE",
            FaultCategory::Data => "BAD DATA",
            FaultCategory::Configuration => "CONFIG",
            FaultCategory::Internal => "ERROR",
        }
    }

    pub fn unreachable<E>(node: NodeId, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        WatchError::Unreachable {
            node,
            source: source.into(),
        }
    }

    /// Full message including the chain of sources.
    pub fn chain_message(&self) -> String {
        let mut msg = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            msg.push_str(": ");
            msg.push_str(&cause.to_string());
            source = cause.source();
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_and_data_faults_are_distinguished() {
        let unreachable = WatchError::unreachable(NodeId::Replica(1), "connection refused");
        assert_eq!(unreachable.category(), FaultCategory::Connectivity);
        assert_eq!(unreachable.node(), Some(NodeId::Replica(1)));

        let malformed = WatchError::MalformedPosition {
            node: NodeId::Replica(0),
            field: "replayed",
            source: PositionParseError("zz".into()),
        };
        assert_eq!(malformed.category(), FaultCategory::Data);
        assert_eq!(malformed.status_label(), "BAD DATA");
    }

    #[test]
    fn chain_message_includes_sources() {
        let err = WatchError::MalformedPosition {
            node: NodeId::Primary,
            field: "current",
            source: PositionParseError("nope".into()),
        };
        assert_eq!(
            err.chain_message(),
            "primary: unparseable current position: invalid WAL position: 'nope'"
        );
    }
}
