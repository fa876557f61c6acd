use std::fmt;

/// Identifies a node by its role and its position in the configured list.
///
/// Replicas are numbered from 0 in the order they were given on the command
/// line or in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Primary,
    Replica(usize),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Primary => f.write_str("primary"),
            NodeId::Replica(ordinal) => write!(f, "replica#{}", ordinal),
        }
    }
}

/// A node the monitor polls. Built once at startup and passed by reference
/// into every poll round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTarget {
    pub id: NodeId,
    /// Connection string handed to the database collaborator.
    pub dsn: String,
    /// Host as shown on the dashboard.
    pub host: String,
    /// Port as shown on the dashboard.
    pub port: u16,
}

impl NodeTarget {
    /// `host:port` label used on the dashboard and in logs.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Ordered set of nodes: one primary and zero or more replicas.
#[derive(Debug, Clone)]
pub struct Topology {
    primary: NodeTarget,
    replicas: Vec<NodeTarget>,
}

impl Topology {
    pub fn new(primary: NodeTarget, replicas: Vec<NodeTarget>) -> Self {
        Self { primary, replicas }
    }

    pub fn primary(&self) -> &NodeTarget {
        &self.primary
    }

    /// Replicas in configured order.
    pub fn replicas(&self) -> &[NodeTarget] {
        &self.replicas
    }
}
