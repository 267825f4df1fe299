//! Connections between sockets.

use std::fmt;

use super::node::NodeId;

/// Directed link from an output socket to an input socket.
///
/// Connections are identified by their four endpoints; the graph keeps them
/// in creation order, which is also the order upstream signals are patched.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Upstream node.
    pub source: NodeId,
    /// Output socket on the upstream node.
    pub source_output: String,
    /// Downstream node.
    pub target: NodeId,
    /// Input socket on the downstream node.
    pub target_input: String,
}

impl Connection {
    /// Creates a connection description.
    pub fn new(
        source: impl Into<NodeId>,
        source_output: impl Into<String>,
        target: impl Into<NodeId>,
        target_input: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_output: source_output.into(),
            target: target.into(),
            target_input: target_input.into(),
        }
    }

    /// True if either endpoint is `node`.
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} → {}.{}",
            self.source, self.source_output, self.target, self.target_input
        )
    }
}
