//! Graph nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kind::{Controls, NodeKind};

use super::socket::{Direction, SocketSpec};

/// Persisted node identifier.
///
/// Ids are opaque strings so documents written by other producers keep their
/// ids across an import. Locally created nodes get `n1`, `n2`, ... and ids
/// are never reused within a graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wraps an id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A node: identity, kind, and current control values.
///
/// Sockets are fixed by the kind. Layout belongs to the editor.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    controls: Controls,
}

impl Node {
    /// Creates a node with the kind's default controls.
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            controls: Controls::defaults(kind),
        }
    }

    /// Creates a node with explicit controls.
    pub fn with_controls(id: NodeId, controls: Controls) -> Self {
        Self {
            id,
            kind: controls.kind(),
            controls,
        }
    }

    /// Node id.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Node kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Current control values.
    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub(crate) fn controls_mut(&mut self) -> &mut Controls {
        &mut self.controls
    }

    /// Input sockets in declaration order.
    pub fn inputs(&self) -> &'static [SocketSpec] {
        self.kind.inputs()
    }

    /// Output sockets in declaration order.
    pub fn outputs(&self) -> &'static [SocketSpec] {
        self.kind.outputs()
    }

    /// Looks up a socket by name and direction.
    pub fn socket(&self, name: &str, direction: Direction) -> Option<&'static SocketSpec> {
        let sockets = match direction {
            Direction::Input => self.inputs(),
            Direction::Output => self.outputs(),
        };
        sockets.iter().find(|s| s.name == name)
    }
}
