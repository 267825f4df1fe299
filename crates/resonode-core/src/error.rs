//! Error taxonomy for graph editing, evaluation, and import.

use thiserror::Error;

use crate::backend::PrimitiveClass;
use crate::graph::{CommentId, Connection, Direction, NodeId};
use crate::kind::NodeKind;

/// A kind-specific parameter is out of its domain or malformed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid '{field}' for {kind}: {reason}")]
pub struct ValidationError {
    /// Kind the parameter belongs to.
    pub kind: NodeKind,
    /// Offending control or data field.
    pub field: String,
    /// Why the value was rejected.
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: NodeKind, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// The graph's shape does not allow the requested operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphStructureError {
    /// No node with this id exists.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The node has no socket with this name and direction.
    #[error("node {node} has no {direction} socket '{socket}'")]
    SocketNotFound {
        /// Node that was searched.
        node: NodeId,
        /// Requested socket name.
        socket: String,
        /// Requested direction.
        direction: Direction,
    },

    /// A single-connection input already has its connection.
    #[error("input '{socket}' on node {node} accepts a single connection")]
    MultiplicityExceeded {
        /// Target node.
        node: NodeId,
        /// Target input socket.
        socket: String,
    },

    /// The exact same connection exists already.
    #[error("connection {0} already exists")]
    DuplicateConnection(Connection),

    /// No such connection exists.
    #[error("connection {0} not found")]
    ConnectionNotFound(Connection),

    /// A connection names a node or socket that does not exist.
    #[error("dangling connection {connection}: {reason}")]
    DanglingConnection {
        /// The offending connection.
        connection: Connection,
        /// Which endpoint is missing.
        reason: String,
    },

    /// A node with this id is already in the graph.
    #[error("node id {0} is already in use")]
    DuplicateNodeId(NodeId),

    /// Resolution reached a node whose resolution was already in progress.
    #[error("cycle detected through node {0}")]
    Cycle(NodeId),

    /// No comment with this id exists.
    #[error("comment {0} not found")]
    CommentNotFound(CommentId),
}

/// A kind tag that is not part of the node catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported node kind '{kind}'")]
pub struct UnsupportedKindError {
    /// The unrecognized tag.
    pub kind: String,
}

/// The host backend could not provide a primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("backend could not create {primitive}: {reason}")]
pub struct BackendUnavailableError {
    /// Class that failed.
    pub primitive: PrimitiveClass,
    /// Backend-supplied reason.
    pub reason: String,
}

impl BackendUnavailableError {
    /// Creates a backend error.
    pub fn new(primitive: PrimitiveClass, reason: impl Into<String>) -> Self {
        Self {
            primitive,
            reason: reason.into(),
        }
    }
}

/// Failure of a graph edit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Structural problem (missing node or socket, multiplicity).
    #[error(transparent)]
    Structure(#[from] GraphStructureError),

    /// The new value was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failure while building the live backend graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// A node's stored controls did not validate.
    #[error("build failed: {0}")]
    Validation(#[from] ValidationError),

    /// The graph could not be resolved (cycle, missing endpoint).
    #[error("build failed: {0}")]
    Structure(#[from] GraphStructureError),

    /// The backend refused a primitive.
    #[error("build failed: {0}")]
    Backend(#[from] BackendUnavailableError),
}

/// Why a single node of a document was not imported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeImportError {
    /// The kind tag is unknown.
    #[error(transparent)]
    Unsupported(#[from] UnsupportedKindError),

    /// A data field failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The node id collides with an earlier node.
    #[error(transparent)]
    Structure(#[from] GraphStructureError),
}

/// A document could not be parsed at all.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Malformed JSON or wrong top-level shape.
    #[error("failed to parse document: {0}")]
    Json(#[from] serde_json::Error),
}
