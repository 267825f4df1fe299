//! The editable node graph.

use std::collections::HashMap;

use super::comment::{Comment, CommentId, CommentKind};
use super::connection::Connection;
use super::node::{Node, NodeId};
use super::socket::{Direction, Multiplicity};
use crate::error::{GraphError, GraphStructureError};
use crate::kind::{ControlValue, NodeKind};

/// Nodes, connections, and annotations as the user edits them.
///
/// Nodes live in an arena in insertion order; evaluation addresses them by
/// slot. Every mutation validates first and leaves the graph untouched on
/// error.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    slots: HashMap<NodeId, usize>,
    connections: Vec<Connection>,
    comments: Vec<Comment>,
    next_node: u64,
    next_comment: u64,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Nodes ---

    /// Adds a node with default controls and a fresh id.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.fresh_node_id();
        self.push_node(Node::new(id.clone(), kind));
        tracing::debug!("graph_add: {kind} node {id}");
        id
    }

    /// Adds a node under a caller-chosen id.
    pub fn add_node_with_id(
        &mut self,
        id: NodeId,
        kind: NodeKind,
    ) -> Result<(), GraphStructureError> {
        self.insert(Node::new(id, kind))
    }

    /// Inserts a fully formed node, keeping its id.
    pub fn insert(&mut self, node: Node) -> Result<(), GraphStructureError> {
        if self.slots.contains_key(node.id()) {
            return Err(GraphStructureError::DuplicateNodeId(node.id().clone()));
        }
        tracing::debug!("graph_add: {} node {}", node.kind(), node.id());
        self.push_node(node);
        Ok(())
    }

    /// Removes a node, every connection touching it, and its comment links.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node, GraphStructureError> {
        let slot = self
            .position(id)
            .ok_or_else(|| GraphStructureError::NodeNotFound(id.clone()))?;

        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(id));
        for comment in &mut self.comments {
            comment.links.retain(|link| link != id);
        }

        let node = self.nodes.remove(slot);
        self.reindex();
        tracing::debug!(
            "graph_remove: node {id} ({} connections dropped)",
            before - self.connections.len()
        );
        Ok(node)
    }

    /// Looks up a node.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.position(id).map(|slot| &self.nodes[slot])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sink nodes in insertion order. Evaluation starts from these.
    pub fn sinks(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind().is_sink())
    }

    /// Commits a control value after validating it against the kind.
    pub fn set_control(
        &mut self,
        id: &NodeId,
        key: &str,
        value: ControlValue,
    ) -> Result<(), GraphError> {
        let slot = self
            .position(id)
            .ok_or_else(|| GraphStructureError::NodeNotFound(id.clone()))?;
        self.nodes[slot].controls_mut().set(key, value)?;
        tracing::debug!("graph_control: {id}.{key} committed");
        Ok(())
    }

    /// Index of the node in [`nodes`](Self::nodes).
    pub fn position(&self, id: &NodeId) -> Option<usize> {
        self.slots.get(id).copied()
    }

    fn push_node(&mut self, node: Node) {
        self.slots.insert(node.id().clone(), self.nodes.len());
        self.nodes.push(node);
    }

    fn reindex(&mut self) {
        self.slots = self
            .nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.id().clone(), slot))
            .collect();
    }

    fn fresh_node_id(&mut self) -> NodeId {
        loop {
            self.next_node += 1;
            let id = NodeId::new(format!("n{}", self.next_node));
            if !self.slots.contains_key(&id) {
                return id;
            }
        }
    }

    // --- Connections ---

    /// Adds a connection after checking both endpoints, both sockets, the
    /// target's multiplicity, and duplicates.
    ///
    /// Cycles are accepted here and reported by evaluation.
    pub fn add_connection(&mut self, connection: Connection) -> Result<(), GraphStructureError> {
        let source = self
            .node(&connection.source)
            .ok_or_else(|| GraphStructureError::NodeNotFound(connection.source.clone()))?;
        if source
            .socket(&connection.source_output, Direction::Output)
            .is_none()
        {
            return Err(GraphStructureError::SocketNotFound {
                node: connection.source.clone(),
                socket: connection.source_output.clone(),
                direction: Direction::Output,
            });
        }

        let target = self
            .node(&connection.target)
            .ok_or_else(|| GraphStructureError::NodeNotFound(connection.target.clone()))?;
        let socket = target
            .socket(&connection.target_input, Direction::Input)
            .ok_or_else(|| GraphStructureError::SocketNotFound {
                node: connection.target.clone(),
                socket: connection.target_input.clone(),
                direction: Direction::Input,
            })?;

        if self.connections.contains(&connection) {
            return Err(GraphStructureError::DuplicateConnection(connection));
        }
        if socket.multiplicity == Multiplicity::Single
            && self.is_connected(&connection.target, &connection.target_input)
        {
            return Err(GraphStructureError::MultiplicityExceeded {
                node: connection.target.clone(),
                socket: connection.target_input.clone(),
            });
        }

        tracing::debug!("graph_connect: {connection}");
        self.connections.push(connection);
        Ok(())
    }

    /// Removes an existing connection.
    pub fn remove_connection(&mut self, connection: &Connection) -> Result<(), GraphStructureError> {
        let index = self
            .connections
            .iter()
            .position(|c| c == connection)
            .ok_or_else(|| GraphStructureError::ConnectionNotFound(connection.clone()))?;
        self.connections.remove(index);
        tracing::debug!("graph_disconnect: {connection}");
        Ok(())
    }

    /// Connections in creation order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connections feeding `node`, in creation order.
    pub fn connections_into<'a>(
        &'a self,
        node: &'a NodeId,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| &c.target == node)
    }

    /// True if input `socket` on `node` has at least one connection.
    pub fn is_connected(&self, node: &NodeId, socket: &str) -> bool {
        self.connections_into(node).any(|c| c.target_input == socket)
    }

    // --- Comments ---

    /// Adds a comment with a fresh id. Links to unknown nodes are dropped.
    pub fn add_comment(
        &mut self,
        text: impl Into<String>,
        kind: CommentKind,
        links: Vec<NodeId>,
    ) -> CommentId {
        let id = loop {
            self.next_comment += 1;
            let id = CommentId::new(format!("c{}", self.next_comment));
            if self.comment(&id).is_none() {
                break id;
            }
        };
        self.insert_comment(Comment {
            id: id.clone(),
            text: text.into(),
            kind,
            links,
        });
        id
    }

    /// Inserts a comment keeping its id, replacing any comment with the same id.
    /// Links to unknown nodes are dropped.
    pub fn insert_comment(&mut self, mut comment: Comment) {
        comment.links.retain(|link| {
            let known = self.slots.contains_key(link);
            if !known {
                tracing::warn!("comment_link: {} links unknown node {link}", comment.id);
            }
            known
        });
        self.comments.retain(|c| c.id != comment.id);
        self.comments.push(comment);
    }

    /// Removes a comment.
    pub fn remove_comment(&mut self, id: &CommentId) -> Result<Comment, GraphStructureError> {
        let index = self
            .comments
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| GraphStructureError::CommentNotFound(id.clone()))?;
        Ok(self.comments.remove(index))
    }

    /// Replaces a comment's text.
    pub fn update_comment_text(
        &mut self,
        id: &CommentId,
        text: impl Into<String>,
    ) -> Result<(), GraphStructureError> {
        let comment = self
            .comments
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| GraphStructureError::CommentNotFound(id.clone()))?;
        comment.text = text.into();
        Ok(())
    }

    /// Removes every comment.
    pub fn clear_comments(&mut self) {
        self.comments.clear();
    }

    /// Looks up a comment.
    pub fn comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == id)
    }

    /// Comments in insertion order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Removes every node, connection, and comment.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn osc_gain_out() -> (Graph, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new();
        let osc = graph.add_node(NodeKind::Oscillator);
        let gain = graph.add_node(NodeKind::Gain);
        let out = graph.add_node(NodeKind::UniversalOutput);
        graph
            .add_connection(Connection::new(osc.clone(), "signal", gain.clone(), "signal"))
            .unwrap();
        graph
            .add_connection(Connection::new(gain.clone(), "signal", out.clone(), "signal"))
            .unwrap();
        (graph, osc, gain, out)
    }

    #[test]
    fn test_fresh_ids_skip_taken() {
        let mut graph = Graph::new();
        graph
            .add_node_with_id(NodeId::new("n1"), NodeKind::Gain)
            .unwrap();
        let id = graph.add_node(NodeKind::Gain);
        assert_eq!(id.as_str(), "n2");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut graph = Graph::new();
        graph.add_node_with_id("a".into(), NodeKind::Gain).unwrap();
        assert_eq!(
            graph.add_node_with_id("a".into(), NodeKind::Delay),
            Err(GraphStructureError::DuplicateNodeId("a".into()))
        );
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_connect_validates_sockets() {
        let mut graph = Graph::new();
        let osc = graph.add_node(NodeKind::Oscillator);
        let gain = graph.add_node(NodeKind::Gain);

        let err = graph
            .add_connection(Connection::new(osc.clone(), "nope", gain.clone(), "signal"))
            .unwrap_err();
        assert!(matches!(
            err,
            GraphStructureError::SocketNotFound {
                direction: Direction::Output,
                ..
            }
        ));

        let err = graph
            .add_connection(Connection::new(osc.clone(), "signal", gain.clone(), "volume"))
            .unwrap_err();
        assert!(matches!(
            err,
            GraphStructureError::SocketNotFound {
                direction: Direction::Input,
                ..
            }
        ));

        let err = graph
            .add_connection(Connection::new("ghost", "signal", gain, "signal"))
            .unwrap_err();
        assert_eq!(err, GraphStructureError::NodeNotFound("ghost".into()));
        assert!(graph.connections().is_empty());
    }

    #[test]
    fn test_single_input_multiplicity() {
        let mut graph = Graph::new();
        let a = graph.add_node(NodeKind::Constant);
        let b = graph.add_node(NodeKind::Constant);
        let osc = graph.add_node(NodeKind::Oscillator);
        graph
            .add_connection(Connection::new(a, "value", osc.clone(), "baseFrequency"))
            .unwrap();
        let err = graph
            .add_connection(Connection::new(b.clone(), "value", osc.clone(), "baseFrequency"))
            .unwrap_err();
        assert!(matches!(err, GraphStructureError::MultiplicityExceeded { .. }));

        // The additional input takes any number.
        graph
            .add_connection(Connection::new(b, "value", osc, "frequency"))
            .unwrap();
    }

    #[test]
    fn test_duplicate_connection_rejected() {
        let (mut graph, osc, gain, _) = osc_gain_out();
        let err = graph
            .add_connection(Connection::new(osc, "signal", gain, "signal"))
            .unwrap_err();
        assert!(matches!(err, GraphStructureError::DuplicateConnection(_)));
    }

    #[test]
    fn test_cycles_are_accepted_structurally() {
        let mut graph = Graph::new();
        let a = graph.add_node(NodeKind::Gain);
        let b = graph.add_node(NodeKind::Gain);
        graph
            .add_connection(Connection::new(a.clone(), "signal", b.clone(), "signal"))
            .unwrap();
        graph
            .add_connection(Connection::new(b, "signal", a, "signal"))
            .unwrap();
        assert_eq!(graph.connections().len(), 2);
    }

    #[test]
    fn test_remove_node_drops_connections_and_links() {
        let (mut graph, osc, gain, out) = osc_gain_out();
        let comment = graph.add_comment("chain", CommentKind::Frame, vec![osc.clone(), gain.clone()]);

        let removed = graph.remove_node(&gain).unwrap();
        assert_eq!(removed.kind(), NodeKind::Gain);
        assert!(graph.connections().is_empty());
        assert_eq!(graph.comment(&comment).unwrap().links, vec![osc.clone()]);
        assert!(graph.node(&out).is_some());
        assert_eq!(graph.position(&out), Some(1));
        assert!(graph.remove_node(&gain).is_err());
    }

    #[test]
    fn test_remove_connection() {
        let (mut graph, osc, gain, _) = osc_gain_out();
        let link = Connection::new(osc, "signal", gain, "signal");
        graph.remove_connection(&link).unwrap();
        assert_eq!(graph.connections().len(), 1);
        assert_eq!(
            graph.remove_connection(&link),
            Err(GraphStructureError::ConnectionNotFound(link))
        );
    }

    #[test]
    fn test_set_control_validates() {
        let (mut graph, osc, ..) = osc_gain_out();
        graph.set_control(&osc, "baseFreq", 220.0.into()).unwrap();
        assert_eq!(
            graph.node(&osc).unwrap().controls().number("baseFreq"),
            220.0
        );
        assert!(matches!(
            graph.set_control(&osc, "waveform", "noise".into()),
            Err(GraphError::Validation(_))
        ));
        assert!(matches!(
            graph.set_control(&"ghost".into(), "gain", 1.0.into()),
            Err(GraphError::Structure(GraphStructureError::NodeNotFound(_)))
        ));
    }

    #[test]
    fn test_sinks_in_insertion_order() {
        let (mut graph, ..) = osc_gain_out();
        let viz = graph.add_node(NodeKind::TimeVisualizer);
        let sinks: Vec<_> = graph.sinks().map(|n| n.kind()).collect();
        assert_eq!(sinks, vec![NodeKind::UniversalOutput, NodeKind::TimeVisualizer]);
        assert!(graph.node(&viz).unwrap().kind().is_monitor());
    }

    #[test]
    fn test_comment_lifecycle() {
        let mut graph = Graph::new();
        let osc = graph.add_node(NodeKind::Oscillator);
        let id = graph.add_comment("hello", CommentKind::Inline, vec![osc, "ghost".into()]);
        assert_eq!(graph.comment(&id).unwrap().links.len(), 1);

        graph.update_comment_text(&id, "bye").unwrap();
        assert_eq!(graph.comment(&id).unwrap().text, "bye");

        graph.remove_comment(&id).unwrap();
        assert!(graph.remove_comment(&id).is_err());

        graph.add_comment("a", CommentKind::Frame, Vec::new());
        graph.clear_comments();
        assert!(graph.comments().is_empty());
    }
}
