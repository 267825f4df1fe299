//! Persisted document schema, import, and export.
//!
//! ```json
//! {
//!   "nodes": [{"id": "n1", "name": "Oscillator", "data": {"baseFreq": 440, "waveform": "sine"}}],
//!   "connections": [{"source": "n1", "sourceOutput": "signal", "target": "n2", "targetInput": "signal"}],
//!   "comments": [{"id": "c1", "links": ["n1"], "text": "lead", "type": "inline"}]
//! }
//! ```
//!
//! Import is lenient per item: a node that fails validation or names an
//! unknown kind is left out, and a connection whose endpoints are missing is
//! skipped and logged. Neither aborts the rest of the document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocumentError, GraphStructureError, NodeImportError};
use crate::graph::{Comment, CommentId, CommentKind, Connection, Graph, Node, NodeId};
use crate::kind::{Controls, NodeKind};

/// Whole persisted graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Nodes in insertion order.
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Connections in creation order.
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
    /// Annotations.
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
}

/// One persisted node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node id.
    pub id: NodeId,
    /// Kind tag.
    pub name: String,
    /// Control values keyed by data key.
    #[serde(default)]
    pub data: Value,
}

/// One persisted connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    /// Upstream node id.
    pub source: NodeId,
    /// Upstream output socket.
    pub source_output: String,
    /// Downstream node id.
    pub target: NodeId,
    /// Downstream input socket.
    pub target_input: String,
}

/// One persisted annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Comment id.
    pub id: CommentId,
    /// Linked node ids.
    #[serde(default)]
    pub links: Vec<NodeId>,
    /// Body text.
    #[serde(default)]
    pub text: String,
    /// Presentation.
    #[serde(rename = "type", default)]
    pub kind: CommentKind,
}

impl From<&Connection> for ConnectionRecord {
    fn from(c: &Connection) -> Self {
        Self {
            source: c.source.clone(),
            source_output: c.source_output.clone(),
            target: c.target.clone(),
            target_input: c.target_input.clone(),
        }
    }
}

impl From<ConnectionRecord> for Connection {
    fn from(r: ConnectionRecord) -> Self {
        Connection::new(r.source, r.source_output, r.target, r.target_input)
    }
}

impl Document {
    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses an already decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Writes pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The node record with `id`.
    pub fn node(&self, id: &NodeId) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| &n.id == id)
    }
}

/// What happened to each part of an imported document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportReport {
    /// Nodes created.
    pub imported_nodes: usize,
    /// Connections created.
    pub imported_connections: usize,
    /// Nodes left out, with the reason.
    pub failed: Vec<(NodeId, NodeImportError)>,
    /// Connections skipped, with the reason.
    pub skipped: Vec<(ConnectionRecord, GraphStructureError)>,
}

impl ImportReport {
    /// True when every node and connection was imported.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

impl Graph {
    /// Captures the graph as a document.
    pub fn export_document(&self) -> Document {
        Document {
            nodes: self
                .nodes()
                .iter()
                .map(|node| NodeRecord {
                    id: node.id().clone(),
                    name: node.kind().tag().to_string(),
                    data: node.controls().to_data(),
                })
                .collect(),
            connections: self.connections().iter().map(ConnectionRecord::from).collect(),
            comments: self
                .comments()
                .iter()
                .map(|c| CommentRecord {
                    id: c.id.clone(),
                    links: c.links.clone(),
                    text: c.text.clone(),
                    kind: c.kind,
                })
                .collect(),
        }
    }

    /// Builds a graph from a document.
    pub fn from_document(document: &Document) -> (Self, ImportReport) {
        let mut graph = Self::new();
        let report = graph.import_document(document);
        (graph, report)
    }

    /// Replaces the whole graph with the document's contents.
    pub fn import_document(&mut self, document: &Document) -> ImportReport {
        self.clear();
        let mut report = ImportReport::default();

        for record in &document.nodes {
            match import_node(record).and_then(|node| self.insert(node).map_err(NodeImportError::from)) {
                Ok(()) => report.imported_nodes += 1,
                Err(e) => {
                    tracing::warn!("import_node: skipping {}: {e}", record.id);
                    report.failed.push((record.id.clone(), e));
                }
            }
        }

        for record in &document.connections {
            match self.add_connection(record.clone().into()) {
                Ok(()) => report.imported_connections += 1,
                Err(e) => {
                    tracing::warn!(
                        "import_connection: skipping {}.{} → {}.{}: {e}",
                        record.source,
                        record.source_output,
                        record.target,
                        record.target_input
                    );
                    report.skipped.push((record.clone(), e));
                }
            }
        }

        for record in &document.comments {
            self.insert_comment(Comment {
                id: record.id.clone(),
                text: record.text.clone(),
                kind: record.kind,
                links: record.links.clone(),
            });
        }

        tracing::info!(
            "import: {} nodes, {} connections ({} nodes failed, {} connections skipped)",
            report.imported_nodes,
            report.imported_connections,
            report.failed.len(),
            report.skipped.len()
        );
        report
    }
}

fn import_node(record: &NodeRecord) -> Result<Node, NodeImportError> {
    let kind = NodeKind::from_tag(&record.name)?;
    let controls = Controls::from_data(kind, &record.data)?;
    Ok(Node::with_controls(record.id.clone(), controls))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "nodes": [
                {"id": "osc", "name": "Oscillator", "data": {"baseFreq": 220, "waveform": "square"}},
                {"id": "amp", "name": "Gain", "data": {"gain": 0.5}},
                {"id": "out", "name": "Universal Output", "data": {}}
            ],
            "connections": [
                {"source": "osc", "sourceOutput": "signal", "target": "amp", "targetInput": "signal"},
                {"source": "amp", "sourceOutput": "signal", "target": "out", "targetInput": "signal"}
            ],
            "comments": [
                {"id": "c1", "links": ["osc"], "text": "lead", "type": "frame"}
            ]
        })
    }

    #[test]
    fn test_import_keeps_ids_and_values() {
        let doc = Document::from_value(sample()).unwrap();
        let (graph, report) = Graph::from_document(&doc);
        assert!(report.is_clean());
        assert_eq!(report.imported_nodes, 3);
        let osc = graph.node(&"osc".into()).unwrap();
        assert_eq!(osc.controls().number("baseFreq"), 220.0);
        assert_eq!(osc.controls().choice("waveform"), "square");
        assert_eq!(graph.connections().len(), 2);
        assert_eq!(graph.comments()[0].kind, CommentKind::Frame);
    }

    #[test]
    fn test_dangling_connection_is_skipped() {
        let mut value = sample();
        value["connections"]
            .as_array_mut()
            .unwrap()
            .push(json!({"source": "ghost", "sourceOutput": "signal", "target": "amp", "targetInput": "gain"}));
        let doc = Document::from_value(value).unwrap();
        let (graph, report) = Graph::from_document(&doc);

        assert_eq!(graph.len(), 3);
        assert_eq!(report.imported_connections, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(
            report.skipped[0].1,
            GraphStructureError::NodeNotFound("ghost".into())
        );
    }

    #[test]
    fn test_bad_node_fails_alone() {
        let doc = Document::from_value(json!({
            "nodes": [
                {"id": "a", "name": "Theremin", "data": {}},
                {"id": "b", "name": "Biquad Filter", "data": {"filterType": "comb"}},
                {"id": "c", "name": "Gain", "data": {"gain": 2}},
                {"id": "c", "name": "Gain", "data": {}}
            ],
            "connections": [
                {"source": "a", "sourceOutput": "signal", "target": "c", "targetInput": "signal"}
            ]
        }))
        .unwrap();
        let (graph, report) = Graph::from_document(&doc);

        assert_eq!(graph.len(), 1);
        assert_eq!(report.failed.len(), 3);
        assert!(matches!(report.failed[0].1, NodeImportError::Unsupported(_)));
        match &report.failed[1].1 {
            NodeImportError::Validation(e) => assert_eq!(e.field, "filterType"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            report.failed[2].1,
            NodeImportError::Structure(GraphStructureError::DuplicateNodeId(_))
        ));
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_export_round_trips() {
        let doc = Document::from_value(sample()).unwrap();
        let (graph, _) = Graph::from_document(&doc);
        let exported = graph.export_document();
        let (again, report) = Graph::from_document(&exported);
        assert!(report.is_clean());
        assert_eq!(again.export_document(), exported);

        assert_eq!(exported.nodes[1].data, json!({"gain": 0.5}));
        assert_eq!(
            exported.nodes[2].data,
            json!({"gain": 1, "visual": "linear", "rangeMin": -100, "rangeMax": -10})
        );
    }

    #[test]
    fn test_inline_value_survives_while_connected() {
        let doc = Document::from_value(json!({
            "nodes": [
                {"id": "k", "name": "Constant", "data": {"value": 3}},
                {"id": "g", "name": "Gain", "data": {"gain": 0.25}}
            ],
            "connections": [
                {"source": "k", "sourceOutput": "value", "target": "g", "targetInput": "gain"}
            ]
        }))
        .unwrap();
        let (graph, _) = Graph::from_document(&doc);
        assert_eq!(graph.export_document().nodes[1].data, json!({"gain": 0.25}));
    }

    #[test]
    fn test_document_json_shape() {
        let doc = Document::from_value(sample()).unwrap();
        let json = doc.to_json_pretty().unwrap();
        assert!(json.contains("\"sourceOutput\""));
        assert!(json.contains("\"type\": \"frame\""));
        assert_eq!(Document::from_json(&json).unwrap(), doc);
        assert!(Document::from_json("{\"nodes\": 3}").is_err());
    }
}
