//! Resonode Core - graph model and live compilation for a visual audio node editor
//!
//! This crate models the user-editable node graph and compiles it into a tree
//! of primitives supplied by an external audio backend. It does no signal
//! processing of its own.
//!
//! # Core Abstractions
//!
//! ## Graph
//!
//! - [`Graph`] - Nodes, connections, and comments with validated edits
//! - [`Evaluator`] - Builds every node reachable from a sink, memoized and cycle-safe
//! - [`LiveGraph`] - Primitives built by one pass
//!
//! ## Node Kinds
//!
//! - [`NodeKind`] - The closed catalogue of kinds, each with static sockets and controls
//! - [`Controls`] - Validated control values of one node
//! - [`SocketSpec`] / [`Combine`] - Declared combination policy per input socket
//!
//! ## Backend
//!
//! - [`AudioBackend`] - Host backend contract (primitives, wiring, automation)
//! - [`RecordingBackend`] - Headless backend that records every call
//! - [`AudioSystem`] - Backend plus master chain and running sources
//!
//! ## Keyboard
//!
//! - [`KeyCode`], [`VoiceProfile`], [`VoiceRegistry`] - Voices registered by keyboard kinds
//!
//! ## Persistence
//!
//! - [`Document`] - Persisted JSON schema with lenient import and export
//!
//! # Example
//!
//! ```rust
//! use resonode_core::{Connection, Document, Graph, NodeKind};
//!
//! let mut graph = Graph::new();
//! let osc = graph.add_node(NodeKind::Oscillator);
//! let out = graph.add_node(NodeKind::UniversalOutput);
//! graph.add_connection(Connection::new(osc, "signal", out, "signal")).unwrap();
//!
//! let json = graph.export_document().to_json_pretty().unwrap();
//! let (copy, report) = Graph::from_document(&Document::from_json(&json).unwrap());
//! assert!(report.is_clean());
//! assert_eq!(copy.len(), 2);
//! ```

pub mod backend;
pub mod document;
pub mod error;
pub mod graph;
pub mod kind;
pub mod noise;
pub mod system;
pub mod voice;

pub use backend::{
    AnalyserMode, AudioBackend, Destination, FilterType, Param, ParamEvent, ParamRef,
    PrimitiveClass, PrimitiveId, PrimitiveSpec, RecordingBackend, Waveform,
};
pub use document::{CommentRecord, ConnectionRecord, Document, ImportReport, NodeRecord};
pub use error::{
    BackendUnavailableError, BuildError, DocumentError, GraphError, GraphStructureError,
    NodeImportError, UnsupportedKindError, ValidationError,
};
pub use graph::{
    Combine, Comment, CommentId, CommentKind, Connection, Direction, Evaluator, Graph, LiveGraph,
    Multiplicity, Node, NodeId, SocketSpec,
};
pub use kind::{ControlKind, ControlSpec, ControlValue, Controls, KindRole, KindSpec, NodeKind};
pub use noise::{NoiseConfig, NoiseType};
pub use system::AudioSystem;
pub use voice::{KeyCode, SILENCE_FLOOR, Voice, VoiceProfile, VoiceRegistry};
