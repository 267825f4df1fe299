//! The editable node graph and its compilation into live primitives.
//!
//! # Architecture
//!
//! - [`Graph`] holds what the user edits: nodes in an arena, connections in
//!   creation order, and comments. Every edit validates before mutating.
//! - [`Evaluator`] walks the graph from its sinks and asks each node's kind to
//!   build backend primitives, memoizing per pass and reporting cycles.
//! - [`LiveGraph`] is the result of one successful pass. It is never
//!   persisted; the reconciliation loop owns it and discards it on the next
//!   pass.
//!
//! # Example
//!
//! ```rust
//! use resonode_core::graph::{Connection, Evaluator, Graph};
//! use resonode_core::kind::NodeKind;
//! use resonode_core::{AudioSystem, NoiseConfig, RecordingBackend, VoiceRegistry};
//!
//! let mut graph = Graph::new();
//! let osc = graph.add_node(NodeKind::Oscillator);
//! let out = graph.add_node(NodeKind::AudioOutput);
//! graph.add_connection(Connection::new(osc, "signal", out, "signal")).unwrap();
//!
//! let mut system = AudioSystem::new(RecordingBackend::new(48000.0), 1.0, NoiseConfig::default()).unwrap();
//! let mut voices = VoiceRegistry::new();
//! let live = Evaluator::new().build(&graph, &mut system, &mut voices).unwrap();
//! assert_eq!(live.sources().count(), 1);
//! ```

mod comment;
mod connection;
mod evaluate;
mod model;
mod node;
mod socket;

pub use comment::{Comment, CommentId, CommentKind};
pub use connection::Connection;
pub use evaluate::{Evaluator, LiveGraph};
pub use model::Graph;
pub use node::{Node, NodeId};
pub use socket::{Combine, Direction, Multiplicity, SocketSpec};
