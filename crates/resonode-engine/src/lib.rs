//! Live reconciliation for the resonode node graph.
//!
//! Every committed edit to the abstract graph funnels into one rebuild entry
//! point. A three-state [`RebuildScheduler`] coalesces bursts of edits into
//! at most one extra pass, and each pass rebuilds the backend graph behind
//! short fades so edits never click.
//!
//! # Core Types
//!
//! - [`Session`] - Owns the graph, audio system, keyboard, and running live graph
//! - [`RebuildScheduler`] - Idle / Rebuilding / RebuildPending state machine
//! - [`PassReport`] - Outcome of each pass, broadcast to subscribers
//! - [`LiveUpdate`] - Outcome of an in-place parameter ramp
//!
//! # Example
//!
//! ```rust
//! use resonode_config::EngineSettings;
//! use resonode_core::{Connection, NodeKind, RecordingBackend};
//! use resonode_engine::Session;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! tokio::task::LocalSet::new()
//!     .run_until(async {
//!         let session = Session::new(RecordingBackend::new(48000.0), EngineSettings::default())
//!             .unwrap();
//!         let osc = session.add_node(NodeKind::Oscillator);
//!         let out = session.add_node(NodeKind::AudioOutput);
//!         session.connect(Connection::new(osc, "signal", out, "signal")).unwrap();
//!
//!         session.idle().await;
//!         assert!(session.last_report().unwrap().is_ok());
//!     })
//!     .await;
//! # });
//! ```

mod error;
mod report;
mod scheduler;
mod session;

pub use error::EngineError;
pub use report::{LiveUpdate, PassReport, PassSummary};
pub use scheduler::{CompletionOutcome, RebuildScheduler, RebuildState, RequestOutcome};
pub use session::{Session, Visualizer};
