//! The live editing session.
//!
//! [`Session`] owns the abstract graph and everything built from it: the
//! audio system, the keyboard manager, the evaluator, and the running live
//! graph. Edits apply synchronously and funnel into [`Session::request_rebuild`],
//! which runs reconciliation passes as local tasks on the current
//! [`LocalSet`](tokio::task::LocalSet).
//!
//! # Pass Order
//!
//! 1. Reset the keyboard and evaluate every sink into a staged live graph
//! 2. Fade out and stop the previous sources, then discard the previous graph
//! 3. After the settle delay, install the staged graph and voices
//! 4. After the start delay, start the new sources and fade in
//! 5. After the finish delay, complete
//!
//! Evaluation happens before teardown, so a failing pass leaves the previous
//! graph playing.

use std::cell::RefCell;
use std::rc::Rc;

use resonode_codegen::{CodeGenerator, CodegenError};
use resonode_config::EngineSettings;
use resonode_core::{
    AnalyserMode, AudioBackend, AudioSystem, Comment, CommentId, CommentKind, Connection,
    ControlValue, Document, Evaluator, GraphStructureError, Graph, ImportReport, KeyCode,
    LiveGraph, Node, NodeId, NodeKind, PrimitiveId, ValidationError, Voice, VoiceProfile,
    VoiceRegistry,
};
use resonode_synth::{KeyState, KeyboardVoiceManager};
use tokio::sync::{Notify, broadcast};

use crate::error::EngineError;
use crate::report::{LiveUpdate, PassReport, PassSummary};
use crate::scheduler::{CompletionOutcome, RebuildScheduler, RebuildState, RequestOutcome};

/// Capacity of the pass report channel.
const REPORT_CHANNEL_CAPACITY: usize = 16;

/// Analyser handle a UI can read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visualizer {
    /// Sink node the analyser belongs to.
    pub node: NodeId,
    /// Time or frequency domain.
    pub mode: AnalyserMode,
    /// Backend analyser.
    pub analyser: PrimitiveId,
}

/// Staged result of evaluation, installed later in the pass.
struct Staged {
    live: LiveGraph,
    voices: VoiceRegistry,
}

struct Inner<B: AudioBackend> {
    graph: Graph,
    system: AudioSystem<B>,
    keyboard: KeyboardVoiceManager,
    evaluator: Evaluator,
    live: Option<LiveGraph>,
    scheduler: RebuildScheduler,
    settings: EngineSettings,
    last_report: Option<PassReport>,
}

/// Cloneable handle to one editing session.
///
/// All clones share the same state. A session is single-threaded: passes
/// run through [`tokio::task::spawn_local`], so edits that request a rebuild
/// must be made from inside a [`LocalSet`](tokio::task::LocalSet).
pub struct Session<B: AudioBackend + 'static> {
    inner: Rc<RefCell<Inner<B>>>,
    reports: broadcast::Sender<PassReport>,
    settled: Rc<Notify>,
}

impl<B: AudioBackend + 'static> Clone for Session<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            reports: self.reports.clone(),
            settled: Rc::clone(&self.settled),
        }
    }
}

impl<B: AudioBackend + 'static> Session<B> {
    /// Creates a session with an empty graph on `backend`.
    pub fn new(backend: B, settings: EngineSettings) -> Result<Self, EngineError> {
        let system = AudioSystem::new(
            backend,
            settings.output.master_gain,
            settings.noise_config(),
        )?;
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Rc::new(RefCell::new(Inner {
                graph: Graph::new(),
                system,
                keyboard: KeyboardVoiceManager::new(),
                evaluator: Evaluator::new(),
                live: None,
                scheduler: RebuildScheduler::new(),
                settings,
                last_report: None,
            })),
            reports,
            settled: Rc::new(Notify::new()),
        })
    }

    // --- Graph edits ---

    /// Adds a node with default controls.
    pub fn add_node(&self, kind: NodeKind) -> NodeId {
        let id = self.inner.borrow_mut().graph.add_node(kind);
        self.request_rebuild();
        id
    }

    /// Removes a node and everything attached to it.
    pub fn remove_node(&self, id: &NodeId) -> Result<Node, EngineError> {
        let node = self.inner.borrow_mut().graph.remove_node(id)?;
        self.request_rebuild();
        Ok(node)
    }

    /// Adds a connection.
    pub fn connect(&self, connection: Connection) -> Result<(), EngineError> {
        self.inner.borrow_mut().graph.add_connection(connection)?;
        self.request_rebuild();
        Ok(())
    }

    /// Removes a connection.
    pub fn disconnect(&self, connection: &Connection) -> Result<(), EngineError> {
        self.inner.borrow_mut().graph.remove_connection(connection)?;
        self.request_rebuild();
        Ok(())
    }

    /// Commits a control value and requests a rebuild.
    pub fn set_control(
        &self,
        id: &NodeId,
        key: &str,
        value: impl Into<ControlValue>,
    ) -> Result<(), EngineError> {
        self.inner
            .borrow_mut()
            .graph
            .set_control(id, key, value.into())?;
        self.request_rebuild();
        Ok(())
    }

    /// Adds a comment. Comments never affect audio, so no rebuild is requested.
    pub fn add_comment(
        &self,
        text: impl Into<String>,
        kind: CommentKind,
        links: Vec<NodeId>,
    ) -> CommentId {
        self.inner.borrow_mut().graph.add_comment(text, kind, links)
    }

    /// Removes a comment.
    pub fn remove_comment(&self, id: &CommentId) -> Result<Comment, EngineError> {
        Ok(self.inner.borrow_mut().graph.remove_comment(id)?)
    }

    /// Replaces a comment's text.
    pub fn update_comment_text(
        &self,
        id: &CommentId,
        text: impl Into<String>,
    ) -> Result<(), EngineError> {
        Ok(self
            .inner
            .borrow_mut()
            .graph
            .update_comment_text(id, text)?)
    }

    /// Runs `f` against the current graph.
    pub fn with_graph<R>(&self, f: impl FnOnce(&Graph) -> R) -> R {
        f(&self.inner.borrow().graph)
    }

    // --- Documents ---

    /// Captures the graph as a document.
    pub fn export_document(&self) -> Document {
        self.inner.borrow().graph.export_document()
    }

    /// Replaces the whole graph with `document` and requests one rebuild.
    ///
    /// Import is lenient: failed nodes and skipped connections are listed in
    /// the report and the rest of the document is kept.
    pub fn import_document(&self, document: &Document) -> ImportReport {
        let (graph, report) = Graph::from_document(document);
        tracing::info!(
            "session_import: {} nodes, {} connections ({} failed, {} skipped)",
            report.imported_nodes,
            report.imported_connections,
            report.failed.len(),
            report.skipped.len()
        );
        self.inner.borrow_mut().graph = graph;
        self.request_rebuild();
        report
    }

    /// Generates a standalone program for the current graph.
    pub fn generate_code(&self) -> Result<String, CodegenError> {
        let inner = self.inner.borrow();
        CodeGenerator::new()
            .with_master_gain(inner.settings.output.master_gain)
            .with_noise_seconds(inner.settings.noise.buffer_seconds)
            .generate(&inner.graph.export_document())
    }

    // --- Reconciliation ---

    /// The single entry point for rebuilding the live graph.
    ///
    /// Starts a pass when idle; otherwise the request is coalesced into one
    /// pending pass. Must be called from inside a `LocalSet`.
    pub fn request_rebuild(&self) {
        let outcome = self.inner.borrow_mut().scheduler.request();
        match outcome {
            RequestOutcome::StartPass => {
                let session = self.clone();
                tokio::task::spawn_local(async move { session.run_passes().await });
            }
            RequestOutcome::Coalesced => {
                tracing::debug!("rebuild_request: coalesced into pending pass");
            }
        }
    }

    /// Scheduler state.
    pub fn state(&self) -> RebuildState {
        self.inner.borrow().scheduler.state()
    }

    /// True while a pass is running or pending.
    pub fn is_busy(&self) -> bool {
        self.inner.borrow().scheduler.is_busy()
    }

    /// Waits until no pass is running or pending.
    pub async fn idle(&self) {
        loop {
            let settled = self.settled.notified();
            if !self.is_busy() {
                return;
            }
            settled.await;
        }
    }

    /// Report of the most recent pass.
    pub fn last_report(&self) -> Option<PassReport> {
        self.inner.borrow().last_report.clone()
    }

    /// Receives a report after every pass.
    pub fn subscribe(&self) -> broadcast::Receiver<PassReport> {
        self.reports.subscribe()
    }

    async fn run_passes(self) {
        loop {
            self.run_pass().await;
            let next = self.inner.borrow_mut().scheduler.complete();
            match next {
                CompletionOutcome::RunAgain => {
                    tracing::debug!("rebuild_pass: pending request, running again");
                }
                CompletionOutcome::Settled => break,
            }
        }
        self.settled.notify_waiters();
    }

    async fn run_pass(&self) {
        let (pass, timing) = {
            let inner = self.inner.borrow();
            (inner.scheduler.passes(), inner.settings.reconcile)
        };
        let ramp = timing.fade().as_secs_f64();
        tracing::debug!("rebuild_pass: {pass} evaluating");

        let staged = self.inner.borrow_mut().stage();
        let staged = match staged {
            Ok(staged) => staged,
            Err(e) => {
                tracing::warn!("rebuild_pass: {pass} failed, keeping previous graph: {e}");
                self.publish(PassReport {
                    pass,
                    outcome: Err(e),
                });
                return;
            }
        };
        let summary = PassSummary::of(&staged.live, &staged.voices);

        let faded = self.inner.borrow_mut().system.fade_out_and_stop(ramp);
        tracing::debug!("rebuild_pass: {pass} fading out (sources playing: {faded})");
        tokio::time::sleep(timing.fade()).await;
        self.inner.borrow_mut().discard_live();

        tokio::time::sleep(timing.settle()).await;
        self.inner.borrow_mut().install(staged);
        tracing::debug!("rebuild_pass: {pass} installed");

        tokio::time::sleep(timing.start_delay()).await;
        self.inner.borrow_mut().system.start_and_fade_in(ramp);

        tokio::time::sleep(timing.finish_delay()).await;
        tracing::info!("rebuild_pass: {pass} complete, {summary}");
        self.publish(PassReport {
            pass,
            outcome: Ok(summary),
        });
    }

    fn publish(&self, report: PassReport) {
        self.inner.borrow_mut().last_report = Some(report.clone());
        // No subscribers is fine.
        self.reports.send(report).ok();
    }

    // --- Live state ---

    /// Ramps a running parameter to `value` without rebuilding.
    ///
    /// The committed control value is left unchanged.
    pub fn set_control_live(
        &self,
        id: &NodeId,
        key: &str,
        value: f64,
    ) -> Result<LiveUpdate, EngineError> {
        let result = self.inner.borrow_mut().live_update(id, key, value);
        if let Err(e) = &result {
            tracing::warn!("live_update: {id}.{key} rejected: {e}");
        }
        result
    }

    /// Suspends or resumes playback, then requests a rebuild.
    pub fn set_playing(&self, playing: bool) {
        self.inner.borrow_mut().system.set_running(playing);
        tracing::debug!("session_playing: {playing}");
        self.request_rebuild();
    }

    /// True while the backend renders.
    pub fn is_playing(&self) -> bool {
        self.inner.borrow().system.is_running()
    }

    /// Key press. Returns true when voices were triggered.
    pub fn key_down(&self, code: &str, shift: bool) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Inner {
            keyboard, system, ..
        } = &mut *inner;
        keyboard.key_down(system.backend_mut(), code, shift)
    }

    /// Key release.
    pub fn key_up(&self, code: &str, shift: bool) {
        let mut inner = self.inner.borrow_mut();
        let Inner {
            keyboard, system, ..
        } = &mut *inner;
        keyboard.key_up(system.backend_mut(), code, shift);
    }

    /// State of one key.
    pub fn key_state(&self, key: KeyCode) -> KeyState {
        self.inner.borrow().keyboard.key_state(key)
    }

    /// True while the sustain modifier is held.
    pub fn is_sustaining(&self) -> bool {
        self.inner.borrow().keyboard.is_sustaining()
    }

    /// Installed voices on `key`, each with its envelope profile.
    pub fn voices(&self, key: KeyCode) -> Vec<(Voice, VoiceProfile)> {
        let inner = self.inner.borrow();
        let registry = inner.keyboard.registry();
        registry
            .voices_for(key)
            .iter()
            .map(|voice| (*voice, registry.profile(voice.profile)))
            .collect()
    }

    /// Analysers of the running graph, in graph order.
    pub fn visualizers(&self) -> Vec<Visualizer> {
        self.inner
            .borrow()
            .live
            .as_ref()
            .map(LiveGraph::analysers)
            .unwrap_or_default()
            .into_iter()
            .map(|(node, mode, analyser)| Visualizer {
                node,
                mode,
                analyser,
            })
            .collect()
    }

    /// Runs `f` against the running live graph, if a pass has installed one.
    pub fn with_live_graph<R>(&self, f: impl FnOnce(Option<&LiveGraph>) -> R) -> R {
        f(self.inner.borrow().live.as_ref())
    }

    /// Runs `f` against the backend.
    pub fn with_backend<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        f(self.inner.borrow().system.backend())
    }

    /// Runs `f` against the backend mutably.
    pub fn with_backend_mut<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(self.inner.borrow_mut().system.backend_mut())
    }

    /// Settings the session was created with.
    pub fn settings(&self) -> EngineSettings {
        self.inner.borrow().settings.clone()
    }
}

impl<B: AudioBackend> Inner<B> {
    /// Evaluates every sink into a staged graph. On failure the keyboard
    /// gets its previous voices back and nothing else changes.
    fn stage(&mut self) -> Result<Staged, EngineError> {
        self.evaluator.clear();
        let previous = self.keyboard.snapshot();
        self.keyboard.reset();

        let mut voices = VoiceRegistry::new();
        match self
            .evaluator
            .build(&self.graph, &mut self.system, &mut voices)
        {
            Ok(live) => Ok(Staged { live, voices }),
            Err(e) => {
                self.keyboard.restore(previous);
                Err(e.into())
            }
        }
    }

    fn discard_live(&mut self) {
        if let Some(old) = self.live.take() {
            tracing::debug!("rebuild_pass: releasing {} primitives", old.primitives().len());
            self.system.release(old);
        }
    }

    fn install(&mut self, staged: Staged) {
        self.system.adopt_sources(&staged.live);
        self.keyboard.install(staged.voices);
        self.live = Some(staged.live);
    }

    fn live_update(&mut self, id: &NodeId, key: &str, value: f64) -> Result<LiveUpdate, EngineError> {
        let kind = self
            .graph
            .node(id)
            .ok_or_else(|| GraphStructureError::NodeNotFound(id.clone()))?
            .kind();
        let spec = kind
            .control(key)
            .ok_or_else(|| ValidationError::new(kind, key, "unknown control"))?;
        if !spec.live {
            return Err(ValidationError::new(kind, key, "not adjustable while playing").into());
        }
        if !value.is_finite() {
            return Err(ValidationError::new(kind, key, "must be a finite number").into());
        }
        if let Some(socket) = kind.socket_for_control(key)
            && self.graph.is_connected(id, socket.name)
        {
            tracing::debug!("live_update: {id}.{key} bypassed by connected {}", socket.name);
            return Ok(LiveUpdate::Bypassed);
        }

        let Some(binding) = self
            .live
            .as_ref()
            .and_then(|live| live.built(id))
            .and_then(|built| built.binding(key))
            .copied()
        else {
            return Ok(LiveUpdate::NotBuilt);
        };
        let value = binding.clamp(spec.clamp(value));
        let target = binding.target;

        let ramp = self.settings.live.ramp_seconds();
        self.system.backend_mut().ramp_linear(target, value, ramp);
        tracing::debug!("live_update: {id}.{key} → {value} over {ramp}s");
        Ok(LiveUpdate::Applied { value })
    }
}
