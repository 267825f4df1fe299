//! Dependency evaluator: compiles the graph into live backend primitives.
//!
//! Evaluation starts at every sink and resolves upstream nodes depth first.
//! Each node is built at most once per pass (memoized by arena slot), and a
//! node whose resolution is already in progress signals a cycle instead of
//! recursing again.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::model::Graph;
use super::node::NodeId;
use crate::backend::{AnalyserMode, AudioBackend, PrimitiveClass, PrimitiveId};
use crate::error::{BuildError, GraphStructureError};
use crate::kind::{BuildContext, BuiltNode, ResolvedInputs};
use crate::system::AudioSystem;
use crate::voice::VoiceRegistry;

/// Primitives built by one successful pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LiveGraph {
    built: HashMap<NodeId, BuiltNode>,
    /// Built node ids in graph order.
    order: Vec<NodeId>,
    primitives: Vec<(PrimitiveId, PrimitiveClass)>,
}

impl LiveGraph {
    /// Built result of a node, if the pass reached it.
    pub fn built(&self, node: &NodeId) -> Option<&BuiltNode> {
        self.built.get(node)
    }

    /// Number of nodes built.
    pub fn node_count(&self) -> usize {
        self.built.len()
    }

    /// Every primitive created, in creation order.
    pub fn primitives(&self) -> &[(PrimitiveId, PrimitiveClass)] {
        &self.primitives
    }

    /// Continuous sources that need starting.
    pub fn sources(&self) -> impl Iterator<Item = PrimitiveId> + '_ {
        self.primitives
            .iter()
            .filter(|(_, class)| class.is_continuous())
            .map(|(id, _)| *id)
    }

    /// Primitive count per class.
    pub fn counts(&self) -> BTreeMap<PrimitiveClass, usize> {
        let mut counts = BTreeMap::new();
        for (_, class) in &self.primitives {
            *counts.entry(*class).or_insert(0) += 1;
        }
        counts
    }

    /// Analysers per sink node, in graph order.
    pub fn analysers(&self) -> Vec<(NodeId, AnalyserMode, PrimitiveId)> {
        self.order
            .iter()
            .filter_map(|node| self.built.get(node).map(|built| (node, built)))
            .flat_map(|(node, built)| {
                built
                    .analysers()
                    .iter()
                    .map(move |(mode, id)| (node.clone(), *mode, *id))
            })
            .collect()
    }

    /// True when nothing was built.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Disconnects every primitive.
    pub fn release(self, backend: &mut dyn AudioBackend) {
        for (id, _) in self.primitives {
            backend.disconnect(id);
        }
    }
}

/// Per-pass memo and in-progress set.
#[derive(Debug, Default)]
pub struct Evaluator {
    memo: HashMap<usize, BuiltNode>,
    in_progress: HashSet<usize>,
}

impl Evaluator {
    /// Creates an evaluator with an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything built by the previous pass.
    pub fn clear(&mut self) {
        self.memo.clear();
        self.in_progress.clear();
    }

    /// Builds every node reachable from a sink.
    ///
    /// Voices registered by keyboard kinds land in `voices`. On failure every
    /// primitive created by this call is disconnected before returning.
    pub fn build<B: AudioBackend>(
        &mut self,
        graph: &Graph,
        system: &mut AudioSystem<B>,
        voices: &mut VoiceRegistry,
    ) -> Result<LiveGraph, BuildError> {
        self.clear();
        let master = system.master_input();
        let noise = system.noise();
        let mut ctx = BuildContext::new(system.backend_mut(), master, voices, noise);

        let sinks: Vec<usize> = graph
            .sinks()
            .filter_map(|node| graph.position(node.id()))
            .collect();
        for slot in sinks {
            if let Err(e) = self.resolve(graph, slot, &mut ctx) {
                tracing::warn!(
                    "graph_eval: aborted after {} primitives: {e}",
                    ctx.created().len()
                );
                ctx.release_all();
                self.clear();
                return Err(e);
            }
        }

        let mut memo: Vec<(usize, BuiltNode)> = self.memo.drain().collect();
        memo.sort_by_key(|(slot, _)| *slot);
        let order = memo
            .iter()
            .map(|(slot, _)| graph.nodes()[*slot].id().clone())
            .collect();
        let built = memo
            .into_iter()
            .map(|(slot, built)| (graph.nodes()[slot].id().clone(), built))
            .collect();
        let live = LiveGraph {
            built,
            order,
            primitives: ctx.into_created(),
        };
        tracing::debug!(
            "graph_eval: {} nodes, {} primitives",
            live.node_count(),
            live.primitives.len()
        );
        Ok(live)
    }

    fn resolve(
        &mut self,
        graph: &Graph,
        slot: usize,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), BuildError> {
        if self.memo.contains_key(&slot) {
            return Ok(());
        }
        let node = &graph.nodes()[slot];
        if !self.in_progress.insert(slot) {
            return Err(GraphStructureError::Cycle(node.id().clone()).into());
        }

        let mut inputs = ResolvedInputs::new();
        for socket in node.inputs() {
            let feeding = graph
                .connections_into(node.id())
                .filter(|c| c.target_input == socket.name);
            for connection in feeding {
                let dangling = |reason: &str| GraphStructureError::DanglingConnection {
                    connection: connection.clone(),
                    reason: reason.to_string(),
                };
                let upstream = graph
                    .position(&connection.source)
                    .ok_or_else(|| dangling("source node missing"))?;
                self.resolve(graph, upstream, ctx)?;
                let handle = self
                    .memo
                    .get(&upstream)
                    .and_then(|built| built.output(&connection.source_output))
                    .ok_or_else(|| dangling("source output not built"))?;
                inputs.push(socket.name, handle);
            }
        }

        let built = node.kind().build(node, &inputs, ctx)?;
        tracing::debug!("graph_build: {} node {}", node.kind(), node.id());
        self.in_progress.remove(&slot);
        self.memo.insert(slot, built);
        Ok(())
    }
}
