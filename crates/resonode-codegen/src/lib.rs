//! Resonode Codegen - standalone Web Audio programs from graph documents
//!
//! Compiles a persisted [`Document`] into a self-contained JavaScript module
//! that builds the same primitive tree on a browser `AudioContext`. Every
//! control value is baked in as a literal; nothing refers back to the editor.
//!
//! # Layout of the generated program
//!
//! ```text
//! preamble        AudioContext, master gain → compressor → destination, sources[]
//! helpers         noise generators and the keyboard runtime, only when used
//! node blocks     one `n<position>_<role>` block per node, in document order
//! wiring          one statement per connection, in document order
//! epilogue        start every source
//! ```
//!
//! Wiring applies the same socket policies as live evaluation: a parameter
//! fed by an override or additive socket is zeroed once before its first
//! wire, while "additional" sockets add onto the base value. Visualizers and
//! debuggers emit no primitive and wires into them are dropped.
//!
//! The document is validated as a whole first. An unknown kind, invalid
//! data, or a dangling connection aborts generation with no output.
//!
//! # Example
//!
//! ```rust
//! use resonode_codegen::generate;
//! use resonode_core::{Connection, Graph, NodeKind};
//!
//! let mut graph = Graph::new();
//! let osc = graph.add_node(NodeKind::Oscillator);
//! let out = graph.add_node(NodeKind::AudioOutput);
//! graph.add_connection(Connection::new(osc, "signal", out, "signal")).unwrap();
//!
//! let js = generate(&graph.export_document()).unwrap();
//! assert!(js.contains("n1_osc.connect(master);"));
//! ```

mod error;
mod runtime;
mod script;
mod templates;

pub use error::CodegenError;

use std::collections::HashSet;

use resonode_core::{Document, Graph, NodeKind, NoiseType};

use crate::script::{Script, num};
use crate::templates::{Block, Sink};

/// Program generator with its output settings.
#[derive(Clone, Debug)]
pub struct CodeGenerator {
    master_gain: f64,
    noise_seconds: f64,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self {
            master_gain: 1.0,
            noise_seconds: 10.0,
        }
    }
}

impl CodeGenerator {
    /// Creates a generator with unity master gain and 10 s noise buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the master gain literal, clamped to [0, 1].
    #[must_use]
    pub fn with_master_gain(mut self, gain: f64) -> Self {
        self.master_gain = gain.clamp(0.0, 1.0);
        self
    }

    /// Sets the noise buffer length in seconds.
    #[must_use]
    pub fn with_noise_seconds(mut self, seconds: f64) -> Self {
        self.noise_seconds = seconds;
        self
    }

    /// Compiles `document` into a JavaScript module.
    pub fn generate(&self, document: &Document) -> Result<String, CodegenError> {
        let graph = validated_graph(document)?;
        let mut script = Script::new();

        script.line(format!(
            "// Generated by resonode: {} nodes, {} connections.",
            graph.len(),
            graph.connections().len()
        ));
        script.block(runtime::PREAMBLE);
        script.line(format!("master.gain.value = {};", num(self.master_gain)));
        emit_helpers(&mut script, &graph);

        let mut blocks = Vec::with_capacity(graph.len());
        for (index, node) in graph.nodes().iter().enumerate() {
            script.blank();
            blocks.push(templates::emit_node(
                &mut script,
                index,
                node,
                &graph,
                self.noise_seconds,
            ));
        }

        script.blank();
        script.line("// wiring");
        emit_wiring(&mut script, &graph, &blocks)?;

        script.blank();
        script.line("for (const source of sources) source.start();");
        script.blank();
        script.line("export { ctx, master, sources };");

        tracing::info!(
            "codegen_done: {} nodes, {} connections",
            graph.len(),
            graph.connections().len()
        );
        Ok(script.finish())
    }
}

/// Compiles `document` with default settings.
pub fn generate(document: &Document) -> Result<String, CodegenError> {
    CodeGenerator::new().generate(document)
}

/// Imports the document, refusing anything the lenient importer would skip.
fn validated_graph(document: &Document) -> Result<Graph, CodegenError> {
    let (graph, report) = Graph::from_document(document);
    if let Some((id, err)) = report.failed.into_iter().next() {
        tracing::warn!("codegen_reject: node {id}: {err}");
        return Err(err.into());
    }
    if let Some((record, err)) = report.skipped.into_iter().next() {
        tracing::warn!("codegen_reject: connection {} → {}: {err}", record.source, record.target);
        return Err(err.into());
    }
    Ok(graph)
}

fn emit_helpers(script: &mut Script, graph: &Graph) {
    let mut noises: HashSet<NoiseType> = HashSet::new();
    for node in graph.nodes() {
        if node.kind() != NodeKind::Noise {
            continue;
        }
        let noise = NoiseType::parse(node.controls().choice("noiseType")).unwrap_or_default();
        noises.insert(noise);
        noises.extend(runtime::noise_dependencies(noise));
    }
    // Stable order regardless of which nodes asked for them.
    for noise in NoiseType::ALL.into_iter().filter(|n| noises.contains(n)) {
        script.blank();
        script.block(runtime::noise_source(noise));
    }

    let kinds: HashSet<NodeKind> = graph.nodes().iter().map(|n| n.kind()).collect();
    if kinds.contains(&NodeKind::KeyboardNote) || kinds.contains(&NodeKind::KeyboardAdsr) {
        script.blank();
        script.block(runtime::KEYBOARD);
    }
    if kinds.contains(&NodeKind::KeyboardNote) {
        script.blank();
        script.line(templates::note_map_literal());
    }
}

fn emit_wiring(script: &mut Script, graph: &Graph, blocks: &[Block]) -> Result<(), CodegenError> {
    let mut zeroed: HashSet<String> = HashSet::new();

    for connection in graph.connections() {
        let dangling = |reason: &str| resonode_core::GraphStructureError::DanglingConnection {
            connection: connection.clone(),
            reason: reason.to_string(),
        };
        let source = graph
            .position(&connection.source)
            .and_then(|i| blocks.get(i))
            .and_then(|b| b.output_handle(&connection.source_output))
            .ok_or_else(|| dangling("source has no output handle"))?;
        let sink = graph
            .position(&connection.target)
            .and_then(|i| blocks.get(i))
            .and_then(|b| b.sink(&connection.target_input))
            .ok_or_else(|| dangling("target has no input handle"))?;

        match sink {
            Sink::Input(target) => script.line(format!("{source}.connect({target});")),
            Sink::Param { path, combine } => {
                if combine.zeroes_target() && zeroed.insert(path.clone()) {
                    script.line(format!("{path}.value = 0;"));
                }
                script.line(format!("{source}.connect({path});"));
            }
            Sink::EachParam { list, param } => {
                script.line(format!(
                    "for (const p of {list}) {source}.connect(p.{param});"
                ));
            }
            Sink::Dropped => {
                tracing::debug!("codegen_drop: {connection}");
            }
        }
    }
    Ok(())
}
