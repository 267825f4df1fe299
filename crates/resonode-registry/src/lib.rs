//! Node palette and factory for resonode graphs.
//!
//! This crate lists every node kind the editor offers, grouped into the same
//! menu categories the editor shows, and creates nodes by menu label or kind
//! tag.
//!
//! # Features
//!
//! - **Node Discovery**: List all kinds with menu label, category, and description
//! - **Factory Pattern**: Add a default node to a graph by name
//! - **Category System**: Kinds organized by menu section
//!
//! # Example
//!
//! ```rust
//! use resonode_core::Graph;
//! use resonode_registry::{NodeCategory, NodeRegistry};
//!
//! let registry = NodeRegistry::new();
//!
//! for node in registry.all_nodes() {
//!     println!("{}: {}", node.label, node.description);
//! }
//!
//! let mut graph = Graph::new();
//! let id = registry.create(&mut graph, "Keyboard Oscillator").unwrap();
//! assert_eq!(graph.node(&id).unwrap().kind().tag(), "Keyboard Note");
//!
//! for node in registry.nodes_in_category(NodeCategory::Outputs) {
//!     println!("Output: {}", node.label);
//! }
//! ```

use resonode_core::{Graph, NodeId, NodeKind};

/// Menu section a kind is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Signal and value sources (constant, oscillator, noise)
    Sources,
    /// Signal processors (gain, filter, delay, clip, compressor)
    Processors,
    /// Musical pitch helpers (note frequency, transpose)
    Notes,
    /// Computer-keyboard instruments
    KeyboardInput,
    /// Speakers, scopes, and debuggers
    Outputs,
}

impl NodeCategory {
    /// Every category in menu order.
    pub const ALL: [NodeCategory; 5] = [
        Self::Sources,
        Self::Processors,
        Self::Notes,
        Self::KeyboardInput,
        Self::Outputs,
    ];

    /// Returns the menu label of the category.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeCategory::Sources => "Sources",
            NodeCategory::Processors => "Processors",
            NodeCategory::Notes => "Notes",
            NodeCategory::KeyboardInput => "Keyboard Input",
            NodeCategory::Outputs => "Outputs",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            NodeCategory::Sources => "Constants, oscillators, and noise generators",
            NodeCategory::Processors => "Gain, filtering, delay, clipping, and compression",
            NodeCategory::Notes => "Note frequencies and transposition",
            NodeCategory::KeyboardInput => "Instruments played from the computer keyboard",
            NodeCategory::Outputs => "Speaker outputs, visualizers, and debuggers",
        }
    }

    /// Parses a category by name, ignoring case, spaces, dashes, and underscores.
    pub fn parse(name: &str) -> Option<Self> {
        let wanted = normalize(name);
        Self::ALL
            .into_iter()
            .find(|c| normalize(c.name()) == wanted)
    }
}

/// Describes a kind in the palette.
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    /// Kind created by this entry.
    pub kind: NodeKind,
    /// Menu label. Differs from the kind tag for Keyboard Note.
    pub label: &'static str,
    /// Brief description.
    pub description: &'static str,
    /// Menu section.
    pub category: NodeCategory,
}

/// Registry of every node kind in the palette.
pub struct NodeRegistry {
    entries: Vec<NodeDescriptor>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    /// Create a new registry with every kind registered.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(NodeKind::ALL.len()),
        };
        registry.register_builtin_nodes();
        registry
    }

    fn register_builtin_nodes(&mut self) {
        use NodeCategory::{KeyboardInput, Notes, Outputs, Processors, Sources};

        // Sources
        self.register(NodeKind::Constant, "Constant", Sources, "Emits a fixed value");
        self.register(
            NodeKind::Oscillator,
            "Oscillator",
            Sources,
            "Periodic waveform with base and additional frequency inputs",
        );
        self.register(
            NodeKind::Noise,
            "Noise",
            Sources,
            "Looping noise buffer in seven colors",
        );

        // Processors
        self.register(NodeKind::Gain, "Gain", Processors, "Scales its input");
        self.register(
            NodeKind::BiquadFilter,
            "Biquad Filter",
            Processors,
            "Second-order filter with eight responses",
        );
        self.register(NodeKind::Delay, "Delay", Processors, "Delay line");
        self.register(
            NodeKind::Clip,
            "Clip",
            Processors,
            "Hard clips the signal at a fixed amplitude",
        );
        self.register(
            NodeKind::DynamicsCompressor,
            "Dynamics Compressor",
            Processors,
            "Compressor with threshold, knee, ratio, attack, and release",
        );

        // Notes
        self.register(
            NodeKind::NoteFrequency,
            "Note Frequency",
            Notes,
            "Frequency of a note in equal temperament",
        );
        self.register(
            NodeKind::Transpose,
            "Transpose",
            Notes,
            "Multiplies a frequency by octaves and half steps",
        );

        // Keyboard
        self.register(
            NodeKind::KeyboardNote,
            "Keyboard Oscillator",
            KeyboardInput,
            "Two octaves of oscillators played from the keyboard",
        );
        self.register(
            NodeKind::KeyboardAdsr,
            "Keyboard ADSR",
            KeyboardInput,
            "Envelope on any signal, gated by one key",
        );

        // Outputs
        self.register(
            NodeKind::UniversalOutput,
            "Universal Output",
            Outputs,
            "Speaker output with volume and both scopes",
        );
        self.register(NodeKind::AudioOutput, "Audio Output", Outputs, "Speaker output");
        self.register(
            NodeKind::TimeVisualizer,
            "Time Domain Visualizer",
            Outputs,
            "Oscilloscope view",
        );
        self.register(
            NodeKind::FrequencyVisualizer,
            "Frequency Domain Visualizer",
            Outputs,
            "Spectrum view",
        );
        self.register(
            NodeKind::ConsoleDebugger,
            "Console Debugger",
            Outputs,
            "Logs what feeds it",
        );
    }

    fn register(
        &mut self,
        kind: NodeKind,
        label: &'static str,
        category: NodeCategory,
        description: &'static str,
    ) {
        self.entries.push(NodeDescriptor {
            kind,
            label,
            description,
            category,
        });
    }

    /// Returns all registered kinds in menu order.
    pub fn all_nodes(&self) -> &[NodeDescriptor] {
        &self.entries
    }

    /// Returns kinds in a specific category.
    pub fn nodes_in_category(&self, category: NodeCategory) -> Vec<&NodeDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// Returns the descriptor of a kind.
    pub fn get(&self, kind: NodeKind) -> Option<&NodeDescriptor> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// Finds a descriptor by menu label or kind tag, ignoring case, spaces,
    /// dashes, and underscores.
    pub fn find(&self, name: &str) -> Option<&NodeDescriptor> {
        let wanted = normalize(name);
        self.entries
            .iter()
            .find(|e| normalize(e.label) == wanted || normalize(e.kind.tag()) == wanted)
    }

    /// Adds a default node of the named kind to `graph`.
    pub fn create(&self, graph: &mut Graph, name: &str) -> Option<NodeId> {
        self.find(name).map(|d| graph.add_node(d.kind))
    }

    /// Returns the number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = NodeRegistry::new();
        assert_eq!(registry.len(), 17);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_every_kind_registered_once() {
        let registry = NodeRegistry::new();
        for kind in NodeKind::ALL {
            let count = registry.all_nodes().iter().filter(|d| d.kind == kind).count();
            assert_eq!(count, 1, "{kind} registered {count} times");
        }
    }

    #[test]
    fn test_nodes_by_category() {
        let registry = NodeRegistry::new();
        assert_eq!(registry.nodes_in_category(NodeCategory::Sources).len(), 3);
        assert_eq!(registry.nodes_in_category(NodeCategory::Processors).len(), 5);
        assert_eq!(registry.nodes_in_category(NodeCategory::Notes).len(), 2);
        assert_eq!(registry.nodes_in_category(NodeCategory::KeyboardInput).len(), 2);
        assert_eq!(registry.nodes_in_category(NodeCategory::Outputs).len(), 5);
    }

    #[test]
    fn test_find_by_label_or_tag() {
        let registry = NodeRegistry::new();
        assert_eq!(
            registry.find("Keyboard Oscillator").map(|d| d.kind),
            Some(NodeKind::KeyboardNote)
        );
        assert_eq!(
            registry.find("keyboard-note").map(|d| d.kind),
            Some(NodeKind::KeyboardNote)
        );
        assert_eq!(
            registry.find("clip signal").map(|d| d.kind),
            Some(NodeKind::Clip)
        );
        assert!(registry.find("theremin").is_none());
    }

    #[test]
    fn test_create_adds_default_node() {
        let registry = NodeRegistry::new();
        let mut graph = Graph::new();
        let id = registry.create(&mut graph, "biquad_filter").unwrap();
        let node = graph.node(&id).unwrap();
        assert_eq!(node.kind(), NodeKind::BiquadFilter);
        assert_eq!(node.controls().number("freq"), 350.0);
        assert!(registry.create(&mut graph, "nope").is_none());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(NodeCategory::KeyboardInput.name(), "Keyboard Input");
        assert_eq!(NodeCategory::parse("keyboard-input"), Some(NodeCategory::KeyboardInput));
        assert_eq!(NodeCategory::parse("effects"), None);
    }
}
