//! The closed catalogue of node kinds.
//!
//! Every kind is a variant of [`NodeKind`] with a static [`KindSpec`]
//! (sockets and controls) and a build function. Adding a kind means adding a
//! variant, its spec, and a match arm in [`NodeKind::build`]; there is no
//! open extension point.
//!
//! Kinds are grouped by role:
//!
//! - **Sources** ([`sources`]): Constant, Oscillator, Noise, Note Frequency
//! - **Processors** ([`processors`]): Gain, Biquad Filter, Delay, Clip Signal,
//!   Dynamics Compressor, Transpose
//! - **Keyboard inputs** ([`keyboard`]): Keyboard Note, Keyboard ADSR
//! - **Sinks** ([`sinks`]): Audio Output, Universal Output, the two
//!   visualizers, Console Debugger

mod build;
mod control;
pub mod keyboard;
pub mod processors;
pub mod sinks;
pub mod sources;

pub use build::{BuildContext, BuiltNode, LiveBinding, ResolvedInputs};
pub use control::{ControlKind, ControlSpec, ControlValue, Controls};

use std::fmt;

use crate::error::{BuildError, UnsupportedKindError};
use crate::graph::{Node, SocketSpec};

/// Sockets and controls of one kind.
#[derive(Debug)]
pub struct KindSpec {
    /// Input sockets in display order.
    pub inputs: &'static [SocketSpec],
    /// Output sockets in display order.
    pub outputs: &'static [SocketSpec],
    /// Controls in persisted order.
    pub controls: &'static [ControlSpec],
}

/// Broad role of a kind in the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KindRole {
    /// Produces a signal from nothing.
    Source,
    /// Transforms upstream signals.
    Processor,
    /// Produces signal gated by the computer keyboard.
    Input,
    /// Terminates the graph. Evaluation starts here.
    Sink,
}

/// Node kind tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// Constant value source.
    Constant,
    /// Periodic oscillator.
    Oscillator,
    /// Looping noise buffer.
    Noise,
    /// Constant frequency of a musical note.
    NoteFrequency,
    /// Gain stage.
    Gain,
    /// Biquad filter.
    BiquadFilter,
    /// Delay line.
    Delay,
    /// Hard clipper.
    Clip,
    /// Dynamics compressor.
    DynamicsCompressor,
    /// Frequency multiplier by octaves and half steps.
    Transpose,
    /// Keyboard-played oscillator bank.
    KeyboardNote,
    /// Keyboard-gated envelope on an arbitrary signal.
    KeyboardAdsr,
    /// Speaker output.
    AudioOutput,
    /// Speaker output with level control and scopes.
    UniversalOutput,
    /// Oscilloscope.
    TimeVisualizer,
    /// Spectrum view.
    FrequencyVisualizer,
    /// Logs its inputs.
    ConsoleDebugger,
}

impl NodeKind {
    /// Every kind, in palette order.
    pub const ALL: [NodeKind; 17] = [
        Self::Constant,
        Self::Oscillator,
        Self::Noise,
        Self::NoteFrequency,
        Self::Gain,
        Self::BiquadFilter,
        Self::Delay,
        Self::Clip,
        Self::DynamicsCompressor,
        Self::Transpose,
        Self::KeyboardNote,
        Self::KeyboardAdsr,
        Self::AudioOutput,
        Self::UniversalOutput,
        Self::TimeVisualizer,
        Self::FrequencyVisualizer,
        Self::ConsoleDebugger,
    ];

    /// Persisted kind tag (the document's `name` field).
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Constant => "Constant",
            Self::Oscillator => "Oscillator",
            Self::Noise => "Noise",
            Self::NoteFrequency => "Note Frequency",
            Self::Gain => "Gain",
            Self::BiquadFilter => "Biquad Filter",
            Self::Delay => "Delay",
            Self::Clip => "Clip Signal",
            Self::DynamicsCompressor => "Dynamics Compressor",
            Self::Transpose => "Transpose",
            Self::KeyboardNote => "Keyboard Note",
            Self::KeyboardAdsr => "Keyboard ADSR",
            Self::AudioOutput => "Audio Output",
            Self::UniversalOutput => "Universal Output",
            Self::TimeVisualizer => "Time Domain Visualizer",
            Self::FrequencyVisualizer => "Frequency Domain Visualizer",
            Self::ConsoleDebugger => "Console Debugger",
        }
    }

    /// Parses a persisted kind tag.
    pub fn from_tag(tag: &str) -> Result<Self, UnsupportedKindError> {
        Self::ALL
            .into_iter()
            .find(|k| k.tag() == tag)
            .ok_or_else(|| UnsupportedKindError {
                kind: tag.to_string(),
            })
    }

    /// Role of the kind.
    pub const fn role(self) -> KindRole {
        match self {
            Self::Constant | Self::Oscillator | Self::Noise | Self::NoteFrequency => {
                KindRole::Source
            }
            Self::Gain
            | Self::BiquadFilter
            | Self::Delay
            | Self::Clip
            | Self::DynamicsCompressor
            | Self::Transpose => KindRole::Processor,
            Self::KeyboardNote | Self::KeyboardAdsr => KindRole::Input,
            Self::AudioOutput
            | Self::UniversalOutput
            | Self::TimeVisualizer
            | Self::FrequencyVisualizer
            | Self::ConsoleDebugger => KindRole::Sink,
        }
    }

    /// True for kinds evaluation starts from.
    pub const fn is_sink(self) -> bool {
        matches!(self.role(), KindRole::Sink)
    }

    /// True for sinks that only observe their inputs and never reach the speakers.
    pub const fn is_monitor(self) -> bool {
        matches!(
            self,
            Self::TimeVisualizer | Self::FrequencyVisualizer | Self::ConsoleDebugger
        )
    }

    /// Static sockets and controls.
    pub fn spec(self) -> &'static KindSpec {
        match self {
            Self::Constant => &sources::CONSTANT,
            Self::Oscillator => &sources::OSCILLATOR,
            Self::Noise => &sources::NOISE,
            Self::NoteFrequency => &sources::NOTE_FREQUENCY,
            Self::Gain => &processors::GAIN,
            Self::BiquadFilter => &processors::BIQUAD_FILTER,
            Self::Delay => &processors::DELAY,
            Self::Clip => &processors::CLIP,
            Self::DynamicsCompressor => &processors::DYNAMICS_COMPRESSOR,
            Self::Transpose => &processors::TRANSPOSE,
            Self::KeyboardNote => &keyboard::KEYBOARD_NOTE,
            Self::KeyboardAdsr => &keyboard::KEYBOARD_ADSR,
            Self::AudioOutput => &sinks::AUDIO_OUTPUT,
            Self::UniversalOutput => &sinks::UNIVERSAL_OUTPUT,
            Self::TimeVisualizer => &sinks::TIME_VISUALIZER,
            Self::FrequencyVisualizer => &sinks::FREQUENCY_VISUALIZER,
            Self::ConsoleDebugger => &sinks::CONSOLE_DEBUGGER,
        }
    }

    /// Input sockets.
    pub fn inputs(self) -> &'static [SocketSpec] {
        self.spec().inputs
    }

    /// Output sockets.
    pub fn outputs(self) -> &'static [SocketSpec] {
        self.spec().outputs
    }

    /// Control declarations.
    pub fn controls(self) -> &'static [ControlSpec] {
        self.spec().controls
    }

    /// Looks up a control declaration.
    pub fn control(self, key: &str) -> Option<&'static ControlSpec> {
        self.controls().iter().find(|c| c.key == key)
    }

    /// Input socket whose inline fallback is stored in control `key`.
    pub fn socket_for_control(self, key: &str) -> Option<&'static SocketSpec> {
        self.inputs()
            .iter()
            .find(|s| s.inline_control == Some(key))
    }

    /// Builds the node's primitives from already-resolved inputs.
    pub(crate) fn build(
        self,
        node: &Node,
        inputs: &ResolvedInputs,
        ctx: &mut BuildContext<'_>,
    ) -> Result<BuiltNode, BuildError> {
        let controls = node.controls();
        match self {
            Self::Constant => sources::build_constant(controls, ctx),
            Self::Oscillator => sources::build_oscillator(controls, inputs, ctx),
            Self::Noise => sources::build_noise(controls, ctx),
            Self::NoteFrequency => sources::build_note_frequency(controls, ctx),
            Self::Gain => processors::build_gain(controls, inputs, ctx),
            Self::BiquadFilter => processors::build_biquad(controls, inputs, ctx),
            Self::Delay => processors::build_delay(controls, inputs, ctx),
            Self::Clip => processors::build_clip(controls, inputs, ctx),
            Self::DynamicsCompressor => processors::build_compressor(controls, inputs, ctx),
            Self::Transpose => processors::build_transpose(controls, inputs, ctx),
            Self::KeyboardNote => keyboard::build_keyboard_note(controls, inputs, ctx),
            Self::KeyboardAdsr => keyboard::build_keyboard_adsr(controls, inputs, ctx),
            Self::AudioOutput => sinks::build_audio_output(inputs, ctx),
            Self::UniversalOutput => sinks::build_universal_output(controls, inputs, ctx),
            Self::TimeVisualizer | Self::ConsoleDebugger | Self::FrequencyVisualizer => {
                sinks::build_monitor(node, inputs, ctx)
            }
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
