//! Build-time plumbing shared by every kind.

use std::ops::RangeInclusive;

use crate::backend::{
    AnalyserMode, AudioBackend, Destination, Param, ParamRef, PrimitiveClass, PrimitiveId,
    PrimitiveSpec,
};
use crate::error::BackendUnavailableError;
use crate::graph::{Combine, SocketSpec};
use crate::noise::NoiseConfig;
use crate::voice::VoiceRegistry;

/// Upstream output handles per input socket, in connection order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedInputs {
    sockets: Vec<(&'static str, Vec<PrimitiveId>)>,
}

impl ResolvedInputs {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an upstream handle to `socket`.
    pub fn push(&mut self, socket: &'static str, upstream: PrimitiveId) {
        match self.sockets.iter_mut().find(|(name, _)| *name == socket) {
            Some((_, handles)) => handles.push(upstream),
            None => self.sockets.push((socket, vec![upstream])),
        }
    }

    /// Upstream handles feeding `socket`.
    pub fn get(&self, socket: &str) -> &[PrimitiveId] {
        self.sockets
            .iter()
            .find(|(name, _)| *name == socket)
            .map(|(_, handles)| handles.as_slice())
            .unwrap_or(&[])
    }

    /// True if `socket` has at least one connection.
    pub fn is_connected(&self, socket: &str) -> bool {
        !self.get(socket).is_empty()
    }
}

/// A control whose value drives a built parameter directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LiveBinding {
    /// Control key.
    pub control: &'static str,
    /// Parameter the control value lands on.
    pub target: ParamRef,
    /// Lowest value the built primitive accepts.
    pub min: f64,
    /// Highest value the built primitive accepts.
    pub max: f64,
}

impl LiveBinding {
    /// Bounds `value` to what the built primitive accepts.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Result of building one node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuiltNode {
    outputs: Vec<(&'static str, PrimitiveId)>,
    bindings: Vec<LiveBinding>,
    analysers: Vec<(AnalyserMode, PrimitiveId)>,
}

impl BuiltNode {
    /// Designates the handle behind an output socket.
    pub fn with_output(mut self, socket: &'static str, handle: PrimitiveId) -> Self {
        self.outputs.push((socket, handle));
        self
    }

    /// Records a live-adjustable parameter and the range its primitive accepts.
    pub fn bind(&mut self, control: &'static str, target: ParamRef, range: RangeInclusive<f64>) {
        self.bindings.push(LiveBinding {
            control,
            target,
            min: *range.start(),
            max: *range.end(),
        });
    }

    /// Records an analyser a UI can read.
    pub fn tap(&mut self, mode: AnalyserMode, analyser: PrimitiveId) {
        self.analysers.push((mode, analyser));
    }

    /// Handle behind an output socket.
    pub fn output(&self, socket: &str) -> Option<PrimitiveId> {
        self.outputs
            .iter()
            .find(|(name, _)| *name == socket)
            .map(|(_, id)| *id)
    }

    /// Live bindings.
    pub fn bindings(&self) -> &[LiveBinding] {
        &self.bindings
    }

    /// Binding for `control`, if the control currently drives a parameter.
    pub fn binding(&self, control: &str) -> Option<&LiveBinding> {
        self.bindings.iter().find(|b| b.control == control)
    }

    /// Analysers built for this node.
    pub fn analysers(&self) -> &[(AnalyserMode, PrimitiveId)] {
        &self.analysers
    }
}

/// Mutable state threaded through every build function of one pass.
///
/// Tracks every primitive created so a failed pass can release them all.
pub struct BuildContext<'a> {
    backend: &'a mut dyn AudioBackend,
    master: PrimitiveId,
    voices: &'a mut VoiceRegistry,
    noise: NoiseConfig,
    created: Vec<(PrimitiveId, PrimitiveClass)>,
}

impl<'a> BuildContext<'a> {
    /// Creates a context building onto `backend`, with sinks feeding `master`.
    pub fn new(
        backend: &'a mut dyn AudioBackend,
        master: PrimitiveId,
        voices: &'a mut VoiceRegistry,
        noise: NoiseConfig,
    ) -> Self {
        Self {
            backend,
            master,
            voices,
            noise,
            created: Vec::new(),
        }
    }

    /// Instantiates a primitive and records it.
    pub fn create(&mut self, spec: PrimitiveSpec) -> Result<PrimitiveId, BackendUnavailableError> {
        let class = spec.class();
        let id = self.backend.create(spec)?;
        self.created.push((id, class));
        Ok(id)
    }

    /// Patches `from` into `to`.
    pub fn connect(&mut self, from: PrimitiveId, to: Destination) {
        self.backend.connect(from, to);
    }

    /// Sets a parameter immediately.
    pub fn set_value(&mut self, target: ParamRef, value: f64) {
        self.backend.set_value(target, value);
    }

    /// Patches every upstream handle into a primitive's audio input.
    pub fn patch_signal(&mut self, upstream: &[PrimitiveId], into: PrimitiveId) {
        for &source in upstream {
            self.connect(source, Destination::Input(into));
        }
    }

    /// Applies a socket's combination policy to a parameter.
    ///
    /// Returns true when the inline value is in effect, meaning the control
    /// can be adjusted live.
    pub fn drive_param(
        &mut self,
        socket: &SocketSpec,
        target: ParamRef,
        inline: f64,
        upstream: &[PrimitiveId],
    ) -> bool {
        if upstream.is_empty() {
            if socket.inline_control.is_some() {
                self.set_value(target, inline);
                return true;
            }
            return false;
        }
        match socket.combine {
            Combine::Override | Combine::Additive => {
                self.set_value(target, 0.0);
                for &source in upstream {
                    self.connect(source, Destination::Param(target));
                }
            }
            Combine::Modulate => {
                for &source in upstream {
                    self.connect(source, Destination::Param(target));
                }
            }
            Combine::Signal => self.patch_signal(upstream, target.primitive),
        }
        false
    }

    /// Gain every audible sink feeds.
    pub fn master(&self) -> PrimitiveId {
        self.master
    }

    /// Backend sample rate.
    pub fn sample_rate(&self) -> f64 {
        self.backend.sample_rate()
    }

    /// Range a parameter accepts on this backend.
    pub fn param_range(&self, param: Param) -> RangeInclusive<f64> {
        param.range(self.sample_rate())
    }

    /// Noise buffer settings.
    pub fn noise(&self) -> NoiseConfig {
        self.noise
    }

    /// Voice registry being populated by this pass.
    pub fn voices(&mut self) -> &mut VoiceRegistry {
        &mut *self.voices
    }

    /// Every primitive created so far.
    pub fn created(&self) -> &[(PrimitiveId, PrimitiveClass)] {
        &self.created
    }

    /// Consumes the context, returning the created primitives.
    pub fn into_created(self) -> Vec<(PrimitiveId, PrimitiveClass)> {
        self.created
    }

    /// Disconnects everything created so far.
    pub fn release_all(&mut self) {
        for &(id, _) in &self.created {
            self.backend.disconnect(id);
        }
        self.created.clear();
    }
}
