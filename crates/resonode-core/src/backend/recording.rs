//! Headless backend that records every call.

use std::collections::{BTreeMap, HashSet};

use super::{
    Automation, AudioBackend, Destination, Param, ParamEvent, ParamRef, PrimitiveClass,
    PrimitiveId, PrimitiveSpec,
};
use crate::error::BackendUnavailableError;

/// Handle reserved for the hardware destination.
const DESTINATION: PrimitiveId = PrimitiveId::new(u32::MAX);

/// Everything recorded about one primitive.
#[derive(Clone, Debug)]
pub struct RecordedPrimitive {
    /// Creation spec.
    pub spec: PrimitiveSpec,
    /// Automation timeline per exposed parameter.
    pub params: BTreeMap<Param, Automation>,
    /// Outgoing connections in the order they were made.
    pub outputs: Vec<Destination>,
    /// Start time, once started.
    pub started_at: Option<f64>,
    /// Stop time, once stopped.
    pub stopped_at: Option<f64>,
    /// Set once the primitive has been disconnected and released.
    pub released: bool,
}

impl RecordedPrimitive {
    /// Primitive class.
    pub fn class(&self) -> PrimitiveClass {
        self.spec.class()
    }
}

/// An [`AudioBackend`] that renders nothing and records everything.
///
/// The clock only moves when told to, which makes ramp schedules fully
/// deterministic. Besides inspection helpers it can resolve the static output
/// of constant-valued chains (constant sources through gains and parameter
/// sums), which is enough to check how sockets combine without any DSP.
///
/// # Example
///
/// ```rust
/// use resonode_core::backend::{AudioBackend, Param, ParamRef, PrimitiveSpec, RecordingBackend};
///
/// let mut backend = RecordingBackend::new(48000.0);
/// let gain = backend.create(PrimitiveSpec::Gain { gain: 0.5 }).unwrap();
/// backend.advance_to(1.0);
/// backend.ramp_linear(ParamRef::new(gain, Param::Gain), 1.0, 0.5);
/// assert!((backend.value_at(ParamRef::new(gain, Param::Gain), 1.25) - 0.75).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct RecordingBackend {
    time: f64,
    sample_rate: f64,
    running: bool,
    primitives: Vec<RecordedPrimitive>,
    failing: HashSet<PrimitiveClass>,
}

impl RecordingBackend {
    /// Creates a backend at time zero.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            time: 0.0,
            sample_rate,
            running: true,
            primitives: Vec::new(),
            failing: HashSet::new(),
        }
    }

    /// Makes every later creation of `class` fail.
    pub fn fail_on(&mut self, class: PrimitiveClass) {
        self.failing.insert(class);
    }

    /// Lets `class` be created again.
    pub fn recover(&mut self, class: PrimitiveClass) {
        self.failing.remove(&class);
    }

    /// Moves the clock to `time`. The clock never runs backwards.
    pub fn advance_to(&mut self, time: f64) {
        self.time = self.time.max(time);
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance_by(&mut self, seconds: f64) {
        self.time += seconds.max(0.0);
    }

    /// Looks up a recorded primitive.
    pub fn primitive(&self, id: PrimitiveId) -> Option<&RecordedPrimitive> {
        self.primitives.get(id.index() as usize)
    }

    /// All primitives ever created, including released ones.
    pub fn all_primitives(&self) -> impl Iterator<Item = (PrimitiveId, &RecordedPrimitive)> {
        self.primitives
            .iter()
            .enumerate()
            .map(|(i, p)| (PrimitiveId::new(i as u32), p))
    }

    /// Primitives that have not been released.
    pub fn live_primitives(&self) -> impl Iterator<Item = (PrimitiveId, &RecordedPrimitive)> {
        self.all_primitives().filter(|(_, p)| !p.released)
    }

    /// Live primitive count per class.
    pub fn live_counts(&self) -> BTreeMap<PrimitiveClass, usize> {
        let mut counts = BTreeMap::new();
        for (_, p) in self.live_primitives() {
            *counts.entry(p.class()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of live primitives of `class`.
    pub fn live_count(&self, class: PrimitiveClass) -> usize {
        self.live_primitives().filter(|(_, p)| p.class() == class).count()
    }

    /// Live primitives patched into `to`, in connection order.
    pub fn inputs_of(&self, to: Destination) -> Vec<PrimitiveId> {
        self.live_primitives()
            .filter(|(_, p)| p.outputs.contains(&to))
            .map(|(id, _)| id)
            .collect()
    }

    /// Intrinsic parameter value at time `t`, ignoring patched inputs.
    pub fn value_at(&self, target: ParamRef, t: f64) -> f64 {
        self.primitive(target.primitive)
            .and_then(|p| p.params.get(&target.param))
            .map_or(0.0, |a| a.value_at(t))
    }

    /// Effective parameter value at time `t`: intrinsic value plus every patched input.
    ///
    /// Returns `None` when an input's output is not statically known.
    pub fn effective_value(&self, target: ParamRef, t: f64) -> Option<f64> {
        let mut sum = self.value_at(target, t);
        for input in self.inputs_of(Destination::Param(target)) {
            sum += self.resolve_output(input, t)?;
        }
        Some(sum)
    }

    /// Statically known output of a primitive at time `t`.
    ///
    /// Constant sources emit their effective offset, gains scale the sum of
    /// their inputs. Any other class yields `None`.
    pub fn resolve_output(&self, id: PrimitiveId, t: f64) -> Option<f64> {
        let primitive = self.primitive(id)?;
        match primitive.class() {
            PrimitiveClass::ConstantSource => {
                self.effective_value(ParamRef::new(id, Param::Offset), t)
            }
            PrimitiveClass::Gain => {
                let mut input = 0.0;
                for source in self.inputs_of(Destination::Input(id)) {
                    input += self.resolve_output(source, t)?;
                }
                Some(input * self.effective_value(ParamRef::new(id, Param::Gain), t)?)
            }
            _ => None,
        }
    }

    fn primitive_mut(&mut self, id: PrimitiveId) -> Option<&mut RecordedPrimitive> {
        self.primitives.get_mut(id.index() as usize)
    }
}

impl AudioBackend for RecordingBackend {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn destination(&self) -> PrimitiveId {
        DESTINATION
    }

    fn create(&mut self, spec: PrimitiveSpec) -> Result<PrimitiveId, BackendUnavailableError> {
        let class = spec.class();
        if self.failing.contains(&class) {
            return Err(BackendUnavailableError::new(class, "creation disabled"));
        }

        let mut params: BTreeMap<Param, Automation> = class
            .params()
            .iter()
            .map(|&(param, default)| (param, Automation::new(default)))
            .collect();
        let initial = match &spec {
            PrimitiveSpec::Oscillator { frequency, .. } => Some((Param::Frequency, *frequency)),
            PrimitiveSpec::ConstantSource { offset } => Some((Param::Offset, *offset)),
            PrimitiveSpec::Gain { gain } => Some((Param::Gain, *gain)),
            _ => None,
        };
        if let Some((param, value)) = initial {
            params.insert(param, Automation::new(value));
        }

        let id = PrimitiveId::new(self.primitives.len() as u32);
        self.primitives.push(RecordedPrimitive {
            spec,
            params,
            outputs: Vec::new(),
            started_at: None,
            stopped_at: None,
            released: false,
        });
        Ok(id)
    }

    fn connect(&mut self, from: PrimitiveId, to: Destination) {
        if let Some(p) = self.primitive_mut(from) {
            p.outputs.push(to);
        }
    }

    fn disconnect(&mut self, id: PrimitiveId) {
        if let Some(p) = self.primitive_mut(id) {
            p.outputs.clear();
            p.released = true;
        }
    }

    fn schedule(&mut self, target: ParamRef, event: ParamEvent) {
        let now = self.time;
        if let Some(automation) = self
            .primitive_mut(target.primitive)
            .and_then(|p| p.params.get_mut(&target.param))
        {
            automation.apply(event, now);
        }
    }

    fn param_value(&self, target: ParamRef) -> f64 {
        self.value_at(target, self.time)
    }

    fn start(&mut self, id: PrimitiveId, at: f64) {
        if let Some(p) = self.primitive_mut(id) {
            p.started_at = Some(at);
        }
    }

    fn stop(&mut self, id: PrimitiveId, at: f64) {
        if let Some(p) = self.primitive_mut(id) {
            p.stopped_at = Some(at);
        }
    }

    fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
