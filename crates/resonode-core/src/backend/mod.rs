//! Host audio backend contract.
//!
//! The engine never processes samples itself. It assembles and parameterizes
//! primitives supplied by an [`AudioBackend`]: oscillators, buffered sources,
//! gains, biquads, delay lines, wave-shapers, compressors, and analysers. The
//! contract mirrors the Web Audio node model closely because that is the
//! backend the generated programs target.
//!
//! # Architecture
//!
//! ```text
//!   PrimitiveSpec ──create()──► PrimitiveId ──connect()──► Destination
//!                                    │                     (Input | Param)
//!                                    └──schedule()──► ParamEvent timeline
//! ```
//!
//! [`RecordingBackend`] is a headless implementation that records everything
//! on a manually advanced clock. It backs the test suites and the CLI
//! `simulate` command.

mod automation;
mod recording;

pub use automation::{Automation, AutomationEvent};
pub use recording::{RecordedPrimitive, RecordingBackend};

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::error::BackendUnavailableError;

/// Detune bound in cents, about 1200 · log2(f32::MAX).
const DETUNE_LIMIT: f64 = 153_600.0;

/// Opaque handle to a primitive owned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(u32);

impl PrimitiveId {
    /// Wraps a backend-assigned raw handle.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw handle.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

// --- Enumerated primitive settings ---

/// Periodic oscillator waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Waveform {
    /// Pure sine.
    #[default]
    Sine,
    /// Square wave.
    Square,
    /// Rising sawtooth.
    Sawtooth,
    /// Triangle wave.
    Triangle,
}

impl Waveform {
    /// All waveforms in menu order.
    pub const ALL: [Waveform; 4] = [Self::Sine, Self::Square, Self::Sawtooth, Self::Triangle];

    /// Persisted name, identical to the Web Audio `OscillatorType`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sine => "sine",
            Self::Square => "square",
            Self::Sawtooth => "sawtooth",
            Self::Triangle => "triangle",
        }
    }

    /// Parses a persisted name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.as_str() == name)
    }
}

/// Biquad filter response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterType {
    /// Second-order lowpass.
    #[default]
    Lowpass,
    /// Second-order highpass.
    Highpass,
    /// Constant-skirt bandpass.
    Bandpass,
    /// Low shelf.
    Lowshelf,
    /// High shelf.
    Highshelf,
    /// Peaking bell.
    Peaking,
    /// Band reject.
    Notch,
    /// Phase-only allpass.
    Allpass,
}

impl FilterType {
    /// All responses in menu order.
    pub const ALL: [FilterType; 8] = [
        Self::Lowpass,
        Self::Highpass,
        Self::Bandpass,
        Self::Lowshelf,
        Self::Highshelf,
        Self::Peaking,
        Self::Notch,
        Self::Allpass,
    ];

    /// Persisted name, identical to the Web Audio `BiquadFilterType`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lowpass => "lowpass",
            Self::Highpass => "highpass",
            Self::Bandpass => "bandpass",
            Self::Lowshelf => "lowshelf",
            Self::Highshelf => "highshelf",
            Self::Peaking => "peaking",
            Self::Notch => "notch",
            Self::Allpass => "allpass",
        }
    }

    /// Parses a persisted name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

/// Which view an analyser primitive feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnalyserMode {
    /// Oscilloscope (time-domain samples).
    Time,
    /// Spectrum (frequency-domain magnitudes).
    Frequency,
}

// --- Primitive description ---

/// Everything a backend needs to instantiate one primitive.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveSpec {
    /// Periodic oscillator. Continuous source.
    Oscillator {
        /// Waveform.
        waveform: Waveform,
        /// Initial frequency in Hz.
        frequency: f64,
    },
    /// Plays a sample buffer. Continuous source.
    BufferSource {
        /// Mono samples at the backend sample rate.
        samples: Arc<[f32]>,
        /// Loop the buffer forever.
        looping: bool,
    },
    /// Emits a constant value. Continuous source.
    ConstantSource {
        /// Initial offset.
        offset: f64,
    },
    /// Multiplies its input by a gain parameter.
    Gain {
        /// Initial gain.
        gain: f64,
    },
    /// Second-order IIR filter.
    BiquadFilter {
        /// Filter response.
        filter_type: FilterType,
    },
    /// Delay line.
    Delay {
        /// Longest delay the line can hold, in seconds.
        max_delay: f64,
    },
    /// Memoryless transfer curve.
    WaveShaper {
        /// Curve sampled evenly over the input range [-1, 1].
        curve: Vec<f32>,
    },
    /// Dynamics compressor with backend default settings.
    DynamicsCompressor,
    /// Signal tap for visualization.
    Analyser {
        /// View the analyser feeds.
        mode: AnalyserMode,
    },
}

impl PrimitiveSpec {
    /// Returns the primitive class.
    pub fn class(&self) -> PrimitiveClass {
        match self {
            Self::Oscillator { .. } => PrimitiveClass::Oscillator,
            Self::BufferSource { .. } => PrimitiveClass::BufferSource,
            Self::ConstantSource { .. } => PrimitiveClass::ConstantSource,
            Self::Gain { .. } => PrimitiveClass::Gain,
            Self::BiquadFilter { .. } => PrimitiveClass::BiquadFilter,
            Self::Delay { .. } => PrimitiveClass::Delay,
            Self::WaveShaper { .. } => PrimitiveClass::WaveShaper,
            Self::DynamicsCompressor => PrimitiveClass::DynamicsCompressor,
            Self::Analyser { .. } => PrimitiveClass::Analyser,
        }
    }
}

/// Primitive class, used for counting and failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveClass {
    /// [`PrimitiveSpec::Oscillator`]
    Oscillator,
    /// [`PrimitiveSpec::BufferSource`]
    BufferSource,
    /// [`PrimitiveSpec::ConstantSource`]
    ConstantSource,
    /// [`PrimitiveSpec::Gain`]
    Gain,
    /// [`PrimitiveSpec::BiquadFilter`]
    BiquadFilter,
    /// [`PrimitiveSpec::Delay`]
    Delay,
    /// [`PrimitiveSpec::WaveShaper`]
    WaveShaper,
    /// [`PrimitiveSpec::DynamicsCompressor`]
    DynamicsCompressor,
    /// [`PrimitiveSpec::Analyser`]
    Analyser,
}

impl PrimitiveClass {
    /// Human-readable class name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Oscillator => "oscillator",
            Self::BufferSource => "buffer source",
            Self::ConstantSource => "constant source",
            Self::Gain => "gain",
            Self::BiquadFilter => "biquad filter",
            Self::Delay => "delay",
            Self::WaveShaper => "wave-shaper",
            Self::DynamicsCompressor => "dynamics compressor",
            Self::Analyser => "analyser",
        }
    }

    /// True for primitives that must be started and stopped explicitly.
    pub const fn is_continuous(self) -> bool {
        matches!(
            self,
            Self::Oscillator | Self::BufferSource | Self::ConstantSource
        )
    }

    /// Parameters this class exposes, with their backend defaults.
    pub const fn params(self) -> &'static [(Param, f64)] {
        match self {
            Self::Oscillator => &[(Param::Frequency, 440.0), (Param::Detune, 0.0)],
            Self::BufferSource => &[(Param::Detune, 0.0)],
            Self::ConstantSource => &[(Param::Offset, 1.0)],
            Self::Gain => &[(Param::Gain, 1.0)],
            Self::BiquadFilter => &[
                (Param::Frequency, 350.0),
                (Param::Q, 1.0),
                (Param::Gain, 0.0),
                (Param::Detune, 0.0),
            ],
            Self::Delay => &[(Param::DelayTime, 0.0)],
            Self::DynamicsCompressor => &[
                (Param::Threshold, -24.0),
                (Param::Knee, 30.0),
                (Param::Ratio, 12.0),
                (Param::Attack, 0.003),
                (Param::Release, 0.25),
            ],
            Self::WaveShaper | Self::Analyser => &[],
        }
    }
}

impl fmt::Display for PrimitiveClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Automatable parameter of a primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Param {
    /// Oscillator or filter frequency (Hz).
    Frequency,
    /// Pitch offset in cents.
    Detune,
    /// Linear gain, or filter gain in dB.
    Gain,
    /// Filter quality factor.
    Q,
    /// Delay time in seconds.
    DelayTime,
    /// Constant source output.
    Offset,
    /// Compressor threshold (dB).
    Threshold,
    /// Compressor knee (dB).
    Knee,
    /// Compressor ratio.
    Ratio,
    /// Compressor attack (s).
    Attack,
    /// Compressor release (s).
    Release,
}

impl Param {
    /// Web Audio attribute name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Frequency => "frequency",
            Self::Detune => "detune",
            Self::Gain => "gain",
            Self::Q => "Q",
            Self::DelayTime => "delayTime",
            Self::Offset => "offset",
            Self::Threshold => "threshold",
            Self::Knee => "knee",
            Self::Ratio => "ratio",
            Self::Attack => "attack",
            Self::Release => "release",
        }
    }

    /// Nominal range the parameter accepts at `sample_rate`.
    ///
    /// Frequencies stop at Nyquist. Delay time is further bounded by the
    /// line's max delay when it is built.
    pub fn range(self, sample_rate: f64) -> RangeInclusive<f64> {
        let largest = f64::from(f32::MAX);
        match self {
            Self::Frequency => 0.0..=sample_rate / 2.0,
            Self::Detune => -DETUNE_LIMIT..=DETUNE_LIMIT,
            Self::Q => 0.0001..=1000.0,
            Self::DelayTime => 0.0..=largest,
            Self::Attack | Self::Release => 0.0..=1.0,
            Self::Threshold => -100.0..=0.0,
            Self::Knee => 0.0..=40.0,
            Self::Ratio => 1.0..=20.0,
            Self::Gain | Self::Offset => -largest..=largest,
        }
    }
}

/// A specific parameter on a specific primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamRef {
    /// Owning primitive.
    pub primitive: PrimitiveId,
    /// Parameter on that primitive.
    pub param: Param,
}

impl ParamRef {
    /// Creates a parameter reference.
    pub const fn new(primitive: PrimitiveId, param: Param) -> Self {
        Self { primitive, param }
    }
}

impl fmt::Display for ParamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.primitive, self.param.name())
    }
}

/// Where a primitive's output is patched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Audio input of another primitive. Concurrent inputs sum.
    Input(PrimitiveId),
    /// Audio-rate modulation of a parameter, summed onto its value.
    Param(ParamRef),
}

/// One entry on a parameter's automation timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamEvent {
    /// Jump to `value` at `time`.
    SetValueAtTime {
        /// Target value.
        value: f64,
        /// Absolute backend time in seconds.
        time: f64,
    },
    /// Linear ramp from the previous event to `value`, arriving at `end_time`.
    LinearRampToValueAtTime {
        /// Target value.
        value: f64,
        /// Absolute backend time in seconds.
        end_time: f64,
    },
    /// Exponential ramp from the previous event to `value`, arriving at `end_time`.
    ///
    /// Neither end of the ramp may be zero.
    ExponentialRampToValueAtTime {
        /// Target value.
        value: f64,
        /// Absolute backend time in seconds.
        end_time: f64,
    },
    /// Drop every event at or after `time`, holding the value reached there.
    CancelAndHoldAtTime {
        /// Absolute backend time in seconds.
        time: f64,
    },
}

/// A real-time audio backend that the engine assembles primitives on.
///
/// Implementations own every primitive they hand out. The engine only keeps
/// [`PrimitiveId`] handles and releases them with [`disconnect`](Self::disconnect)
/// when a live graph is discarded.
pub trait AudioBackend {
    /// Current backend clock in seconds.
    fn current_time(&self) -> f64;

    /// Backend sample rate in Hz.
    fn sample_rate(&self) -> f64;

    /// The final hardware destination.
    fn destination(&self) -> PrimitiveId;

    /// Instantiates a primitive.
    fn create(&mut self, spec: PrimitiveSpec) -> Result<PrimitiveId, BackendUnavailableError>;

    /// Patches `from`'s output into `to`.
    fn connect(&mut self, from: PrimitiveId, to: Destination);

    /// Removes every outgoing connection of `id` and releases it.
    fn disconnect(&mut self, id: PrimitiveId);

    /// Appends an automation event to a parameter timeline.
    fn schedule(&mut self, target: ParamRef, event: ParamEvent);

    /// Intrinsic value of a parameter at the current time, ignoring patched inputs.
    fn param_value(&self, target: ParamRef) -> f64;

    /// Starts a continuous source at `at`.
    fn start(&mut self, id: PrimitiveId, at: f64);

    /// Stops a continuous source at `at`.
    fn stop(&mut self, id: PrimitiveId, at: f64);

    /// Suspends or resumes rendering.
    fn set_running(&mut self, running: bool);

    /// True while the backend renders audio.
    fn is_running(&self) -> bool;

    /// Sets a parameter immediately.
    fn set_value(&mut self, target: ParamRef, value: f64) {
        let time = self.current_time();
        self.schedule(target, ParamEvent::SetValueAtTime { value, time });
    }

    /// Holds the current value, then ramps linearly to `value` over `duration` seconds.
    fn ramp_linear(&mut self, target: ParamRef, value: f64, duration: f64) {
        let now = self.current_time();
        let held = self.param_value(target);
        self.schedule(target, ParamEvent::SetValueAtTime { value: held, time: now });
        self.schedule(
            target,
            ParamEvent::LinearRampToValueAtTime {
                value,
                end_time: now + duration,
            },
        );
    }
}
