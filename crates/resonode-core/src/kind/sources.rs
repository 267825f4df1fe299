//! Source kinds: Constant, Oscillator, Noise, Note Frequency.
//!
//! Every source builds one continuous primitive. Sources are created
//! unstarted; the audio system starts them when the pass installs.

use super::{BuildContext, BuiltNode, ControlSpec, Controls, KindSpec, ResolvedInputs};
use crate::backend::{Param, ParamRef, PrimitiveSpec, Waveform};
use crate::error::BuildError;
use crate::graph::SocketSpec;
use crate::noise::{self, NoiseType};

/// Oscillator waveform names.
pub(crate) const WAVEFORMS: &[&str] = &["sine", "square", "sawtooth", "triangle"];

const NOISE_TYPES: &[&str] = &[
    "White Noise",
    "Brown Noise",
    "Pink Noise",
    "Blue Noise",
    "Violet Noise",
    "Grey Noise",
    "Velvet Noise",
];

const BASE_FREQUENCY: SocketSpec = SocketSpec::base("baseFrequency", "Base Frequency", "baseFreq");
const ADDITIONAL_FREQUENCY: SocketSpec =
    SocketSpec::additional("frequency", "Additional Frequency");

/// Constant value source.
pub static CONSTANT: KindSpec = KindSpec {
    inputs: &[],
    outputs: &[SocketSpec::output("value", "Value")],
    controls: &[ControlSpec::number("value", "Value", 1.0).live()],
};

/// Periodic oscillator.
pub static OSCILLATOR: KindSpec = KindSpec {
    inputs: &[BASE_FREQUENCY, ADDITIONAL_FREQUENCY],
    outputs: &[SocketSpec::output("signal", "Signal")],
    controls: &[
        ControlSpec::number("baseFreq", "Base Frequency", 440.0).live(),
        ControlSpec::choice("waveform", "Waveform", "sine", WAVEFORMS),
    ],
};

/// Looping noise buffer.
pub static NOISE: KindSpec = KindSpec {
    inputs: &[],
    outputs: &[SocketSpec::output("signal", "Signal")],
    controls: &[ControlSpec::choice(
        "noiseType",
        "Noise Type",
        "White Noise",
        NOISE_TYPES,
    )],
};

/// Frequency of a note in equal temperament, as a constant.
pub static NOTE_FREQUENCY: KindSpec = KindSpec {
    inputs: &[],
    outputs: &[SocketSpec::output("value", "Frequency")],
    controls: &[
        ControlSpec::ranged("note", "Note", 9.0, 0.0, 11.0),
        ControlSpec::number("octave", "Octave", 4.0),
    ],
};

/// Frequency in Hz of `note` (0 = C, 9 = A) in `octave`, with A4 at 440 Hz.
pub fn note_to_frequency(note: f64, octave: f64) -> f64 {
    440.0 * 2f64.powf((note - 9.0) / 12.0 + octave - 4.0)
}

pub(super) fn build_constant(
    controls: &Controls,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let source = ctx.create(PrimitiveSpec::ConstantSource {
        offset: controls.number("value"),
    })?;
    let mut built = BuiltNode::default().with_output("value", source);
    let range = ctx.param_range(Param::Offset);
    built.bind("value", ParamRef::new(source, Param::Offset), range);
    Ok(built)
}

pub(super) fn build_oscillator(
    controls: &Controls,
    inputs: &ResolvedInputs,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let base = controls.number("baseFreq");
    let waveform = Waveform::parse(controls.choice("waveform")).unwrap_or_default();
    let osc = ctx.create(PrimitiveSpec::Oscillator {
        waveform,
        frequency: base,
    })?;
    let frequency = ParamRef::new(osc, Param::Frequency);

    let mut built = BuiltNode::default().with_output("signal", osc);
    if ctx.drive_param(&BASE_FREQUENCY, frequency, base, inputs.get(BASE_FREQUENCY.name)) {
        built.bind("baseFreq", frequency, ctx.param_range(Param::Frequency));
    }
    ctx.drive_param(
        &ADDITIONAL_FREQUENCY,
        frequency,
        0.0,
        inputs.get(ADDITIONAL_FREQUENCY.name),
    );
    Ok(built)
}

pub(super) fn build_noise(
    controls: &Controls,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let noise_type = NoiseType::parse(controls.choice("noiseType")).unwrap_or_default();
    let config = ctx.noise();
    let len = (config.buffer_seconds.max(0.0) * ctx.sample_rate()) as usize;
    tracing::debug!("noise: {} x {len} samples", noise_type.as_str());

    let source = ctx.create(PrimitiveSpec::BufferSource {
        samples: noise::generate(noise_type, len, config.seed),
        looping: true,
    })?;
    Ok(BuiltNode::default().with_output("signal", source))
}

pub(super) fn build_note_frequency(
    controls: &Controls,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let offset = note_to_frequency(controls.number("note"), controls.number("octave"));
    let source = ctx.create(PrimitiveSpec::ConstantSource { offset })?;
    Ok(BuiltNode::default().with_output("value", source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AudioBackend, Destination, PrimitiveClass, RecordingBackend};
    use crate::kind::NodeKind;
    use crate::noise::NoiseConfig;
    use crate::voice::VoiceRegistry;

    #[test]
    fn test_note_to_frequency() {
        assert!((note_to_frequency(9.0, 4.0) - 440.0).abs() < 1e-9);
        assert!((note_to_frequency(9.0, 5.0) - 880.0).abs() < 1e-9);
        assert!((note_to_frequency(0.0, 4.0) - 261.6256).abs() < 1e-3);
    }

    #[test]
    fn test_oscillator_unconnected_uses_base_freq() {
        let mut backend = RecordingBackend::new(48000.0);
        let mut voices = VoiceRegistry::new();
        let master = backend
            .create(PrimitiveSpec::Gain { gain: 1.0 })
            .unwrap();
        let mut ctx = BuildContext::new(&mut backend, master, &mut voices, NoiseConfig::default());

        let mut controls = Controls::defaults(NodeKind::Oscillator);
        controls.set("baseFreq", 220.0.into()).unwrap();
        let built = build_oscillator(&controls, &ResolvedInputs::new(), &mut ctx).unwrap();
        drop(ctx);

        let osc = built.output("signal").unwrap();
        let frequency = ParamRef::new(osc, Param::Frequency);
        assert_eq!(backend.value_at(frequency, 0.0), 220.0);
        assert_eq!(built.binding("baseFreq").map(|b| b.target), Some(frequency));
    }

    #[test]
    fn test_oscillator_base_overridden_additional_kept() {
        let mut backend = RecordingBackend::new(48000.0);
        let mut voices = VoiceRegistry::new();
        let master = backend.create(PrimitiveSpec::Gain { gain: 1.0 }).unwrap();
        let base = backend
            .create(PrimitiveSpec::ConstantSource { offset: 300.0 })
            .unwrap();
        let extra = backend
            .create(PrimitiveSpec::ConstantSource { offset: 5.0 })
            .unwrap();
        let mut ctx = BuildContext::new(&mut backend, master, &mut voices, NoiseConfig::default());

        let mut inputs = ResolvedInputs::new();
        inputs.push("baseFrequency", base);
        inputs.push("frequency", extra);
        let built =
            build_oscillator(&Controls::defaults(NodeKind::Oscillator), &inputs, &mut ctx).unwrap();
        drop(ctx);

        let frequency = ParamRef::new(built.output("signal").unwrap(), Param::Frequency);
        assert_eq!(backend.effective_value(frequency, 0.0), Some(305.0));
        assert!(built.binding("baseFreq").is_none());
        assert_eq!(
            backend.inputs_of(Destination::Param(frequency)),
            vec![base, extra]
        );
    }

    #[test]
    fn test_oscillator_additional_only_adds_to_base_freq() {
        let mut backend = RecordingBackend::new(48000.0);
        let mut voices = VoiceRegistry::new();
        let master = backend.create(PrimitiveSpec::Gain { gain: 1.0 }).unwrap();
        let extra = backend
            .create(PrimitiveSpec::ConstantSource { offset: 10.0 })
            .unwrap();
        let mut ctx = BuildContext::new(&mut backend, master, &mut voices, NoiseConfig::default());

        let mut inputs = ResolvedInputs::new();
        inputs.push("frequency", extra);
        let built =
            build_oscillator(&Controls::defaults(NodeKind::Oscillator), &inputs, &mut ctx).unwrap();
        drop(ctx);

        let frequency = ParamRef::new(built.output("signal").unwrap(), Param::Frequency);
        assert_eq!(backend.effective_value(frequency, 0.0), Some(450.0));
    }

    #[test]
    fn test_noise_buffer_length_follows_config() {
        let mut backend = RecordingBackend::new(1000.0);
        let mut voices = VoiceRegistry::new();
        let master = backend.create(PrimitiveSpec::Gain { gain: 1.0 }).unwrap();
        let config = NoiseConfig {
            buffer_seconds: 2.0,
            seed: 11,
        };
        let mut ctx = BuildContext::new(&mut backend, master, &mut voices, config);
        let built = build_noise(&Controls::defaults(NodeKind::Noise), &mut ctx).unwrap();
        drop(ctx);

        let source = backend.primitive(built.output("signal").unwrap()).unwrap();
        assert_eq!(source.class(), PrimitiveClass::BufferSource);
        match &source.spec {
            PrimitiveSpec::BufferSource { samples, looping } => {
                assert_eq!(samples.len(), 2000);
                assert!(*looping);
            }
            other => panic!("unexpected spec {other:?}"),
        }
    }

    #[test]
    fn test_note_frequency_builds_constant() {
        let mut backend = RecordingBackend::new(48000.0);
        let mut voices = VoiceRegistry::new();
        let master = backend.create(PrimitiveSpec::Gain { gain: 1.0 }).unwrap();
        let mut ctx = BuildContext::new(&mut backend, master, &mut voices, NoiseConfig::default());
        let mut controls = Controls::defaults(NodeKind::NoteFrequency);
        controls.set("octave", 3.0.into()).unwrap();
        let built = build_note_frequency(&controls, &mut ctx).unwrap();
        drop(ctx);

        let value = backend.resolve_output(built.output("value").unwrap(), 0.0).unwrap();
        assert!((value - 220.0).abs() < 1e-9);
    }
}
