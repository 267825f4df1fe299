//! Sink kinds. Evaluation starts from these.
//!
//! Audible sinks patch into the master input; monitors tap an analyser and
//! never reach the speakers.

use super::{BuildContext, BuiltNode, ControlSpec, Controls, KindSpec, ResolvedInputs};
use crate::backend::{AnalyserMode, Destination, Param, ParamRef, PrimitiveSpec};
use crate::error::BuildError;
use crate::graph::{Node, SocketSpec};
use crate::kind::NodeKind;

const VISUALS: &[&str] = &["linear", "log"];

const SIGNAL_IN: SocketSpec = SocketSpec::signal("signal", "Signal");

/// Speaker output.
pub static AUDIO_OUTPUT: KindSpec = KindSpec {
    inputs: &[SIGNAL_IN],
    outputs: &[],
    controls: &[],
};

/// Speaker output with a level control and both scopes.
pub static UNIVERSAL_OUTPUT: KindSpec = KindSpec {
    inputs: &[SIGNAL_IN],
    outputs: &[],
    controls: &[
        ControlSpec::ranged("gain", "Volume", 1.0, 0.0, 1.0).live(),
        ControlSpec::choice("visual", "Scale", "linear", VISUALS),
        ControlSpec::number("rangeMin", "Range Min (dB)", -100.0),
        ControlSpec::number("rangeMax", "Range Max (dB)", -10.0),
    ],
};

/// Oscilloscope.
pub static TIME_VISUALIZER: KindSpec = KindSpec {
    inputs: &[SIGNAL_IN],
    outputs: &[],
    controls: &[],
};

/// Spectrum view.
pub static FREQUENCY_VISUALIZER: KindSpec = KindSpec {
    inputs: &[SIGNAL_IN],
    outputs: &[],
    controls: &[ControlSpec::choice("visual", "Scale", "linear", VISUALS)],
};

/// Logs what feeds it.
pub static CONSOLE_DEBUGGER: KindSpec = KindSpec {
    inputs: &[SIGNAL_IN],
    outputs: &[],
    controls: &[],
};

pub(super) fn build_audio_output(
    inputs: &ResolvedInputs,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let master = ctx.master();
    ctx.patch_signal(inputs.get(SIGNAL_IN.name), master);
    Ok(BuiltNode::default())
}

pub(super) fn build_universal_output(
    controls: &Controls,
    inputs: &ResolvedInputs,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let volume = ctx.create(PrimitiveSpec::Gain {
        gain: controls.number("gain"),
    })?;
    ctx.patch_signal(inputs.get(SIGNAL_IN.name), volume);
    let master = ctx.master();
    ctx.connect(volume, Destination::Input(master));

    let mut built = BuiltNode::default();
    built.bind("gain", ParamRef::new(volume, Param::Gain), 0.0..=1.0);
    for mode in [AnalyserMode::Time, AnalyserMode::Frequency] {
        let analyser = ctx.create(PrimitiveSpec::Analyser { mode })?;
        ctx.connect(volume, Destination::Input(analyser));
        built.tap(mode, analyser);
    }
    Ok(built)
}

pub(super) fn build_monitor(
    node: &Node,
    inputs: &ResolvedInputs,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let upstream = inputs.get(SIGNAL_IN.name);
    let mode = match node.kind() {
        NodeKind::FrequencyVisualizer => AnalyserMode::Frequency,
        _ => AnalyserMode::Time,
    };
    if node.kind() == NodeKind::ConsoleDebugger {
        tracing::info!(
            "console debugger {}: {} input(s) {upstream:?}",
            node.id(),
            upstream.len()
        );
    }

    let analyser = ctx.create(PrimitiveSpec::Analyser { mode })?;
    ctx.patch_signal(upstream, analyser);
    let mut built = BuiltNode::default();
    built.tap(mode, analyser);
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AudioBackend, PrimitiveClass, RecordingBackend};
    use crate::graph::NodeId;
    use crate::noise::NoiseConfig;
    use crate::voice::VoiceRegistry;

    #[test]
    fn test_audio_output_patches_into_master() {
        let mut backend = RecordingBackend::new(48000.0);
        let mut voices = VoiceRegistry::new();
        let master = backend.create(PrimitiveSpec::Gain { gain: 1.0 }).unwrap();
        let source = backend
            .create(PrimitiveSpec::ConstantSource { offset: 0.5 })
            .unwrap();
        let mut inputs = ResolvedInputs::new();
        inputs.push("signal", source);

        let mut ctx = BuildContext::new(&mut backend, master, &mut voices, NoiseConfig::default());
        build_audio_output(&inputs, &mut ctx).unwrap();
        assert!(ctx.created().is_empty());
        drop(ctx);

        assert_eq!(backend.inputs_of(Destination::Input(master)), vec![source]);
    }

    #[test]
    fn test_universal_output_taps_both_views() {
        let mut backend = RecordingBackend::new(48000.0);
        let mut voices = VoiceRegistry::new();
        let master = backend.create(PrimitiveSpec::Gain { gain: 1.0 }).unwrap();
        let mut controls = Controls::defaults(NodeKind::UniversalOutput);
        controls.set("gain", 0.5.into()).unwrap();

        let mut ctx = BuildContext::new(&mut backend, master, &mut voices, NoiseConfig::default());
        let built = build_universal_output(&controls, &ResolvedInputs::new(), &mut ctx).unwrap();
        drop(ctx);

        assert_eq!(backend.live_count(PrimitiveClass::Analyser), 2);
        let modes: Vec<_> = built.analysers().iter().map(|(m, _)| *m).collect();
        assert_eq!(modes, vec![AnalyserMode::Time, AnalyserMode::Frequency]);
        let volume = built.binding("gain").unwrap().target;
        assert_eq!(backend.value_at(volume, 0.0), 0.5);
        assert_eq!(
            backend.inputs_of(Destination::Input(master)),
            vec![volume.primitive]
        );
    }

    #[test]
    fn test_monitor_never_reaches_master() {
        let mut backend = RecordingBackend::new(48000.0);
        let mut voices = VoiceRegistry::new();
        let master = backend.create(PrimitiveSpec::Gain { gain: 1.0 }).unwrap();
        let node = Node::new(NodeId::new("viz"), NodeKind::FrequencyVisualizer);

        let mut ctx = BuildContext::new(&mut backend, master, &mut voices, NoiseConfig::default());
        let built = build_monitor(&node, &ResolvedInputs::new(), &mut ctx).unwrap();
        drop(ctx);

        assert_eq!(built.analysers().len(), 1);
        assert_eq!(built.analysers()[0].0, AnalyserMode::Frequency);
        assert!(backend.inputs_of(Destination::Input(master)).is_empty());
    }
}
