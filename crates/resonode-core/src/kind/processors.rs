//! Processor kinds: Gain, Biquad Filter, Delay, Clip Signal, Dynamics
//! Compressor, Transpose.

use std::ops::RangeInclusive;

use super::{BuildContext, BuiltNode, ControlSpec, Controls, KindSpec, ResolvedInputs};
use crate::backend::{Destination, FilterType, Param, ParamRef, PrimitiveSpec};
use crate::error::BuildError;
use crate::graph::SocketSpec;

const FILTER_TYPES: &[&str] = &[
    "lowpass",
    "highpass",
    "bandpass",
    "lowshelf",
    "highshelf",
    "peaking",
    "notch",
    "allpass",
];

const SIGNAL_IN: SocketSpec = SocketSpec::signal("signal", "Signal");
const SIGNAL_OUT: SocketSpec = SocketSpec::output("signal", "Signal");

const GAIN_IN: SocketSpec = SocketSpec::additive("gain", "Gain", "gain");

const FILTER_FREQUENCY: SocketSpec = SocketSpec::additive("frequency", "Frequency", "freq");
const FILTER_Q: SocketSpec = SocketSpec::additive("q", "Q", "q");
const FILTER_GAIN: SocketSpec = SocketSpec::additive("gain", "Gain", "gain");

const DELAY_TIME: SocketSpec = SocketSpec::base("delayTime", "Delay Time", "delay");

/// Smallest allowed clip amplitude.
const MIN_CLIP_AMP: f64 = 1e-6;

/// Gain stage.
pub static GAIN: KindSpec = KindSpec {
    inputs: &[SIGNAL_IN, GAIN_IN],
    outputs: &[SIGNAL_OUT],
    controls: &[ControlSpec::number("gain", "Gain", 1.0).live()],
};

/// Biquad filter.
pub static BIQUAD_FILTER: KindSpec = KindSpec {
    inputs: &[SIGNAL_IN, FILTER_FREQUENCY, FILTER_Q, FILTER_GAIN],
    outputs: &[SIGNAL_OUT],
    controls: &[
        ControlSpec::number("freq", "Frequency", 350.0).live(),
        ControlSpec::number("q", "Q", 1.0).live(),
        ControlSpec::number("gain", "Gain", 0.0).live(),
        ControlSpec::choice("filterType", "Filter Type", "lowpass", FILTER_TYPES),
    ],
};

/// Delay line.
pub static DELAY: KindSpec = KindSpec {
    inputs: &[SIGNAL_IN, DELAY_TIME],
    outputs: &[SIGNAL_OUT],
    controls: &[
        ControlSpec::ranged("delay", "Delay Time", 1.0, 0.0, f64::MAX).live(),
        ControlSpec::ranged("maxDelay", "Max Delay", 1.0, 0.0, f64::MAX),
    ],
};

/// Hard clipper.
pub static CLIP: KindSpec = KindSpec {
    inputs: &[SIGNAL_IN],
    outputs: &[SIGNAL_OUT],
    controls: &[ControlSpec::ranged("amp", "Amplitude", 1.0, MIN_CLIP_AMP, f64::MAX)],
};

/// Dynamics compressor.
pub static DYNAMICS_COMPRESSOR: KindSpec = KindSpec {
    inputs: &[SIGNAL_IN],
    outputs: &[SIGNAL_OUT],
    controls: &[
        ControlSpec::ranged("threshold", "Threshold", -24.0, -100.0, 0.0).live(),
        ControlSpec::ranged("knee", "Knee", 30.0, 0.0, 40.0).live(),
        ControlSpec::ranged("ratio", "Ratio", 12.0, 1.0, 20.0).live(),
        ControlSpec::ranged("attack", "Attack", 0.003, 0.0, 1.0).live(),
        ControlSpec::ranged("release", "Release", 0.25, 0.0, 1.0).live(),
    ],
};

/// Multiplies a frequency signal by octaves and half steps.
pub static TRANSPOSE: KindSpec = KindSpec {
    inputs: &[SIGNAL_IN],
    outputs: &[SIGNAL_OUT],
    controls: &[
        ControlSpec::number("halfstep", "Half Steps", 0.0),
        ControlSpec::number("octave", "Octaves", 0.0),
    ],
};

/// Compressor controls and the parameters they set.
const COMPRESSOR_PARAMS: [(&str, Param); 5] = [
    ("threshold", Param::Threshold),
    ("knee", Param::Knee),
    ("ratio", Param::Ratio),
    ("attack", Param::Attack),
    ("release", Param::Release),
];

/// Frequency ratio of a transposition.
pub fn transpose_ratio(octave: f64, halfstep: f64) -> f64 {
    2f64.powf(octave + halfstep / 12.0)
}

/// Drives a parameter from its socket, binding the control while its inline value applies.
fn drive_bound(
    ctx: &mut BuildContext<'_>,
    built: &mut BuiltNode,
    socket: &SocketSpec,
    target: ParamRef,
    range: RangeInclusive<f64>,
    controls: &Controls,
    inputs: &ResolvedInputs,
) {
    let Some(control) = socket.inline_control else {
        return;
    };
    if ctx.drive_param(socket, target, controls.number(control), inputs.get(socket.name)) {
        built.bind(control, target, range);
    }
}

pub(super) fn build_gain(
    controls: &Controls,
    inputs: &ResolvedInputs,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let gain = ctx.create(PrimitiveSpec::Gain {
        gain: controls.number("gain"),
    })?;
    ctx.patch_signal(inputs.get(SIGNAL_IN.name), gain);

    let mut built = BuiltNode::default().with_output("signal", gain);
    let range = ctx.param_range(Param::Gain);
    drive_bound(
        ctx,
        &mut built,
        &GAIN_IN,
        ParamRef::new(gain, Param::Gain),
        range,
        controls,
        inputs,
    );
    Ok(built)
}

pub(super) fn build_biquad(
    controls: &Controls,
    inputs: &ResolvedInputs,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let filter_type = FilterType::parse(controls.choice("filterType")).unwrap_or_default();
    let filter = ctx.create(PrimitiveSpec::BiquadFilter { filter_type })?;
    ctx.patch_signal(inputs.get(SIGNAL_IN.name), filter);

    let mut built = BuiltNode::default().with_output("signal", filter);
    for (socket, param) in [
        (&FILTER_FREQUENCY, Param::Frequency),
        (&FILTER_Q, Param::Q),
        (&FILTER_GAIN, Param::Gain),
    ] {
        let range = ctx.param_range(param);
        drive_bound(
            ctx,
            &mut built,
            socket,
            ParamRef::new(filter, param),
            range,
            controls,
            inputs,
        );
    }
    Ok(built)
}

pub(super) fn build_delay(
    controls: &Controls,
    inputs: &ResolvedInputs,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let max_delay = controls.number("maxDelay").max(1.0);
    let delay = ctx.create(PrimitiveSpec::Delay { max_delay })?;
    ctx.patch_signal(inputs.get(SIGNAL_IN.name), delay);

    let mut built = BuiltNode::default().with_output("signal", delay);
    drive_bound(
        ctx,
        &mut built,
        &DELAY_TIME,
        ParamRef::new(delay, Param::DelayTime),
        0.0..=max_delay,
        controls,
        inputs,
    );
    Ok(built)
}

pub(super) fn build_clip(
    controls: &Controls,
    inputs: &ResolvedInputs,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let amp = controls.number("amp").max(MIN_CLIP_AMP);
    let pre = ctx.create(PrimitiveSpec::Gain { gain: 1.0 / amp })?;
    let shaper = ctx.create(PrimitiveSpec::WaveShaper {
        curve: vec![-amp as f32, amp as f32],
    })?;
    ctx.patch_signal(inputs.get(SIGNAL_IN.name), pre);
    ctx.connect(pre, Destination::Input(shaper));
    Ok(BuiltNode::default().with_output("signal", shaper))
}

pub(super) fn build_compressor(
    controls: &Controls,
    inputs: &ResolvedInputs,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let compressor = ctx.create(PrimitiveSpec::DynamicsCompressor)?;
    ctx.patch_signal(inputs.get(SIGNAL_IN.name), compressor);

    let mut built = BuiltNode::default().with_output("signal", compressor);
    for (control, param) in COMPRESSOR_PARAMS {
        let target = ParamRef::new(compressor, param);
        ctx.set_value(target, controls.number(control));
        built.bind(control, target, ctx.param_range(param));
    }
    Ok(built)
}

pub(super) fn build_transpose(
    controls: &Controls,
    inputs: &ResolvedInputs,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let ratio = transpose_ratio(controls.number("octave"), controls.number("halfstep"));
    let gain = ctx.create(PrimitiveSpec::Gain { gain: ratio })?;
    ctx.patch_signal(inputs.get(SIGNAL_IN.name), gain);
    Ok(BuiltNode::default().with_output("signal", gain))
}
