//! Keyboard input kinds.
//!
//! Both kinds build gains parked at zero and register them as voices. The
//! keyboard manager opens and closes them with an envelope on key events.

use super::processors::transpose_ratio;
use super::sources::WAVEFORMS;
use super::{BuildContext, BuiltNode, ControlSpec, Controls, KindSpec, ResolvedInputs};
use crate::backend::{Destination, Param, ParamRef, PrimitiveSpec, Waveform};
use crate::error::{BuildError, ValidationError};
use crate::graph::SocketSpec;
use crate::kind::NodeKind;
use crate::voice::{self, KeyCode};

const ADDITIONAL_FREQUENCY: SocketSpec =
    SocketSpec::additional("additionalFrequency", "Additional Frequency");

/// Oscillator bank played from the keyboard.
pub static KEYBOARD_NOTE: KindSpec = KindSpec {
    inputs: &[ADDITIONAL_FREQUENCY],
    outputs: &[SocketSpec::output("signal", "Signal")],
    controls: &[
        ControlSpec::choice("waveform", "Waveform", "sine", WAVEFORMS),
        ControlSpec::number("halfstep", "Half Steps", 0.0),
        ControlSpec::number("octave", "Octaves", 0.0),
        ControlSpec::profile("adsrProfile", "ADSR"),
    ],
};

/// Envelope on an arbitrary signal, gated by one key.
pub static KEYBOARD_ADSR: KindSpec = KindSpec {
    inputs: &[SocketSpec::signal("signal", "Signal")],
    outputs: &[SocketSpec::output("signal", "Signal")],
    controls: &[
        ControlSpec::key_code("keyCode", "Key", "KeyA"),
        ControlSpec::profile("adsrProfile", "ADSR"),
    ],
};

pub(super) fn build_keyboard_note(
    controls: &Controls,
    inputs: &ResolvedInputs,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let waveform = Waveform::parse(controls.choice("waveform")).unwrap_or_default();
    let ratio = transpose_ratio(controls.number("octave"), controls.number("halfstep"));
    let profile = ctx
        .voices()
        .register_profile(controls.profile("adsrProfile"));
    let additional = inputs.get(ADDITIONAL_FREQUENCY.name);

    let combiner = ctx.create(PrimitiveSpec::Gain { gain: 1.0 })?;
    for (key, base) in voice::note_map() {
        let osc = ctx.create(PrimitiveSpec::Oscillator {
            waveform,
            frequency: base * ratio,
        })?;
        ctx.drive_param(
            &ADDITIONAL_FREQUENCY,
            ParamRef::new(osc, Param::Frequency),
            0.0,
            additional,
        );
        let gate = ctx.create(PrimitiveSpec::Gain { gain: 0.0 })?;
        ctx.connect(osc, Destination::Input(gate));
        ctx.connect(gate, Destination::Input(combiner));
        ctx.voices()
            .bind(key, ParamRef::new(gate, Param::Gain), profile);
    }
    Ok(BuiltNode::default().with_output("signal", combiner))
}

pub(super) fn build_keyboard_adsr(
    controls: &Controls,
    inputs: &ResolvedInputs,
    ctx: &mut BuildContext<'_>,
) -> Result<BuiltNode, BuildError> {
    let code = controls.choice("keyCode");
    let key = KeyCode::parse(code).ok_or_else(|| {
        ValidationError::new(
            NodeKind::KeyboardAdsr,
            "keyCode",
            format!("'{code}' is not a key on the layout"),
        )
    })?;

    let gate = ctx.create(PrimitiveSpec::Gain { gain: 0.0 })?;
    ctx.patch_signal(inputs.get("signal"), gate);
    let profile = ctx
        .voices()
        .register_profile(controls.profile("adsrProfile"));
    ctx.voices()
        .bind(key, ParamRef::new(gate, Param::Gain), profile);
    Ok(BuiltNode::default().with_output("signal", gate))
}
