//! ADSR schedules on a voice gain.
//!
//! Envelopes are not computed per sample. A key press appends one
//! exponential ramp per stage to the gain's automation timeline and lets the
//! backend render it. Exponential ramps cannot reach zero, so every level is
//! kept at or above [`SILENCE_FLOOR`] and silence is a final step to exact 0.
//!
//! ```text
//!  gain
//!   │    ╱╲ attack
//!   │   ╱  ╲___ decay
//!   │  ╱       ╲______ sustain
//!   │ ╱               ╲___ floor ─ 0
//!   └─────────────────────────────► t
//!     │atk│dec│  sustain  │release│
//! ```

use resonode_core::backend::{AudioBackend, ParamEvent, ParamRef};
use resonode_core::{SILENCE_FLOOR, VoiceProfile};

/// Events that start an envelope at `now` from a gain currently at `current`.
///
/// Each stage length is measured from the end of the previous stage. Without
/// a release the envelope still decays to the floor `releaseLength` after the
/// sustain stage ends.
pub fn attack_events(profile: &VoiceProfile, now: f64, current: f64) -> Vec<ParamEvent> {
    let mut events = vec![ParamEvent::CancelAndHoldAtTime { time: now }];
    if current < SILENCE_FLOOR {
        events.push(ParamEvent::SetValueAtTime {
            value: SILENCE_FLOOR,
            time: now,
        });
    }

    let stages = [
        (profile.attack.max(SILENCE_FLOOR), profile.attack_length),
        (profile.decay.max(SILENCE_FLOOR), profile.decay_length),
        (profile.sustain.max(SILENCE_FLOOR), profile.sustain_length),
        (SILENCE_FLOOR, profile.release_length),
    ];
    let mut at = now;
    for (value, length) in stages {
        at += length;
        events.push(ParamEvent::ExponentialRampToValueAtTime {
            value,
            end_time: at,
        });
    }
    events
}

/// Events that release an envelope at `now` from a gain currently at `current`.
///
/// A gain already under the floor drops straight to 0.
pub fn release_events(profile: &VoiceProfile, now: f64, current: f64) -> Vec<ParamEvent> {
    let mut events = vec![ParamEvent::CancelAndHoldAtTime { time: now }];
    if current < SILENCE_FLOOR {
        events.push(ParamEvent::SetValueAtTime {
            value: 0.0,
            time: now,
        });
        return events;
    }

    let end = now + profile.release_length;
    events.push(ParamEvent::ExponentialRampToValueAtTime {
        value: SILENCE_FLOOR,
        end_time: end,
    });
    events.push(ParamEvent::SetValueAtTime {
        value: 0.0,
        time: end,
    });
    events
}

/// Starts an envelope on `gain` at the backend's current time.
pub fn trigger(backend: &mut dyn AudioBackend, gain: ParamRef, profile: &VoiceProfile) {
    let now = backend.current_time();
    let current = backend.param_value(gain);
    for event in attack_events(profile, now, current) {
        backend.schedule(gain, event);
    }
}

/// Releases the envelope on `gain` at the backend's current time.
pub fn release(backend: &mut dyn AudioBackend, gain: ParamRef, profile: &VoiceProfile) {
    let now = backend.current_time();
    let current = backend.param_value(gain);
    for event in release_events(profile, now, current) {
        backend.schedule(gain, event);
    }
}
