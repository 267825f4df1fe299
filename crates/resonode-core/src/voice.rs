//! Keyboard key layout, pitch map, and voice registry.
//!
//! A voice is a gain parameter that the keyboard manager drives through an
//! ADSR envelope. Keyboard kinds register their voices here during
//! evaluation; the manager in `resonode-synth` reads them on key events.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::ParamRef;

/// Floor for exponential ramps; values below it count as silence.
pub const SILENCE_FLOOR: f64 = 1e-5;

/// Physical key codes recognized by the keyboard kinds.
const LAYOUT: [&str; 36] = [
    "KeyA", "KeyB", "KeyC", "KeyD", "KeyE", "KeyF", "KeyG", "KeyH", "KeyI", "KeyJ", "KeyK",
    "KeyL", "KeyM", "KeyN", "KeyO", "KeyP", "KeyQ", "KeyR", "KeyS", "KeyT", "KeyU", "KeyV",
    "KeyW", "KeyX", "KeyY", "KeyZ", "Digit0", "Digit1", "Digit2", "Digit3", "Digit4", "Digit5",
    "Digit6", "Digit7", "Digit8", "Digit9",
];

/// A physical key code on the layout, e.g. `KeyZ`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(&'static str);

impl KeyCode {
    /// Parses a key code. Returns `None` for keys outside the layout.
    pub fn parse(code: &str) -> Option<Self> {
        LAYOUT.iter().find(|k| **k == code).map(|k| Self(*k))
    }

    /// The key code string.
    pub fn as_str(self) -> &'static str {
        self.0
    }

    /// Every key on the layout.
    pub fn all() -> impl Iterator<Item = KeyCode> {
        LAYOUT.iter().map(|k| Self(*k))
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Keys of the Keyboard Note pitch map, from C4 upward in half steps.
const NOTE_KEYS: [&str; 25] = [
    "KeyZ", "KeyS", "KeyX", "KeyD", "KeyC", "KeyV", "KeyG", "KeyB", "KeyH", "KeyN", "KeyJ",
    "KeyM", "KeyQ", "Digit2", "KeyW", "Digit3", "KeyE", "KeyR", "Digit5", "KeyT", "Digit6",
    "KeyY", "Digit7", "KeyU", "KeyI",
];

/// Frequency of C4 in Hz.
const C4: f64 = 261.6256;

/// The Keyboard Note pitch map: each mapped key with its base frequency.
pub fn note_map() -> impl Iterator<Item = (KeyCode, f64)> {
    NOTE_KEYS
        .iter()
        .enumerate()
        .map(|(step, key)| (KeyCode(*key), C4 * 2f64.powf(step as f64 / 12.0)))
}

/// Base frequency of `key` in the pitch map.
pub fn note_frequency(key: KeyCode) -> Option<f64> {
    note_map().find(|(k, _)| *k == key).map(|(_, f)| f)
}

/// ADSR envelope levels and segment lengths.
///
/// Lengths are seconds per segment, each measured from the end of the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VoiceProfile {
    /// Peak level.
    pub attack: f64,
    /// Time to reach the peak.
    pub attack_length: f64,
    /// Level after the decay segment.
    pub decay: f64,
    /// Time from peak to decay level.
    pub decay_length: f64,
    /// Level held while the key is down.
    pub sustain: f64,
    /// Time from decay level to sustain level.
    pub sustain_length: f64,
    /// Fade to silence, both after sustain and on key release.
    pub release_length: f64,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            attack: 0.8,
            attack_length: 0.05,
            decay: 0.7,
            decay_length: 0.1,
            sustain: 0.1,
            sustain_length: 3.0,
            release_length: 1.0,
        }
    }
}

impl VoiceProfile {
    /// Checks levels are non-negative and lengths positive.
    pub fn validate(&self) -> Result<(), String> {
        let levels = [
            ("attack", self.attack),
            ("decay", self.decay),
            ("sustain", self.sustain),
        ];
        let lengths = [
            ("attackLength", self.attack_length),
            ("decayLength", self.decay_length),
            ("sustainLength", self.sustain_length),
            ("releaseLength", self.release_length),
        ];
        for (name, v) in levels.iter().chain(lengths.iter()) {
            if !v.is_finite() {
                return Err(format!("{name} must be finite, got {v}"));
            }
        }
        if let Some((name, v)) = levels.iter().find(|(_, v)| *v < 0.0) {
            return Err(format!("{name} must be >= 0, got {v}"));
        }
        if let Some((name, v)) = lengths.iter().find(|(_, v)| *v <= 0.0) {
            return Err(format!("{name} must be > 0, got {v}"));
        }
        Ok(())
    }
}

/// One keyboard-gated gain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Voice {
    /// Gain parameter the envelope drives.
    pub gain: ParamRef,
    /// Index into [`VoiceRegistry::profile`].
    pub profile: usize,
}

/// Voices and their envelope profiles, keyed by key code.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoiceRegistry {
    profiles: Vec<VoiceProfile>,
    voices: BTreeMap<KeyCode, Vec<Voice>>,
}

impl VoiceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an envelope profile, returning its index.
    pub fn register_profile(&mut self, profile: VoiceProfile) -> usize {
        self.profiles.push(profile);
        self.profiles.len() - 1
    }

    /// Binds a gain to `key` with a previously registered profile.
    pub fn bind(&mut self, key: KeyCode, gain: ParamRef, profile: usize) {
        self.voices
            .entry(key)
            .or_default()
            .push(Voice { gain, profile });
    }

    /// Voices bound to `key`.
    pub fn voices_for(&self, key: KeyCode) -> &[Voice] {
        self.voices.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Profile by index. Unknown indices get the default profile.
    pub fn profile(&self, index: usize) -> VoiceProfile {
        self.profiles.get(index).copied().unwrap_or_default()
    }

    /// Removes every voice and profile.
    pub fn clear(&mut self) {
        self.profiles.clear();
        self.voices.clear();
    }

    /// True when no voice is bound.
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Total number of voices across all keys.
    pub fn voice_count(&self) -> usize {
        self.voices.values().map(Vec::len).sum()
    }

    /// Keys with at least one voice.
    pub fn keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.voices.keys().copied()
    }
}
