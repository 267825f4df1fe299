//! Per-key voice state and the sustain modifier.

use std::collections::HashMap;

use resonode_core::backend::AudioBackend;
use resonode_core::{KeyCode, VoiceRegistry};

use crate::envelope;

/// What a key on the layout is doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyState {
    /// Not pressed, or released and fading out.
    #[default]
    Idle,
    /// Physically held; its voices are in the attack to sustain stages.
    Held,
    /// Let go while the sustain modifier was down; still sounding.
    SustainDeferred,
}

/// Saved voices, key states, and sustain flag of a [`KeyboardVoiceManager`].
#[derive(Clone, Debug)]
pub struct KeyboardSnapshot {
    registry: VoiceRegistry,
    keys: HashMap<KeyCode, KeyState>,
    sustaining: bool,
}

/// Plays registered voices from key events.
///
/// The manager owns the voice registry of the live graph. A reconciliation
/// pass calls [`reset`](Self::reset) before it evaluates and
/// [`install`](Self::install) once the new graph is in place, so key state
/// never outlives the primitives it refers to.
///
/// Key events take the raw key code string so modifier keys outside the
/// layout (`ShiftLeft`, `ShiftRight`) still reach the sustain logic.
#[derive(Debug, Default)]
pub struct KeyboardVoiceManager {
    registry: VoiceRegistry,
    keys: HashMap<KeyCode, KeyState>,
    sustaining: bool,
}

impl KeyboardVoiceManager {
    /// Creates a manager with no voices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installed voices.
    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }

    /// Replaces the voices. Key states and sustain start over.
    pub fn install(&mut self, registry: VoiceRegistry) {
        tracing::debug!(
            "keyboard_install: {} voices on {} keys",
            registry.voice_count(),
            registry.keys().count()
        );
        self.registry = registry;
        self.keys.clear();
        self.sustaining = false;
    }

    /// Captures everything [`reset`](Self::reset) would drop.
    pub fn snapshot(&self) -> KeyboardSnapshot {
        KeyboardSnapshot {
            registry: self.registry.clone(),
            keys: self.keys.clone(),
            sustaining: self.sustaining,
        }
    }

    /// Puts back a snapshot, held keys and sustain included.
    pub fn restore(&mut self, snapshot: KeyboardSnapshot) {
        tracing::debug!(
            "keyboard_restore: {} voices, {} keys down",
            snapshot.registry.voice_count(),
            snapshot
                .keys
                .values()
                .filter(|state| **state != KeyState::Idle)
                .count()
        );
        self.registry = snapshot.registry;
        self.keys = snapshot.keys;
        self.sustaining = snapshot.sustaining;
    }

    /// Drops every voice, profile, key state, and the sustain flag.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.keys.clear();
        self.sustaining = false;
    }

    /// State of `key`.
    pub fn key_state(&self, key: KeyCode) -> KeyState {
        self.keys.get(&key).copied().unwrap_or_default()
    }

    /// True while the sustain modifier is down.
    pub fn is_sustaining(&self) -> bool {
        self.sustaining
    }

    /// Handles a key press.
    ///
    /// A key with voices that is not already held starts its envelopes and
    /// becomes held; autorepeat of a held key does nothing. Any other press
    /// made with `shift` down turns sustain on. Returns true when envelopes
    /// were started.
    pub fn key_down(&mut self, backend: &mut dyn AudioBackend, code: &str, shift: bool) -> bool {
        let key = self
            .playable(code)
            .filter(|key| self.key_state(*key) != KeyState::Held);
        if let Some(key) = key {
            self.play(backend, key);
            self.keys.insert(key, KeyState::Held);
            return true;
        }
        if shift {
            self.sustaining = true;
        }
        false
    }

    /// Handles a key release.
    ///
    /// A held key is released, or deferred while sustaining. Releasing any
    /// other key without `shift` counts as letting go of the modifier.
    pub fn key_up(&mut self, backend: &mut dyn AudioBackend, code: &str, shift: bool) {
        let key = self
            .playable(code)
            .filter(|key| self.key_state(*key) == KeyState::Held);
        if let Some(key) = key {
            if self.sustaining {
                self.keys.insert(key, KeyState::SustainDeferred);
            } else {
                self.release(backend, key);
                self.keys.insert(key, KeyState::Idle);
            }
            return;
        }
        if !shift {
            self.set_sustain(backend, false);
        }
    }

    /// Turns the sustain modifier on or off.
    ///
    /// Turning it off releases every deferred key.
    pub fn set_sustain(&mut self, backend: &mut dyn AudioBackend, on: bool) {
        self.sustaining = on;
        if on {
            return;
        }

        let deferred: Vec<KeyCode> = self
            .keys
            .iter()
            .filter(|(_, state)| **state == KeyState::SustainDeferred)
            .map(|(key, _)| *key)
            .collect();
        for key in deferred {
            self.release(backend, key);
            self.keys.insert(key, KeyState::Idle);
        }
    }

    fn playable(&self, code: &str) -> Option<KeyCode> {
        KeyCode::parse(code).filter(|key| !self.registry.voices_for(*key).is_empty())
    }

    fn play(&self, backend: &mut dyn AudioBackend, key: KeyCode) {
        tracing::debug!("keyboard_press: {key}");
        for voice in self.registry.voices_for(key) {
            envelope::trigger(backend, voice.gain, &self.registry.profile(voice.profile));
        }
    }

    fn release(&self, backend: &mut dyn AudioBackend, key: KeyCode) {
        tracing::debug!("keyboard_release: {key}");
        for voice in self.registry.voices_for(key) {
            envelope::release(backend, voice.gain, &self.registry.profile(voice.profile));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resonode_core::backend::{Param, ParamRef, PrimitiveSpec, RecordingBackend};
    use resonode_core::VoiceProfile;

    fn setup(keys: &[&str]) -> (RecordingBackend, KeyboardVoiceManager, Vec<ParamRef>) {
        let mut backend = RecordingBackend::new(48000.0);
        let mut voices = VoiceRegistry::new();
        let profile = voices.register_profile(VoiceProfile::default());
        let mut gains = Vec::new();
        for code in keys {
            let gate = backend.create(PrimitiveSpec::Gain { gain: 0.0 }).unwrap();
            let gain = ParamRef::new(gate, Param::Gain);
            voices.bind(KeyCode::parse(code).unwrap(), gain, profile);
            gains.push(gain);
        }
        let mut keyboard = KeyboardVoiceManager::new();
        keyboard.install(voices);
        (backend, keyboard, gains)
    }

    fn key(code: &str) -> KeyCode {
        KeyCode::parse(code).unwrap()
    }

    #[test]
    fn test_press_and_release() {
        let (mut backend, mut keyboard, _) = setup(&["KeyA"]);
        assert!(keyboard.key_down(&mut backend, "KeyA", false));
        assert_eq!(keyboard.key_state(key("KeyA")), KeyState::Held);
        keyboard.key_up(&mut backend, "KeyA", false);
        assert_eq!(keyboard.key_state(key("KeyA")), KeyState::Idle);
    }

    #[test]
    fn test_autorepeat_does_not_retrigger() {
        let (mut backend, mut keyboard, gains) = setup(&["KeyA"]);
        keyboard.key_down(&mut backend, "KeyA", false);
        let events = backend.primitive(gains[0].primitive).unwrap().params[&Param::Gain]
            .events()
            .len();
        backend.advance_by(0.02);
        assert!(!keyboard.key_down(&mut backend, "KeyA", false));
        let after = backend.primitive(gains[0].primitive).unwrap().params[&Param::Gain]
            .events()
            .len();
        assert_eq!(events, after);
    }

    #[test]
    fn test_unbound_key_does_nothing() {
        let (mut backend, mut keyboard, _) = setup(&["KeyA"]);
        assert!(!keyboard.key_down(&mut backend, "KeyB", false));
        assert_eq!(keyboard.key_state(key("KeyB")), KeyState::Idle);
        assert!(!keyboard.is_sustaining());
    }

    #[test]
    fn test_shift_defers_release() {
        let (mut backend, mut keyboard, gains) = setup(&["KeyA"]);
        keyboard.key_down(&mut backend, "KeyA", false);
        keyboard.key_down(&mut backend, "ShiftLeft", true);
        assert!(keyboard.is_sustaining());

        backend.advance_to(0.5);
        keyboard.key_up(&mut backend, "KeyA", true);
        assert_eq!(keyboard.key_state(key("KeyA")), KeyState::SustainDeferred);

        // Still on the sustain schedule, nowhere near silence.
        assert!(backend.value_at(gains[0], 1.5) > 0.05);

        backend.advance_to(1.0);
        keyboard.key_up(&mut backend, "ShiftLeft", false);
        assert!(!keyboard.is_sustaining());
        assert_eq!(keyboard.key_state(key("KeyA")), KeyState::Idle);
        assert_eq!(backend.value_at(gains[0], 2.0), 0.0);
    }

    #[test]
    fn test_releasing_modifier_keeps_held_keys() {
        let (mut backend, mut keyboard, _) = setup(&["KeyA", "KeyB"]);
        keyboard.set_sustain(&mut backend, true);
        keyboard.key_down(&mut backend, "KeyA", false);
        keyboard.key_down(&mut backend, "KeyB", false);
        keyboard.key_up(&mut backend, "KeyA", false);

        keyboard.set_sustain(&mut backend, false);
        assert_eq!(keyboard.key_state(key("KeyA")), KeyState::Idle);
        assert_eq!(keyboard.key_state(key("KeyB")), KeyState::Held);
    }

    #[test]
    fn test_deferred_key_can_be_struck_again() {
        let (mut backend, mut keyboard, _) = setup(&["KeyA"]);
        keyboard.set_sustain(&mut backend, true);
        keyboard.key_down(&mut backend, "KeyA", false);
        keyboard.key_up(&mut backend, "KeyA", false);
        assert!(keyboard.key_down(&mut backend, "KeyA", false));
        assert_eq!(keyboard.key_state(key("KeyA")), KeyState::Held);
    }

    #[test]
    fn test_reset_forgets_everything() {
        let (mut backend, mut keyboard, _) = setup(&["KeyA"]);
        keyboard.key_down(&mut backend, "KeyA", true);
        keyboard.set_sustain(&mut backend, true);
        keyboard.reset();
        assert!(keyboard.registry().is_empty());
        assert!(!keyboard.is_sustaining());
        assert_eq!(keyboard.key_state(key("KeyA")), KeyState::Idle);
        assert!(!keyboard.key_down(&mut backend, "KeyA", false));
    }

    #[test]
    fn test_restore_brings_back_held_keys_and_sustain() {
        let (mut backend, mut keyboard, gains) = setup(&["KeyA", "KeyB"]);
        keyboard.key_down(&mut backend, "KeyA", false);
        keyboard.set_sustain(&mut backend, true);
        keyboard.key_down(&mut backend, "KeyB", false);
        keyboard.key_up(&mut backend, "KeyB", true);

        let snapshot = keyboard.snapshot();
        keyboard.reset();
        keyboard.restore(snapshot);

        assert_eq!(keyboard.registry().voice_count(), 2);
        assert!(keyboard.is_sustaining());
        assert_eq!(keyboard.key_state(key("KeyA")), KeyState::Held);
        assert_eq!(keyboard.key_state(key("KeyB")), KeyState::SustainDeferred);

        backend.advance_to(0.5);
        keyboard.set_sustain(&mut backend, false);
        keyboard.key_up(&mut backend, "KeyA", false);
        assert_eq!(keyboard.key_state(key("KeyA")), KeyState::Idle);
        assert_eq!(backend.value_at(gains[0], 2.0), 0.0);
        assert_eq!(backend.value_at(gains[1], 2.0), 0.0);
    }
}
