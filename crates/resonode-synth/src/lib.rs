//! Resonode Synth - keyboard voice manager
//!
//! Keyboard kinds register gain voices in a [`VoiceRegistry`] while a
//! reconciliation pass builds them. This crate plays those voices: it tracks
//! which keys are held, applies the sustain modifier, and schedules ADSR
//! envelopes on the voice gains through the host backend's automation
//! timeline.
//!
//! # Core Components
//!
//! - [`KeyboardVoiceManager`] - Per-key state machine and sustain handling
//! - [`KeyState`] - Idle, held, or waiting for the sustain modifier
//! - [`envelope`] - Attack and release schedules
//!
//! # Example
//!
//! ```rust
//! use resonode_core::backend::{AudioBackend, Param, ParamRef, PrimitiveSpec, RecordingBackend};
//! use resonode_core::{KeyCode, VoiceProfile, VoiceRegistry};
//! use resonode_synth::{KeyState, KeyboardVoiceManager};
//!
//! let mut backend = RecordingBackend::new(48000.0);
//! let gate = backend.create(PrimitiveSpec::Gain { gain: 0.0 }).unwrap();
//!
//! let mut voices = VoiceRegistry::new();
//! let profile = voices.register_profile(VoiceProfile::default());
//! let key = KeyCode::parse("KeyA").unwrap();
//! voices.bind(key, ParamRef::new(gate, Param::Gain), profile);
//!
//! let mut keyboard = KeyboardVoiceManager::new();
//! keyboard.install(voices);
//! keyboard.key_down(&mut backend, "KeyA", false);
//! assert_eq!(keyboard.key_state(key), KeyState::Held);
//! keyboard.key_up(&mut backend, "KeyA", false);
//! assert_eq!(keyboard.key_state(key), KeyState::Idle);
//! ```

pub mod envelope;
mod manager;

pub use manager::{KeyState, KeyboardSnapshot, KeyboardVoiceManager};
pub use resonode_core::{KeyCode, SILENCE_FLOOR, VoiceProfile, VoiceRegistry};
