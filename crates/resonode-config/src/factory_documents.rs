//! Factory documents bundled with resonode.
//!
//! Small ready-to-play graphs that are always available without external
//! files. They double as starting points and as fixtures for the CLI.

use resonode_core::Document;

/// Internal names of the factory documents.
pub static FACTORY_DOCUMENT_NAMES: &[&str] = &[
    "basic_tone",
    "filtered_noise",
    "keyboard_synth",
    "modulated_delay",
];

/// `(internal name, display name, JSON)` of every factory document.
///
/// Embedded at compile time.
static FACTORY_DOCUMENTS_JSON: &[(&str, &str, &str)] = &[
    ("basic_tone", "Basic Tone", BASIC_TONE),
    ("filtered_noise", "Filtered Noise", FILTERED_NOISE),
    ("keyboard_synth", "Keyboard Synth", KEYBOARD_SYNTH),
    ("modulated_delay", "Modulated Delay", MODULATED_DELAY),
];

/// A single sine into the universal output.
const BASIC_TONE: &str = r#"{
  "nodes": [
    {"id": "n1", "name": "Oscillator", "data": {"baseFreq": 440, "waveform": "sine"}},
    {"id": "n2", "name": "Universal Output", "data": {"gain": 0.5, "visual": "linear", "rangeMin": -100, "rangeMax": -10}}
  ],
  "connections": [
    {"source": "n1", "sourceOutput": "signal", "target": "n2", "targetInput": "signal"}
  ],
  "comments": []
}"#;

/// Pink noise through a resonant low-pass, watched by a spectrum view.
const FILTERED_NOISE: &str = r#"{
  "nodes": [
    {"id": "n1", "name": "Noise", "data": {"noiseType": "Pink Noise"}},
    {"id": "n2", "name": "Biquad Filter", "data": {"freq": 800, "q": 4, "gain": 0, "filterType": "lowpass"}},
    {"id": "n3", "name": "Gain", "data": {"gain": 0.4}},
    {"id": "n4", "name": "Audio Output", "data": {}},
    {"id": "n5", "name": "Frequency Domain Visualizer", "data": {"visual": "log"}}
  ],
  "connections": [
    {"source": "n1", "sourceOutput": "signal", "target": "n2", "targetInput": "signal"},
    {"source": "n2", "sourceOutput": "signal", "target": "n3", "targetInput": "signal"},
    {"source": "n3", "sourceOutput": "signal", "target": "n4", "targetInput": "signal"},
    {"source": "n2", "sourceOutput": "signal", "target": "n5", "targetInput": "signal"}
  ],
  "comments": [
    {"id": "c1", "links": ["n1", "n2"], "text": "noise bed", "type": "frame"}
  ]
}"#;

/// Keyboard oscillator through a filter and compressor.
const KEYBOARD_SYNTH: &str = r#"{
  "nodes": [
    {"id": "n1", "name": "Keyboard Note", "data": {
      "waveform": "sawtooth",
      "halfstep": 0,
      "octave": 0,
      "adsrProfile": {
        "attack": 0.8, "attackLength": 0.02,
        "decay": 0.5, "decayLength": 0.2,
        "sustain": 0.3, "sustainLength": 4.0,
        "releaseLength": 0.6
      }
    }},
    {"id": "n2", "name": "Biquad Filter", "data": {"freq": 2000, "q": 1, "gain": 0, "filterType": "lowpass"}},
    {"id": "n3", "name": "Dynamics Compressor", "data": {"threshold": -24, "knee": 30, "ratio": 12, "attack": 0.003, "release": 0.25}},
    {"id": "n4", "name": "Universal Output", "data": {"gain": 0.8, "visual": "linear", "rangeMin": -100, "rangeMax": -10}},
    {"id": "n5", "name": "Time Domain Visualizer", "data": {}}
  ],
  "connections": [
    {"source": "n1", "sourceOutput": "signal", "target": "n2", "targetInput": "signal"},
    {"source": "n2", "sourceOutput": "signal", "target": "n3", "targetInput": "signal"},
    {"source": "n3", "sourceOutput": "signal", "target": "n4", "targetInput": "signal"},
    {"source": "n3", "sourceOutput": "signal", "target": "n5", "targetInput": "signal"}
  ],
  "comments": [
    {"id": "c1", "links": ["n1"], "text": "play with Z..M and Q..I, hold shift to sustain", "type": "inline"}
  ]
}"#;

/// A triangle whose delay time is swept around 250 ms by a slow oscillator.
const MODULATED_DELAY: &str = r#"{
  "nodes": [
    {"id": "n1", "name": "Oscillator", "data": {"baseFreq": 220, "waveform": "triangle"}},
    {"id": "n2", "name": "Delay", "data": {"delay": 0.25, "maxDelay": 1}},
    {"id": "n3", "name": "Oscillator", "data": {"baseFreq": 0.5, "waveform": "sine"}},
    {"id": "n4", "name": "Gain", "data": {"gain": 0.01}},
    {"id": "n5", "name": "Constant", "data": {"value": 0.25}},
    {"id": "n6", "name": "Gain", "data": {"gain": 1}},
    {"id": "n7", "name": "Universal Output", "data": {"gain": 0.6, "visual": "linear", "rangeMin": -100, "rangeMax": -10}}
  ],
  "connections": [
    {"source": "n3", "sourceOutput": "signal", "target": "n4", "targetInput": "signal"},
    {"source": "n4", "sourceOutput": "signal", "target": "n6", "targetInput": "signal"},
    {"source": "n5", "sourceOutput": "value", "target": "n6", "targetInput": "signal"},
    {"source": "n6", "sourceOutput": "signal", "target": "n2", "targetInput": "delayTime"},
    {"source": "n1", "sourceOutput": "signal", "target": "n2", "targetInput": "signal"},
    {"source": "n1", "sourceOutput": "signal", "target": "n7", "targetInput": "signal"},
    {"source": "n2", "sourceOutput": "signal", "target": "n7", "targetInput": "signal"}
  ],
  "comments": []
}"#;

fn parse(json: &str) -> Option<Document> {
    match Document::from_json(json) {
        Ok(document) => Some(document),
        Err(e) => {
            tracing::warn!("factory_document: failed to parse bundled document: {e}");
            None
        }
    }
}

/// Get all factory documents with their display names.
pub fn factory_documents() -> Vec<(&'static str, Document)> {
    FACTORY_DOCUMENTS_JSON
        .iter()
        .filter_map(|(_, display, json)| parse(json).map(|doc| (*display, doc)))
        .collect()
}

/// Get a factory document by name.
///
/// Matches the internal name (`keyboard_synth`) or the display name
/// (`Keyboard Synth`), case-insensitively.
///
/// # Example
///
/// ```rust
/// use resonode_config::get_factory_document;
///
/// let doc = get_factory_document("Basic Tone").unwrap();
/// assert_eq!(doc.nodes.len(), 2);
/// assert!(get_factory_document("nonexistent").is_none());
/// ```
pub fn get_factory_document(name: &str) -> Option<Document> {
    FACTORY_DOCUMENTS_JSON
        .iter()
        .find(|(internal, display, _)| matches_name(internal, display, name))
        .and_then(|(_, _, json)| parse(json))
}

/// Get the internal names of all factory documents.
pub fn factory_document_names() -> Vec<&'static str> {
    FACTORY_DOCUMENTS_JSON.iter().map(|(name, _, _)| *name).collect()
}

/// Check if a name refers to a factory document (case-insensitive).
pub fn is_factory_document(name: &str) -> bool {
    FACTORY_DOCUMENTS_JSON
        .iter()
        .any(|(internal, display, _)| matches_name(internal, display, name))
}

fn matches_name(internal: &str, display: &str, name: &str) -> bool {
    internal.eq_ignore_ascii_case(name) || display.eq_ignore_ascii_case(name)
}
