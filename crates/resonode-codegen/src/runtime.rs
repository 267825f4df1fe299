//! Fixed JavaScript helpers the templates call into.

use resonode_core::NoiseType;

pub(crate) const PREAMBLE: &str = r"
const ctx = new AudioContext();
const master = ctx.createGain();
const masterCompressor = ctx.createDynamicsCompressor();
master.connect(masterCompressor);
masterCompressor.connect(ctx.destination);
const sources = [];
";

/// Name of the generator function for `noise`.
pub(crate) const fn noise_function(noise: NoiseType) -> &'static str {
    match noise {
        NoiseType::White => "whiteNoise",
        NoiseType::Brown => "brownNoise",
        NoiseType::Pink => "pinkNoise",
        NoiseType::Blue => "blueNoise",
        NoiseType::Violet => "violetNoise",
        NoiseType::Grey => "greyNoise",
        NoiseType::Velvet => "velvetNoise",
    }
}

/// Other generators the helper for `noise` calls.
pub(crate) const fn noise_dependencies(noise: NoiseType) -> &'static [NoiseType] {
    match noise {
        NoiseType::Blue | NoiseType::Violet => &[NoiseType::White],
        _ => &[],
    }
}

/// Generator function filling a channel buffer with `noise`.
pub(crate) const fn noise_source(noise: NoiseType) -> &'static str {
    match noise {
        NoiseType::White => {
            r"
function whiteNoise(data) {
  for (let i = 0; i < data.length; i++) data[i] = Math.random() * 2 - 1;
}
"
        }
        NoiseType::Brown => {
            r"
function brownNoise(data) {
  let last = 0;
  for (let i = 0; i < data.length; i++) {
    last = (last + 0.02 * (Math.random() * 2 - 1)) / 1.02;
    data[i] = last * 3.5;
  }
}
"
        }
        NoiseType::Pink => {
            r"
function pinkNoise(data) {
  let b0 = 0, b1 = 0, b2 = 0, b3 = 0, b4 = 0, b5 = 0, b6 = 0;
  for (let i = 0; i < data.length; i++) {
    const white = Math.random() * 2 - 1;
    b0 = 0.99886 * b0 + white * 0.0555179;
    b1 = 0.99332 * b1 + white * 0.0750759;
    b2 = 0.969 * b2 + white * 0.153852;
    b3 = 0.8665 * b3 + white * 0.3104856;
    b4 = 0.55 * b4 + white * 0.5329522;
    b5 = -0.7616 * b5 - white * 0.016898;
    data[i] = (b0 + b1 + b2 + b3 + b4 + b5 + b6 + white * 0.5362) * 0.11;
    b6 = white * 0.115926;
  }
}
"
        }
        NoiseType::Blue => {
            r"
function blueNoise(data) {
  whiteNoise(data);
  let previous = 0;
  for (let i = 1; i < data.length; i++) {
    data[i] = 0.1 * (data[i] - previous) + data[i - 1];
    previous = data[i];
  }
}
"
        }
        NoiseType::Violet => {
            r"
function violetNoise(data) {
  whiteNoise(data);
  for (let i = data.length - 1; i > 0; i--) data[i] -= data[i - 1];
}
"
        }
        NoiseType::Grey => {
            r"
function greyNoise(data) {
  let previous = 0;
  for (let i = 0; i < data.length; i++) {
    data[i] = 0.02 * (Math.random() * 2 - 1) + 0.98 * previous;
    previous = data[i];
  }
}
"
        }
        NoiseType::Velvet => {
            r"
function velvetNoise(data) {
  for (let n = 0; n < Math.floor(data.length / 100); n++) {
    data[Math.floor(Math.random() * data.length)] = Math.random() * 2 - 1;
  }
}
"
        }
    }
}

/// Voice registry, envelope scheduling, and key listeners.
///
/// Mirrors the keyboard voice manager: a held key ignores autorepeat, shift
/// turns sustain on, and letting go of shift releases deferred keys.
pub(crate) const KEYBOARD: &str = r#"
const EPSILON = 0.00001;
const profiles = [];
const keyboard = {};
const keyState = {};
let sustaining = false;

function addProfile(profile) {
  profiles.push(profile);
  return profiles.length - 1;
}

function addVoice(key, gain, profile) {
  (keyboard[key] ??= []).push({ gain, profile });
}

function playNote(key) {
  const now = ctx.currentTime;
  for (const voice of keyboard[key]) {
    const p = profiles[voice.profile];
    voice.gain.cancelAndHoldAtTime(now);
    if (voice.gain.value < EPSILON) voice.gain.setValueAtTime(EPSILON, now);
    let t = now + p.attackLength;
    voice.gain.exponentialRampToValueAtTime(Math.max(p.attack, EPSILON), t);
    t += p.decayLength;
    voice.gain.exponentialRampToValueAtTime(Math.max(p.decay, EPSILON), t);
    t += p.sustainLength;
    voice.gain.exponentialRampToValueAtTime(Math.max(p.sustain, EPSILON), t);
    t += p.releaseLength;
    voice.gain.exponentialRampToValueAtTime(EPSILON, t);
  }
}

function releaseNote(key) {
  const now = ctx.currentTime;
  for (const voice of keyboard[key]) {
    const p = profiles[voice.profile];
    voice.gain.cancelAndHoldAtTime(now);
    if (voice.gain.value < EPSILON) {
      voice.gain.setValueAtTime(0, now);
      continue;
    }
    voice.gain.exponentialRampToValueAtTime(EPSILON, now + p.releaseLength);
    voice.gain.setValueAtTime(0, now + p.releaseLength);
  }
}

window.addEventListener("keydown", (event) => {
  const key = event.code;
  if (keyboard[key] && keyState[key] !== "held") {
    playNote(key);
    keyState[key] = "held";
  } else if (event.shiftKey) {
    sustaining = true;
  }
});

window.addEventListener("keyup", (event) => {
  const key = event.code;
  if (keyboard[key] && keyState[key] === "held") {
    if (sustaining) {
      keyState[key] = "deferred";
    } else {
      releaseNote(key);
      keyState[key] = "idle";
    }
  } else if (!event.shiftKey) {
    sustaining = false;
    for (const k in keyState) {
      if (keyState[k] === "deferred") {
        releaseNote(k);
        keyState[k] = "idle";
      }
    }
  }
});
"#;
