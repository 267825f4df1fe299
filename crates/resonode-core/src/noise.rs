//! Noise buffer generation for the Noise kind.
//!
//! Buffers are generated once per build and looped by a buffered source.
//! All colors start from a seeded xorshift generator so a given seed always
//! yields the same buffer.

use std::sync::Arc;

/// Noise color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NoiseType {
    /// Flat spectrum.
    #[default]
    White,
    /// -6 dB/octave (leaky integrated white).
    Brown,
    /// -3 dB/octave (Paul Kellet's filter).
    Pink,
    /// Gently tilted up.
    Blue,
    /// +6 dB/octave (differentiated white).
    Violet,
    /// Heavily smoothed white.
    Grey,
    /// Sparse random impulses.
    Velvet,
}

impl NoiseType {
    /// All colors in menu order.
    pub const ALL: [NoiseType; 7] = [
        Self::White,
        Self::Brown,
        Self::Pink,
        Self::Blue,
        Self::Violet,
        Self::Grey,
        Self::Velvet,
    ];

    /// Persisted name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::White => "White Noise",
            Self::Brown => "Brown Noise",
            Self::Pink => "Pink Noise",
            Self::Blue => "Blue Noise",
            Self::Violet => "Violet Noise",
            Self::Grey => "Grey Noise",
            Self::Velvet => "Velvet Noise",
        }
    }

    /// Parses a persisted name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

/// Noise buffer settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseConfig {
    /// Buffer length in seconds.
    pub buffer_seconds: f64,
    /// Generator seed. Zero is replaced by a fixed non-zero seed.
    pub seed: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            buffer_seconds: 10.0,
            seed: 0x1234_5678,
        }
    }
}

/// Xorshift32 generator.
#[derive(Clone, Debug)]
struct Xorshift32(u32);

impl Xorshift32 {
    fn new(seed: u32) -> Self {
        Self(if seed == 0 { 0x1234_5678 } else { seed })
    }

    /// Uniform in [0, 1).
    #[inline]
    fn next_unit(&mut self) -> f32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        (f64::from(x) / 4_294_967_296.0) as f32
    }

    /// Uniform in [-1, 1).
    #[inline]
    fn next_bipolar(&mut self) -> f32 {
        self.next_unit() * 2.0 - 1.0
    }
}

/// Generates `len` samples of `noise`.
pub fn generate(noise: NoiseType, len: usize, seed: u32) -> Arc<[f32]> {
    let mut rng = Xorshift32::new(seed);
    let mut out = vec![0.0_f32; len];

    match noise {
        NoiseType::White => {
            for s in &mut out {
                *s = rng.next_bipolar();
            }
        }
        NoiseType::Brown => {
            let mut last = 0.0_f32;
            for s in &mut out {
                let white = rng.next_bipolar();
                last = (last + 0.02 * white) / 1.02;
                *s = last * 3.5;
            }
        }
        NoiseType::Pink => {
            let mut b = [0.0_f32; 7];
            for s in &mut out {
                let white = rng.next_bipolar();
                b[0] = 0.99886 * b[0] + white * 0.0555179;
                b[1] = 0.99332 * b[1] + white * 0.0750759;
                b[2] = 0.96900 * b[2] + white * 0.1538520;
                b[3] = 0.86650 * b[3] + white * 0.3104856;
                b[4] = 0.55000 * b[4] + white * 0.5329522;
                b[5] = -0.7616 * b[5] - white * 0.0168980;
                *s = (b.iter().sum::<f32>() + white * 0.5362) * 0.11;
                b[6] = white * 0.115926;
            }
        }
        NoiseType::Blue => {
            for s in &mut out {
                *s = rng.next_bipolar();
            }
            let alpha = 0.1;
            let mut previous = 0.0;
            for i in 1..len {
                out[i] = alpha * (out[i] - previous) + out[i - 1];
                previous = out[i];
            }
        }
        NoiseType::Violet => {
            for s in &mut out {
                *s = rng.next_bipolar();
            }
            for i in (1..len).rev() {
                out[i] -= out[i - 1];
            }
        }
        NoiseType::Grey => {
            let smoothing = 0.02;
            let mut previous = 0.0;
            for s in &mut out {
                *s = smoothing * rng.next_bipolar() + (1.0 - smoothing) * previous;
                previous = *s;
            }
        }
        NoiseType::Velvet => {
            const IMPULSE_SPACING: usize = 100;
            for _ in 0..len / IMPULSE_SPACING {
                let position = (rng.next_unit() * len as f32) as usize;
                if let Some(s) = out.get_mut(position) {
                    *s = rng.next_bipolar();
                }
            }
        }
    }

    out.into()
}
