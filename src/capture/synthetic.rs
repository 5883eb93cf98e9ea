//! Deterministic synthetic captures.
//!
//! Generators used by tests and by the CLI `synth` command to produce
//! reproducible complex baseband signals without hardware. Every generator
//! draws noise from a seeded `StdRng`, so identical specs give identical
//! captures.

use std::f64::consts::PI;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rustfft::num_complex::Complex32;
use serde::{Deserialize, Serialize};

use super::Capture;
use crate::error::CaptureError;

/// Waveform shapes available to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyntheticPattern {
    /// All-zero samples
    Silence,
    /// Continuous complex exponential
    Tone { frequency_hz: f64, amplitude: f64 },
    /// Tone gated on for `on_samples` out of every `period_samples`
    Burst {
        frequency_hz: f64,
        amplitude: f64,
        period_samples: usize,
        on_samples: usize,
    },
    /// Uniform complex noise only
    Noise { amplitude: f64 },
}

/// Full description of a synthetic capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub pattern: SyntheticPattern,
    pub sample_rate_hz: f64,
    pub len: usize,
    /// Uniform noise added on top of the pattern (per component)
    #[serde(default)]
    pub noise_amplitude: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    0x5A5A_FFF0
}

impl SyntheticSpec {
    pub fn tone(frequency_hz: f64, sample_rate_hz: f64, len: usize) -> Self {
        Self {
            pattern: SyntheticPattern::Tone {
                frequency_hz,
                amplitude: 1.0,
            },
            sample_rate_hz,
            len,
            noise_amplitude: 0.0,
            seed: default_seed(),
        }
    }

    pub fn silence(sample_rate_hz: f64, len: usize) -> Self {
        Self {
            pattern: SyntheticPattern::Silence,
            sample_rate_hz,
            len,
            noise_amplitude: 0.0,
            seed: default_seed(),
        }
    }

    pub fn with_noise(mut self, noise_amplitude: f64, seed: u64) -> Self {
        self.noise_amplitude = noise_amplitude;
        self.seed = seed;
        self
    }
}

/// Render a synthetic pattern into a capture
///
/// # Errors
/// `EmptyCapture` when `len` is zero.
pub fn generate(spec: &SyntheticSpec) -> Result<Capture, CaptureError> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let fs = spec.sample_rate_hz;

    let samples = (0..spec.len)
        .map(|n| {
            let t = n as f64 / fs;
            let (mut re, mut im) = match &spec.pattern {
                SyntheticPattern::Silence => (0.0, 0.0),
                SyntheticPattern::Tone {
                    frequency_hz,
                    amplitude,
                } => tone_at(*frequency_hz, *amplitude, t),
                SyntheticPattern::Burst {
                    frequency_hz,
                    amplitude,
                    period_samples,
                    on_samples,
                } => {
                    if n % (*period_samples).max(1) < *on_samples {
                        tone_at(*frequency_hz, *amplitude, t)
                    } else {
                        (0.0, 0.0)
                    }
                }
                SyntheticPattern::Noise { amplitude } => (
                    rng.gen_range(-1.0f64..1.0) * *amplitude,
                    rng.gen_range(-1.0f64..1.0) * *amplitude,
                ),
            };

            if spec.noise_amplitude > 0.0 {
                re += rng.gen_range(-1.0f64..1.0) * spec.noise_amplitude;
                im += rng.gen_range(-1.0f64..1.0) * spec.noise_amplitude;
            }
            Complex32::new(re as f32, im as f32)
        })
        .collect();

    Capture::new(samples)
}

fn tone_at(frequency_hz: f64, amplitude: f64, t: f64) -> (f64, f64) {
    let phase = 2.0 * PI * frequency_hz * t;
    (amplitude * phase.cos(), amplitude * phase.sin())
}
