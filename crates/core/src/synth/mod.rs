//! Synthesis primitives: sine oscillators, noise percussion and the ADSR
//! envelope shaper used by the mood engine.

use std::f64::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::buffer::{linspace, seconds_to_samples};

/// Width of a single percussion hit in samples.
pub const DRUM_BURST_SAMPLES: usize = 500;
/// Linear gain applied to each percussion hit.
pub const DRUM_GAIN: f32 = 0.5;
/// Exponent reached at the end of a hit; `exp(-5)` is below 1% of the onset.
const DRUM_DECAY_SPAN: f32 = 5.0;

/// Draws a standard normal value using the Box-Muller transform.
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    // `gen` yields [0, 1); flip it so the logarithm never sees zero.
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    ((-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()) as f32
}

/// `amplitude * sin(2π · frequency · t)` evaluated over the time vector.
pub fn tone(frequency: f32, time: &[f32], amplitude: f32) -> Vec<f32> {
    let frequency = frequency as f64;
    let amplitude = amplitude as f64;
    time.iter()
        .map(|&t| (amplitude * (TAU * frequency * t as f64).sin()) as f32)
        .collect()
}

/// Sparse noise hits, one per beat, over a clip described by `time`.
///
/// Hits that run past the end of the clip are cut short. Hits closer together
/// than [`DRUM_BURST_SAMPLES`] are summed.
pub fn drum_track<R: Rng + ?Sized>(
    time: &[f32],
    sample_rate: u32,
    bpm: f32,
    rng: &mut R,
) -> Vec<f32> {
    let mut drum = vec![0.0_f32; time.len()];
    let Some(&last) = time.last() else {
        return drum;
    };

    let beat_interval = 60.0 / bpm as f64;
    let beats = (last as f64 / beat_interval) as usize;
    let envelope: Vec<f32> = linspace(0.0, DRUM_DECAY_SPAN, DRUM_BURST_SAMPLES)
        .into_iter()
        .map(|x| (-x).exp() * DRUM_GAIN)
        .collect();

    for beat in 0..beats {
        let start = (beat as f64 * beat_interval * sample_rate as f64) as usize;
        if start >= drum.len() {
            break;
        }
        let end = (start + DRUM_BURST_SAMPLES).min(drum.len());
        for (slot, gain) in drum[start..end].iter_mut().zip(&envelope) {
            *slot += gaussian(rng) * gain;
        }
    }

    drum
}

/// Attack/decay/sustain/release settings, times in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Adsr {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.2,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

impl Adsr {
    pub fn apply(&self, samples: Vec<f32>, sample_rate: u32) -> Vec<f32> {
        apply_adsr(
            samples,
            sample_rate,
            self.attack,
            self.decay,
            self.sustain,
            self.release,
        )
    }
}

/// Shapes `samples` with an ADSR curve.
///
/// When the buffer is shorter than attack + decay + release the curve
/// degrades to a straight fade from full level to silence.
pub fn apply_adsr(
    mut samples: Vec<f32>,
    sample_rate: u32,
    attack: f32,
    decay: f32,
    sustain_level: f32,
    release: f32,
) -> Vec<f32> {
    let len = samples.len();
    let a = seconds_to_samples(attack, sample_rate);
    let d = seconds_to_samples(decay, sample_rate);
    let r = seconds_to_samples(release, sample_rate);

    let envelope = if a + d + r > len {
        linspace(1.0, 0.0, len)
    } else {
        let s = len - (a + d + r);
        let mut envelope = Vec::with_capacity(len);
        envelope.extend(linspace(0.0, 1.0, a));
        envelope.extend(linspace(1.0, sustain_level, d));
        envelope.extend(std::iter::repeat(sustain_level).take(s));
        envelope.extend(linspace(sustain_level, 0.0, r));
        envelope
    };

    for (sample, gain) in samples.iter_mut().zip(envelope) {
        *sample *= gain;
    }
    samples
}
