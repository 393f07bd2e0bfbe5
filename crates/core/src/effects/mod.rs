//! Buffer-to-buffer effect stages used by the remix pipeline.
//!
//! Every stage takes ownership of a mono buffer and hands back a buffer of
//! the same length. None of them clamp their parameters or the resulting
//! amplitude; the pipeline normalises once at the end.

mod convolve;
mod filter;

pub use convolve::{convolve_full, convolve_same};
pub use filter::ButterworthLowpass;

use rand::Rng;

use crate::{
    buffer::{linspace, seconds_to_samples, SampleBuffer, StereoBuffer},
    synth::gaussian,
    Result,
};

/// Order of the low-pass that isolates the bass band.
pub const BASS_FILTER_ORDER: usize = 5;
/// Length of the reverb impulse response.
pub const REVERB_IR_SECONDS: f32 = 0.03;
/// Gain applied inside the beat-drop window.
pub const DROP_ATTENUATION: f32 = 0.1;
pub const WIDEN_LEFT_GAIN: f32 = 1.1;
pub const WIDEN_RIGHT_GAIN: f32 = 0.9;

/// Adds `gain` times the low-passed signal back onto the input.
pub fn bass_boost(
    mut samples: Vec<f32>,
    sample_rate: u32,
    gain: f32,
    cutoff_hz: f32,
) -> Result<Vec<f32>> {
    let low = ButterworthLowpass::new(BASS_FILTER_ORDER, cutoff_hz, sample_rate)?.filter(&samples);
    for (sample, low) in samples.iter_mut().zip(low) {
        *sample += gain * low;
    }
    Ok(samples)
}

/// Feedback echo: `out[i] += decay * feedback * out[i - delay]`, scanned
/// left to right so each echo feeds the next one.
///
/// `decay * feedback >= 1` grows without bound; that is left to the final
/// normalisation.
pub fn add_echo(
    mut samples: Vec<f32>,
    sample_rate: u32,
    delay_seconds: f32,
    decay: f32,
    feedback: f32,
) -> Vec<f32> {
    let delay = seconds_to_samples(delay_seconds, sample_rate);
    let gain = decay * feedback;
    for i in delay..samples.len() {
        let echoed = samples[i - delay];
        samples[i] += gain * echoed;
    }
    samples
}

/// Convolves the input with a fresh noise impulse response scaled by
/// `strength` and mixes the result on top of the dry signal.
pub fn add_reverb<R: Rng + ?Sized>(
    mut samples: Vec<f32>,
    sample_rate: u32,
    strength: f32,
    rng: &mut R,
) -> Result<Vec<f32>> {
    let taps = seconds_to_samples(REVERB_IR_SECONDS, sample_rate);
    let impulse: Vec<f32> = (0..taps).map(|_| gaussian(rng) * strength).collect();
    let wet = convolve_same(&samples, &impulse)?;
    for (sample, wet) in samples.iter_mut().zip(wet) {
        *sample += wet;
    }
    Ok(samples)
}

/// Linear fade in over the head and fade out over the tail. The fade is
/// capped at half the buffer so the two ramps never overlap.
pub fn add_fade(mut samples: Vec<f32>, sample_rate: u32, fade_duration: f32) -> Vec<f32> {
    let len = samples.len();
    let fade = seconds_to_samples(fade_duration, sample_rate).min(len / 2);
    if fade == 0 {
        return samples;
    }

    for (sample, gain) in samples[..fade].iter_mut().zip(linspace(0.0, 1.0, fade)) {
        *sample *= gain;
    }
    for (sample, gain) in samples[len - fade..].iter_mut().zip(linspace(1.0, 0.0, fade)) {
        *sample *= gain;
    }
    samples
}

/// Ducks `[drop_time, drop_time + drop_duration)` to [`DROP_ATTENUATION`].
pub fn beat_drop(
    mut samples: Vec<f32>,
    sample_rate: u32,
    drop_time: f32,
    drop_duration: f32,
) -> Vec<f32> {
    let start = seconds_to_samples(drop_time, sample_rate);
    if start >= samples.len() {
        return samples;
    }
    let end = start
        .saturating_add(seconds_to_samples(drop_duration, sample_rate))
        .min(samples.len());
    for sample in &mut samples[start..end] {
        *sample *= DROP_ATTENUATION;
    }
    samples
}

/// Splits the buffer into a louder left and a quieter right channel. Mono
/// input is duplicated first.
pub fn stereo_widen(buffer: SampleBuffer) -> StereoBuffer {
    let StereoBuffer {
        mut left,
        mut right,
    } = match buffer {
        SampleBuffer::Mono(samples) => StereoBuffer::duplicate(samples),
        SampleBuffer::Stereo(stereo) => stereo,
    };
    left.iter_mut().for_each(|s| *s *= WIDEN_LEFT_GAIN);
    right.iter_mut().for_each(|s| *s *= WIDEN_RIGHT_GAIN);
    StereoBuffer::new(left, right)
}
