//! Time-scale modification and pitch shifting.
//!
//! The remix pipeline only talks to the [`TimePitch`] trait. The bundled
//! [`PhaseVocoder`] implements it with an STFT phase vocoder: time-stretch
//! re-spaces analysis frames while keeping phase coherent, pitch-shift
//! stretches and then resamples back to the original length.

use std::{f64::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, ComplexToReal, RealFftPlanner, RealToComplex};

use crate::{MoodMixError, Result};

pub const DEFAULT_FFT_SIZE: usize = 2048;
pub const DEFAULT_HOP: usize = 512;

/// Tempo and pitch collaborator used by the remix pipeline.
pub trait TimePitch {
    /// Changes duration without changing pitch. `rate > 1` shortens the clip.
    fn time_stretch(&mut self, samples: Vec<f32>, rate: f32) -> Result<Vec<f32>>;

    /// Moves the pitch by `semitones` (negative or fractional allowed) and
    /// keeps the length of the input.
    fn pitch_shift(
        &mut self,
        samples: Vec<f32>,
        sample_rate: u32,
        semitones: f32,
    ) -> Result<Vec<f32>>;
}

/// STFT phase vocoder with a Hann analysis/synthesis window.
pub struct PhaseVocoder {
    fft_size: usize,
    hop: usize,
    window: Vec<f32>,
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
}

impl Default for PhaseVocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseVocoder {
    pub fn new() -> Self {
        Self::with_frame(DEFAULT_FFT_SIZE, DEFAULT_HOP)
    }

    /// Builds a vocoder with an explicit frame and hop size. The frame size is
    /// rounded up to an even number.
    pub fn with_frame(fft_size: usize, hop: usize) -> Self {
        let fft_size = fft_size.max(2).next_multiple_of(2);
        let hop = hop.clamp(1, fft_size);
        let mut planner = RealFftPlanner::<f32>::new();
        Self {
            fft_size,
            hop,
            window: hann_window(fft_size),
            forward: planner.plan_fft_forward(fft_size),
            inverse: planner.plan_fft_inverse(fft_size),
        }
    }

    fn stretch(&self, samples: &[f32], rate: f64) -> Result<Vec<f32>> {
        let expected = (samples.len() as f64 / rate).round() as usize;
        if samples.is_empty() || expected == 0 {
            return Ok(vec![0.0; expected]);
        }

        let frames = self.analyse(samples)?;
        let stretched = self.advance_phases(&frames, rate);
        self.synthesise(&stretched, expected)
    }

    fn analyse(&self, samples: &[f32]) -> Result<Vec<Vec<Complex32>>> {
        let pad = self.fft_size / 2;
        let mut padded = vec![0.0_f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let count = 1 + (padded.len() - self.fft_size) / self.hop;
        let mut input = self.forward.make_input_vec();
        let mut scratch = self.forward.make_scratch_vec();
        let mut frames = Vec::with_capacity(count);

        for index in 0..count {
            let start = index * self.hop;
            let frame = &padded[start..start + self.fft_size];
            for ((slot, sample), w) in input.iter_mut().zip(frame).zip(&self.window) {
                *slot = sample * w;
            }
            let mut spectrum = self.forward.make_output_vec();
            self.forward
                .process_with_scratch(&mut input, &mut spectrum, &mut scratch)?;
            frames.push(spectrum);
        }

        Ok(frames)
    }

    fn advance_phases(&self, frames: &[Vec<Complex32>], rate: f64) -> Vec<Vec<Complex32>> {
        let bins = self.fft_size / 2 + 1;
        let expected_advance: Vec<f64> = (0..bins)
            .map(|k| 2.0 * PI * self.hop as f64 * k as f64 / self.fft_size as f64)
            .collect();
        let silent = vec![Complex32::new(0.0, 0.0); bins];

        let mut phase: Vec<f64> = frames[0].iter().map(|bin| bin.arg() as f64).collect();
        let mut output = Vec::new();
        let mut step = 0.0_f64;

        while step < frames.len() as f64 {
            let index = step as usize;
            let alpha = (step - index as f64) as f32;
            let current = frames.get(index).unwrap_or(&silent);
            let next = frames.get(index + 1).unwrap_or(&silent);

            let mut frame = Vec::with_capacity(bins);
            for k in 0..bins {
                let magnitude = (1.0 - alpha) * current[k].norm() + alpha * next[k].norm();
                let wrapped = phase[k].rem_euclid(2.0 * PI) as f32;
                frame.push(Complex32::from_polar(magnitude, wrapped));

                let mut delta =
                    next[k].arg() as f64 - current[k].arg() as f64 - expected_advance[k];
                delta -= 2.0 * PI * (delta / (2.0 * PI)).round();
                phase[k] += expected_advance[k] + delta;
            }
            output.push(frame);
            step += rate;
        }

        output
    }

    fn synthesise(&self, frames: &[Vec<Complex32>], length: usize) -> Result<Vec<f32>> {
        let total = self.fft_size + self.hop * frames.len().saturating_sub(1);
        let mut signal = vec![0.0_f32; total];
        let mut window_sum = vec![0.0_f32; total];

        let mut spectrum = self.inverse.make_input_vec();
        let mut output = self.inverse.make_output_vec();
        let mut scratch = self.inverse.make_scratch_vec();
        let scale = 1.0 / self.fft_size as f32;

        for (index, frame) in frames.iter().enumerate() {
            spectrum.copy_from_slice(frame);
            spectrum[0].im = 0.0;
            if let Some(last) = spectrum.last_mut() {
                last.im = 0.0;
            }
            self.inverse
                .process_with_scratch(&mut spectrum, &mut output, &mut scratch)?;

            let start = index * self.hop;
            for (offset, (value, w)) in output.iter().zip(&self.window).enumerate() {
                signal[start + offset] += value * scale * w;
                window_sum[start + offset] += w * w;
            }
        }

        for (sample, weight) in signal.iter_mut().zip(&window_sum) {
            if *weight > f32::MIN_POSITIVE {
                *sample /= weight;
            }
        }

        let pad = self.fft_size / 2;
        let mut trimmed: Vec<f32> = signal.into_iter().skip(pad).take(length).collect();
        trimmed.resize(length, 0.0);
        Ok(trimmed)
    }
}

impl TimePitch for PhaseVocoder {
    fn time_stretch(&mut self, samples: Vec<f32>, rate: f32) -> Result<Vec<f32>> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(MoodMixError::invalid(format!(
                "time-stretch rate must be positive, got {rate}"
            )));
        }
        if rate == 1.0 {
            return Ok(samples);
        }
        self.stretch(&samples, rate as f64)
    }

    fn pitch_shift(
        &mut self,
        samples: Vec<f32>,
        _sample_rate: u32,
        semitones: f32,
    ) -> Result<Vec<f32>> {
        if !semitones.is_finite() {
            return Err(MoodMixError::invalid(format!(
                "pitch shift must be finite, got {semitones}"
            )));
        }
        if semitones == 0.0 {
            return Ok(samples);
        }
        let rate = 2.0_f64.powf(-semitones as f64 / 12.0);
        let stretched = self.stretch(&samples, rate)?;
        Ok(resample_linear(&stretched, samples.len()))
    }
}

impl fmt::Debug for PhaseVocoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseVocoder")
            .field("fft_size", &self.fft_size)
            .field("hop", &self.hop)
            .finish()
    }
}

/// Periodic Hann window.
fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| (0.5 - 0.5 * (2.0 * PI * n as f64 / len as f64).cos()) as f32)
        .collect()
}

/// Linear-interpolation resampler that maps the whole input onto `length`
/// output samples.
pub fn resample_linear(samples: &[f32], length: usize) -> Vec<f32> {
    if samples.is_empty() {
        return vec![0.0; length];
    }
    let ratio = samples.len() as f64 / length.max(1) as f64;
    let last = samples.len() - 1;
    (0..length)
        .map(|i| {
            let position = i as f64 * ratio;
            let index = (position as usize).min(last);
            let frac = (position - index as f64) as f32;
            let next = samples[(index + 1).min(last)];
            samples[index] + (next - samples[index]) * frac
        })
        .collect()
}
