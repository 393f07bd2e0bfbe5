//! Butterworth low-pass built from cascaded `biquad` sections.

use std::f64::consts::PI;

use biquad::{Biquad, Coefficients, DirectForm2Transposed, Hertz, Type, Q_BUTTERWORTH_F64};

use crate::{MoodMixError, Result};

/// Upper bound on the normalised cutoff so the bilinear transform stays
/// well defined.
const MAX_NORMALISED_CUTOFF: f64 = 0.999;

/// Recursive Butterworth low-pass of arbitrary order.
///
/// Even orders are a cascade of second-order sections at the Butterworth Q
/// values; odd orders add one first-order section. The cutoff is expressed
/// in Hz and normalised against the Nyquist frequency of `sample_rate`.
#[derive(Debug, Clone)]
pub struct ButterworthLowpass {
    sections: Vec<DirectForm2Transposed<f64>>,
    first_order: Option<DirectForm2Transposed<f64>>,
}

impl ButterworthLowpass {
    pub fn new(order: usize, cutoff_hz: f32, sample_rate: u32) -> Result<Self> {
        let fs = sample_rate.max(1) as f64;
        let normalised = (cutoff_hz as f64 / (fs * 0.5)).clamp(f64::EPSILON, MAX_NORMALISED_CUTOFF);
        let f0 = hertz(normalised * fs * 0.5)?;
        let fs = hertz(fs)?;

        let sections = (0..order / 2)
            .map(|k| {
                let angle = (2 * k + 1) as f64 * PI / (2 * order) as f64;
                section(Type::LowPass, fs, f0, 1.0 / (2.0 * angle.sin()))
            })
            .collect::<Result<Vec<_>>>()?;
        let first_order = if order % 2 == 1 {
            Some(section(Type::SinglePoleLowPass, fs, f0, Q_BUTTERWORTH_F64)?)
        } else {
            None
        };

        Ok(Self {
            sections,
            first_order,
        })
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let mut value = input;
        if let Some(pole) = self.first_order.as_mut() {
            value = pole.run(value);
        }
        for section in &mut self.sections {
            value = section.run(value);
        }
        value
    }

    /// Runs a whole buffer through the filter starting from rest.
    pub fn filter(&mut self, samples: &[f32]) -> Vec<f32> {
        samples
            .iter()
            .map(|&sample| self.process(sample as f64) as f32)
            .collect()
    }
}

fn hertz(value: f64) -> Result<Hertz<f64>> {
    Hertz::<f64>::from_hz(value)
        .map_err(|err| MoodMixError::invalid(format!("bad filter frequency {value}: {err:?}")))
}

fn section(
    kind: Type<f64>,
    fs: Hertz<f64>,
    f0: Hertz<f64>,
    q: f64,
) -> Result<DirectForm2Transposed<f64>> {
    let coefficients = Coefficients::<f64>::from_params(kind, fs, f0, q)
        .map_err(|err| MoodMixError::invalid(format!("bad low-pass design: {err:?}")))?;
    Ok(DirectForm2Transposed::<f64>::new(coefficients))
}
