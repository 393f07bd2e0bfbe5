use realfft::RealFftPlanner;

use crate::Result;

/// Full linear convolution (`signal.len() + kernel.len() - 1` samples)
/// computed block-wise with FFT overlap-add.
pub fn convolve_full(signal: &[f32], kernel: &[f32]) -> Result<Vec<f32>> {
    if signal.is_empty() || kernel.is_empty() {
        return Ok(Vec::new());
    }

    let taps = kernel.len();
    let fft_len = (2 * taps).next_power_of_two();
    let block = fft_len - taps + 1;

    let mut planner = RealFftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut kernel_input = forward.make_input_vec();
    kernel_input[..taps].copy_from_slice(kernel);
    let mut kernel_spectrum = forward.make_output_vec();
    forward.process(&mut kernel_input, &mut kernel_spectrum)?;

    let mut input = forward.make_input_vec();
    let mut spectrum = forward.make_output_vec();
    let mut output = inverse.make_output_vec();
    let scale = 1.0 / fft_len as f32;

    let mut result = vec![0.0_f32; signal.len() + taps - 1];
    for start in (0..signal.len()).step_by(block) {
        let end = (start + block).min(signal.len());
        input.fill(0.0);
        input[..end - start].copy_from_slice(&signal[start..end]);

        forward.process(&mut input, &mut spectrum)?;
        for (bin, k) in spectrum.iter_mut().zip(&kernel_spectrum) {
            *bin *= *k;
        }
        // DC and Nyquist bins of a real signal carry no imaginary part.
        spectrum[0].im = 0.0;
        if let Some(last) = spectrum.last_mut() {
            last.im = 0.0;
        }
        inverse.process(&mut spectrum, &mut output)?;

        let produced = end - start + taps - 1;
        for (slot, value) in result[start..start + produced].iter_mut().zip(&output) {
            *slot += value * scale;
        }
    }

    Ok(result)
}

/// Convolution trimmed to the length of `signal`, centred on the kernel.
pub fn convolve_same(signal: &[f32], kernel: &[f32]) -> Result<Vec<f32>> {
    if kernel.is_empty() {
        return Ok(vec![0.0; signal.len()]);
    }
    let full = convolve_full(signal, kernel)?;
    let offset = (kernel.len() - 1) / 2;
    Ok(full
        .get(offset..offset + signal.len())
        .map(<[f32]>::to_vec)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0; signal.len() + kernel.len() - 1];
        for (i, s) in signal.iter().enumerate() {
            for (j, k) in kernel.iter().enumerate() {
                out[i + j] += s * k;
            }
        }
        out
    }

    #[test]
    fn matches_direct_convolution_across_blocks() {
        let signal: Vec<f32> = (0..257).map(|i| ((i * 7) % 13) as f32 - 6.0).collect();
        let kernel = [0.5, -0.25, 0.125, 1.0, 0.0, -0.5, 0.3];

        let fast = convolve_full(&signal, &kernel).unwrap();
        let slow = direct(&signal, &kernel);
        assert_eq!(fast.len(), slow.len());
        for (a, b) in fast.iter().zip(&slow) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn same_mode_is_centred() {
        let signal = [1.0, 2.0, 3.0, 4.0];
        let kernel = [1.0, 1.0, 1.0];
        let out = convolve_same(&signal, &kernel).unwrap();
        let expected = [3.0, 6.0, 9.0, 7.0];
        assert_eq!(out.len(), signal.len());
        for (a, b) in out.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn same_mode_keeps_length_for_long_kernels() {
        let out = convolve_same(&[1.0, 0.0], &[0.0; 9]).unwrap();
        assert_eq!(out, vec![0.0, 0.0]);
    }

    #[test]
    fn empty_inputs() {
        assert!(convolve_full(&[], &[1.0]).unwrap().is_empty());
        assert_eq!(convolve_same(&[1.0, 2.0], &[]).unwrap(), vec![0.0, 0.0]);
    }
}
