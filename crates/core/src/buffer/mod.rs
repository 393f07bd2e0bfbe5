/// Two channel-aligned sample sequences of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoBuffer {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl StereoBuffer {
    pub fn new(left: Vec<f32>, right: Vec<f32>) -> Self {
        debug_assert_eq!(left.len(), right.len(), "channels must stay aligned");
        Self { left, right }
    }

    /// Duplicates a mono sequence onto both channels.
    pub fn duplicate(samples: Vec<f32>) -> Self {
        Self {
            left: samples.clone(),
            right: samples,
        }
    }

    /// Number of frames (samples per channel).
    pub fn len(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interleaves the channels into `L R L R ...` frame order.
    pub fn interleave(&self) -> Vec<f32> {
        let mut frames = Vec::with_capacity(self.len() * 2);
        for (left, right) in self.left.iter().zip(&self.right) {
            frames.push(*left);
            frames.push(*right);
        }
        frames
    }

    /// Largest absolute amplitude across both channels.
    pub fn peak(&self) -> f32 {
        peak(&self.left).max(peak(&self.right))
    }
}

/// A buffer of floating point amplitudes at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    Mono(Vec<f32>),
    Stereo(StereoBuffer),
}

impl SampleBuffer {
    pub fn channels(&self) -> u16 {
        match self {
            SampleBuffer::Mono(_) => 1,
            SampleBuffer::Stereo(_) => 2,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::Mono(samples) => samples.len(),
            SampleBuffer::Stereo(stereo) => stereo.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collapses the buffer to a single channel by averaging left and right.
    pub fn into_mono(self) -> Vec<f32> {
        match self {
            SampleBuffer::Mono(samples) => samples,
            SampleBuffer::Stereo(StereoBuffer { left, right }) => left
                .iter()
                .zip(&right)
                .map(|(l, r)| (l + r) * 0.5)
                .collect(),
        }
    }
}

/// Decoded audio together with the rate it should be played back at.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub buffer: SampleBuffer,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(buffer: SampleBuffer, sample_rate: u32) -> Self {
        Self {
            buffer,
            sample_rate,
        }
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.buffer.len() as f32 / self.sample_rate as f32
    }
}

/// `count` evenly spaced values from `start` to `end`, both ends included.
pub fn linspace(start: f32, end: f32, count: usize) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end as f64 - start as f64) / (count - 1) as f64;
            let mut values: Vec<f32> = (0..count)
                .map(|i| (start as f64 + step * i as f64) as f32)
                .collect();
            values[count - 1] = end;
            values
        }
    }
}

/// Converts a span in seconds to a whole number of samples, truncating.
/// Negative or NaN spans map to zero.
pub fn seconds_to_samples(seconds: f32, sample_rate: u32) -> usize {
    (seconds * sample_rate as f32).max(0.0) as usize
}

/// Time offsets in seconds for a clip of `duration` seconds.
pub fn time_vector(sample_rate: u32, duration: f32) -> Vec<f32> {
    linspace(0.0, duration, seconds_to_samples(duration, sample_rate))
}

/// Largest absolute amplitude in the buffer, `0.0` when empty.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
}

/// Rescales the buffer so its peak sits at `target`. Silent buffers are
/// returned untouched.
pub fn normalize(mut samples: Vec<f32>, target: f32) -> Vec<f32> {
    let max = peak(&samples);
    if max > 0.0 {
        let scale = target / max;
        for sample in &mut samples {
            *sample *= scale;
        }
    }
    samples
}
