use std::path::Path;

use rand::Rng;

use crate::{
    buffer::{normalize, AudioClip, SampleBuffer, StereoBuffer},
    codec,
    config::RemixParams,
    effects::{add_echo, add_fade, add_reverb, bass_boost, beat_drop, stereo_widen},
    stretch::{PhaseVocoder, TimePitch},
    Result,
};

/// Fixed effect chain applied to a decoded recording.
///
/// Stage order: time-stretch, pitch-shift, bass boost, echo, reverb, beat
/// drop, fade, normalise, stereo widen. Normalisation runs exactly once,
/// after every stage that can push peaks past full scale.
#[derive(Debug)]
pub struct RemixPipeline<T = PhaseVocoder> {
    params: RemixParams,
    time_pitch: T,
}

impl RemixPipeline<PhaseVocoder> {
    pub fn new(params: RemixParams) -> Self {
        Self::with_time_pitch(params, PhaseVocoder::new())
    }
}

impl<T: TimePitch> RemixPipeline<T> {
    /// Creates a pipeline that delegates tempo and pitch changes to
    /// `time_pitch`.
    pub fn with_time_pitch(params: RemixParams, time_pitch: T) -> Self {
        Self { params, time_pitch }
    }

    pub fn params(&self) -> &RemixParams {
        &self.params
    }

    /// Runs the whole chain on an in-memory clip. The clip is mixed down to
    /// mono first; the result is stereo at the input sample rate.
    pub fn process<R: Rng + ?Sized>(
        &mut self,
        clip: AudioClip,
        rng: &mut R,
    ) -> Result<StereoBuffer> {
        let AudioClip {
            buffer,
            sample_rate,
        } = clip;
        let p = &self.params;
        let samples = buffer.into_mono();

        tracing::info!(rate = p.speed, "changing speed");
        let samples = self.time_pitch.time_stretch(samples, p.speed)?;

        tracing::info!(semitones = p.pitch_semitones, "shifting pitch");
        let samples = self
            .time_pitch
            .pitch_shift(samples, sample_rate, p.pitch_semitones)?;

        tracing::info!(gain = p.bass_gain, cutoff_hz = p.bass_cutoff_hz, "boosting bass");
        let samples = bass_boost(samples, sample_rate, p.bass_gain, p.bass_cutoff_hz)?;

        tracing::info!(delay = p.echo_delay, decay = p.echo_decay, "adding echo");
        if p.echo_decay * p.echo_feedback >= 1.0 {
            tracing::warn!(
                decay = p.echo_decay,
                feedback = p.echo_feedback,
                "echo loop gain is at least one, output will grow until normalised"
            );
        }
        let samples = add_echo(samples, sample_rate, p.echo_delay, p.echo_decay, p.echo_feedback);

        tracing::info!(strength = p.reverb_strength, "adding reverb");
        let samples = add_reverb(samples, sample_rate, p.reverb_strength, rng)?;

        tracing::info!(at = p.drop_time, duration = p.drop_duration, "adding beat drop");
        let samples = beat_drop(samples, sample_rate, p.drop_time, p.drop_duration);

        tracing::info!(duration = p.fade_duration, "adding fades");
        let samples = add_fade(samples, sample_rate, p.fade_duration);

        tracing::info!(peak = p.peak, "normalising");
        let samples = normalize(samples, p.peak);

        Ok(stereo_widen(SampleBuffer::Mono(samples)))
    }

    /// Decodes `input`, remixes it and writes a stereo WAV to `output`.
    pub fn remix_file<R: Rng + ?Sized>(
        &mut self,
        input: &Path,
        output: &Path,
        rng: &mut R,
    ) -> Result<AudioClip> {
        tracing::info!(?input, "loading audio");
        let clip = codec::read_wav(input)?;
        let sample_rate = clip.sample_rate;
        tracing::debug!(
            channels = clip.buffer.channels(),
            seconds = clip.duration_seconds(),
            sample_rate,
            "input decoded"
        );

        let stereo = self.process(clip, rng)?;

        tracing::info!(?output, "saving remixed track");
        codec::write_wav(output, &stereo, sample_rate)?;
        Ok(AudioClip::new(SampleBuffer::Stereo(stereo), sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{buffer::peak, MoodMixError};

    /// Records the calls it receives and leaves the audio untouched.
    #[derive(Debug, Default)]
    struct Passthrough {
        calls: Vec<String>,
    }

    impl TimePitch for Passthrough {
        fn time_stretch(&mut self, samples: Vec<f32>, rate: f32) -> Result<Vec<f32>> {
            self.calls.push(format!("stretch {rate}"));
            Ok(samples)
        }

        fn pitch_shift(
            &mut self,
            samples: Vec<f32>,
            sample_rate: u32,
            semitones: f32,
        ) -> Result<Vec<f32>> {
            self.calls.push(format!("pitch {sample_rate} {semitones}"));
            Ok(samples)
        }
    }

    fn tone_clip(sample_rate: u32, seconds: f32) -> AudioClip {
        let len = (sample_rate as f32 * seconds) as usize;
        let samples = (0..len)
            .map(|i| (i as f32 * 0.05).sin() * 0.5)
            .collect();
        AudioClip::new(SampleBuffer::Mono(samples), sample_rate)
    }

    fn short_params() -> RemixParams {
        RemixParams {
            drop_time: 1.0,
            drop_duration: 0.5,
            fade_duration: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn runs_stages_in_order() {
        let clip = tone_clip(4_000, 3.0);
        let params = short_params();
        let mut pipeline = RemixPipeline::with_time_pitch(params.clone(), Passthrough::default());
        let out = pipeline
            .process(clip.clone(), &mut StdRng::seed_from_u64(8))
            .unwrap();

        let sr = clip.sample_rate;
        let mut rng = StdRng::seed_from_u64(8);
        let manual = clip.buffer.into_mono();
        let manual = bass_boost(manual, sr, params.bass_gain, params.bass_cutoff_hz).unwrap();
        let manual = add_echo(
            manual,
            sr,
            params.echo_delay,
            params.echo_decay,
            params.echo_feedback,
        );
        let manual = add_reverb(manual, sr, params.reverb_strength, &mut rng).unwrap();
        let manual = beat_drop(manual, sr, params.drop_time, params.drop_duration);
        let manual = add_fade(manual, sr, params.fade_duration);
        let manual = normalize(manual, params.peak);
        let expected = stereo_widen(SampleBuffer::Mono(manual));

        assert_eq!(out, expected);
        assert_eq!(
            pipeline.time_pitch.calls,
            vec!["stretch 1.2".to_string(), "pitch 4000 2".to_string()]
        );
    }

    #[test]
    fn output_is_normalised_before_widening() {
        let mut pipeline = RemixPipeline::with_time_pitch(short_params(), Passthrough::default());
        let out = pipeline
            .process(tone_clip(4_000, 3.0), &mut StdRng::seed_from_u64(2))
            .unwrap();

        assert_eq!(out.left.len(), 12_000);
        assert!((peak(&out.left) - 0.95 * 1.1).abs() < 1e-4);
        assert!((peak(&out.right) - 0.95 * 0.9).abs() < 1e-4);
    }

    #[test]
    fn silent_input_stays_silent() {
        let clip = AudioClip::new(SampleBuffer::Mono(vec![0.0; 8_000]), 4_000);
        let mut pipeline = RemixPipeline::with_time_pitch(short_params(), Passthrough::default());
        let out = pipeline.process(clip, &mut StdRng::seed_from_u64(2)).unwrap();
        assert!(out.peak() < 1e-6);
    }

    #[test]
    fn stereo_input_is_mixed_down() {
        let left: Vec<f32> = (0..4_000).map(|i| (i as f32 * 0.1).sin()).collect();
        let clip = AudioClip::new(
            SampleBuffer::Stereo(StereoBuffer::new(left.clone(), left)),
            2_000,
        );
        let mut pipeline = RemixPipeline::with_time_pitch(short_params(), Passthrough::default());
        let out = pipeline.process(clip, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(out.len(), 4_000);
    }

    #[test]
    fn phase_vocoder_changes_duration() {
        let params = RemixParams {
            speed: 2.0,
            pitch_semitones: -3.0,
            ..short_params()
        };
        let mut pipeline = RemixPipeline::new(params);
        let out = pipeline
            .process(tone_clip(8_000, 3.0), &mut StdRng::seed_from_u64(6))
            .unwrap();
        assert_eq!(out.len(), 12_000);
        assert!(out.left.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn remixes_files_end_to_end() {
        let dir = std::env::temp_dir();
        let input = dir.join(format!("moodmix-remix-in-{}.wav", std::process::id()));
        let output = dir.join(format!("moodmix-remix-out-{}.wav", std::process::id()));

        let AudioClip { buffer, sample_rate } = tone_clip(4_000, 3.0);
        let SampleBuffer::Mono(samples) = buffer else {
            unreachable!()
        };
        codec::write_wav(&input, &StereoBuffer::duplicate(samples), sample_rate).unwrap();

        let mut pipeline = RemixPipeline::with_time_pitch(short_params(), Passthrough::default());
        let rendered = pipeline
            .remix_file(&input, &output, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(rendered.sample_rate, 4_000);

        let written = codec::read_wav(&output).unwrap();
        assert_eq!(written.buffer.channels(), 2);
        assert_eq!(written.buffer.len(), rendered.buffer.len());

        std::fs::remove_file(input).ok();
        std::fs::remove_file(output).ok();
    }

    #[test]
    fn unreadable_input_surfaces_decode_error() {
        let mut pipeline = RemixPipeline::new(RemixParams::default());
        let err = pipeline
            .remix_file(
                Path::new("/nonexistent/song.wav"),
                &std::env::temp_dir().join("moodmix-never-written.wav"),
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap_err();
        assert!(matches!(err, MoodMixError::Decode(_)));
    }
}
