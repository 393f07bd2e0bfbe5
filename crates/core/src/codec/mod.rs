//! WAV decoding and encoding.

use std::{
    fs::File,
    io::{BufReader, Cursor, Read, Seek, Write},
    path::Path,
};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::{
    buffer::{AudioClip, SampleBuffer, StereoBuffer},
    MoodMixError, Result,
};

/// Bit depth of rendered files.
pub const OUTPUT_BITS: u16 = 16;

/// Opens and decodes a WAV file.
pub fn read_wav(path: &Path) -> Result<AudioClip> {
    let file = File::open(path)
        .map_err(|err| MoodMixError::Decode(format!("cannot open {}: {err}", path.display())))?;
    decode_wav(BufReader::new(file))
}

/// Decodes WAV data from any reader into a mono or stereo clip with samples
/// in `[-1, 1]`.
pub fn decode_wav<R: Read>(reader: R) -> Result<AudioClip> {
    let reader = WavReader::new(reader).map_err(decode_error)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(decode_error)?,
        SampleFormat::Int => {
            let full_scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 / full_scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(decode_error)?
        }
    };

    let buffer = match spec.channels {
        1 => SampleBuffer::Mono(interleaved),
        2 => {
            let (left, right) = interleaved
                .chunks_exact(2)
                .map(|frame| (frame[0], frame[1]))
                .unzip();
            SampleBuffer::Stereo(StereoBuffer::new(left, right))
        }
        other => {
            return Err(MoodMixError::Decode(format!(
                "unsupported channel count {other}"
            )))
        }
    };

    tracing::debug!(
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        frames = buffer.len(),
        "decoded wav"
    );
    Ok(AudioClip::new(buffer, spec.sample_rate))
}

/// Writes a stereo buffer as a 16-bit PCM WAV file.
pub fn write_wav(path: &Path, stereo: &StereoBuffer, sample_rate: u32) -> Result<()> {
    let writer = WavWriter::create(path, output_spec(sample_rate)).map_err(encode_error)?;
    write_frames(writer, stereo)
}

/// Encodes a stereo buffer into an in-memory WAV file.
pub fn encode_wav(stereo: &StereoBuffer, sample_rate: u32) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    let writer = WavWriter::new(&mut cursor, output_spec(sample_rate)).map_err(encode_error)?;
    write_frames(writer, stereo)?;
    Ok(cursor.into_inner())
}

fn output_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: OUTPUT_BITS,
        sample_format: SampleFormat::Int,
    }
}

fn write_frames<W: Write + Seek>(mut writer: WavWriter<W>, stereo: &StereoBuffer) -> Result<()> {
    for sample in stereo.interleave() {
        writer.write_sample(to_pcm16(sample)).map_err(encode_error)?;
    }
    writer.finalize().map_err(encode_error)
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn decode_error(err: hound::Error) -> MoodMixError {
    MoodMixError::Decode(err.to_string())
}

fn encode_error(err: hound::Error) -> MoodMixError {
    MoodMixError::Encode(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn decodes_mono_int_pcm() {
        let bytes = mono_wav(&[0, 16_384, -32_768], 8_000);
        let clip = decode_wav(Cursor::new(bytes)).unwrap();
        assert_eq!(clip.sample_rate, 8_000);
        match clip.buffer {
            SampleBuffer::Mono(samples) => assert_eq!(samples, vec![0.0, 0.5, -1.0]),
            other => panic!("expected mono, got {other:?}"),
        }
    }

    #[test]
    fn encoded_stereo_decodes_with_channels_intact() {
        let stereo = StereoBuffer::new(vec![0.5, -0.25, 2.0], vec![0.0, 1.0, -3.0]);
        let bytes = encode_wav(&stereo, 22_050).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");

        let clip = decode_wav(Cursor::new(bytes)).unwrap();
        assert_eq!(clip.sample_rate, 22_050);
        let SampleBuffer::Stereo(decoded) = clip.buffer else {
            panic!("expected stereo output");
        };
        assert!((decoded.left[0] - 0.5).abs() < 1e-3);
        assert!((decoded.left[1] + 0.25).abs() < 1e-3);
        // out of range values are clipped on write
        assert!((decoded.left[2] - 1.0).abs() < 1e-3);
        assert!((decoded.right[1] - 1.0).abs() < 1e-3);
        assert!((decoded.right[2] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn corrupt_input_is_a_decode_error() {
        let err = decode_wav(Cursor::new(b"definitely not a wav".to_vec())).unwrap_err();
        assert!(matches!(err, MoodMixError::Decode(_)));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = read_wav(Path::new("/nonexistent/input.wav")).unwrap_err();
        assert!(matches!(err, MoodMixError::Decode(_)));
    }

    #[test]
    fn writes_files_to_disk() {
        let path = std::env::temp_dir().join(format!("moodmix-codec-{}.wav", std::process::id()));
        let stereo = StereoBuffer::duplicate(vec![0.1; 64]);
        write_wav(&path, &stereo, 44_100).unwrap();

        let clip = read_wav(&path).unwrap();
        assert_eq!(clip.buffer.channels(), 2);
        assert_eq!(clip.buffer.len(), 64);
        std::fs::remove_file(path).ok();
    }
}
