//! Core library for MoodMix.
//!
//! Two entry points share one set of DSP building blocks: the
//! [`RemixPipeline`] runs a decoded recording through a fixed effect chain,
//! and the [`MoodSynth`] renders a short clip from oscillators, noise
//! percussion and an ADSR envelope. Everything works on fully materialised
//! buffers; randomness is always drawn from a caller supplied generator so
//! runs can be reproduced.

pub mod buffer;
pub mod codec;
pub mod config;
pub mod effects;
pub mod error;
pub mod mood;
pub mod remix;
pub mod stretch;
pub mod synth;

pub use buffer::{AudioClip, SampleBuffer, StereoBuffer};
pub use config::{AppConfig, MoodSettings, RemixParams};
pub use error::{MoodMixError, Result};
pub use mood::{MoodCatalog, MoodProfile, MoodSynth, DEFAULT_MOOD};
pub use remix::RemixPipeline;
pub use stretch::{PhaseVocoder, TimePitch};
pub use synth::Adsr;
