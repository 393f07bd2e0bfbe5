//! Mood catalog and the additive synthesis engine that renders a clip for a
//! mood.

use std::{collections::BTreeMap, path::Path};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    buffer::{normalize, time_vector, StereoBuffer},
    codec,
    config::MoodSettings,
    synth::{drum_track, tone},
    Result,
};

/// Key used when a requested mood is not in the catalog.
pub const DEFAULT_MOOD: &str = "calm";

/// Oscillator layers as `(name, frequency multiple of the base, amplitude)`.
const LAYERS: [(&str, f32, f32); 5] = [
    ("melody", 1.0, 0.3),
    ("melody", 1.25, 0.2),
    ("melody", 1.5, 0.2),
    ("pad", 0.5, 0.15),
    ("bass", 0.25, 0.25),
];

/// Base pitch and tempo for one mood.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodProfile {
    pub base_frequency: f32,
    pub tempo_bpm: f32,
}

impl MoodProfile {
    pub const fn new(base_frequency: f32, tempo_bpm: f32) -> Self {
        Self {
            base_frequency,
            tempo_bpm,
        }
    }
}

impl Default for MoodProfile {
    fn default() -> Self {
        Self::new(330.0, 70.0)
    }
}

/// Immutable table of mood profiles keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodCatalog {
    profiles: BTreeMap<String, MoodProfile>,
    fallback: String,
}

impl Default for MoodCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MoodCatalog {
    pub fn new(profiles: BTreeMap<String, MoodProfile>, fallback: impl Into<String>) -> Self {
        Self {
            profiles,
            fallback: fallback.into(),
        }
    }

    /// The stock set of twelve moods with `calm` as the fallback.
    pub fn builtin() -> Self {
        let profiles = [
            ("happy", 440.0, 120.0),
            ("sad", 220.0, 60.0),
            ("energetic", 660.0, 140.0),
            ("calm", 330.0, 70.0),
            ("romantic", 350.0, 75.0),
            ("dark", 180.0, 65.0),
            ("lofi", 300.0, 85.0),
            ("epic", 500.0, 110.0),
            ("chill", 280.0, 90.0),
            ("focus", 400.0, 100.0),
            ("uplifting", 480.0, 125.0),
            ("mysterious", 210.0, 80.0),
        ]
        .into_iter()
        .map(|(name, base, bpm)| (name.to_string(), MoodProfile::new(base, bpm)))
        .collect();

        Self::new(profiles, DEFAULT_MOOD)
    }

    pub fn get(&self, mood: &str) -> Option<&MoodProfile> {
        self.profiles.get(mood)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Looks up `mood`, degrading to the fallback entry for unknown keys.
    /// Returns the key that was actually used.
    pub fn resolve<'a>(&'a self, mood: &'a str) -> (&'a str, MoodProfile) {
        if let Some(profile) = self.profiles.get(mood) {
            return (mood, *profile);
        }
        tracing::warn!(mood, fallback = %self.fallback, "unknown mood, using fallback");
        let profile = self
            .profiles
            .get(&self.fallback)
            .copied()
            .unwrap_or_default();
        (self.fallback.as_str(), profile)
    }

    /// All entries sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MoodProfile)> {
        self.profiles.iter().map(|(name, profile)| (name.as_str(), profile))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Renders short clips from a [`MoodCatalog`].
#[derive(Debug, Clone)]
pub struct MoodSynth {
    catalog: MoodCatalog,
    settings: MoodSettings,
}

impl MoodSynth {
    pub fn new(catalog: MoodCatalog, settings: MoodSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn catalog(&self) -> &MoodCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &MoodSettings {
        &self.settings
    }

    /// Synthesises `duration` seconds for `mood`: oscillator layers plus
    /// percussion, shaped, normalised and split to stereo.
    pub fn render<R: Rng + ?Sized>(
        &self,
        mood: &str,
        duration: f32,
        rng: &mut R,
    ) -> StereoBuffer {
        let (resolved, profile) = self.catalog.resolve(mood);
        let sample_rate = self.settings.sample_rate;
        tracing::info!(
            mood = resolved,
            base_hz = profile.base_frequency,
            bpm = profile.tempo_bpm,
            duration,
            sample_rate,
            "synthesising mood clip"
        );

        let t = time_vector(sample_rate, duration);
        let mut mix = vec![0.0_f32; t.len()];
        for (layer, multiple, amplitude) in LAYERS {
            let frequency = profile.base_frequency * multiple;
            tracing::debug!(layer, frequency, amplitude, "adding oscillator");
            for (slot, value) in mix.iter_mut().zip(tone(frequency, &t, amplitude)) {
                *slot += value;
            }
        }

        tracing::debug!(bpm = profile.tempo_bpm, "adding percussion");
        let drums = drum_track(&t, sample_rate, profile.tempo_bpm, rng);
        for (slot, hit) in mix.iter_mut().zip(drums) {
            *slot += hit;
        }

        let shaped = self.settings.envelope.apply(mix, sample_rate);
        let left = normalize(shaped, self.settings.peak);
        let right = left.iter().map(|s| s * self.settings.right_gain).collect();
        StereoBuffer::new(left, right)
    }

    /// Renders a clip and writes it as a stereo WAV file.
    pub fn render_to_file<R: Rng + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        mood: &str,
        duration: f32,
        rng: &mut R,
    ) -> Result<StereoBuffer> {
        let stereo = self.render(mood, duration, rng);
        codec::write_wav(path.as_ref(), &stereo, self.settings.sample_rate)?;
        tracing::info!(path = ?path.as_ref(), frames = stereo.len(), "mood clip saved");
        Ok(stereo)
    }
}
