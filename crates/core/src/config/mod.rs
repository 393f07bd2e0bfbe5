use std::{ops::RangeInclusive, path::Path};

use serde::{Deserialize, Serialize};

use crate::{mood::MoodCatalog, synth::Adsr, MoodMixError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub remix: RemixParams,
    pub mood: MoodSettings,
    pub moods: MoodCatalog,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections fall back to their
    /// defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Knobs for one remix run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemixParams {
    /// Playback speed ratio; values above one shorten the track.
    pub speed: f32,
    pub pitch_semitones: f32,
    pub bass_gain: f32,
    pub bass_cutoff_hz: f32,
    pub reverb_strength: f32,
    pub echo_delay: f32,
    pub echo_decay: f32,
    pub echo_feedback: f32,
    pub drop_time: f32,
    pub drop_duration: f32,
    pub fade_duration: f32,
    /// Peak level after normalisation.
    pub peak: f32,
}

impl Default for RemixParams {
    fn default() -> Self {
        Self {
            speed: 1.2,
            pitch_semitones: 2.0,
            bass_gain: 1.4,
            bass_cutoff_hz: 150.0,
            reverb_strength: 0.2,
            echo_delay: 0.25,
            echo_decay: 0.6,
            echo_feedback: 0.4,
            drop_time: 5.0,
            drop_duration: 1.0,
            fade_duration: 2.0,
            peak: 0.95,
        }
    }
}

impl RemixParams {
    /// Rejects values outside the ranges exposed to users. The effect stages
    /// themselves accept anything.
    pub fn validate(&self) -> Result<()> {
        check("speed", self.speed, 0.5..=2.0)?;
        check("pitch", self.pitch_semitones, -12.0..=12.0)?;
        check("bass gain", self.bass_gain, 1.0..=3.0)?;
        check("bass cutoff", self.bass_cutoff_hz, 20.0..=1_000.0)?;
        check("reverb strength", self.reverb_strength, 0.0..=1.0)?;
        check("echo delay", self.echo_delay, 0.1..=1.0)?;
        check("echo decay", self.echo_decay, 0.1..=1.0)?;
        check("echo feedback", self.echo_feedback, 0.0..=1.0)?;
        check("drop time", self.drop_time, 0.0..=f32::MAX)?;
        check("drop duration", self.drop_duration, 0.0..=f32::MAX)?;
        check("fade duration", self.fade_duration, 0.0..=f32::MAX)?;
        check("peak", self.peak, 0.0..=1.0)
    }
}

/// Rendering settings for the mood generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodSettings {
    pub duration: f32,
    pub sample_rate: u32,
    pub envelope: Adsr,
    /// Peak level after normalisation.
    pub peak: f32,
    /// Gain of the right channel relative to the left.
    pub right_gain: f32,
}

impl Default for MoodSettings {
    fn default() -> Self {
        Self {
            duration: 8.0,
            sample_rate: 22_050,
            envelope: Adsr::default(),
            peak: 0.9,
            right_gain: 0.95,
        }
    }
}

impl MoodSettings {
    pub fn validate(&self) -> Result<()> {
        check("duration", self.duration, 3.0..=30.0)?;
        if self.sample_rate == 0 {
            return Err(MoodMixError::invalid("sample rate must be positive"));
        }
        check("sustain level", self.envelope.sustain, 0.0..=1.0)?;
        check("peak", self.peak, 0.0..=1.0)?;
        check("right channel gain", self.right_gain, 0.0..=1.0)
    }
}

fn check(name: &str, value: f32, range: RangeInclusive<f32>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(MoodMixError::invalid(format!(
            "{name} must be within {}..={}, got {value}",
            range.start(),
            range.end()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.remix.validate().unwrap();
        config.mood.validate().unwrap();
        assert_eq!(config.moods.fallback(), "calm");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{ "remix": { "speed": 0.8 } }"#).unwrap();
        assert_eq!(config.remix.speed, 0.8);
        assert_eq!(config.remix.echo_feedback, 0.4);
        assert_eq!(config.mood.sample_rate, 22_050);
        assert!(config.moods.get("happy").is_some());
    }

    #[test]
    fn round_trips_through_json() {
        let config = AppConfig::default();
        let parsed = AppConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed.remix, config.remix);
        assert_eq!(parsed.mood, config.mood);
        assert_eq!(parsed.moods, config.moods);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let params = RemixParams {
            speed: 3.0,
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert!(format!("{err}").contains("speed"));

        let params = RemixParams {
            echo_decay: f32::NAN,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let settings = MoodSettings {
            duration: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(MoodMixError::InvalidInput(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            AppConfig::from_json("{ not json"),
            Err(MoodMixError::Config(_))
        ));
    }
}
