use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use moodmix_core::{AppConfig, MoodSynth, RemixPipeline};
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn main() -> moodmix_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Remix {
            input,
            output,
            tweaks,
            seed,
        } => run_remix(config, &input, &output, tweaks, seed),
        Commands::Generate {
            output,
            mood,
            duration,
            sample_rate,
            seed,
        } => run_generate(config, &output, mood, duration, sample_rate, seed),
        Commands::Moods => {
            list_moods(&config);
            Ok(())
        }
    }
}

fn run_remix(
    mut config: AppConfig,
    input: &Path,
    output: &Path,
    tweaks: RemixArgs,
    seed: Option<u64>,
) -> moodmix_core::Result<()> {
    tweaks.apply(&mut config);
    config.remix.validate()?;
    tracing::info!(?input, ?output, params = ?config.remix, "running remix pipeline");

    let mut rng = make_rng(seed);
    let mut pipeline = RemixPipeline::new(config.remix);
    let clip = pipeline.remix_file(input, output, &mut rng)?;

    tracing::info!(seconds = clip.duration_seconds(), "remix complete");
    Ok(())
}

fn run_generate(
    mut config: AppConfig,
    output: &Path,
    mood: Option<String>,
    duration: Option<f32>,
    sample_rate: Option<u32>,
    seed: Option<u64>,
) -> moodmix_core::Result<()> {
    if let Some(duration) = duration {
        config.mood.duration = duration;
    }
    if let Some(sample_rate) = sample_rate {
        config.mood.sample_rate = sample_rate;
    }
    config.mood.validate()?;

    let mood = mood.unwrap_or_else(|| config.moods.fallback().to_string());
    let duration = config.mood.duration;
    let synth = MoodSynth::new(config.moods, config.mood);

    let mut rng = make_rng(seed);
    synth.render_to_file(output, &mood, duration, &mut rng)?;
    tracing::info!(mood = %mood, ?output, "mood track generated");
    Ok(())
}

fn list_moods(config: &AppConfig) {
    for (name, profile) in config.moods.iter() {
        let marker = if name == config.moods.fallback() {
            " (default)"
        } else {
            ""
        };
        println!(
            "{name:<12} {:>6.1} Hz {:>5.0} bpm{marker}",
            profile.base_frequency, profile.tempo_bpm
        );
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Remix recordings and generate mood tracks", long_about = None)]
struct Cli {
    /// Optional JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a WAV recording through the remix effect chain.
    Remix {
        /// Path to the WAV file to remix.
        input: PathBuf,
        /// Output path for the stereo result.
        output: PathBuf,
        #[command(flatten)]
        tweaks: RemixArgs,
        /// Seed for the reverb noise; random when omitted.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Synthesise a short clip for a mood.
    Generate {
        /// Output path for the generated WAV file.
        output: PathBuf,
        /// Mood key; unknown keys fall back to the default mood.
        #[arg(short, long)]
        mood: Option<String>,
        /// Clip length in seconds (3-30).
        #[arg(short, long)]
        duration: Option<f32>,
        #[arg(long)]
        sample_rate: Option<u32>,
        /// Seed for the percussion noise; random when omitted.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List the available moods.
    Moods,
}

/// Per-run overrides for the remix parameters.
#[derive(clap::Args, Debug, Default)]
struct RemixArgs {
    /// Speed ratio (0.5-2.0).
    #[arg(long)]
    speed: Option<f32>,
    /// Pitch shift in semitones (-12..12).
    #[arg(long, allow_negative_numbers = true)]
    pitch: Option<f32>,
    /// Bass boost gain (1.0-3.0).
    #[arg(long)]
    bass: Option<f32>,
    /// Reverb strength (0.0-1.0).
    #[arg(long)]
    reverb: Option<f32>,
    /// Echo delay in seconds (0.1-1.0).
    #[arg(long)]
    echo_delay: Option<f32>,
    /// Echo decay (0.1-1.0).
    #[arg(long)]
    echo_decay: Option<f32>,
}

impl RemixArgs {
    fn apply(self, config: &mut AppConfig) {
        let remix = &mut config.remix;
        let overrides = [
            (self.speed, &mut remix.speed),
            (self.pitch, &mut remix.pitch_semitones),
            (self.bass, &mut remix.bass_gain),
            (self.reverb, &mut remix.reverb_strength),
            (self.echo_delay, &mut remix.echo_delay),
            (self.echo_decay, &mut remix.echo_decay),
        ];
        for (value, slot) in overrides {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_remix_overrides() {
        let cli = Cli::parse_from([
            "moodmix", "remix", "in.wav", "out.wav", "--speed", "0.8", "--pitch", "-3", "--seed",
            "7",
        ]);
        let Commands::Remix { tweaks, seed, .. } = cli.command else {
            panic!("expected remix command");
        };
        assert_eq!(seed, Some(7));

        let mut config = AppConfig::default();
        tweaks.apply(&mut config);
        assert_eq!(config.remix.speed, 0.8);
        assert_eq!(config.remix.pitch_semitones, -3.0);
        assert_eq!(config.remix.bass_gain, 1.4);
    }

    #[test]
    fn parses_generate_with_global_config() {
        let cli = Cli::parse_from([
            "moodmix", "generate", "clip.wav", "--mood", "lofi", "-d", "12", "--config", "c.json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        let Commands::Generate { mood, duration, .. } = cli.command else {
            panic!("expected generate command");
        };
        assert_eq!(mood.as_deref(), Some("lofi"));
        assert_eq!(duration, Some(12.0));
    }
}
