//! # Overworld
//!
//! Plays a scripted level through the audio coordinator.
//!
//! Usage: `overworld [--dry-run] [--config FILE] [SCENARIO]`.
//!
//! Without `--config` the configuration is read from `overworld.toml` in the
//! working directory, falling back to defaults. `SCENARIO` is a built-in name
//! (`full_level`, `hurry_up`) or a JSON file and overrides the configured one.
//! `--dry-run` records mixer commands instead of opening the device and plays
//! frames without pacing.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use overworld_engine::{LevelSound, Scenario, SoundConfig};
use overworld_kernel::{Mixer, RecordingMixer, RodioMixer, SilentMixer};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("overworld=info".parse()?))
        .init();

    info!("Overworld starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Args::parse().into_config();
    check_assets(&config);

    let scenario = Scenario::resolve(&config.scenario)
        .with_context(|| format!("Failed to load scenario '{}'", config.scenario))?;

    let mixer = open_mixer(&config);
    let mut sound = LevelSound::from_config(&config, &scenario.initial_overhead(), mixer)
        .context("Failed to start level music")?;

    let report = scenario.run(&mut sound, config.frame_ms(), !config.dry_run)?;
    for step in &report.steps {
        info!("{:>16}: {} frames -> {}", step.label, step.frames, step.state);
    }
    if report.device_errors > 0 {
        error!("{} frames hit device errors", report.device_errors);
    }

    info!("Overworld shutdown complete");
    Ok(())
}

/// Level audio player.
#[derive(Parser, Debug)]
#[command(name = "overworld")]
#[command(about = "Play a scripted level through the level-audio coordinator")]
struct Args {
    /// Record mixer commands instead of opening the audio device, without frame pacing
    #[arg(long)]
    dry_run: bool,

    /// Configuration file (defaults to overworld.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in scenario name (full_level, hurry_up) or path to a JSON file
    scenario: Option<String>,
}

impl Args {
    /// Loads the configuration and applies the command-line overrides.
    fn into_config(self) -> SoundConfig {
        let mut config = match self.config {
            Some(path) => SoundConfig::load_from(path),
            None => SoundConfig::load(),
        };
        if let Some(scenario) = self.scenario {
            config.scenario = scenario;
        }
        config.dry_run |= self.dry_run;
        config
    }
}

fn check_assets(config: &SoundConfig) {
    for name in config.missing_required() {
        warn!("No asset configured for '{}'", name);
    }
    let music = config.music_registry();
    let effects = config.effect_registry();
    info!(
        "{} music tracks and {} effects configured",
        music.len(),
        effects.len()
    );
    for asset in music.missing_files().into_iter().chain(effects.missing_files()) {
        warn!("Missing {} file {}", asset.kind, asset.path.display());
    }
}

fn open_mixer(config: &SoundConfig) -> Box<dyn Mixer> {
    if config.dry_run {
        info!("Dry run, recording mixer commands only");
        return Box::new(RecordingMixer::new());
    }

    match RodioMixer::open(config.music_volume, config.sfx_volume) {
        Ok(mixer) => Box::new(mixer),
        Err(e) => {
            warn!("Audio output unavailable ({e}), continuing silently");
            Box::new(SilentMixer::new())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["overworld"]).expect("parse");
        assert!(!args.dry_run);
        assert!(args.config.is_none());
        assert!(args.scenario.is_none());
    }

    #[test]
    fn test_args_override_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("custom.toml");
        fs::write(&path, "frame_rate = 30\nscenario = \"full_level\"\n").expect("write");

        let config_arg = format!("--config={}", path.display());
        let args =
            Args::try_parse_from(["overworld", "--dry-run", config_arg.as_str(), "hurry_up"])
                .expect("parse");
        let config = args.into_config();

        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.scenario, "hurry_up");
        assert!(config.dry_run);
    }

    #[test]
    fn test_args_help_and_unknown_flags() {
        let help = Args::try_parse_from(["overworld", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);

        assert!(Args::try_parse_from(["overworld", "--loud"]).is_err());
        assert!(Args::try_parse_from(["overworld", "a", "b"]).is_err());
    }
}
