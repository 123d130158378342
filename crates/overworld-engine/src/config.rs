//! Sound configuration.
//!
//! Provides asset tables, trigger thresholds, volumes and playback settings.
//! Configuration can be loaded from and saved to a TOML file.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use overworld_gameplay::{track_loops, Tuning, REQUIRED_EFFECTS, REQUIRED_TRACKS};
use overworld_kernel::{AssetEntry, AssetTable, EffectRegistry, MusicRegistry, Registry};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "overworld.toml";

/// Sound configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    // === Playback Settings ===
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Frames per second the scenario player runs at
    pub frame_rate: u32,
    /// Run scenarios without an output device and without pacing
    pub dry_run: bool,
    /// Built-in scenario name (`full_level`, `hurry_up`) or path to a JSON file
    pub scenario: String,

    // === Trigger Thresholds ===
    /// Remaining seconds at or below which the hurry-up jingle plays
    pub time_warning_threshold: u32,
    /// Star duration in milliseconds
    pub invincibility_duration_ms: u64,

    // === Assets ===
    /// Root directory for all audio assets
    pub asset_dir: PathBuf,
    /// Music subdirectory
    pub music_dir: PathBuf,
    /// Sound effect subdirectory
    pub sfx_dir: PathBuf,
    /// Music table: logical name → file
    pub music: AssetTable,
    /// Sound effect table: logical name → file
    pub effects: AssetTable,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            // Playback
            music_volume: 0.7,
            sfx_volume: 1.0,
            frame_rate: 60,
            dry_run: false,
            scenario: "full_level".to_string(),

            // Thresholds
            time_warning_threshold: Tuning::default().time_warning_threshold,
            invincibility_duration_ms: Tuning::default().invincibility_duration_ms,

            // Assets
            asset_dir: PathBuf::from("resources"),
            music_dir: PathBuf::from("music"),
            sfx_dir: PathBuf::from("sound"),
            music: default_music_table(),
            effects: default_effect_table(),
        }
    }
}

/// Music files shipped with the game.
#[must_use]
pub fn default_music_table() -> AssetTable {
    [
        ("death", "death.wav"),
        ("out_of_time", "out_of_time.wav"),
        ("invincible", "invincible.ogg"),
        ("world_clear", "world_clear.wav"),
        ("main_theme", "main_theme.ogg"),
        ("flagpole", "flagpole.wav"),
        ("main_theme_sped_up", "main_theme_sped_up.ogg"),
        ("stage_clear", "stage_clear.wav"),
        ("game_over", "game_over.ogg"),
    ]
    .into_iter()
    .map(|(name, file)| {
        let entry = if track_loops(name) {
            AssetEntry::looped(file)
        } else {
            AssetEntry::once(file)
        };
        (name.to_string(), entry)
    })
    .collect()
}

/// Sound effect files shipped with the game.
#[must_use]
pub fn default_effect_table() -> AssetTable {
    let mut table: AssetTable = [
        ("coin", "coin.ogg"),
        ("bump", "bump.ogg"),
        ("small_jump", "small_jump.ogg"),
        ("big_jump", "big_jump.ogg"),
        ("stomp", "stomp.ogg"),
        ("powerup", "powerup.ogg"),
        ("powerup_appears", "powerup_appears.ogg"),
        ("pipe", "pipe.ogg"),
        ("fireball", "fireball.ogg"),
        ("kick", "kick.ogg"),
        ("one_up", "one_up.ogg"),
        ("brick_smash", "brick_smash.ogg"),
    ]
    .into_iter()
    .map(|(name, file)| (name.to_string(), AssetEntry::once(file)))
    .collect();

    // The score tally ticks until the clock is drained
    table.insert("count_down".to_string(), AssetEntry::looped("count_down.ogg"));
    table
}

impl SoundConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str::<Self>(&contents) {
                    Ok(mut config) => {
                        info!("Loaded config from {}", path.display());
                        config.validate();
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.frame_rate = self.frame_rate.clamp(1, 240);
    }

    /// Trigger thresholds for the decision table.
    #[must_use]
    pub fn tuning(&self) -> Tuning {
        Tuning {
            time_warning_threshold: self.time_warning_threshold,
            invincibility_duration_ms: self.invincibility_duration_ms,
        }
    }

    /// Milliseconds per frame at the configured frame rate.
    #[must_use]
    pub fn frame_ms(&self) -> u64 {
        1000 / u64::from(self.frame_rate.max(1))
    }

    /// Builds the music registry.
    #[must_use]
    pub fn music_registry(&self) -> MusicRegistry {
        Registry::music(self.asset_dir.join(&self.music_dir), &self.music)
    }

    /// Builds the sound effect registry.
    #[must_use]
    pub fn effect_registry(&self) -> EffectRegistry {
        Registry::effects(self.asset_dir.join(&self.sfx_dir), &self.effects)
    }

    /// Names the decision table needs that the tables lack.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = self.music_registry().missing_keys(&REQUIRED_TRACKS);
        missing.extend(self.effect_registry().missing_keys(&REQUIRED_EFFECTS));
        missing
    }
}
