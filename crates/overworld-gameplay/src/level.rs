//! Level context shared between the game loop and the audio coordinator.
//!
//! This module provides:
//! - `LevelStatus`: which top-level screen is active
//! - `GameInfo`: the open key/value bag of game-wide facts
//! - `OverheadInfo`: the per-level context carrying the countdown clock

use std::fmt;
use std::str::FromStr;

use overworld_common::AudioError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Seconds on the clock when a level starts.
pub const LEVEL_TIME: u32 = 400;

/// Open mapping of game-wide facts (score, coins, lives...).
pub type GameInfo = Map<String, Value>;

/// Builds the game info a fresh session starts with.
#[must_use]
pub fn new_game_info() -> GameInfo {
    let mut info = GameInfo::new();
    info.insert("coin_total".into(), json!(0));
    info.insert("score".into(), json!(0));
    info.insert("top_score".into(), json!(0));
    info.insert("lives".into(), json!(3));
    info.insert("current_time".into(), json!(0));
    info.insert("level_state".into(), Value::Null);
    info.insert("camera_start_x".into(), json!(0));
    info.insert("mario_dead".into(), json!(false));
    info
}

/// Top-level screen the game is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelStatus {
    /// Title screen
    MainMenu,
    /// "World 1-1" interstitial
    LoadScreen,
    /// A level is being played
    #[default]
    Level,
    /// "Time up" interstitial
    TimeOut,
    /// Game over screen
    GameOver,
}

impl LevelStatus {
    /// Snake-case tag used in config and scenario files.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::MainMenu => "main_menu",
            Self::LoadScreen => "load_screen",
            Self::Level => "level",
            Self::TimeOut => "time_out",
            Self::GameOver => "game_over",
        }
    }
}

impl fmt::Display for LevelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for LevelStatus {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main_menu" => Ok(Self::MainMenu),
            "load_screen" => Ok(Self::LoadScreen),
            "level" => Ok(Self::Level),
            "time_out" => Ok(Self::TimeOut),
            "game_over" => Ok(Self::GameOver),
            _ => Err(AudioError::InvalidStatus(s.to_string())),
        }
    }
}

/// Outer level context read by the audio coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverheadInfo {
    /// Active screen.
    pub status: LevelStatus,
    /// Game-wide facts.
    pub game_info: GameInfo,
    /// Remaining level time in seconds.
    pub time: u32,
}

impl OverheadInfo {
    /// Creates a context for the given screen with a full clock.
    #[must_use]
    pub fn new(status: LevelStatus) -> Self {
        Self {
            status,
            game_info: new_game_info(),
            time: LEVEL_TIME,
        }
    }

    /// Replaces the remaining level time.
    #[must_use]
    pub fn with_time(mut self, time: u32) -> Self {
        self.time = time;
        self
    }

    /// Replaces the game info.
    #[must_use]
    pub fn with_game_info(mut self, game_info: GameInfo) -> Self {
        self.game_info = game_info;
        self
    }
}

impl Default for OverheadInfo {
    fn default() -> Self {
        Self::new(LevelStatus::Level)
    }
}
