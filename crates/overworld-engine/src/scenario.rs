//! Scripted level playback.
//!
//! A scenario is a list of steps, each holding the level clock and a
//! character snapshot for a number of frames. The player feeds every frame to
//! a [`LevelSound`] the same way the game loop would, advancing the
//! character clock by one frame period each time.
//!
//! Scenarios are either built in (`full_level`, `hurry_up`) or loaded from a
//! JSON file:
//!
//! ```json
//! {
//!   "name": "short",
//!   "status": "level",
//!   "steps": [
//!     { "label": "walk", "frames": 30, "time": 380, "character": { "state": "walk" } },
//!     { "label": "flagpole", "time": 370, "character": { "state": "flagpole" } }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use overworld_common::AudioError;
use overworld_gameplay::{AudioState, CharacterSnapshot, LevelStatus, MarioState, OverheadInfo};
use overworld_kernel::Mixer;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::level_sound::LevelSound;

/// Name of the built-in scenario that plays a level start to finish.
pub const FULL_LEVEL: &str = "full_level";
/// Name of the built-in scenario that runs the clock down.
pub const HURRY_UP: &str = "hurry_up";

/// Errors from loading or running a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Scenario file could not be read.
    #[error("Failed to read scenario {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Scenario file is not valid JSON.
    #[error("Failed to parse scenario {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Scenario has no steps.
    #[error("Scenario '{0}' has no steps")]
    Empty(String),

    /// The coordinator rejected a frame for a reason other than the device.
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
}

fn one_frame() -> u32 {
    1
}

/// A run of identical frames.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioStep {
    /// Label for logs and reports.
    #[serde(default)]
    pub label: String,
    /// Number of frames to hold this step.
    #[serde(default = "one_frame")]
    pub frames: u32,
    /// Remaining level time in seconds.
    pub time: u32,
    /// Character facts; `current_time` is the clock at the first frame.
    #[serde(default)]
    pub character: CharacterSnapshot,
}

impl ScenarioStep {
    fn new(label: &str, frames: u32, time: u32, character: CharacterSnapshot) -> Self {
        Self {
            label: label.to_string(),
            frames,
            time,
            character,
        }
    }
}

/// Scripted sequence of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Screen the level context reports.
    pub status: LevelStatus,
    /// Steps in playback order.
    pub steps: Vec<ScenarioStep>,
}

/// Scenario as written on disk; the status is a free-form tag.
#[derive(Debug, Deserialize)]
struct ScenarioFile {
    name: String,
    #[serde(default)]
    status: Option<String>,
    steps: Vec<ScenarioStep>,
}

impl TryFrom<ScenarioFile> for Scenario {
    type Error = AudioError;

    fn try_from(file: ScenarioFile) -> Result<Self, Self::Error> {
        let status = match file.status {
            Some(tag) => tag.parse()?,
            None => LevelStatus::default(),
        };
        Ok(Self {
            name: file.name,
            status,
            steps: file.steps,
        })
    }
}

/// State reached at the end of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Step label.
    pub label: String,
    /// Frames played.
    pub frames: u32,
    /// Audio state after the last frame.
    pub state: AudioState,
}

/// Summary of a scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// One entry per step.
    pub steps: Vec<StepOutcome>,
    /// Frames whose playback command the device rejected.
    pub device_errors: usize,
}

impl ScenarioReport {
    /// States after each step, in order.
    #[must_use]
    pub fn states(&self) -> Vec<AudioState> {
        self.steps.iter().map(|s| s.state).collect()
    }

    /// State after the last step.
    #[must_use]
    pub fn final_state(&self) -> Option<AudioState> {
        self.steps.last().map(|s| s.state)
    }

    /// Total frames played.
    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.frames)).sum()
    }
}

impl Scenario {
    /// Loads a scenario from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ScenarioFile =
            serde_json::from_str(&contents).map_err(|source| ScenarioError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let scenario = Self::try_from(file)?;

        if scenario.steps.is_empty() {
            return Err(ScenarioError::Empty(scenario.name));
        }

        info!(
            "Loaded scenario '{}' ({} steps) from {}",
            scenario.name,
            scenario.steps.len(),
            path.display()
        );
        Ok(scenario)
    }

    /// Returns a built-in scenario by name, or loads `name` as a file path.
    pub fn resolve(name: &str) -> Result<Self, ScenarioError> {
        match name {
            FULL_LEVEL => Ok(Self::full_level()),
            HURRY_UP => Ok(Self::hurry_up()),
            path => Self::load(path),
        }
    }

    /// Level context for the first frame.
    #[must_use]
    pub fn initial_overhead(&self) -> OverheadInfo {
        let time = self.steps.first().map_or(0, |s| s.time);
        OverheadInfo::new(self.status).with_time(time)
    }

    /// Walk, star, flagpole, castle and score tally.
    ///
    /// States after each step: `Normal`, `MarioInvincible`, `Normal`,
    /// `Normal`, `Flagpole`, `StageClear`, `FastCountDown`, `WorldClear`.
    #[must_use]
    pub fn full_level() -> Self {
        let walking = CharacterSnapshot::new().with_state(MarioState::Walk);

        let star = walking.with_star(2_000).at_time(2_000);
        let mut fading = star.at_time(10_640);
        fading.losing_invincibility = true;

        let flagpole = CharacterSnapshot::new()
            .with_state(MarioState::Flagpole)
            .at_time(20_000);
        let to_castle = flagpole.with_state(MarioState::WalkingToCastle);
        let mut in_castle = to_castle;
        in_castle.in_castle = true;

        Self {
            name: FULL_LEVEL.to_string(),
            status: LevelStatus::Level,
            steps: vec![
                ScenarioStep::new("walk", 120, 398, walking),
                ScenarioStep::new("star", 540, 390, star),
                ScenarioStep::new("star fading", 240, 380, fading),
                ScenarioStep::new("walk", 120, 376, walking.at_time(15_000)),
                ScenarioStep::new("flagpole", 90, 300, flagpole),
                ScenarioStep::new("walk to castle", 120, 298, to_castle),
                ScenarioStep::new("score tally", 90, 250, in_castle),
                ScenarioStep::new("clock drained", 60, 0, in_castle),
            ],
        }
    }

    /// Clock runs low while standing, then the character dies.
    ///
    /// With an idle mixer the states are `Normal`, `TimeWarning`,
    /// `SpedUpNormal`, `MarioDead`.
    #[must_use]
    pub fn hurry_up() -> Self {
        let walking = CharacterSnapshot::new().with_state(MarioState::Walk);
        let standing = CharacterSnapshot::new().at_time(5_000);

        Self {
            name: HURRY_UP.to_string(),
            status: LevelStatus::Level,
            steps: vec![
                ScenarioStep::new("walk", 60, 150, walking),
                ScenarioStep::new("clock low", 1, 100, standing),
                ScenarioStep::new("hurry", 180, 99, standing.at_time(5_016)),
                ScenarioStep::new("death", 60, 95, standing.at_time(8_000).killed()),
            ],
        }
    }

    /// Plays every frame through `sound`.
    ///
    /// Device errors are logged and counted; the frame is retried implicitly
    /// on the next one since the state did not advance. Any other audio error
    /// aborts the run. With `realtime` set, each frame sleeps for `frame_ms`.
    pub fn run<M: Mixer>(
        &self,
        sound: &mut LevelSound<M>,
        frame_ms: u64,
        realtime: bool,
    ) -> Result<ScenarioReport, ScenarioError> {
        if self.steps.is_empty() {
            return Err(ScenarioError::Empty(self.name.clone()));
        }

        info!("Running scenario '{}'", self.name);
        let mut report = ScenarioReport {
            name: self.name.clone(),
            ..ScenarioReport::default()
        };
        let frame = Duration::from_millis(frame_ms);

        for step in &self.steps {
            let overhead = OverheadInfo {
                status: self.status,
                game_info: sound.game_info().clone(),
                time: step.time,
            };

            for i in 0..u64::from(step.frames) {
                let clock = step
                    .character
                    .current_time
                    .saturating_add(i.saturating_mul(frame_ms));
                let character = step.character.at_time(clock);

                match sound.update(&overhead, &character) {
                    Ok(()) => {},
                    Err(e) if e.is_device_error() => {
                        warn!("Frame {} of '{}': {}", i, step.label, e);
                        report.device_errors += 1;
                    },
                    Err(e) => return Err(e.into()),
                }

                if realtime {
                    thread::sleep(frame);
                }
            }

            debug!("Step '{}' ended in {}", step.label, sound.state());
            report.steps.push(StepOutcome {
                label: step.label.clone(),
                frames: step.frames,
                state: sound.state(),
            });
        }

        info!(
            "Scenario '{}' finished in {} after {} frames",
            self.name,
            sound.state(),
            report.total_frames()
        );
        Ok(report)
    }
}
