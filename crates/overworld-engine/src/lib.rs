//! Overworld Engine - level audio coordinator for the Overworld platformer.
//!
//! This crate ties the decision table from `overworld-gameplay` to the
//! mixers in `overworld-kernel`, and adds configuration loading and a
//! scripted scenario player used by the `overworld` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

/// Sound configuration loaded from TOML
pub mod config;
/// Per-level audio coordinator
pub mod level_sound;
/// Scripted level playback
pub mod scenario;


pub use config::SoundConfig;
pub use level_sound::LevelSound;
pub use scenario::{Scenario, ScenarioError, ScenarioReport, ScenarioStep};
