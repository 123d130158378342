//! # Overworld Gameplay
//!
//! Gameplay-side types the level-audio coordinator reacts to.
//!
//! This crate provides:
//! - Character snapshots sampled from the actor simulation
//! - Level status, game info and the countdown clock
//! - Logical music and effect names
//! - The audio decision table and its pure `transition` function

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod audio_state;
pub mod character;
pub mod level;
pub mod music;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audio_state::*;
    pub use crate::character::*;
    pub use crate::level::*;
    pub use crate::music::{effect, track, track_loops, REQUIRED_EFFECTS, REQUIRED_TRACKS};
}

pub use prelude::*;
