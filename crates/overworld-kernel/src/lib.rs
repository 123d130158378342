//! # Overworld Kernel
//!
//! Playback plumbing for level audio.
//!
//! This crate provides:
//! - Asset registries built once from name → file tables
//! - The `Mixer` trait the coordinator drives
//! - A rodio-backed mixer for the real output device
//! - Silent and recording mixers for headless runs and tests
//!
//! ## Architecture
//!
//! The kernel never decides what to play. The engine's coordinator looks
//! assets up in a registry and hands them to a mixer; the mixer only loads,
//! starts and stops sounds and reports whether the music channel is busy.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod audio;
pub mod audio_backend;
pub mod audio_resource;
pub mod recording;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audio::*;
    pub use crate::audio_backend::*;
    pub use crate::audio_resource::*;
    pub use crate::recording::*;
}

pub use prelude::*;
