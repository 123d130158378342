//! Error types for the Overworld audio stack.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which registry an asset lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Looped or one-shot background music.
    Music,
    /// Sound effect played alongside the music.
    Effect,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Music => f.write_str("music"),
            Self::Effect => f.write_str("effect"),
        }
    }
}

/// Errors raised by the level-audio coordinator and its playback devices.
#[derive(Debug, Error)]
pub enum AudioError {
    /// A track or effect name has no registry entry.
    #[error("No {kind} asset registered under '{name}'")]
    AssetNotFound {
        /// Registry that was searched.
        kind: AssetKind,
        /// Requested logical name.
        name: String,
    },

    /// The playback device rejected a command.
    #[error("Audio device error: {0}")]
    Device(String),

    /// An asset file could not be read.
    #[error("Failed to load audio file '{path}': {message}")]
    LoadFailed {
        /// Path to the file that failed to load.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Audio data could not be decoded.
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// A level status tag was not recognised.
    #[error("Unknown level status '{0}'")]
    InvalidStatus(String),
}

impl AudioError {
    /// No asset of `kind` is registered under `name`.
    pub fn not_found(kind: AssetKind, name: impl Into<String>) -> Self {
        Self::AssetNotFound {
            kind,
            name: name.into(),
        }
    }

    /// Returns true for errors raised by the playback device rather than
    /// by asset configuration.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            Self::Device(_) | Self::LoadFailed { .. } | Self::Decode(_)
        )
    }
}

/// Result type alias for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;
