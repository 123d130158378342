//! Playback device abstraction.
//!
//! The level coordinator drives audio through the [`Mixer`] trait: one music
//! channel (load, play, stop, busy) plus named sound effects.
//!
//! # Implementations
//!
//! - [`RodioMixer`](crate::audio_backend::RodioMixer): real output device
//! - [`SilentMixer`]: accepts everything, plays nothing
//! - [`RecordingMixer`](crate::recording::RecordingMixer): records commands
//!
//! ```ignore
//! use overworld_kernel::audio::*;
//!
//! let mut mixer = RodioMixer::open(0.7, 1.0)
//!     .map(|m| Box::new(m) as Box<dyn Mixer>)
//!     .unwrap_or_else(|_| Box::new(SilentMixer::new()));
//!
//! mixer.load_music(music.get("main_theme")?)?;
//! mixer.play_music()?;
//! ```

use overworld_common::AudioResult;
use tracing::debug;

use crate::audio_resource::AudioAsset;

pub use crate::audio_backend::RodioMixer;
pub use crate::audio_resource::{AssetEntry, AssetTable, EffectRegistry, MusicRegistry, Registry};
pub use crate::recording::{MixerCommand, RecordingMixer};

/// Music channel plus one-shot effects.
///
/// Commands are fire-and-forget: they return as soon as the device has
/// accepted them and never wait for playback to finish.
pub trait Mixer {
    /// Loads a track into the music channel, stopping whatever was playing.
    fn load_music(&mut self, asset: &AudioAsset) -> AudioResult<()>;

    /// Starts the loaded track.
    fn play_music(&mut self) -> AudioResult<()>;

    /// Halts the music channel.
    fn stop_music(&mut self) -> AudioResult<()>;

    /// Returns true while the music channel is still producing sound.
    fn is_music_busy(&self) -> bool;

    /// Starts an effect, restarting it if it is already playing.
    fn play_effect(&mut self, asset: &AudioAsset) -> AudioResult<()>;

    /// Stops an effect.
    fn stop_effect(&mut self, asset: &AudioAsset) -> AudioResult<()>;

    /// Releases resources held by finished sounds.
    fn update(&mut self) {}
}

impl<M: Mixer + ?Sized> Mixer for Box<M> {
    fn load_music(&mut self, asset: &AudioAsset) -> AudioResult<()> {
        (**self).load_music(asset)
    }

    fn play_music(&mut self) -> AudioResult<()> {
        (**self).play_music()
    }

    fn stop_music(&mut self) -> AudioResult<()> {
        (**self).stop_music()
    }

    fn is_music_busy(&self) -> bool {
        (**self).is_music_busy()
    }

    fn play_effect(&mut self, asset: &AudioAsset) -> AudioResult<()> {
        (**self).play_effect(asset)
    }

    fn stop_effect(&mut self, asset: &AudioAsset) -> AudioResult<()> {
        (**self).stop_effect(asset)
    }

    fn update(&mut self) {
        (**self).update();
    }
}

/// Mixer used when no output device is available.
#[derive(Debug, Default)]
pub struct SilentMixer {
    loaded: Option<String>,
}

impl SilentMixer {
    /// Creates a silent mixer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the last loaded track.
    #[must_use]
    pub fn loaded(&self) -> Option<&str> {
        self.loaded.as_deref()
    }
}

impl Mixer for SilentMixer {
    fn load_music(&mut self, asset: &AudioAsset) -> AudioResult<()> {
        debug!("Silent mixer: load {}", asset.name);
        self.loaded = Some(asset.name.clone());
        Ok(())
    }

    fn play_music(&mut self) -> AudioResult<()> {
        Ok(())
    }

    fn stop_music(&mut self) -> AudioResult<()> {
        Ok(())
    }

    // Nothing is ever audible, so tracks finish immediately.
    fn is_music_busy(&self) -> bool {
        false
    }

    fn play_effect(&mut self, asset: &AudioAsset) -> AudioResult<()> {
        debug!("Silent mixer: play effect {}", asset.name);
        Ok(())
    }

    fn stop_effect(&mut self, _asset: &AudioAsset) -> AudioResult<()> {
        Ok(())
    }
}
