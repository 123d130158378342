//! Audio Backend with Rodio Integration
//!
//! This module provides the real playback device using rodio:
//!
//! - `AudioDevice`: Wrapper around rodio's output stream
//! - `RodioMixer`: one music sink plus one sink per playing effect
//! - File bytes cached per path so replaying an effect does not hit disk
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     RodioMixer                        │
//! │  ┌───────────────┐  ┌────────────┐  ┌──────────────┐  │
//! │  │  AudioDevice  │──│ music sink │  │ effect sinks │  │
//! │  │  (rodio)      │  │  (1)       │  │ (by name)    │  │
//! │  └───────────────┘  └────────────┘  └──────────────┘  │
//! │           │                                           │
//! │           ▼                                           │
//! │     OutputStream ◀──────── byte cache (per path)      │
//! └──────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use overworld_common::{AudioError, AudioResult};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, info};

use crate::audio::Mixer;
use crate::audio_resource::AudioAsset;

/// Wraps rodio's output stream for audio playback.
pub struct AudioDevice {
    /// The output stream (must be kept alive).
    _stream: OutputStream,
    /// Handle for creating sinks.
    handle: OutputStreamHandle,
}

impl std::fmt::Debug for AudioDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDevice").finish_non_exhaustive()
    }
}

impl AudioDevice {
    /// Opens the default output device.
    pub fn new() -> AudioResult<Self> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| AudioError::Device(e.to_string()))?;

        info!("Audio device initialized");

        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    /// Creates a new sink for audio playback.
    pub fn create_sink(&self) -> AudioResult<Sink> {
        Sink::try_new(&self.handle).map_err(|e| AudioError::Device(e.to_string()))
    }
}

/// Track sitting in the music channel.
#[derive(Debug, Clone)]
struct LoadedTrack {
    name: String,
    data: Arc<Vec<u8>>,
    looping: bool,
}

/// Mixer backed by the default rodio output device.
pub struct RodioMixer {
    device: AudioDevice,
    loaded: Option<LoadedTrack>,
    music: Option<Sink>,
    effects: HashMap<String, Sink>,
    cache: HashMap<PathBuf, Arc<Vec<u8>>>,
    music_volume: f32,
    sfx_volume: f32,
}

impl std::fmt::Debug for RodioMixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioMixer")
            .field("loaded", &self.loaded.as_ref().map(|t| t.name.as_str()))
            .field("music_playing", &self.music.is_some())
            .field("effects", &self.effects.len())
            .field("cached_files", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl RodioMixer {
    /// Opens the default device with the given channel volumes (0.0-1.0).
    pub fn open(music_volume: f32, sfx_volume: f32) -> AudioResult<Self> {
        Ok(Self {
            device: AudioDevice::new()?,
            loaded: None,
            music: None,
            effects: HashMap::new(),
            cache: HashMap::new(),
            music_volume: music_volume.clamp(0.0, 1.0),
            sfx_volume: sfx_volume.clamp(0.0, 1.0),
        })
    }

    /// Reads a file once and keeps its bytes for later playback.
    fn read_cached(&mut self, path: &Path) -> AudioResult<Arc<Vec<u8>>> {
        if let Some(data) = self.cache.get(path) {
            return Ok(Arc::clone(data));
        }

        let bytes = std::fs::read(path).map_err(|e| AudioError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        // Reject undecodable files at load time rather than at play time
        decoder(&bytes)?;

        debug!("Cached {} ({} bytes)", path.display(), bytes.len());
        let data = Arc::new(bytes);
        self.cache.insert(path.to_path_buf(), Arc::clone(&data));
        Ok(data)
    }

    fn start(&self, data: &[u8], looping: bool, volume: f32) -> AudioResult<Sink> {
        let sink = self.device.create_sink()?;
        let source = decoder(data)?;
        sink.set_volume(volume);
        if looping {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }
        Ok(sink)
    }
}

fn decoder(data: &[u8]) -> AudioResult<Decoder<Cursor<Vec<u8>>>> {
    Decoder::new(Cursor::new(data.to_vec())).map_err(|e| AudioError::Decode(e.to_string()))
}

impl Mixer for RodioMixer {
    fn load_music(&mut self, asset: &AudioAsset) -> AudioResult<()> {
        let data = self.read_cached(&asset.path)?;

        if let Some(sink) = self.music.take() {
            sink.stop();
        }

        self.loaded = Some(LoadedTrack {
            name: asset.name.clone(),
            data,
            looping: asset.looping,
        });
        Ok(())
    }

    fn play_music(&mut self) -> AudioResult<()> {
        let track = self
            .loaded
            .clone()
            .ok_or_else(|| AudioError::Device("no music loaded".into()))?;

        if let Some(sink) = self.music.take() {
            sink.stop();
        }

        let sink = self.start(&track.data, track.looping, self.music_volume)?;
        self.music = Some(sink);

        info!("Playing music: {}", track.name);
        Ok(())
    }

    fn stop_music(&mut self) -> AudioResult<()> {
        if let Some(sink) = self.music.take() {
            sink.stop();
        }
        Ok(())
    }

    fn is_music_busy(&self) -> bool {
        self.music.as_ref().is_some_and(|sink| !sink.empty())
    }

    fn play_effect(&mut self, asset: &AudioAsset) -> AudioResult<()> {
        let data = self.read_cached(&asset.path)?;

        if let Some(sink) = self.effects.remove(&asset.name) {
            sink.stop();
        }

        let sink = self.start(&data, asset.looping, self.sfx_volume)?;
        self.effects.insert(asset.name.clone(), sink);

        debug!("Playing effect: {}", asset.name);
        Ok(())
    }

    fn stop_effect(&mut self, asset: &AudioAsset) -> AudioResult<()> {
        if let Some(sink) = self.effects.remove(&asset.name) {
            sink.stop();
        }
        Ok(())
    }

    fn update(&mut self) {
        self.effects.retain(|_, sink| !sink.empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: playback needs an actual audio device, so only the decoding path is tested

    #[test]
    fn test_decoder_rejects_garbage() {
        let err = decoder(b"definitely not audio").err().expect("garbage must not decode");
        assert!(matches!(err, AudioError::Decode(_)));
    }

    #[test]
    fn test_decoder_accepts_minimal_wav() {
        // 44-byte canonical header followed by two silent 16-bit mono samples
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&40u32.to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&8000u32.to_le_bytes());
        wav.extend_from_slice(&16000u32.to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&4u32.to_le_bytes());
        wav.extend_from_slice(&[0, 0, 0, 0]);

        let source = decoder(&wav).expect("valid wav");
        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), 8000);
    }
}
