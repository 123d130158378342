//! Command-recording mixer for tests and dry runs.

use overworld_common::{AudioError, AudioResult};

use crate::audio::Mixer;
use crate::audio_resource::AudioAsset;

/// A command accepted by a [`RecordingMixer`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MixerCommand {
    /// A track was loaded into the music channel.
    LoadMusic(String),
    /// The loaded track was started.
    PlayMusic,
    /// The music channel was halted.
    StopMusic,
    /// An effect was started.
    PlayEffect(String),
    /// An effect was stopped.
    StopEffect(String),
}

/// Mixer that records every command instead of producing sound.
///
/// The busy flag is scripted with [`set_busy`](Self::set_busy), and
/// [`fail_next`](Self::fail_next) makes the next command fail with a
/// device error.
#[derive(Debug, Default)]
pub struct RecordingMixer {
    commands: Vec<MixerCommand>,
    busy: bool,
    loaded: Option<String>,
    fail_next: Option<String>,
}

impl RecordingMixer {
    /// Creates an idle mixer with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands accepted so far, oldest first.
    #[must_use]
    pub fn commands(&self) -> &[MixerCommand] {
        &self.commands
    }

    /// Drains the command log.
    pub fn take_commands(&mut self) -> Vec<MixerCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Clears the command log.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of logged commands equal to `command`.
    #[must_use]
    pub fn count(&self, command: &MixerCommand) -> usize {
        self.commands.iter().filter(|c| *c == command).count()
    }

    /// Number of music loads of `name`.
    #[must_use]
    pub fn loads_of(&self, name: &str) -> usize {
        self.count(&MixerCommand::LoadMusic(name.to_string()))
    }

    /// Track currently loaded in the music channel.
    #[must_use]
    pub fn loaded(&self) -> Option<&str> {
        self.loaded.as_deref()
    }

    /// Scripts the busy flag reported from now on.
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Makes the next command fail with a device error.
    pub fn fail_next(&mut self, message: impl Into<String>) {
        self.fail_next = Some(message.into());
    }

    fn accept(&mut self, command: MixerCommand) -> AudioResult<()> {
        if let Some(message) = self.fail_next.take() {
            return Err(AudioError::Device(message));
        }
        self.commands.push(command);
        Ok(())
    }
}

impl Mixer for RecordingMixer {
    fn load_music(&mut self, asset: &AudioAsset) -> AudioResult<()> {
        self.accept(MixerCommand::LoadMusic(asset.name.clone()))?;
        self.loaded = Some(asset.name.clone());
        Ok(())
    }

    fn play_music(&mut self) -> AudioResult<()> {
        if self.loaded.is_none() {
            return Err(AudioError::Device("no music loaded".into()));
        }
        self.accept(MixerCommand::PlayMusic)
    }

    fn stop_music(&mut self) -> AudioResult<()> {
        self.accept(MixerCommand::StopMusic)
    }

    fn is_music_busy(&self) -> bool {
        self.busy
    }

    fn play_effect(&mut self, asset: &AudioAsset) -> AudioResult<()> {
        self.accept(MixerCommand::PlayEffect(asset.name.clone()))
    }

    fn stop_effect(&mut self, asset: &AudioAsset) -> AudioResult<()> {
        self.accept(MixerCommand::StopEffect(asset.name.clone()))
    }
}
