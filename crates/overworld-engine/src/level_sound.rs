//! Level audio coordinator.
//!
//! `LevelSound` owns the asset registries and the mixer for one level. Each
//! frame the game loop hands it the latest level context and character
//! snapshot; it samples the mixer, asks the decision table what to do, issues
//! the playback command and only then commits the new state.
//!
//! Restarting a level means building a new coordinator; the terminal states
//! have no way back to `Normal`.

use overworld_common::AudioResult;
use overworld_gameplay::audio_state::{self, AudioAction, Transition};
use overworld_gameplay::{
    track, AudioState, CharacterSnapshot, FrameContext, GameInfo, LevelStatus, OverheadInfo,
    Tuning,
};
use overworld_kernel::{EffectRegistry, Mixer, MusicRegistry};
use tracing::{debug, warn};

use crate::config::SoundConfig;

/// Per-level audio coordinator.
#[derive(Debug)]
pub struct LevelSound<M> {
    music: MusicRegistry,
    effects: EffectRegistry,
    mixer: M,
    tuning: Tuning,
    overhead: OverheadInfo,
    character: Option<CharacterSnapshot>,
    state: AudioState,
}

impl<M: Mixer> LevelSound<M> {
    /// Creates the coordinator and starts the track matching the level status.
    pub fn new(
        overhead: &OverheadInfo,
        music: MusicRegistry,
        effects: EffectRegistry,
        mixer: M,
        tuning: Tuning,
    ) -> AudioResult<Self> {
        let mut sound = Self {
            music,
            effects,
            mixer,
            tuning,
            overhead: overhead.clone(),
            character: None,
            state: AudioState::Normal,
        };
        sound.set_music_mixer()?;
        Ok(sound)
    }

    /// Creates the coordinator from configuration.
    pub fn from_config(
        config: &SoundConfig,
        overhead: &OverheadInfo,
        mixer: M,
    ) -> AudioResult<Self> {
        Self::new(
            overhead,
            config.music_registry(),
            config.effect_registry(),
            mixer,
            config.tuning(),
        )
    }

    /// Starts the main theme for a running level or the game-over jingle.
    ///
    /// Any other status leaves playback and state untouched.
    pub fn set_music_mixer(&mut self) -> AudioResult<()> {
        match self.overhead.status {
            LevelStatus::Level => self.play_music(track::MAIN_THEME, AudioState::Normal),
            LevelStatus::GameOver => self.play_music(track::GAME_OVER, AudioState::GameOver),
            other => {
                warn!("No level music for status '{}', leaving mixer idle", other);
                Ok(())
            },
        }
    }

    /// Stores the latest level context and character, then evaluates the
    /// decision table once.
    pub fn update(
        &mut self,
        overhead: &OverheadInfo,
        character: &CharacterSnapshot,
    ) -> AudioResult<()> {
        self.overhead.clone_from(overhead);
        self.character = Some(*character);
        self.mixer.update();
        self.handle_state().map(|_| ())
    }

    /// Evaluates the decision table for the current state.
    ///
    /// Returns the transition that was applied, if any. Nothing happens
    /// before the first `update` has supplied a character.
    pub fn handle_state(&mut self) -> AudioResult<Option<Transition>> {
        let Some(ctx) = self.frame_context() else {
            return Ok(None);
        };

        let Some(rule) = audio_state::matching_rule(self.state, &ctx, &self.tuning) else {
            return Ok(None);
        };

        let transition = rule.transition();
        debug!(
            "{} -> {} on '{}': {}",
            self.state, transition.next, rule.label, transition.action
        );
        self.apply(transition)?;
        Ok(Some(transition))
    }

    /// Facts for this frame; the busy flag is read fresh every call.
    #[must_use]
    pub fn frame_context(&self) -> Option<FrameContext> {
        self.character.map(|character| {
            FrameContext::new(character, self.overhead.time, self.mixer.is_music_busy())
        })
    }

    fn apply(&mut self, transition: Transition) -> AudioResult<()> {
        match transition.action {
            AudioAction::PlayMusic(name) => self.play_music(name, transition.next),
            AudioAction::PlayEffect(name) => {
                self.play_effect(name)?;
                self.commit(transition.next);
                Ok(())
            },
            AudioAction::StopEffect(name) => {
                self.stop_effect(name)?;
                self.commit(transition.next);
                Ok(())
            },
        }
    }

    fn commit(&mut self, next: AudioState) {
        if self.state != next {
            debug!("Audio state {} -> {}", self.state, next);
        }
        self.state = next;
    }

    /// Loads and plays a track, then switches to `state`.
    ///
    /// The state is left untouched if the track is unknown or the mixer
    /// rejects it.
    pub fn play_music(&mut self, name: &str, state: AudioState) -> AudioResult<()> {
        let asset = self.music.get(name)?;
        self.mixer.load_music(asset)?;
        self.mixer.play_music()?;
        self.commit(state);
        Ok(())
    }

    /// Halts the music channel without changing state.
    pub fn stop_music(&mut self) -> AudioResult<()> {
        self.mixer.stop_music()
    }

    /// Starts a sound effect.
    pub fn play_effect(&mut self, name: &str) -> AudioResult<()> {
        let asset = self.effects.get(name)?;
        self.mixer.play_effect(asset)
    }

    /// Stops a sound effect.
    pub fn stop_effect(&mut self, name: &str) -> AudioResult<()> {
        let asset = self.effects.get(name)?;
        self.mixer.stop_effect(asset)
    }

    /// Current audio state.
    #[must_use]
    pub fn state(&self) -> AudioState {
        self.state
    }

    /// Game info from the latest update.
    #[must_use]
    pub fn game_info(&self) -> &GameInfo {
        &self.overhead.game_info
    }

    /// Level context from the latest update.
    #[must_use]
    pub fn overhead_info(&self) -> &OverheadInfo {
        &self.overhead
    }

    /// Character from the latest update.
    #[must_use]
    pub fn character(&self) -> Option<&CharacterSnapshot> {
        self.character.as_ref()
    }

    /// Trigger thresholds.
    #[must_use]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Music registry.
    #[must_use]
    pub fn music(&self) -> &MusicRegistry {
        &self.music
    }

    /// Sound effect registry.
    #[must_use]
    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    /// The playback device.
    #[must_use]
    pub fn mixer(&self) -> &M {
        &self.mixer
    }

    /// Mutable access to the playback device.
    pub fn mixer_mut(&mut self) -> &mut M {
        &mut self.mixer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overworld_common::{AssetKind, AudioError};
    use overworld_gameplay::{effect, MarioState};
    use overworld_kernel::{MixerCommand, RecordingMixer};
    use proptest::prelude::*;
    use serde_json::json;

    fn sound_with(status: LevelStatus) -> LevelSound<RecordingMixer> {
        let config = SoundConfig::default();
        LevelSound::from_config(&config, &OverheadInfo::new(status), RecordingMixer::new())
            .expect("construct")
    }

    /// Coordinator forced into `state` with an empty command log.
    fn sound_in(state: AudioState) -> LevelSound<RecordingMixer> {
        let mut sound = sound_with(LevelStatus::Level);
        sound.state = state;
        sound.mixer_mut().clear();
        sound
    }

    fn level(time: u32) -> OverheadInfo {
        OverheadInfo::new(LevelStatus::Level).with_time(time)
    }

    fn music(name: &str) -> Vec<MixerCommand> {
        vec![MixerCommand::LoadMusic(name.into()), MixerCommand::PlayMusic]
    }

    #[test]
    fn test_init() {
        let sound = sound_with(LevelStatus::Level);
        assert_eq!(sound.state(), AudioState::Normal);
        assert!(!sound.music().is_empty());
        assert!(!sound.effects().is_empty());
        assert_eq!(sound.overhead_info(), &OverheadInfo::new(LevelStatus::Level));
        assert_eq!(sound.game_info(), &OverheadInfo::new(LevelStatus::Level).game_info);
        assert!(sound.character().is_none());
    }

    #[test]
    fn test_construction_starts_main_theme_once() {
        let sound = sound_with(LevelStatus::Level);
        assert_eq!(sound.mixer().commands(), music(track::MAIN_THEME).as_slice());
        assert_eq!(sound.state(), AudioState::Normal);
    }

    #[test]
    fn test_construction_game_over() {
        let sound = sound_with(LevelStatus::GameOver);
        assert_eq!(sound.mixer().commands(), music(track::GAME_OVER).as_slice());
        assert_eq!(sound.state(), AudioState::GameOver);
    }

    #[test]
    fn test_construction_other_status_is_noop() {
        let sound = sound_with(LevelStatus::LoadScreen);
        assert!(sound.mixer().commands().is_empty());
        assert_eq!(sound.state(), AudioState::Normal);
    }

    #[test]
    fn test_construction_device_error() {
        let mut mixer = RecordingMixer::new();
        mixer.fail_next("no output device");
        let config = SoundConfig::default();
        let err = LevelSound::from_config(&config, &OverheadInfo::default(), mixer).unwrap_err();
        assert!(err.is_device_error());
    }

    #[test]
    fn test_set_music_mixer() {
        let mut sound = sound_in(AudioState::Normal);

        sound.overhead.status = LevelStatus::Level;
        sound.set_music_mixer().expect("level");
        assert_eq!(sound.mixer_mut().take_commands(), music(track::MAIN_THEME));
        assert_eq!(sound.state(), AudioState::Normal);

        sound.overhead.status = LevelStatus::GameOver;
        sound.set_music_mixer().expect("game over");
        assert_eq!(sound.mixer_mut().take_commands(), music(track::GAME_OVER));
        assert_eq!(sound.state(), AudioState::GameOver);
    }

    #[test]
    fn test_update_stores_inputs() {
        let mut sound = sound_in(AudioState::Normal);
        let mut info = GameInfo::new();
        info.insert("test_key".into(), json!("test_value"));
        let overhead = level(300).with_game_info(info.clone());
        let mario = CharacterSnapshot::new().with_state(MarioState::Walk);

        sound.update(&overhead, &mario).expect("update");

        assert_eq!(sound.game_info(), &info);
        assert_eq!(sound.character(), Some(&mario));
        assert_eq!(sound.overhead_info().time, 300);
        assert!(sound.mixer().commands().is_empty());
    }

    #[test]
    fn test_play_music() {
        let mut sound = sound_in(AudioState::Normal);
        sound
            .play_music(track::MAIN_THEME, AudioState::Flagpole)
            .expect("play");
        assert_eq!(sound.state(), AudioState::Flagpole);
        assert_eq!(sound.mixer().commands(), music(track::MAIN_THEME).as_slice());
    }

    #[test]
    fn test_play_music_unknown_track_keeps_state() {
        let mut sound = sound_in(AudioState::Normal);
        let err = sound
            .play_music("underground", AudioState::Flagpole)
            .unwrap_err();
        assert!(matches!(
            err,
            AudioError::AssetNotFound { kind: AssetKind::Music, .. }
        ));
        assert_eq!(sound.state(), AudioState::Normal);
        assert!(sound.mixer().commands().is_empty());
    }

    #[test]
    fn test_stop_music() {
        let mut sound = sound_in(AudioState::SpedUpNormal);
        sound.stop_music().expect("stop");
        assert_eq!(sound.mixer().commands(), &[MixerCommand::StopMusic]);
        assert_eq!(sound.state(), AudioState::SpedUpNormal);
    }

    #[test]
    fn test_handle_state_before_update_is_noop() {
        let mut sound = sound_in(AudioState::Normal);
        assert_eq!(sound.handle_state().expect("ok"), None);
        assert!(sound.mixer().commands().is_empty());
    }

    #[test]
    fn test_handle_state_normal_dead() {
        let mut sound = sound_in(AudioState::Normal);
        let mario = CharacterSnapshot::new().with_star(0).killed();
        sound.update(&level(50), &mario).expect("update");
        assert_eq!(sound.state(), AudioState::MarioDead);
        assert_eq!(sound.mixer().commands(), music(track::DEATH).as_slice());
    }

    #[test]
    fn test_handle_state_normal_invincible() {
        let mut sound = sound_in(AudioState::Normal);
        let mario = CharacterSnapshot::new().with_star(0);
        sound.update(&level(300), &mario).expect("update");
        assert_eq!(sound.state(), AudioState::MarioInvincible);
        assert_eq!(sound.mixer().commands(), music(track::INVINCIBLE).as_slice());
    }

    #[test]
    fn test_handle_state_normal_flagpole() {
        let mut sound = sound_in(AudioState::Normal);
        let mario = CharacterSnapshot::new().with_state(MarioState::Flagpole);
        sound.update(&level(300), &mario).expect("update");
        assert_eq!(sound.state(), AudioState::Flagpole);
        assert_eq!(sound.mixer().commands(), music(track::FLAGPOLE).as_slice());
    }

    #[test]
    fn test_handle_state_normal_time_warning() {
        let mut sound = sound_in(AudioState::Normal);
        sound
            .update(&level(100), &CharacterSnapshot::new())
            .expect("update");
        assert_eq!(sound.state(), AudioState::TimeWarning);
        assert_eq!(sound.mixer().commands(), music(track::OUT_OF_TIME).as_slice());
    }

    #[test]
    fn test_handle_state_flagpole_walking_to_castle() {
        let mut sound = sound_in(AudioState::Flagpole);
        let mario = CharacterSnapshot::new().with_state(MarioState::WalkingToCastle);
        sound.update(&level(300), &mario).expect("update");
        assert_eq!(sound.state(), AudioState::StageClear);
        assert_eq!(sound.mixer().commands(), music(track::STAGE_CLEAR).as_slice());
    }

    #[test]
    fn test_handle_state_stage_clear() {
        let mut sound = sound_in(AudioState::StageClear);
        let mut mario = CharacterSnapshot::new().with_state(MarioState::WalkingToCastle);
        mario.in_castle = true;

        sound.update(&level(300), &mario).expect("update");
        sound.handle_state().expect("second evaluation");

        assert_eq!(sound.state(), AudioState::FastCountDown);
        assert_eq!(
            sound.mixer().commands(),
            &[MixerCommand::PlayEffect(effect::COUNT_DOWN.into())]
        );
    }

    #[test]
    fn test_handle_state_fast_count_down() {
        let mut sound = sound_in(AudioState::FastCountDown);
        let mut mario = CharacterSnapshot::new().with_state(MarioState::WalkingToCastle);
        mario.in_castle = true;

        sound.update(&level(0), &mario).expect("update");
        sound.handle_state().expect("second evaluation");

        assert_eq!(sound.state(), AudioState::WorldClear);
        assert_eq!(
            sound.mixer().commands(),
            &[MixerCommand::StopEffect(effect::COUNT_DOWN.into())]
        );
    }

    #[test]
    fn test_handle_state_time_warning_jingle_finished() {
        let mut sound = sound_in(AudioState::TimeWarning);
        sound.mixer_mut().set_busy(false);
        sound
            .update(&level(0), &CharacterSnapshot::new())
            .expect("update");
        assert_eq!(sound.state(), AudioState::SpedUpNormal);
        assert_eq!(
            sound.mixer().commands(),
            music(track::MAIN_THEME_SPED_UP).as_slice()
        );
    }

    #[test]
    fn test_handle_state_time_warning_dead_while_busy() {
        let mut sound = sound_in(AudioState::TimeWarning);
        sound.mixer_mut().set_busy(true);
        sound
            .update(&level(0), &CharacterSnapshot::new().killed())
            .expect("update");
        assert_eq!(sound.state(), AudioState::MarioDead);
        assert_eq!(sound.mixer().commands(), music(track::DEATH).as_slice());
    }

    #[test]
    fn test_handle_state_time_warning_waits_while_busy() {
        let mut sound = sound_in(AudioState::TimeWarning);
        sound.mixer_mut().set_busy(true);
        sound
            .update(&level(90), &CharacterSnapshot::new())
            .expect("update");
        assert_eq!(sound.state(), AudioState::TimeWarning);
        assert!(sound.mixer().commands().is_empty());
    }

    #[test]
    fn test_handle_state_sped_up_normal() {
        let mut sound = sound_in(AudioState::SpedUpNormal);
        sound
            .update(&level(0), &CharacterSnapshot::new().killed())
            .expect("update");
        assert_eq!(sound.state(), AudioState::MarioDead);

        let mut sound = sound_in(AudioState::SpedUpNormal);
        let mario = CharacterSnapshot::new().with_state(MarioState::Flagpole);
        sound.update(&level(0), &mario).expect("update");
        assert_eq!(sound.state(), AudioState::Flagpole);
        assert_eq!(sound.mixer().commands(), music(track::FLAGPOLE).as_slice());
    }

    #[test]
    fn test_handle_state_mario_invincible() {
        let mut sound = sound_in(AudioState::MarioInvincible);
        let mario = CharacterSnapshot::new()
            .with_state(MarioState::Flagpole)
            .with_star(0)
            .at_time(100_000_000);
        sound.update(&level(0), &mario).expect("update");
        assert_eq!(sound.state(), AudioState::Normal);
        assert_eq!(sound.mixer().commands(), music(track::MAIN_THEME).as_slice());

        let mut sound = sound_in(AudioState::MarioInvincible);
        let mario = CharacterSnapshot::new().with_star(1).at_time(1).killed();
        sound.update(&level(0), &mario).expect("update");
        assert_eq!(sound.state(), AudioState::MarioDead);
    }

    #[test]
    fn test_terminal_states_do_nothing() {
        for state in [AudioState::WorldClear, AudioState::MarioDead, AudioState::GameOver] {
            let mut sound = sound_in(state);
            sound.handle_state().expect("no character yet");

            let mut mario = CharacterSnapshot::new().with_star(0).killed();
            mario.in_castle = true;
            sound.update(&level(0), &mario).expect("update");

            assert_eq!(sound.state(), state);
            assert!(sound.mixer().commands().is_empty());
        }
    }

    #[test]
    fn test_device_error_keeps_state() {
        let mut sound = sound_in(AudioState::Normal);
        sound.mixer_mut().fail_next("device unplugged");

        let mario = CharacterSnapshot::new().killed();
        let err = sound.update(&level(300), &mario).unwrap_err();
        assert!(err.is_device_error());
        assert_eq!(sound.state(), AudioState::Normal);

        // The next frame retries and succeeds
        sound.update(&level(300), &mario).expect("retry");
        assert_eq!(sound.state(), AudioState::MarioDead);
    }

    #[test]
    fn test_missing_effect_keeps_state() {
        let mut config = SoundConfig::default();
        config.effects.remove(effect::COUNT_DOWN);
        let mut sound =
            LevelSound::from_config(&config, &OverheadInfo::default(), RecordingMixer::new())
                .expect("construct");
        sound.state = AudioState::StageClear;

        let mut mario = CharacterSnapshot::new().with_state(MarioState::WalkingToCastle);
        mario.in_castle = true;
        let err = sound.update(&level(200), &mario).unwrap_err();

        assert!(matches!(
            err,
            AudioError::AssetNotFound { kind: AssetKind::Effect, .. }
        ));
        assert_eq!(sound.state(), AudioState::StageClear);
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut sound = sound_in(AudioState::Normal);
        let mario = CharacterSnapshot::new().with_state(MarioState::Flagpole);

        sound.update(&level(300), &mario).expect("first");
        sound.update(&level(300), &mario).expect("second");

        assert_eq!(sound.state(), AudioState::Flagpole);
        assert_eq!(sound.mixer().commands(), music(track::FLAGPOLE).as_slice());
    }

    fn expected_commands(transition: Option<Transition>) -> Vec<MixerCommand> {
        match transition.map(|t| t.action) {
            None => Vec::new(),
            Some(AudioAction::PlayMusic(name)) => music(name),
            Some(AudioAction::PlayEffect(name)) => vec![MixerCommand::PlayEffect(name.into())],
            Some(AudioAction::StopEffect(name)) => vec![MixerCommand::StopEffect(name.into())],
        }
    }

    fn any_audio_state() -> impl Strategy<Value = AudioState> {
        proptest::sample::select(AudioState::ALL.to_vec())
    }

    fn any_mario_state() -> impl Strategy<Value = MarioState> {
        prop_oneof![
            Just(MarioState::Stand),
            Just(MarioState::Walk),
            Just(MarioState::Flagpole),
            Just(MarioState::WalkingToCastle),
            Just(MarioState::DeathJump),
        ]
    }

    prop_compose! {
        fn any_character()(
            dead in any::<bool>(),
            invincible in any::<bool>(),
            losing in any::<bool>(),
            state in any_mario_state(),
            in_castle in any::<bool>(),
            current_time in 0u64..30_000,
            start in 0u64..30_000
        ) -> CharacterSnapshot {
            CharacterSnapshot {
                dead,
                invincible,
                losing_invincibility: losing,
                state,
                in_castle,
                current_time,
                invincible_start_timer: start,
            }
        }
    }

    proptest! {
        #[test]
        fn prop_update_follows_table(
            state in any_audio_state(),
            mario in any_character(),
            time in 0u32..400,
            busy in any::<bool>()
        ) {
            let mut sound = sound_in(state);
            sound.mixer_mut().set_busy(busy);
            let ctx = FrameContext::new(mario, time, busy);

            let first = audio_state::transition(state, &ctx, sound.tuning());
            sound.update(&level(time), &mario).expect("first update");
            prop_assert_eq!(sound.mixer_mut().take_commands(), expected_commands(first));
            prop_assert_eq!(sound.state(), first.map_or(state, |t| t.next));

            // Same inputs again: only the new state's own table can fire
            let reached = sound.state();
            let second = audio_state::transition(reached, &ctx, sound.tuning());
            sound.update(&level(time), &mario).expect("second update");
            prop_assert_eq!(sound.mixer_mut().take_commands(), expected_commands(second));
            if second.is_none() {
                prop_assert_eq!(sound.state(), reached);
            }
        }
    }

    #[test]
    fn test_frame_context_reads_busy_each_call() {
        let mut sound = sound_in(AudioState::Normal);
        sound
            .update(&level(300), &CharacterSnapshot::new())
            .expect("update");

        sound.mixer_mut().set_busy(true);
        assert!(sound.frame_context().expect("ctx").mixer_busy);
        sound.mixer_mut().set_busy(false);
        assert!(!sound.frame_context().expect("ctx").mixer_busy);
    }
}
