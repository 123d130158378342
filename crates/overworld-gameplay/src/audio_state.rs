//! Level audio state machine.
//!
//! This module provides:
//! - `AudioState`: what the level is currently playing
//! - `FrameContext`: the facts sampled for one evaluation
//! - `Rule` tables: ordered (trigger, action, next state) rows per state
//! - `transition`: the pure decision function
//!
//! Rules for a state are checked in order and the first trigger that holds
//! wins. A state with no rows is terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::character::{CharacterSnapshot, MarioState};
use crate::music::{effect, track};

/// Remaining seconds at or below which the hurry-up jingle plays.
pub const DEFAULT_TIME_WARNING_THRESHOLD: u32 = 100;

/// How long a star lasts, in character-clock milliseconds.
pub const DEFAULT_INVINCIBILITY_DURATION_MS: u64 = 11_000;

/// Current audio mode of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioState {
    /// Main theme.
    #[default]
    Normal,
    /// Flagpole slide.
    Flagpole,
    /// Walking to the castle.
    StageClear,
    /// Score tally ticking down.
    FastCountDown,
    /// Level finished.
    WorldClear,
    /// Character died.
    MarioDead,
    /// Hurry-up jingle.
    TimeWarning,
    /// Main theme at hurry-up tempo.
    SpedUpNormal,
    /// Star music.
    MarioInvincible,
    /// Game over screen.
    GameOver,
}

impl AudioState {
    /// All states.
    pub const ALL: [Self; 10] = [
        Self::Normal,
        Self::Flagpole,
        Self::StageClear,
        Self::FastCountDown,
        Self::WorldClear,
        Self::MarioDead,
        Self::TimeWarning,
        Self::SpedUpNormal,
        Self::MarioInvincible,
        Self::GameOver,
    ];

    /// Returns true if no rule leads out of this state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        rules(self).is_empty()
    }

    /// Snake-case name used in logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Flagpole => "flagpole",
            Self::StageClear => "stage_clear",
            Self::FastCountDown => "fast_count_down",
            Self::WorldClear => "world_clear",
            Self::MarioDead => "mario_dead",
            Self::TimeWarning => "time_warning",
            Self::SpedUpNormal => "sped_up_normal",
            Self::MarioInvincible => "mario_invincible",
            Self::GameOver => "game_over",
        }
    }
}

impl fmt::Display for AudioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Thresholds the triggers compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuning {
    /// Remaining seconds at or below which the hurry-up jingle plays.
    pub time_warning_threshold: u32,
    /// Star duration in character-clock milliseconds.
    pub invincibility_duration_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            time_warning_threshold: DEFAULT_TIME_WARNING_THRESHOLD,
            invincibility_duration_ms: DEFAULT_INVINCIBILITY_DURATION_MS,
        }
    }
}

/// Everything one evaluation of the table may look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameContext {
    /// Character facts for this frame.
    pub character: CharacterSnapshot,
    /// Remaining level time in seconds.
    pub remaining_time: u32,
    /// Whether the mixer is still playing the current track.
    pub mixer_busy: bool,
}

impl FrameContext {
    /// Creates a context.
    #[must_use]
    pub fn new(character: CharacterSnapshot, remaining_time: u32, mixer_busy: bool) -> Self {
        Self {
            character,
            remaining_time,
            mixer_busy,
        }
    }
}

/// Playback command attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioAction {
    /// Load and play a music track.
    PlayMusic(&'static str),
    /// Start a sound effect.
    PlayEffect(&'static str),
    /// Stop a sound effect.
    StopEffect(&'static str),
}

impl fmt::Display for AudioAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayMusic(name) => write!(f, "play music '{name}'"),
            Self::PlayEffect(name) => write!(f, "play effect '{name}'"),
            Self::StopEffect(name) => write!(f, "stop effect '{name}'"),
        }
    }
}

/// Result of a rule firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Command to issue before committing.
    pub action: AudioAction,
    /// State to commit once the command succeeded.
    pub next: AudioState,
}

/// Trigger predicate.
pub type Trigger = fn(&FrameContext, &Tuning) -> bool;

/// One row of the decision table.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Short label for logs.
    pub label: &'static str,
    /// Condition that fires the rule.
    pub trigger: Trigger,
    /// Command to issue.
    pub action: AudioAction,
    /// Resulting state.
    pub next: AudioState,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("action", &self.action)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

impl Rule {
    const fn new(
        label: &'static str,
        trigger: Trigger,
        action: AudioAction,
        next: AudioState,
    ) -> Self {
        Self {
            label,
            trigger,
            action,
            next,
        }
    }

    /// The transition this rule produces.
    #[must_use]
    pub fn transition(&self) -> Transition {
        Transition {
            action: self.action,
            next: self.next,
        }
    }
}

fn is_dead(ctx: &FrameContext, _: &Tuning) -> bool {
    ctx.character.dead
}

fn has_fresh_star(ctx: &FrameContext, _: &Tuning) -> bool {
    ctx.character.invincible && !ctx.character.losing_invincibility
}

fn on_flagpole(ctx: &FrameContext, _: &Tuning) -> bool {
    ctx.character.state == MarioState::Flagpole
}

fn running_out_of_time(ctx: &FrameContext, tuning: &Tuning) -> bool {
    ctx.remaining_time <= tuning.time_warning_threshold
        && ctx.character.state == MarioState::Stand
}

fn walking_to_castle(ctx: &FrameContext, _: &Tuning) -> bool {
    ctx.character.state == MarioState::WalkingToCastle
}

fn entered_castle(ctx: &FrameContext, _: &Tuning) -> bool {
    ctx.character.in_castle && ctx.character.state == MarioState::WalkingToCastle
}

fn clock_empty(ctx: &FrameContext, _: &Tuning) -> bool {
    ctx.remaining_time == 0
}

fn mixer_idle(ctx: &FrameContext, _: &Tuning) -> bool {
    !ctx.mixer_busy
}

// Only reachable while the hurry-up jingle is still playing.
fn dead_while_busy(ctx: &FrameContext, _: &Tuning) -> bool {
    ctx.mixer_busy && ctx.character.dead
}

fn star_expired(ctx: &FrameContext, tuning: &Tuning) -> bool {
    ctx.character.invincible_elapsed_ms() > tuning.invincibility_duration_ms
}

const DIE: Rule = Rule::new(
    "dead",
    is_dead,
    AudioAction::PlayMusic(track::DEATH),
    AudioState::MarioDead,
);

const SLIDE_FLAGPOLE: Rule = Rule::new(
    "flagpole",
    on_flagpole,
    AudioAction::PlayMusic(track::FLAGPOLE),
    AudioState::Flagpole,
);

static NORMAL: [Rule; 4] = [
    DIE,
    Rule::new(
        "invincible",
        has_fresh_star,
        AudioAction::PlayMusic(track::INVINCIBLE),
        AudioState::MarioInvincible,
    ),
    SLIDE_FLAGPOLE,
    Rule::new(
        "time warning",
        running_out_of_time,
        AudioAction::PlayMusic(track::OUT_OF_TIME),
        AudioState::TimeWarning,
    ),
];

static FLAGPOLE: [Rule; 1] = [Rule::new(
    "walking to castle",
    walking_to_castle,
    AudioAction::PlayMusic(track::STAGE_CLEAR),
    AudioState::StageClear,
)];

static STAGE_CLEAR: [Rule; 1] = [Rule::new(
    "in castle",
    entered_castle,
    AudioAction::PlayEffect(effect::COUNT_DOWN),
    AudioState::FastCountDown,
)];

static FAST_COUNT_DOWN: [Rule; 1] = [Rule::new(
    "clock empty",
    clock_empty,
    AudioAction::StopEffect(effect::COUNT_DOWN),
    AudioState::WorldClear,
)];

static TIME_WARNING: [Rule; 2] = [
    Rule::new(
        "jingle finished",
        mixer_idle,
        AudioAction::PlayMusic(track::MAIN_THEME_SPED_UP),
        AudioState::SpedUpNormal,
    ),
    Rule::new(
        "dead",
        dead_while_busy,
        AudioAction::PlayMusic(track::DEATH),
        AudioState::MarioDead,
    ),
];

static SPED_UP_NORMAL: [Rule; 2] = [DIE, SLIDE_FLAGPOLE];

static MARIO_INVINCIBLE: [Rule; 2] = [
    DIE,
    Rule::new(
        "star expired",
        star_expired,
        AudioAction::PlayMusic(track::MAIN_THEME),
        AudioState::Normal,
    ),
];

/// Ordered rules leaving `state`.
#[must_use]
pub fn rules(state: AudioState) -> &'static [Rule] {
    match state {
        AudioState::Normal => &NORMAL,
        AudioState::Flagpole => &FLAGPOLE,
        AudioState::StageClear => &STAGE_CLEAR,
        AudioState::FastCountDown => &FAST_COUNT_DOWN,
        AudioState::TimeWarning => &TIME_WARNING,
        AudioState::SpedUpNormal => &SPED_UP_NORMAL,
        AudioState::MarioInvincible => &MARIO_INVINCIBLE,
        AudioState::WorldClear | AudioState::MarioDead | AudioState::GameOver => &[],
    }
}

/// First rule of `state` whose trigger holds.
#[must_use]
pub fn matching_rule(
    state: AudioState,
    ctx: &FrameContext,
    tuning: &Tuning,
) -> Option<&'static Rule> {
    rules(state).iter().find(|rule| (rule.trigger)(ctx, tuning))
}

/// Decides what, if anything, should happen this frame.
#[must_use]
pub fn transition(state: AudioState, ctx: &FrameContext, tuning: &Tuning) -> Option<Transition> {
    matching_rule(state, ctx, tuning).map(Rule::transition)
}
