//! Read-only character snapshot consumed by the audio coordinator.
//!
//! The actor simulation owns the real character; each frame it hands the
//! coordinator a copy of the handful of facts that drive music selection.

use serde::{Deserialize, Serialize};

/// Movement/status tag of the protagonist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarioState {
    /// Standing still
    #[default]
    Stand,
    /// Walking or running
    Walk,
    /// Rising from a jump
    Jump,
    /// Falling
    Fall,
    /// Growing from small to big
    SmallToBig,
    /// Shrinking from big to small after a hit
    BigToSmall,
    /// Picking up a fire flower
    BigToFire,
    /// Sliding down the flagpole
    Flagpole,
    /// Walking from the flagpole to the castle
    WalkingToCastle,
    /// Dropping off the flagpole at the end of the level
    EndOfLevelFall,
    /// Death animation
    DeathJump,
}

/// Character facts sampled once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterSnapshot {
    /// The character has died this level.
    pub dead: bool,
    /// A star is active.
    pub invincible: bool,
    /// The star is about to run out (blinking phase).
    pub losing_invincibility: bool,
    /// Movement/status tag.
    pub state: MarioState,
    /// The character has walked inside the castle.
    pub in_castle: bool,
    /// Character clock in milliseconds.
    pub current_time: u64,
    /// Character clock value when the star was collected.
    pub invincible_start_timer: u64,
}

impl CharacterSnapshot {
    /// Creates a live, standing character.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the movement/status tag.
    #[must_use]
    pub fn with_state(mut self, state: MarioState) -> Self {
        self.state = state;
        self
    }

    /// Marks the character dead.
    #[must_use]
    pub fn killed(mut self) -> Self {
        self.dead = true;
        self.state = MarioState::DeathJump;
        self
    }

    /// Starts invincibility at the given character clock.
    #[must_use]
    pub fn with_star(mut self, started_at: u64) -> Self {
        self.invincible = true;
        self.losing_invincibility = false;
        self.invincible_start_timer = started_at;
        self
    }

    /// Sets the character clock.
    #[must_use]
    pub fn at_time(mut self, current_time: u64) -> Self {
        self.current_time = current_time;
        self
    }

    /// Milliseconds since the star was collected.
    #[must_use]
    pub fn invincible_elapsed_ms(&self) -> u64 {
        self.current_time.saturating_sub(self.invincible_start_timer)
    }
}
