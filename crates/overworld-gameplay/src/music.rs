//! Logical names of the music tracks and sound effects a level uses.
//!
//! These names are the keys of the asset tables; the decision table only
//! ever refers to assets through them.

/// Music track names.
pub mod track {
    /// Overworld theme.
    pub const MAIN_THEME: &str = "main_theme";
    /// Overworld theme at hurry-up tempo.
    pub const MAIN_THEME_SPED_UP: &str = "main_theme_sped_up";
    /// Hurry-up jingle played when the clock gets low.
    pub const OUT_OF_TIME: &str = "out_of_time";
    /// Star music.
    pub const INVINCIBLE: &str = "invincible";
    /// Flagpole slide.
    pub const FLAGPOLE: &str = "flagpole";
    /// Fanfare while walking to the castle.
    pub const STAGE_CLEAR: &str = "stage_clear";
    /// Fanfare after the castle flag is raised.
    pub const WORLD_CLEAR: &str = "world_clear";
    /// Death jingle.
    pub const DEATH: &str = "death";
    /// Game over jingle.
    pub const GAME_OVER: &str = "game_over";
}

/// Sound effect names.
pub mod effect {
    /// Ticking score tally after the level is cleared.
    pub const COUNT_DOWN: &str = "count_down";
}

/// Tracks that must be present in the music registry.
pub const REQUIRED_TRACKS: [&str; 9] = [
    track::DEATH,
    track::OUT_OF_TIME,
    track::INVINCIBLE,
    track::WORLD_CLEAR,
    track::MAIN_THEME,
    track::FLAGPOLE,
    track::MAIN_THEME_SPED_UP,
    track::STAGE_CLEAR,
    track::GAME_OVER,
];

/// Effects that must be present in the effect registry.
pub const REQUIRED_EFFECTS: [&str; 1] = [effect::COUNT_DOWN];

/// Whether a track should repeat until replaced.
///
/// Jingles play once so the mixer reports idle when they finish; the
/// hurry-up jingle relies on this to hand over to the sped-up theme.
#[must_use]
pub fn track_loops(name: &str) -> bool {
    matches!(
        name,
        track::MAIN_THEME | track::MAIN_THEME_SPED_UP | track::INVINCIBLE | track::GAME_OVER
    )
}
