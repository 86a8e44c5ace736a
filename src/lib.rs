//! Memory Match - a multi-level memory card game
//!
//! Core modules:
//! - `config`: Data-driven symbol pools, level table and timings
//! - `sim`: Deterministic game state machine (deck, turns, timers)
//! - `game`: Controller owning state, timers and persistence
//! - `persistence`: Save/resume through a key-value store
//! - `platform`: Browser bindings and host helpers

pub mod config;
pub mod game;
pub mod persistence;
pub mod platform;
pub mod sim;

pub use config::{Category, CategoryPools, ConfigError, GameConfig, LevelConfig, Timing};
pub use game::{CategorySwitch, Game, GameView};
pub use persistence::{MemoryStorage, SaveStore, Snapshot, Storage, StorageError};
pub use sim::{Card, GameEvent, GamePhase, GameState, Timer, TimerKind};

/// Game configuration constants
pub mod consts {
    /// Points awarded for each matched pair
    pub const MATCH_REWARD: u32 = 10;
    /// Number of levels in the default table
    pub const MAX_LEVEL: u8 = 6;
    /// Level every fresh game starts at
    pub const FIRST_LEVEL: u8 = 1;

    /// Preview countdown length (ticks)
    pub const PREVIEW_TICKS: u32 = 3;
    /// Length of one preview tick (ms)
    pub const PREVIEW_TICK_MS: u64 = 1000;
    /// Delay between the second flip and match resolution (ms)
    pub const RESOLVE_DELAY_MS: u64 = 1000;
    /// Extra time a mismatched pair stays face-up after resolving (ms);
    /// 0 turns it face-down as it resolves
    pub const FLIP_BACK_DELAY_MS: u64 = 0;
    /// Pause between clearing a level and starting the next (ms)
    pub const LEVEL_TRANSITION_MS: u64 = 5000;
    /// How long the "game resumed" notice stays up (ms)
    pub const RESUME_NOTICE_MS: u64 = 3000;

    /// Storage key holding the saved game
    pub const STORAGE_KEY: &str = "memoryGameState";
}

/// Percentage of `matched` out of `total` pairs, 0 when there is nothing to match
#[inline]
pub fn progress_percent(matched: u32, total: u32) -> f32 {
    if total == 0 {
        return 0.0;
    }
    matched as f32 / total as f32 * 100.0
}
