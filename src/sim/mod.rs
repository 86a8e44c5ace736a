//! Deterministic game simulation
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Seeded RNG only
//! - Time only through the timer queue
//! - No rendering, storage or platform dependencies

pub mod deck;
pub mod state;
pub mod tick;
pub mod timer;

pub use deck::generate_deck;
pub use state::{Card, GameEvent, GamePhase, GameState};
pub use tick::{
    Context, check_level_completion, fire_timer, flip_back, handle_card_click, preview_tick,
    resolve_match, resume, start_level,
};
pub use timer::{Timer, TimerKind, TimerQueue};
