//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Seeding (wall clock)
//! - Storage backend selection (LocalStorage on web, files on native)
//! - The JavaScript-facing game handle (web only)

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Seed for a new game's RNG, taken from the wall clock
#[cfg(target_arch = "wasm32")]
pub fn clock_seed() -> u64 {
    js_sys::Date::now() as u64
}

/// Seed for a new game's RNG, taken from the wall clock
#[cfg(not(target_arch = "wasm32"))]
pub fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
