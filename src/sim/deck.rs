//! Deck generation
//!
//! The only source of cards: the state machine calls [`generate_deck`] at
//! every level start.

use rand::Rng;
use rand::seq::SliceRandom;

use super::state::Card;
use crate::config::{Category, ConfigError, GameConfig, check_pool};

/// Build a shuffled, paired deck for `category` at `level`
///
/// Takes the first `rows*cols/2` symbols of the category pool, duplicates
/// them and applies a Fisher-Yates shuffle. Ids follow the shuffled order.
/// Fails instead of reusing symbols when the pool is too small.
pub fn generate_deck<R: Rng + ?Sized>(
    config: &GameConfig,
    category: Category,
    level: u8,
    rng: &mut R,
) -> Result<Vec<Card>, ConfigError> {
    let level_cfg = config.level(level)?;
    if level_cfg.card_count() % 2 != 0 {
        return Err(ConfigError::OddCardCount {
            level,
            cards: level_cfg.card_count(),
        });
    }
    check_pool(config, category, level)?;

    let pairs = level_cfg.pair_count() as usize;
    let selected = &config.pools.get(category)[..pairs];

    let mut symbols: Vec<&str> = selected
        .iter()
        .chain(selected.iter())
        .map(String::as_str)
        .collect();
    symbols.shuffle(rng);

    log::debug!(
        "Generating {} deck for level {}: {}x{} = {} cards ({} pairs)",
        category,
        level,
        level_cfg.rows,
        level_cfg.cols,
        symbols.len(),
        pairs
    );

    Ok(symbols
        .into_iter()
        .enumerate()
        .map(|(id, symbol)| Card::new(id as u32, symbol))
        .collect())
}
