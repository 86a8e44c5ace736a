//! Persisted subset of the game state

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Category, GameConfig};
use crate::sim::{Card, GamePhase, GameState};

/// Why a loaded snapshot cannot be resumed
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("saved deck is empty")]
    EmptyDeck,
    #[error("saved level {0} is not in the level table")]
    UnknownLevel(u8),
    #[error("saved deck has {actual} cards, level {level} deals {expected}")]
    DeckSize { level: u8, expected: usize, actual: usize },
    #[error("card at position {position} has id {id}")]
    CardId { position: usize, id: u32 },
    #[error("symbol {symbol} appears {count} times")]
    UnpairedSymbol { symbol: String, count: usize },
    #[error("pair {symbol} is only half matched")]
    HalfMatched { symbol: String },
    #[error("symbol {symbol} is not dealt for {category} at level {level}")]
    ForeignSymbol {
        symbol: String,
        category: Category,
        level: u8,
    },
}

/// What survives a reload: category, deck, counters and level
///
/// JSON keys are camelCase. There is no schema version field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub category: Category,
    pub cards: Vec<Card>,
    pub score: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub level: u8,
    #[serde(default)]
    pub is_game_complete: bool,
}

impl Snapshot {
    /// Capture `state`; only matched cards are stored face-up
    pub fn from_state(state: &GameState) -> Self {
        let cards = state
            .deck
            .iter()
            .map(|card| Card {
                is_flipped: card.is_matched,
                ..card.clone()
            })
            .collect();

        Self {
            category: state.category,
            cards,
            score: state.score,
            correct: state.correct,
            incorrect: state.incorrect,
            level: state.level,
            is_game_complete: state.phase == GamePhase::GameComplete,
        }
    }

    /// Check the snapshot describes a deck the game could have dealt
    pub fn validate(&self, config: &GameConfig) -> Result<(), SnapshotError> {
        if self.cards.is_empty() {
            return Err(SnapshotError::EmptyDeck);
        }

        let level_cfg = config
            .level(self.level)
            .map_err(|_| SnapshotError::UnknownLevel(self.level))?;
        let expected = level_cfg.card_count() as usize;
        if self.cards.len() != expected {
            return Err(SnapshotError::DeckSize {
                level: self.level,
                expected,
                actual: self.cards.len(),
            });
        }

        let mut pairs: HashMap<&str, (usize, usize)> = HashMap::new();
        for (position, card) in self.cards.iter().enumerate() {
            if card.id as usize != position {
                return Err(SnapshotError::CardId {
                    position,
                    id: card.id,
                });
            }
            let entry = pairs.entry(card.symbol.as_str()).or_default();
            entry.0 += 1;
            entry.1 += usize::from(card.is_matched);
        }

        let pool = config.pools.get(self.category);
        let dealt = pool.get(..level_cfg.pair_count() as usize).unwrap_or(pool);

        for (symbol, (count, matched)) in pairs {
            if count != 2 {
                return Err(SnapshotError::UnpairedSymbol {
                    symbol: symbol.to_string(),
                    count,
                });
            }
            if matched == 1 {
                return Err(SnapshotError::HalfMatched {
                    symbol: symbol.to_string(),
                });
            }
            if !dealt.iter().any(|s| s == symbol) {
                return Err(SnapshotError::ForeignSymbol {
                    symbol: symbol.to_string(),
                    category: self.category,
                    level: self.level,
                });
            }
        }

        Ok(())
    }

    /// Rebuild a game state with nothing mid-flip
    ///
    /// Unmatched cards come back face-down, no card is pending and the
    /// correct counter is recounted from the deck.
    pub fn into_state(self) -> GameState {
        let mut state = GameState::new(self.category);
        state.deck = self
            .cards
            .into_iter()
            .map(|card| Card {
                is_flipped: card.is_matched,
                ..card
            })
            .collect();
        state.score = self.score;
        state.correct = state.matched_pairs();
        state.incorrect = self.incorrect;
        state.level = self.level;
        state.phase = GamePhase::Idle;
        state
    }
}
