//! Game state and core types
//!
//! Everything the view needs to paint a frame lives in [`GameState`].

use serde::{Deserialize, Serialize};

use crate::config::Category;
use crate::consts::FIRST_LEVEL;
use crate::progress_percent;

/// Current phase of the turn state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Level start countdown, every card shown face-up
    Previewing,
    /// Waiting for the player to flip a card
    Idle,
    /// Two cards face-up, resolution pending
    Checking,
    /// Every pair found, next level pending
    LevelComplete,
    /// Final level cleared (terminal until play-again)
    GameComplete,
}

/// A single card in the deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Position in the current deck (0..N-1)
    pub id: u32,
    #[serde(alias = "emoji")]
    pub symbol: String,
    pub is_flipped: bool,
    pub is_matched: bool,
}

impl Card {
    pub fn new(id: u32, symbol: impl Into<String>) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            is_flipped: false,
            is_matched: false,
        }
    }

    /// Whether the player may flip this card
    pub fn is_selectable(&self) -> bool {
        !self.is_flipped && !self.is_matched
    }
}

/// Notification emitted by the state machine for the view layer
///
/// Carries what the view needs for flourishes (flying symbols, progress
/// pulse, stat animations) without the core touching the DOM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    LevelStarted { level: u8, category: Category },
    PreviewTick { remaining: u32 },
    PreviewEnded,
    CardFlipped { id: u32 },
    MatchFound {
        symbol: String,
        card_ids: [u32; 2],
        /// Progress (%) before this pair counted, where a flying symbol starts
        progress_before: f32,
        progress: f32,
    },
    Mismatch { card_ids: [u32; 2], penalty: u32 },
    CardsHidden { card_ids: Vec<u32> },
    ScoreChanged { from: u32, to: u32 },
    LevelComplete { level: u8 },
    GameComplete { score: u32 },
    GameResumed { level: u8, score: u32 },
    ResumeNoticeCleared,
    CategorySwitched { category: Category },
    GameReset,
}

/// Complete mutable game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub category: Category,
    /// Cards of the current level, ordered by id
    pub deck: Vec<Card>,
    /// Ids of the face-up, unresolved cards (at most two)
    pub flipped: Vec<u32>,
    pub score: u32,
    /// Pairs matched this level
    pub correct: u32,
    /// Mismatches this level
    pub incorrect: u32,
    /// Current level (1-based)
    pub level: u8,
    pub phase: GamePhase,
    /// Preview ticks left
    pub preview_remaining: u32,
    /// Bumped on every level start; timers from older generations are stale
    pub generation: u64,
    /// Game was restored from a save and the notice is still showing
    pub resumed: bool,
    /// Events not yet drained by the host
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Blank state with no deck dealt yet
    pub fn new(category: Category) -> Self {
        Self {
            category,
            deck: Vec::new(),
            flipped: Vec::with_capacity(2),
            score: 0,
            correct: 0,
            incorrect: 0,
            level: FIRST_LEVEL,
            phase: GamePhase::Previewing,
            preview_remaining: 0,
            generation: 0,
            resumed: false,
            events: Vec::new(),
        }
    }

    pub fn card(&self, id: u32) -> Option<&Card> {
        self.deck.get(id as usize)
    }

    pub fn card_mut(&mut self, id: u32) -> Option<&mut Card> {
        self.deck.get_mut(id as usize)
    }

    /// Pairs in the current deck
    pub fn total_pairs(&self) -> u32 {
        (self.deck.len() / 2) as u32
    }

    /// Pairs matched, counted from the deck itself
    pub fn matched_pairs(&self) -> u32 {
        (self.deck.iter().filter(|c| c.is_matched).count() / 2) as u32
    }

    /// Level progress in percent
    pub fn progress(&self) -> f32 {
        progress_percent(self.correct, self.total_pairs())
    }

    /// Every card of a non-empty deck is matched
    pub fn is_level_cleared(&self) -> bool {
        !self.deck.is_empty() && self.deck.iter().all(|c| c.is_matched)
    }

    /// Anything a category switch or reset would throw away
    pub fn has_progress(&self) -> bool {
        self.score > 0 || self.correct > 0 || self.incorrect > 0 || self.level > FIRST_LEVEL
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Set the score, emitting a change event when it moves
    pub(crate) fn set_score(&mut self, score: u32) {
        if score != self.score {
            let from = self.score;
            self.score = score;
            self.emit(GameEvent::ScoreChanged { from, to: score });
        }
    }

    /// Turn every unmatched card face-down, returning the ids that changed
    pub(crate) fn hide_unmatched(&mut self) -> Vec<u32> {
        self.deck
            .iter_mut()
            .filter(|c| c.is_flipped && !c.is_matched)
            .map(|c| {
                c.is_flipped = false;
                c.id
            })
            .collect()
    }
}
