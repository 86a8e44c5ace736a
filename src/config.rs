//! Data-driven game balance
//!
//! Symbol pools, the level table and timings are plain data handed to the
//! game at construction. Hosts may override them from JSON; every config is
//! validated before the first deck is dealt.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Card symbol category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    #[default]
    Animals,
    Symbols,
    Foods,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 3] = [Category::Animals, Category::Symbols, Category::Foods];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Animals => "Animals",
            Category::Symbols => "Symbols",
            Category::Foods => "Foods",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "animals" | "animal" => Some(Category::Animals),
            "symbols" | "symbol" => Some(Category::Symbols),
            "foods" | "food" => Some(Category::Foods),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbol pool for each category
///
/// Pool order is fixed: a level with `n` pairs always uses the first `n`
/// symbols of its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPools {
    pub animals: Vec<String>,
    pub symbols: Vec<String>,
    pub foods: Vec<String>,
}

impl CategoryPools {
    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::Animals => &self.animals,
            Category::Symbols => &self.symbols,
            Category::Foods => &self.foods,
        }
    }
}

impl Default for CategoryPools {
    fn default() -> Self {
        fn pool(symbols: &[&str]) -> Vec<String> {
            symbols.iter().map(|s| s.to_string()).collect()
        }

        Self {
            animals: pool(&[
                "🐘", "🦊", "🐞", "🐸", "🐨", "🐌", "🦁", "🐛", "🦒", "🦓", "🐅", "🐆", "🦘", "🐪",
                "🦏",
            ]),
            symbols: pool(&[
                "⚛️", "☯️", "☮️", "⚠️", "♻️", "⚜️", "➿", "🌀", "⭐", "💫", "✨", "🔆", "🌟", "💎",
                "🎭",
            ]),
            foods: pool(&[
                "🍕", "🍔", "🍓", "🥑", "🌽", "🍩", "🍪", "🍉", "🍇", "🍊", "🍌", "🥝", "🍒", "🥥",
                "🍑",
            ]),
        }
    }
}

/// Grid shape and scoring for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelConfig {
    pub rows: u32,
    pub cols: u32,
    /// Points lost per mismatched pair (score floors at zero)
    pub incorrect_penalty: u32,
}

impl LevelConfig {
    pub const fn new(rows: u32, cols: u32, incorrect_penalty: u32) -> Self {
        Self {
            rows,
            cols,
            incorrect_penalty,
        }
    }

    /// Cards dealt, `None` when `rows * cols` overflows
    pub fn checked_card_count(&self) -> Option<u32> {
        self.rows.checked_mul(self.cols)
    }

    /// Cards dealt (saturating; validated configs never overflow)
    pub fn card_count(&self) -> u32 {
        self.rows.saturating_mul(self.cols)
    }

    pub fn pair_count(&self) -> u32 {
        self.card_count() / 2
    }
}

/// Durations driving the timed transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Preview countdown length in ticks
    pub preview_ticks: u32,
    pub preview_tick_ms: u64,
    pub resolve_delay_ms: u64,
    pub flip_back_delay_ms: u64,
    pub level_transition_ms: u64,
    pub resume_notice_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            preview_ticks: PREVIEW_TICKS,
            preview_tick_ms: PREVIEW_TICK_MS,
            resolve_delay_ms: RESOLVE_DELAY_MS,
            flip_back_delay_ms: FLIP_BACK_DELAY_MS,
            level_transition_ms: LEVEL_TRANSITION_MS,
            resume_notice_ms: RESUME_NOTICE_MS,
        }
    }
}

/// Configuration errors. These are programmer errors: a game never starts
/// with a config that fails validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("level table is empty")]
    NoLevels,
    #[error("level table has {0} entries, more than a level number can address")]
    TooManyLevels(usize),
    #[error("no configuration for level {0}")]
    MissingLevel(u8),
    #[error("level {level} has an empty {rows}x{cols} grid")]
    EmptyGrid { level: u8, rows: u32, cols: u32 },
    #[error("level {level} grid {rows}x{cols} is too large")]
    GridTooLarge { level: u8, rows: u32, cols: u32 },
    #[error("level {level} has an odd card count ({cards})")]
    OddCardCount { level: u8, cards: u32 },
    #[error("level {level} needs {needed} pairs but {category} only has {available} symbols")]
    PoolTooSmall {
        level: u8,
        category: Category,
        needed: usize,
        available: usize,
    },
    #[error("{category} pool repeats symbol {symbol}")]
    DuplicateSymbol { category: Category, symbol: String },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Complete static configuration of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub pools: CategoryPools,
    /// Level table, `levels[0]` is level 1
    pub levels: Vec<LevelConfig>,
    #[serde(default)]
    pub timing: Timing,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pools: CategoryPools::default(),
            levels: vec![
                LevelConfig::new(4, 4, 1),
                LevelConfig::new(4, 5, 1),
                LevelConfig::new(4, 5, 2),
                LevelConfig::new(4, 5, 3),
                LevelConfig::new(5, 6, 2),
                LevelConfig::new(5, 6, 3),
            ],
            timing: Timing::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Last level of the game; clearing it completes the game
    pub fn final_level(&self) -> u8 {
        u8::try_from(self.levels.len()).unwrap_or(u8::MAX)
    }

    /// Look up a level (1-based)
    pub fn level(&self, level: u8) -> Result<&LevelConfig, ConfigError> {
        let index = usize::from(level)
            .checked_sub(1)
            .ok_or(ConfigError::MissingLevel(level))?;
        self.levels.get(index).ok_or(ConfigError::MissingLevel(level))
    }

    /// Check every level against every pool
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        if self.levels.len() > usize::from(u8::MAX) {
            return Err(ConfigError::TooManyLevels(self.levels.len()));
        }

        for category in Category::ALL {
            let pool = self.pools.get(category);
            for (i, symbol) in pool.iter().enumerate() {
                if pool[..i].contains(symbol) {
                    return Err(ConfigError::DuplicateSymbol {
                        category,
                        symbol: symbol.clone(),
                    });
                }
            }
        }

        for (index, cfg) in self.levels.iter().enumerate() {
            let level = (index + 1) as u8;
            let cards = cfg.checked_card_count().ok_or(ConfigError::GridTooLarge {
                level,
                rows: cfg.rows,
                cols: cfg.cols,
            })?;
            if cards == 0 {
                return Err(ConfigError::EmptyGrid {
                    level,
                    rows: cfg.rows,
                    cols: cfg.cols,
                });
            }
            if cards % 2 != 0 {
                return Err(ConfigError::OddCardCount { level, cards });
            }
            for category in Category::ALL {
                check_pool(self, category, level)?;
            }
        }

        Ok(())
    }
}

/// Fail if `category` cannot supply enough distinct symbols for `level`
pub(crate) fn check_pool(config: &GameConfig, category: Category, level: u8) -> Result<(), ConfigError> {
    let needed = config.level(level)?.pair_count() as usize;
    let available = config.pools.get(category).len();
    if needed > available {
        return Err(ConfigError::PoolTooSmall {
            level,
            category,
            needed,
            available,
        });
    }
    Ok(())
}
