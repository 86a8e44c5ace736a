//! Game controller
//!
//! [`Game`] is the single owner of the game: state, RNG, timers and the save
//! store. Views call its intent methods, then read [`Game::state`] and drain
//! events to re-render. Every call that changes what a save would contain
//! writes a fresh snapshot.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::config::{Category, ConfigError, GameConfig, LevelConfig};
use crate::consts::FIRST_LEVEL;
use crate::persistence::{SaveStore, Snapshot, Storage};
use crate::sim::{self, Context, GameEvent, GamePhase, GameState, Timer, TimerQueue};

/// Outcome of a category switch request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CategorySwitch {
    /// Already playing that category
    Unchanged,
    /// Nothing to lose; the new category is dealt
    Switched,
    /// Progress would be lost; ask the player, then call
    /// [`Game::confirm_switch_category`]
    NeedsConfirmation,
}

impl CategorySwitch {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategorySwitch::Unchanged => "unchanged",
            CategorySwitch::Switched => "switched",
            CategorySwitch::NeedsConfirmation => "needsConfirmation",
        }
    }
}

/// Everything a view needs for one frame
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView<'a> {
    pub state: &'a GameState,
    pub grid: LevelConfig,
    pub final_level: u8,
    pub progress: f32,
    pub categories: [Category; 3],
}

/// The game controller
pub struct Game<S: Storage> {
    config: GameConfig,
    state: GameState,
    rng: Pcg32,
    timers: TimerQueue,
    store: SaveStore<S>,
    /// Last snapshot written, to skip identical writes
    saved: Option<Snapshot>,
}

impl<S: Storage> Game<S> {
    /// Validate `config`, then resume the saved game or deal a new one
    pub fn new(config: GameConfig, storage: S, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut game = Self {
            state: GameState::new(Category::default()),
            rng: Pcg32::seed_from_u64(seed),
            timers: TimerQueue::new(),
            store: SaveStore::new(storage),
            saved: None,
            config,
        };

        match game.store.load() {
            Some(snapshot) if snapshot.is_game_complete => {
                log::info!("Saved game was already finished, starting fresh");
                game.store.clear();
                game.start(Category::default(), FIRST_LEVEL, true)?;
            }
            Some(snapshot) => match snapshot.validate(&game.config) {
                Ok(()) => {
                    game.saved = Some(snapshot.clone());
                    game.state = snapshot.into_state();
                    let (state, mut ctx) = game.split();
                    sim::resume(state, &mut ctx);
                }
                Err(e) => {
                    log::warn!("Discarding saved game: {}", e);
                    game.store.clear();
                    game.start(Category::default(), FIRST_LEVEL, true)?;
                }
            },
            None => game.start(Category::default(), FIRST_LEVEL, true)?,
        }

        game.persist();
        Ok(game)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        self.store.storage()
    }

    /// Controller clock (ms)
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    /// Timers still waiting to fire
    pub fn pending_timers(&self) -> &[Timer] {
        self.timers.pending()
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.state.events)
    }

    /// Grid, progress and state for rendering
    pub fn view(&self) -> GameView<'_> {
        GameView {
            state: &self.state,
            grid: self
                .config
                .level(self.state.level)
                .copied()
                .unwrap_or_default(),
            final_level: self.config.final_level(),
            progress: self.state.progress(),
            categories: Category::ALL,
        }
    }

    /// Start over at level 1 in `category`, discarding any save
    pub fn new_game(&mut self, category: Category) -> Result<(), ConfigError> {
        self.discard_save();
        self.start(category, FIRST_LEVEL, true)?;
        self.persist();
        Ok(())
    }

    /// Player clicked a card; `false` when the click is ignored
    pub fn handle_card_click(&mut self, card_id: u32) -> bool {
        let (state, mut ctx) = self.split();
        let accepted = sim::handle_card_click(state, &mut ctx, card_id);
        if accepted {
            self.persist();
        }
        accepted
    }

    /// Request a category change
    ///
    /// Switches right away when there is no progress to lose; otherwise
    /// changes nothing and asks for confirmation.
    pub fn switch_category(&mut self, category: Category) -> Result<CategorySwitch, ConfigError> {
        if category == self.state.category {
            return Ok(CategorySwitch::Unchanged);
        }
        if self.state.has_progress() {
            log::debug!("Switch to {} needs confirmation", category);
            return Ok(CategorySwitch::NeedsConfirmation);
        }
        self.confirm_switch_category(category)?;
        Ok(CategorySwitch::Switched)
    }

    /// Switch category after the player confirmed losing progress
    pub fn confirm_switch_category(&mut self, category: Category) -> Result<(), ConfigError> {
        log::info!("Switching category {} -> {}", self.state.category, category);
        self.discard_save();
        self.start(category, FIRST_LEVEL, true)?;
        self.state.emit(GameEvent::CategorySwitched { category });
        self.persist();
        Ok(())
    }

    /// Restart the current category at level 1 (player confirmed)
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        log::info!("Resetting game");
        self.discard_save();
        self.start(self.state.category, FIRST_LEVEL, true)?;
        self.state.emit(GameEvent::GameReset);
        self.persist();
        Ok(())
    }

    /// Start a new game after finishing the last level
    pub fn play_again(&mut self) -> Result<(), ConfigError> {
        let category = self.state.category;
        self.new_game(category)
    }

    /// Advance the clock by `dt_ms`, firing every timer that comes due
    pub fn advance(&mut self, dt_ms: u64) -> Result<(), ConfigError> {
        let until = self.timers.now().saturating_add(dt_ms);
        let mut fired = false;
        while let Some(timer) = self.timers.pop_due(until) {
            self.dispatch(timer)?;
            fired = true;
        }
        self.timers.set_now(until);
        if fired {
            self.persist();
        }
        Ok(())
    }

    /// Fire `timer` now, for hosts that run their own timers
    ///
    /// Only a queued timer runs, once. Stale timers (from a game that has
    /// since been replaced) and repeats do nothing.
    pub fn fire(&mut self, timer: Timer) -> Result<(), ConfigError> {
        if !self.timers.remove(&timer) {
            log::trace!("Ignoring {:?}: not pending", timer.kind);
            return Ok(());
        }
        self.timers.set_now(timer.due_ms);
        self.dispatch(timer)?;
        self.persist();
        Ok(())
    }

    /// Borrow the state and a transition context side by side
    fn split(&mut self) -> (&mut GameState, Context<'_>) {
        let ctx = Context {
            config: &self.config,
            rng: &mut self.rng,
            timers: &mut self.timers,
        };
        (&mut self.state, ctx)
    }

    fn dispatch(&mut self, timer: Timer) -> Result<(), ConfigError> {
        let (state, mut ctx) = self.split();
        sim::fire_timer(state, &mut ctx, timer)
    }

    fn start(&mut self, category: Category, level: u8, reset_progress: bool) -> Result<(), ConfigError> {
        let (state, mut ctx) = self.split();
        sim::start_level(state, &mut ctx, category, level, reset_progress)
    }

    fn discard_save(&mut self) {
        self.store.clear();
        self.saved = None;
    }

    /// Write the current snapshot, or erase the save once the game is won
    fn persist(&mut self) {
        if self.state.phase == GamePhase::GameComplete {
            if self.saved.take().is_some() {
                self.store.clear();
            }
            return;
        }
        if self.state.deck.is_empty() {
            return;
        }

        let snapshot = Snapshot::from_state(&self.state);
        if self.saved.as_ref() != Some(&snapshot) {
            self.store.save(&snapshot);
            self.saved = Some(snapshot);
        }
    }
}
