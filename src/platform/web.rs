//! JavaScript-facing game handle
//!
//! The page owns one `WebGame`, forwards clicks and its frame clock to it,
//! and re-renders from the JSON it hands back. Confirmation dialogs stay on
//! the JavaScript side.

use wasm_bindgen::prelude::*;

use super::clock_seed;
use crate::config::{Category, GameConfig};
use crate::game::Game;
use crate::persistence::{LocalStorage, MemoryStorage, Storage};
use crate::sim::Timer;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Memory Match starting...");
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_category(name: &str) -> Result<Category, JsValue> {
    Category::from_str(name).ok_or_else(|| JsValue::from_str(&format!("unknown category: {name}")))
}

/// LocalStorage when the browser allows it, otherwise an unsaved session
fn open_storage() -> Box<dyn Storage> {
    match LocalStorage::open() {
        Ok(storage) => Box::new(storage),
        Err(e) => {
            log::warn!("LocalStorage unavailable ({}), progress will not be saved", e);
            Box::new(MemoryStorage::new())
        }
    }
}

#[wasm_bindgen]
pub struct WebGame {
    game: Game<Box<dyn Storage>>,
}

#[wasm_bindgen]
impl WebGame {
    /// Resume the saved game or deal a new one; `config_json` overrides the
    /// built-in pools and level table
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WebGame, JsValue> {
        let config = match config_json {
            Some(json) => GameConfig::from_json(&json).map_err(js_error)?,
            None => GameConfig::default(),
        };
        let seed = clock_seed();
        let game = Game::new(config, open_storage(), seed).map_err(js_error)?;
        log::info!("Game initialized with seed: {}", seed);
        Ok(Self { game })
    }

    /// State, grid shape and progress as JSON
    #[wasm_bindgen(js_name = viewJson)]
    pub fn view_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.game.view()).map_err(js_error)
    }

    /// Events since the last call, as a JSON array
    #[wasm_bindgen(js_name = drainEventsJson)]
    pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.game.drain_events()).map_err(js_error)
    }

    /// Pending timers as JSON, for pages that run their own `setTimeout`s
    #[wasm_bindgen(js_name = pendingTimersJson)]
    pub fn pending_timers_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.game.pending_timers()).map_err(js_error)
    }

    /// Fire one timer taken from `pendingTimersJson`
    #[wasm_bindgen(js_name = fireTimer)]
    pub fn fire_timer(&mut self, timer_json: &str) -> Result<(), JsValue> {
        let timer: Timer = serde_json::from_str(timer_json).map_err(js_error)?;
        self.game.fire(timer).map_err(js_error)
    }

    #[wasm_bindgen(js_name = newGame)]
    pub fn new_game(&mut self, category: &str) -> Result<(), JsValue> {
        let category = parse_category(category)?;
        self.game.new_game(category).map_err(js_error)
    }

    #[wasm_bindgen(js_name = clickCard)]
    pub fn click_card(&mut self, id: u32) -> bool {
        self.game.handle_card_click(id)
    }

    /// Returns `"unchanged"`, `"switched"` or `"needsConfirmation"`
    #[wasm_bindgen(js_name = switchCategory)]
    pub fn switch_category(&mut self, name: &str) -> Result<String, JsValue> {
        let category = parse_category(name)?;
        let outcome = self.game.switch_category(category).map_err(js_error)?;
        Ok(outcome.as_str().to_string())
    }

    #[wasm_bindgen(js_name = confirmSwitchCategory)]
    pub fn confirm_switch_category(&mut self, name: &str) -> Result<(), JsValue> {
        let category = parse_category(name)?;
        self.game.confirm_switch_category(category).map_err(js_error)
    }

    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.game.reset().map_err(js_error)
    }

    #[wasm_bindgen(js_name = playAgain)]
    pub fn play_again(&mut self) -> Result<(), JsValue> {
        self.game.play_again().map_err(js_error)
    }

    /// Feed elapsed frame time (ms) to the game clock
    pub fn advance(&mut self, dt_ms: f64) -> Result<(), JsValue> {
        // Clamp long stalls (background tab) to one level transition
        let dt = dt_ms.clamp(0.0, self.game.config().timing.level_transition_ms as f64);
        self.game.advance(dt as u64).map_err(js_error)
    }
}
