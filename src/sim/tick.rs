//! Turn state machine
//!
//! Every transition is a function over `&mut GameState`. Delayed steps are
//! scheduled on the [`TimerQueue`] and come back through [`fire_timer`].

use rand_pcg::Pcg32;

use super::deck::generate_deck;
use super::state::{GameEvent, GamePhase, GameState};
use super::timer::{Timer, TimerKind, TimerQueue};
use crate::config::{Category, ConfigError, GameConfig};
use crate::consts::MATCH_REWARD;

/// What a transition needs besides the state itself
pub struct Context<'a> {
    pub config: &'a GameConfig,
    pub rng: &'a mut Pcg32,
    pub timers: &'a mut TimerQueue,
}

impl Context<'_> {
    fn schedule(&mut self, state: &GameState, kind: TimerKind, delay_ms: u64) {
        self.timers.schedule(kind, state.generation, delay_ms);
    }
}

/// Deal a fresh deck and start the preview countdown
///
/// `reset_progress` clears the score (fresh game, category switch, reset);
/// a level-up keeps it. Counters always restart at zero, and every timer of
/// the previous generation is discarded.
pub fn start_level(
    state: &mut GameState,
    ctx: &mut Context<'_>,
    category: Category,
    level: u8,
    reset_progress: bool,
) -> Result<(), ConfigError> {
    let mut deck = generate_deck(ctx.config, category, level, ctx.rng)?;
    for card in &mut deck {
        card.is_flipped = true;
    }

    state.generation += 1;
    ctx.timers.retain_generation(state.generation);

    if reset_progress {
        state.set_score(0);
    }
    state.category = category;
    state.deck = deck;
    state.flipped.clear();
    state.correct = 0;
    state.incorrect = 0;
    state.level = level;
    state.resumed = false;
    state.phase = GamePhase::Previewing;
    state.preview_remaining = ctx.config.timing.preview_ticks;

    log::info!(
        "Level {} started ({}, {} cards, score {})",
        level,
        category,
        state.deck.len(),
        state.score
    );
    state.emit(GameEvent::LevelStarted { level, category });

    if state.preview_remaining == 0 {
        end_preview(state);
    } else {
        ctx.schedule(state, TimerKind::PreviewTick, ctx.config.timing.preview_tick_ms);
    }
    Ok(())
}

/// One step of the preview countdown
pub fn preview_tick(state: &mut GameState, ctx: &mut Context<'_>) {
    if state.phase != GamePhase::Previewing {
        return;
    }

    state.preview_remaining = state.preview_remaining.saturating_sub(1);
    state.emit(GameEvent::PreviewTick {
        remaining: state.preview_remaining,
    });

    if state.preview_remaining == 0 {
        end_preview(state);
    } else {
        ctx.schedule(state, TimerKind::PreviewTick, ctx.config.timing.preview_tick_ms);
    }
}

fn end_preview(state: &mut GameState) {
    state.hide_unmatched();
    state.phase = GamePhase::Idle;
    state.emit(GameEvent::PreviewEnded);
}

/// Flip a card face-up
///
/// Returns `false` (and changes nothing) unless the game is idle, fewer than
/// two cards are pending and the card exists face-down. The second accepted
/// flip moves to `Checking` and schedules resolution.
pub fn handle_card_click(state: &mut GameState, ctx: &mut Context<'_>, card_id: u32) -> bool {
    if state.phase != GamePhase::Idle || state.flipped.len() >= 2 {
        log::trace!("Ignoring click on card {} during {:?}", card_id, state.phase);
        return false;
    }
    let Some(card) = state.card_mut(card_id) else {
        log::trace!("Ignoring click on unknown card {}", card_id);
        return false;
    };
    if !card.is_selectable() {
        return false;
    }

    card.is_flipped = true;
    state.flipped.push(card_id);
    state.emit(GameEvent::CardFlipped { id: card_id });

    if state.flipped.len() == 2 {
        state.phase = GamePhase::Checking;
        ctx.schedule(state, TimerKind::ResolveMatch, ctx.config.timing.resolve_delay_ms);
    }
    true
}

/// Compare the two face-up cards
///
/// A match scores immediately. A mismatch applies the level penalty (the
/// score floors at zero) and turns the pair face-down. With a non-zero
/// `flip_back_delay_ms` the pair stays up that long instead, and the phase
/// stays `Checking` until then so no third card can be turned.
pub fn resolve_match(state: &mut GameState, ctx: &mut Context<'_>) {
    if state.phase != GamePhase::Checking {
        return;
    }
    let [first, second] = match state.flipped[..] {
        [a, b] => [a, b],
        _ => return,
    };
    let (Some(a), Some(b)) = (state.card(first), state.card(second)) else {
        return;
    };

    if a.symbol == b.symbol {
        let symbol = a.symbol.clone();
        let progress_before = state.progress();

        for card in state.deck.iter_mut().filter(|c| c.symbol == symbol) {
            card.is_matched = true;
            card.is_flipped = true;
        }
        state.correct += 1;
        state.flipped.clear();
        state.phase = GamePhase::Idle;

        log::debug!("Matched {} ({}/{})", symbol, state.correct, state.total_pairs());
        state.emit(GameEvent::MatchFound {
            symbol,
            card_ids: [first, second],
            progress_before,
            progress: state.progress(),
        });
        state.set_score(state.score.saturating_add(MATCH_REWARD));

        check_level_completion(state, ctx);
    } else {
        let penalty = ctx
            .config
            .level(state.level)
            .map_or(0, |cfg| cfg.incorrect_penalty);

        state.incorrect += 1;
        state.emit(GameEvent::Mismatch {
            card_ids: [first, second],
            penalty,
        });
        state.set_score(state.score.saturating_sub(penalty));

        match ctx.config.timing.flip_back_delay_ms {
            0 => flip_back(state),
            delay => ctx.schedule(state, TimerKind::FlipBack, delay),
        }
    }
}

/// Turn a mismatched pair back face-down and hand control to the player
pub fn flip_back(state: &mut GameState) {
    if state.phase != GamePhase::Checking {
        return;
    }

    let mut hidden = Vec::with_capacity(2);
    for id in std::mem::take(&mut state.flipped) {
        if let Some(card) = state.card_mut(id) {
            if !card.is_matched {
                card.is_flipped = false;
                hidden.push(id);
            }
        }
    }
    state.phase = GamePhase::Idle;
    state.emit(GameEvent::CardsHidden { card_ids: hidden });
}

/// Detect a cleared level
///
/// The final level ends the game; any other schedules the next level.
/// Returns whether the level was cleared by this call.
pub fn check_level_completion(state: &mut GameState, ctx: &mut Context<'_>) -> bool {
    if !state.is_level_cleared()
        || matches!(state.phase, GamePhase::LevelComplete | GamePhase::GameComplete)
    {
        return false;
    }

    if state.level >= ctx.config.final_level() {
        state.phase = GamePhase::GameComplete;
        log::info!("All {} levels cleared, final score {}", state.level, state.score);
        state.emit(GameEvent::GameComplete { score: state.score });
    } else {
        state.phase = GamePhase::LevelComplete;
        log::info!("Level {} cleared (score {})", state.level, state.score);
        state.emit(GameEvent::LevelComplete { level: state.level });
        ctx.schedule(state, TimerKind::NextLevel, ctx.config.timing.level_transition_ms);
    }
    true
}

/// Finish restoring a saved game
///
/// Expects a sanitized state (no face-up unmatched cards, nothing pending).
/// Starts a fresh generation, shows the resume notice when there is progress
/// to report, and completes the level if the save was already cleared.
pub fn resume(state: &mut GameState, ctx: &mut Context<'_>) {
    state.generation += 1;
    ctx.timers.retain_generation(state.generation);
    state.flipped.clear();
    state.phase = GamePhase::Idle;
    state.preview_remaining = 0;
    state.correct = state.matched_pairs();

    if state.has_progress() {
        state.resumed = true;
        log::info!(
            "Resuming {} game at level {} (score {})",
            state.category,
            state.level,
            state.score
        );
        state.emit(GameEvent::GameResumed {
            level: state.level,
            score: state.score,
        });
        ctx.schedule(state, TimerKind::ClearResumeNotice, ctx.config.timing.resume_notice_ms);
    }

    check_level_completion(state, ctx);
}

/// Run a fired timer; stale generations are ignored
pub fn fire_timer(state: &mut GameState, ctx: &mut Context<'_>, timer: Timer) -> Result<(), ConfigError> {
    if timer.generation != state.generation {
        log::trace!(
            "Dropping stale {:?} (generation {} != {})",
            timer.kind,
            timer.generation,
            state.generation
        );
        return Ok(());
    }

    log::debug!("Timer {:?} fired at {}ms", timer.kind, timer.due_ms);
    match timer.kind {
        TimerKind::PreviewTick => preview_tick(state, ctx),
        TimerKind::ResolveMatch => resolve_match(state, ctx),
        TimerKind::FlipBack => flip_back(state),
        TimerKind::NextLevel => {
            if state.phase == GamePhase::LevelComplete {
                let (category, next) = (state.category, state.level + 1);
                start_level(state, ctx, category, next, false)?;
            }
        }
        TimerKind::ClearResumeNotice => {
            if state.resumed {
                state.resumed = false;
                state.emit(GameEvent::ResumeNoticeCleared);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Card;
    use rand::SeedableRng;

    struct Harness {
        config: GameConfig,
        rng: Pcg32,
        timers: TimerQueue,
        state: GameState,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                config: GameConfig::default(),
                rng: Pcg32::seed_from_u64(42),
                timers: TimerQueue::new(),
                state: GameState::new(Category::Animals),
            }
        }

        /// Run a closure with a borrowed context
        fn with<T>(&mut self, f: impl FnOnce(&mut GameState, &mut Context<'_>) -> T) -> T {
            let mut ctx = Context {
                config: &self.config,
                rng: &mut self.rng,
                timers: &mut self.timers,
            };
            f(&mut self.state, &mut ctx)
        }

        fn run_until(&mut self, until: u64) {
            while let Some(timer) = self.timers.pop_due(until) {
                self.with(|s, c| fire_timer(s, c, timer)).unwrap();
            }
            self.timers.set_now(until);
        }

        /// Start level 1 and let the preview run out
        fn idle_level(&mut self, level: u8) {
            self.with(|s, c| start_level(s, c, Category::Animals, level, true))
                .unwrap();
            let until = self.timers.now() + 3000;
            self.run_until(until);
            assert_eq!(self.state.phase, GamePhase::Idle);
        }

        fn pair_of(&self, symbol: &str) -> [u32; 2] {
            let ids: Vec<u32> = self
                .state
                .deck
                .iter()
                .filter(|c| c.symbol == symbol)
                .map(|c| c.id)
                .collect();
            [ids[0], ids[1]]
        }

        fn mismatch(&self) -> [u32; 2] {
            let first = &self.state.deck[0];
            let other = self
                .state
                .deck
                .iter()
                .find(|c| c.symbol != first.symbol && c.is_selectable())
                .unwrap();
            [first.id, other.id]
        }

        fn click(&mut self, id: u32) -> bool {
            self.with(|s, c| handle_card_click(s, c, id))
        }
    }

    #[test]
    fn test_preview_countdown() {
        let mut h = Harness::new();
        h.with(|s, c| start_level(s, c, Category::Animals, 1, true))
            .unwrap();
        assert_eq!(h.state.phase, GamePhase::Previewing);
        assert_eq!(h.state.preview_remaining, 3);
        assert!(h.state.deck.iter().all(|c| c.is_flipped));

        h.run_until(1000);
        assert_eq!(h.state.preview_remaining, 2);
        h.run_until(2000);
        assert_eq!(h.state.phase, GamePhase::Previewing);
        h.run_until(3000);
        assert_eq!(h.state.phase, GamePhase::Idle);
        assert!(h.state.deck.iter().all(|c| !c.is_flipped));
        assert!(h.state.events.contains(&GameEvent::PreviewEnded));
    }

    #[test]
    fn test_click_rejected_during_preview() {
        let mut h = Harness::new();
        h.with(|s, c| start_level(s, c, Category::Animals, 1, true))
            .unwrap();
        assert!(!h.click(0));
    }

    #[test]
    fn test_matching_pair_scores() {
        let mut h = Harness::new();
        h.idle_level(1);
        let [a, b] = h.pair_of("🐘");

        assert!(h.click(a));
        assert!(!h.click(a), "same card twice");
        assert!(h.click(b));
        assert_eq!(h.state.phase, GamePhase::Checking);

        h.run_until(h.timers.now() + 1000);
        assert_eq!(h.state.correct, 1);
        assert_eq!(h.state.score, 10);
        assert_eq!(h.state.phase, GamePhase::Idle);
        assert!(h.state.card(a).unwrap().is_matched);
        assert!(h.state.card(b).unwrap().is_matched);
        assert!(h.state.flipped.is_empty());
    }

    #[test]
    fn test_third_click_rejected_while_checking() {
        let mut h = Harness::new();
        h.idle_level(1);
        let [a, b] = h.mismatch();
        h.click(a);
        h.click(b);

        let third = h
            .state
            .deck
            .iter()
            .find(|c| c.is_selectable())
            .unwrap()
            .id;
        let before = h.state.clone();
        assert!(!h.click(third));
        assert_eq!(h.state, before);
    }

    #[test]
    fn test_mismatch_penalty_and_flip_back() {
        let mut h = Harness::new();
        h.idle_level(1);
        h.state.score = 10;
        let [a, b] = h.mismatch();
        h.click(a);
        h.click(b);

        h.run_until(h.timers.now() + 999);
        assert_eq!(h.state.phase, GamePhase::Checking);
        assert!(h.state.card(a).unwrap().is_flipped);

        h.run_until(h.timers.now() + 1);
        assert_eq!(h.state.incorrect, 1);
        assert_eq!(h.state.score, 9);
        assert_eq!(h.state.phase, GamePhase::Idle);
        assert!(h.state.flipped.is_empty());
        assert!(!h.state.card(a).unwrap().is_flipped);
        assert!(!h.state.card(b).unwrap().is_flipped);
        assert!(h.timers.is_empty());
    }

    #[test]
    fn test_flip_back_delay_holds_pair() {
        let mut h = Harness::new();
        h.config.timing.flip_back_delay_ms = 500;
        h.idle_level(1);
        let [a, b] = h.mismatch();
        h.click(a);
        h.click(b);

        h.run_until(h.timers.now() + 1000);
        assert_eq!(h.state.incorrect, 1);
        // Still face-up and locked until the flip-back delay passes
        assert_eq!(h.state.phase, GamePhase::Checking);
        assert!(h.state.card(a).unwrap().is_flipped);

        h.run_until(h.timers.now() + 500);
        assert_eq!(h.state.phase, GamePhase::Idle);
        assert!(!h.state.card(b).unwrap().is_flipped);
    }

    #[test]
    fn test_penalty_floors_at_zero() {
        let mut h = Harness::new();
        h.idle_level(3);
        h.state.score = 1;
        let [a, b] = h.mismatch();
        h.click(a);
        h.click(b);
        h.run_until(h.timers.now() + 2000);
        assert_eq!(h.state.score, 0);
        assert_eq!(h.state.incorrect, 1);
    }

    #[test]
    fn test_level_clear_schedules_next_level() {
        let mut h = Harness::new();
        h.idle_level(1);
        h.state.score = 5;

        // Match all but the last pair directly
        let last = h.state.deck[0].symbol.clone();
        for card in h.state.deck.iter_mut().filter(|c| c.symbol != last) {
            card.is_matched = true;
            card.is_flipped = true;
        }
        h.state.correct = h.state.matched_pairs();

        let [a, b] = h.pair_of(&last);
        h.click(a);
        h.click(b);
        h.run_until(h.timers.now() + 1000);
        assert_eq!(h.state.phase, GamePhase::LevelComplete);
        assert_eq!(h.state.score, 15);

        h.run_until(h.timers.now() + 5000);
        assert_eq!(h.state.level, 2);
        assert_eq!(h.state.phase, GamePhase::Previewing);
        assert_eq!(h.state.deck.len(), 20);
        assert_eq!(h.state.correct, 0);
        assert_eq!(h.state.incorrect, 0);
        assert_eq!(h.state.score, 15);
    }

    #[test]
    fn test_final_level_completes_game() {
        let mut h = Harness::new();
        h.idle_level(6);
        for card in &mut h.state.deck {
            card.is_matched = true;
            card.is_flipped = true;
        }
        assert!(h.with(|s, c| check_level_completion(s, c)));
        assert_eq!(h.state.phase, GamePhase::GameComplete);
        assert!(h.timers.is_empty());
        // Already complete: a second check does nothing
        assert!(!h.with(|s, c| check_level_completion(s, c)));
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut h = Harness::new();
        h.with(|s, c| start_level(s, c, Category::Animals, 1, true))
            .unwrap();
        let stale = h.timers.pending()[0];

        h.with(|s, c| start_level(s, c, Category::Foods, 1, true))
            .unwrap();
        assert_eq!(h.state.preview_remaining, 3);

        h.with(|s, c| fire_timer(s, c, stale)).unwrap();
        assert_eq!(h.state.preview_remaining, 3);
        assert_eq!(h.state.category, Category::Foods);
    }

    #[test]
    fn test_resume_sanitizes_and_notifies() {
        let mut h = Harness::new();
        h.state.deck = vec![
            Card::new(0, "a"),
            Card::new(1, "b"),
            Card::new(2, "a"),
            Card::new(3, "b"),
        ];
        h.state.deck[0].is_matched = true;
        h.state.deck[0].is_flipped = true;
        h.state.deck[2].is_matched = true;
        h.state.deck[2].is_flipped = true;
        h.state.score = 10;
        h.state.phase = GamePhase::Checking;
        h.state.flipped = vec![1];

        h.with(|s, c| resume(s, c));
        assert_eq!(h.state.phase, GamePhase::Idle);
        assert!(h.state.flipped.is_empty());
        assert_eq!(h.state.correct, 1);
        assert!(h.state.resumed);

        h.run_until(h.timers.now() + 3000);
        assert!(!h.state.resumed);
        assert!(h.state.events.contains(&GameEvent::ResumeNoticeCleared));
    }
}
