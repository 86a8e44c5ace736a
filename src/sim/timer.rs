//! Timed transitions
//!
//! Delays are data, not callbacks: each [`Timer`] records what to do, when,
//! and the game generation it belongs to. A timer whose generation no longer
//! matches the state is stale and does nothing when it fires.

use serde::{Deserialize, Serialize};

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    /// One step of the preview countdown
    PreviewTick,
    /// Compare the two face-up cards
    ResolveMatch,
    /// Turn a mismatched pair face-down
    FlipBack,
    /// Deal the next level after a level is cleared
    NextLevel,
    /// Hide the "game resumed" notice
    ClearResumeNotice,
}

/// A scheduled transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub kind: TimerKind,
    pub generation: u64,
    /// Clock time (ms) the timer fires at
    pub due_ms: u64,
}

/// Pending timers plus the clock that drives them
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    now_ms: u64,
    /// Kept in scheduling order; ties on `due_ms` fire in that order
    pending: Vec<Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock time (ms)
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    pub fn pending(&self) -> &[Timer] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Schedule `kind` to fire `delay_ms` from now
    pub fn schedule(&mut self, kind: TimerKind, generation: u64, delay_ms: u64) -> Timer {
        let timer = Timer {
            kind,
            generation,
            due_ms: self.now_ms.saturating_add(delay_ms),
        };
        self.pending.push(timer);
        timer
    }

    /// Remove and return the earliest timer due at or before `until`,
    /// moving the clock to its due time
    pub fn pop_due(&mut self, until: u64) -> Option<Timer> {
        let (index, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= until)
            .min_by_key(|(_, t)| t.due_ms)?;
        let timer = self.pending.remove(index);
        self.now_ms = self.now_ms.max(timer.due_ms);
        Some(timer)
    }

    /// Move the clock forward without firing anything
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Take a specific timer out of the queue (host fired it itself)
    pub fn remove(&mut self, timer: &Timer) -> bool {
        match self.pending.iter().position(|t| t == timer) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop every timer not belonging to `generation`
    pub fn retain_generation(&mut self, generation: u64) {
        self.pending.retain(|t| t.generation == generation);
    }
}
