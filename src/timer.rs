//! Per-question countdown for timed mode.
//!
//! The controller does not own a clock. Something outside (a browser
//! interval, a test loop) calls [`QuestionTimer::tick`] once per second with
//! the token it got from [`QuestionTimer::start`]. Every start and cancel
//! bumps the generation, so ticks from an earlier question come back
//! [`TimerEvent::Stale`] and change nothing.

use serde::Serialize;

/// Identifies one countdown. Handed to the tick source on start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn generation(self) -> u64 {
        self.0
    }

    pub fn from_generation(generation: u64) -> Self {
        TimerToken(generation)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running { remaining: u32 },
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// Token belongs to a cancelled or superseded countdown; ignored.
    Stale,
    /// One second elapsed; this many are left.
    Tick(u32),
    /// The countdown hit zero on this tick.
    Expired,
}

#[derive(Debug)]
pub struct QuestionTimer {
    state: TimerState,
    generation: u64,
}

impl Default for QuestionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionTimer {
    pub fn new() -> Self {
        Self { state: TimerState::Idle, generation: 0 }
    }

    /// Begin a fresh countdown, superseding whatever was running.
    pub fn start(&mut self, budget_secs: u32) -> TimerToken {
        self.generation = self.generation.wrapping_add(1);
        self.state = if budget_secs == 0 {
            TimerState::Expired
        } else {
            TimerState::Running { remaining: budget_secs }
        };
        TimerToken(self.generation)
    }

    pub fn tick(&mut self, token: TimerToken) -> TimerEvent {
        if token.0 != self.generation {
            log::debug!("stale timer tick (gen {} vs {})", token.0, self.generation);
            return TimerEvent::Stale;
        }
        match self.state {
            TimerState::Running { remaining } => {
                let left = remaining.saturating_sub(1);
                if left == 0 {
                    self.state = TimerState::Expired;
                    TimerEvent::Expired
                } else {
                    self.state = TimerState::Running { remaining: left };
                    TimerEvent::Tick(left)
                }
            }
            TimerState::Idle | TimerState::Expired => TimerEvent::Stale,
        }
    }

    /// Return to idle. Safe to call from any state, any number of times.
    pub fn cancel(&mut self) {
        if self.state != TimerState::Idle {
            self.generation = self.generation.wrapping_add(1);
        }
        self.state = TimerState::Idle;
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining(&self) -> u32 {
        match self.state {
            TimerState::Running { remaining } => remaining,
            TimerState::Idle | TimerState::Expired => 0,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    /// Token of the current countdown, if one is running.
    pub fn active_token(&self) -> Option<TimerToken> {
        self.is_running().then_some(TimerToken(self.generation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_expiry() {
        let mut t = QuestionTimer::new();
        let tok = t.start(3);
        assert_eq!(t.remaining(), 3);
        assert_eq!(t.tick(tok), TimerEvent::Tick(2));
        assert_eq!(t.tick(tok), TimerEvent::Tick(1));
        assert_eq!(t.tick(tok), TimerEvent::Expired);
        assert_eq!(t.state(), TimerState::Expired);
        // further ticks do nothing
        assert_eq!(t.tick(tok), TimerEvent::Stale);
    }

    #[test]
    fn old_token_is_stale_after_restart() {
        let mut t = QuestionTimer::new();
        let first = t.start(1);
        let second = t.start(5);
        assert_eq!(t.tick(first), TimerEvent::Stale);
        assert_eq!(t.remaining(), 5);
        assert_eq!(t.tick(second), TimerEvent::Tick(4));
    }

    #[test]
    fn cancel_is_idempotent_and_invalidates_token() {
        let mut t = QuestionTimer::new();
        t.cancel();
        assert_eq!(t.state(), TimerState::Idle);
        let tok = t.start(2);
        t.cancel();
        t.cancel();
        assert_eq!(t.state(), TimerState::Idle);
        assert_eq!(t.tick(tok), TimerEvent::Stale);
        assert!(t.active_token().is_none());
    }

    #[test]
    fn cancel_after_expiry_returns_to_idle() {
        let mut t = QuestionTimer::new();
        let tok = t.start(1);
        assert_eq!(t.tick(tok), TimerEvent::Expired);
        t.cancel();
        assert_eq!(t.state(), TimerState::Idle);
    }
}
