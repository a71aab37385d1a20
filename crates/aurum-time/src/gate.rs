//! Push gate - cooldown rate limiter for personal pushes
//!
//! The gate only covers the personal account's outbound path. Shared
//! storage pushes are operator-driven and rare, so they bypass it.

use std::time::Duration;

/// Fixed world tick duration
pub const TICK: Duration = Duration::from_millis(50);

/// Outcome of asking the gate for a push
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Push may proceed
    Open,
    /// Cooldown still active; `remaining` until it clears
    Throttled { remaining: Duration },
}

impl GateDecision {
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, GateDecision::Open)
    }
}

/// Cooldown gate for the personal account's pushes
#[derive(Clone, Debug)]
pub struct PushGate {
    remaining: Duration,
    duration: Duration,
}

impl PushGate {
    /// A fresh gate starts open
    pub fn new(duration: Duration) -> Self {
        PushGate {
            remaining: Duration::ZERO,
            duration,
        }
    }

    pub fn from_seconds(seconds: u64) -> Self {
        PushGate::new(Duration::from_secs(seconds))
    }

    /// Advance one fixed tick, saturating at zero
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(TICK);
    }

    /// Whether a push may proceed; `force` always passes
    pub fn check(&self, force: bool) -> GateDecision {
        if self.remaining > Duration::ZERO && !force {
            GateDecision::Throttled {
                remaining: self.remaining,
            }
        } else {
            GateDecision::Open
        }
    }

    /// Start the cooldown, called after a successful push
    pub fn arm(&mut self) {
        self.remaining = self.duration;
    }

    /// Change the cooldown duration and clear any pending cooldown
    pub fn reconfigure(&mut self, duration: Duration) {
        self.duration = duration;
        self.remaining = Duration::ZERO;
    }

    #[inline]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}
