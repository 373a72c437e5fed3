//! Rate gate for the polling loop.

use std::time::Instant;

use crate::profile::PollingRate;

/// Admits at most one tick per polling period.
///
/// A tick that arrives early is skipped, never queued, so a stalled loop does
/// not burst to catch up.
#[derive(Debug, Clone)]
pub struct PollingClock {
    rate: PollingRate,
    last: Option<Instant>,
}

impl PollingClock {
    #[must_use]
    pub fn new(rate: PollingRate) -> Self {
        Self { rate, last: None }
    }

    #[must_use]
    pub fn rate(&self) -> PollingRate {
        self.rate
    }

    /// Changes the rate; the next tick is measured from the last admitted one.
    pub fn set_rate(&mut self, rate: PollingRate) {
        self.rate = rate;
    }

    /// Returns `true` and records `now` when a full period has passed since
    /// the last admitted tick.
    pub fn should_tick(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.rate.period() => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Forgets the last tick; the next call is admitted.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
