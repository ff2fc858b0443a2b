//! Rate limiter for screen invalidations.

use std::time::Duration;

/// Lets an event through at most once per interval, skipping the others.
#[derive(Debug)]
pub struct Throttle {
    /// Minimum time between two events, in milliseconds.
    interval: u64,
    /// Time of the last event let through, in milliseconds.
    last: Option<u64>,
}

impl Throttle {
    /// Creates a throttle letting one event through per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.as_millis() as u64,
            last: None,
        }
    }

    /// Checks whether an event occurring at `now` (in milliseconds) should be
    /// let through, and records it if so.
    pub fn ready(&mut self, now: u64) -> bool {
        match self.last {
            Some(last) if now.saturating_sub(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
