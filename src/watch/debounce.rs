//! Time-window debounce
//!
//! Every event pushes the deadline out by the full delay; the debounce fires
//! once the deadline passes with no further events. The clock is passed in,
//! so the state machine is driven the same way by tests and by the scheduler.

use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record an event observed at `now`
    pub fn event(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// When the debounce will fire, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fire (and disarm) if the quiet period has elapsed
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
