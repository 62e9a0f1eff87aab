//! Single-flight gate
//!
//! `is_generating` marks a run in flight. Triggers that land while busy set
//! `pending_generation`, a flag rather than a counter, so any number of them
//! collapse into one follow-up run.

/// What the scheduler should do with a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Nothing running; start a generation now
    Start,
    /// A generation is running; one follow-up is queued
    Queued,
}

/// What the scheduler should do once a run settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    RunAgain,
    Idle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchState {
    is_generating: bool,
    pending_generation: bool,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_generating(&self) -> bool {
        self.is_generating
    }

    pub fn has_pending(&self) -> bool {
        self.pending_generation
    }

    pub fn request(&mut self) -> Trigger {
        if self.is_generating {
            self.pending_generation = true;
            Trigger::Queued
        } else {
            self.is_generating = true;
            Trigger::Start
        }
    }

    /// The current run finished, successfully or not
    pub fn finish(&mut self) -> Settled {
        if self.pending_generation {
            self.pending_generation = false;
            Settled::RunAgain
        } else {
            self.is_generating = false;
            Settled::Idle
        }
    }
}
