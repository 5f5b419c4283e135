//! Run state of a mounted loader and its pure transition function.

use std::collections::BTreeSet;

/// Sub-state of the active step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    InProgress,
    Streaming,
    Completed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::InProgress => "in_progress",
            Phase::Streaming => "streaming",
            Phase::Completed => "completed",
        }
    }
}

/// Timer-driven inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// `streaming_start` has elapsed since the step became active
    StreamingStartElapsed,
    /// `step_duration` has elapsed since the step became active
    StepDurationElapsed,
    /// The grace delay after completion has elapsed
    GraceElapsed,
    /// One reveal interval has elapsed; `units` is the active step's unit count
    RevealTick { units: usize },
}

/// Mutable state owned by one mounted loader.
///
/// Every change goes through [`RunState::apply`], which returns a new value
/// computed only from `self` and the event.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub step_count: usize,
    pub active_index: usize,
    pub phase: Phase,
    pub revealed_count: usize,
    pub completed: BTreeSet<usize>,
    /// Accumulated translation (rows) applied to the whole step list
    pub vertical_offset: i32,
    pub initialized: bool,
}

impl RunState {
    /// Fresh state for a script of `step_count` steps
    pub fn new(step_count: usize) -> Self {
        Self {
            step_count,
            active_index: 0,
            phase: Phase::InProgress,
            revealed_count: 0,
            completed: BTreeSet::new(),
            vertical_offset: 0,
            initialized: false,
        }
    }

    pub fn is_last_step(&self) -> bool {
        self.active_index + 1 >= self.step_count
    }

    /// True once the last step has reached `Completed`; nothing changes after that
    pub fn is_halted(&self) -> bool {
        self.is_last_step() && self.phase == Phase::Completed
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    /// Compute the state that follows `event`.
    ///
    /// Events that do not apply to the current phase leave the state unchanged.
    pub fn apply(&self, event: Event) -> RunState {
        let mut next = self.clone();

        match (self.phase, event) {
            (Phase::InProgress, Event::StreamingStartElapsed) => {
                next.phase = Phase::Streaming;
            }
            (Phase::InProgress | Phase::Streaming, Event::StepDurationElapsed) => {
                next.completed.insert(self.active_index);
                next.phase = Phase::Completed;
            }
            (Phase::Streaming, Event::RevealTick { units }) => {
                if self.revealed_count < units {
                    next.revealed_count = self.revealed_count + 1;
                }
            }
            (Phase::Completed, Event::GraceElapsed) => {
                if !self.is_last_step() {
                    next.active_index = self.active_index + 1;
                    next.phase = Phase::InProgress;
                    next.revealed_count = 0;
                }
            }
            _ => {}
        }

        next
    }

    /// Add a measured delta to the accumulated offset
    pub fn with_offset_delta(&self, delta: i32) -> RunState {
        let mut next = self.clone();
        next.vertical_offset = self.vertical_offset.saturating_add(delta);
        next
    }

    pub fn with_initialized(&self) -> RunState {
        let mut next = self.clone();
        next.initialized = true;
        next
    }
}
