//! Virtual-time timer queue.
//!
//! Timers are armed relative to the scheduler's current virtual time and fire
//! in deadline order as the host advances the clock. Nothing here sleeps or
//! spawns; a real clock and a simulated one drive it the same way.

use std::collections::BTreeMap;
use std::time::Duration;

/// Shortest interval a repeating timer may use
const MIN_INTERVAL: Duration = Duration::from_nanos(1);

pub type TimerId = u64;

/// What a timer means to the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    StreamingStart,
    StepComplete,
    Grace,
    RevealTick,
}

impl TimerKind {
    /// Lower fires first when two timers share a deadline
    fn priority(self) -> u8 {
        match self {
            TimerKind::RevealTick => 0,
            _ => 1,
        }
    }
}

/// A timer that has come due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub at: Duration,
    pub id: TimerId,
    pub kind: TimerKind,
    /// Activation epoch the timer was armed in
    pub epoch: u64,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    id: TimerId,
    kind: TimerKind,
    epoch: u64,
    interval: Option<Duration>,
}

/// Ordering key: deadline, then priority, then arming order
type QueueKey = (Duration, u8, u64);

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_seq: u64,
    next_id: TimerId,
    queue: BTreeMap<QueueKey, Armed>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed timers
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Arm a timer that fires once after `delay`
    pub fn schedule_once(&mut self, delay: Duration, kind: TimerKind, epoch: u64) -> TimerId {
        let id = self.allocate_id();
        self.insert(
            self.now + delay,
            Armed {
                id,
                kind,
                epoch,
                interval: None,
            },
        );
        id
    }

    /// Arm a timer that fires every `interval` until cancelled
    pub fn schedule_repeating(
        &mut self,
        interval: Duration,
        kind: TimerKind,
        epoch: u64,
    ) -> TimerId {
        let interval = interval.max(MIN_INTERVAL);
        let id = self.allocate_id();
        self.insert(
            self.now + interval,
            Armed {
                id,
                kind,
                epoch,
                interval: Some(interval),
            },
        );
        id
    }

    /// Cancel one timer. Returns false if it already fired or was never armed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|_, armed| armed.id != id);
        self.queue.len() != before
    }

    /// Cancel every timer armed in `epoch`
    pub fn cancel_epoch(&mut self, epoch: u64) -> usize {
        let before = self.queue.len();
        self.queue.retain(|_, armed| armed.epoch != epoch);
        before - self.queue.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.queue.len();
        self.queue.clear();
        cancelled
    }

    /// Deadline of the earliest armed timer
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _, _)| *deadline)
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its deadline. Repeating timers are re-armed before being returned.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired> {
        let key = *self.queue.keys().next()?;
        if key.0 > until {
            return None;
        }

        let armed = self.queue.remove(&key)?;
        let (deadline, _, _) = key;
        self.now = self.now.max(deadline);

        if let Some(interval) = armed.interval {
            self.insert(deadline + interval, armed);
        }

        Some(Fired {
            at: deadline,
            id: armed.id,
            kind: armed.kind,
            epoch: armed.epoch,
        })
    }

    /// Move the clock forward without firing anything
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    fn allocate_id(&mut self) -> TimerId {
        self.next_id += 1;
        self.next_id
    }

    fn insert(&mut self, deadline: Duration, armed: Armed) {
        self.next_seq += 1;
        self.queue
            .insert((deadline, armed.kind.priority(), self.next_seq), armed);
    }
}
