//! The research loader engine.
//!
//! A [`Loader`] is one mounted widget instance. It plays a [`Script`] back
//! against a virtual clock: the host calls [`Loader::advance_to`] with the
//! time elapsed since mount, and every timer that came due fires in order.
//! Rendering hooks ([`Loader::begin_frame`], [`Loader::layout`],
//! [`Loader::view`]) let the substrate center the active step.

pub mod centerer;
pub mod reveal;
pub mod scheduler;
pub mod state;
pub mod timing;
pub mod view;

pub use centerer::{LayoutProbe, TitleSpan};
pub use scheduler::{Scheduler, TimerId, TimerKind};
pub use state::{Event, Phase, RunState};
pub use timing::{Timing, TimingError};
pub use view::{Indicator, StepStatus, StepView, SummaryView, TimelineView};

use std::time::Duration;

use crate::script::{Script, ScriptError};
use centerer::Centerer;
use scheduler::Fired;

/// A state change caused by one fired timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Virtual time since mount
    pub at: Duration,
    pub event: Event,
    /// Active step after the event
    pub step_index: usize,
    pub phase: Phase,
    pub revealed_count: usize,
}

pub struct Loader {
    script: Script,
    timing: Timing,
    scheduler: Scheduler,
    state: RunState,
    centerer: Centerer,
    /// Bumped on each step activation; timers carry the epoch they were armed in
    epoch: u64,
    reveal_timer: Option<TimerId>,
    mounted: bool,
}

impl Loader {
    /// Mount a fresh instance at virtual time zero and arm the first step
    pub fn mount(script: Script, timing: Timing) -> Result<Self, ScriptError> {
        script.validate()?;

        let mut loader = Self {
            state: RunState::new(script.len()),
            script,
            timing,
            scheduler: Scheduler::new(),
            centerer: Centerer::new(),
            epoch: 0,
            reveal_timer: None,
            mounted: true,
        };
        loader.activate_step();

        tracing::info!(
            steps = loader.script.len(),
            step_ms = timing.step_duration().as_millis() as u64,
            streaming_ms = timing.streaming_start().as_millis() as u64,
            "Research loader mounted"
        );
        Ok(loader)
    }

    /// Cancel every pending timer. The instance never changes state again.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.reveal_timer = None;
        let cancelled = self.scheduler.cancel_all();
        tracing::info!(step = self.state.active_index, cancelled, "Research loader unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// The last step has completed; no timers remain
    pub fn is_halted(&self) -> bool {
        self.state.is_halted()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Virtual time the loader has been advanced to
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Earliest time at which something will change, if anything will
    pub fn next_deadline(&self) -> Option<Duration> {
        if !self.mounted {
            return None;
        }
        self.scheduler.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Fire every timer due at or before `elapsed` (time since mount)
    pub fn advance_to(&mut self, elapsed: Duration) -> Vec<Transition> {
        let mut transitions = Vec::new();
        if !self.mounted {
            return transitions;
        }

        while let Some(fired) = self.scheduler.pop_due(elapsed) {
            if let Some(transition) = self.dispatch(fired) {
                transitions.push(transition);
            }
        }
        self.scheduler.settle(elapsed);

        transitions
    }

    pub fn advance_by(&mut self, delta: Duration) -> Vec<Transition> {
        let target = self.scheduler.now() + delta;
        self.advance_to(target)
    }

    /// Start-of-frame hook; runs callbacks deferred to "the next frame"
    pub fn begin_frame(&mut self) {
        if !self.mounted {
            return;
        }
        if self.centerer.take_initialize() {
            self.state = self.state.with_initialized();
            tracing::debug!("Timeline initialized, offset changes now animate");
        }
    }

    /// After-layout, before-paint hook. Measures at most once per active-step change.
    pub fn layout(&mut self, probe: &dyn LayoutProbe) {
        if !self.mounted {
            return;
        }
        let Some(delta) = self.centerer.measure(probe, self.state.active_index) else {
            return;
        };

        self.state = self.state.with_offset_delta(delta);
        tracing::debug!(
            step = self.state.active_index,
            delta,
            offset = self.state.vertical_offset,
            "Centered active step"
        );

        if !self.state.initialized {
            self.centerer.arm_initialize();
        }
    }

    /// Presentational tree for the current state
    pub fn view(&self) -> TimelineView<'_> {
        TimelineView::build(&self.script, &self.state)
    }

    fn active_unit_count(&self) -> usize {
        self.script
            .get(self.state.active_index)
            .map(|step| step.summary.unit_count())
            .unwrap_or(0)
    }

    /// Arm the streaming-start and completion timers for the active step,
    /// dropping anything left over from the previous one
    fn activate_step(&mut self) {
        let cancelled = self.scheduler.cancel_epoch(self.epoch);
        if cancelled > 0 {
            tracing::debug!(cancelled, "Cancelled timers from previous step");
        }
        self.reveal_timer = None;
        self.epoch += 1;

        self.scheduler.schedule_once(
            self.timing.streaming_start(),
            TimerKind::StreamingStart,
            self.epoch,
        );
        self.scheduler.schedule_once(
            self.timing.step_duration(),
            TimerKind::StepComplete,
            self.epoch,
        );
        self.centerer.request();

        let title = self
            .script
            .get(self.state.active_index)
            .map(|step| step.in_progress.as_str())
            .unwrap_or_default();
        tracing::info!(step = self.state.active_index, title, "Step started");
    }

    fn start_reveal(&mut self) {
        let units = self.active_unit_count();
        match reveal::unit_interval(&self.timing, units) {
            Some(interval) => {
                self.reveal_timer = Some(self.scheduler.schedule_repeating(
                    interval,
                    TimerKind::RevealTick,
                    self.epoch,
                ));
                tracing::debug!(
                    step = self.state.active_index,
                    units,
                    interval_ms = interval.as_millis() as u64,
                    "Streaming summary"
                );
            }
            None => {
                tracing::debug!(
                    step = self.state.active_index,
                    "Empty summary, nothing to stream"
                );
            }
        }
    }

    fn stop_reveal(&mut self) {
        if let Some(id) = self.reveal_timer.take() {
            self.scheduler.cancel(id);
        }
    }

    fn dispatch(&mut self, fired: Fired) -> Option<Transition> {
        if fired.epoch != self.epoch {
            tracing::warn!(
                kind = ?fired.kind,
                epoch = fired.epoch,
                current = self.epoch,
                "Ignoring timer from a previous step"
            );
            return None;
        }

        let event = match fired.kind {
            TimerKind::StreamingStart => Event::StreamingStartElapsed,
            TimerKind::StepComplete => Event::StepDurationElapsed,
            TimerKind::Grace => Event::GraceElapsed,
            TimerKind::RevealTick => Event::RevealTick {
                units: self.active_unit_count(),
            },
        };

        let previous = self.state.clone();
        self.state = previous.apply(event);

        match event {
            Event::StreamingStartElapsed => self.start_reveal(),
            Event::RevealTick { units } => {
                tracing::trace!(
                    step = self.state.active_index,
                    revealed = self.state.revealed_count,
                    units,
                    "Revealed unit"
                );
                if reveal::is_fully_revealed(self.state.revealed_count, units) {
                    self.stop_reveal();
                }
            }
            Event::StepDurationElapsed => {
                self.stop_reveal();
                self.scheduler.schedule_once(self.timing.grace(), TimerKind::Grace, self.epoch);
                tracing::info!(step = self.state.active_index, "Step completed");
            }
            Event::GraceElapsed => {
                if self.state.active_index != previous.active_index {
                    self.activate_step();
                } else if self.state.is_halted() {
                    self.scheduler.cancel_all();
                    tracing::info!(
                        steps = self.script.len(),
                        at_ms = fired.at.as_millis() as u64,
                        "Research sequence finished"
                    );
                }
            }
        }

        if self.state == previous {
            return None;
        }

        Some(Transition {
            at: fired.at,
            event,
            step_index: self.state.active_index,
            phase: self.state.phase,
            revealed_count: self.state.revealed_count,
        })
    }
}
