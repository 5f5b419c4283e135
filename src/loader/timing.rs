use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimingError {
    #[error("streaming start ({streaming_start:?}) must be before the end of the step ({step_duration:?})")]
    StreamingAfterStep {
        streaming_start: Duration,
        step_duration: Duration,
    },
}

/// Fixed durations that drive every step.
///
/// `streaming_start < step_duration` always holds for a constructed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    step_duration: Duration,
    streaming_start: Duration,
    grace: Duration,
}

impl Timing {
    pub const DEFAULT_STEP_DURATION: Duration = Duration::from_millis(5000);
    pub const DEFAULT_STREAMING_START: Duration = Duration::from_millis(3000);
    pub const DEFAULT_GRACE: Duration = Duration::from_millis(100);

    pub fn new(
        step_duration: Duration,
        streaming_start: Duration,
        grace: Duration,
    ) -> Result<Self, TimingError> {
        if streaming_start >= step_duration {
            return Err(TimingError::StreamingAfterStep {
                streaming_start,
                step_duration,
            });
        }

        Ok(Self {
            step_duration,
            streaming_start,
            grace,
        })
    }

    pub fn from_millis(
        step_duration_ms: u64,
        streaming_start_ms: u64,
        grace_ms: u64,
    ) -> Result<Self, TimingError> {
        Self::new(
            Duration::from_millis(step_duration_ms),
            Duration::from_millis(streaming_start_ms),
            Duration::from_millis(grace_ms),
        )
    }

    /// Total time a step is active before it completes
    pub fn step_duration(&self) -> Duration {
        self.step_duration
    }

    /// Delay after activation before the summary starts streaming
    pub fn streaming_start(&self) -> Duration {
        self.streaming_start
    }

    /// Pause between completing a step and activating the next one
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Time available for revealing the summary
    pub fn streaming_window(&self) -> Duration {
        self.step_duration - self.streaming_start
    }

    /// Time from one activation to the next
    pub fn step_period(&self) -> Duration {
        self.step_duration + self.grace
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            step_duration: Self::DEFAULT_STEP_DURATION,
            streaming_start: Self::DEFAULT_STREAMING_START,
            grace: Self::DEFAULT_GRACE,
        }
    }
}
