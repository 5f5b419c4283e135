//! Presentational tree derived from the script and run state.

use crate::script::{Script, Summary, SummaryType};

use super::state::{Phase, RunState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Check mark for a finished step
    Check,
    /// Pulsing marker for the step being worked on
    Pulse,
}

/// Summary content to display under a title
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryView<'a> {
    Hidden,
    Prose(Vec<&'a str>),
    Items(Vec<&'a str>),
}

impl SummaryView<'_> {
    pub fn unit_count(&self) -> usize {
        match self {
            SummaryView::Hidden => 0,
            SummaryView::Prose(units) | SummaryView::Items(units) => units.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView<'a> {
    pub index: usize,
    pub id: u32,
    pub status: StepStatus,
    pub indicator: Indicator,
    /// Draw a line joining this step to the next
    pub connector: bool,
    pub title: &'a str,
    pub summary: SummaryView<'a>,
    pub summary_type: Option<SummaryType>,
    /// Summary is still being revealed
    pub streaming: bool,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineView<'a> {
    pub steps: Vec<StepView<'a>>,
    pub active_index: usize,
    pub vertical_offset: i32,
    /// Offset changes may animate once this is set
    pub initialized: bool,
}

impl<'a> TimelineView<'a> {
    /// Build the tree for steps `0..=active_index`; later steps are not rendered
    pub fn build(script: &'a Script, state: &RunState) -> Self {
        let steps = script
            .steps
            .iter()
            .enumerate()
            .take(state.active_index + 1)
            .map(|(index, step)| {
                let completed = state.is_completed(index);
                let current = index == state.active_index && !completed;

                let revealed = if completed {
                    Some(step.summary.unit_count())
                } else if current && matches!(state.phase, Phase::Streaming | Phase::Completed) {
                    Some(state.revealed_count.min(step.summary.unit_count()))
                } else {
                    None
                };

                let summary = match revealed {
                    None => SummaryView::Hidden,
                    Some(count) => {
                        let mut units = step.summary.units();
                        units.truncate(count);
                        match step.summary {
                            Summary::Prose(_) => SummaryView::Prose(units),
                            Summary::Items(_) => SummaryView::Items(units),
                        }
                    }
                };

                StepView {
                    index,
                    id: step.id,
                    status: if completed {
                        StepStatus::Completed
                    } else {
                        StepStatus::Current
                    },
                    indicator: if completed {
                        Indicator::Check
                    } else {
                        Indicator::Pulse
                    },
                    connector: index < state.active_index,
                    title: if completed {
                        step.completed.as_str()
                    } else {
                        step.in_progress.as_str()
                    },
                    summary,
                    summary_type: step.summary_type,
                    streaming: current && state.phase == Phase::Streaming,
                }
            })
            .collect();

        Self {
            steps,
            active_index: state.active_index,
            vertical_offset: state.vertical_offset,
            initialized: state.initialized,
        }
    }

    pub fn current(&self) -> Option<&StepView<'a>> {
        self.steps.get(self.active_index)
    }
}
