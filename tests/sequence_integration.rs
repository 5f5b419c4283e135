//! Integration tests for the research loader engine
//!
//! These drive a mounted `Loader` entirely on its virtual clock, so every
//! assertion is about exact timestamps rather than sleeps.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test sequence_integration
//! ```

use research_loader::loader::{
    Event, LayoutProbe, Loader, Phase, StepStatus, SummaryView, Timing, TitleSpan, Transition,
};
use research_loader::script::{Script, Step, Summary};
use std::time::Duration;

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn prose_step(id: u32, words: usize) -> Step {
    let text = (0..words)
        .map(|i| format!("w{i}"))
        .collect::<Vec<_>>()
        .join(" ");
    Step {
        id,
        in_progress: format!("Step {id}..."),
        completed: format!("Step {id} done"),
        summary: Summary::Prose(text),
        summary_type: None,
    }
}

fn list_step(id: u32, items: usize) -> Step {
    Step {
        id,
        in_progress: format!("List {id}..."),
        completed: format!("List {id} done"),
        summary: Summary::Items((0..items).map(|i| format!("item {i}")).collect()),
        summary_type: None,
    }
}

/// Mixed script of `n` steps with varying unit counts (including empty)
fn mixed_script(n: usize) -> Script {
    let steps = (0..n)
        .map(|i| {
            let id = i as u32 + 1;
            if i % 3 == 2 {
                list_step(id, i % 4)
            } else {
                prose_step(id, (i * 5) % 13)
            }
        })
        .collect();
    Script::new(steps).unwrap()
}

/// Run to completion, returning every transition
fn run_to_end(loader: &mut Loader) -> Vec<Transition> {
    let mut all = Vec::new();
    while let Some(deadline) = loader.next_deadline() {
        all.extend(loader.advance_to(deadline));
    }
    all
}

/// A probe that lays each title out `rows_per_step` rows apart
struct StackedProbe {
    height: u16,
    rows_per_step: i32,
    steps: usize,
    offset: i32,
}

impl LayoutProbe for StackedProbe {
    fn viewport_height(&self) -> u16 {
        self.height
    }

    fn title_span(&self, index: usize) -> Option<TitleSpan> {
        (index < self.steps).then(|| TitleSpan {
            top: index as i32 * self.rows_per_step + self.offset,
            height: 1,
        })
    }
}

// ─── Sequencing ──────────────────────────────────────────────────────────────

#[test]
fn test_sequence_halts_at_last_step_for_all_lengths() {
    let timing = Timing::default();

    for n in 1..=7 {
        let mut loader = Loader::mount(mixed_script(n), timing).unwrap();
        let finish = timing.step_period() * (n as u32 - 1) + timing.step_duration();

        loader.advance_to(finish - Duration::from_nanos(1));
        assert!(!loader.is_halted(), "n={n} halted early");

        loader.advance_to(finish);
        assert!(loader.is_halted(), "n={n} did not halt at {finish:?}");
        assert_eq!(loader.state().active_index, n - 1);

        run_to_end(&mut loader);
        assert_eq!(loader.state().active_index, n - 1);
        assert_eq!(loader.state().phase, Phase::Completed);
        assert_eq!(loader.state().completed.len(), n);
    }
}

#[test]
fn test_active_index_never_decreases() {
    let mut loader = Loader::mount(mixed_script(6), Timing::default()).unwrap();
    let transitions = run_to_end(&mut loader);

    let mut last = 0;
    for transition in &transitions {
        assert!(transition.step_index >= last);
        assert!(transition.step_index < 6);
        last = transition.step_index;
    }
}

#[test]
fn test_each_step_completed_once_before_advancing() {
    let mut loader = Loader::mount(mixed_script(5), Timing::default()).unwrap();
    let transitions = run_to_end(&mut loader);

    let completions: Vec<_> = transitions
        .iter()
        .filter(|t| t.event == Event::StepDurationElapsed)
        .map(|t| t.step_index)
        .collect();
    assert_eq!(completions, vec![0, 1, 2, 3, 4]);

    // The advance into step k+1 immediately follows the grace after completing step k
    for window in transitions.windows(2) {
        if window[1].event == Event::GraceElapsed {
            assert_eq!(window[0].event, Event::StepDurationElapsed);
            assert_eq!(window[1].step_index, window[0].step_index + 1);
        }
    }
}

// ─── Streaming ───────────────────────────────────────────────────────────────

#[test]
fn test_revealed_count_climbs_to_unit_count_per_step() {
    let script = mixed_script(6);
    let units: Vec<usize> = script
        .steps
        .iter()
        .map(|s| s.summary.unit_count())
        .collect();
    let mut loader = Loader::mount(script, Timing::default()).unwrap();
    let transitions = run_to_end(&mut loader);

    for (index, &count) in units.iter().enumerate() {
        let reveals: Vec<_> = transitions
            .iter()
            .filter(|t| t.step_index == index && matches!(t.event, Event::RevealTick { .. }))
            .map(|t| t.revealed_count)
            .collect();
        assert_eq!(reveals, (1..=count).collect::<Vec<_>>(), "step {index}");
    }
}

#[test]
fn test_revealed_count_resets_on_activation() {
    let mut loader = Loader::mount(mixed_script(4), Timing::default()).unwrap();
    let transitions = run_to_end(&mut loader);

    for transition in transitions.iter().filter(|t| t.event == Event::GraceElapsed) {
        assert_eq!(transition.revealed_count, 0);
        assert_eq!(transition.phase, Phase::InProgress);
    }
}

#[test]
fn test_six_word_prose_scenario() {
    let script = Script::new(vec![prose_step(1, 6), prose_step(2, 1)]).unwrap();
    let mut loader = Loader::mount(script, Timing::default()).unwrap();

    loader.advance_to(ms(3000));
    assert_eq!(loader.state().phase, Phase::Streaming);
    assert_eq!(loader.state().revealed_count, 0);

    loader.advance_to(ms(3333));
    assert_eq!(loader.state().revealed_count, 1);

    loader.advance_to(ms(5000));
    assert_eq!(loader.state().revealed_count, 6);
    assert_eq!(loader.state().phase, Phase::Completed);
    assert!(loader.state().is_completed(0));

    loader.advance_to(ms(5100));
    assert_eq!(loader.state().active_index, 1);
}

#[test]
fn test_five_item_list_never_streams_a_sixth() {
    let script = Script::new(vec![list_step(1, 5), prose_step(2, 1)]).unwrap();
    let mut loader = Loader::mount(script, Timing::default()).unwrap();

    let ticks = loader
        .advance_to(ms(5099))
        .into_iter()
        .filter(|t| matches!(t.event, Event::RevealTick { .. }))
        .count();
    assert_eq!(ticks, 5);
    assert_eq!(loader.state().revealed_count, 5);
}

#[test]
fn test_empty_list_reveals_immediately() {
    let script = Script::new(vec![list_step(1, 0), prose_step(2, 1)]).unwrap();
    let mut loader = Loader::mount(script, Timing::default()).unwrap();

    loader.advance_to(ms(3000));
    let view = loader.view();
    assert_eq!(view.steps[0].summary, SummaryView::Items(vec![]));
    // Only the completion timer is armed
    assert_eq!(loader.pending_timers(), 1);
}

#[test]
fn test_completed_steps_render_full_summary() {
    let mut loader = Loader::mount(mixed_script(5), Timing::default()).unwrap();
    loader.advance_to(Timing::default().step_period() * 4);

    let view = loader.view();
    assert_eq!(view.steps.len(), 5);
    for step in &view.steps[..4] {
        assert_eq!(step.status, StepStatus::Completed);
        let full = loader.script().steps[step.index].summary.unit_count();
        assert_eq!(step.summary.unit_count(), full);
    }
    assert_eq!(view.steps[4].status, StepStatus::Current);
    assert_eq!(view.steps[4].summary, SummaryView::Hidden);
}

// ─── Centering ───────────────────────────────────────────────────────────────

#[test]
fn test_offset_follows_active_step() {
    let mut loader = Loader::mount(mixed_script(4), Timing::default()).unwrap();
    let mut probe = StackedProbe {
        height: 30,
        rows_per_step: 4,
        steps: 1,
        offset: 0,
    };

    for index in 0..4 {
        loader.begin_frame();
        loader.layout(&probe);
        probe.offset = loader.state().vertical_offset;

        // Active title sits on the middle row
        assert_eq!(probe.title_span(index).unwrap().center(), 15);

        loader.advance_by(Timing::default().step_period());
        probe.steps = loader.state().active_index + 1;
    }
    assert!(loader.state().initialized);
}

#[test]
fn test_initialized_only_after_first_frame() {
    let mut loader = Loader::mount(mixed_script(2), Timing::default()).unwrap();
    let probe = StackedProbe {
        height: 10,
        rows_per_step: 3,
        steps: 1,
        offset: 0,
    };

    loader.begin_frame();
    loader.layout(&probe);
    assert_eq!(loader.state().vertical_offset, 5);
    assert!(!loader.state().initialized);

    loader.begin_frame();
    assert!(loader.state().initialized);
}

// ─── Teardown ────────────────────────────────────────────────────────────────

#[test]
fn test_unmount_mid_streaming_stops_all_mutation() {
    let script = Script::new(vec![prose_step(1, 10), prose_step(2, 3)]).unwrap();
    let mut loader = Loader::mount(script, Timing::default()).unwrap();
    loader.advance_to(ms(3500));
    assert_eq!(loader.state().phase, Phase::Streaming);

    let snapshot = loader.state().clone();
    loader.unmount();
    assert!(!loader.is_mounted());
    assert_eq!(loader.pending_timers(), 0);
    assert_eq!(loader.next_deadline(), None);

    assert!(loader.advance_to(ms(100_000)).is_empty());
    assert_eq!(loader.state(), &snapshot);
}
