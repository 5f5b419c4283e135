//! Terminal rendering of the research timeline.

use std::time::Duration;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::config::UiConfig;
use crate::loader::{
    Indicator, LayoutProbe, Loader, StepStatus, StepView, SummaryView, TimelineView, TitleSpan,
};
use crate::script::SummaryType;

const CHECK_GLYPH: &str = "✔";
const PULSE_ON_GLYPH: &str = "●";
const PULSE_OFF_GLYPH: &str = "○";
const CONNECTOR_GLYPH: &str = "│";
const SEARCH_GLYPH: &str = "⌕";
const STREAM_CURSOR: &str = "▌";

/// Columns reserved left of titles and summaries for the indicator
const GUTTER: u16 = 3;

/// Laid-out timeline: every line of the untranslated list plus where each
/// title landed. Doubles as the geometry probe for centering.
pub struct TimelineLayout {
    pub lines: Vec<Line<'static>>,
    /// Row of each step's title within `lines`
    pub title_rows: Vec<i32>,
    pub viewport_height: u16,
    /// Translation currently applied to the list
    pub offset: i32,
}

impl TimelineLayout {
    pub fn build(view: &TimelineView<'_>, area: Rect, pulse_on: bool) -> Self {
        let wrap_width = usize::from(area.width.saturating_sub(GUTTER + 1).max(1));
        let mut lines = Vec::new();
        let mut title_rows = Vec::with_capacity(view.steps.len());

        for step in &view.steps {
            title_rows.push(lines.len() as i32);
            lines.push(title_line(step, pulse_on));

            let gutter = if step.connector {
                Span::styled(
                    format!("{CONNECTOR_GLYPH:<width$}", width = usize::from(GUTTER)),
                    Style::default().fg(Color::DarkGray),
                )
            } else {
                Span::raw(" ".repeat(usize::from(GUTTER)))
            };

            for text in summary_lines(step, wrap_width) {
                let mut spans = vec![gutter.clone()];
                spans.extend(text);
                lines.push(Line::from(spans));
            }

            // Spacer between steps, carrying the connector
            lines.push(Line::from(vec![gutter]));
        }

        Self {
            lines,
            title_rows,
            viewport_height: area.height,
            offset: view.vertical_offset,
        }
    }

    /// Lines visible in the viewport with the list translated by `offset`
    pub fn visible_lines(&self, offset: i32) -> Vec<Line<'static>> {
        (0..i32::from(self.viewport_height))
            .map(|row| {
                usize::try_from(row - offset)
                    .ok()
                    .and_then(|index| self.lines.get(index))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }
}

impl LayoutProbe for TimelineLayout {
    fn viewport_height(&self) -> u16 {
        self.viewport_height
    }

    fn title_span(&self, index: usize) -> Option<TitleSpan> {
        self.title_rows.get(index).map(|row| TitleSpan {
            top: row + self.offset,
            height: 1,
        })
    }
}

fn title_line(step: &StepView<'_>, pulse_on: bool) -> Line<'static> {
    let (glyph, glyph_style) = match step.indicator {
        Indicator::Check => (CHECK_GLYPH, Style::default().fg(Color::Green)),
        Indicator::Pulse => (
            if pulse_on {
                PULSE_ON_GLYPH
            } else {
                PULSE_OFF_GLYPH
            },
            Style::default().fg(Color::Cyan),
        ),
    };

    let title_style = match step.status {
        StepStatus::Completed => Style::default().fg(Color::Gray),
        StepStatus::Current => Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    };

    Line::from(vec![
        Span::styled(
            format!("{glyph:<width$}", width = usize::from(GUTTER)),
            glyph_style,
        ),
        Span::styled(step.title.to_string(), title_style),
    ])
}

/// Wrapped summary rows, without the gutter
fn summary_lines(step: &StepView<'_>, width: usize) -> Vec<Vec<Span<'static>>> {
    let text_style = Style::default().fg(Color::DarkGray);
    let mut rows: Vec<Vec<Span<'static>>> = Vec::new();

    match &step.summary {
        SummaryView::Hidden => {}
        SummaryView::Prose(words) => {
            let text = words.join(" ");
            for wrapped in textwrap::wrap(&text, width) {
                rows.push(vec![Span::styled(wrapped.into_owned(), text_style)]);
            }
            if step.streaming {
                let cursor = Span::styled(STREAM_CURSOR, Style::default().fg(Color::Cyan));
                match rows.last_mut() {
                    Some(last) => last.push(cursor),
                    None => rows.push(vec![cursor]),
                }
            }
        }
        SummaryView::Items(items) => {
            let marker = match step.summary_type {
                Some(SummaryType::SearchQueries) => SEARCH_GLYPH,
                None => "-",
            };
            let item_width = width.saturating_sub(2).max(1);
            for item in items {
                for (i, wrapped) in textwrap::wrap(item, item_width).into_iter().enumerate() {
                    let lead = if i == 0 {
                        format!("{marker} ")
                    } else {
                        "  ".to_string()
                    };
                    rows.push(vec![
                        Span::styled(lead, Style::default().fg(Color::Cyan)),
                        Span::styled(wrapped.into_owned(), text_style),
                    ]);
                }
            }
        }
    }

    rows
}

/// Eases the drawn offset toward the target once animation is allowed
#[derive(Debug, Default)]
pub struct ScrollAnimator {
    displayed: f32,
    easing: f32,
}

impl ScrollAnimator {
    pub fn new(easing: f32) -> Self {
        Self {
            displayed: 0.0,
            easing: easing.clamp(0.0, 1.0),
        }
    }

    /// Step one frame toward `target`. Without `animate` it jumps.
    pub fn update(&mut self, target: i32, animate: bool) -> i32 {
        let target = target as f32;
        if !animate || self.easing >= 1.0 || self.easing <= 0.0 {
            self.displayed = target;
        } else {
            self.displayed += (target - self.displayed) * self.easing;
            if (target - self.displayed).abs() < 0.5 {
                self.displayed = target;
            }
        }
        self.displayed.round() as i32
    }

    pub fn displayed(&self) -> i32 {
        self.displayed.round() as i32
    }
}

/// Full-screen host for a [`Loader`]
pub struct TimelineScreen {
    heading: String,
    pulse_period: Duration,
    animator: ScrollAnimator,
}

impl TimelineScreen {
    pub fn new(config: &UiConfig) -> Self {
        Self {
            heading: config.heading.clone(),
            pulse_period: Duration::from_millis(config.pulse_period_ms.max(2)),
            animator: ScrollAnimator::new(config.scroll_easing),
        }
    }

    fn pulse_on(&self, now: Duration) -> bool {
        let half = self.pulse_period.as_millis() / 2;
        (now.as_millis() / half) % 2 == 0
    }

    /// Run one frame: next-frame callbacks, layout, centering, then paint
    pub fn draw(&mut self, frame: &mut Frame, loader: &mut Loader, now: Duration) {
        let (heading_area, timeline_area) = self.split(frame.area());

        loader.begin_frame();

        let mut layout = TimelineLayout::build(&loader.view(), timeline_area, self.pulse_on(now));
        loader.layout(&layout);
        layout.offset = loader.state().vertical_offset;

        let offset = self
            .animator
            .update(layout.offset, loader.state().initialized);

        if let Some(area) = heading_area {
            frame.render_widget(Paragraph::new(self.heading_line(loader)), area);
        }
        frame.render_widget(Paragraph::new(layout.visible_lines(offset)), timeline_area);
    }

    fn split(&self, area: Rect) -> (Option<Rect>, Rect) {
        if self.heading.is_empty() || area.height < 3 {
            return (None, area);
        }
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Heading
                Constraint::Min(1),    // Timeline
            ])
            .split(area);
        (Some(chunks[0]), chunks[1])
    }

    fn heading_line(&self, loader: &Loader) -> Line<'static> {
        let state = loader.state();
        let progress = if loader.is_halted() {
            "done".to_string()
        } else {
            format!("step {}/{}", state.active_index + 1, state.step_count)
        };
        Line::from(vec![
            Span::styled(
                self.heading.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {progress}"), Style::default().fg(Color::DarkGray)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Timing;
    use crate::script::{Script, Step, Summary};
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn script() -> Script {
        Script::new(vec![
            Step {
                id: 1,
                in_progress: "Analysing...".to_string(),
                completed: "Analysed".to_string(),
                summary: Summary::Prose("alpha beta gamma".to_string()),
                summary_type: None,
            },
            Step {
                id: 2,
                in_progress: "Searching...".to_string(),
                completed: "Searched".to_string(),
                summary: Summary::Items(vec!["first query".to_string(), "second".to_string()]),
                summary_type: Some(SummaryType::SearchQueries),
            },
        ])
        .unwrap()
    }

    fn ui_config() -> UiConfig {
        UiConfig {
            heading: String::new(),
            ..UiConfig::default()
        }
    }

    fn row_text(buffer: &Buffer, row: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer[(x, row)].symbol().to_string())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_layout_title_rows() {
        let script = script();
        let mut loader = Loader::mount(script, Timing::default()).unwrap();
        loader.advance_to(Duration::from_millis(5100));

        let layout = TimelineLayout::build(&loader.view(), Rect::new(0, 0, 40, 20), true);
        // title, 1 summary row, spacer, then the second title
        assert_eq!(layout.title_rows, vec![0, 3]);
        assert_eq!(layout.title_span(1), Some(TitleSpan { top: 3, height: 1 }));
        assert_eq!(layout.title_span(2), None);
    }

    #[test]
    fn test_layout_wraps_long_prose() {
        let script = script();
        let mut loader = Loader::mount(script, Timing::default()).unwrap();
        loader.advance_to(Duration::from_millis(5100));

        // 14 columns leave 10 for text after the gutter: two summary rows
        let layout = TimelineLayout::build(&loader.view(), Rect::new(0, 0, 14, 20), true);
        assert_eq!(layout.title_rows, vec![0, 4]);
    }

    #[test]
    fn test_visible_lines_translate() {
        let layout = TimelineLayout {
            lines: vec![Line::from("a"), Line::from("b")],
            title_rows: vec![0],
            viewport_height: 4,
            offset: 0,
        };
        let shifted = layout.visible_lines(2);
        assert_eq!(shifted.len(), 4);
        assert_eq!(shifted[0], Line::default());
        assert_eq!(shifted[2], Line::from("a"));

        let raised = layout.visible_lines(-1);
        assert_eq!(raised[0], Line::from("b"));
        assert_eq!(raised[1], Line::default());
    }

    #[test]
    fn test_animator_jumps_until_initialized() {
        let mut animator = ScrollAnimator::new(0.5);
        assert_eq!(animator.update(10, false), 10);
        assert_eq!(animator.update(0, true), 5);
        assert_eq!(animator.update(0, true), 3);
        for _ in 0..10 {
            animator.update(0, true);
        }
        assert_eq!(animator.displayed(), 0);
    }

    #[test]
    fn test_first_frame_centers_without_animation() {
        let mut terminal = Terminal::new(TestBackend::new(40, 11)).unwrap();
        let mut loader = Loader::mount(script(), Timing::default()).unwrap();
        let mut screen = TimelineScreen::new(&ui_config());

        terminal
            .draw(|f| screen.draw(f, &mut loader, Duration::ZERO))
            .unwrap();

        assert_eq!(loader.state().vertical_offset, 5);
        assert!(!loader.state().initialized);
        let buffer = terminal.backend().buffer().clone();
        assert!(row_text(&buffer, 5).contains("Analysing..."));

        terminal
            .draw(|f| screen.draw(f, &mut loader, Duration::from_millis(50)))
            .unwrap();
        assert!(loader.state().initialized);
    }

    #[test]
    fn test_completed_step_shows_check_and_full_summary() {
        let mut terminal = Terminal::new(TestBackend::new(40, 11)).unwrap();
        let mut loader = Loader::mount(script(), Timing::default()).unwrap();
        let mut screen = TimelineScreen::new(&UiConfig {
            scroll_easing: 1.0,
            ..ui_config()
        });

        terminal
            .draw(|f| screen.draw(f, &mut loader, Duration::ZERO))
            .unwrap();
        loader.advance_to(Duration::from_millis(5100));
        terminal
            .draw(|f| screen.draw(f, &mut loader, Duration::from_millis(5100)))
            .unwrap();

        // Second title is now centered; the first sits three rows above it
        let buffer = terminal.backend().buffer().clone();
        assert!(row_text(&buffer, 5).contains("Searching..."));
        assert!(row_text(&buffer, 2).starts_with(CHECK_GLYPH));
        assert!(row_text(&buffer, 2).contains("Analysed"));
        assert!(row_text(&buffer, 3).contains("alpha beta gamma"));
        assert!(row_text(&buffer, 4).starts_with(CONNECTOR_GLYPH));
    }

    #[test]
    fn test_heading_shows_progress() {
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        let mut loader = Loader::mount(script(), Timing::default()).unwrap();
        let mut screen = TimelineScreen::new(&UiConfig::default());

        terminal
            .draw(|f| screen.draw(f, &mut loader, Duration::ZERO))
            .unwrap();

        let buffer = terminal.backend().buffer().clone();
        assert!(row_text(&buffer, 0).contains("Researching"));
        assert!(row_text(&buffer, 0).contains("step 1/2"));
    }
}
