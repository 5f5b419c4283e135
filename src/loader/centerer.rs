//! Keeps the active step's title vertically centered.
//!
//! The rendering layer owns geometry. After it has laid out the list for a
//! frame, and before drawing it, it hands the loader a [`LayoutProbe`]; the
//! centerer measures at most once per active-step change.

/// Where a title sits in the viewport, in rows. `top` already includes the
/// list's current translation, so it can be negative or past the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleSpan {
    pub top: i32,
    pub height: u16,
}

impl TitleSpan {
    pub fn center(&self) -> i32 {
        self.top + i32::from(self.height) / 2
    }
}

/// Geometry queries answered by the rendering substrate
pub trait LayoutProbe {
    /// Height of the visible area in rows
    fn viewport_height(&self) -> u16;

    /// Span of the title of step `index`, or `None` if it isn't laid out
    fn title_span(&self, index: usize) -> Option<TitleSpan>;
}

#[derive(Debug, Default)]
pub struct Centerer {
    /// A measurement is owed for the current active step
    pending: bool,
    /// Flip `initialized` at the start of the next frame
    initialize_next_frame: bool,
}

impl Centerer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for one measurement before the next paint
    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending request and return the offset delta that centers
    /// the active title. A missing title skips this cycle.
    pub fn measure(&mut self, probe: &dyn LayoutProbe, active_index: usize) -> Option<i32> {
        if !self.pending {
            return None;
        }
        self.pending = false;

        let Some(span) = probe.title_span(active_index) else {
            tracing::debug!(step = active_index, "Active title not laid out, skipping centering");
            return None;
        };

        let viewport_center = i32::from(probe.viewport_height()) / 2;
        Some(viewport_center - span.center())
    }

    pub fn arm_initialize(&mut self) {
        self.initialize_next_frame = true;
    }

    /// True exactly once, on the frame after `arm_initialize`
    pub fn take_initialize(&mut self) -> bool {
        std::mem::take(&mut self.initialize_next_frame)
    }
}
