pub mod terminal_guard;
pub mod timeline;

pub use terminal_guard::{install_panic_hook, TerminalGuard};
pub use timeline::{ScrollAnimator, TimelineLayout, TimelineScreen};
