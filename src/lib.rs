//! Research loader - a scripted, time-driven "research in progress" screen.
//!
//! The [`loader`] module holds the engine (step sequencing, summary
//! streaming, centering) and runs on a virtual clock. [`ui`] and [`app`]
//! host it in a terminal.

pub mod app;
pub mod config;
pub mod loader;
pub mod logging;
pub mod script;
pub mod ui;
