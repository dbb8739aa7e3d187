//! CoCreate desktop shell.

mod app;
pub mod cli;
mod native;
mod shortcuts;
mod ui;

pub use app::CoCreateApp;
pub use shortcuts::{Shortcut, ShortcutRegistry};
