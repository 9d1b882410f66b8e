//! Terminal UI for Huddle
//!
//! A thin shell over [`huddle_app::Driver`] that provides terminal-specific
//! I/O. All orchestration lives in the generic [`huddle_app::Runtime`];
//! this crate parses input lines, keeps a view model and draws it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
mod input;
pub mod settings;
pub mod terminal;
pub mod ui;
mod view;

pub use commands::Command;
pub use input::{InputState, KeyInput};
pub use settings::{FileSettings, SettingsError};
pub use terminal::{TerminalDriver, TerminalError};
pub use view::{Notice, View};
