//! Terminal front-end: runs the console against a crossterm-drawn 16x3
//! display and keyboard.

#![allow(missing_docs)]

pub mod signals;
pub mod terminal;

pub use signals::ShutdownSignal;
pub use terminal::{KeyAction, TerminalDisplay, map_key, run_console};
