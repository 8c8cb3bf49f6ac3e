//! Cooperative timers polled from the foreground redraw loop.

pub mod timer;

pub use timer::{CancelToken, Periodic};
