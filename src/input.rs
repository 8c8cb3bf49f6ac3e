//! Navigation input delivered to the console.

#![allow(missing_docs)]

use std::fmt;

/// One key press from the appliance keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    Up,
    Down,
    Left,
    Right,
    Select,
    Cancel,
}

impl InputEvent {
    #[must_use]
    pub const fn is_directional(self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::Left | Self::Right)
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Select => "select",
            Self::Cancel => "cancel",
        };
        f.write_str(name)
    }
}
