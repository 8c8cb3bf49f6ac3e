//! Character-display abstractions: row renderer, backlight sink, glyph slots,
//! and the windowing engine used by every list-like view.

#![allow(missing_docs)]

pub mod glyph;
pub mod text;
pub mod window;

#[cfg(test)]
mod test_properties;

use serde::{Deserialize, Serialize};

pub use glyph::{Glyph, GlyphSet};
pub use text::TextDisplay;
pub use window::{SelectableList, Window};

/// Characters per row.
pub const ROW_WIDTH: usize = 16;
/// Rows on the display.
pub const ROW_COUNT: usize = 3;

/// Character-ROM arrow pointing left (used for "previous" hints).
pub const ROM_ARROW_LEFT: char = '\u{fb}';
/// Character-ROM arrow pointing right (used for "next" hints).
pub const ROM_ARROW_RIGHT: char = '\u{fc}';
/// Character-ROM cursor arrow for list rows.
pub const ROM_CURSOR: char = '\u{7e}';

/// Backlight colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const GREEN: Self = Self::new(0, 255, 0);
    pub const BLUE: Self = Self::new(0, 0, 255);
    pub const YELLOW: Self = Self::new(255, 255, 0);
    pub const RED: Self = Self::new(255, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Options for a row that may scroll horizontally and carry a leading icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRow<'a> {
    pub text: &'a str,
    pub scroll: bool,
    pub scroll_speed_ms: u32,
    pub scroll_delay_ms: u32,
    pub icon: Option<char>,
}

impl<'a> OptionRow<'a> {
    /// Plain row that scrolls only when it does not fit.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            scroll: text.chars().count() > ROW_WIDTH,
            scroll_speed_ms: 300,
            scroll_delay_ms: 500,
            icon: None,
        }
    }

    #[must_use]
    pub const fn scroll(mut self, scroll: bool) -> Self {
        self.scroll = scroll;
        self
    }

    #[must_use]
    pub const fn timing(mut self, speed_ms: u32, delay_ms: u32) -> Self {
        self.scroll_speed_ms = speed_ms;
        self.scroll_delay_ms = delay_ms;
        self
    }

    #[must_use]
    pub const fn icon(mut self, icon: Option<char>) -> Self {
        self.icon = icon;
        self
    }
}

/// Row-oriented output of a character display.
pub trait Renderer {
    fn write_row(&mut self, row: usize, text: &str);
    fn write_option(&mut self, row: usize, option: &OptionRow<'_>);
    fn clear_row(&mut self, row: usize);
    /// Define the custom glyphs addressable as `'\x00'..'\x07'`.
    fn load_glyphs(&mut self, glyphs: &GlyphSet);
}

/// Backlight and bar-graph LEDs.
pub trait Backlight {
    /// Light the bar graph proportionally to `ratio` in `[0, 1]`.
    fn set_graph(&mut self, ratio: f64);
    fn set_rgb(&mut self, colour: Rgb);
}

/// A renderer that also owns a backlight.
pub trait Display {
    fn renderer(&mut self) -> &mut dyn Renderer;
    fn backlight(&mut self) -> &mut dyn Backlight;
}

impl<T: Renderer + Backlight> Display for T {
    fn renderer(&mut self) -> &mut dyn Renderer {
        self
    }

    fn backlight(&mut self) -> &mut dyn Backlight {
        self
    }
}

/// Center `text` in a row, truncating nothing.
#[must_use]
pub fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= ROW_WIDTH {
        return text.to_string();
    }
    let total = ROW_WIDTH - len;
    let left = total / 2;
    format!("{}{text}{}", " ".repeat(left), " ".repeat(total - left))
}
