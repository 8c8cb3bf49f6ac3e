//! Progress screen: title, a bar of circle glyphs, and a percentage.

#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::display::{Backlight, Glyph, GlyphSet, Renderer, center};
use crate::views::{ViewEvent, ViewOps};

/// Cells between the bar's brackets.
pub const BAR_CELLS: usize = 14;

#[derive(Debug, Clone)]
pub struct ProgressView {
    title: String,
    value_suffix: String,
    value: f64,
    glyphs: GlyphSet,
}

impl ProgressView {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value_suffix: String::new(),
            value: 0.0,
            glyphs: GlyphSet::new(&[Glyph::Circle, Glyph::CircleFilled]),
        }
    }

    /// Text after the percentage, e.g. `" (ca.)"` for estimates.
    #[must_use]
    pub fn value_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.value_suffix = suffix.into();
        self
    }

    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Set the progress, clamped into `[0, 1]`.
    pub fn set_value(&mut self, value: f64) {
        self.value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
    }

    /// `[` + filled cells + empty cells + `]`, using glyph slots.
    #[must_use]
    pub fn bar(&self) -> String {
        let empty = self.glyphs.slot(Glyph::Circle).unwrap_or(' ');
        let filled = self.glyphs.slot(Glyph::CircleFilled).unwrap_or('*');
        let fill = ((BAR_CELLS as f64) * self.value).round() as usize;
        let fill = fill.min(BAR_CELLS);
        let mut bar = String::with_capacity(BAR_CELLS + 2);
        bar.push('[');
        bar.extend(std::iter::repeat_n(filled, fill));
        bar.extend(std::iter::repeat_n(empty, BAR_CELLS - fill));
        bar.push(']');
        bar
    }

    #[must_use]
    pub fn percent_text(&self) -> String {
        format!("{:.0}%{}", self.value * 100.0, self.value_suffix)
    }
}

impl ViewOps for ProgressView {
    fn begin(&mut self, backlight: &mut dyn Backlight) {
        backlight.set_graph(0.0);
    }

    fn redraw(&mut self, renderer: &mut dyn Renderer) {
        renderer.load_glyphs(&self.glyphs);
        renderer.write_row(0, &center(&self.title));
        renderer.write_row(1, &center(&self.bar()));
        renderer.write_row(2, &center(&self.percent_text()));
    }

    fn select(&mut self) -> Option<ViewEvent> {
        None
    }

    // Navigation is absorbed while a task runs.
    fn up(&mut self) -> bool {
        true
    }

    fn down(&mut self) -> bool {
        true
    }

    fn left(&mut self) -> bool {
        true
    }

    fn right(&mut self) -> bool {
        true
    }

    fn cleanup(&mut self, backlight: &mut dyn Backlight) {
        backlight.set_graph(0.0);
    }
}
