//! In-memory display: keeps the logical row contents and backlight state.
//!
//! Backs the terminal console and the tests. Rows scroll as a marquee when
//! written as scrolling options.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use super::{Backlight, GlyphSet, OptionRow, ROW_COUNT, ROW_WIDTH, Renderer, Rgb};
use super::{ROM_ARROW_LEFT, ROM_ARROW_RIGHT, ROM_CURSOR};

/// Blank columns between the end of a scrolling row and its restart.
const MARQUEE_GAP: usize = 4;

#[derive(Debug, Clone)]
struct RowState {
    text: String,
    icon: Option<char>,
    scroll: Option<(Duration, Duration)>,
    since: Instant,
}

impl Default for RowState {
    fn default() -> Self {
        Self {
            text: String::new(),
            icon: None,
            scroll: None,
            since: Instant::now(),
        }
    }
}

/// A 16x3 character display held in memory.
#[derive(Debug, Clone)]
pub struct TextDisplay {
    rows: [RowState; ROW_COUNT],
    glyphs: GlyphSet,
    graph: f64,
    colour: Rgb,
    graph_history: Vec<f64>,
    colour_history: Vec<Rgb>,
}

impl Default for TextDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Default::default(),
            glyphs: GlyphSet::default(),
            graph: 0.0,
            colour: Rgb::WHITE,
            graph_history: Vec::new(),
            colour_history: Vec::new(),
        }
    }

    /// Logical contents of a row: icon (if any) followed by the full text.
    #[must_use]
    pub fn row(&self, row: usize) -> String {
        self.rows.get(row).map_or_else(String::new, |state| {
            let mut out = String::new();
            if let Some(icon) = state.icon {
                out.push(icon);
            }
            out.push_str(&state.text);
            out
        })
    }

    /// All rows joined by newlines, for assertions.
    #[must_use]
    pub fn contents(&self) -> String {
        (0..ROW_COUNT)
            .map(|row| self.row(row))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Exactly [`ROW_WIDTH`] printable characters for `row` as of `now`.
    #[must_use]
    pub fn visible_row(&self, row: usize, now: Instant) -> String {
        let Some(state) = self.rows.get(row) else {
            return " ".repeat(ROW_WIDTH);
        };
        let icon_width = usize::from(state.icon.is_some());
        let text_width = ROW_WIDTH - icon_width;
        let chars: Vec<char> = state.text.chars().collect();

        let offset = match state.scroll {
            Some((speed, delay)) if chars.len() > text_width && !speed.is_zero() => {
                let elapsed = now.saturating_duration_since(state.since);
                let moving = elapsed.saturating_sub(delay);
                let steps = moving.as_millis() / speed.as_millis().max(1);
                let cycle = chars.len() + MARQUEE_GAP;
                usize::try_from(steps % cycle as u128).unwrap_or(0)
            }
            _ => 0,
        };

        let mut out = String::with_capacity(ROW_WIDTH);
        if let Some(icon) = state.icon {
            out.push(self.printable(icon));
        }
        let cycle = chars.len() + if offset > 0 { MARQUEE_GAP } else { 0 };
        for i in 0..text_width {
            let pos = offset + i;
            let c = if offset > 0 {
                chars.get(pos % cycle).copied().unwrap_or(' ')
            } else {
                chars.get(pos).copied().unwrap_or(' ')
            };
            out.push(self.printable(c));
        }
        out
    }

    /// Map glyph slots and ROM arrows to terminal-friendly characters.
    #[must_use]
    pub fn printable(&self, c: char) -> char {
        if let Some(glyph) = self.glyphs.glyph_at(c) {
            return glyph.printable();
        }
        match c {
            ROM_ARROW_LEFT => '«',
            ROM_ARROW_RIGHT => '»',
            ROM_CURSOR => '›',
            c if c.is_control() => ' ',
            c => c,
        }
    }

    #[must_use]
    pub const fn graph(&self) -> f64 {
        self.graph
    }

    #[must_use]
    pub const fn colour(&self) -> Rgb {
        self.colour
    }

    /// Every ratio pushed to the bar graph, oldest first.
    #[must_use]
    pub fn graph_history(&self) -> &[f64] {
        &self.graph_history
    }

    /// Every colour set on the backlight, oldest first.
    #[must_use]
    pub fn colour_history(&self) -> &[Rgb] {
        &self.colour_history
    }

    #[must_use]
    pub const fn glyphs(&self) -> &GlyphSet {
        &self.glyphs
    }
}

impl Renderer for TextDisplay {
    fn write_row(&mut self, row: usize, text: &str) {
        if let Some(state) = self.rows.get_mut(row) {
            if state.text != text || state.icon.is_some() || state.scroll.is_some() {
                *state = RowState {
                    text: text.to_string(),
                    ..RowState::default()
                };
            }
        }
    }

    fn write_option(&mut self, row: usize, option: &OptionRow<'_>) {
        let scroll = option.scroll.then(|| {
            (
                Duration::from_millis(u64::from(option.scroll_speed_ms)),
                Duration::from_millis(u64::from(option.scroll_delay_ms)),
            )
        });
        if let Some(state) = self.rows.get_mut(row)
            && (state.text != option.text || state.icon != option.icon || state.scroll != scroll)
        {
            *state = RowState {
                text: option.text.to_string(),
                icon: option.icon,
                scroll,
                since: Instant::now(),
            };
        }
    }

    fn clear_row(&mut self, row: usize) {
        if let Some(state) = self.rows.get_mut(row) {
            *state = RowState::default();
        }
    }

    fn load_glyphs(&mut self, glyphs: &GlyphSet) {
        self.glyphs = glyphs.clone();
    }
}

impl Backlight for TextDisplay {
    fn set_graph(&mut self, ratio: f64) {
        self.graph = ratio.clamp(0.0, 1.0);
        self.graph_history.push(self.graph);
    }

    fn set_rgb(&mut self, colour: Rgb) {
        self.colour = colour;
        self.colour_history.push(colour);
    }
}
