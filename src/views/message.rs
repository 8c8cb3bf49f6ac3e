//! Status messages: a headline, a scrolling message, and a blinking `[OK]`.
//!
//! The headline picks a backlight tone. The configured default colour is put
//! back when the message goes away.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use crate::display::{Backlight, OptionRow, ROM_ARROW_LEFT, ROM_ARROW_RIGHT, Renderer, Rgb, center};
use crate::runtime::timer::Periodic;
use crate::views::{ViewEvent, ViewOps};

const SCROLL_SPEED_MS: u32 = 300;
const SCROLL_DELAY_MS: u32 = 500;
/// Button arrows toggle this often.
pub const BLINK_INTERVAL: Duration = Duration::from_secs(1);

/// Backlight tone of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Info,
    Warning,
    Error,
}

impl Tone {
    /// Tone implied by a headline keyword (`Success`, `Info`/`Note`,
    /// `Warning`, `Error`), case-insensitively.
    #[must_use]
    pub fn from_headline(headline: &str) -> Option<Self> {
        let lower = headline.to_ascii_lowercase();
        if lower.contains("success") {
            Some(Self::Success)
        } else if lower.contains("info") || lower.contains("note") {
            Some(Self::Info)
        } else if lower.contains("warning") {
            Some(Self::Warning)
        } else if lower.contains("error") {
            Some(Self::Error)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn colour(self) -> Rgb {
        match self {
            Self::Success => Rgb::GREEN,
            Self::Info => Rgb::BLUE,
            Self::Warning => Rgb::YELLOW,
            Self::Error => Rgb::RED,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageView {
    rows: [String; 2],
    button: Option<String>,
    tone: Option<Tone>,
    default_colour: Rgb,
    blink: Option<Periodic>,
    show_arrows: bool,
}

impl MessageView {
    /// Message whose tone follows the headline.
    #[must_use]
    pub fn new(headline: impl Into<String>, message: impl Into<String>, default_colour: Rgb) -> Self {
        let headline = headline.into();
        Self {
            tone: Tone::from_headline(&headline),
            rows: [headline, message.into()],
            button: Some("[OK]".to_string()),
            default_colour,
            blink: None,
            show_arrows: true,
        }
    }

    #[must_use]
    pub fn tone(mut self, tone: Option<Tone>) -> Self {
        self.tone = tone;
        self
    }

    /// Replace the button row with plain text.
    #[must_use]
    pub fn without_button(mut self) -> Self {
        self.button = None;
        self
    }

    #[must_use]
    pub const fn current_tone(&self) -> Option<Tone> {
        self.tone
    }

    /// Update the text of row 0 or 1 in place.
    pub fn set_row(&mut self, row: usize, text: impl Into<String>) {
        if let Some(slot) = self.rows.get_mut(row) {
            *slot = text.into();
        }
    }

    #[must_use]
    pub fn row(&self, row: usize) -> Option<&str> {
        self.rows.get(row).map(String::as_str)
    }

    #[must_use]
    pub const fn arrows_visible(&self) -> bool {
        self.show_arrows
    }

    /// Advance the blink as of `now`. Returns whether the arrows toggled.
    pub fn blink_at(&mut self, now: Instant) -> bool {
        let fired = self.blink.as_mut().is_some_and(|timer| timer.poll(now));
        if fired {
            self.show_arrows = !self.show_arrows;
        }
        fired
    }

    fn button_row(&self) -> Option<String> {
        self.button.as_ref().map(|button| {
            if self.show_arrows {
                center(&format!("{ROM_ARROW_RIGHT}{button}{ROM_ARROW_LEFT}"))
            } else {
                center(button)
            }
        })
    }

    fn start_blink(&mut self, now: Instant) {
        if self.button.is_some() {
            self.blink = Some(Periodic::new(BLINK_INTERVAL, now));
        }
    }
}

impl ViewOps for MessageView {
    fn begin(&mut self, backlight: &mut dyn Backlight) {
        self.start_blink(Instant::now());
        if let Some(tone) = self.tone {
            backlight.set_rgb(tone.colour());
        }
    }

    fn redraw(&mut self, renderer: &mut dyn Renderer) {
        self.blink_at(Instant::now());
        for (idx, text) in self.rows.iter().enumerate() {
            let centered = center(text);
            renderer.write_option(
                idx,
                &OptionRow::new(&centered).timing(SCROLL_SPEED_MS, SCROLL_DELAY_MS),
            );
        }
        match self.button_row() {
            Some(button) => renderer.write_row(2, &button),
            None => renderer.clear_row(2),
        }
    }

    fn select(&mut self) -> Option<ViewEvent> {
        Some(ViewEvent::Dismissed)
    }

    fn cleanup(&mut self, backlight: &mut dyn Backlight) {
        if let Some(timer) = &self.blink {
            timer.cancel();
        }
        backlight.set_rgb(self.default_colour);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::TextDisplay;

    #[test]
    fn headline_selects_tone() {
        assert_eq!(Tone::from_headline("Success"), Some(Tone::Success));
        assert_eq!(Tone::from_headline("Information"), Some(Tone::Info));
        assert_eq!(Tone::from_headline("Please note"), Some(Tone::Info));
        assert_eq!(Tone::from_headline("Warning"), Some(Tone::Warning));
        assert_eq!(Tone::from_headline("Error"), Some(Tone::Error));
        assert_eq!(Tone::from_headline("coldsign"), None);
    }

    #[test]
    fn begin_colours_and_cleanup_restores() {
        let mut display = TextDisplay::new();
        let mut view = MessageView::new("Error", "boom", Rgb::WHITE);
        view.begin(&mut display);
        assert_eq!(display.colour(), Rgb::RED);
        view.cleanup(&mut display);
        assert_eq!(display.colour(), Rgb::WHITE);
        assert_eq!(display.colour_history(), &[Rgb::RED, Rgb::WHITE]);
    }

    #[test]
    fn neutral_message_leaves_colour_until_cleanup() {
        let mut display = TextDisplay::new();
        let mut view = MessageView::new("coldsign v0.6.0", "hello", Rgb::new(10, 20, 30));
        view.begin(&mut display);
        assert!(display.colour_history().is_empty());
        view.cleanup(&mut display);
        assert_eq!(display.colour(), Rgb::new(10, 20, 30));
    }

    #[test]
    fn button_blinks_every_second() {
        let mut view = MessageView::new("Success", "done", Rgb::WHITE);
        let start = Instant::now();
        view.start_blink(start);
        assert!(view.arrows_visible());
        assert!(!view.blink_at(start + Duration::from_millis(500)));
        assert!(view.blink_at(start + Duration::from_secs(1)));
        assert!(!view.arrows_visible());
        assert!(view.blink_at(start + Duration::from_secs(2)));
        assert!(view.arrows_visible());
    }

    #[test]
    fn cleanup_stops_blinking() {
        let mut display = TextDisplay::new();
        let mut view = MessageView::new("Success", "done", Rgb::WHITE);
        view.begin(&mut display);
        view.cleanup(&mut display);
        assert!(!view.blink_at(Instant::now() + Duration::from_secs(5)));
    }

    #[test]
    fn redraw_writes_button_row() {
        let mut display = TextDisplay::new();
        let mut view = MessageView::new("Please note", "No USB stick seems to be plugged in.", Rgb::WHITE);
        view.redraw(&mut display);
        assert_eq!(display.row(0).trim(), "Please note");
        assert_eq!(display.row(1), "No USB stick seems to be plugged in.");
        assert_eq!(
            display.row(2),
            center(&format!("{ROM_ARROW_RIGHT}[OK]{ROM_ARROW_LEFT}"))
        );
        assert_eq!(view.select(), Some(ViewEvent::Dismissed));
    }

    #[test]
    fn set_row_updates_text() {
        let mut view = MessageView::new("About", "Fetching...", Rgb::WHITE).without_button();
        view.set_row(1, "Electrum 4.5.5");
        assert_eq!(view.row(1), Some("Electrum 4.5.5"));
        let mut display = TextDisplay::new();
        view.redraw(&mut display);
        assert_eq!(display.row(2), "");
    }
}
