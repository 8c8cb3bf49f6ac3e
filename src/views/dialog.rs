//! Yes/no dialog. Left (or down) picks the negative answer, right (or up)
//! the positive one; select confirms only once an answer is picked.

#![allow(missing_docs)]

use crate::display::{OptionRow, ROM_ARROW_LEFT, ROM_ARROW_RIGHT, ROW_WIDTH, Renderer, center};
use crate::views::{ViewEvent, ViewOps};

const SCROLL_SPEED_MS: u32 = 300;
const SCROLL_DELAY_MS: u32 = 500;

#[derive(Debug, Clone)]
pub struct DialogView {
    title: String,
    message: String,
    negative: String,
    positive: String,
    answer: Option<bool>,
}

impl DialogView {
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            negative: "[No]".to_string(),
            positive: "[Yes]".to_string(),
            answer: None,
        }
    }

    #[must_use]
    pub const fn answer(&self) -> Option<bool> {
        self.answer
    }

    /// `[No]« ... »[Yes]`, arrows next to the picked answer.
    #[must_use]
    pub fn answers_row(&self) -> String {
        let used = self.negative.chars().count() + self.positive.chars().count() + 2;
        let spaces = ROW_WIDTH.saturating_sub(used);
        let left = if self.answer == Some(false) {
            ROM_ARROW_LEFT
        } else {
            ' '
        };
        let right = if self.answer == Some(true) {
            ROM_ARROW_RIGHT
        } else {
            ' '
        };
        format!(
            "{}{left}{}{right}{}",
            self.negative,
            " ".repeat(spaces),
            self.positive
        )
    }
}

impl ViewOps for DialogView {
    fn redraw(&mut self, renderer: &mut dyn Renderer) {
        for (row, text) in [(0, &self.title), (1, &self.message)] {
            let centered = center(text);
            renderer.write_option(
                row,
                &OptionRow::new(&centered).timing(SCROLL_SPEED_MS, SCROLL_DELAY_MS),
            );
        }
        renderer.write_row(2, &self.answers_row());
    }

    fn select(&mut self) -> Option<ViewEvent> {
        self.answer.map(ViewEvent::Answered)
    }

    fn up(&mut self) -> bool {
        self.right()
    }

    fn down(&mut self) -> bool {
        self.left()
    }

    fn left(&mut self) -> bool {
        self.answer = Some(false);
        true
    }

    fn right(&mut self) -> bool {
        self.answer = Some(true);
        true
    }
}
