//! Paged review: two content rows per page and a navigation row.

#![allow(missing_docs)]

use crate::display::{
    GlyphSet, OptionRow, ROM_ARROW_LEFT, ROM_ARROW_RIGHT, ROW_WIDTH, Renderer, center,
};
use crate::views::{ViewEvent, ViewOps};

const SCROLL_SPEED_MS: u32 = 300;
const SCROLL_DELAY_MS: u32 = 500;

/// One content row of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRow {
    pub icon: Option<char>,
    pub text: String,
}

impl PageRow {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            icon: None,
            text: text.into(),
        }
    }

    #[must_use]
    pub const fn icon(mut self, icon: char) -> Self {
        self.icon = Some(icon);
        self
    }
}

/// Two content rows; the third display row is navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub rows: [PageRow; 2],
}

impl Page {
    #[must_use]
    pub const fn new(first: PageRow, second: PageRow) -> Self {
        Self {
            rows: [first, second],
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageView {
    pages: Vec<Page>,
    current: usize,
    auto_center: bool,
    glyphs: GlyphSet,
}

impl PageView {
    #[must_use]
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            current: 0,
            auto_center: true,
            glyphs: GlyphSet::default(),
        }
    }

    #[must_use]
    pub const fn auto_center(mut self, auto_center: bool) -> Self {
        self.auto_center = auto_center;
        self
    }

    /// Custom glyphs the page texts refer to.
    #[must_use]
    pub fn glyphs(mut self, glyphs: GlyphSet) -> Self {
        self.glyphs = glyphs;
        self
    }

    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// `«  n/m  »` with arrows only where another page exists.
    #[must_use]
    pub fn nav_row(&self) -> String {
        let total = self.pages.len();
        let prev = if self.current > 0 { ROM_ARROW_LEFT } else { ' ' };
        let next = if self.current + 1 < total {
            ROM_ARROW_RIGHT
        } else {
            ' '
        };
        let counter = format!("{}/{}", self.current + 1, total);
        let inner = ROW_WIDTH - 2;
        let pad = inner.saturating_sub(counter.chars().count());
        let left = pad / 2;
        format!(
            "{prev}{}{counter}{}{next}",
            " ".repeat(left),
            " ".repeat(pad - left)
        )
    }
}

impl ViewOps for PageView {
    fn redraw(&mut self, renderer: &mut dyn Renderer) {
        renderer.load_glyphs(&self.glyphs);
        let Some(page) = self.pages.get(self.current) else {
            for row in 0..2 {
                renderer.clear_row(row);
            }
            renderer.write_row(2, &center("0/0"));
            return;
        };
        for (idx, row) in page.rows.iter().enumerate() {
            let text = if self.auto_center {
                center(&row.text)
            } else {
                row.text.clone()
            };
            let option = OptionRow::new(&text)
                .timing(SCROLL_SPEED_MS, SCROLL_DELAY_MS)
                .scroll(row.text.chars().count() + usize::from(row.icon.is_some()) > ROW_WIDTH)
                .icon(row.icon);
            renderer.write_option(idx, &option);
        }
        renderer.write_row(2, &self.nav_row());
    }

    fn select(&mut self) -> Option<ViewEvent> {
        Some(ViewEvent::Confirmed)
    }

    fn left(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
        }
        true
    }

    fn right(&mut self) -> bool {
        if self.current + 1 < self.pages.len() {
            self.current += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::TextDisplay;

    fn pages(n: usize) -> PageView {
        PageView::new(
            (0..n)
                .map(|i| Page::new(PageRow::new(format!("To: addr{i}")), PageRow::new("1.0")))
                .collect(),
        )
        .auto_center(false)
    }

    #[test]
    fn nav_row_shows_position_and_arrows() {
        let mut view = pages(3);
        assert_eq!(view.nav_row(), format!("      1/3      {ROM_ARROW_RIGHT}"));
        view.right();
        let nav = view.nav_row();
        assert!(nav.starts_with(ROM_ARROW_LEFT));
        assert!(nav.ends_with(ROM_ARROW_RIGHT));
        assert_eq!(nav.chars().count(), ROW_WIDTH);
        view.right();
        view.right();
        assert_eq!(view.current_page(), 2);
        assert!(view.nav_row().ends_with(' '));
    }

    #[test]
    fn left_stops_at_first_page() {
        let mut view = pages(2);
        assert!(view.left());
        assert_eq!(view.current_page(), 0);
    }

    #[test]
    fn redraw_shows_current_page() {
        let mut view = pages(2);
        view.right();
        let mut display = TextDisplay::new();
        view.redraw(&mut display);
        assert_eq!(display.row(0), "To: addr1");
        assert_eq!(display.row(1), "1.0");
        assert!(display.row(2).contains("2/2"));
        assert_eq!(view.select(), Some(ViewEvent::Confirmed));
    }

    #[test]
    fn icon_rows_keep_icon() {
        let mut view = PageView::new(vec![Page::new(
            PageRow::new("To: x"),
            PageRow::new(" : 0.5").icon('\x00'),
        )])
        .auto_center(false);
        let mut display = TextDisplay::new();
        view.redraw(&mut display);
        assert_eq!(display.row(1), "\x00 : 0.5");
    }
}
