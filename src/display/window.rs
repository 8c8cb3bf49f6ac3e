//! Windowing engine: which slice of a list is on screen and which row is current.
//!
//! Pages are aligned to multiples of `page_size`, so `page_start` is always the
//! page that contains `current_index`. Out-of-range moves are no-ops unless the
//! window cycles.

#![allow(missing_docs)]

use std::fmt;

use super::ROM_CURSOR;

/// Rows available for entries when a title row is reserved.
pub const ROWS_WITH_TITLE: usize = 2;
/// Rows available for entries without a title row.
pub const ROWS_WITHOUT_TITLE: usize = 3;

/// A fixed-height view over an ordered list of entries.
#[derive(Debug, Clone)]
pub struct Window<T> {
    entries: Vec<T>,
    current_index: usize,
    page_start: usize,
    page_size: usize,
    cycling: bool,
}

impl<T> Window<T> {
    /// `page_size` is clamped to at least one row.
    #[must_use]
    pub fn new(entries: Vec<T>, page_size: usize) -> Self {
        Self {
            entries,
            current_index: 0,
            page_start: 0,
            page_size: page_size.max(1),
            cycling: false,
        }
    }

    /// Window sized for the display, with or without a title row.
    #[must_use]
    pub fn for_display(entries: Vec<T>, has_title: bool) -> Self {
        let rows = if has_title {
            ROWS_WITH_TITLE
        } else {
            ROWS_WITHOUT_TITLE
        };
        Self::new(entries, rows)
    }

    #[must_use]
    pub const fn cycling(mut self, cycling: bool) -> Self {
        self.cycling = cycling;
        self
    }

    /// Move the cursor one entry up. Returns whether the index changed.
    pub fn move_up(&mut self) -> bool {
        let len = self.entries.len();
        if len == 0 {
            return false;
        }
        if self.current_index > 0 {
            self.current_index -= 1;
            // Landing on the last row of a page means the previous page is shown.
            if (self.current_index + 1) % self.page_size == 0 {
                self.page_start = self.current_index + 1 - self.page_size;
            }
            true
        } else if self.cycling && len > 1 {
            self.current_index = len - 1;
            let tail = len % self.page_size;
            self.page_start = if tail == 0 {
                len.saturating_sub(self.page_size)
            } else {
                len - tail
            };
            true
        } else {
            false
        }
    }

    /// Move the cursor one entry down. Returns whether the index changed.
    pub fn move_down(&mut self) -> bool {
        let len = self.entries.len();
        if len == 0 {
            return false;
        }
        if self.current_index + 1 < len {
            self.current_index += 1;
            // Landing on the first row of a new page.
            if self.current_index % self.page_size == 0 {
                self.page_start = self.current_index;
            }
            true
        } else if self.cycling && len > 1 {
            self.current_index = 0;
            self.page_start = 0;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn current_entry(&self) -> Option<&T> {
        self.entries.get(self.current_index)
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub const fn page_start(&self) -> usize {
        self.page_start
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    /// `(row, entry index)` for every visible row; `None` past the end of the list.
    pub fn visible_rows(&self) -> impl Iterator<Item = (usize, Option<usize>)> + '_ {
        (0..self.page_size).map(move |row| {
            let idx = self.page_start + row;
            (row, (idx < self.entries.len()).then_some(idx))
        })
    }
}

/// A window whose entries can carry a single selection mark (radio semantics).
#[derive(Debug, Clone)]
pub struct SelectableList<T> {
    window: Window<T>,
    marked: Option<usize>,
    cursor_char: char,
    mark_char: char,
    template: String,
}

impl<T: fmt::Display> SelectableList<T> {
    #[must_use]
    pub fn new(window: Window<T>) -> Self {
        Self {
            window,
            marked: None,
            cursor_char: ROM_CURSOR,
            mark_char: 'o',
            template: "{entry} [{mark}]".to_string(),
        }
    }

    /// Pre-mark an entry; out-of-range indices are ignored.
    #[must_use]
    pub fn preset(mut self, index: usize) -> Self {
        if index < self.window.len() {
            self.marked = Some(index);
        }
        self
    }

    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    #[must_use]
    pub const fn mark_char(mut self, mark_char: char) -> Self {
        self.mark_char = mark_char;
        self
    }

    /// Mark the current entry, or clear the mark when it is already there.
    pub fn toggle_select(&mut self) {
        if self.window.is_empty() {
            return;
        }
        let current = self.window.current_index();
        self.marked = if self.marked == Some(current) {
            None
        } else {
            Some(current)
        };
    }

    #[must_use]
    pub const fn marked(&self) -> Option<usize> {
        self.marked
    }

    #[must_use]
    pub fn marked_entry(&self) -> Option<&T> {
        self.marked.and_then(|idx| self.window.entries().get(idx))
    }

    /// Leading icon for a row: the cursor on the current entry, blank otherwise.
    #[must_use]
    pub fn marker(&self, index: usize) -> char {
        if index == self.window.current_index() {
            self.cursor_char
        } else {
            ' '
        }
    }

    /// Row text: the template filled with the entry and its mark character.
    #[must_use]
    pub fn render_row(&self, index: usize) -> String {
        let Some(entry) = self.window.entries().get(index) else {
            return String::new();
        };
        let mark = if self.marked == Some(index) {
            self.mark_char
        } else {
            ' '
        };
        self.template
            .replace("{cursor}", &self.marker(index).to_string())
            .replace("{entry}", &entry.to_string())
            .replace("{mark}", &mark.to_string())
    }

    pub fn move_up(&mut self) -> bool {
        self.window.move_up()
    }

    pub fn move_down(&mut self) -> bool {
        self.window.move_down()
    }

    #[must_use]
    pub const fn window(&self) -> &Window<T> {
        &self.window
    }
}
