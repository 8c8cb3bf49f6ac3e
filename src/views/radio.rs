//! Single-choice list: select toggles the mark on the current entry.

#![allow(missing_docs)]

use crate::display::{OptionRow, ROW_WIDTH, Renderer, SelectableList, Window};
use crate::views::{ViewEvent, ViewOps};

#[derive(Debug, Clone)]
pub struct RadioListView {
    title: Option<String>,
    list: SelectableList<String>,
}

impl RadioListView {
    #[must_use]
    pub fn new(entries: Vec<String>, title: Option<String>) -> Self {
        let window = Window::for_display(entries, title.is_some());
        Self {
            title,
            list: SelectableList::new(window),
        }
    }

    #[must_use]
    pub fn preset(mut self, index: usize) -> Self {
        self.list = self.list.preset(index);
        self
    }

    #[must_use]
    pub const fn marked(&self) -> Option<usize> {
        self.list.marked()
    }

    #[must_use]
    pub const fn list(&self) -> &SelectableList<String> {
        &self.list
    }
}

impl ViewOps for RadioListView {
    fn redraw(&mut self, renderer: &mut dyn Renderer) {
        let offset = usize::from(self.title.is_some());
        if let Some(title) = &self.title {
            renderer.write_option(0, &OptionRow::new(title));
        }
        let window = self.list.window();
        let rows: Vec<(usize, Option<usize>)> = window.visible_rows().collect();
        for (row, idx) in rows {
            match idx {
                Some(idx) => {
                    let text = self.list.render_row(idx);
                    let is_current = idx == window.current_index();
                    let option = OptionRow::new(&text)
                        .scroll(is_current && text.chars().count() > ROW_WIDTH - 1)
                        .icon(Some(self.list.marker(idx)));
                    renderer.write_option(offset + row, &option);
                }
                None => renderer.clear_row(offset + row),
            }
        }
    }

    /// Toggles the mark; the owning flow reads [`RadioListView::marked`].
    fn select(&mut self) -> Option<ViewEvent> {
        self.list.toggle_select();
        None
    }

    fn up(&mut self) -> bool {
        self.list.move_up()
    }

    fn down(&mut self) -> bool {
        self.list.move_down()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{ROM_CURSOR, TextDisplay};

    #[test]
    fn select_marks_and_renders() {
        let mut view = RadioListView::new(
            vec!["STICK A".to_string(), "STICK B".to_string()],
            Some("Trust stick?".to_string()),
        );
        view.down();
        assert!(view.select().is_none());
        assert_eq!(view.marked(), Some(1));

        let mut display = TextDisplay::new();
        view.redraw(&mut display);
        assert_eq!(display.row(0), "Trust stick?");
        assert_eq!(display.row(1), " STICK A [ ]");
        assert_eq!(display.row(2), format!("{ROM_CURSOR}STICK B [o]"));
    }

    #[test]
    fn second_select_clears_mark() {
        let mut view = RadioListView::new(vec!["a".to_string()], None).preset(0);
        view.select();
        assert_eq!(view.marked(), None);
    }
}
