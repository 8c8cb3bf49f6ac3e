//! Scrollable lists: the plain menu and the transaction file picker.

#![allow(missing_docs)]

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::core::errors::{CsError, Result};
use crate::display::{OptionRow, ROM_CURSOR, Renderer, Window};
use crate::views::{ViewEvent, ViewOps};

/// Scroll timing for list rows and titles.
const SCROLL_SPEED_MS: u32 = 400;
const SCROLL_DELAY_MS: u32 = 800;

/// Draw an optional title and the visible page of `window`.
///
/// Only the current row scrolls; the cursor marks it.
fn draw_window<T: fmt::Display>(
    renderer: &mut dyn Renderer,
    title: Option<&str>,
    window: &Window<T>,
) {
    let offset = usize::from(title.is_some());
    if let Some(title) = title {
        renderer.write_option(0, &OptionRow::new(title).timing(SCROLL_SPEED_MS, SCROLL_DELAY_MS));
    }
    for (row, idx) in window.visible_rows() {
        match idx.and_then(|idx| window.entries().get(idx).map(|entry| (idx, entry))) {
            Some((idx, entry)) => {
                let text = entry.to_string();
                let is_current = idx == window.current_index();
                let option = OptionRow::new(&text)
                    .timing(SCROLL_SPEED_MS, SCROLL_DELAY_MS)
                    .scroll(is_current && text.chars().count() > crate::display::ROW_WIDTH - 1)
                    .icon(Some(if is_current { ROM_CURSOR } else { ' ' }));
                renderer.write_option(offset + row, &option);
            }
            None => renderer.clear_row(offset + row),
        }
    }
}

/// A menu of text entries.
#[derive(Debug, Clone)]
pub struct ListView {
    title: Option<String>,
    window: Window<String>,
}

impl ListView {
    #[must_use]
    pub fn new(entries: Vec<String>, title: Option<String>) -> Self {
        let window = Window::for_display(entries, title.is_some());
        Self { title, window }
    }

    #[must_use]
    pub fn cycling(mut self, cycling: bool) -> Self {
        self.window = self.window.cycling(cycling);
        self
    }

    #[must_use]
    pub const fn window(&self) -> &Window<String> {
        &self.window
    }
}

impl ViewOps for ListView {
    fn redraw(&mut self, renderer: &mut dyn Renderer) {
        draw_window(renderer, self.title.as_deref(), &self.window);
    }

    fn select(&mut self) -> Option<ViewEvent> {
        (!self.window.is_empty()).then(|| ViewEvent::Chosen(self.window.current_index()))
    }

    fn up(&mut self) -> bool {
        self.window.move_up()
    }

    fn down(&mut self) -> bool {
        self.window.move_down()
    }
}

/// A file found in the transaction directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Regular files directly inside `dir` whose name matches `pattern` and not
/// `exclude`, sorted by name.
pub fn search_files(
    dir: &Path,
    pattern: &Regex,
    exclude: Option<&Regex>,
) -> Result<Vec<FileEntry>> {
    let read_dir = fs::read_dir(dir).map_err(|err| CsError::FileRead {
        path: dir.to_path_buf(),
        details: format!("cannot list transaction directory: {err}"),
    })?;
    let mut entries = Vec::new();
    for item in read_dir {
        let item = item.map_err(|source| CsError::io(dir, source))?;
        let is_file = item.file_type().is_ok_and(|ft| ft.is_file());
        let name = item.file_name().to_string_lossy().into_owned();
        let excluded = exclude.is_some_and(|ex| ex.is_match(&name));
        if is_file && pattern.is_match(&name) && !excluded {
            entries.push(FileEntry {
                path: item.path(),
                name,
            });
        }
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Pick one transaction file.
#[derive(Debug, Clone)]
pub struct FileSelectView {
    prompt: String,
    window: Window<FileEntry>,
}

impl FileSelectView {
    #[must_use]
    pub fn new(entries: Vec<FileEntry>, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            window: Window::for_display(entries, true),
        }
    }

    /// List `dir` through `pattern`, leaving out names matching `exclude`.
    pub fn scan(
        dir: &Path,
        pattern: &Regex,
        exclude: Option<&Regex>,
        prompt: impl Into<String>,
    ) -> Result<Self> {
        let entries = search_files(dir, pattern, exclude)?;
        log::debug!(
            "{} transaction file(s) in {}",
            entries.len(),
            dir.display()
        );
        Ok(Self::new(entries, prompt))
    }

    #[must_use]
    pub fn current_entry(&self) -> Option<&FileEntry> {
        self.window.current_entry()
    }

    #[must_use]
    pub const fn window(&self) -> &Window<FileEntry> {
        &self.window
    }
}

impl ViewOps for FileSelectView {
    fn redraw(&mut self, renderer: &mut dyn Renderer) {
        draw_window(renderer, Some(&self.prompt), &self.window);
    }

    fn select(&mut self) -> Option<ViewEvent> {
        self.window
            .current_entry()
            .cloned()
            .map(ViewEvent::FileChosen)
    }

    fn up(&mut self) -> bool {
        self.window.move_up()
    }

    fn down(&mut self) -> bool {
        self.window.move_down()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::TextDisplay;

    fn menu() -> ListView {
        ListView::new(
            ["Sign TX", "Trust USB", "Eject USB", "About"]
                .map(String::from)
                .to_vec(),
            None,
        )
        .cycling(true)
    }

    #[test]
    fn menu_draws_cursor_on_current_row() {
        let mut view = menu();
        let mut display = TextDisplay::new();
        view.redraw(&mut display);
        assert_eq!(display.row(0), format!("{ROM_CURSOR}Sign TX"));
        assert_eq!(display.row(1), " Trust USB");
        view.down();
        view.redraw(&mut display);
        assert_eq!(display.row(1), format!("{ROM_CURSOR}Trust USB"));
    }

    #[test]
    fn menu_turns_page_and_clears_unused_rows() {
        let mut view = menu();
        let mut display = TextDisplay::new();
        for _ in 0..3 {
            view.down();
        }
        view.redraw(&mut display);
        assert_eq!(display.row(0), format!("{ROM_CURSOR}About"));
        assert_eq!(display.row(1), "");
        assert_eq!(view.select(), Some(ViewEvent::Chosen(3)));
    }

    #[test]
    fn search_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txn", "a.txn", "notes.txt", "c_signed.txn.bak"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("dir.txn")).unwrap();
        let pattern = Regex::new(r"\.txn$").unwrap();
        let names: Vec<String> = search_files(dir.path(), &pattern, None)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a.txn", "b.txn"]);
    }

    #[test]
    fn search_leaves_out_excluded_names() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["rent.txn", "rent_signed_2026-03-01_09-05-00.txn"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let pattern = Regex::new(r"\.txn$").unwrap();
        let signed = Regex::new(r"_signed_.+\.txn$").unwrap();
        let names: Vec<String> = search_files(dir.path(), &pattern, Some(&signed))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["rent.txn"]);
    }

    #[test]
    fn missing_directory_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = Regex::new(".*").unwrap();
        let err = search_files(&dir.path().join("missing"), &pattern, None).unwrap_err();
        assert_eq!(err.code(), "CS-3001");
    }

    #[test]
    fn file_view_selects_current_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.txn"), "x").unwrap();
        fs::write(dir.path().join("two.txn"), "x").unwrap();
        let pattern = Regex::new(r"\.txn$").unwrap();
        let mut view = FileSelectView::scan(dir.path(), &pattern, None, "Select TX on USB").unwrap();
        let mut display = TextDisplay::new();
        view.redraw(&mut display);
        assert_eq!(display.row(0), "Select TX on USB");
        view.down();
        match view.select() {
            Some(ViewEvent::FileChosen(entry)) => assert_eq!(entry.name, "two.txn"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn empty_file_view_selects_nothing() {
        let mut view = FileSelectView::new(Vec::new(), "Select TX on USB");
        assert!(!view.down());
        assert!(view.select().is_none());
    }
}
