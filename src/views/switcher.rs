//! Holds the one active view of a flow and enforces begin/cleanup ordering.

#![allow(missing_docs)]

use crate::display::{Backlight, Renderer};
use crate::views::{ViewEvent, ViewOps};

/// At most one active view; switching cleans up the old view before the new
/// one begins.
#[derive(Debug)]
pub struct OptionSwitcher<V: ViewOps> {
    current: Option<V>,
}

impl<V: ViewOps> Default for OptionSwitcher<V> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<V: ViewOps> OptionSwitcher<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean up the active view, install `view` and begin it.
    pub fn switch(&mut self, view: V, backlight: &mut dyn Backlight) {
        if let Some(mut old) = self.current.take() {
            old.cleanup(backlight);
        }
        let view = self.current.insert(view);
        view.begin(backlight);
    }

    /// Clean up and drop the active view.
    pub fn close(&mut self, backlight: &mut dyn Backlight) {
        if let Some(mut old) = self.current.take() {
            old.cleanup(backlight);
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.current.is_some()
    }

    #[must_use]
    pub const fn current(&self) -> Option<&V> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut V> {
        self.current.as_mut()
    }

    pub fn redraw(&mut self, renderer: &mut dyn Renderer) {
        if let Some(view) = self.current.as_mut() {
            view.redraw(renderer);
        }
    }

    pub fn select(&mut self) -> Option<ViewEvent> {
        self.current.as_mut().and_then(ViewOps::select)
    }

    pub fn up(&mut self) -> bool {
        self.current.as_mut().is_some_and(ViewOps::up)
    }

    pub fn down(&mut self) -> bool {
        self.current.as_mut().is_some_and(ViewOps::down)
    }

    pub fn left(&mut self) -> bool {
        self.current.as_mut().is_some_and(ViewOps::left)
    }

    pub fn right(&mut self) -> bool {
        self.current.as_mut().is_some_and(ViewOps::right)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::display::TextDisplay;

    struct Probe {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl ViewOps for Probe {
        fn begin(&mut self, _backlight: &mut dyn Backlight) {
            self.log.borrow_mut().push(format!("begin {}", self.name));
        }

        fn redraw(&mut self, renderer: &mut dyn Renderer) {
            renderer.write_row(0, self.name);
        }

        fn select(&mut self) -> Option<ViewEvent> {
            Some(ViewEvent::Dismissed)
        }

        fn up(&mut self) -> bool {
            true
        }

        fn cleanup(&mut self, _backlight: &mut dyn Backlight) {
            self.log.borrow_mut().push(format!("cleanup {}", self.name));
        }
    }

    #[test]
    fn switch_cleans_up_before_begin() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut display = TextDisplay::new();
        let mut switcher = OptionSwitcher::new();
        switcher.switch(
            Probe {
                name: "a",
                log: Rc::clone(&log),
            },
            &mut display,
        );
        switcher.switch(
            Probe {
                name: "b",
                log: Rc::clone(&log),
            },
            &mut display,
        );
        switcher.close(&mut display);
        assert_eq!(
            *log.borrow(),
            vec!["begin a", "cleanup a", "begin b", "cleanup b"]
        );
        assert!(!switcher.is_active());
    }

    #[test]
    fn empty_switcher_forwards_nothing() {
        let mut switcher: OptionSwitcher<Probe> = OptionSwitcher::new();
        let mut display = TextDisplay::new();
        assert!(switcher.select().is_none());
        assert!(!switcher.up());
        assert!(!switcher.right());
        switcher.redraw(&mut display);
        assert_eq!(display.row(0), "");
    }

    #[test]
    fn active_view_receives_input() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut display = TextDisplay::new();
        let mut switcher = OptionSwitcher::new();
        switcher.switch(Probe { name: "a", log }, &mut display);
        assert!(switcher.up());
        assert!(!switcher.down());
        assert_eq!(switcher.select(), Some(ViewEvent::Dismissed));
        switcher.redraw(&mut display);
        assert_eq!(display.row(0), "a");
    }
}
