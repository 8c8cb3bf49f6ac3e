//! Screens shown on the 16x3 display.
//!
//! Every screen implements [`ViewOps`]; [`View`] is the closed set of screens
//! a flow can put into its [`OptionSwitcher`].

#![allow(missing_docs)]

pub mod dialog;
pub mod list;
pub mod message;
pub mod pages;
pub mod progress;
pub mod radio;
pub mod switcher;

use crate::display::{Backlight, Renderer};

pub use dialog::DialogView;
pub use list::{FileEntry, FileSelectView, ListView};
pub use message::{MessageView, Tone};
pub use pages::{Page, PageRow, PageView};
pub use progress::ProgressView;
pub use radio::RadioListView;
pub use switcher::OptionSwitcher;

/// Outcome of a confirm press on a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// A menu entry was chosen.
    Chosen(usize),
    /// A file was chosen in a file list.
    FileChosen(FileEntry),
    /// The paged review was confirmed.
    Confirmed,
    /// A yes/no dialog was answered.
    Answered(bool),
    /// A message was acknowledged.
    Dismissed,
}

/// Lifecycle and navigation capabilities of a screen.
///
/// Directional methods return whether the input was handled.
pub trait ViewOps {
    fn begin(&mut self, _backlight: &mut dyn Backlight) {}
    fn redraw(&mut self, renderer: &mut dyn Renderer);
    fn select(&mut self) -> Option<ViewEvent>;
    fn up(&mut self) -> bool {
        false
    }
    fn down(&mut self) -> bool {
        false
    }
    fn left(&mut self) -> bool {
        false
    }
    fn right(&mut self) -> bool {
        false
    }
    fn cleanup(&mut self, _backlight: &mut dyn Backlight) {}
}

/// Every screen a flow can show.
#[derive(Debug)]
pub enum View {
    List(ListView),
    Files(FileSelectView),
    Radio(RadioListView),
    Progress(ProgressView),
    Pages(PageView),
    Dialog(DialogView),
    Message(MessageView),
}

impl View {
    fn ops(&mut self) -> &mut dyn ViewOps {
        match self {
            Self::List(v) => v,
            Self::Files(v) => v,
            Self::Radio(v) => v,
            Self::Progress(v) => v,
            Self::Pages(v) => v,
            Self::Dialog(v) => v,
            Self::Message(v) => v,
        }
    }
}

impl ViewOps for View {
    fn begin(&mut self, backlight: &mut dyn Backlight) {
        self.ops().begin(backlight);
    }

    fn redraw(&mut self, renderer: &mut dyn Renderer) {
        self.ops().redraw(renderer);
    }

    fn select(&mut self) -> Option<ViewEvent> {
        self.ops().select()
    }

    fn up(&mut self) -> bool {
        self.ops().up()
    }

    fn down(&mut self) -> bool {
        self.ops().down()
    }

    fn left(&mut self) -> bool {
        self.ops().left()
    }

    fn right(&mut self) -> bool {
        self.ops().right()
    }

    fn cleanup(&mut self, backlight: &mut dyn Backlight) {
        self.ops().cleanup(backlight);
    }
}
