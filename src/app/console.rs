//! Top-level menu and dispatch of input to the active flow.

#![allow(missing_docs)]

use std::fmt;

use crate::app::about::AboutFlow;
use crate::display::{Display, Renderer};
use crate::input::InputEvent;
use crate::views::{ListView, ViewEvent, ViewOps};
use crate::workflow::{EjectFlow, Flow, Services, SigningWorkflow, TrustFlow};

/// Main menu entries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    SignTx,
    TrustUsb,
    EjectUsb,
    About,
}

impl MenuEntry {
    pub const ALL: [Self; 4] = [Self::SignTx, Self::TrustUsb, Self::EjectUsb, Self::About];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SignTx => "Sign TX",
            Self::TrustUsb => "Trust USB",
            Self::EjectUsb => "Eject USB",
            Self::About => "About",
        }
    }
}

impl fmt::Display for MenuEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

enum Active {
    /// The signing workflow is kept across cycles and restarted each time.
    Signing,
    Other(Box<dyn Flow>),
}

pub struct Console {
    services: Services,
    menu: ListView,
    signing: SigningWorkflow,
    active: Option<Active>,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("in_menu", &self.in_menu())
            .field("signing", &self.signing)
            .finish_non_exhaustive()
    }
}

impl Console {
    #[must_use]
    pub fn new(services: Services) -> Self {
        let entries = MenuEntry::ALL.iter().map(ToString::to_string).collect();
        Self {
            signing: SigningWorkflow::new(services.clone()),
            services,
            menu: ListView::new(entries, None).cycling(true),
            active: None,
        }
    }

    #[must_use]
    pub const fn services(&self) -> &Services {
        &self.services
    }

    #[must_use]
    pub const fn signing(&self) -> &SigningWorkflow {
        &self.signing
    }

    #[must_use]
    pub const fn in_menu(&self) -> bool {
        self.active.is_none()
    }

    /// Whether a background task is being waited on.
    #[must_use]
    pub fn is_progressing(&self) -> bool {
        match &self.active {
            Some(Active::Signing) => self.signing.is_progressing(),
            Some(Active::Other(flow)) => flow.is_progressing(),
            None => false,
        }
    }

    fn active_flow(&mut self) -> Option<&mut dyn Flow> {
        match self.active.as_mut()? {
            Active::Signing => Some(&mut self.signing),
            Active::Other(flow) => Some(flow.as_mut()),
        }
    }

    /// Route one input. Returns whether anything handled it.
    pub fn handle_input(&mut self, input: InputEvent, display: &mut dyn Display) -> bool {
        if self.active.is_none() {
            return self.handle_menu(input, display);
        }
        if input == InputEvent::Cancel {
            if self.is_progressing() {
                log::debug!("cancel ignored while a task runs");
                return true;
            }
            let left = self.active_flow().is_some_and(|flow| flow.close(display));
            if left {
                self.active = None;
            }
            return left;
        }

        let (handled, done) = match self.active_flow() {
            Some(flow) => {
                let handled = flow.handle(input, display);
                (handled, flow.is_done())
            }
            None => (false, true),
        };
        if done {
            self.active = None;
        }
        handled
    }

    fn handle_menu(&mut self, input: InputEvent, display: &mut dyn Display) -> bool {
        match input {
            InputEvent::Up => self.menu.up(),
            InputEvent::Down => self.menu.down(),
            InputEvent::Select => match self.menu.select() {
                Some(ViewEvent::Chosen(index)) => match MenuEntry::ALL.get(index) {
                    Some(entry) => {
                        self.start(*entry, display);
                        true
                    }
                    None => false,
                },
                _ => false,
            },
            InputEvent::Left | InputEvent::Right | InputEvent::Cancel => false,
        }
    }

    /// Open `entry` as if it had been chosen in the menu.
    pub fn start(&mut self, entry: MenuEntry, display: &mut dyn Display) {
        log::info!("opening {entry}");
        let active = match entry {
            MenuEntry::SignTx => {
                self.signing.restart();
                Active::Signing
            }
            MenuEntry::TrustUsb => Active::Other(Box::new(TrustFlow::new(self.services.clone()))),
            MenuEntry::EjectUsb => Active::Other(Box::new(EjectFlow::new(self.services.clone()))),
            MenuEntry::About => Active::Other(Box::new(AboutFlow::new(self.services.clone()))),
        };
        self.active = Some(active);
        if let Some(flow) = self.active_flow() {
            flow.begin(display);
        }
    }

    pub fn redraw(&mut self, renderer: &mut dyn Renderer) {
        match self.active_flow() {
            Some(flow) => flow.redraw(renderer),
            None => self.menu.redraw(renderer),
        }
    }
}
