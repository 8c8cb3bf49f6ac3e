//! Multi-step flows driven by the console: signing, trusting and ejecting sticks.

#![allow(missing_docs)]

pub mod signing;
pub mod usb;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use crate::core::config::{Config, SharedSettings};
use crate::display::{Display, Renderer};
use crate::input::InputEvent;
use crate::logger::journal::ActivityJournal;
use crate::platform::media::MediaEnumerator;
use crate::platform::signer::TransactionSigner;
use crate::worker::executor::BackgroundExecutor;

pub use signing::{DeclinePolicy, Failure, SigningWorkflow, WorkflowState};
pub use usb::{EjectFlow, MountedDevice, TrustFlow, find_trusted};

/// Collaborators shared by every flow.
#[derive(Clone)]
pub struct Services {
    /// Effective configuration at startup.
    pub config: Arc<Config>,
    pub settings: SharedSettings,
    pub media: Arc<dyn MediaEnumerator>,
    pub signer: Arc<dyn TransactionSigner>,
    pub executor: Arc<BackgroundExecutor>,
    pub journal: ActivityJournal,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("config", &self.config)
            .field("executor_busy", &self.executor.is_busy())
            .finish_non_exhaustive()
    }
}

/// A screen sequence started from the main menu.
pub trait Flow {
    fn begin(&mut self, display: &mut dyn Display);
    /// Returns whether the input was handled.
    fn handle(&mut self, input: InputEvent, display: &mut dyn Display) -> bool;
    fn redraw(&mut self, renderer: &mut dyn Renderer);
    /// Leave the flow early. Returns false when leaving is not allowed right now.
    fn close(&mut self, display: &mut dyn Display) -> bool;
    /// The flow has finished and the menu should take over.
    fn is_done(&self) -> bool;
    /// A background task is being waited on.
    fn is_progressing(&self) -> bool {
        false
    }
}
