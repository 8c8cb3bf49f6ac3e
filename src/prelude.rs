//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use coldsign::prelude::*;
//! ```

// Core
pub use crate::core::config::{Config, ConfigStore, SettingsStore, SharedSettings};
pub use crate::core::errors::{CsError, Result};

// Display and input
pub use crate::display::{Backlight, Display, Renderer, Rgb, TextDisplay};
pub use crate::input::InputEvent;

// Platform
pub use crate::platform::media::{DeviceSnapshot, LinuxMedia, MediaEnumerator};
pub use crate::platform::signer::{ElectrumCli, TransactionSigner, TxOutput};

// Timing and background work
pub use crate::timing::estimator::{TimingEstimator, TimingKind};
pub use crate::worker::executor::BackgroundExecutor;
pub use crate::worker::poller::ProgressPoller;

// Flows
pub use crate::app::{Console, MenuEntry};
pub use crate::logger::journal::ActivityJournal;
pub use crate::workflow::{Flow, Services, SigningWorkflow, WorkflowState};
