//! Background execution of slow signer calls and the foreground progress loop.

pub mod executor;
pub mod poller;

pub use executor::{BackgroundExecutor, TaskHandle, Tracking};
pub use poller::{Clock, ManualClock, ProgressPoller, ProgressSink, SystemClock};
