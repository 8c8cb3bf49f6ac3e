//! SIGTERM/SIGINT handling for the console runner.
//!
//! Uses the `signal-hook` crate for safe signal registration. The console loop
//! polls the flag every redraw tick rather than blocking on signals.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Shutdown flag shared between the signal handler and the console loop.
///
/// `Ordering::Relaxed` is enough because the loop polls it every tick.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create the flag and register SIGTERM/SIGINT. Registration is
    /// best-effort; failures are logged but not fatal.
    #[must_use]
    pub fn register() -> Self {
        let signal = Self::unregistered();
        for (name, sig) in [("SIGTERM", SIGTERM), ("SIGINT", SIGINT)] {
            if let Err(e) = signal_hook::flag::register(sig, Arc::clone(&signal.flag)) {
                log::warn!("[CS-SIGNAL] failed to register {name}: {e}");
            }
        }
        signal
    }

    /// A flag no OS signal will ever set.
    #[must_use]
    pub fn unregistered() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn should_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_visible_through_clones() {
        let signal = ShutdownSignal::unregistered();
        let clone = signal.clone();
        assert!(!clone.should_shutdown());
        signal.request_shutdown();
        assert!(clone.should_shutdown());
    }
}
