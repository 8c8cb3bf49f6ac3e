//! Periodic timers for the UI, polled cooperatively with a cancellation token.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A recurring deadline. `poll` fires at most once per call and never after
/// cancellation.
#[derive(Debug, Clone)]
pub struct Periodic {
    interval: Duration,
    next_due: Instant,
    token: CancelToken,
}

impl Periodic {
    /// First firing is one `interval` after `start`.
    #[must_use]
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            next_due: start + interval,
            token: CancelToken::new(),
        }
    }

    #[must_use]
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns true when the deadline has passed, and schedules the next one.
    /// Missed intervals collapse into a single firing.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.token.is_cancelled() || now < self.next_due {
            return false;
        }
        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
        true
    }
}
