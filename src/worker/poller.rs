//! Foreground progress loop for a running background task.
//!
//! Blocks the caller until the task resolves, reporting `elapsed / estimate`
//! on every tick. Navigation input is not read while this runs.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::errors::{CsError, Result};
use crate::worker::executor::{BackgroundExecutor, TaskHandle};

/// Default interval between progress reports.
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

/// Time source for the poller.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time with real sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock advanced only by `sleep` and `advance`.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
        // Give the worker a chance to finish without real waiting.
        std::thread::yield_now();
    }
}

/// Receives progress values in `[0, 1]`.
pub trait ProgressSink {
    fn report(&mut self, progress: f64);
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn report(&mut self, progress: f64) {
        self(progress);
    }
}

/// Progress of `elapsed` against `estimate`, rounded to two decimals and clamped.
#[must_use]
pub fn progress_ratio(elapsed: Duration, estimate: Duration) -> f64 {
    if estimate.is_zero() {
        return 1.0;
    }
    let raw = elapsed.as_secs_f64() / estimate.as_secs_f64();
    ((raw * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

/// Blocking progress loop.
#[derive(Debug)]
pub struct ProgressPoller<C: Clock = SystemClock> {
    tick: Duration,
    clock: C,
}

impl Default for ProgressPoller<SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_TICK)
    }
}

impl ProgressPoller<SystemClock> {
    #[must_use]
    pub fn new(tick: Duration) -> Self {
        Self::with_clock(tick, SystemClock)
    }
}

impl<C: Clock> ProgressPoller<C> {
    #[must_use]
    pub fn with_clock(tick: Duration, clock: C) -> Self {
        Self { tick, clock }
    }

    #[must_use]
    pub const fn tick(&self) -> Duration {
        self.tick
    }

    /// Poll `handle` until it resolves. Reports `0.0` once resolved, then
    /// returns the task outcome.
    pub fn run<T>(
        &self,
        executor: &BackgroundExecutor,
        handle: &mut TaskHandle<T>,
        sink: &mut dyn ProgressSink,
        estimate: Duration,
    ) -> Result<T> {
        if handle.is_resolved() {
            return Err(CsError::Runtime {
                details: format!("task {} was already resolved", handle.id()),
            });
        }
        log::debug!(
            "polling task {} with estimate {:.2}s",
            handle.id(),
            estimate.as_secs_f64()
        );
        let started = self.clock.now();
        loop {
            if let Some(outcome) = executor.try_resolve(handle) {
                sink.report(0.0);
                return outcome;
            }
            let elapsed = self.clock.now().saturating_duration_since(started);
            sink.report(progress_ratio(elapsed, estimate));
            self.clock.sleep(self.tick);
        }
    }
}
