//! Single-thread background executor for the slow signer calls.
//!
//! Jobs run one at a time on the `coldsign-worker` thread. Each task reports
//! back on its own completion channel, which the foreground drains through
//! [`BackgroundExecutor::try_resolve`]. Timing samples are recorded there, on
//! the foreground, before the outcome is handed back.
//!
//! The slot is free only when the last handle is resolved or dropped *and*
//! the worker has returned from the job, so an abandoned task still blocks
//! the next submit until it really finishes.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::core::errors::{CsError, Result};
use crate::timing::estimator::{TimingEstimator, TimingKind};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Which timing window a task feeds, and the input size it ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tracking {
    pub kind: TimingKind,
    pub input_bytes: u64,
}

impl Tracking {
    #[must_use]
    pub const fn new(kind: TimingKind, input_bytes: u64) -> Self {
        Self { kind, input_bytes }
    }
}

struct Completion<T> {
    outcome: Result<T>,
    elapsed: Duration,
}

/// Foreground side of one submitted task.
pub struct TaskHandle<T> {
    id: u64,
    tracking: Option<Tracking>,
    done_rx: Receiver<Completion<T>>,
    resolved: bool,
    busy: Arc<AtomicBool>,
}

impl<T> TaskHandle<T> {
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn tracking(&self) -> Option<Tracking> {
        self.tracking
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved
    }

    fn mark_resolved(&mut self) {
        self.resolved = true;
        self.busy.store(false, Ordering::Release);
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        // The worker keeps `running` set until the abandoned job returns.
        if !self.resolved {
            self.busy.store(false, Ordering::Release);
        }
    }
}

/// Clears the running flag when the job returns or unwinds.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("tracking", &self.tracking)
            .field("resolved", &self.resolved)
            .finish_non_exhaustive()
    }
}

/// One worker thread, at most one unresolved task.
pub struct BackgroundExecutor {
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    estimator: TimingEstimator,
    /// A handle is outstanding.
    busy: Arc<AtomicBool>,
    /// The worker is inside a job.
    running: Arc<AtomicBool>,
    next_id: AtomicU64,
}

impl BackgroundExecutor {
    /// Spawn the worker thread.
    pub fn start(estimator: TimingEstimator) -> Result<Self> {
        let (jobs_tx, jobs_rx) = crossbeam_channel::unbounded::<Job>();
        let worker = thread::Builder::new()
            .name("coldsign-worker".to_string())
            .spawn(move || worker_thread_main(&jobs_rx))
            .map_err(|source| CsError::Runtime {
                details: format!("failed to spawn worker thread: {source}"),
            })?;
        Ok(Self {
            jobs: Some(jobs_tx),
            worker: Some(worker),
            estimator,
            busy: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            next_id: AtomicU64::new(1),
        })
    }

    #[must_use]
    pub const fn estimator(&self) -> &TimingEstimator {
        &self.estimator
    }

    /// Whether a task is unresolved or the worker is still running one.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire) || self.running.load(Ordering::Acquire)
    }

    /// Queue `operation` on the worker. Fails with `WorkerBusy` while another
    /// task is unresolved or still running after its handle was dropped.
    pub fn submit<T, F>(&self, tracking: Option<Tracking>, operation: F) -> Result<TaskHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        if self.running.load(Ordering::Acquire)
            || self
                .busy
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            return Err(CsError::WorkerBusy);
        }
        self.running.store(true, Ordering::Release);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = crossbeam_channel::bounded::<Completion<T>>(1);
        let guard = RunningGuard(Arc::clone(&self.running));
        let job: Job = Box::new(move || {
            let started = Instant::now();
            let outcome = operation();
            let elapsed = started.elapsed();
            // Cleared before sending so a resolved handle never sees a stale flag.
            drop(guard);
            if done_tx.send(Completion { outcome, elapsed }).is_err() {
                log::debug!("task {id} finished after its handle was dropped");
            }
        });

        let queued = self.jobs.as_ref().is_some_and(|jobs| jobs.send(job).is_ok());
        if !queued {
            // The rejected job was dropped with its guard, clearing `running`.
            self.busy.store(false, Ordering::Release);
            return Err(CsError::ChannelClosed {
                component: "worker",
            });
        }

        log::debug!("submitted task {id} ({tracking:?})");
        Ok(TaskHandle {
            id,
            tracking,
            done_rx,
            resolved: false,
            busy: Arc::clone(&self.busy),
        })
    }

    /// Drain the task's completion, if it arrived. Records the timing sample
    /// of a tracked, successful task before returning its outcome.
    ///
    /// Returns `None` while the task is running and for handles that were
    /// already resolved.
    pub fn try_resolve<T>(&self, handle: &mut TaskHandle<T>) -> Option<Result<T>> {
        if handle.resolved {
            return None;
        }
        let completion = match handle.done_rx.try_recv() {
            Ok(completion) => completion,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                handle.mark_resolved();
                log::warn!("worker vanished before task {} completed", handle.id);
                return Some(Err(CsError::ChannelClosed {
                    component: "worker",
                }));
            }
        };
        handle.mark_resolved();

        match (&completion.outcome, handle.tracking) {
            (Ok(_), Some(tracking)) => {
                self.estimator
                    .record(tracking.kind, completion.elapsed, tracking.input_bytes);
            }
            (Err(err), _) => {
                log::info!(
                    "task {} failed after {:.2}s: {err}",
                    handle.id,
                    completion.elapsed.as_secs_f64()
                );
            }
            (Ok(_), None) => {}
        }
        Some(completion.outcome)
    }
}

impl Drop for BackgroundExecutor {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            log::warn!("worker thread panicked");
        }
    }
}

fn worker_thread_main(jobs: &Receiver<Job>) {
    for job in jobs {
        job();
    }
    log::debug!("worker thread exiting");
}
