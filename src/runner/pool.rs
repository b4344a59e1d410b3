//! Bounded task pool with cooperative cancellation
//!
//! This module handles:
//! - Limiting how many submitted tasks run at once via a semaphore
//! - Tracking queued tasks so an immediate shutdown can report the ones
//!   that never started
//! - Isolating task failures and panics from the pool
//! - Waiting for termination with a deadline

use crate::runner::RunnerError;
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Outcome counters of a runner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub panicked: u64,
    pub never_started: u64,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
    never_started: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> RunnerStats {
        RunnerStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            never_started: self.never_started.load(Ordering::Relaxed),
        }
    }
}

type QueuedTasks = Arc<Mutex<BTreeMap<u64, String>>>;

/// A fixed-size pool of concurrently running async tasks
///
/// Every task receives a child of the runner's cancellation token and is
/// expected to check it at its own suspension points. The runner never
/// aborts a running task; it only stops handing out slots.
///
/// Tasks are spawned on the ambient tokio runtime, so `submit` must be
/// called from within one.
pub struct TaskRunner {
    name: String,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    cancel: CancellationToken,
    accepting: AtomicBool,
    queued: QueuedTasks,
    next_id: AtomicU64,
    counters: Arc<Counters>,
}

impl TaskRunner {
    /// Creates a runner that executes at most `workers` tasks at once
    ///
    /// Cancelling `cancel` (or calling [`TaskRunner::shutdown_now`]) is the
    /// interrupt signal for every task of this runner.
    pub fn new(name: impl Into<String>, workers: usize, cancel: CancellationToken) -> Self {
        Self {
            name: name.into(),
            permits: Arc::new(Semaphore::new(workers.max(1))),
            tracker: TaskTracker::new(),
            cancel,
            accepting: AtomicBool::new(true),
            queued: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: AtomicU64::new(0),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Enqueues a task; it runs as soon as a worker slot is free
    ///
    /// Never blocks. Fails once the runner has been shut down.
    pub fn submit<F, Fut, E>(&self, task_name: impl Into<String>, task: F) -> Result<(), RunnerError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(RunnerError::ShutDown(self.name.clone()));
        }

        let task_name = task_name.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.queued).insert(id, task_name.clone());
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);

        let permits = Arc::clone(&self.permits);
        let queued = Arc::clone(&self.queued);
        let counters = Arc::clone(&self.counters);
        let cancel = self.cancel.clone();
        let runner = self.name.clone();

        self.tracker.spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = permits.acquire_owned() => permit.ok(),
            };

            // Whoever removes the entry owns the task: either this worker or
            // a `shutdown_now` that drained the queue first.
            let claimed = lock(&queued).remove(&id).is_some();
            let _permit = match permit {
                Some(permit) if claimed => permit,
                _ => {
                    if claimed {
                        counters.never_started.fetch_add(1, Ordering::Relaxed);
                    }
                    tracing::debug!("[{}] Task {} cancelled before it started", runner, task_name);
                    return;
                }
            };

            tracing::debug!("[{}] Task {} started", runner, task_name);
            let token = cancel.child_token();
            let outcome = AssertUnwindSafe(async move { task(token).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => {
                    counters.completed.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("[{}] Task {} finished", runner, task_name);
                }
                Ok(Err(e)) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("[{}] Task {} finished with error: {}", runner, task_name, e);
                }
                Err(panic) => {
                    counters.panicked.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(
                        "[{}] Task {} panicked: {}",
                        runner,
                        task_name,
                        panic_message(panic.as_ref())
                    );
                }
            }
        });

        Ok(())
    }

    /// Stops accepting new tasks; queued and running tasks still complete
    pub fn shutdown(&self) {
        self.accepting.store(false, Ordering::Release);
        self.tracker.close();
    }

    /// Stops accepting tasks, drops every queued task and signals running
    /// tasks to stop
    ///
    /// Returns the names of the tasks that never started.
    pub fn shutdown_now(&self) -> Vec<String> {
        self.shutdown();

        let drained = std::mem::take(&mut *lock(&self.queued));
        self.counters
            .never_started
            .fetch_add(drained.len() as u64, Ordering::Relaxed);
        self.cancel.cancel();

        if !drained.is_empty() {
            tracing::info!(
                "[{}] Dropped {} queued tasks on shutdown",
                self.name,
                drained.len()
            );
        }

        drained.into_values().collect()
    }

    /// Waits until every task has finished, up to `timeout`
    ///
    /// Returns `false` on timeout. Always times out if the runner has not
    /// been shut down, since more tasks could still arrive.
    pub async fn await_termination(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_ok()
    }

    /// Waits without a deadline until the runner is shut down and idle
    pub async fn join(&self) {
        self.tracker.wait().await;
    }

    pub fn is_shutdown(&self) -> bool {
        !self.accepting.load(Ordering::Acquire)
    }

    pub fn is_terminated(&self) -> bool {
        self.tracker.is_closed() && self.tracker.is_empty()
    }

    pub fn stats(&self) -> RunnerStats {
        self.counters.snapshot()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // The map holds plain names; a panic while holding the guard cannot
    // leave it half-updated.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
