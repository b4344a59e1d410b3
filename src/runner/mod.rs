//! Worker pool for indexing tasks
//!
//! Each indexing run owns one [`TaskRunner`]: a bounded number of tasks run
//! at once, the rest wait for a slot. A failing or panicking task is
//! logged and counted, never allowed to take the pool down.

mod pool;

pub use pool::{RunnerStats, TaskRunner};

use thiserror::Error;

/// Errors returned by the task runner
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Task runner '{0}' is shut down and no longer accepts tasks")]
    ShutDown(String),
}
