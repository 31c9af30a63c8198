//! Background tasks and the interface a task runner polls.
//!
//! A [`Task`] runs once on a worker thread. While it runs, any other thread may
//! read its status and progress or cancel it; cancellation is cooperative and
//! only observed between units of work.
//!
//! - [`BasePeakRetrievalTask`]: fills a [`BasePeakDataSet`](crate::dataset::BasePeakDataSet)
//!   with one base peak point per scan
//! - [`RedrawThrottle`]: decides which appends notify the chart
//! - [`TaskRunner`]: runs a task on tokio's blocking pool and reports its progress

pub mod basepeak;
pub mod runner;
pub mod throttle;

pub use basepeak::BasePeakRetrievalTask;
pub use runner::{RunnerError, TaskHandle, TaskRunner};
pub use throttle::RedrawThrottle;

use crate::models::{AtomicTaskStatus, TaskStatus};
use std::sync::Arc;

/// Status-polling interface between a background task and its runner
pub trait Task: Send + Sync {
    /// What the task produces once finished
    type Output;

    /// Human-readable description for progress displays
    fn description(&self) -> String;

    /// Fraction of work done, between 0.0 and 1.0
    fn finished_fraction(&self) -> f32;

    fn status(&self) -> TaskStatus;

    /// Failure detail; only `Some` when the status is [`TaskStatus::Error`]
    fn error_message(&self) -> Option<String>;

    fn result(&self) -> Option<Self::Output>;

    /// Request cancellation. Has no effect once the task reached a terminal state.
    fn cancel(&self);

    /// Execute the task on the calling thread. Only the first call does any work.
    fn run(&self);
}

/// Cloneable handle that cancels a task without holding the task itself
#[derive(Debug, Clone)]
pub struct CancelHandle {
    status: Arc<AtomicTaskStatus>,
}

impl CancelHandle {
    pub(crate) fn new(status: Arc<AtomicTaskStatus>) -> Self {
        Self { status }
    }

    /// Returns true if this call moved the task to `Canceled`
    pub fn cancel(&self) -> bool {
        self.status.cancel()
    }

    pub fn is_canceled(&self) -> bool {
        self.status.load() == TaskStatus::Canceled
    }
}
