// TaskRunner - runs a blocking Task on the tokio runtime
//
// Tasks are synchronous and may block on disk I/O, so they go to tokio's
// blocking pool. The async side only polls status and progress, the way the
// application's progress display does.

use crate::models::TaskStatus;
use crate::task::Task;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Task worker panicked or was aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Spawns tasks onto the blocking pool of a tokio runtime
#[derive(Debug, Clone)]
pub struct TaskRunner {
    tokio_handle: tokio::runtime::Handle,
}

impl TaskRunner {
    pub fn new(tokio_handle: tokio::runtime::Handle) -> Self {
        Self { tokio_handle }
    }

    /// Start `task` on a worker thread and return a handle to observe it
    pub fn submit<T>(&self, task: Arc<T>) -> TaskHandle<T>
    where
        T: Task + 'static,
    {
        tracing::info!("Submitting task: {}", task.description());

        let worker = Arc::clone(&task);
        let join = self.tokio_handle.spawn_blocking(move || {
            worker.run();
            worker.status()
        });

        TaskHandle { task, join }
    }
}

/// A submitted task and the worker running it
pub struct TaskHandle<T: Task> {
    task: Arc<T>,
    join: JoinHandle<TaskStatus>,
}

impl<T: Task> TaskHandle<T> {
    pub fn task(&self) -> &Arc<T> {
        &self.task
    }

    pub fn cancel(&self) {
        self.task.cancel();
    }

    /// Whether the worker thread has returned
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the worker and return the task's terminal status
    pub async fn join(self) -> Result<TaskStatus, RunnerError> {
        Ok(self.join.await?)
    }

    /// Wait for the worker, reporting `(progress, status)` every `interval`.
    ///
    /// The callback sees a final report after the worker returns.
    pub async fn wait_with_progress<F>(
        self,
        interval: Duration,
        mut on_progress: F,
    ) -> Result<TaskStatus, RunnerError>
    where
        F: FnMut(f32, TaskStatus),
    {
        let Self { task, mut join } = self;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let status = loop {
            tokio::select! {
                result = &mut join => break result?,
                _ = ticker.tick() => on_progress(task.finished_fraction(), task.status()),
            }
        };

        on_progress(task.finished_fraction(), status);
        Ok(status)
    }
}
