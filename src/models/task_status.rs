use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a background task.
///
/// Progression is monotonic: `Waiting` → `Processing` → one of the terminal
/// states `Finished`, `Error` or `Canceled`. `Canceled` may be entered from
/// another thread while the task is `Waiting` or `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskStatus {
    Waiting = 0,
    Processing = 1,
    Finished = 2,
    Error = 3,
    Canceled = 4,
}

impl TaskStatus {
    /// Whether no further transition is possible from this state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Error | Self::Canceled)
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Waiting,
            1 => Self::Processing,
            2 => Self::Finished,
            3 => Self::Error,
            _ => Self::Canceled,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Waiting => "waiting",
            Self::Processing => "processing",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::Canceled => "canceled",
        };
        f.write_str(label)
    }
}

/// Task status shared between the worker thread and whoever polls or cancels it.
///
/// All transitions are compare-and-swap so a concurrent cancel can never be
/// overwritten by the worker, and a terminal state is never left.
#[derive(Debug)]
pub struct AtomicTaskStatus(AtomicU8);

impl AtomicTaskStatus {
    pub fn new(status: TaskStatus) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    pub fn load(&self) -> TaskStatus {
        TaskStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move from `from` to `to`; returns false if the current state was not `from`.
    pub fn transition(&self, from: TaskStatus, to: TaskStatus) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Enter `Canceled` unless already terminal. Returns true if this call canceled.
    pub fn cancel(&self) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if TaskStatus::from_u8(current).is_terminal() {
                    None
                } else {
                    Some(TaskStatus::Canceled as u8)
                }
            })
            .is_ok()
    }
}

impl Default for AtomicTaskStatus {
    fn default() -> Self {
        Self::new(TaskStatus::Waiting)
    }
}
