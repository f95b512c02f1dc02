//! Background task scheduling.
//!
//! Garbage collection runs on the host's background queue. The
//! [`TaskQueue`] trait is the seam to that queue; [`SerialTaskQueue`] is a
//! simple in-process implementation driven by the caller.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// A unit of queued work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Names the work a queued job performs, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Sweep the content store.
    GarbageCollectContent,
    /// Commit a content mutation.
    CommitContent,
    /// Commit a journal mutation.
    CommitJournal,
}

impl Task {
    /// Returns the task name as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GarbageCollectContent => "gc-content",
            Self::CommitContent => "commit-content",
            Self::CommitJournal => "commit-journal",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scheduling class of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// Runs before anything already queued.
    Immediate,
    /// Work a user is waiting on.
    UserFacing,
    /// Deferrable housekeeping. Counted by [`TaskQueue::background_task_count`].
    Background,
}

/// Queue the garbage collectors schedule work on.
pub trait TaskQueue: Send + Sync {
    /// Returns the number of queued background jobs that have not started.
    fn background_task_count(&self) -> usize;

    /// Returns `true` if background work is waiting.
    fn has_backlog(&self) -> bool {
        self.background_task_count() > 0
    }

    /// Queues `job`.
    fn execute(&self, task: Task, task_type: TaskType, job: Job);
}

struct QueuedTask {
    task: Task,
    task_type: TaskType,
    job: Job,
}

/// FIFO queue run explicitly by its owner.
///
/// `Immediate` jobs jump to the front. Jobs run outside the internal lock, so
/// a job may queue further work (which is how content GC defers itself).
#[derive(Default)]
pub struct SerialTaskQueue {
    pending: Mutex<VecDeque<QueuedTask>>,
}

impl SerialTaskQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<QueuedTask>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the number of queued jobs of any type.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending().len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending().is_empty()
    }

    /// Runs the next job, returning what it was.
    pub fn run_next(&self) -> Option<Task> {
        let next = self.pending().pop_front()?;
        trace!(task = next.task.as_str(), task_type = ?next.task_type, "Running task");
        (next.job)();
        Some(next.task)
    }

    /// Runs jobs until the queue is empty, including jobs queued along the way.
    ///
    /// Returns the number of jobs run.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next().is_some() {
            ran += 1;
        }
        debug!(tasks_run = ran, "Task queue drained");
        ran
    }
}

impl fmt::Debug for SerialTaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialTaskQueue")
            .field("pending", &self.len())
            .finish()
    }
}

impl TaskQueue for SerialTaskQueue {
    fn background_task_count(&self) -> usize {
        self.pending()
            .iter()
            .filter(|queued| queued.task_type == TaskType::Background)
            .count()
    }

    fn execute(&self, task: Task, task_type: TaskType, job: Job) {
        let queued = QueuedTask {
            task,
            task_type,
            job,
        };
        let mut pending = self.pending();
        if task_type == TaskType::Immediate {
            pending.push_front(queued);
        } else {
            pending.push_back(queued);
        }
    }
}
