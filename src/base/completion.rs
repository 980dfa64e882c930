//! Single-fire completion callbacks.
//!
//! Mirrors Chromium's `CompletionOnceCallback`: the job owns the callback and
//! consumes it when it completes. A job that is dropped first drops the
//! callback with it, unrun. The request handle only sees the published
//! [`JobState`].

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// A callback that is run at most once with the outcome of an operation.
pub type CompletionOnceCallback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Where a job is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobState {
    /// Created, not yet picked up by its job sequence.
    Started,
    /// The engine has the call; waiting for its result.
    AwaitingRemote,
    /// The result was delivered (or the job was abandoned).
    Completed,
}

impl JobState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => JobState::Started,
            1 => JobState::AwaitingRemote,
            _ => JobState::Completed,
        }
    }
}

/// State shared read-only with a request handle.
#[derive(Debug, Clone)]
pub(crate) struct JobStatus(Arc<AtomicU8>);

impl JobStatus {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(JobState::Started as u8)))
    }

    pub(crate) fn get(&self) -> JobState {
        JobState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: JobState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// The owned callback of one job.
pub(crate) struct CompletionSlot<T> {
    callback: Option<CompletionOnceCallback<T>>,
    status: JobStatus,
}

impl<T> CompletionSlot<T> {
    pub(crate) fn new(callback: CompletionOnceCallback<T>) -> Self {
        Self {
            callback: Some(callback),
            status: JobStatus::new(),
        }
    }

    /// Handle for reading this job's state from elsewhere.
    pub(crate) fn status(&self) -> JobStatus {
        self.status.clone()
    }

    pub(crate) fn state(&self) -> JobState {
        self.status.get()
    }

    /// Marks the remote call as issued. Ignored once completed.
    pub(crate) fn awaiting_remote(&mut self) {
        if self.state() == JobState::Started {
            self.status.set(JobState::AwaitingRemote);
        }
    }

    /// Runs the callback with `result` unless the job already completed.
    ///
    /// The state flips to [`JobState::Completed`] before the callback runs.
    pub(crate) fn run(&mut self, result: T) -> bool {
        if self.state() == JobState::Completed {
            return false;
        }
        self.status.set(JobState::Completed);
        match self.callback.take() {
            Some(callback) => {
                callback(result);
                true
            }
            None => false,
        }
    }
}

impl<T> Drop for CompletionSlot<T> {
    fn drop(&mut self) {
        self.status.set(JobState::Completed);
    }
}

impl<T> fmt::Debug for CompletionSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSlot")
            .field("state", &self.state())
            .finish()
    }
}
