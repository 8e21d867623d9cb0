//! Queue boundary for deferred submissions.
//!
//! Only an [`Invocation`] crosses the boundary: job, client type and action names plus the
//! original arguments. The worker side rebuilds the request by invoking the action again.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::registry::{JobOutcome, Registry};
use crate::{Args, Error, Result};

/// Scheduling options, passed through to the queue untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueOptions {
    /// Target queue name.
    pub queue: Option<String>,
    /// Delay before the job becomes runnable.
    pub wait: Option<Duration>,
    /// Queue-specific priority.
    pub priority: Option<i32>,
}

impl EnqueueOptions {
    /// No options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Target queue name.
    #[must_use]
    pub fn queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    /// Delay before the job becomes runnable.
    #[must_use]
    pub const fn wait(mut self, wait: Duration) -> Self {
        self.wait = Some(wait);
        self
    }

    /// Queue-specific priority.
    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// What a submission job needs to rebuild and submit a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Submission job name.
    pub job: String,
    /// Client type name.
    pub client: String,
    /// Action name.
    pub action: String,
    /// Original arguments.
    pub arguments: Args,
    /// 1 for the first execution, incremented on every retry.
    pub attempt: u32,
}

/// An invocation together with its scheduling options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnqueuedJob {
    /// The invocation.
    pub invocation: Invocation,
    /// Scheduling options.
    pub options: EnqueueOptions,
}

/// Queuing collaborator.
pub trait Queue: Send + Sync {
    /// Enqueue a job; fire-and-forget from the caller's point of view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Queue`] when the job cannot be accepted.
    fn enqueue(&self, job: EnqueuedJob) -> Result<()>;
}

/// In-process queue storing jobs as JSON, performed on demand with [`MemoryQueue::drain`].
///
/// Scheduling options are recorded but not honored: jobs run in FIFO order.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    jobs: Mutex<VecDeque<Vec<u8>>>,
}

impl MemoryQueue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Vec<u8>>> {
        self.jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Number of pending jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no job is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Pending jobs, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if a stored job does not deserialize.
    pub fn enqueued(&self) -> Result<Vec<EnqueuedJob>> {
        self.lock()
            .iter()
            .map(|bytes| serde_json::from_slice(bytes).map_err(Error::from))
            .collect()
    }

    fn pop(&self) -> Option<Vec<u8>> {
        self.lock().pop_front()
    }

    /// Perform pending jobs until the queue is empty, retries included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if a stored job does not deserialize.
    pub async fn drain(&self, registry: &Registry) -> Result<Vec<JobOutcome>> {
        let mut outcomes = Vec::new();
        while let Some(bytes) = self.pop() {
            let job: EnqueuedJob = serde_json::from_slice(&bytes)?;
            outcomes.push(registry.perform(job, self).await);
        }
        Ok(outcomes)
    }
}

impl Queue for MemoryQueue {
    fn enqueue(&self, job: EnqueuedJob) -> Result<()> {
        let bytes = serde_json::to_vec(&job)?;
        self.lock().push_back(bytes);
        Ok(())
    }
}
