//! Name lookup for client types and submission jobs on the worker side.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::client::ClientType;
use crate::job::SubmissionJob;
use crate::queue::{EnqueuedJob, Invocation, Queue};
use crate::{Body, Error, Response, Result};

/// Result of performing one enqueued job.
#[derive(Debug)]
pub enum JobOutcome {
    /// The submission succeeded and every hook passed.
    Succeeded(Response<Body>),
    /// The job failed with a retryable error and was re-enqueued.
    Retrying(Error),
    /// The job failed for good.
    Failed(Error),
}

impl JobOutcome {
    /// Whether the job succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// Registered client types. Each client carries its own submission job.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    clients: HashMap<String, Arc<ClientType>>,
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client type.
    ///
    /// Registering the same client twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when another client type already uses this name.
    pub fn register(&mut self, client: Arc<ClientType>) -> Result<&mut Self> {
        if let Some(existing) = self.clients.get(client.name()) {
            if !Arc::ptr_eq(existing, &client) {
                return Err(Error::configuration(format!(
                    "client type {:?} is already registered",
                    client.name()
                )));
            }
        }
        self.clients.insert(client.name().to_string(), client);
        Ok(self)
    }

    /// Look up a client type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownClient`] when nothing is registered under this name.
    pub fn client(&self, name: &str) -> Result<&Arc<ClientType>> {
        self.clients
            .get(name)
            .ok_or_else(|| Error::UnknownClient(name.to_string()))
    }

    /// The submission job of the client named in an invocation.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownClient`] when the client is not registered
    /// - [`Error::UnknownJob`] when the client's job is not the one the invocation was
    ///   enqueued for
    pub fn job_for(&self, invocation: &Invocation) -> Result<&Arc<SubmissionJob>> {
        let job = self.client(&invocation.client)?.job();
        if job.name() == invocation.job {
            Ok(job)
        } else {
            Err(Error::UnknownJob(invocation.job.clone()))
        }
    }

    /// Perform an enqueued job, re-enqueueing it on `queue` when its job allows a retry.
    pub async fn perform(&self, enqueued: EnqueuedJob, queue: &dyn Queue) -> JobOutcome {
        let EnqueuedJob {
            mut invocation,
            options,
        } = enqueued;

        let job = match self.job_for(&invocation) {
            Ok(job) => Arc::clone(job),
            Err(err) => return JobOutcome::Failed(err),
        };

        match job.perform(self, &invocation).await {
            Ok(response) => JobOutcome::Succeeded(response),
            Err(err) if job.should_retry(&err, invocation.attempt) => {
                warn!(
                    job = %job.name(),
                    client = %invocation.client,
                    action = %invocation.action,
                    attempt = invocation.attempt,
                    error = %err,
                    "retrying submission"
                );
                invocation.attempt += 1;
                match queue.enqueue(EnqueuedJob {
                    invocation,
                    options,
                }) {
                    Ok(()) => JobOutcome::Retrying(err),
                    Err(enqueue_err) => JobOutcome::Failed(enqueue_err),
                }
            }
            Err(err) => {
                info!(
                    job = %job.name(),
                    client = %invocation.client,
                    action = %invocation.action,
                    error = %err,
                    "submission failed"
                );
                JobOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{EnqueueOptions, MemoryQueue};
    use crate::{Args, Method, RequestSpec};

    fn articles(job: SubmissionJob) -> Arc<ClientType> {
        ClientType::builder("articles")
            .job(job)
            .action("index", Method::Get, |_| Ok(RequestSpec::new()))
            .build()
    }

    fn invocation(client: &str, job: &str) -> Invocation {
        Invocation {
            job: job.to_string(),
            client: client.to_string(),
            action: "index".to_string(),
            arguments: Args::new(),
            attempt: 1,
        }
    }

    #[test]
    fn lookups() {
        let mut registry = Registry::new();
        registry
            .register(articles(SubmissionJob::new("articles.job")))
            .expect("register");

        assert!(registry.client("articles").is_ok());
        assert!(matches!(registry.client("users"), Err(Error::UnknownClient(_))));

        let job = registry
            .job_for(&invocation("articles", "articles.job"))
            .expect("job");
        assert_eq!(job.name(), "articles.job");
        assert!(matches!(
            registry.job_for(&invocation("articles", crate::job::DEFAULT_JOB)),
            Err(Error::UnknownJob(_))
        ));
        assert!(matches!(
            registry.job_for(&invocation("users", "articles.job")),
            Err(Error::UnknownClient(_))
        ));
    }

    #[test]
    fn client_names_are_unique() {
        let mut registry = Registry::new();
        let first = articles(SubmissionJob::default());
        registry.register(Arc::clone(&first)).expect("register");
        registry.register(first).expect("same client again");

        let err = registry
            .register(articles(SubmissionJob::default()))
            .expect_err("duplicate name");
        assert_eq!(
            err.to_string(),
            r#"configuration error: client type "articles" is already registered"#
        );
    }

    #[tokio::test]
    async fn unknown_client_fails_without_retry() {
        let registry = Registry::new();
        let queue = MemoryQueue::new();
        let enqueued = EnqueuedJob {
            invocation: invocation("ghost", crate::job::DEFAULT_JOB),
            options: EnqueueOptions::new(),
        };

        let outcome = registry.perform(enqueued, &queue).await;
        assert!(matches!(outcome, JobOutcome::Failed(Error::UnknownClient(_))));
        assert!(queue.is_empty());
    }
}
