//! Submission jobs: the worker side of `submit_later`.
//!
//! A job rebuilds the request from an [`Invocation`], submits it, then runs its hooks in
//! declaration order. Retry rules decide whether a failed perform is re-enqueued; a rule
//! with a status filter also turns matching responses into [`Error::StatusMismatch`].

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::callback::lift;
use crate::queue::Invocation;
use crate::registry::Registry;
use crate::{
    Body, BoxError, Error, ErrorKind, Response, Result, StatusFilter, StatusSpec,
};

/// Name of the job used when a client type declares none.
pub const DEFAULT_JOB: &str = "herald.submission_job";

/// Default number of attempts of a retry rule, the first execution included.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// What an after-perform hook sees.
#[derive(Debug)]
pub struct PerformContext<'a> {
    response: &'a Response<Body>,
    invocation: &'a Invocation,
}

impl PerformContext<'_> {
    /// The submitted response, callbacks applied.
    #[must_use]
    pub const fn response(&self) -> &Response<Body> {
        self.response
    }

    /// The invocation being performed.
    #[must_use]
    pub const fn invocation(&self) -> &Invocation {
        self.invocation
    }
}

type HookFn = dyn Fn(&PerformContext<'_>) -> std::result::Result<(), BoxError> + Send + Sync;

#[derive(Clone)]
enum JobHook {
    AfterPerform { filter: StatusFilter, hook: Arc<HookFn> },
    StatusCheck(StatusFilter),
}

impl JobHook {
    fn run(&self, context: &PerformContext<'_>) -> Result<()> {
        let status = context.response.status();
        match self {
            Self::AfterPerform { filter, hook } => {
                if filter.matches(status) {
                    hook(context).map_err(lift)?;
                }
                Ok(())
            }
            Self::StatusCheck(filter) if filter.matches(status) => {
                Err(Error::StatusMismatch { status })
            }
            Self::StatusCheck(_) => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
struct RetryRule {
    kinds: Vec<ErrorKind>,
    attempts: u32,
}

/// Status filter options of a job declaration.
#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    only_status: Option<StatusSpec>,
    except_status: Option<StatusSpec>,
}

impl StatusOptions {
    /// Every status.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only these statuses.
    #[must_use]
    pub fn only_status(mut self, spec: impl Into<StatusSpec>) -> Self {
        self.only_status = Some(spec.into());
        self
    }

    /// Every status but these.
    #[must_use]
    pub fn except_status(mut self, spec: impl Into<StatusSpec>) -> Self {
        self.except_status = Some(spec.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.only_status.is_none() && self.except_status.is_none()
    }

    fn resolve(self) -> Result<StatusFilter> {
        StatusFilter::from_options(self.only_status, self.except_status)
    }
}

/// A retry declaration.
///
/// ```
/// use herald::{ErrorKind, RetryOn, SubmissionJob};
///
/// let job = SubmissionJob::new("articles.sync")
///     .retry_on(RetryOn::new().kind(ErrorKind::Timeout).only_status(500..600).attempts(3))
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct RetryOn {
    kinds: Vec<ErrorKind>,
    status: StatusOptions,
    attempts: u32,
}

impl Default for RetryOn {
    fn default() -> Self {
        Self {
            kinds: Vec::new(),
            status: StatusOptions::default(),
            attempts: DEFAULT_ATTEMPTS,
        }
    }
}

impl RetryOn {
    /// Empty declaration; add error kinds or a status filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Retry on errors of this kind.
    #[must_use]
    pub fn kind(mut self, kind: ErrorKind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Retry when the response status is one of these.
    #[must_use]
    pub fn only_status(mut self, spec: impl Into<StatusSpec>) -> Self {
        self.status = self.status.only_status(spec);
        self
    }

    /// Retry when the response status is not one of these.
    #[must_use]
    pub fn except_status(mut self, spec: impl Into<StatusSpec>) -> Self {
        self.status = self.status.except_status(spec);
        self
    }

    /// Maximum number of executions, the first one included.
    #[must_use]
    pub const fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

/// A submission job declaration.
#[derive(Clone)]
pub struct SubmissionJob {
    name: String,
    hooks: Vec<JobHook>,
    retries: Vec<RetryRule>,
}

impl fmt::Debug for SubmissionJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionJob")
            .field("name", &self.name)
            .field("hooks", &self.hooks.len())
            .field("retries", &self.retries)
            .finish()
    }
}

impl Default for SubmissionJob {
    fn default() -> Self {
        Self::new(DEFAULT_JOB)
    }
}

impl SubmissionJob {
    /// A job without hooks or retries.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: Vec::new(),
            retries: Vec::new(),
        }
    }

    /// Job name, recorded in every invocation.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run a hook after each perform whose response status passes the filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when both status options are given.
    pub fn after_perform<F>(mut self, options: StatusOptions, hook: F) -> Result<Self>
    where
        F: Fn(&PerformContext<'_>) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hooks.push(JobHook::AfterPerform {
            filter: options.resolve()?,
            hook: Arc::new(hook),
        });
        Ok(self)
    }

    /// Declare retryable failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when neither error kinds nor a status filter are
    /// given, or when both status options are.
    pub fn retry_on(mut self, retry: RetryOn) -> Result<Self> {
        if retry.kinds.is_empty() && retry.status.is_empty() {
            return Err(Error::configuration(
                "retry_on needs error kinds or a status filter",
            ));
        }

        let mut kinds = retry.kinds;
        if !retry.status.is_empty() {
            self.hooks.push(JobHook::StatusCheck(retry.status.resolve()?));
            kinds.push(ErrorKind::StatusMismatch);
        }
        self.retries.push(RetryRule {
            kinds,
            attempts: retry.attempts,
        });
        Ok(self)
    }

    /// Whether a failure of this attempt should be re-enqueued.
    #[must_use]
    pub fn should_retry(&self, error: &Error, attempt: u32) -> bool {
        let kind = error.kind();
        self.retries
            .iter()
            .any(|rule| rule.kinds.contains(&kind) && attempt < rule.attempts)
    }

    /// Rebuild the request, submit it and run the hooks.
    ///
    /// # Errors
    ///
    /// Lookup, build and submission errors; [`Error::StatusMismatch`] from retry filters;
    /// the first failing hook's error.
    pub async fn perform(
        &self,
        registry: &Registry,
        invocation: &Invocation,
    ) -> Result<Response<Body>> {
        debug!(
            job = %self.name,
            client = %invocation.client,
            action = %invocation.action,
            attempt = invocation.attempt,
            "performing submission"
        );

        let client = registry.client(&invocation.client)?;
        let request = client.request(&invocation.action, invocation.arguments.clone())?;
        let response = request.submit().await?;

        let context = PerformContext {
            response: &response,
            invocation,
        };
        for hook in &self.hooks {
            hook.run(&context)?;
        }

        Ok(response)
    }
}
