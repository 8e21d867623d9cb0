//! After-submit callbacks.
//!
//! Callbacks run in declaration order once the pipeline has produced a decoded response,
//! each one seeing the response left by the previous one. A callback runs when its status
//! filter matches the current status and its action filter admits the current action.
//!
//! Three call shapes are supported:
//!
//! - [`Callback::ambient`] gets read/write access to the response through a
//!   [`CallbackContext`];
//! - [`Callback::body`] receives the body and must return the new body;
//! - [`Callback::triplet`] receives `(status, headers, body)` and must return all three.
//!
//! A callback breaking its return contract aborts the chain with [`Error::AfterSubmit`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::{Body, BoxError, Error, Headers, Request, Response, Result, StatusFilter, StatusSpec};

/// Read/write view of a response handed to ambient callbacks.
#[derive(Debug)]
pub struct CallbackContext<'a> {
    action: &'a str,
    request: &'a Request,
    response: &'a mut Response<Body>,
}

impl CallbackContext<'_> {
    /// Name of the action being submitted.
    #[must_use]
    pub const fn action(&self) -> &str {
        self.action
    }

    /// The submitted request.
    #[must_use]
    pub const fn request(&self) -> &Request {
        self.request
    }

    /// The current response.
    #[must_use]
    pub fn response(&self) -> &Response<Body> {
        self.response
    }

    /// Mutable access to the current response.
    pub fn response_mut(&mut self) -> &mut Response<Body> {
        self.response
    }
}

type AmbientFn = dyn Fn(&mut CallbackContext<'_>) -> std::result::Result<(), BoxError> + Send + Sync;
type BodyFn = dyn Fn(Body) -> std::result::Result<Option<Body>, BoxError> + Send + Sync;
type TripletFn = dyn Fn(u16, Headers, Body) -> std::result::Result<Option<(u16, Headers, Body)>, BoxError>
    + Send
    + Sync;

/// An after-submit callback.
#[derive(Clone)]
pub enum Callback {
    /// Reads and writes the response through a context.
    Ambient(Arc<AmbientFn>),
    /// Maps the body; `None` breaks the contract.
    Body(Arc<BodyFn>),
    /// Maps the full triplet; `None` breaks the contract.
    Triplet(Arc<TripletFn>),
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            Self::Ambient(_) => "Ambient",
            Self::Body(_) => "Body",
            Self::Triplet(_) => "Triplet",
        };
        f.debug_tuple("Callback").field(&shape).finish()
    }
}

impl Callback {
    /// A callback working on the response through a [`CallbackContext`].
    pub fn ambient<F>(f: F) -> Self
    where
        F: Fn(&mut CallbackContext<'_>) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        Self::Ambient(Arc::new(f))
    }

    /// A callback replacing the body.
    pub fn body<F>(f: F) -> Self
    where
        F: Fn(Body) -> std::result::Result<Option<Body>, BoxError> + Send + Sync + 'static,
    {
        Self::Body(Arc::new(f))
    }

    /// A callback replacing status, headers and body.
    pub fn triplet<F>(f: F) -> Self
    where
        F: Fn(u16, Headers, Body) -> std::result::Result<Option<(u16, Headers, Body)>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self::Triplet(Arc::new(f))
    }

    fn call(&self, action: &str, request: &Request, response: &mut Response<Body>) -> Result<()> {
        match self {
            Self::Ambient(f) => {
                let mut context = CallbackContext {
                    action,
                    request,
                    response,
                };
                f(&mut context).map_err(lift)
            }
            Self::Body(f) => {
                let body = std::mem::take(response.body_mut());
                let body = f(body).map_err(lift)?.ok_or_else(|| {
                    Error::after_submit("single-argument callback must return a value")
                })?;
                response.set_body(body);
                Ok(())
            }
            Self::Triplet(f) => {
                let status = response.status();
                let headers = std::mem::take(response.headers_mut());
                let body = std::mem::take(response.body_mut());
                let (status, headers, body) = f(status, headers, body).map_err(lift)?.ok_or_else(
                    || Error::after_submit("triplet callback must return exactly three values"),
                )?;
                *response = Response::new(status, headers, body);
                Ok(())
            }
        }
    }
}

/// Turn an error raised by user code into an [`Error`], unwrapping herald errors.
pub(crate) fn lift(err: BoxError) -> Error {
    match err.downcast::<Error>() {
        Ok(err) => *err,
        Err(other) => Error::Callback(other),
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Filters of one callback declaration.
///
/// `only_status`/`except_status` and `only`/`except` are each mutually exclusive.
#[derive(Debug, Clone, Default)]
pub struct CallbackOptions {
    only_status: Option<StatusSpec>,
    except_status: Option<StatusSpec>,
    only: Option<Vec<String>>,
    except: Option<Vec<String>>,
}

impl CallbackOptions {
    /// No filter: run for every status and action.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run only for these statuses.
    #[must_use]
    pub fn only_status(mut self, spec: impl Into<StatusSpec>) -> Self {
        self.only_status = Some(spec.into());
        self
    }

    /// Run for every status but these.
    #[must_use]
    pub fn except_status(mut self, spec: impl Into<StatusSpec>) -> Self {
        self.except_status = Some(spec.into());
        self
    }

    /// Run only for these actions.
    #[must_use]
    pub fn only<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    /// Run for every action but these.
    #[must_use]
    pub fn except<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.except = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    /// Resolve the options into a filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when both forms of a filter are given, or
    /// [`Error::UnknownStatus`] for an unknown status name.
    pub fn resolve(self) -> Result<CallbackFilter> {
        let status = StatusFilter::from_options(self.only_status, self.except_status)?;
        let actions = match (self.only, self.except) {
            (Some(_), Some(_)) => {
                return Err(Error::configuration(
                    "pass either only or except action names, not both",
                ));
            }
            (Some(only), None) => ActionFilter::Only(only.into_iter().collect()),
            (None, Some(except)) => ActionFilter::Except(except.into_iter().collect()),
            (None, None) => ActionFilter::Any,
        };
        Ok(CallbackFilter { status, actions })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ActionFilter {
    Any,
    Only(BTreeSet<String>),
    Except(BTreeSet<String>),
}

impl ActionFilter {
    fn admits(&self, action: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(names) => names.contains(action),
            Self::Except(names) => !names.contains(action),
        }
    }
}

/// Resolved status and action predicate of a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackFilter {
    status: StatusFilter,
    actions: ActionFilter,
}

impl Default for CallbackFilter {
    fn default() -> Self {
        Self {
            status: StatusFilter::any(),
            actions: ActionFilter::Any,
        }
    }
}

impl CallbackFilter {
    /// Whether a callback with this filter runs.
    #[must_use]
    pub fn applies(&self, status: u16, action: &str) -> bool {
        self.status.matches(status) && self.actions.admits(action)
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Ordered after-submit callbacks of a client type.
#[derive(Debug, Clone, Default)]
pub struct CallbackChain {
    entries: Vec<(CallbackFilter, Callback)>,
}

impl CallbackChain {
    /// Append a callback.
    pub fn push(&mut self, filter: CallbackFilter, callback: Callback) {
        self.entries.push((filter, callback));
    }

    /// Number of callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run the chain, then the request-scoped callback if any.
    ///
    /// # Errors
    ///
    /// The first callback error aborts the chain.
    pub fn run(
        &self,
        mut response: Response<Body>,
        action: &str,
        request: &Request,
        request_scoped: Option<&Callback>,
    ) -> Result<Response<Body>> {
        for (filter, callback) in &self.entries {
            if filter.applies(response.status(), action) {
                callback.call(action, request, &mut response)?;
            }
        }

        if let Some(callback) = request_scoped {
            callback.call(action, request, &mut response)?;
        }

        Ok(response)
    }
}
