//! Submittable requests.
//!
//! A [`SubmittableRequest`] is a fully built request plus everything needed to send it:
//! the client type (pipeline, callbacks, transport) and the action invocation that produced
//! it. It can be inspected, submitted right away, or handed to the client's queue.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tower::ServiceExt;
use tracing::debug;

use crate::callback::Callback;
use crate::client::ClientType;
use crate::instrument::Event;
use crate::queue::{EnqueueOptions, EnqueuedJob, Invocation};
use crate::{Args, Body, Error, Headers, Method, Request, Response, Result};

/// A built request, ready to be submitted or enqueued.
#[derive(Clone)]
pub struct SubmittableRequest {
    client: Arc<ClientType>,
    action: String,
    args: Args,
    request: Request,
    callback: Option<Callback>,
}

impl fmt::Debug for SubmittableRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmittableRequest")
            .field("client", &self.client.name())
            .field("action", &self.action)
            .field("args", &self.args)
            .field("request", &self.request)
            .field("callback", &self.callback)
            .finish()
    }
}

impl SubmittableRequest {
    pub(crate) fn new(client: Arc<ClientType>, action: String, args: Args, request: Request) -> Self {
        Self {
            client,
            action,
            args,
            request,
            callback: None,
        }
    }

    /// Attach a request-scoped callback, run after every client-level callback.
    ///
    /// Request-scoped callbacks are not carried over to queued submissions.
    #[must_use]
    pub fn with_callback(mut self, callback: Callback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// The client type.
    #[must_use]
    pub fn client(&self) -> &Arc<ClientType> {
        &self.client
    }

    /// The action name.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The invocation arguments.
    #[must_use]
    pub const fn arguments(&self) -> &Args {
        &self.args
    }

    /// The resolved request.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.request.method()
    }

    /// Absolute URL.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        self.request.url()
    }

    /// Resolved headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        self.request.headers()
    }

    /// Rendered body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        self.request.body()
    }

    /// Declared content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.request.content_type()
    }

    /// The record a submission job needs to rebuild this request.
    #[must_use]
    pub fn invocation(&self) -> Invocation {
        Invocation {
            job: self.client.job().name().to_string(),
            client: self.client.name().to_string(),
            action: self.action.clone(),
            arguments: self.args.clone(),
            attempt: 1,
        }
    }

    /// Send the request through a fresh pipeline and run the after-submit callbacks.
    ///
    /// # Errors
    ///
    /// Transport errors pass through unchanged; decode failures are [`Error::Parse`];
    /// callback failures abort the chain.
    pub async fn submit(&self) -> Result<Response<Body>> {
        let start = Instant::now();
        let result = self.run().await;

        self.client.instruments().emit(&Event::Submit {
            client: self.client.name(),
            action: &self.action,
            request: &self.request,
            duration: start.elapsed(),
        });

        result
    }

    async fn run(&self) -> Result<Response<Body>> {
        let service = self
            .client
            .pipeline()
            .build(self.client.transport(), self.client.instruments());
        let response = service.oneshot(self.request.clone()).await?;

        self.client
            .callbacks()
            .run(response, &self.action, &self.request, self.callback.as_ref())
    }

    /// Hand the invocation to the client's queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Queue`] when the client type has no queue, or the queue's error.
    pub fn submit_later(&self, options: EnqueueOptions) -> Result<()> {
        let queue = self.client.queue().ok_or_else(|| {
            Error::Queue(format!("no queue configured for {}", self.client.name()))
        })?;

        debug!(
            client = %self.client.name(),
            action = %self.action,
            queue = ?options.queue,
            "enqueueing submission"
        );
        queue.enqueue(EnqueuedJob {
            invocation: self.invocation(),
            options,
        })
    }
}
