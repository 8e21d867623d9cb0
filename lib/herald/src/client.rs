//! Client types: named actions over shared defaults, middleware and callbacks.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tower::Layer;
use tower_service::Service;

use crate::builder::{Defaults, RequestSpec};
use crate::callback::{Callback, CallbackChain, CallbackFilter, CallbackOptions};
use crate::config::ConfigSource;
use crate::instrument::{Instrument, Instruments};
use crate::job::SubmissionJob;
use crate::middleware::{BoxedService, LogLevel, Pipeline};
use crate::queue::Queue;
use crate::submit::SubmittableRequest;
use crate::transport::HyperTransport;
use crate::{
    Args, Body, BoxError, Error, Headers, Method, NoTemplates, Request, Response, Result,
    TemplateId, Templates, Transport,
};

type ActionFn = dyn Fn(&Args) -> Result<RequestSpec> + Send + Sync;

/// A declared action: a name, a default method and a request spec factory.
#[derive(Clone)]
pub struct Action {
    name: String,
    method: Method,
    build: Arc<ActionFn>,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl Action {
    /// Action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }
}

/// A client type.
///
/// Immutable once built; share it as `Arc<ClientType>`. Use [`ClientType::derive`] to
/// declare a child type: everything is copied, so changes to the child never reach
/// the parent.
///
/// # Example
///
/// ```no_run
/// use herald::{Args, ClientType, Method, RequestSpec};
///
/// # async fn run() -> herald::Result<()> {
/// let articles = ClientType::builder("articles")
///     .default_url("https://api.example.com")?
///     .default_header("Accept", "application/json")
///     .action("show", Method::Get, |args| {
///         Ok(RequestSpec::new().path(format!("/articles/{}", args.get::<u64>(0)?)))
///     })
///     .build();
///
/// let response = articles.request("show", Args::new().arg(42))?.submit().await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientType {
    name: String,
    template_path: String,
    defaults: Defaults,
    pipeline: Pipeline,
    callbacks: CallbackChain,
    actions: BTreeMap<String, Action>,
    job: Arc<SubmissionJob>,
    transport: Arc<dyn Transport>,
    templates: Arc<dyn Templates>,
    queue: Option<Arc<dyn Queue>>,
    instruments: Instruments,
}

impl fmt::Debug for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientType")
            .field("name", &self.name)
            .field("template_path", &self.template_path)
            .field("defaults", &self.defaults)
            .field("pipeline", &self.pipeline)
            .field("callbacks", &self.callbacks.len())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("job", &self.job.name())
            .field("queue", &self.queue.is_some())
            .finish_non_exhaustive()
    }
}

impl ClientType {
    /// Start declaring a client type.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ClientTypeBuilder {
        ClientTypeBuilder::new(name.into())
    }

    /// Declare a child type inheriting a copy of everything declared here.
    ///
    /// The child's template path defaults to its own name.
    #[must_use]
    pub fn derive(&self, name: impl Into<String>) -> ClientTypeBuilder {
        ClientTypeBuilder {
            name: name.into(),
            template_path: None,
            defaults: self.defaults.clone(),
            pipeline: self.pipeline.clone(),
            callbacks: self.callbacks.clone(),
            actions: self.actions.clone(),
            job: Some(Arc::clone(&self.job)),
            transport: Some(Arc::clone(&self.transport)),
            templates: Arc::clone(&self.templates),
            queue: self.queue.clone(),
            instruments: self.instruments.clone(),
        }
    }

    /// Client type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path under which body templates are looked up.
    #[must_use]
    pub fn template_path(&self) -> &str {
        &self.template_path
    }

    /// Declared defaults.
    #[must_use]
    pub const fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Middleware declaration.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// After-submit callbacks.
    #[must_use]
    pub const fn callbacks(&self) -> &CallbackChain {
        &self.callbacks
    }

    /// Submission job used for queued submissions.
    #[must_use]
    pub fn job(&self) -> &Arc<SubmissionJob> {
        &self.job
    }

    /// Transport used by every submission.
    #[must_use]
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Queue used by `submit_later`, if any.
    #[must_use]
    pub fn queue(&self) -> Option<&Arc<dyn Queue>> {
        self.queue.as_ref()
    }

    /// Instrumentation sinks.
    #[must_use]
    pub const fn instruments(&self) -> &Instruments {
        &self.instruments
    }

    /// Declared action names, sorted.
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// A declared action.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// Invoke an action: build its request without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] for an undeclared action, and any error raised by
    /// the action itself, the template renderer or the request builder.
    pub fn request(self: &Arc<Self>, action: &str, args: Args) -> Result<SubmittableRequest> {
        let declared = self.actions.get(action).ok_or_else(|| Error::UnknownAction {
            client: self.name.clone(),
            action: action.to_string(),
        })?;

        let spec = (declared.build)(&args)?;
        let template = TemplateId::new(&self.template_path, action);
        let rendered = if self.templates.exists(&template) {
            let mut locals = spec.locals().clone();
            locals.extend(args.to_locals());
            Some(self.templates.render(&template, &Value::Object(locals))?)
        } else {
            None
        };

        let request = spec.build(declared.method, &self.defaults, rendered)?;
        tracing::trace!(client = %self.name, action, url = %request.url(), "built request");

        Ok(SubmittableRequest::new(
            Arc::clone(self),
            action.to_string(),
            args,
            request,
        ))
    }
}

/// Builder for [`ClientType`].
pub struct ClientTypeBuilder {
    name: String,
    template_path: Option<String>,
    defaults: Defaults,
    pipeline: Pipeline,
    callbacks: CallbackChain,
    actions: BTreeMap<String, Action>,
    job: Option<Arc<SubmissionJob>>,
    transport: Option<Arc<dyn Transport>>,
    templates: Arc<dyn Templates>,
    queue: Option<Arc<dyn Queue>>,
    instruments: Instruments,
}

impl fmt::Debug for ClientTypeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientTypeBuilder")
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("callbacks", &self.callbacks.len())
            .finish_non_exhaustive()
    }
}

impl ClientTypeBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            template_path: None,
            defaults: Defaults::default(),
            pipeline: Pipeline::default(),
            callbacks: CallbackChain::default(),
            actions: BTreeMap::new(),
            job: None,
            transport: None,
            templates: Arc::new(NoTemplates),
            queue: None,
            instruments: Instruments::default(),
        }
    }

    // ========================================================================
    // Defaults
    // ========================================================================

    /// Set the default base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] when the URL does not parse.
    pub fn default_url(mut self, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        url::Url::parse(&url)?;
        self.defaults.url = Some(url);
        Ok(self)
    }

    /// Set a default header.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.headers.insert(name, value);
        self
    }

    /// Merge default headers; the given values win.
    #[must_use]
    pub fn default_headers(mut self, headers: &Headers) -> Self {
        self.defaults.headers.merge(headers);
        self
    }

    /// Set any other default value.
    #[must_use]
    pub fn default_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.values.insert(key.into(), value.into());
        self
    }

    /// Merge externally configured defaults for this client name.
    ///
    /// `url` replaces the declared URL, `headers` are merged over the declared headers,
    /// everything else lands in the default values.
    ///
    /// # Errors
    ///
    /// Returns the source's error, or [`Error::InvalidUrl`] for a malformed URL.
    pub fn configure_from(mut self, source: &impl ConfigSource) -> Result<Self> {
        let configuration = source.load(&self.name)?;
        if let Some(url) = configuration.url {
            self = self.default_url(url)?;
        }
        self.defaults.headers.merge(&configuration.headers);
        self.defaults.values.extend(configuration.values);
        Ok(self)
    }

    /// Set the path under which body templates are looked up.
    #[must_use]
    pub fn template_path(mut self, path: impl Into<String>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    // ========================================================================
    // Actions and callbacks
    // ========================================================================

    /// Declare (or redeclare) an action.
    #[must_use]
    pub fn action<F>(mut self, name: impl Into<String>, method: Method, build: F) -> Self
    where
        F: Fn(&Args) -> Result<RequestSpec> + Send + Sync + 'static,
    {
        let name = name.into();
        self.actions.insert(
            name.clone(),
            Action {
                name,
                method,
                build: Arc::new(build),
            },
        );
        self
    }

    /// Append an after-submit callback running for every response.
    #[must_use]
    pub fn after_submit(mut self, callback: Callback) -> Self {
        self.callbacks.push(CallbackFilter::default(), callback);
        self
    }

    /// Append a filtered after-submit callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for conflicting options.
    pub fn after_submit_with(mut self, options: CallbackOptions, callback: Callback) -> Result<Self> {
        self.callbacks.push(options.resolve()?, callback);
        Ok(self)
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Add a Tower layer to the pipeline.
    ///
    /// Layers are applied in order: first added = outermost (processes requests first).
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.pipeline.layer(layer);
        self
    }

    /// Register a response body decoder.
    #[must_use]
    pub fn codec<F>(mut self, content_type: impl Into<String>, decoder: F) -> Self
    where
        F: Fn(&Bytes) -> std::result::Result<Body, BoxError> + Send + Sync + 'static,
    {
        self.pipeline.codec(content_type, decoder);
        self
    }

    /// Log request details (headers) at debug level.
    #[must_use]
    pub fn debug_logging(mut self) -> Self {
        self.pipeline.set_log_level(LogLevel::Debug);
        self
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    /// Use this submission job for queued submissions.
    #[must_use]
    pub fn job(mut self, job: SubmissionJob) -> Self {
        self.job = Some(Arc::new(job));
        self
    }

    /// Use this transport. Defaults to a [`HyperTransport`].
    #[must_use]
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Use this template renderer.
    #[must_use]
    pub fn templates(mut self, templates: impl Templates + 'static) -> Self {
        self.templates = Arc::new(templates);
        self
    }

    /// Use this queue for `submit_later`.
    #[must_use]
    pub fn queue(mut self, queue: Arc<dyn Queue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Add an instrumentation sink.
    #[must_use]
    pub fn instrument(mut self, sink: impl Instrument + 'static) -> Self {
        self.instruments.push(sink);
        self
    }

    /// Replace every instrumentation sink, the default log subscriber included.
    #[must_use]
    pub fn instruments(mut self, instruments: Instruments) -> Self {
        self.instruments = instruments;
        self
    }

    /// Finish the declaration.
    #[must_use]
    pub fn build(self) -> Arc<ClientType> {
        let template_path = self.template_path.unwrap_or_else(|| self.name.clone());
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HyperTransport::new()));

        Arc::new(ClientType {
            name: self.name,
            template_path,
            defaults: self.defaults,
            pipeline: self.pipeline,
            callbacks: self.callbacks,
            actions: self.actions,
            job: self.job.unwrap_or_default(),
            transport,
            templates: self.templates,
            queue: self.queue,
            instruments: self.instruments,
        })
    }
}
