//! Declarative HTTP actions for Rust.
//!
//! A [`ClientType`] declares named actions over shared defaults. Invoking an action builds
//! an inspectable [`SubmittableRequest`] that can be submitted right away through a Tower
//! middleware pipeline, or enqueued and performed later by a [`SubmissionJob`].
//!
//! # Example
//!
//! ```no_run
//! use herald::prelude::*;
//!
//! # async fn run() -> herald::Result<()> {
//! let articles = ClientType::builder("articles")
//!     .default_url("https://api.example.com")?
//!     .default_header("Accept", "application/json")
//!     .action("index", Method::Get, |args| {
//!         Ok(RequestSpec::new().path("/articles").query("page", args.get::<u32>(0)?))
//!     })
//!     .after_submit(Callback::ambient(|ctx| {
//!         tracing::info!(status = ctx.response().status(), "articles listed");
//!         Ok(())
//!     }))
//!     .build();
//!
//! let response = articles.request("index", Args::new().arg(1))?.submit().await?;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod _tutorial;
mod builder;
mod callback;
mod client;
mod config;
mod connector;
mod instrument;
mod job;
pub mod middleware;
pub mod prelude;
mod queue;
mod registry;
mod submit;
mod transport;

/// Boxed future returned by the pipeline's services.
pub type ServiceFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

pub use builder::{Defaults, RequestSpec};
pub use callback::{Callback, CallbackChain, CallbackContext, CallbackFilter, CallbackOptions};
pub use client::{Action, ClientType, ClientTypeBuilder};
pub use config::{
    ClientConfiguration, ConfigSource, TransportConfig, TransportConfigBuilder, YamlConfig,
};
pub use connector::https_connector;
pub use instrument::{Event, Instrument, Instruments, LogSubscriber};
pub use job::{
    DEFAULT_ATTEMPTS, DEFAULT_JOB, PerformContext, RetryOn, StatusOptions, SubmissionJob,
};
pub use queue::{EnqueueOptions, EnqueuedJob, Invocation, MemoryQueue, Queue};
pub use registry::{JobOutcome, Registry};
pub use submit::SubmittableRequest;
pub use transport::{HyperTransport, HyperTransportBuilder};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use herald_core::{
    Args, Body, BoxError, CodecRegistry, Decoder, Error, ErrorKind, Headers, MemoryTemplates,
    Method, NoTemplates, ParseError, Rendered, Request, RequestBuilder, Response, Result,
    Status, StatusCode, StatusFilter, StatusSpec, TemplateId, Templates, Transport,
    TransportFuture, XmlElement, XmlNode, normalize_content_type, status_code,
};

pub use url;
