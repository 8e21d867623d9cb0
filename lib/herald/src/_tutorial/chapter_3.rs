//! # Chapter 3: Jobs & Middleware
//!
//! Deferring submissions and shaping the pipeline.
//!
//! ## Queued Submissions
//!
//! `submit_later` enqueues the invocation (client type, action, arguments), never the
//! request itself. The worker rebuilds the request by invoking the action again:
//!
//! ```ignore
//! let queue = Arc::new(MemoryQueue::new());
//! let articles = ClientType::builder("articles")
//!     .default_url("https://api.example.com")?
//!     .queue(queue.clone())
//!     .action("create", Method::Post, |_| Ok(RequestSpec::new().path("/articles")))
//!     .build();
//!
//! articles
//!     .request("create", Args::new().arg("Hello"))?
//!     .submit_later(EnqueueOptions::new().queue("low"))?;
//!
//! let mut registry = Registry::new();
//! registry.register(articles)?;
//! let outcomes = queue.drain(&registry).await?;
//! ```
//!
//! ## Job Hooks and Retries
//!
//! ```ignore
//! let job = SubmissionJob::new("articles.sync")
//!     .after_perform(StatusOptions::new().only_status(200..300), |ctx| {
//!         tracing::info!(status = ctx.response().status(), "synced");
//!         Ok(())
//!     })?
//!     .retry_on(RetryOn::new().kind(ErrorKind::Timeout).only_status(500..600))?;
//! ```
//!
//! A response whose status matches the retry filter raises a status mismatch error, which
//! is retried like the listed error kinds until the attempts run out.
//!
//! ## Tower Layers
//!
//! Every submission builds its own pipeline. Layers wrap the transport, first added is
//! outermost:
//!
//! ```ignore
//! use herald::middleware::ConcurrencyLimitLayer;
//!
//! let articles = ClientType::builder("articles")
//!     .layer(ConcurrencyLimitLayer::new(4))
//!     .debug_logging()
//!     .build();
//! ```
//!
//! ## Instrumentation
//!
//! Submissions, HTTP exchanges and body decoding are reported to instrumentation sinks.
//! The default sink logs each submission through `tracing`; enable the `metrics` feature
//! for `MetricsInstrument`.
