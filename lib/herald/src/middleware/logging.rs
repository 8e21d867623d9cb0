//! Instrumentation tap.
//!
//! Logs requests and responses using the `tracing` crate and publishes the
//! `http_request` event. Never alters the request or the response.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::{Instrument as _, Level, debug, info, span, warn};

use crate::instrument::{Event, Instruments};
use crate::{Error, Request, Response, Result};

/// Log level for the instrumentation tap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level (request/response details).
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

/// Layer that adds the instrumentation tap.
#[derive(Debug, Clone, Default)]
pub struct InstrumentLayer {
    level: LogLevel,
    instruments: Instruments,
}

impl InstrumentLayer {
    /// Create a tap publishing to the given sinks.
    #[must_use]
    pub fn new(instruments: Instruments) -> Self {
        Self {
            level: LogLevel::Info,
            instruments,
        }
    }

    /// Set the log level.
    #[must_use]
    pub const fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}

impl<S> Layer<S> for InstrumentLayer {
    type Service = InstrumentTap<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentTap {
            inner,
            level: self.level,
            instruments: self.instruments.clone(),
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct InstrumentTap<S> {
    inner: S,
    level: LogLevel,
    instruments: Instruments,
}

impl<S> Service<Request> for InstrumentTap<S>
where
    S: Service<Request, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let method = request.method();
        let url = request.url().clone();
        let level = self.level;
        let instruments = self.instruments.clone();

        let span = span!(Level::INFO, "http_request", %method, %url);

        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();

                match level {
                    LogLevel::Debug => {
                        debug!(
                            method = %method,
                            url = %url,
                            headers = ?request.headers(),
                            "sending request"
                        );
                    }
                    LogLevel::Info => {
                        info!(method = %method, url = %url, "sending request");
                    }
                }

                let result = inner.call(request).await;
                let elapsed = start.elapsed();

                // Saturating conversion to u64 (truncates after ~584 million years)
                let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) => {
                        let status = response.status();
                        if response.is_success() {
                            info!(status, elapsed_ms, "request completed");
                        } else {
                            warn!(status, elapsed_ms, "request completed with HTTP error");
                        }
                        if level == LogLevel::Debug {
                            debug!(headers = ?response.headers(), "response headers");
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, elapsed_ms, "request failed");
                    }
                }

                instruments.emit(&Event::HttpRequest {
                    method,
                    url: &url,
                    status: result.as_ref().ok().map(Response::status),
                    duration: elapsed,
                });

                result
            }
            .instrument(span),
        )
    }
}
