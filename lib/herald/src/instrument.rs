//! Instrumentation events and sinks.
//!
//! Three events are published while a request goes through its lifecycle:
//!
//! | Event | Published by | Payload |
//! |-------|--------------|---------|
//! | [`Event::Submit`] | `SubmittableRequest::submit` | client, action, request, duration |
//! | [`Event::HttpRequest`] | the pipeline's instrumentation tap | method, url, status, duration |
//! | [`Event::Parse`] | the decode stage | content type, body, duration |
//!
//! Sinks are fire-and-forget: a sink that fails (or panics) is logged and skipped, the
//! submission continues as if nothing happened.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::{BoxError, Method, Request};

/// An instrumentation event.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// A submission finished (successfully or not).
    Submit {
        /// Client type name.
        client: &'a str,
        /// Action name.
        action: &'a str,
        /// The submitted request.
        request: &'a Request,
        /// Time spent in `submit`, callbacks included.
        duration: Duration,
    },
    /// The transport returned (or failed).
    HttpRequest {
        /// Request method.
        method: Method,
        /// Request URL.
        url: &'a url::Url,
        /// Response status, `None` when the transport failed.
        status: Option<u16>,
        /// Time spent below the tap.
        duration: Duration,
    },
    /// A response body went through a decoder.
    Parse {
        /// Content type used to pick the decoder.
        content_type: &'a str,
        /// Raw body.
        body: &'a Bytes,
        /// Time spent decoding.
        duration: Duration,
    },
}

impl Event<'_> {
    /// Event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::HttpRequest { .. } => "http_request",
            Self::Parse { .. } => "parse",
        }
    }
}

/// An instrumentation sink.
pub trait Instrument: Send + Sync {
    /// Record an event.
    ///
    /// # Errors
    ///
    /// Errors are logged by the caller and otherwise ignored.
    fn record(&self, event: &Event<'_>) -> Result<(), BoxError>;
}

/// The sinks of one client type.
#[derive(Clone)]
pub struct Instruments {
    sinks: Vec<Arc<dyn Instrument>>,
}

impl fmt::Debug for Instruments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instruments")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Default for Instruments {
    /// Only a [`LogSubscriber`].
    fn default() -> Self {
        Self {
            sinks: vec![Arc::new(LogSubscriber)],
        }
    }
}

impl Instruments {
    /// No sinks at all.
    #[must_use]
    pub fn none() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a sink.
    pub fn push(&mut self, sink: impl Instrument + 'static) {
        self.sinks.push(Arc::new(sink));
    }

    /// Number of sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether there is no sink.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Publish an event to every sink.
    pub fn emit(&self, event: &Event<'_>) {
        for sink in &self.sinks {
            match catch_unwind(AssertUnwindSafe(|| sink.record(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(event = event.name(), error = %err, "instrumentation sink failed");
                }
                Err(_) => {
                    warn!(event = event.name(), "instrumentation sink panicked");
                }
            }
        }
    }
}

/// Logs events through `tracing`.
///
/// Submissions are logged at info as `Client#action - GET url (Duration 1.23ms)`,
/// HTTP and parse events at debug.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSubscriber;

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

impl Instrument for LogSubscriber {
    fn record(&self, event: &Event<'_>) -> Result<(), BoxError> {
        match event {
            Event::Submit {
                client,
                action,
                request,
                duration,
            } => {
                info!(
                    "{client}#{action} - {} {} (Duration {:.2}ms)",
                    request.method(),
                    request.url(),
                    millis(*duration)
                );
            }
            Event::HttpRequest {
                method,
                url,
                status,
                duration,
            } => {
                debug!(%method, %url, ?status, "HTTP {method} {url} (Duration {:.2}ms)", millis(*duration));
            }
            Event::Parse {
                content_type,
                body,
                duration,
            } => {
                debug!(
                    content_type,
                    bytes = body.len(),
                    "parsed {content_type} body (Duration {:.2}ms)",
                    millis(*duration)
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder(Arc<Mutex<Vec<&'static str>>>);

    impl Instrument for Recorder {
        fn record(&self, event: &Event<'_>) -> Result<(), BoxError> {
            self.0
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(event.name());
            Ok(())
        }
    }

    struct Failing;

    impl Instrument for Failing {
        fn record(&self, _event: &Event<'_>) -> Result<(), BoxError> {
            Err("sink is down".into())
        }
    }

    struct Panicking;

    impl Instrument for Panicking {
        fn record(&self, _event: &Event<'_>) -> Result<(), BoxError> {
            panic!("sink exploded")
        }
    }

    fn parse_event(body: &Bytes) -> Event<'_> {
        Event::Parse {
            content_type: "application/json",
            body,
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn failing_sinks_do_not_stop_others() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut instruments = Instruments::none();
        instruments.push(Failing);
        instruments.push(Panicking);
        instruments.push(Recorder(Arc::clone(&seen)));

        let body = Bytes::from("{}");
        instruments.emit(&parse_event(&body));

        assert_eq!(*seen.lock().expect("lock"), vec!["parse"]);
    }

    #[test]
    fn default_has_log_subscriber() {
        let instruments = Instruments::default();
        assert_eq!(instruments.len(), 1);

        let body = Bytes::from("{}");
        instruments.emit(&parse_event(&body));
    }

    #[test]
    fn event_names() {
        let url = url::Url::parse("https://example.com").expect("url");
        let event = Event::HttpRequest {
            method: Method::Get,
            url: &url,
            status: Some(200),
            duration: Duration::ZERO,
        };
        assert_eq!(event.name(), "http_request");
    }
}
