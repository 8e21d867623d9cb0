//! Metrics sink using the metrics crate facade.
//!
//! Records instrumentation events with the `metrics` crate, which allows integration
//! with various metrics backends (Prometheus, `StatsD`, etc.).

use crate::BoxError;
use crate::instrument::{Event, Instrument};

/// Labels used for metrics.
const LABEL_CLIENT: &str = "client";
const LABEL_ACTION: &str = "action";
const LABEL_METHOD: &str = "method";
const LABEL_STATUS: &str = "status";
const LABEL_CONTENT_TYPE: &str = "content_type";

/// Metric names.
const METRIC_SUBMISSIONS_TOTAL: &str = "herald_submissions_total";
const METRIC_SUBMIT_DURATION: &str = "herald_submit_duration_seconds";
const METRIC_REQUESTS_TOTAL: &str = "herald_http_requests_total";
const METRIC_REQUEST_DURATION: &str = "herald_http_request_duration_seconds";
const METRIC_PARSE_DURATION: &str = "herald_parse_duration_seconds";

/// Sink that records instrumentation events as metrics.
///
/// Records the following metrics:
/// - `herald_submissions_total` (counter): submissions, labeled by client and action
/// - `herald_submit_duration_seconds` (histogram): submission duration, same labels
/// - `herald_http_requests_total` (counter): transport calls, labeled by method and status
/// - `herald_http_request_duration_seconds` (histogram): transport duration by method
/// - `herald_parse_duration_seconds` (histogram): decode duration by content type
///
/// # Example
///
/// ```ignore
/// use herald::{ClientType, middleware::MetricsInstrument};
///
/// let client = ClientType::builder("articles")
///     .instrument(MetricsInstrument::new())
///     .build();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsInstrument {
    _private: (),
}

impl MetricsInstrument {
    /// Create a new metrics sink.
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Instrument for MetricsInstrument {
    fn record(&self, event: &Event<'_>) -> Result<(), BoxError> {
        match *event {
            Event::Submit {
                client,
                action,
                duration,
                ..
            } => {
                metrics::counter!(
                    METRIC_SUBMISSIONS_TOTAL,
                    LABEL_CLIENT => client.to_string(),
                    LABEL_ACTION => action.to_string()
                )
                .increment(1);
                metrics::histogram!(
                    METRIC_SUBMIT_DURATION,
                    LABEL_CLIENT => client.to_string(),
                    LABEL_ACTION => action.to_string()
                )
                .record(duration.as_secs_f64());
            }
            Event::HttpRequest {
                method,
                status,
                duration,
                ..
            } => {
                let status = status.map_or_else(|| "error".to_string(), |s| s.to_string());
                metrics::histogram!(METRIC_REQUEST_DURATION, LABEL_METHOD => method.to_string())
                    .record(duration.as_secs_f64());
                metrics::counter!(
                    METRIC_REQUESTS_TOTAL,
                    LABEL_METHOD => method.to_string(),
                    LABEL_STATUS => status
                )
                .increment(1);
            }
            Event::Parse {
                content_type,
                duration,
                ..
            } => {
                metrics::histogram!(
                    METRIC_PARSE_DURATION,
                    LABEL_CONTENT_TYPE => content_type.to_string()
                )
                .record(duration.as_secs_f64());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::{Method, Request};

    #[test]
    fn records_every_event() {
        let sink = MetricsInstrument::new();
        let url = url::Url::parse("https://example.com/articles").expect("url");
        let request = Request::builder(Method::Get, url.clone()).build();
        let body = Bytes::from("{}");

        let events = [
            Event::Submit {
                client: "articles",
                action: "index",
                request: &request,
                duration: Duration::from_millis(3),
            },
            Event::HttpRequest {
                method: Method::Get,
                url: &url,
                status: None,
                duration: Duration::from_millis(2),
            },
            Event::Parse {
                content_type: "application/json",
                body: &body,
                duration: Duration::from_millis(1),
            },
        ];

        for event in &events {
            assert!(sink.record(event).is_ok());
        }
    }
}
