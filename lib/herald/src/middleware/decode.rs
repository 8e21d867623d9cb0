//! Response body decoding.
//!
//! Picks the content type from the response `Content-Type` header, falling back to the
//! request's `Accept` header, and decodes the body through the [`CodecRegistry`].
//! Decoder failures surface as [`Error::Parse`].

use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use tower::{Layer, Service};

use crate::instrument::{Event, Instruments};
use crate::{Body, CodecRegistry, Error, Request, Response, Result, ServiceFuture};

/// Layer that decodes response bodies.
#[derive(Debug, Clone)]
pub struct DecodeLayer {
    codecs: CodecRegistry,
    instruments: Instruments,
}

impl DecodeLayer {
    /// Decode with the given codecs, publishing `parse` events to the sinks.
    #[must_use]
    pub fn new(codecs: CodecRegistry, instruments: Instruments) -> Self {
        Self {
            codecs,
            instruments,
        }
    }
}

impl<S> Layer<S> for DecodeLayer {
    type Service = Decode<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Decode {
            inner,
            codecs: self.codecs.clone(),
            instruments: self.instruments.clone(),
        }
    }
}

/// Service that decodes response bodies.
#[derive(Debug, Clone)]
pub struct Decode<S> {
    inner: S,
    codecs: CodecRegistry,
    instruments: Instruments,
}

impl<S> Service<Request> for Decode<S>
where
    S: Service<Request, Response = Response<Bytes>, Error = Error> + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = Error;
    type Future = ServiceFuture<Response<Body>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let accept = request.header("Accept").map(str::to_string);
        let codecs = self.codecs.clone();
        let instruments = self.instruments.clone();

        let future = self.inner.call(request);
        Box::pin(async move {
            let response = future.await?;
            let content_type = response
                .content_type()
                .map(str::to_string)
                .or(accept)
                .unwrap_or_default();

            let (status, headers, raw) = response.into_parts();
            if raw.is_empty() {
                return Ok(Response::new(status, headers, Body::Raw(raw)));
            }

            let start = Instant::now();
            let decoded = codecs.decode(&content_type, raw.clone());
            instruments.emit(&Event::Parse {
                content_type: &content_type,
                body: &raw,
                duration: start.elapsed(),
            });

            Ok(Response::new(status, headers, decoded?))
        })
    }
}

#[cfg(test)]
mod tests {
    use tower::ServiceExt;

    use super::*;
    use crate::{Headers, Method};

    #[derive(Clone)]
    struct Fixed {
        headers: Headers,
        body: &'static str,
    }

    impl Service<Request> for Fixed {
        type Response = Response<Bytes>;
        type Error = Error;
        type Future = ServiceFuture<Response<Bytes>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _request: Request) -> Self::Future {
            let response = Response::new(200, self.headers.clone(), Bytes::from(self.body));
            Box::pin(async move { Ok(response) })
        }
    }

    fn decode(headers: &[(&str, &str)], body: &'static str) -> Decode<Fixed> {
        DecodeLayer::new(CodecRegistry::default(), Instruments::none()).layer(Fixed {
            headers: headers.iter().copied().collect(),
            body,
        })
    }

    fn request(accept: Option<&str>) -> Request {
        let url = url::Url::parse("https://example.com/articles").expect("url");
        let builder = Request::builder(Method::Get, url);
        match accept {
            Some(accept) => builder.header("Accept", accept).build(),
            None => builder.build(),
        }
    }

    #[tokio::test]
    async fn decodes_by_response_content_type() {
        let service = decode(&[("Content-Type", "application/json; charset=utf-8")], r#"{"ok":true}"#);
        let response = service.oneshot(request(None)).await.expect("response");

        assert_eq!(
            response.body().as_json().and_then(|v| v["ok"].as_bool()),
            Some(true)
        );
    }

    #[tokio::test]
    async fn falls_back_to_request_accept() {
        let service = decode(&[], r#"{"ok":true}"#);
        let response = service
            .oneshot(request(Some("application/json")))
            .await
            .expect("response");

        assert!(response.body().as_json().is_some());
    }

    #[tokio::test]
    async fn unknown_content_type_passes_through() {
        let service = decode(&[("Content-Type", "text/plain")], "hello");
        let response = service.oneshot(request(None)).await.expect("response");

        assert_eq!(response.body(), &Body::Raw(Bytes::from("hello")));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let service = decode(&[("Content-Type", "application/json")], "junk");
        let err = service.oneshot(request(None)).await.expect_err("parse error");

        let parse = err.as_parse().expect("parse error");
        assert_eq!(parse.body(), &Bytes::from("junk"));
        assert_eq!(parse.content_type(), "application/json");
    }
}
