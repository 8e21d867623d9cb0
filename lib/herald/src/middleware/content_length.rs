//! Content-length normalization.
//!
//! Outbound: a non-empty body without `Content-Length` gets one. Inbound: a response
//! without `Content-Length` gets the length of the buffered body.

use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service};

use crate::{Error, Request, Response, Result, ServiceFuture};

const CONTENT_LENGTH: &str = "Content-Length";

/// Layer that normalizes `Content-Length` headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentLengthLayer;

impl<S> Layer<S> for ContentLengthLayer {
    type Service = ContentLength<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ContentLength { inner }
    }
}

/// Service that normalizes `Content-Length` headers.
#[derive(Debug, Clone)]
pub struct ContentLength<S> {
    inner: S,
}

impl<S> Service<Request> for ContentLength<S>
where
    S: Service<Request, Response = Response<Bytes>, Error = Error> + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture<Response<Bytes>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        if !request.body().is_empty() {
            let length = request.body().len().to_string();
            request.headers_mut().insert_default(CONTENT_LENGTH, length);
        }

        let future = self.inner.call(request);
        Box::pin(async move {
            let mut response = future.await?;
            let length = response.body().len().to_string();
            response.headers_mut().insert_default(CONTENT_LENGTH, length);
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tower::ServiceExt;

    use super::*;
    use crate::{Headers, Method};

    #[derive(Clone, Default)]
    struct Capture {
        seen: Arc<Mutex<Option<Headers>>>,
        response_headers: Headers,
    }

    impl Service<Request> for Capture {
        type Response = Response<Bytes>;
        type Error = Error;
        type Future = ServiceFuture<Response<Bytes>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, request: Request) -> Self::Future {
            *self.seen.lock().expect("lock") = Some(request.headers().clone());
            let headers = self.response_headers.clone();
            Box::pin(async move { Ok(Response::new(200, headers, Bytes::from("hello"))) })
        }
    }

    fn request(body: &'static str) -> Request {
        let url = url::Url::parse("https://example.com/articles").expect("url");
        Request::builder(Method::Post, url).body(body).build()
    }

    #[tokio::test]
    async fn sets_missing_lengths() {
        let capture = Capture::default();
        let service = ContentLengthLayer.layer(capture.clone());

        let response = service.oneshot(request("{}")).await.expect("response");

        let sent = capture.seen.lock().expect("lock").clone().expect("headers");
        assert_eq!(sent.get("content-length"), Some("2"));
        assert_eq!(response.header("content-length"), Some("5"));
    }

    #[tokio::test]
    async fn keeps_declared_lengths_and_empty_bodies() {
        let capture = Capture {
            response_headers: [("content-length", "5")].into_iter().collect(),
            ..Capture::default()
        };
        let service = ContentLengthLayer.layer(capture.clone());

        let response = service.oneshot(request("")).await.expect("response");

        let sent = capture.seen.lock().expect("lock").clone().expect("headers");
        assert!(!sent.contains("content-length"));
        assert_eq!(response.headers().len(), 1);
    }
}
