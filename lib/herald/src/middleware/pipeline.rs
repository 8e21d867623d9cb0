//! Per-submission middleware pipeline.
//!
//! A [`Pipeline`] is the declaration held by a client type: codecs, user layers and the
//! log level of the instrumentation tap. [`Pipeline::build`] assembles a fresh service stack
//! for every submission, so no service state is ever shared between two submissions.
//!
//! Outermost to innermost:
//!
//! 1. [`DecodeLayer`] - body decoding
//! 2. [`ContentLengthLayer`] - content-length normalization
//! 3. [`InstrumentLayer`] - logging and the `http_request` event
//! 4. user layers, first added = outermost
//! 5. the transport

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use tower::util::BoxCloneService;
use tower::{Layer, ServiceBuilder};
use tower_service::Service;

use super::{ContentLengthLayer, DecodeLayer, InstrumentLayer, LogLevel};
use crate::instrument::Instruments;
use crate::{
    Body, BoxError, CodecRegistry, Error, Request, Response, Result, ServiceFuture, Transport,
};

/// Type-erased raw service: the transport and every user layer.
pub type BoxedService = BoxCloneService<Request, Response<Bytes>, Error>;

/// Type-erased full pipeline, yielding decoded responses.
pub type PipelineService = BoxCloneService<Request, Response<Body>, Error>;

type LayerFn = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// Adapts a [`Transport`] to a tower service.
#[derive(Clone)]
pub struct TransportService {
    transport: Arc<dyn Transport>,
}

impl TransportService {
    /// Wrap a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl Service<Request> for TransportService {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture<Response<Bytes>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.transport.execute(request)
    }
}

/// Middleware declaration of a client type.
///
/// Cloning copies the declaration: layers added to a clone never show up in the original.
#[derive(Clone, Default)]
pub struct Pipeline {
    codecs: CodecRegistry,
    layers: Vec<LayerFn>,
    log_level: LogLevel,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("codecs", &self.codecs)
            .field("layers_count", &self.layers.len())
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Pipeline {
    /// Add a Tower layer.
    ///
    /// Layers see the raw request and the undecoded response. They are applied in order:
    /// first added = outermost (processes requests first).
    pub fn layer<L>(&mut self, layer: L)
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
    }

    /// Register a body decoder.
    pub fn codec<F>(&mut self, content_type: impl Into<String>, decoder: F)
    where
        F: Fn(&Bytes) -> std::result::Result<Body, BoxError> + Send + Sync + 'static,
    {
        self.codecs.register(content_type, decoder);
    }

    /// Set the log level of the instrumentation tap.
    pub fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = level;
    }

    /// Registered codecs.
    #[must_use]
    pub const fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Number of user layers.
    #[must_use]
    pub fn layers_count(&self) -> usize {
        self.layers.len()
    }

    /// Assemble a fresh service stack around `transport`.
    #[must_use]
    pub fn build(&self, transport: Arc<dyn Transport>, instruments: &Instruments) -> PipelineService {
        let mut service: BoxedService = BoxCloneService::new(TransportService::new(transport));

        for layer_fn in self.layers.iter().rev() {
            service = layer_fn(service);
        }

        let stack = ServiceBuilder::new()
            .layer(DecodeLayer::new(self.codecs.clone(), instruments.clone()))
            .layer(ContentLengthLayer)
            .layer(InstrumentLayer::new(instruments.clone()).level(self.log_level))
            .service(service);

        BoxCloneService::new(stack)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tower::ServiceExt;
    use tower::layer::layer_fn;

    use super::*;
    use crate::{Headers, Method, TransportFuture};

    /// Transport answering with the request headers serialized as JSON.
    struct EchoHeaders;

    impl Transport for EchoHeaders {
        fn execute(&self, request: Request) -> TransportFuture {
            let headers: serde_json::Map<String, serde_json::Value> = request
                .headers()
                .iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value.into()))
                .collect();
            let body = Bytes::from(serde_json::Value::Object(headers).to_string());
            let response_headers: Headers =
                [("Content-Type", "application/json")].into_iter().collect();
            Box::pin(async move { Ok(Response::new(200, response_headers, body)) })
        }
    }

    #[derive(Clone)]
    struct Tag<S> {
        inner: S,
        name: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl<S> Service<Request> for Tag<S>
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
            self.order.lock().expect("lock").push(self.name);
            request.headers_mut().insert(format!("X-{}", self.name), "1");
            Box::pin(self.inner.call(request))
        }
    }

    fn tag(
        name: &'static str,
        order: &Arc<Mutex<Vec<&'static str>>>,
    ) -> impl Layer<BoxedService, Service = Tag<BoxedService>> + Send + Sync + 'static {
        let order = Arc::clone(order);
        layer_fn(move |inner| Tag {
            inner,
            name,
            order: Arc::clone(&order),
        })
    }

    fn request() -> Request {
        let url = url::Url::parse("https://example.com/articles").expect("url");
        Request::builder(Method::Post, url).body("{}").build()
    }

    #[tokio::test]
    async fn user_layers_run_in_declaration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::default();
        pipeline.layer(tag("first", &order));
        pipeline.layer(tag("second", &order));

        let response = pipeline
            .build(Arc::new(EchoHeaders), &Instruments::none())
            .oneshot(request())
            .await
            .expect("response");

        assert_eq!(*order.lock().expect("lock"), vec!["first", "second"]);
        let echoed = response.body().as_json().expect("json");
        assert_eq!(echoed["x-first"], "1");
        assert_eq!(echoed["x-second"], "1");
        assert_eq!(echoed["content-length"], "2");
    }

    #[tokio::test]
    async fn cloned_pipeline_is_independent() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let parent = Pipeline::default();
        let mut child = parent.clone();
        child.layer(tag("child", &order));

        let response = parent
            .build(Arc::new(EchoHeaders), &Instruments::none())
            .oneshot(request())
            .await
            .expect("response");

        assert!(order.lock().expect("lock").is_empty());
        assert!(response.body().as_json().expect("json").get("x-child").is_none());
        assert_eq!(child.layers_count(), 1);
        assert_eq!(parent.layers_count(), 0);
    }

    #[tokio::test]
    async fn custom_codec() {
        let mut pipeline = Pipeline::default();
        pipeline.codec("application/json", |body: &Bytes| {
            Ok(Body::Text(format!("{} bytes", body.len())))
        });

        let response = pipeline
            .build(Arc::new(EchoHeaders), &Instruments::none())
            .oneshot(request())
            .await
            .expect("response");

        assert!(matches!(response.body(), Body::Text(text) if text.ends_with("bytes")));
    }
}
