//! Transport collaborator.
//!
//! A [`Transport`] executes exactly one HTTP request and hands back the raw response. Timeouts
//! and cancellation belong to the implementation; errors are passed through unchanged.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Boxed future returned by transports.
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send>>;

/// Executes HTTP requests.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use herald_core::{Headers, Request, Response, Transport, TransportFuture};
///
/// struct Echo;
///
/// impl Transport for Echo {
///     fn execute(&self, request: Request) -> TransportFuture {
///         let body = request.body().clone();
///         Box::pin(async move { Ok(Response::new(200, Headers::new(), body)) })
///     }
/// }
/// ```
pub trait Transport: Send + Sync + 'static {
    /// Execute an HTTP request and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn execute(&self, request: Request) -> TransportFuture;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: Request) -> TransportFuture {
        (**self).execute(request)
    }
}
