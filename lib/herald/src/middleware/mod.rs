//! Tower middleware for the per-submission pipeline.
//!
//! Every submission runs through a service stack assembled by [`Pipeline::build`]:
//!
//! - [`DecodeLayer`] - decodes response bodies through the codec registry
//! - [`ContentLengthLayer`] - normalizes `Content-Length` both ways
//! - [`InstrumentLayer`] - logs with `tracing` and publishes `http_request` events
//! - user layers added with `ClientTypeBuilder::layer`, working on raw requests and
//!   undecoded responses
//!
//! # Example: a user layer
//!
//! ```ignore
//! use herald::ClientType;
//! use herald::middleware::ConcurrencyLimitLayer;
//!
//! let client = ClientType::builder("articles")
//!     .layer(ConcurrencyLimitLayer::new(4))
//!     .build();
//! ```

mod content_length;
mod decode;
mod logging;
#[cfg(feature = "metrics")]
mod metrics;
mod pipeline;

pub use content_length::{ContentLength, ContentLengthLayer};
pub use decode::{Decode, DecodeLayer};
pub use logging::{InstrumentLayer, InstrumentTap, LogLevel};
#[cfg(feature = "metrics")]
pub use metrics::MetricsInstrument;
pub use pipeline::{BoxedService, Pipeline, PipelineService, TransportService};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
pub use tower::limit::ConcurrencyLimitLayer;
