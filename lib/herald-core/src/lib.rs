//! Core types and traits for the herald declarative HTTP action framework.
//!
//! This crate provides the runtime-free building blocks:
//! - [`Method`], [`Headers`], [`Request`] and [`Response`] - HTTP wire types
//! - [`Body`] and [`XmlElement`] - raw or decoded payloads
//! - [`CodecRegistry`] and [`ParseError`] - content-type driven decoding
//! - [`StatusFilter`] - status matching for callbacks, hooks and retries
//! - [`Args`] - action invocation arguments
//! - [`Transport`] and [`Templates`] - collaborator traits
//! - [`Error`] and [`Result`] - error handling

mod args;
mod body;
mod codec;
mod error;
mod headers;
mod method;
pub mod prelude;
mod request;
mod response;
mod status;
mod template;
mod transport;

pub use args::Args;
pub use body::{Body, XmlElement, XmlNode};
pub use codec::{CodecRegistry, Decoder, ParseError, normalize as normalize_content_type};
pub use error::{BoxError, Error, ErrorKind, Result};
pub use headers::Headers;
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use status::{Status, StatusFilter, StatusSpec, status_code};
pub use template::{MemoryTemplates, NoTemplates, Rendered, TemplateId, Templates};
pub use transport::{Transport, TransportFuture};

// Re-export http crate types for status codes
pub use http::StatusCode;
