//! Error types for herald.

use derive_more::{Display, Error, From};

use crate::codec::ParseError;

/// Boxed error used at collaborator boundaries (decoders, callbacks, sinks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for herald operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Invalid declaration (conflicting options, malformed defaults, ...).
    #[display("configuration error: {_0}")]
    #[from(skip)]
    Configuration(#[error(not(source))] String),

    /// A `path` was given but the client type declares no default `url`.
    #[display("missing default base URL")]
    #[from(skip)]
    MissingBaseUrl,

    /// A symbolic status name that is not a known HTTP status.
    #[display("unknown HTTP status: {_0}")]
    #[from(skip)]
    UnknownStatus(#[error(not(source))] String),

    /// No client type registered under this name.
    #[display("unknown client type: {_0}")]
    #[from(skip)]
    UnknownClient(#[error(not(source))] String),

    /// The client type declares no such action.
    #[display("unknown action {client}#{action}")]
    #[from(skip)]
    UnknownAction {
        /// Client type name.
        client: String,
        /// Action name.
        action: String,
    },

    /// No submission job registered under this name.
    #[display("unknown submission job: {_0}")]
    #[from(skip)]
    UnknownJob(#[error(not(source))] String),

    /// An action was invoked with arguments it cannot use.
    #[display("invalid argument: {_0}")]
    #[from(skip)]
    InvalidArgument(#[error(not(source))] String),

    /// The templating collaborator failed to render a body.
    #[display("template error: {_0}")]
    #[from(skip)]
    Template(#[error(not(source))] String),

    /// A response body could not be decoded.
    #[display("{_0}")]
    #[from]
    Parse(ParseError),

    /// An after-submit callback broke its return contract.
    #[display("after-submit error: {_0}")]
    #[from(skip)]
    AfterSubmit(#[error(not(source))] String),

    /// A job's response status failed a retryable status filter.
    #[display("unexpected response status {status}")]
    #[from(skip)]
    StatusMismatch {
        /// Status of the rejected response.
        status: u16,
    },

    /// An error raised by user code inside a callback or job hook.
    #[display("callback error: {_0}")]
    #[from(skip)]
    Callback(#[error(not(source))] BoxError),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The request could not be handed to the transport.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// JSON (de)serialization error, e.g. of a job invocation.
    #[display("JSON error: {_0}")]
    #[from]
    Json(serde_json::Error),

    /// The queuing collaborator rejected a job.
    #[display("queue error: {_0}")]
    #[from(skip)]
    Queue(#[error(not(source))] String),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used to declare retryable failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Declaration or build errors. Never worth retrying, but listed for completeness.
    Configuration,
    /// Connection failures.
    Connection,
    /// TLS failures.
    Tls,
    /// Transport timeouts.
    Timeout,
    /// Body decoding failures.
    Parse,
    /// Broken after-submit callback contracts.
    AfterSubmit,
    /// Errors raised by user callbacks and hooks.
    Callback,
    /// Synthetic status mismatch raised by a job's status filter.
    StatusMismatch,
    /// Everything else.
    Other,
}

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a template error.
    #[must_use]
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// Create an after-submit contract error.
    #[must_use]
    pub fn after_submit(message: impl Into<String>) -> Self {
        Self::AfterSubmit(message.into())
    }

    /// Wrap an error raised by a callback or hook.
    #[must_use]
    pub fn callback(error: impl Into<BoxError>) -> Self {
        Self::Callback(error.into())
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_)
            | Self::MissingBaseUrl
            | Self::UnknownStatus(_)
            | Self::UnknownClient(_)
            | Self::UnknownAction { .. }
            | Self::UnknownJob(_) => ErrorKind::Configuration,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Tls(_) => ErrorKind::Tls,
            Self::Timeout => ErrorKind::Timeout,
            Self::Parse(_) => ErrorKind::Parse,
            Self::AfterSubmit(_) => ErrorKind::AfterSubmit,
            Self::Callback(_) => ErrorKind::Callback,
            Self::StatusMismatch { .. } => ErrorKind::StatusMismatch,
            Self::InvalidArgument(_)
            | Self::Template(_)
            | Self::InvalidRequest(_)
            | Self::InvalidUrl(_)
            | Self::Json(_)
            | Self::Queue(_) => ErrorKind::Other,
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns the parse error if this is a decoding failure.
    #[must_use]
    pub const fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the rejected status if this is a status mismatch.
    #[must_use]
    pub const fn mismatched_status(&self) -> Option<u16> {
        match self {
            Self::StatusMismatch { status } => Some(*status),
            _ => None,
        }
    }

    /// Downcast the user error carried by [`Error::Callback`].
    #[must_use]
    pub fn callback_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Callback(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        insta::assert_snapshot!(Error::MissingBaseUrl.to_string(), @"missing default base URL");
        insta::assert_snapshot!(Error::Timeout.to_string(), @"request timeout");
        insta::assert_snapshot!(
            Error::connection("failed to connect").to_string(),
            @"connection error: failed to connect"
        );
        insta::assert_snapshot!(
            Error::StatusMismatch { status: 500 }.to_string(),
            @"unexpected response status 500"
        );
        insta::assert_snapshot!(
            Error::UnknownAction { client: "articles".to_string(), action: "nope".to_string() }.to_string(),
            @"unknown action articles#nope"
        );
    }

    #[test]
    fn error_kind() {
        assert_eq!(Error::Timeout.kind(), ErrorKind::Timeout);
        assert_eq!(Error::connection("x").kind(), ErrorKind::Connection);
        assert_eq!(Error::MissingBaseUrl.kind(), ErrorKind::Configuration);
        assert_eq!(
            Error::StatusMismatch { status: 503 }.kind(),
            ErrorKind::StatusMismatch
        );
        assert_eq!(Error::after_submit("nil").kind(), ErrorKind::AfterSubmit);
    }

    #[test]
    fn callback_error_downcast() {
        #[derive(Debug, derive_more::Display, derive_more::Error)]
        #[display("boom")]
        struct Boom;

        let err = Error::callback(Boom);
        assert!(err.callback_error::<Boom>().is_some());
        assert_eq!(err.to_string(), "callback error: boom");
        assert!(Error::Timeout.callback_error::<Boom>().is_none());
    }

    #[test]
    fn error_predicates() {
        assert!(Error::Timeout.is_timeout());
        assert!(!Error::Timeout.is_connection());
        assert!(Error::connection("refused").is_connection());
        assert_eq!(Error::StatusMismatch { status: 422 }.mismatched_status(), Some(422));
        assert_eq!(Error::Timeout.mismatched_status(), None);
    }
}
