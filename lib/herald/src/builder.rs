//! Request construction.
//!
//! An action returns a [`RequestSpec`]; the builder resolves it against the client type's
//! [`Defaults`] and the rendered body template into a concrete [`Request`]:
//!
//! - exactly one of `path` and `url` may be given; `path` is joined onto the default URL,
//!   `url` is used verbatim, neither means the default URL itself;
//! - explicit query values replace URL query values with the same key;
//! - headers are layered: computed `Accept`/`Content-Type` < default headers < explicit
//!   headers;
//! - a missing `Accept` is inferred from the URL's file extension.

use std::collections::HashSet;

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Headers, Method, Rendered, Request, Result};

/// Per-client-type defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Defaults {
    pub(crate) url: Option<String>,
    pub(crate) headers: Headers,
    pub(crate) values: Map<String, Value>,
}

impl Defaults {
    /// Default base URL.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Default headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Any other default value.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Every other default value.
    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// What an action asks for.
///
/// ```
/// use herald::{Method, RequestSpec};
///
/// let spec = RequestSpec::new()
///     .method(Method::Put)
///     .path("/articles/1")
///     .query("draft", "true")
///     .header("X-Request-Id", "abc");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    method: Option<Method>,
    path: Option<String>,
    url: Option<String>,
    query: Vec<(String, String)>,
    headers: Headers,
    locals: Map<String, Value>,
}

impl RequestSpec {
    /// Empty spec: default method, default URL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the action's HTTP method.
    #[must_use]
    pub const fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Path joined onto the default URL.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Absolute URL, used verbatim.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Add query parameters from a serializable struct.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the value does not serialize to a flat form.
    pub fn query_params<T: Serialize + ?Sized>(mut self, params: &T) -> Result<Self> {
        let encoded = serde_html_form::to_string(params)
            .map_err(|err| Error::invalid_argument(format!("query parameters: {err}")))?;
        self.query.extend(
            url::form_urlencoded::parse(encoded.as_bytes())
                .map(|(name, value)| (name.into_owned(), value.into_owned())),
        );
        Ok(self)
    }

    /// Set a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set a template local.
    #[must_use]
    pub fn local(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.locals.insert(name.into(), value.into());
        self
    }

    /// Template locals.
    #[must_use]
    pub fn locals(&self) -> &Map<String, Value> {
        &self.locals
    }

    /// Method override.
    #[must_use]
    pub const fn method_override(&self) -> Option<Method> {
        self.method
    }

    /// Resolve into a concrete request.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] when both `path` and `url` are given
    /// - [`Error::MissingBaseUrl`] when the default URL is needed but absent
    /// - [`Error::InvalidUrl`] when the resulting URL does not parse
    pub fn build(
        self,
        method: Method,
        defaults: &Defaults,
        rendered: Option<Rendered>,
    ) -> Result<Request> {
        let method = self.method.unwrap_or(method);
        let target = match (self.path, self.url) {
            (Some(_), Some(_)) => {
                return Err(Error::configuration("either pass only url, or only path"));
            }
            (Some(path), None) => join(defaults.url().ok_or(Error::MissingBaseUrl)?, &path),
            (None, Some(url)) => url,
            (None, None) => defaults.url().ok_or(Error::MissingBaseUrl)?.to_string(),
        };

        let mut url = url::Url::parse(&target)?;
        merge_query(&mut url, &self.query);

        let (body, content_type) = match rendered {
            Some(rendered) => (rendered.body, rendered.content_type),
            None => (Bytes::new(), None),
        };

        let mut computed = Headers::new();
        if let Some(content_type) = content_type {
            computed.insert("Accept", content_type.clone());
            computed.insert("Content-Type", content_type);
        }
        let mut headers = self
            .headers
            .layered_over(&defaults.headers)
            .layered_over(&computed);

        if !headers.contains("Accept") {
            if let Some(mime) = mime_guess::from_path(url.path()).first() {
                headers.insert("Accept", mime.essence_str());
            }
        }

        Ok(Request::from_parts(method, url, headers, body))
    }
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn merge_query(url: &mut url::Url, explicit: &[(String, String)]) {
    if explicit.is_empty() {
        return;
    }

    let explicit_keys: HashSet<&str> = explicit.iter().map(|(name, _)| name.as_str()).collect();
    let mut emitted: HashSet<String> = HashSet::new();
    let mut merged: Vec<(String, String)> = Vec::new();

    for (name, value) in url.query_pairs().into_owned() {
        if !explicit_keys.contains(name.as_str()) {
            merged.push((name, value));
        } else if emitted.insert(name.clone()) {
            merged.extend(explicit.iter().filter(|(key, _)| *key == name).cloned());
        }
    }
    merged.extend(
        explicit
            .iter()
            .filter(|(name, _)| !emitted.contains(name))
            .cloned(),
    );

    url.query_pairs_mut().clear().extend_pairs(merged);
}
