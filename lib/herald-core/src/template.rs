//! Body templating boundary.
//!
//! The request builder looks up a body template named `"<client path>/<action>"` and, when
//! one exists, renders it with the invocation locals. Rendering engines plug in through
//! the [`Templates`] trait; [`MemoryTemplates`] is an in-process implementation backed by
//! closures.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::error::BoxError;
use crate::{Error, Result};

/// Template identifier: client path and action name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateId {
    path: String,
    action: String,
}

impl TemplateId {
    /// Create an identifier.
    #[must_use]
    pub fn new(path: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            action: action.into(),
        }
    }

    /// Client template path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Action name.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.path.trim_end_matches('/'), self.action)
    }
}

/// A rendered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Body bytes.
    pub body: Bytes,
    /// Content type derived from the template format, if any.
    pub content_type: Option<String>,
}

/// Templating collaborator.
pub trait Templates: Send + Sync {
    /// Whether a body template exists for this action.
    fn exists(&self, id: &TemplateId) -> bool;

    /// Render the template with the given locals.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] when rendering fails or no template exists.
    fn render(&self, id: &TemplateId, locals: &Value) -> Result<Rendered>;
}

/// No templates at all: every action has an empty body.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl Templates for NoTemplates {
    fn exists(&self, _id: &TemplateId) -> bool {
        false
    }

    fn render(&self, id: &TemplateId, _locals: &Value) -> Result<Rendered> {
        Err(Error::template(format!("no template for {id}")))
    }
}

type Renderer = Arc<dyn Fn(&Value) -> std::result::Result<String, BoxError> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    content_type: Option<String>,
    render: Renderer,
}

/// In-memory templates keyed by `"<path>/<action>.<format>"`.
///
/// The format extension picks the content type (`.json` is `application/json`, `.xml` is
/// `application/xml`, ...). A template without extension is a raw handler and declares
/// no content type.
///
/// ```
/// use herald_core::{MemoryTemplates, TemplateId, Templates};
/// use serde_json::json;
///
/// let mut templates = MemoryTemplates::new();
/// templates.register("articles/create.json", |locals| {
///     Ok(json!({"title": locals["arguments"][0]}).to_string())
/// });
///
/// let id = TemplateId::new("articles", "create");
/// let rendered = templates
///     .render(&id, &json!({"arguments": ["Hello"]}))
///     .unwrap();
/// assert_eq!(rendered.content_type.as_deref(), Some("application/json"));
/// assert_eq!(rendered.body, r#"{"title":"Hello"}"#);
/// ```
#[derive(Clone, Default)]
pub struct MemoryTemplates {
    entries: HashMap<String, Entry>,
}

impl fmt::Debug for MemoryTemplates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("MemoryTemplates")
            .field("templates", &keys)
            .finish()
    }
}

impl MemoryTemplates {
    /// No templates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under `"<path>/<action>[.<format>]"`.
    pub fn register<F>(&mut self, name: &str, render: F)
    where
        F: Fn(&Value) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
    {
        let (key, content_type) = split_format(name);
        self.entries.insert(
            key,
            Entry {
                content_type,
                render: Arc::new(render),
            },
        );
    }
}

fn split_format(name: &str) -> (String, Option<String>) {
    let file_start = name.rfind('/').map_or(0, |index| index + 1);
    match name[file_start..].rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let content_type = mime_guess::from_ext(ext)
                .first()
                .map(|mime| mime.essence_str().to_string());
            (format!("{}{stem}", &name[..file_start]), content_type)
        }
        _ => (name.to_string(), None),
    }
}

impl Templates for MemoryTemplates {
    fn exists(&self, id: &TemplateId) -> bool {
        self.entries.contains_key(&id.to_string())
    }

    fn render(&self, id: &TemplateId, locals: &Value) -> Result<Rendered> {
        let entry = self
            .entries
            .get(&id.to_string())
            .ok_or_else(|| Error::template(format!("no template for {id}")))?;
        let body = (entry.render)(locals).map_err(|err| Error::template(format!("{id}: {err}")))?;

        Ok(Rendered {
            body: Bytes::from(body),
            content_type: entry.content_type.clone(),
        })
    }
}
