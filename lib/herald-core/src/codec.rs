//! Content-type driven body decoding.
//!
//! [`CodecRegistry`] maps content types to decoders. Lookup order:
//!
//! 1. exact match on the content-type string,
//! 2. match on the normalized MIME type (lower-cased, synonyms resolved),
//! 3. if the content type carries parameters (`;charset=...`), retry without them,
//! 4. otherwise the raw body passes through undecoded.
//!
//! Empty bodies never reach a decoder.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::body::{Body, XmlElement};
use crate::error::BoxError;

/// A body decoder.
pub type Decoder = Arc<dyn Fn(&Bytes) -> Result<Body, BoxError> + Send + Sync>;

/// MIME synonyms resolved during normalization.
const SYNONYMS: &[(&str, &str)] = &[
    ("text/xml", "application/xml"),
    ("application/x-xml", "application/xml"),
    ("text/x-json", "application/json"),
    ("application/jsonrequest", "application/json"),
];

// ============================================================================
// Parse Error
// ============================================================================

/// A body that the registered decoder rejected.
///
/// Carries the original body and content type next to the decoder failure.
#[derive(Debug)]
pub struct ParseError {
    body: Bytes,
    content_type: String,
    source: BoxError,
}

impl ParseError {
    /// Create a parse error.
    #[must_use]
    pub fn new(body: Bytes, content_type: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            body,
            content_type: content_type.into(),
            source: source.into(),
        }
    }

    /// The body that failed to decode.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// The content type the decoder was selected for.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to parse {} body: {}",
            self.content_type, self.source
        )
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Content-type to decoder registry.
///
/// The default registry decodes `application/json`, `application/ld+json` and
/// `application/xml` (and their synonyms).
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use herald_core::{Body, CodecRegistry};
///
/// let mut codecs = CodecRegistry::default();
/// codecs.register("text/plain", |body: &Bytes| {
///     Ok(Body::Text(String::from_utf8(body.to_vec())?.to_uppercase()))
/// });
///
/// let body = codecs
///     .decode("text/plain;charset=UTF-8", Bytes::from("shout"))
///     .expect("decode");
/// assert_eq!(body, Body::Text("SHOUT".to_string()));
/// ```
#[derive(Clone)]
pub struct CodecRegistry {
    decoders: HashMap<String, Decoder>,
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.decoders.keys().collect();
        types.sort();
        f.debug_struct("CodecRegistry")
            .field("content_types", &types)
            .finish()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("application/json", decode_json);
        registry.register("application/ld+json", decode_json);
        registry.register("application/xml", decode_xml);
        registry
    }
}

impl CodecRegistry {
    /// A registry without any decoder.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register (or replace) the decoder for a content type.
    pub fn register<F>(&mut self, content_type: impl Into<String>, decoder: F)
    where
        F: Fn(&Bytes) -> Result<Body, BoxError> + Send + Sync + 'static,
    {
        self.decoders.insert(content_type.into(), Arc::new(decoder));
    }

    /// Find the decoder for a content type.
    #[must_use]
    pub fn lookup(&self, content_type: &str) -> Option<&Decoder> {
        if let Some(decoder) = self.decoders.get(content_type) {
            return Some(decoder);
        }

        let normalized = normalize(content_type);
        let found = self
            .decoders
            .iter()
            .find(|(key, _)| normalize(key) == normalized)
            .map(|(_, decoder)| decoder);
        if found.is_some() {
            return found;
        }

        match content_type.split_once(';') {
            Some((essence, _)) => self.lookup(essence.trim()),
            None => None,
        }
    }

    /// Decode a body according to its content type.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] carrying the body and content type when the selected
    /// decoder fails.
    pub fn decode(&self, content_type: &str, body: Bytes) -> Result<Body, ParseError> {
        if body.is_empty() {
            return Ok(Body::Raw(body));
        }

        match self.lookup(content_type) {
            Some(decoder) => {
                decoder(&body).map_err(|source| ParseError::new(body.clone(), content_type, source))
            }
            None => Ok(Body::Raw(body)),
        }
    }
}

/// Canonical form of a content type: lower-cased, whitespace-free, synonyms resolved.
#[must_use]
pub fn normalize(content_type: &str) -> String {
    let normalized: String = content_type
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == normalized)
        .map_or(normalized, |(_, canonical)| (*canonical).to_string())
}

fn decode_json(body: &Bytes) -> Result<Body, BoxError> {
    Ok(Body::Json(serde_json::from_slice(body)?))
}

fn decode_xml(body: &Bytes) -> Result<Body, BoxError> {
    let text = std::str::from_utf8(body)?;
    Ok(Body::Xml(XmlElement::parse(text)?))
}
