//! Response body values.
//!
//! The transport hands back raw bytes; the decode stage of the pipeline turns them into a
//! [`Body`] using the codec registered for the response content type. Callbacks read and
//! replace bodies as [`Body`] values.

use bytes::Bytes;

use crate::{Error, Result};

/// A response body, raw or decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Undecoded bytes (unknown content type, or an empty body).
    Raw(Bytes),
    /// Text, produced by text decoders or by callbacks.
    Text(String),
    /// A decoded JSON document.
    Json(serde_json::Value),
    /// The root element of a decoded XML document.
    Xml(XmlElement),
}

impl Default for Body {
    fn default() -> Self {
        Self::Raw(Bytes::new())
    }
}

impl Body {
    /// Returns `true` for an empty raw or text body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Raw(bytes) => bytes.is_empty(),
            Self::Text(text) => text.is_empty(),
            Self::Json(_) | Self::Xml(_) => false,
        }
    }

    /// Decoded JSON value, if any.
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Mutable decoded JSON value, if any.
    #[must_use]
    pub fn as_json_mut(&mut self) -> Option<&mut serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Root XML element, if any.
    #[must_use]
    pub const fn as_xml(&self) -> Option<&XmlElement> {
        match self {
            Self::Xml(element) => Some(element),
            _ => None,
        }
    }

    /// Text content, if this is a text body or a UTF-8 raw body.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Raw(bytes) => std::str::from_utf8(bytes).ok(),
            Self::Json(_) | Self::Xml(_) => None,
        }
    }

    /// Raw bytes, if this body was not decoded.
    #[must_use]
    pub const fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Deserialize a JSON body into a typed value.
    ///
    /// Errors carry the path of the offending field (e.g. `user.address.city`).
    ///
    /// # Example
    ///
    /// ```
    /// use herald_core::Body;
    /// use serde::Deserialize;
    ///
    /// #[derive(Debug, PartialEq, Deserialize)]
    /// struct Status { ok: bool }
    ///
    /// let body = Body::Json(serde_json::json!({"ok": true}));
    /// let status: Status = body.deserialize().expect("deserialize");
    /// assert_eq!(status, Status { ok: true });
    /// ```
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let value = match self {
            Self::Json(value) => value.clone(),
            Self::Raw(bytes) => serde_json::from_slice(bytes)?,
            Self::Text(text) => serde_json::from_str(text)?,
            Self::Xml(_) => {
                return Err(Error::invalid_argument(
                    "cannot deserialize an XML body as JSON",
                ));
            }
        };
        serde_path_to_error::deserialize(value).map_err(|err| {
            Error::invalid_argument(format!("at '{}': {}", err.path(), err.inner()))
        })
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Raw(bytes)
    }
}

impl From<XmlElement> for Body {
    fn from(element: XmlElement) -> Self {
        Self::Xml(element)
    }
}

// ============================================================================
// XML
// ============================================================================

/// An owned XML element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

/// A child of an [`XmlElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// Nested element.
    Element(XmlElement),
    /// Character data.
    Text(String),
}

impl XmlElement {
    /// Parse a document and return its root element.
    ///
    /// # Errors
    ///
    /// Returns the parser error for malformed documents (including documents
    /// without a root element).
    pub fn parse(text: &str) -> std::result::Result<Self, roxmltree::Error> {
        let document = roxmltree::Document::parse(text)?;
        Ok(Self::from_node(document.root_element()))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let attributes = node
            .attributes()
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect();
        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(XmlNode::Element(Self::from_node(child)))
                } else if child.is_text() {
                    child.text().map(|text| XmlNode::Text(text.to_string()))
                } else {
                    None
                }
            })
            .collect();

        Self {
            name: node.tag_name().name().to_string(),
            attributes,
            children,
        }
    }

    /// Local tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child nodes in document order.
    #[must_use]
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given name.
    #[must_use]
    pub fn element(&self, name: &str) -> Option<&Self> {
        self.elements().find(|element| element.name == name)
    }

    /// Concatenated direct text content.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_accessors() {
        let body = Body::from(serde_json::json!({"ok": true}));
        assert_eq!(body.as_json().and_then(|v| v["ok"].as_bool()), Some(true));
        assert!(body.as_text().is_none());

        let body = Body::from("plain");
        assert_eq!(body.as_text(), Some("plain"));

        let body = Body::default();
        assert!(body.is_empty());
        assert_eq!(body.as_bytes(), Some(&Bytes::new()));
    }

    #[test]
    fn deserialize_json_body() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Article {
            title: String,
        }

        let body = Body::Json(serde_json::json!({"title": "Hello"}));
        let article: Article = body.deserialize().expect("deserialize");
        assert_eq!(
            article,
            Article {
                title: "Hello".to_string()
            }
        );
    }

    #[test]
    fn deserialize_reports_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Address {
            #[allow(dead_code)]
            city: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct User {
            #[allow(dead_code)]
            address: Address,
        }

        let body = Body::Json(serde_json::json!({"address": {}}));
        let err = body.deserialize::<User>().expect_err("missing city");
        let message = err.to_string();
        assert!(message.contains("address"), "{message}");
        assert!(message.contains("city"), "{message}");
    }

    #[test]
    fn parse_xml_document() {
        let root = XmlElement::parse(r#"<node id="root"><child>text</child></node>"#)
            .expect("valid xml");

        assert_eq!(root.name(), "node");
        assert_eq!(root.attribute("id"), Some("root"));
        assert_eq!(root.element("child").map(XmlElement::text), Some("text".to_string()));
    }

    #[test]
    fn parse_invalid_xml() {
        assert!(XmlElement::parse("junk").is_err());
    }
}
