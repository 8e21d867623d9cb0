//! The HTTP verbs an action may declare.

use std::fmt;
use std::str::FromStr;

/// Verb of an action. Defaults to `GET` when an action does not name one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Fetch a resource.
    #[default]
    Get,
    /// Create a resource or trigger an operation.
    Post,
    /// Replace a resource.
    Put,
    /// Partially update a resource.
    Patch,
    /// Remove a resource.
    Delete,
    /// Fetch headers only.
    Head,
    /// Ask which verbs a resource allows.
    Options,
}

const VERBS: [(Method, http::Method); 7] = [
    (Method::Get, http::Method::GET),
    (Method::Post, http::Method::POST),
    (Method::Put, http::Method::PUT),
    (Method::Patch, http::Method::PATCH),
    (Method::Delete, http::Method::DELETE),
    (Method::Head, http::Method::HEAD),
    (Method::Options, http::Method::OPTIONS),
];

impl Method {
    /// Upper-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        VERBS
            .into_iter()
            .find_map(|(verb, wire)| (verb == method).then_some(wire))
            .unwrap_or_default()
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = crate::Error;

    fn try_from(wire: &http::Method) -> Result<Self, Self::Error> {
        VERBS
            .into_iter()
            .find_map(|(verb, known)| (&known == wire).then_some(verb))
            .ok_or_else(|| crate::Error::invalid_request(format!("unsupported verb {wire}")))
    }
}

impl FromStr for Method {
    type Err = crate::Error;

    /// Case-insensitive: `"patch"` and `"PATCH"` both parse.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let wire = http::Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| crate::Error::invalid_request(format!("invalid verb {name:?}")))?;
        Self::try_from(&wire)
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for (verb, wire) in VERBS {
            check!(verb.to_string() == wire.as_str());
            check!(http::Method::from(verb) == wire);
            check!(Method::try_from(&wire).ok() == Some(verb));
        }
    }

    #[test]
    fn parses_any_case() {
        check!("patch".parse::<Method>().ok() == Some(Method::Patch));
        check!(" Delete ".parse::<Method>().ok() == Some(Method::Delete));
        check!("BREW".parse::<Method>().is_err());
        check!("not a verb".parse::<Method>().is_err());
    }

    #[test]
    fn get_is_the_default() {
        check!(Method::default() == Method::Get);
    }
}
