//! Case-insensitive header maps.

use std::fmt;

/// Header map with case-insensitive names and last-write-wins semantics.
///
/// Insertion order is kept; replacing a header keeps its position but takes the
/// spelling of the latest write.
///
/// ```
/// use herald_core::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("content-type", "text/plain");
/// headers.insert("Content-Type", "application/json");
///
/// assert_eq!(headers.len(), 1);
/// assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// An empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// Set a header, replacing any value stored under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => {
                if let Some(entry) = self.entries.get_mut(index) {
                    *entry = (name, value);
                }
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Set a header only if it is not present yet.
    pub fn insert_default(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if !self.contains(&name) {
            self.entries.push((name, value.into()));
        }
    }

    /// Header value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|index| self.entries.get(index))
            .map(|(_, value)| value.as_str())
    }

    /// Whether a header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name)
            .map(|index| self.entries.remove(index).1)
    }

    /// Overlay `other` on top of this map: its values win on conflicting names.
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in &other.entries {
            self.insert(name.clone(), value.clone());
        }
    }

    /// A new map with `self` layered over `lower`.
    #[must_use]
    pub fn layered_over(&self, lower: &Self) -> Self {
        let mut layered = lower.clone();
        layered.merge(self);
        layered
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        headers.extend(iter);
        headers
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Headers {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_last_write_wins() {
        let mut headers = Headers::new();
        headers.insert("accept", "text/plain");
        headers.insert("X-Trace", "1");
        headers.insert("Accept", "application/json");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("ACCEPT"), Some("application/json"));
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![("Accept", "application/json"), ("X-Trace", "1")]
        );
    }

    #[test]
    fn insert_default_keeps_existing() {
        let mut headers: Headers = [("Accept", "application/xml")].into_iter().collect();
        headers.insert_default("accept", "application/json");
        headers.insert_default("Content-Type", "application/json");

        assert_eq!(headers.get("Accept"), Some("application/xml"));
        assert_eq!(headers.get("content-type"), Some("application/json"));
    }

    #[test]
    fn layering() {
        let computed: Headers = [("Accept", "computed"), ("Content-Type", "computed")]
            .into_iter()
            .collect();
        let defaults: Headers = [("accept", "defaults"), ("X-Api", "defaults")]
            .into_iter()
            .collect();
        let explicit: Headers = [("ACCEPT", "explicit")].into_iter().collect();

        let resolved = explicit.layered_over(&defaults.layered_over(&computed));

        assert_eq!(resolved.get("Accept"), Some("explicit"));
        assert_eq!(resolved.get("Content-Type"), Some("computed"));
        assert_eq!(resolved.get("X-Api"), Some("defaults"));
    }

    #[test]
    fn remove_header() {
        let mut headers: Headers = [("Accept", "text/plain")].into_iter().collect();
        assert_eq!(headers.remove("accept"), Some("text/plain".to_string()));
        assert!(headers.is_empty());
    }
}
