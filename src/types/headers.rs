//! Case-preserving header map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// HTTP headers keyed by name.
///
/// Names keep the case they were inserted with, but lookups, replacement and
/// removal ignore ASCII case, so `Authorization` and `authorization` address
/// the same entry. Inserting a header that already exists under a different
/// case replaces it and adopts the new spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    fn key_of(&self, name: &str) -> Option<&String> {
        self.0.keys().find(|key| key.eq_ignore_ascii_case(name))
    }

    /// Look up a header value, ignoring the case of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.key_of(name)
            .and_then(|key| self.0.get(key))
            .map(String::as_str)
    }

    /// Whether a header with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.key_of(name).is_some()
    }

    /// Set a header, replacing any existing entry with the same name.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let previous = self.remove(&name);
        self.0.insert(name, value.into());
        previous
    }

    /// Add a value to a header, joining repeated values with `", "`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.key_of(&name).cloned() {
            Some(key) => {
                if let Some(existing) = self.0.get_mut(&key) {
                    existing.push_str(", ");
                    existing.push_str(&value);
                }
            }
            None => {
                self.0.insert(name, value);
            }
        }
    }

    /// Remove a header, ignoring the case of `name`.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let key = self.key_of(name)?.clone();
        self.0.remove(&key)
    }

    /// Copy every entry of `other` on top of this map.
    pub fn extend(&mut self, other: Headers) {
        for (name, value) in other.0 {
            self.insert(name, value);
        }
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let headers = Headers::from([("Content-Type", "application/json")]);
        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn test_insert_replaces_other_case() {
        let mut headers = Headers::from([("X-Custom", "one")]);
        let previous = headers.insert("x-custom", "two");

        assert_eq!(previous.as_deref(), Some("one"));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.iter().next(), Some(("x-custom", "two")));
    }

    #[test]
    fn test_append_joins_values() {
        let mut headers = Headers::new();
        headers.append("vary", "accept");
        headers.append("Vary", "origin");
        assert_eq!(headers.get("vary"), Some("accept, origin"));
    }

    #[test]
    fn test_remove() {
        let mut headers = Headers::from([("Authorization", "Bearer x")]);
        assert_eq!(headers.remove("authorization").as_deref(), Some("Bearer x"));
        assert!(headers.is_empty());
        assert!(headers.remove("authorization").is_none());
    }

    #[test]
    fn test_extend_overrides() {
        let mut base = Headers::from([("user-agent", "cmskit"), ("accept", "*/*")]);
        base.extend(Headers::from([("User-Agent", "custom")]));
        assert_eq!(base.get("user-agent"), Some("custom"));
        assert_eq!(base.len(), 2);
    }
}
