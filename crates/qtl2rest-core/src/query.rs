//! Query-parameter mapping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping from query-parameter name to raw string value.
///
/// Names keep the position of their first occurrence. When a name repeats,
/// the last value wins.
///
/// # Example
///
/// ```
/// use qtl2rest_core::QueryParams;
///
/// let params = QueryParams::parse(Some("dataset=ds1&id=a&id=b"));
/// assert_eq!(params.get("id"), Some("b"));
/// assert_eq!(params.to_query_string(), "dataset=ds1&id=b");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(IndexMap<String, String>);

impl QueryParams {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw (still percent-encoded) query string.
    ///
    /// `None` and the empty string both yield an empty mapping.
    #[must_use]
    pub fn parse(query: Option<&str>) -> Self {
        let Some(query) = query.filter(|q| !q.is_empty()) else {
            return Self::new();
        };

        // Decoding into string pairs has no failure path for valid UTF-8 input.
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
        Self::from_pairs(pairs)
    }

    /// Builds a mapping from name/value pairs, applying last-wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (name, value) in pairs {
            params.insert(name, value);
        }
        params
    }

    /// Inserts a value, replacing any earlier value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns the raw value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns `true` if `name` was supplied (even with an empty value).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates over `(name, value)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no parameters were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the mapping as `k1=v1&k2=v2`, percent-encoding as needed.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(&self.0).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        assert!(QueryParams::parse(None).is_empty());
        assert!(QueryParams::parse(Some("")).is_empty());
    }

    #[test]
    fn test_parse_preserves_order() {
        let params = QueryParams::parse(Some("id=rs1&dataset=ds&chrom=2"));
        let names: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["id", "dataset", "chrom"]);
    }

    #[test]
    fn test_parse_last_wins_keeps_first_position() {
        let params = QueryParams::parse(Some("chrom=1&id=x&chrom=2"));
        assert_eq!(params.get("chrom"), Some("2"));
        assert_eq!(params.to_query_string(), "chrom=2&id=x");
    }

    #[test]
    fn test_parse_decodes_percent_and_plus() {
        let params = QueryParams::parse(Some("intcovar=sex%3Adiet&name=a+b"));
        assert_eq!(params.get("intcovar"), Some("sex:diet"));
        assert_eq!(params.get("name"), Some("a b"));
    }

    #[test]
    fn test_parse_flag_without_value() {
        let params = QueryParams::parse(Some("expand"));
        assert!(params.contains("expand"));
        assert_eq!(params.get("expand"), Some(""));
    }

    #[test]
    fn test_to_query_string_encodes() {
        let params = QueryParams::from_pairs([("id", "a b"), ("intcovar", "sex:diet")]);
        assert_eq!(params.to_query_string(), "id=a+b&intcovar=sex%3Adiet");
    }

    #[test]
    fn test_serializes_as_object() {
        let params = QueryParams::from_pairs([("id", "rs123"), ("dataset", "ds")]);
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"id":"rs123","dataset":"ds"}"#);
    }
}
