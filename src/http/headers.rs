//! HTTP header multimap with case-insensitive name lookup.
//!
//! Header fields are order-preserving and may repeat per [RFC 9110 §5];
//! repeated keys (`Set-Cookie` being the canonical case) must survive every
//! hop through the bridge without being joined or overwritten.

use std::fmt;

/// A case-insensitive, multi-value HTTP header map.
///
/// Preserves insertion order and allows multiple values per header name,
/// matching the semantics of HTTP/1.1 header fields (RFC 9110 §5.3). This is
/// the header representation carried by both the immutable request and the
/// immutable response value.
///
/// # Examples
///
/// ```
/// use spahost::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.append("Content-Type", "text/html; charset=utf-8");
/// headers.append("Set-Cookie", "a=1");
/// headers.append("Set-Cookie", "b=2");
///
/// assert_eq!(headers.first("content-type"), Some("text/html; charset=utf-8"));
/// let cookies: Vec<_> = headers.all("set-cookie").collect();
/// assert_eq!(cookies, vec!["a=1", "b=2"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

/// A flattened header value as a streaming sink represents it: a key seen
/// once maps to a scalar, a key seen more than once maps to the ordered list
/// of all its values. Single-valued keys are never wrapped in a list.
///
/// The same shape describes inbound entries from hosts whose native header
/// collections hold arrays (one name, several values at once).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A key that carries exactly one value.
    Single(String),
    /// A key that carries two or more values, in arrival order.
    Multi(Vec<String>),
}

impl FieldValue {
    /// Iterates the individual values regardless of arity.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            FieldValue::Single(v) => std::slice::from_ref(v),
            FieldValue::Multi(vs) => vs.as_slice(),
        };
        slice.iter().map(String::as_str)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_owned())
    }
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header map with pre-allocated capacity for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends a header entry. Repeated names are preserved, never merged.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the first value for the given name (case-insensitive), or `None`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns an iterator over all values for the given name (case-insensitive).
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if the map contains at least one entry with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Returns the total number of header entries (not unique names).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no header entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Flattens the multimap into the representation a streaming sink writes:
    /// one `(name, FieldValue)` per distinct (case-insensitive) name, in
    /// first-seen order, keeping the first-seen spelling of the name. A name
    /// seen once stays [`FieldValue::Single`]; further occurrences upgrade it
    /// to [`FieldValue::Multi`] with values in arrival order.
    ///
    /// # Examples
    ///
    /// ```
    /// use spahost::http::{FieldValue, Headers};
    ///
    /// let mut headers = Headers::new();
    /// headers.append("set-cookie", "a=1");
    /// headers.append("content-type", "text/html");
    /// headers.append("set-cookie", "b=2");
    ///
    /// let flat = headers.flatten();
    /// assert_eq!(flat[0].1, FieldValue::Multi(vec!["a=1".into(), "b=2".into()]));
    /// assert_eq!(flat[1].1, FieldValue::Single("text/html".into()));
    /// ```
    pub fn flatten(&self) -> Vec<(String, FieldValue)> {
        let mut flat: Vec<(String, FieldValue)> = Vec::new();
        for (name, value) in &self.entries {
            match flat.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                Some((_, existing)) => match existing {
                    FieldValue::Single(prev) => {
                        let first = std::mem::take(prev);
                        *existing = FieldValue::Multi(vec![first, value.clone()]);
                    }
                    FieldValue::Multi(vs) => vs.push(value.clone()),
                },
                None => flat.push((name.clone(), FieldValue::Single(value.clone()))),
            }
        }
        flat
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_first() {
        let mut h = Headers::new();
        h.append("Content-Type", "text/plain");
        assert_eq!(h.first("content-type"), Some("text/plain"));
        assert_eq!(h.first("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(h.first("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn repeated_names_preserved_in_order() {
        let mut h = Headers::new();
        h.append("Set-Cookie", "a=1");
        h.append("Set-Cookie", "b=2");
        let vals: Vec<_> = h.all("set-cookie").collect();
        assert_eq!(vals, vec!["a=1", "b=2"]);
    }

    #[test]
    fn contains() {
        let mut h = Headers::new();
        h.append("Authorization", "Bearer token");
        assert!(h.contains("authorization"));
        assert!(!h.contains("x-missing"));
    }

    #[test]
    fn from_iterator() {
        let h: Headers = [("host", "example.com"), ("accept", "*/*")]
            .into_iter()
            .collect();
        assert_eq!(h.len(), 2);
        assert_eq!(h.first("Host"), Some("example.com"));
    }

    // ── flatten ──────────────────────────────────────────────────────────────

    #[test]
    fn flatten_single_valued_key_stays_scalar() {
        let mut h = Headers::new();
        h.append("content-type", "text/html");
        let flat = h.flatten();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].1, FieldValue::Single("text/html".to_owned()));
    }

    #[test]
    fn flatten_repeated_key_becomes_ordered_list() {
        let mut h = Headers::new();
        h.append("set-cookie", "a=1");
        h.append("set-cookie", "b=2");
        h.append("set-cookie", "c=3");
        let flat = h.flatten();
        assert_eq!(flat.len(), 1);
        assert_eq!(
            flat[0].1,
            FieldValue::Multi(vec!["a=1".into(), "b=2".into(), "c=3".into()])
        );
    }

    #[test]
    fn flatten_groups_case_insensitively_keeping_first_spelling() {
        let mut h = Headers::new();
        h.append("Set-Cookie", "a=1");
        h.append("set-cookie", "b=2");
        let flat = h.flatten();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].0, "Set-Cookie");
    }

    #[test]
    fn flatten_preserves_first_seen_key_order() {
        let mut h = Headers::new();
        h.append("b", "1");
        h.append("a", "2");
        h.append("b", "3");
        let keys: Vec<_> = h.flatten().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn flatten_round_trips_through_expansion() {
        // Re-expanding the flattened form must reproduce the same values per
        // key in the same order.
        let mut h = Headers::new();
        h.append("set-cookie", "a=1");
        h.append("x-one", "only");
        h.append("set-cookie", "b=2");

        let mut rebuilt = Headers::new();
        for (name, value) in h.flatten() {
            for v in value.values() {
                rebuilt.append(name.clone(), v);
            }
        }
        assert_eq!(
            rebuilt.all("set-cookie").collect::<Vec<_>>(),
            h.all("set-cookie").collect::<Vec<_>>()
        );
        assert_eq!(
            rebuilt.all("x-one").collect::<Vec<_>>(),
            h.all("x-one").collect::<Vec<_>>()
        );
    }

    #[test]
    fn field_value_values_iteration() {
        assert_eq!(
            FieldValue::Single("x".into()).values().collect::<Vec<_>>(),
            vec!["x"]
        );
        assert_eq!(
            FieldValue::Multi(vec!["x".into(), "y".into()])
                .values()
                .collect::<Vec<_>>(),
            vec!["x", "y"]
        );
    }
}
