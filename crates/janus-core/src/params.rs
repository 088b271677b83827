//! Path and query parameters.
//!
//! Engines that route requests themselves hand their captured segments over
//! as [`PathParams`]. The raw hyper adapter has no router, so
//! [`PathPattern`] provides the small amount of matching it needs.

use serde::de::DeserializeOwned;

use crate::{Error, ParamLocation};

/// Named path segments captured by a route, in declaration order.
///
/// ```
/// use janus_core::PathParams;
///
/// let mut params = PathParams::new();
/// params.push("id", "42");
///
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get("slug"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathParams {
    inner: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a captured segment.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A route path with `{name}` placeholders.
///
/// ```
/// use janus_core::PathPattern;
///
/// let pattern = PathPattern::parse("/recipes/{name}");
/// let params = pattern.matches("/recipes/pot%20au%20feu").unwrap().unwrap();
/// assert_eq!(params.get("name"), Some("pot au feu"));
/// assert!(pattern.matches("/recipes").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a pattern. Trailing slashes are ignored.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|segment| {
                segment
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                    .map_or_else(
                        || Segment::Literal(segment.to_string()),
                        |name| Segment::Param(name.to_string()),
                    )
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Matches a request path, returning the percent-decoded captures.
    ///
    /// Literals are compared against the raw path. `None` means the path
    /// does not match; `Some(Err(_))` means it matches but a captured
    /// segment does not decode to UTF-8.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Result<PathParams, Error>> {
        let mut captured = Vec::new();
        let mut parts = split_path(path);

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => captured.push((name.as_str(), part)),
            }
        }
        if parts.next().is_some() {
            return None;
        }

        Some(
            captured
                .into_iter()
                .map(|(name, raw)| decode_segment(name, raw).map(|value| (name, value)))
                .collect(),
        )
    }
}

/// Percent-decodes one captured path segment.
///
/// `+` is kept as is. A segment that does not decode to UTF-8 fails with
/// [`Error::ParamType`] naming the parameter.
///
/// ```
/// use janus_core::params::decode_segment;
///
/// assert_eq!(decode_segment("name", "caf%C3%A9").unwrap(), "café");
/// assert!(decode_segment("name", "%FF").is_err());
/// ```
pub fn decode_segment(name: &str, raw: &str) -> Result<String, Error> {
    urlencoding::decode(raw)
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| Error::param_type(ParamLocation::Path, name, raw, "UTF-8 text"))
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Decoded query string pairs, in request order.
///
/// ```
/// use janus_core::QueryParams;
///
/// let query = QueryParams::parse(Some("tag=vegan&tag=quick&q=soup%20pot"));
/// assert_eq!(query.get("q"), Some("soup pot"));
/// assert_eq!(query.get_all("tag"), vec!["vegan", "quick"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parses a raw query string. A malformed query yields no pairs.
    #[must_use]
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .and_then(|query| serde_urlencoded::from_str(query).ok())
            .unwrap_or_default();
        Self { pairs }
    }

    /// Returns the first value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value for `name`.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Deserializes path and query parameters into a declared shape.
///
/// A path parameter wins over a query parameter of the same name.
pub fn params_from<P: DeserializeOwned>(path: &PathParams, query: &QueryParams) -> Result<P, Error> {
    let mut merged: Vec<(&str, &str)> = path.iter().collect();
    merged.extend(
        query
            .iter()
            .filter(|(name, _)| path.get(name).is_none()),
    );

    let encoded = serde_urlencoded::to_string(&merged)
        .map_err(|e| Error::internal_with_source("failed to re-encode parameters", e))?;
    serde_urlencoded::from_str(&encoded).map_err(|e| Error::decode(format!("invalid parameters: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_pattern_literal_only() {
        let pattern = PathPattern::parse("/recipes/");
        assert!(pattern.matches("/recipes").unwrap().unwrap().is_empty());
        assert!(pattern.matches("/recipes/").is_some());
        assert!(pattern.matches("/ingredients").is_none());
    }

    #[test]
    fn test_pattern_multiple_params() {
        let pattern = PathPattern::parse("/users/{user}/recipes/{id}");
        let params = pattern.matches("/users/ana/recipes/7").unwrap().unwrap();
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("user", "ana"), ("id", "7")]);
    }

    #[test]
    fn test_pattern_decodes_captures() {
        let pattern = PathPattern::parse("/recipes/{name}");
        let params = pattern
            .matches("/recipes/caf%C3%A9%20au%20lait")
            .unwrap()
            .unwrap();
        assert_eq!(params.get("name"), Some("café au lait"));

        let params = pattern.matches("/recipes/a%2Fb+c").unwrap().unwrap();
        assert_eq!(params.get("name"), Some("a/b+c"));
    }

    #[test]
    fn test_pattern_invalid_utf8_capture() {
        let pattern = PathPattern::parse("/recipes/{name}");
        let err = pattern.matches("/recipes/%C3%28").unwrap().unwrap_err();
        assert!(matches!(
            err,
            Error::ParamType {
                location: ParamLocation::Path,
                ref name,
                ..
            } if name == "name"
        ));
    }

    #[test]
    fn test_pattern_literal_is_not_decoded() {
        let pattern = PathPattern::parse("/caf%C3%A9");
        assert!(pattern.matches("/caf%C3%A9").is_some());
        assert!(pattern.matches("/café").is_none());
    }

    #[test]
    fn test_pattern_rejects_extra_segments() {
        let pattern = PathPattern::parse("/recipes/{id}");
        assert!(pattern.matches("/recipes/7/steps").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::parse("/");
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/x").is_none());
    }

    #[test]
    fn test_query_missing_and_empty() {
        assert_eq!(QueryParams::parse(None).get("q"), None);
        assert_eq!(QueryParams::parse(Some("q=")).get("q"), Some(""));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Listing {
        id: u32,
        page: Option<u32>,
        sort: Option<String>,
    }

    #[test]
    fn test_params_from_merges_path_and_query() {
        let path: PathParams = [("id", "9")].into_iter().collect();
        let query = QueryParams::parse(Some("page=2&id=100"));

        let listing: Listing = params_from(&path, &query).unwrap();
        assert_eq!(
            listing,
            Listing {
                id: 9,
                page: Some(2),
                sort: None,
            }
        );
    }

    #[test]
    fn test_params_from_type_mismatch() {
        let path: PathParams = [("id", "nine")].into_iter().collect();
        let err = params_from::<Listing>(&path, &QueryParams::default()).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
