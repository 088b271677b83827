//! Test response wrapper.

use std::fmt;

use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use http_body_util::BodyExt;
use janus_core::ResponseParts;
use serde::de::DeserializeOwned;

use crate::TestError;

/// A fully buffered response with assertion helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Buffers an `http` response.
    pub async fn from_http<B>(response: http::Response<B>) -> Result<Self, TestError>
    where
        B: http_body::Body,
        B::Error: fmt::Display,
    {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();

        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// Creates a response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the first value of a header as a string.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Returns every value of a header.
    #[must_use]
    pub fn header_all(&self, name: impl AsRef<str>) -> Vec<&str> {
        self.headers
            .get_all(name.as_ref())
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Returns `Content-Type`.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes a JSON body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes a JSON body into a value.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Deserializes a YAML body.
    pub fn yaml<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_yaml::from_slice(&self.body)?)
    }

    /// Asserts the status.
    ///
    /// # Panics
    ///
    /// Panics on mismatch, printing the body.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {:?}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that a header has the given value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    #[track_caller]
    pub fn assert_header(&self, name: impl AsRef<str>, expected: &str) -> &Self {
        let name = name.as_ref();
        assert_eq!(
            self.header(name),
            Some(expected),
            "header {name} mismatch"
        );
        self
    }

    /// Asserts that the body contains `needle`.
    ///
    /// # Panics
    ///
    /// Panics if it does not.
    #[track_caller]
    pub fn assert_body_contains(&self, needle: &str) -> &Self {
        let body = String::from_utf8_lossy(&self.body);
        assert!(body.contains(needle), "body {body:?} does not contain {needle:?}");
        self
    }
}

impl From<ResponseParts> for TestResponse {
    fn from(parts: ResponseParts) -> Self {
        Self::new(parts.status, parts.headers, parts.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use serde_json::json;

    fn json_response() -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        TestResponse::new(StatusCode::CREATED, headers, Bytes::from_static(br#"{"id":7}"#))
    }

    #[test]
    fn test_accessors() {
        let response = json_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.json_value().unwrap(), json!({"id": 7}));
        assert_eq!(response.text().unwrap(), r#"{"id":7}"#);
    }

    #[test]
    fn test_assertions_chain() {
        json_response()
            .assert_status(StatusCode::CREATED)
            .assert_header("content-type", "application/json")
            .assert_body_contains("\"id\"");
    }

    #[test]
    #[should_panic(expected = "expected status 200 OK")]
    fn test_assert_status_panics() {
        json_response().assert_status(StatusCode::OK);
    }

    #[test]
    fn test_yaml_body() {
        let response = TestResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from_static(b"id: 7\n"));
        let value: serde_json::Value = response.yaml().unwrap();
        assert_eq!(value, json!({"id": 7}));
    }

    #[tokio::test]
    async fn test_from_http() {
        let response = http::Response::builder()
            .status(StatusCode::ACCEPTED)
            .body(Full::new(Bytes::from_static(b"queued")))
            .unwrap();
        let response = TestResponse::from_http(response).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.text().unwrap(), "queued");
    }
}
