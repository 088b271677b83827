//! The response an adapter is building for the current request.
//!
//! Handlers mutate a [`PendingResponse`] through their context. The adapter
//! turns it into its engine's native response once the handler returns.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;

/// Status, headers and body accumulated while a handler runs.
#[derive(Debug, Clone, Default)]
pub struct PendingResponse {
    status: Option<StatusCode>,
    default_status: Option<StatusCode>,
    headers: HeaderMap,
    body: Bytes,
}

/// Final parts of a [`PendingResponse`].
#[derive(Debug, Clone)]
pub struct ResponseParts {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl PendingResponse {
    /// Creates an empty response that falls back to `default_status`, or
    /// `200 OK` when none is given.
    #[must_use]
    pub fn new(default_status: Option<StatusCode>) -> Self {
        Self {
            default_status,
            ..Self::default()
        }
    }

    /// Returns the status explicitly set by the handler, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the status that will be sent.
    #[must_use]
    pub fn effective_status(&self) -> StatusCode {
        self.status
            .or(self.default_status)
            .unwrap_or(StatusCode::OK)
    }

    /// Sets the status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Replaces a header.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Adds a header value without replacing existing ones.
    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    /// Returns the body written so far.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Writes the body with its status and content type.
    pub fn write(&mut self, status: StatusCode, content_type: &'static str, body: Bytes) {
        self.status = Some(status);
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = body;
    }

    /// Drops any body and content type written by the handler.
    ///
    /// Other headers (cookies, redirects) are kept.
    pub fn reset_for_error(&mut self) {
        self.body = Bytes::new();
        self.headers.remove(header::CONTENT_TYPE);
        self.headers.remove(header::CONTENT_LENGTH);
    }

    /// Consumes the response.
    #[must_use]
    pub fn into_parts(self) -> ResponseParts {
        ResponseParts {
            status: self.effective_status(),
            headers: self.headers,
            body: self.body,
        }
    }
}

impl ResponseParts {
    /// Builds an `http::Response` with the given body type.
    pub fn into_response<B: From<Bytes>>(self) -> http::Response<B> {
        let mut response = http::Response::new(B::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_fallbacks() {
        assert_eq!(PendingResponse::new(None).effective_status(), StatusCode::OK);

        let mut response = PendingResponse::new(Some(StatusCode::CREATED));
        assert_eq!(response.effective_status(), StatusCode::CREATED);
        assert_eq!(response.status(), None);

        response.set_status(StatusCode::ACCEPTED);
        assert_eq!(response.effective_status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_write_sets_content_type() {
        let mut response = PendingResponse::new(None);
        response.write(StatusCode::OK, "application/json", Bytes::from_static(b"{}"));

        let parts = response.into_parts();
        assert_eq!(parts.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(&parts.body[..], b"{}");
    }

    #[test]
    fn test_reset_keeps_cookies() {
        let mut response = PendingResponse::new(None);
        response.append_header(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        response.write(StatusCode::OK, "text/plain", Bytes::from_static(b"partial"));

        response.reset_for_error();

        assert!(response.body().is_empty());
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert_eq!(response.headers()[header::SET_COOKIE], "a=1");
    }

    #[test]
    fn test_into_response() {
        let mut response = PendingResponse::new(None);
        response.write(StatusCode::NOT_FOUND, "text/plain", Bytes::from_static(b"gone"));

        let response: http::Response<Bytes> = response.into_parts().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(&response.body()[..], b"gone");
    }
}
