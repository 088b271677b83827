//! [`Context`] over axum requests.

use std::sync::Arc;

use axum::body::Body;
use axum::response::Response;
use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};
use janus_core::{
    render_template, AdapterConfig, BufferedBody, Context, Error, NoBody, PathParams,
    PendingResponse, Rendered, RequestBody, RequestId,
};
use serde::Serialize;

/// Name reported by [`Context::engine`].
pub const ENGINE: &str = "axum";

/// A request context backed by a buffered axum request.
#[derive(Debug)]
pub struct AxumContext<B: RequestBody = NoBody> {
    request_id: RequestId,
    parts: Parts,
    config: Arc<AdapterConfig>,
    body: BufferedBody<B>,
    params: PathParams,
    response: PendingResponse,
}

impl<B: RequestBody> AxumContext<B> {
    /// Builds a context from request parts and a collected body.
    pub fn from_parts(
        parts: Parts,
        raw: Bytes,
        params: PathParams,
        config: Arc<AdapterConfig>,
    ) -> Self {
        let body = BufferedBody::from_headers(raw, &parts.headers);
        let response = PendingResponse::new(config.default_status());
        Self {
            request_id: RequestId::new(),
            parts,
            config,
            body,
            params,
            response,
        }
    }

    /// Converts the pending response into an axum response.
    pub fn into_response(self) -> Response {
        self.response.into_parts().into_response::<Body>()
    }
}

impl<B: RequestBody> Context for AxumContext<B> {
    type Body = B;

    fn engine(&self) -> &'static str {
        ENGINE
    }

    fn request_id(&self) -> RequestId {
        self.request_id
    }

    fn method(&self) -> &Method {
        &self.parts.method
    }

    fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn body(&self) -> Result<&B, Error> {
        self.body.get()
    }

    fn path_params(&self) -> &PathParams {
        &self.params
    }

    fn response(&self) -> &PendingResponse {
        &self.response
    }

    fn response_mut(&mut self) -> &mut PendingResponse {
        &mut self.response
    }

    fn render<T: Serialize + ?Sized>(&mut self, name: &str, data: &T) -> Result<Rendered, Error> {
        render_template(self, name, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{header, Request, StatusCode};

    fn context(uri: &str) -> AxumContext {
        let (parts, ()) = Request::get(uri)
            .header(header::ACCEPT_LANGUAGE, "de-AT,de;q=0.9")
            .header(header::COOKIE, "theme=dark")
            .body(())
            .unwrap()
            .into_parts();
        let params = [("slug", "apfelstrudel")].into_iter().collect();
        AxumContext::from_parts(parts, Bytes::new(), params, Arc::default())
    }

    #[test]
    fn test_request_accessors() {
        let ctx = context("/recipes/apfelstrudel?servings=4");
        assert_eq!(ctx.engine(), "axum");
        assert_eq!(ctx.path_param("slug"), "apfelstrudel");
        assert_eq!(ctx.query_param_int("servings", 1).unwrap(), 4);
        assert_eq!(ctx.main_locale(), "de-AT");
        assert_eq!(ctx.main_lang(), "de");
        assert_eq!(ctx.cookie("theme").unwrap().value(), "dark");
        assert!(!ctx.has_cookie("admin"));
    }

    #[test]
    fn test_into_response() {
        let mut ctx = context("/");
        ctx.set_status(StatusCode::ACCEPTED);
        ctx.serialize(&[1, 2, 3]).unwrap();

        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}
