//! [`Context`] over hyper requests.

use std::error::Error as StdError;
use std::sync::Arc;

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Request, Response, Uri};
use http_body::Body;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use janus_core::handler::{self, Handler};
use janus_core::{
    render_template, AdapterConfig, BufferedBody, Context, Error, NoBody, PathParams,
    PendingResponse, Rendered, RequestBody, RequestId,
};
use serde::Serialize;

/// Name reported by [`Context::engine`].
pub const ENGINE: &str = "hyper";

/// A request context backed by a buffered hyper request.
///
/// The body is read in full before the handler runs, so
/// [`Context::body`] decodes from memory and caches the result.
#[derive(Debug)]
pub struct HyperContext<B: RequestBody = NoBody> {
    request_id: RequestId,
    parts: Parts,
    config: Arc<AdapterConfig>,
    body: BufferedBody<B>,
    params: PathParams,
    response: PendingResponse,
}

impl<B: RequestBody> HyperContext<B> {
    /// Builds a context from request parts and an already collected body.
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

    /// Collects the request body and builds a context.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::PayloadTooLarge`] when the body exceeds the
    /// configured limit and [`Error::Transport`] when reading fails.
    pub async fn from_request<T>(
        request: Request<T>,
        params: PathParams,
        config: Arc<AdapterConfig>,
    ) -> Result<Self, Error>
    where
        T: Body,
        T::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let (parts, body) = request.into_parts();
        let raw = read_body(body, config.max_body_bytes()).await?;
        Ok(Self::from_parts(parts, raw, params, config))
    }

    /// Converts the pending response into a hyper response.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        self.response.into_parts().into_response()
    }
}

impl<B: RequestBody> Context for HyperContext<B> {
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

/// Collects a body, enforcing `limit`.
///
/// # Errors
///
/// Fails with [`Error::PayloadTooLarge`] past `limit` bytes and
/// [`Error::Transport`] if the body stream errors.
pub async fn read_body<T>(body: T, limit: usize) -> Result<Bytes, Error>
where
    T: Body,
    T::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(Error::PayloadTooLarge { limit })
        }
        Err(err) => Err(Error::transport(format!("failed to read request body: {err}"))),
    }
}

/// Runs `handler` for one request and returns the response.
///
/// A body that cannot be read is answered through the same error
/// serialization a handler failure uses.
pub async fn handle<B, H, T>(
    handler: &H,
    request: Request<T>,
    params: PathParams,
    config: Arc<AdapterConfig>,
) -> Response<Full<Bytes>>
where
    B: RequestBody,
    H: Handler<HyperContext<B>>,
    T: Body,
    T::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = request.into_parts();
    match read_body(body, config.max_body_bytes()).await {
        Ok(raw) => dispatch(handler, parts, raw, params, config),
        Err(err) => reject(parts, params, config, &err),
    }
}

/// Runs `handler` against a request whose body is already collected.
pub fn dispatch<B, H>(
    handler: &H,
    parts: Parts,
    raw: Bytes,
    params: PathParams,
    config: Arc<AdapterConfig>,
) -> Response<Full<Bytes>>
where
    B: RequestBody,
    H: Handler<HyperContext<B>>,
{
    let mut ctx = HyperContext::<B>::from_parts(parts, raw, params, config);
    handler::run(handler, &mut ctx);
    ctx.into_response()
}

/// Answers a request with an error, without running a handler.
pub fn reject(
    parts: Parts,
    params: PathParams,
    config: Arc<AdapterConfig>,
    err: &(dyn StdError + 'static),
) -> Response<Full<Bytes>> {
    let mut ctx = HyperContext::<NoBody>::from_parts(parts, Bytes::new(), params, config);
    ctx.serialize_error(err);
    ctx.into_response()
}
