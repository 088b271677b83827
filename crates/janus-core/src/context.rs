//! The per-request context handlers are written against.
//!
//! [`Context`] is implemented once per transport engine. An implementation
//! supplies a handful of primitives (request parts, the buffered body, the
//! pending response) and inherits everything else, so parameter parsing,
//! negotiation and serialization behave the same on every engine.
//!
//! A context lives for one request. It is not `Sync` and must not be kept
//! after the handler returns.

use std::cell::OnceCell;
use std::error::Error as StdError;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cookie::{Cookie, Cookies, SetCookie};
use crate::error::ParamLocation;
use crate::params::{params_from, PathParams, QueryParams};
use crate::render::{RenderContext, TemplateRegistry};
use crate::reply::{Redirect, Rendered};
use crate::validation::{decode_and_validate, RequestBody};
use crate::{codec, error_response, locale, AdapterConfig, Error, Format, PendingResponse};

/// Unique identifier for a request.
///
/// Uses UUID v7, so ids sort by creation time.
///
/// ```
/// use janus_core::RequestId;
///
/// let first = RequestId::new();
/// let second = RequestId::new();
/// assert_ne!(first, second);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A fully read request body and its decoded value.
///
/// The raw bytes stay available, and the first successful decode is cached,
/// so repeated [`Context::body`] calls return the same value.
#[derive(Debug)]
pub struct BufferedBody<B> {
    raw: Bytes,
    content_type: Option<String>,
    decoded: OnceCell<B>,
}

impl<B: RequestBody> BufferedBody<B> {
    /// Wraps a collected body and the request's content type.
    #[must_use]
    pub fn new(raw: Bytes, content_type: Option<String>) -> Self {
        Self {
            raw,
            content_type,
            decoded: OnceCell::new(),
        }
    }

    /// Buffers the body of a request whose headers are `headers`.
    #[must_use]
    pub fn from_headers(raw: Bytes, headers: &HeaderMap) -> Self {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Self::new(raw, content_type)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Decodes, transforms and validates the body once.
    ///
    /// A failed attempt is not cached; the next call decodes again from the
    /// same bytes and fails the same way.
    pub fn get(&self) -> Result<&B, Error> {
        if let Some(body) = self.decoded.get() {
            return Ok(body);
        }
        let body = decode_and_validate::<B>(self.content_type.as_deref(), &self.raw)?;
        Ok(self.decoded.get_or_init(|| body))
    }
}

/// The capabilities available to a handler for one request.
///
/// Implementors provide the required methods; the provided ones must not be
/// overridden except [`render`](Self::render), which fails with
/// [`Error::NotImplemented`] until an adapter supports templates.
pub trait Context {
    /// Declared body shape.
    type Body: RequestBody;

    /// Name of the transport engine, used in logs and errors.
    fn engine(&self) -> &'static str;

    /// Id assigned to this request.
    fn request_id(&self) -> RequestId;

    /// Request method.
    fn method(&self) -> &Method;

    /// Request URI.
    fn uri(&self) -> &Uri;

    /// Request headers.
    fn headers(&self) -> &HeaderMap;

    /// Adapter configuration.
    fn config(&self) -> &AdapterConfig;

    /// Returns the decoded, transformed and validated body.
    ///
    /// Fails with [`Error::Decode`] on a malformed payload and with
    /// [`Error::Validation`] when a constraint is violated.
    fn body(&self) -> Result<&Self::Body, Error>;

    /// Path parameters captured by the route.
    fn path_params(&self) -> &PathParams;

    /// The response being built.
    fn response(&self) -> &PendingResponse;

    /// Mutable access to the response being built.
    fn response_mut(&mut self) -> &mut PendingResponse;

    /// Returns the body or aborts the request.
    ///
    /// # Panics
    ///
    /// Panics if the body cannot be decoded or validated. Use only where a
    /// failure is a programming error.
    fn must_body(&self) -> &Self::Body {
        match self.body() {
            Ok(body) => body,
            Err(err) => panic!(
                "must_body: {} {} has no usable body: {err}",
                self.method(),
                self.uri().path()
            ),
        }
    }

    /// Deserializes path and query parameters into `P`.
    fn params<P: DeserializeOwned>(&self) -> Result<P, Error> {
        params_from(self.path_params(), &QueryParams::parse(self.uri().query()))
    }

    /// Returns a path parameter, or `""` when absent.
    fn path_param(&self, name: &str) -> &str {
        self.path_params().get(name).unwrap_or_default()
    }

    /// Returns a path parameter as an integer.
    fn path_param_int(&self, name: &str) -> Result<i64, Error> {
        let raw = self.path_param(name);
        raw.parse()
            .map_err(|_| Error::param_type(ParamLocation::Path, name, raw, "integer"))
    }

    /// Returns the first query value for `name`, or `""` when absent.
    fn query_param(&self, name: &str) -> String {
        QueryParams::parse(self.uri().query())
            .get(name)
            .unwrap_or_default()
            .to_string()
    }

    /// Returns every query value for `name`.
    fn query_params(&self, name: &str) -> Vec<String> {
        QueryParams::parse(self.uri().query())
            .get_all(name)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Returns a query value as an integer, or `default` when absent or empty.
    fn query_param_int(&self, name: &str, default: i64) -> Result<i64, Error> {
        let raw = self.query_param(name);
        if raw.is_empty() {
            return Ok(default);
        }
        raw.parse()
            .map_err(|_| Error::param_type(ParamLocation::Query, name, raw, "integer"))
    }

    /// Returns a query value as a boolean, or `default` when absent or empty.
    ///
    /// Accepts `true`/`false` and `1`/`0`.
    fn query_param_bool(&self, name: &str, default: bool) -> Result<bool, Error> {
        let raw = self.query_param(name);
        match raw.to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(Error::param_type(ParamLocation::Query, name, raw, "boolean")),
        }
    }

    /// Returns a header value, or `""` when absent or not valid UTF-8.
    fn header(&self, name: &str) -> &str {
        self.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    /// Returns `true` if the header was sent.
    fn has_header(&self, name: &str) -> bool {
        self.headers().contains_key(name)
    }

    /// Returns every cookie sent with the request.
    fn cookies(&self) -> Cookies {
        Cookies::from_headers(self.headers())
    }

    /// Returns a cookie, failing with [`Error::NotFound`] when absent.
    fn cookie(&self, name: &str) -> Result<Cookie, Error> {
        self.cookies().require(name)
    }

    /// Returns `true` if the cookie was sent.
    fn has_cookie(&self, name: &str) -> bool {
        self.cookies().contains(name)
    }

    /// First locale of `Accept-Language` (e.g. `fr-FR`), or `""`.
    fn main_locale(&self) -> &str {
        locale::main_locale(self.headers().get(header::ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()))
    }

    /// Language of the first locale (e.g. `fr`), or `""`.
    fn main_lang(&self) -> &str {
        locale::main_lang(self.headers().get(header::ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()))
    }

    /// Format negotiated from the `Accept` header.
    fn format(&self) -> Format {
        let accept = self
            .headers()
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok());
        Format::negotiate(accept, self.config().default_format())
    }

    /// Status that will be sent: the one set, the route default, or `200`.
    fn status(&self) -> StatusCode {
        self.response().effective_status()
    }

    /// Sets the response status.
    fn set_status(&mut self, status: StatusCode) {
        self.response_mut().set_status(status);
    }

    /// Sets a response header.
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        let name = HeaderName::try_from(name)
            .map_err(|e| Error::internal_with_source(format!("invalid header name '{name}'"), e))?;
        let value = HeaderValue::try_from(value)
            .map_err(|e| Error::internal_with_source(format!("invalid value for '{name}'"), e))?;
        self.response_mut().set_header(name, value);
        Ok(())
    }

    /// Adds a `Set-Cookie` header.
    fn set_cookie(&mut self, cookie: SetCookie) -> Result<(), Error> {
        let value = cookie.to_header_value()?;
        self.response_mut().append_header(header::SET_COOKIE, value);
        Ok(())
    }

    /// Sets a redirect response.
    ///
    /// Fails when `status` is not a redirection status.
    fn redirect(&mut self, status: StatusCode, url: &str) -> Result<Redirect, Error> {
        if !status.is_redirection() {
            return Err(Error::internal(format!(
                "redirect requires a 3xx status, got {status}"
            )));
        }
        let location = HeaderValue::try_from(url)
            .map_err(|e| Error::internal_with_source(format!("invalid redirect target '{url}'"), e))?;
        let response = self.response_mut();
        response.set_status(status);
        response.set_header(header::LOCATION, location);
        Ok(Redirect)
    }

    /// Renders a registry template into the response.
    ///
    /// Adapters without template support keep this default, which fails with
    /// [`Error::NotImplemented`].
    fn render<T: Serialize + ?Sized>(&mut self, name: &str, data: &T) -> Result<Rendered, Error> {
        let _ = data;
        tracing::error!(
            engine = self.engine(),
            request_id = %self.request_id(),
            template = name,
            "render called on an adapter without template support"
        );
        Err(Error::not_implemented(self.engine(), "render"))
    }

    /// Request information for context-aware renderers.
    fn render_context(&self) -> RenderContext<'_> {
        RenderContext {
            templates: self.config().templates(),
            locale: self.main_locale(),
            request_id: self.request_id(),
        }
    }

    /// Writes `data` in the negotiated structured format with the current
    /// status.
    fn serialize<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<(), Error> {
        let format = self.format().structured();
        self.serialize_as(format, data)
    }

    /// Writes `data` in the given structured format with the current status.
    fn serialize_as<T: Serialize + ?Sized>(&mut self, format: Format, data: &T) -> Result<(), Error> {
        let format = format.structured();
        let body = codec::encode(format, data)?;
        let response = self.response_mut();
        let status = response.effective_status();
        response.write(status, format.content_type(), body);
        Ok(())
    }

    /// Writes an error response.
    ///
    /// The status comes from the first error in the source chain that
    /// carries one, defaulting to `500`. Anything already written to the body
    /// is discarded first, so exactly one response is produced.
    fn serialize_error(&mut self, err: &(dyn StdError + 'static)) {
        error_response::write_error(self, err);
    }
}

/// Renders a registry template into a context's response.
///
/// Adapters with template support implement [`Context::render`] with this.
pub fn render_template<C, T>(ctx: &mut C, name: &str, data: &T) -> Result<Rendered, Error>
where
    C: Context + ?Sized,
    T: Serialize + ?Sized,
{
    let html = render_with(ctx.config().templates(), name, data)?;
    let response = ctx.response_mut();
    let status = response.effective_status();
    response.write(status, Format::Html.content_type(), Bytes::from(html));
    Ok(Rendered)
}

fn render_with<T: Serialize + ?Sized>(
    templates: Option<&TemplateRegistry>,
    name: &str,
    data: &T,
) -> Result<String, Error> {
    templates
        .ok_or_else(|| Error::template(name, "no template registry configured"))?
        .render(name, data)
}
