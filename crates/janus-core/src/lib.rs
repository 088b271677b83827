//! # Janus Core
//!
//! The request-context layer of Janus: one handler, written once, served by
//! any supported HTTP engine, answering in whatever format the caller asked
//! for.
//!
//! ## Overview
//!
//! - [`Context`]: the per-request capabilities a handler uses (body,
//!   parameters, headers, cookies, locale, response mutation, rendering,
//!   serialization)
//! - [`validation`]: decode, transform, validate
//! - [`DataOrTemplate`]: a result serialized as data or rendered as HTML,
//!   chosen by content negotiation
//! - [`error_response`]: errors to one status and one body
//! - [`handler`]: running a handler against a context
//!
//! Engine adapters live in `janus-hyper` and `janus-axum`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod codec;
pub mod context;
pub mod cookie;
pub mod error;
pub mod error_response;
pub mod handler;
pub mod locale;
pub mod negotiate;
pub mod params;
pub mod render;
pub mod reply;
pub mod response;
pub mod validation;

pub use adapter::{AdapterConfig, DEFAULT_MAX_BODY_BYTES};
pub use context::{render_template, BufferedBody, Context, RequestId};
pub use cookie::{Cookie, Cookies, SameSite, SetCookie};
pub use error::{
    Error, ErrorKind, ErrorWithStatus, FieldErrors, ParamLocation, Result, StatusError,
    TransformError,
};
pub use error_response::{ErrorDetail, ErrorEnvelope};
pub use handler::Handler;
pub use negotiate::Format;
pub use params::{PathParams, PathPattern, QueryParams};
pub use render::{
    CtxRenderer, Html, NamedTemplate, RenderContext, Renderer, Template, TemplateRegistry,
};
pub use reply::{data_or_html, Data, DataOrTemplate, Json, NoContent, Redirect, Rendered, Respond};
pub use response::{PendingResponse, ResponseParts};
pub use validation::{NoBody, RequestBody, Transform};
