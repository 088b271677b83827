//! Axum handlers built from context handlers.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{FromRequestParts, MatchedPath, RawPathParams, Request};
use axum::response::Response;
use bytes::Bytes;
use http::request::Parts;
use http::StatusCode;
use http_body_util::LengthLimitError;
use janus_core::handler::{self as driver, Handler};
use janus_core::{AdapterConfig, Context, Error, NoBody, PathParams, PathPattern, RequestBody};

use crate::AxumContext;

/// An axum handler that runs a Janus handler on an [`AxumContext`].
pub struct JanusHandler<B, H> {
    handler: Arc<H>,
    config: Arc<AdapterConfig>,
    _body: PhantomData<fn() -> B>,
}

/// Wraps `handler` for use in an axum router.
///
/// Every request gets a fresh [`AxumContext`] sharing `config`.
pub fn handler<B, H>(config: Arc<AdapterConfig>, handler: H) -> JanusHandler<B, H>
where
    B: RequestBody,
    H: Handler<AxumContext<B>>,
{
    JanusHandler {
        handler: Arc::new(handler),
        config,
        _body: PhantomData,
    }
}

impl<B, H> JanusHandler<B, H> {
    /// Uses `status` when the handler sets none.
    #[must_use]
    pub fn with_default_status(mut self, status: StatusCode) -> Self {
        self.config = Arc::new(self.config.as_ref().clone().with_default_status(status));
        self
    }
}

impl<B, H> Clone for JanusHandler<B, H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
            _body: PhantomData,
        }
    }
}

impl<B, H> fmt::Debug for JanusHandler<B, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JanusHandler")
            .field("handler", &std::any::type_name::<H>())
            .field("config", &self.config)
            .finish()
    }
}

impl<B, H, S> axum::handler::Handler<(), S> for JanusHandler<B, H>
where
    B: RequestBody,
    H: Handler<AxumContext<B>>,
    S: Send + Sync + 'static,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send>>;

    fn call(self, request: Request, state: S) -> Self::Future {
        Box::pin(async move {
            let (mut parts, body) = request.into_parts();
            let config = self.config;
            let params = match path_params(&mut parts, &state).await {
                Ok(params) => params,
                Err(err) => return reject(parts, PathParams::new(), config, &err),
            };

            match read_body(body, config.max_body_bytes()).await {
                Ok(raw) => {
                    let mut ctx = AxumContext::<B>::from_parts(parts, raw, params, config);
                    driver::run(self.handler.as_ref(), &mut ctx);
                    ctx.into_response()
                }
                Err(err) => reject(parts, params, config, &err),
            }
        })
    }
}

fn reject(parts: Parts, params: PathParams, config: Arc<AdapterConfig>, err: &Error) -> Response {
    let mut ctx = AxumContext::<NoBody>::from_parts(parts, Bytes::new(), params, config);
    ctx.serialize_error(err);
    ctx.into_response()
}

async fn path_params<S: Send + Sync>(parts: &mut Parts, state: &S) -> Result<PathParams, Error> {
    match RawPathParams::from_request_parts(parts, state).await {
        Ok(raw) => Ok(raw.iter().collect()),
        Err(RawPathParamsRejection::MissingPathParams(_)) => {
            // Routes without captures have no parameters to read.
            tracing::trace!("no path parameters");
            Ok(PathParams::new())
        }
        Err(rejection) => Err(undecodable_param(parts, &rejection)),
    }
}

/// Names the segment axum refused, the same way the hyper adapter does.
fn undecodable_param(parts: &Parts, rejection: &RawPathParamsRejection) -> Error {
    let matched = parts
        .extensions
        .get::<MatchedPath>()
        .map(|matched| PathPattern::parse(&braced(matched.as_str())));
    match matched.and_then(|pattern| pattern.matches(parts.uri.path())) {
        Some(Err(err)) => err,
        _ => {
            tracing::debug!(%rejection, "path parameter rejected");
            Error::decode(rejection.body_text())
        }
    }
}

/// Rewrites axum's `:name` captures as `{name}`.
fn braced(route: &str) -> String {
    route
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{name}}}"),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, Error> {
    axum::body::to_bytes(body, limit).await.map_err(|err| {
        let too_large = StdError::source(&err).is_some_and(|source| source.is::<LengthLimitError>());
        if too_large {
            Error::PayloadTooLarge { limit }
        } else {
            Error::transport(format!("failed to read request body: {err}"))
        }
    })
}
