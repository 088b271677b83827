//! A minimal HTTP/1.1 server over hyper.
//!
//! hyper has no router, so the server keeps an ordered list of
//! method + path pattern routes and hands matched requests to
//! [`HyperContext`] handlers.
//!
//! ```rust,no_run
//! use http::Method;
//! use janus_core::{Context, Data, Error};
//! use janus_hyper::{HyperContext, Server};
//!
//! fn hello<C: Context>(ctx: &mut C) -> Result<Data<String>, Error> {
//!     Ok(Data(format!("hello {}", ctx.path_param("name"))))
//! }
//!
//! # async fn run() -> Result<(), janus_hyper::ServerError> {
//! Server::builder()
//!     .http_addr("127.0.0.1:8080")
//!     .build()
//!     .route(Method::GET, "/hello/{name}", hello::<HyperContext>)
//!     .run()
//!     .await
//! # }
//! ```

use std::convert::Infallible;
use std::error::Error as StdError;
use std::future::Future;
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::request::Parts;
use http::{header, HeaderValue, Method, Request, Response, StatusCode};
use http_body::Body;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use janus_core::{
    AdapterConfig, Error, Handler, PathParams, PathPattern, RequestBody, StatusError,
};
use thiserror::Error as ThisError;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::context::{dispatch, read_body, reject, HyperContext};

/// Response type produced by the server.
pub type HttpResponse = Response<Full<Bytes>>;

/// Server startup and I/O errors.
#[derive(Debug, ThisError)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    /// Binding the listener failed.
    #[error("failed to bind {addr}")]
    Bind {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Listener I/O failed.
    #[error("listener I/O error")]
    Io(#[from] std::io::Error),
}

/// Object-safe wrapper over a typed handler.
trait Endpoint: Send + Sync {
    fn call(
        &self,
        parts: Parts,
        raw: Bytes,
        params: PathParams,
        config: Arc<AdapterConfig>,
    ) -> HttpResponse;
}

struct TypedEndpoint<B, H> {
    handler: H,
    _body: PhantomData<fn() -> B>,
}

impl<B, H> Endpoint for TypedEndpoint<B, H>
where
    B: RequestBody,
    H: Handler<HyperContext<B>>,
{
    fn call(
        &self,
        parts: Parts,
        raw: Bytes,
        params: PathParams,
        config: Arc<AdapterConfig>,
    ) -> HttpResponse {
        dispatch(&self.handler, parts, raw, params, config)
    }
}

struct Route {
    method: Method,
    pattern: PathPattern,
    config: Arc<AdapterConfig>,
    endpoint: Box<dyn Endpoint>,
}

/// Outcome of matching a request against the route list.
enum Matched<'a> {
    Found(&'a Route, Result<PathParams, Error>),
    WrongMethod(Vec<Method>),
    Missing,
}

/// The Janus server for hyper.
pub struct Server {
    http_addr: String,
    config: Arc<AdapterConfig>,
    routes: Vec<Route>,
    request_timeout: Duration,
    shutdown_timeout: Duration,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let routes: Vec<String> = self
            .routes
            .iter()
            .map(|route| format!("{} {}", route.method, route.pattern.as_str()))
            .collect();
        f.debug_struct("Server")
            .field("http_addr", &self.http_addr)
            .field("routes", &routes)
            .field("request_timeout", &self.request_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Returns the configured bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the shutdown grace period.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Adds a route. Routes are matched in registration order.
    ///
    /// `path` uses `{name}` segments for parameters.
    #[must_use]
    pub fn route<B, H>(self, method: Method, path: &str, handler: H) -> Self
    where
        B: RequestBody,
        H: Handler<HyperContext<B>>,
    {
        let config = Arc::clone(&self.config);
        self.push_route(method, path, config, handler)
    }

    /// Adds a route whose responses default to `status` when the handler
    /// sets none, e.g. `201 Created` for a create endpoint.
    #[must_use]
    pub fn route_with_status<B, H>(
        self,
        method: Method,
        path: &str,
        status: StatusCode,
        handler: H,
    ) -> Self
    where
        B: RequestBody,
        H: Handler<HyperContext<B>>,
    {
        let config = Arc::new(self.config.as_ref().clone().with_default_status(status));
        self.push_route(method, path, config, handler)
    }

    fn push_route<B, H>(
        mut self,
        method: Method,
        path: &str,
        config: Arc<AdapterConfig>,
        handler: H,
    ) -> Self
    where
        B: RequestBody,
        H: Handler<HyperContext<B>>,
    {
        self.routes.push(Route {
            method,
            pattern: PathPattern::parse(path),
            config,
            endpoint: Box::new(TypedEndpoint {
                handler,
                _body: PhantomData,
            }),
        });
        self
    }

    fn find(&self, method: &Method, path: &str) -> Matched<'_> {
        let mut allowed = Vec::new();
        for route in &self.routes {
            if let Some(params) = route.pattern.matches(path) {
                if route.method == *method {
                    return Matched::Found(route, params);
                }
                allowed.push(route.method.clone());
            }
        }
        if allowed.is_empty() {
            Matched::Missing
        } else {
            Matched::WrongMethod(allowed)
        }
    }

    /// Routes one request and returns its response.
    ///
    /// Works on any body type, so requests can be dispatched without a
    /// socket.
    pub async fn dispatch<T>(&self, request: Request<T>) -> HttpResponse
    where
        T: Body,
        T::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let (parts, body) = request.into_parts();
        let (route, params) = match self.find(&parts.method, parts.uri.path()) {
            Matched::Found(route, Ok(params)) => (route, params),
            Matched::Found(route, Err(err)) => {
                return reject(parts, PathParams::new(), Arc::clone(&route.config), &err);
            }
            Matched::WrongMethod(allowed) => {
                let err = StatusError::new(
                    StatusCode::METHOD_NOT_ALLOWED,
                    format!("method {} not allowed", parts.method),
                );
                let mut response =
                    reject(parts, PathParams::new(), Arc::clone(&self.config), &err);
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                return response;
            }
            Matched::Missing => {
                let err = Error::not_found(format!("no route for {}", parts.uri.path()));
                return reject(parts, PathParams::new(), Arc::clone(&self.config), &err);
            }
        };

        let config = Arc::clone(&route.config);
        let raw = tokio::time::timeout(
            self.request_timeout,
            read_body(body, config.max_body_bytes()),
        )
        .await;

        match raw {
            Ok(Ok(raw)) => route.endpoint.call(parts, raw, params, config),
            Ok(Err(err)) => reject(parts, params, config, &err),
            Err(_) => {
                tracing::warn!(path = parts.uri.path(), "request body timed out");
                let err = StatusError::new(StatusCode::REQUEST_TIMEOUT, "request body timed out");
                reject(parts, params, config, &err)
            }
        }
    }

    /// Binds the configured address and serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Fails if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for ctrl-c");
            }
        })
        .await
    }

    /// Binds the configured address and serves until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Fails if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let addr: SocketAddr = self
            .http_addr
            .parse()
            .map_err(|_| ServerError::InvalidAddress(self.http_addr.clone()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` completes, then
    /// waits up to the shutdown timeout for open connections to finish.
    ///
    /// # Errors
    ///
    /// Fails if the listener's local address cannot be read.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, routes = self.routes.len(), "server listening");

        let server = Arc::new(self);
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut connections = JoinSet::new();
        let mut shutdown = pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let stop = stop_rx.clone();
                        connections.spawn(async move {
                            if let Err(err) = server.serve_connection(stream, stop).await {
                                tracing::debug!(remote = %remote_addr, error = %err, "connection error");
                            }
                        });
                    }
                    Err(err) => tracing::error!(error = %err, "failed to accept connection"),
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        let _ = stop_tx.send(true);
        let open = connections.len();
        let drained = tokio::time::timeout(server.shutdown_timeout, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(open, "shutdown timeout reached, aborting connections");
            connections.abort_all();
        }
        tracing::info!("server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        mut stop: watch::Receiver<bool>,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(&self);
        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.dispatch(request).await) }
        });

        let mut conn = pin!(http1::Builder::new().serve_connection(TokioIo::new(stream), service));
        tokio::select! {
            result = conn.as_mut() => return result,
            _ = stop.changed() => {}
        }
        conn.as_mut().graceful_shutdown();
        conn.await
    }
}

/// Builder for [`Server`].
#[derive(Debug)]
pub struct ServerBuilder {
    http_addr: String,
    config: AdapterConfig,
    request_timeout: Duration,
    shutdown_timeout: Duration,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            config: AdapterConfig::default(),
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerBuilder {
    /// Sets the bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    /// Sets the adapter configuration shared by every route.
    #[must_use]
    pub fn adapter_config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets how long reading a request body may take.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets how long open connections may take to finish on shutdown.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Builds the server with no routes.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            http_addr: self.http_addr,
            config: Arc::new(self.config),
            routes: Vec::new(),
            request_timeout: self.request_timeout,
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}
