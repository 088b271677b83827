//! A [`Context`] with no engine behind it.
//!
//! Handlers are ordinary functions, so they can be tested by calling them
//! on a [`MockContext`] without starting a server.

use std::sync::Arc;

use http::{HeaderMap, Method, Uri};
use janus_core::handler::{self, Handler};
use janus_core::{
    render_template, AdapterConfig, BufferedBody, Context, Error, NoBody, PathParams,
    PendingResponse, Rendered, RequestBody, RequestId,
};
use serde::Serialize;

use crate::{TestRequest, TestResponse};

/// An in-memory context for one request.
///
/// ```
/// use janus_core::{Context, Data, Error};
/// use janus_test::{MockContext, TestRequest};
///
/// fn greet<C: Context>(ctx: &mut C) -> Result<Data<String>, Error> {
///     Ok(Data(format!("hello {}", ctx.path_param("name"))))
/// }
///
/// let request = TestRequest::get("/greet/ada").build().unwrap();
/// let response = MockContext::<janus_core::NoBody>::new(request)
///     .with_path_param("name", "ada")
///     .run(greet);
/// assert_eq!(response.json::<String>().unwrap(), "hello ada");
/// ```
#[derive(Debug)]
pub struct MockContext<B: RequestBody = NoBody> {
    request_id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    config: Arc<AdapterConfig>,
    body: BufferedBody<B>,
    params: PathParams,
    response: PendingResponse,
}

impl<B: RequestBody> MockContext<B> {
    /// Creates a context with the default adapter configuration.
    pub fn new(request: TestRequest) -> Self {
        Self::with_config(request, Arc::new(AdapterConfig::new()))
    }

    /// Creates a context sharing `config`.
    pub fn with_config(request: TestRequest, config: Arc<AdapterConfig>) -> Self {
        let body = BufferedBody::from_headers(request.body, &request.headers);
        let response = PendingResponse::new(config.default_status());
        Self {
            request_id: RequestId::new(),
            method: request.method,
            uri: request.uri,
            headers: request.headers,
            config,
            body,
            params: PathParams::new(),
            response,
        }
    }

    /// Adds a path parameter as a router would.
    #[must_use]
    pub fn with_path_param(mut self, name: &str, value: &str) -> Self {
        self.params.push(name, value);
        self
    }

    /// Runs a handler and returns what it wrote.
    pub fn run<H: Handler<Self>>(mut self, handler: H) -> TestResponse {
        handler::run(&handler, &mut self);
        self.into_response()
    }

    /// Returns what has been written so far.
    pub fn into_response(self) -> TestResponse {
        self.response.into_parts().into()
    }
}

impl<B: RequestBody> Context for MockContext<B> {
    type Body = B;

    fn engine(&self) -> &'static str {
        "mock"
    }

    fn request_id(&self) -> RequestId {
        self.request_id
    }

    fn method(&self) -> &Method {
        &self.method
    }

    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
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
