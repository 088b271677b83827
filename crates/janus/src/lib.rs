//! # Janus
//!
//! Write a handler once against [`Context`](core::Context), serve it from
//! hyper or axum, and let content negotiation decide whether its result is
//! serialized as JSON, XML, YAML or text, or rendered as an HTML template.
//!
//! ```rust,no_run
//! use http::Method;
//! use janus::prelude::*;
//!
//! fn hello<C: Context>(ctx: &mut C) -> Result<Data<String>, Error> {
//!     Ok(Data(format!("hello {}", ctx.query_param("name"))))
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("janus.toml")?
//!     .with_env_prefix("JANUS")
//!     .load()?;
//! janus::init_logging(&config)?;
//!
//! janus::hyper_server(&config)?
//!     .build()
//!     .route(Method::GET, "/hello", hello::<HyperContext>)
//!     .run()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - [`core`]: the context trait, validation, negotiation, `DataOrTemplate`
//!   and error serialization
//! - [`hyper`]: adapter and minimal server for hyper
//! - [`axum`]: adapter for axum routers
//! - [`config`]: layered configuration
//! - [`telemetry`]: logging setup

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bootstrap;

pub use bootstrap::{hyper_server, init_logging};

pub use janus_axum as axum;
pub use janus_config as config;
pub use janus_core as core;
pub use janus_hyper as hyper;
pub use janus_telemetry as telemetry;

/// Common imports for writing handlers.
pub mod prelude {
    pub use janus_axum::{handler, AxumContext};
    pub use janus_config::{ConfigLoader, JanusConfig};
    pub use janus_core::{
        data_or_html, AdapterConfig, Context, Data, DataOrTemplate, Error, Format, Html, Json,
        NamedTemplate, NoBody, NoContent, Redirect, Rendered, SetCookie, StatusError,
        TemplateRegistry, Transform,
    };
    pub use janus_hyper::{HyperContext, Server};
}
