//! # Janus Axum
//!
//! The Janus transport adapter for [axum](https://docs.rs/axum).
//!
//! Axum keeps its router and middleware; Janus supplies the context.
//! [`handler`] turns a context handler into an axum handler, taking path
//! parameters from the matched route:
//!
//! ```
//! use std::sync::Arc;
//!
//! use axum::routing::get;
//! use axum::Router;
//! use janus_axum::{handler, AxumContext};
//! use janus_core::{AdapterConfig, Context, Data, Error};
//!
//! fn show<C: Context>(ctx: &mut C) -> Result<Data<i64>, Error> {
//!     Ok(Data(ctx.path_param_int("id")?))
//! }
//!
//! let config = Arc::new(AdapterConfig::new());
//! let app: Router = Router::new().route("/recipes/:id", get(handler(config, show::<AxumContext>)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod handler;

pub use context::{AxumContext, ENGINE};
pub use handler::{handler, JanusHandler};
