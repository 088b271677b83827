//! # Janus Hyper
//!
//! The Janus transport adapter for [hyper](https://hyper.rs) 1.x.
//!
//! - [`HyperContext`]: [`janus_core::Context`] over a buffered hyper request
//! - [`handle`]: run one handler for one request
//! - [`Server`]: accept loop, route list and graceful shutdown
//!
//! Handlers are written against the `Context` trait and registered with
//! the concrete context type:
//!
//! ```
//! use http::Method;
//! use janus_core::{Context, Data, Error};
//! use janus_hyper::{HyperContext, Server};
//!
//! fn ping<C: Context>(_: &mut C) -> Result<Data<&'static str>, Error> {
//!     Ok(Data("pong"))
//! }
//!
//! let server = Server::builder().build().route(Method::GET, "/ping", ping::<HyperContext>);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod server;

pub use context::{dispatch, handle, read_body, reject, HyperContext, ENGINE};
pub use server::{HttpResponse, Server, ServerBuilder, ServerError};
