//! Handlers and the code that runs them.
//!
//! A handler is a plain function from a context to a result:
//!
//! ```
//! use janus_core::{Context, Data, Error};
//!
//! fn hello<C: Context>(ctx: &mut C) -> Result<Data<String>, Error> {
//!     let name = ctx.query_param("name");
//!     Ok(Data(format!("hello {name}")))
//! }
//! ```
//!
//! Written against the [`Context`] trait, the same function runs on every
//! transport adapter. The adapter picks the concrete context type when it
//! registers the handler, e.g. `hello::<HyperContext>`.

use crate::{Context, Respond};

/// A request handler for contexts of type `C`.
///
/// Implemented for every `Fn(&mut C) -> Result<R, E>` where `R` can be
/// written as a response and `E` converts into [`anyhow::Error`].
pub trait Handler<C: Context>: Send + Sync + 'static {
    /// The success value.
    type Output: Respond;

    /// Runs the handler.
    fn call(&self, ctx: &mut C) -> Result<Self::Output, anyhow::Error>;
}

impl<C, F, R, E> Handler<C> for F
where
    C: Context,
    F: Fn(&mut C) -> Result<R, E> + Send + Sync + 'static,
    R: Respond,
    E: Into<anyhow::Error>,
{
    type Output = R;

    fn call(&self, ctx: &mut C) -> Result<R, anyhow::Error> {
        self(ctx).map_err(Into::into)
    }
}

/// Runs a handler and writes its outcome into the context.
pub fn run<C: Context, H: Handler<C>>(handler: &H, ctx: &mut C) {
    tracing::debug!(
        engine = ctx.engine(),
        request_id = %ctx.request_id(),
        method = %ctx.method(),
        path = ctx.uri().path(),
        "handling request"
    );
    let outcome = handler.call(ctx);
    finish(ctx, outcome);
}

/// Writes a handler outcome into the context.
///
/// Success goes through [`Respond`]; a failure, including one raised while
/// responding, goes through [`Context::serialize_error`]. Either way the
/// response is written once.
pub fn finish<C: Context, R: Respond>(ctx: &mut C, outcome: Result<R, anyhow::Error>) {
    match outcome {
        Ok(reply) => {
            if let Err(err) = reply.respond(ctx) {
                ctx.serialize_error(&err);
            }
        }
        Err(err) => ctx.serialize_error(err.as_ref()),
    }
}
