//! # Janus Test
//!
//! In-memory testing for Janus handlers.
//!
//! - [`TestRequest`] builds requests for any adapter
//! - [`TestResponse`] buffers responses and offers assertions
//! - [`MockContext`] runs a handler with no HTTP engine at all
//!
//! ```
//! use janus_core::{Context, Data, Error, NoBody};
//! use janus_test::{MockContext, TestRequest};
//!
//! fn lang<C: Context>(ctx: &mut C) -> Result<Data<String>, Error> {
//!     Ok(Data(ctx.main_lang().to_string()))
//! }
//!
//! let request = TestRequest::get("/")
//!     .accept_language("fr-CH, fr;q=0.9")
//!     .build()
//!     .unwrap();
//! let response = MockContext::<NoBody>::new(request).run(lang);
//! assert_eq!(response.json::<String>().unwrap(), "fr");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod mock;
mod request;
mod response;

pub use error::TestError;
pub use mock::MockContext;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
