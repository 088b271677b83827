//! Handler return values.
//!
//! Anything a handler returns implements [`Respond`], which writes it into
//! the context's pending response. The interesting one is
//! [`DataOrTemplate`]: the handler hands back both a data value and a way to
//! render it as HTML, and the caller's `Accept` header picks one.
//!
//! # Example
//!
//! ```
//! use janus_core::reply::{data_or_html, DataOrTemplate};
//! use janus_core::render::NamedTemplate;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Recipe {
//!     name: String,
//! }
//!
//! fn show() -> Result<DataOrTemplate<Recipe>, janus_core::Error> {
//!     let recipe = Recipe { name: "Soup".into() };
//!     let page = NamedTemplate::new("recipes/show", &recipe)?;
//!     Ok(data_or_html(recipe, page))
//! }
//! # show().unwrap();
//! ```

use std::fmt;
use std::io;

use bytes::Bytes;
use http::StatusCode;
use serde::{Serialize, Serializer};

use crate::render::{Html, RenderContext, Template};
use crate::{codec, Context, Error, Format};

/// A value a handler can return.
pub trait Respond {
    /// Writes `self` into the context's response.
    fn respond<C: Context>(self, ctx: &mut C) -> Result<(), Error>;
}

/// Data written in the negotiated structured format.
///
/// When the caller asks for HTML, the data is written as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data<T>(pub T);

impl<T: Serialize> Respond for Data<T> {
    fn respond<C: Context>(self, ctx: &mut C) -> Result<(), Error> {
        ctx.serialize(&self.0)
    }
}

/// Data always written as JSON, whatever the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize> Respond for Json<T> {
    fn respond<C: Context>(self, ctx: &mut C) -> Result<(), Error> {
        ctx.serialize_as(Format::Json, &self.0)
    }
}

impl Respond for Html {
    fn respond<C: Context>(self, ctx: &mut C) -> Result<(), Error> {
        write_html(ctx, Bytes::from(self.0));
        Ok(())
    }
}

impl Respond for String {
    fn respond<C: Context>(self, ctx: &mut C) -> Result<(), Error> {
        let response = ctx.response_mut();
        let status = response.effective_status();
        response.write(status, Format::Text.content_type(), Bytes::from(self));
        Ok(())
    }
}

impl Respond for &'static str {
    fn respond<C: Context>(self, ctx: &mut C) -> Result<(), Error> {
        self.to_string().respond(ctx)
    }
}

/// Marker returned by [`Context::redirect`]; the response is already set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect;

impl Respond for Redirect {
    fn respond<C: Context>(self, _ctx: &mut C) -> Result<(), Error> {
        Ok(())
    }
}

/// Marker returned by [`Context::render`]; the page is already written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rendered;

impl Respond for Rendered {
    fn respond<C: Context>(self, _ctx: &mut C) -> Result<(), Error> {
        Ok(())
    }
}

/// `204 No Content`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoContent;

impl Respond for NoContent {
    fn respond<C: Context>(self, ctx: &mut C) -> Result<(), Error> {
        ctx.set_status(StatusCode::NO_CONTENT);
        Ok(())
    }
}

impl<R: Respond> Respond for (StatusCode, R) {
    fn respond<C: Context>(self, ctx: &mut C) -> Result<(), Error> {
        ctx.set_status(self.0);
        self.1.respond(ctx)
    }
}

/// A result that is either serialized as data or rendered as HTML.
///
/// Exactly one of the two paths runs per response. Asking for HTML when no
/// template was supplied is a programming error and panics.
pub struct DataOrTemplate<T> {
    /// Value used by the data path.
    pub data: T,
    /// Delegate used by the template path.
    pub template: Option<Template>,
}

/// Pairs data with its HTML rendering.
pub fn data_or_html<T>(data: T, template: impl Into<Template>) -> DataOrTemplate<T> {
    DataOrTemplate::new(data, Some(template.into()))
}

impl<T> DataOrTemplate<T> {
    /// Creates a result from its parts.
    pub fn new(data: T, template: Option<Template>) -> Self {
        Self { data, template }
    }

    /// Renders the template path.
    ///
    /// # Panics
    ///
    /// Panics when no template was supplied.
    pub fn render(&self, ctx: &RenderContext<'_>, out: &mut dyn io::Write) -> Result<(), Error> {
        match &self.template {
            Some(template) => template.render(ctx, out),
            None => panic!("DataOrTemplate rendered as HTML without a template"),
        }
    }
}

impl<T: Serialize> DataOrTemplate<T> {
    /// Encodes the data path in a structured format.
    pub fn encode(&self, format: Format) -> Result<Bytes, Error> {
        codec::encode(format, &self.data)
    }
}

impl<T: Serialize> Respond for DataOrTemplate<T> {
    fn respond<C: Context>(self, ctx: &mut C) -> Result<(), Error> {
        match ctx.format() {
            Format::Html => {
                let mut page = Vec::new();
                self.render(&ctx.render_context(), &mut page)?;
                write_html(ctx, Bytes::from(page));
                Ok(())
            }
            _ => ctx.serialize(&self.data),
        }
    }
}

impl<T: Serialize> Serialize for DataOrTemplate<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

impl<T: fmt::Display> fmt::Display for DataOrTemplate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.data.fmt(f)
    }
}

impl<T: fmt::Debug> fmt::Debug for DataOrTemplate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataOrTemplate")
            .field("data", &self.data)
            .field("template", &self.template)
            .finish()
    }
}

fn write_html<C: Context>(ctx: &mut C, page: Bytes) {
    let response = ctx.response_mut();
    let status = response.effective_status();
    response.write(status, Format::Html.content_type(), page);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CtxRenderer, Renderer};
    use crate::RequestId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Serialize)]
    struct Recipe {
        name: String,
        minutes: u32,
    }

    fn soup() -> Recipe {
        Recipe {
            name: "Soup".to_string(),
            minutes: 20,
        }
    }

    struct CountingPage(Arc<AtomicUsize>);

    impl Renderer for CountingPage {
        fn render(&self, out: &mut dyn io::Write) -> Result<(), Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            out.write_all(b"<p>page</p>")
                .map_err(|e| Error::internal_with_source("write", e))
        }
    }

    /// Data whose serializer must never run.
    struct Untouchable;

    impl Serialize for Untouchable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            panic!("data path used during template rendering");
        }
    }

    struct Lang;

    impl CtxRenderer for Lang {
        fn render(&self, ctx: &RenderContext<'_>, out: &mut dyn io::Write) -> Result<(), Error> {
            out.write_all(ctx.locale.as_bytes())
                .map_err(|e| Error::internal_with_source("write", e))
        }
    }

    fn render_ctx() -> RenderContext<'static> {
        RenderContext {
            templates: None,
            locale: "it-IT",
            request_id: RequestId::new(),
        }
    }

    #[test]
    fn test_data_path_has_exactly_the_data_fields() {
        let counter = Arc::new(AtomicUsize::new(0));
        let result = data_or_html(soup(), Template::plain(CountingPage(counter.clone())));

        let json: serde_json::Value =
            serde_json::from_slice(&result.encode(Format::Json).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Soup", "minutes": 20 }));

        let yaml = result.encode(Format::Yaml).unwrap();
        assert!(std::str::from_utf8(&yaml).unwrap().contains("minutes: 20"));

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_template_path_never_serializes_data() {
        let counter = Arc::new(AtomicUsize::new(0));
        let result = data_or_html(Untouchable, Template::plain(CountingPage(counter.clone())));

        let mut out = Vec::new();
        result.render(&render_ctx(), &mut out).unwrap();

        assert_eq!(out, b"<p>page</p>");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_context_renderer() {
        let result = data_or_html(soup(), Template::with_context(Lang));
        let mut out = Vec::new();
        result.render(&render_ctx(), &mut out).unwrap();
        assert_eq!(out, b"it-IT");
    }

    #[test]
    #[should_panic(expected = "DataOrTemplate rendered as HTML without a template")]
    fn test_render_without_template_panics() {
        let result = DataOrTemplate::new(soup(), None);
        let _ = result.render(&render_ctx(), &mut Vec::new());
    }

    #[test]
    fn test_serialize_and_display_delegate_to_data() {
        let result = DataOrTemplate::new(42, None);
        assert_eq!(serde_json::to_string(&result).unwrap(), "42");
        assert_eq!(result.to_string(), "42");
        assert_eq!(&result.encode(Format::Text).unwrap()[..], b"42");
    }
}
