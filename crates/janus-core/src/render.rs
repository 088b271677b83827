//! HTML rendering.
//!
//! Templates live in a [`TemplateRegistry`] built once at startup and shared
//! read-only between requests. A handler result that wants to be renderable
//! carries a [`Template`], which is either context-aware ([`CtxRenderer`]) or
//! self-contained ([`Renderer`]).

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use handlebars::Handlebars;
use serde::Serialize;

use crate::{Error, RequestId};

/// Request information available to a [`CtxRenderer`].
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Registry configured on the adapter, if any.
    pub templates: Option<&'a TemplateRegistry>,
    /// First locale of `Accept-Language`, or `""`.
    pub locale: &'a str,
    /// Id of the request being rendered.
    pub request_id: RequestId,
}

/// A renderer that needs nothing from the request.
pub trait Renderer {
    /// Writes the rendered document to `out`.
    fn render(&self, out: &mut dyn io::Write) -> Result<(), Error>;
}

/// A renderer that reads request information, such as the template
/// registry or the caller's locale.
pub trait CtxRenderer {
    /// Writes the rendered document to `out`.
    fn render(&self, ctx: &RenderContext<'_>, out: &mut dyn io::Write) -> Result<(), Error>;
}

/// A type-erased render delegate.
pub enum Template {
    /// Delegate rendered with request information.
    WithContext(Box<dyn CtxRenderer + Send + Sync>),
    /// Delegate rendered on its own.
    Plain(Box<dyn Renderer + Send + Sync>),
}

impl Template {
    /// Wraps a context-aware renderer.
    pub fn with_context(renderer: impl CtxRenderer + Send + Sync + 'static) -> Self {
        Self::WithContext(Box::new(renderer))
    }

    /// Wraps a self-contained renderer.
    pub fn plain(renderer: impl Renderer + Send + Sync + 'static) -> Self {
        Self::Plain(Box::new(renderer))
    }

    /// Renders into `out` through whichever capability the delegate has.
    pub fn render(&self, ctx: &RenderContext<'_>, out: &mut dyn io::Write) -> Result<(), Error> {
        match self {
            Self::WithContext(renderer) => renderer.render(ctx, out),
            Self::Plain(renderer) => renderer.render(out),
        }
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WithContext(_) => f.write_str("Template::WithContext(..)"),
            Self::Plain(_) => f.write_str("Template::Plain(..)"),
        }
    }
}

/// An already rendered HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Html(pub String);

impl Renderer for Html {
    fn render(&self, out: &mut dyn io::Write) -> Result<(), Error> {
        out.write_all(self.0.as_bytes())
            .map_err(|e| Error::internal_with_source("failed to write HTML", e))
    }
}

impl From<Html> for Template {
    fn from(html: Html) -> Self {
        Self::plain(html)
    }
}

/// A registry template paired with the data to render it with.
///
/// ```
/// use janus_core::render::{NamedTemplate, RenderContext, Template, TemplateRegistry};
/// use janus_core::RequestId;
///
/// let registry = TemplateRegistry::builder()
///     .template("recipe", "<h1>{{name}}</h1>")
///     .unwrap()
///     .build();
///
/// let template = Template::from(NamedTemplate::new("recipe", &serde_json::json!({ "name": "Soup" })).unwrap());
/// let ctx = RenderContext { templates: Some(&registry), locale: "", request_id: RequestId::new() };
///
/// let mut out = Vec::new();
/// template.render(&ctx, &mut out).unwrap();
/// assert_eq!(out, b"<h1>Soup</h1>");
/// ```
#[derive(Debug, Clone)]
pub struct NamedTemplate {
    name: String,
    data: serde_json::Value,
}

impl NamedTemplate {
    /// Captures `data` for rendering `name` later.
    pub fn new<T: Serialize + ?Sized>(name: impl Into<String>, data: &T) -> Result<Self, Error> {
        let name = name.into();
        let data = serde_json::to_value(data)
            .map_err(|e| Error::template(name.clone(), e.to_string()))?;
        Ok(Self { name, data })
    }

    /// Returns the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CtxRenderer for NamedTemplate {
    fn render(&self, ctx: &RenderContext<'_>, out: &mut dyn io::Write) -> Result<(), Error> {
        let registry = ctx
            .templates
            .ok_or_else(|| Error::template(self.name.clone(), "no template registry configured"))?;
        registry.render_to_write(&self.name, &self.data, out)
    }
}

impl From<NamedTemplate> for Template {
    fn from(template: NamedTemplate) -> Self {
        Self::with_context(template)
    }
}

/// Named handlebars templates, immutable once built.
pub struct TemplateRegistry {
    handlebars: Handlebars<'static>,
}

impl TemplateRegistry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> TemplateRegistryBuilder {
        TemplateRegistryBuilder::new()
    }

    /// Returns `true` if a template with this name is registered.
    #[must_use]
    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    /// Returns the registered template names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .handlebars
            .get_templates()
            .keys()
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    /// Renders a template to a string.
    pub fn render<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<String, Error> {
        self.ensure_registered(name)?;
        self.handlebars
            .render(name, &data)
            .map_err(|e| Error::template(name, e.to_string()))
    }

    /// Renders a template into a writer.
    pub fn render_to_write<T: Serialize + ?Sized>(
        &self,
        name: &str,
        data: &T,
        out: &mut dyn io::Write,
    ) -> Result<(), Error> {
        self.ensure_registered(name)?;
        self.handlebars
            .render_to_write(name, &data, out)
            .map_err(|e| Error::template(name, e.to_string()))
    }

    fn ensure_registered(&self, name: &str) -> Result<(), Error> {
        if self.has_template(name) {
            Ok(())
        } else {
            Err(Error::template(name, "template not found"))
        }
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("templates", &self.names())
            .finish()
    }
}

/// Builder for [`TemplateRegistry`].
pub struct TemplateRegistryBuilder {
    handlebars: Handlebars<'static>,
    extension: String,
}

impl TemplateRegistryBuilder {
    fn new() -> Self {
        Self {
            handlebars: Handlebars::new(),
            extension: "hbs".to_string(),
        }
    }

    /// Fails rendering on missing fields instead of writing nothing.
    #[must_use]
    pub fn strict_mode(mut self, strict: bool) -> Self {
        self.handlebars.set_strict_mode(strict);
        self
    }

    /// Sets the file extension picked up by [`directory`](Self::directory).
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Registers a template from source.
    pub fn template(mut self, name: &str, source: &str) -> Result<Self, Error> {
        self.handlebars
            .register_template_string(name, source)
            .map_err(|e| Error::template(name, e.to_string()))?;
        Ok(self)
    }

    /// Registers every template file under `dir`, recursively.
    ///
    /// A file `dir/recipes/show.hbs` is registered as `recipes/show`.
    pub fn directory(mut self, dir: impl AsRef<Path>) -> Result<Self, Error> {
        let root = dir.as_ref();
        if !root.is_dir() {
            return Err(Error::internal(format!(
                "template directory not found: {}",
                root.display()
            )));
        }
        self.load_dir(root, root)?;
        Ok(self)
    }

    fn load_dir(&mut self, root: &Path, dir: &Path) -> Result<(), Error> {
        let entries = fs::read_dir(dir).map_err(|e| {
            Error::internal_with_source(format!("cannot read {}", dir.display()), e)
        })?;

        for entry in entries {
            let path = entry
                .map_err(|e| Error::internal_with_source("cannot read directory entry", e))?
                .path();

            if path.is_dir() {
                self.load_dir(root, &path)?;
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(self.extension.as_str()) {
                continue;
            }

            let name = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .with_extension("")
                .to_string_lossy()
                .replace('\\', "/");
            let source = fs::read_to_string(&path).map_err(|e| {
                Error::internal_with_source(format!("cannot read {}", path.display()), e)
            })?;

            tracing::debug!(template = %name, "registering template");
            self.handlebars
                .register_template_string(&name, source)
                .map_err(|e| Error::template(name.clone(), e.to_string()))?;
        }
        Ok(())
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> TemplateRegistry {
        TemplateRegistry {
            handlebars: self.handlebars,
        }
    }
}
