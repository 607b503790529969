//! Rendering templates against execution snapshots.

use handlebars::{Handlebars, Template};
use serde::Serialize;
use serde::de::IgnoredAny;

use super::error::{SyntaxError, TemplateError};
use super::{helpers, syntax};
use crate::config::Body;

/// Renders webhook templates.
///
/// Holds the handlebars registry with every helper installed. Rendering
/// takes `&self`, so one renderer is shared by all concurrent deliveries.
#[derive(Debug, Clone)]
pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Creates a renderer with the template helpers registered.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        helpers::register(&mut registry);
        Self { registry }
    }

    /// Renders a template string.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Syntax`] if the template does not parse and
    /// [`TemplateError::Execution`] if it fails while running.
    pub fn render<T: Serialize>(&self, source: &str, data: &T) -> Result<String, TemplateError> {
        let compiled = syntax::translate(source)?;
        Template::compile(&compiled).map_err(|e| SyntaxError::other(e.to_string()))?;

        self.registry
            .render_template(&compiled, data)
            .map_err(|e| TemplateError::Execution {
                reason: e.to_string(),
            })
    }

    /// Renders a request body.
    ///
    /// A structured body is serialized to JSON text, rendered as one
    /// template, and must still be valid JSON afterwards.
    ///
    /// # Errors
    ///
    /// Returns the [`render`](Self::render) errors, or
    /// [`TemplateError::ResultInvalid`] when a structured body renders to
    /// something that is not JSON.
    pub fn render_body<T: Serialize>(&self, body: &Body, data: &T) -> Result<Vec<u8>, TemplateError> {
        match body {
            Body::Text(source) => Ok(self.render(source, data)?.into_bytes()),
            Body::Structured(value) => {
                let rendered = self.render(&value.to_string(), data)?;
                serde_json::from_str::<IgnoredAny>(&rendered).map_err(|e| {
                    TemplateError::ResultInvalid {
                        reason: e.to_string(),
                    }
                })?;
                Ok(rendered.into_bytes())
            }
        }
    }
}
