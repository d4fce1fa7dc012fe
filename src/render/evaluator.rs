//! The template expression evaluator seam.
//!
//! The renderer hands each cell's escaped template text plus the active [`Context`] to an
//! [`Evaluator`] and stores whatever string comes back. The default evaluator is a
//! Handlebars registry with HTML escaping disabled.

use handlebars::Handlebars;

use crate::context::Context;
use crate::diagnostics::BoxError;

/// Renders one cell's template text against a context.
pub trait Evaluator {
    fn evaluate(&self, template: &str, ctx: &Context) -> Result<String, BoxError>;
}

/// Doubles the renderer's own brace syntax before evaluation.
///
/// Every `{{` becomes `{{{` and every `}}` becomes `}}}`, so placeholders reach the
/// evaluator as raw (unescaped) expressions and directive text is never reinterpreted
/// as a block construct.
pub fn escape_braces(template: &str) -> String {
    template.replace("{{", "{{{").replace("}}", "}}}")
}

pub struct HandlebarsEvaluator {
    registry: Handlebars<'static>,
}

impl HandlebarsEvaluator {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        Self { registry }
    }

    /// Wraps a pre-configured registry (custom helpers, strict mode, ...).
    pub fn with_registry(registry: Handlebars<'static>) -> Self {
        Self { registry }
    }
}

impl Default for HandlebarsEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for HandlebarsEvaluator {
    fn evaluate(&self, template: &str, ctx: &Context) -> Result<String, BoxError> {
        if !template.contains("{{") {
            return Ok(template.to_string());
        }
        Ok(self.registry.render_template(template, ctx)?)
    }
}
