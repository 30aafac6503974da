//! Liquid dialect engine for merchant storefront templates.
//!
//! This module implements the subset of Liquid the storefront renderer needs:
//! text/output/tag tokenization, balanced block-content capture, a layered
//! read-only render context, and the custom tags (`style`/`stylesheet`,
//! `javascript`, `section`, `paginate`) that extend the base grammar.
//!
//! Rendering is a single-threaded recursive pass. Custom tags that need a
//! nested Liquid evaluation of their captured body call back into the engine
//! as a plain blocking call with an explicit depth bound, which keeps
//! tag-within-tag rendering cycle-safe. Tags execute in document order,
//! exactly once per occurrence, and never mutate the shared context.

pub mod capture;
pub mod context;
pub mod filters;
pub mod lexer;
pub mod parser;
pub mod tags;
pub mod tokens;

pub use context::{RenderContext, RequestState};
pub use parser::Template;

use serde_json::Value;

use crate::core::EngineError;
use parser::Node;

/// Depth bound for nested evaluations. Deep enough for section bodies that
/// contain style/javascript/paginate tags, shallow enough to stop runaway
/// re-entry.
const MAX_RENDER_DEPTH: usize = 8;

/// The template engine. Cheap to construct and stateless across renders;
/// every render call receives its own context.
#[derive(Debug, Clone)]
pub struct LiquidEngine {
    max_depth: usize,
}

impl Default for LiquidEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LiquidEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: MAX_RENDER_DEPTH,
        }
    }

    /// Parses template source into a reusable [`Template`].
    ///
    /// # Errors
    ///
    /// Propagates structural parse errors; see [`parser::parse`].
    pub fn parse(&self, source: &str) -> Result<Template, EngineError> {
        parser::parse(source)
    }

    /// Renders a parsed template against a context.
    ///
    /// # Errors
    ///
    /// Only structural conditions surface here (depth exhaustion at the top
    /// level); per-tag render failures are contained by the tags themselves.
    pub fn render(&self, template: &Template, ctx: &RenderContext) -> Result<String, EngineError> {
        let mut out = String::new();
        self.render_nodes(&template.nodes, ctx, 0, &mut out)?;
        Ok(out)
    }

    /// Parses and renders in one step.
    ///
    /// # Errors
    ///
    /// Propagates parse errors and top-level render errors.
    pub fn render_str(&self, source: &str, ctx: &RenderContext) -> Result<String, EngineError> {
        let template = self.parse(source)?;
        self.render(&template, ctx)
    }

    /// Nested evaluation entry point for tags: parse + render the captured
    /// body one level deeper.
    pub(crate) fn evaluate_nested(
        &self,
        source: &str,
        ctx: &RenderContext,
        depth: usize,
    ) -> Result<String, EngineError> {
        if depth >= self.max_depth {
            return Err(EngineError::RenderDepthExceeded {
                limit: self.max_depth,
            });
        }
        let template = self.parse(source)?;
        let mut out = String::new();
        self.render_nodes(&template.nodes, ctx, depth + 1, &mut out)?;
        Ok(out)
    }

    fn render_nodes(
        &self,
        nodes: &[Node],
        ctx: &RenderContext,
        depth: usize,
        out: &mut String,
    ) -> Result<(), EngineError> {
        if depth > self.max_depth {
            return Err(EngineError::RenderDepthExceeded {
                limit: self.max_depth,
            });
        }

        for node in nodes {
            match node {
                Node::Text(raw) => out.push_str(raw),
                Node::Output(expr) => out.push_str(&render_value(&expr.evaluate(ctx))),
                Node::Style(tag) => tag.render(self, ctx, depth, out),
                Node::Javascript(tag) => tag.render(self, ctx, depth, out),
                Node::Section(tag) => tag.render(self, ctx, depth, out),
                Node::Paginate(tag) => tag.render(self, ctx, depth, out),
                Node::Opaque { .. } => {}
            }
        }
        Ok(())
    }
}

/// Renders a context value the way templates expect: strings verbatim,
/// numbers and booleans via display, null as empty, arrays concatenated,
/// objects as JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items.iter().map(render_value).collect(),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> RenderContext {
        let mut ctx = RenderContext::new();
        ctx.insert("shop", json!({ "name": "Test Store", "theme": "dark" }));
        ctx
    }

    #[test]
    fn renders_text_and_outputs() {
        let engine = LiquidEngine::new();
        let html = engine
            .render_str("<h1>{{ shop.name }}</h1>", &ctx())
            .unwrap();
        assert_eq!(html, "<h1>Test Store</h1>");
    }

    #[test]
    fn missing_variables_render_empty() {
        let engine = LiquidEngine::new();
        let html = engine.render_str("[{{ nothing.here }}]", &ctx()).unwrap();
        assert_eq!(html, "[]");
    }

    #[test]
    fn unknown_tags_render_as_nothing() {
        let engine = LiquidEngine::new();
        let html = engine
            .render_str("a{% assign x = 1 %}b{% if x %}c{% endif %}d", &ctx())
            .unwrap();
        assert_eq!(html, "abcd");
    }

    #[test]
    fn rendering_is_repeatable_on_one_template() {
        let engine = LiquidEngine::new();
        let template = engine.parse("{{ shop.theme }}").unwrap();
        let first = engine.render(&template, &ctx()).unwrap();
        let second = engine.render(&template, &ctx()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "dark");
    }

    #[test]
    fn number_and_bool_outputs() {
        let engine = LiquidEngine::new();
        let mut ctx = RenderContext::new();
        ctx.insert("n", json!(5));
        ctx.insert("ok", json!(true));
        assert_eq!(engine.render_str("{{ n }}/{{ ok }}", &ctx).unwrap(), "5/true");
    }
}
