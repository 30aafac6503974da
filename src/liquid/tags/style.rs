//! `{% style %}` and `{% stylesheet %}` tags.
//!
//! Both emit a `<style data-shopify>` element whose body is Liquid-evaluated
//! CSS. The `stylesheet` variant additionally tags the element with a section
//! identifier so DOM inspection tooling can attribute styles to the section
//! that produced them.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::core::EngineError;
use crate::liquid::capture::capture_until_close;
use crate::liquid::context::RenderContext;
use crate::liquid::tokens::Token;
use crate::liquid::LiquidEngine;

static CSS_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/\*[\s\S]*?\*/").unwrap());
static CSS_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static CSS_OPEN_BRACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\{\s*").unwrap());
static CSS_CLOSE_BRACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\}\s*").unwrap());
static CSS_COLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*:\s*").unwrap());
static CSS_SEMICOLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*;\s*").unwrap());
static CSS_MISSING_SEMICOLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^;{}\s])\s*\}").unwrap());

/// Which spelling of the tag this instance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleVariant {
    Style,
    Stylesheet,
}

impl StyleVariant {
    const fn open(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Stylesheet => "stylesheet",
        }
    }

    const fn close(self) -> &'static str {
        match self {
            Self::Style => "endstyle",
            Self::Stylesheet => "endstylesheet",
        }
    }
}

/// A single `{% style %}...{% endstyle %}` occurrence. Immutable after
/// construction; rendering reads captured content and a per-call context.
#[derive(Debug, Clone)]
pub struct StyleTag {
    variant: StyleVariant,
    css: String,
}

impl StyleTag {
    /// Captures the CSS body, depth-aware for nested same-named pairs.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnclosedTag`] when the closer is missing.
    pub(crate) fn parse(
        stream: &mut VecDeque<Token>,
        variant: StyleVariant,
    ) -> Result<Self, EngineError> {
        let css = capture_until_close(stream, variant.open(), variant.close())?;
        Ok(Self {
            variant,
            css: css.trim().to_string(),
        })
    }

    /// Evaluates the captured CSS against a snapshot of the context and emits
    /// the `<style>` element. If evaluation fails the unevaluated CSS is
    /// emitted instead, still normalized; the page keeps rendering.
    pub(crate) fn render(
        &self,
        engine: &LiquidEngine,
        ctx: &RenderContext,
        depth: usize,
        out: &mut String,
    ) {
        if self.css.is_empty() {
            return;
        }

        let snapshot = RenderContext::from_map(ctx.flatten());
        let css = match engine.evaluate_nested(&self.css, &snapshot, depth) {
            Ok(processed) => processed,
            Err(error) => {
                tracing::warn!(
                    tag = self.variant.open(),
                    "failed to evaluate CSS body, emitting unevaluated source: {error}"
                );
                self.css.clone()
            }
        };

        let css = normalize_css(&css);
        if css.is_empty() {
            return;
        }

        match self.variant {
            StyleVariant::Style => {
                out.push_str(&format!("<style data-shopify>\n{css}\n</style>"));
            }
            StyleVariant::Stylesheet => {
                let section_id = ctx
                    .get_path("section.id")
                    .and_then(Value::as_str)
                    .unwrap_or("stylesheet")
                    .to_string();
                out.push_str(&format!(
                    "<style data-shopify data-section-id=\"{section_id}\">\n{css}\n</style>"
                ));
            }
        }
    }
}

/// Normalizes CSS: strips comments, collapses whitespace, canonicalizes
/// spacing around `{`, `}`, `:` and `;`, and terminates the last declaration
/// of each block.
#[must_use]
pub fn normalize_css(css: &str) -> String {
    let css = CSS_COMMENT.replace_all(css, "");
    let css = CSS_WHITESPACE.replace_all(&css, " ");
    let css = CSS_OPEN_BRACE.replace_all(&css, " { ");
    let css = CSS_CLOSE_BRACE.replace_all(&css, " } ");
    let css = CSS_COLON.replace_all(&css, ": ");
    let css = CSS_SEMICOLON.replace_all(&css, "; ");
    let css = CSS_MISSING_SEMICOLON.replace_all(&css, "$1; }");
    css.trim().to_string()
}
