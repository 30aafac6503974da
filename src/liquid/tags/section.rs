//! `{% section 'name' %}` tag: bounded single-level inclusion.
//!
//! Sections resolve against the sources registered on the render context. The
//! nested render runs with section resolution disabled, so a section that
//! references another section emits a placeholder comment instead of
//! recursing.

use serde_json::{json, Map};

use crate::core::EngineError;
use crate::liquid::context::RenderContext;
use crate::liquid::LiquidEngine;

#[derive(Debug, Clone)]
pub struct SectionTag {
    name: String,
}

impl SectionTag {
    /// Parses the section name from the tag arguments. Accepts a quoted
    /// string or a bare token.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingName`] when no name is given.
    pub(crate) fn parse(args: &str) -> Result<Self, EngineError> {
        let name = unquote(args.trim());
        if name.is_empty() {
            return Err(EngineError::MissingName {
                tag: "section".to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn section_name(&self) -> &str {
        &self.name
    }

    /// Renders the named section's source with a derived context. Missing
    /// sources and render failures degrade to HTML comments so the rest of
    /// the page is unaffected.
    pub(crate) fn render(
        &self,
        engine: &LiquidEngine,
        ctx: &RenderContext,
        depth: usize,
        out: &mut String,
    ) {
        if !ctx.sections_enabled() {
            out.push_str(&format!(
                "<!-- Section '{}' skipped: nested section rendering is disabled -->",
                self.name
            ));
            return;
        }

        let Some(source) = ctx.section_source(&self.name).map(str::to_owned) else {
            tracing::debug!(section = %self.name, "section source not registered");
            out.push_str(&format!("<!-- Section '{}' not found -->", self.name));
            return;
        };

        let mut layer = Map::new();
        layer.insert("section".to_string(), json!({ "id": self.name }));
        let child = ctx.without_sections().child_with(layer);

        match engine.evaluate_nested(&source, &child, depth) {
            Ok(html) => out.push_str(&html),
            Err(error) => {
                tracing::warn!(section = %self.name, "section render failed: {error}");
                out.push_str(&format!(
                    "<!-- Error rendering section '{}': {error} -->",
                    self.name
                ));
            }
        }
    }
}

fn unquote(raw: &str) -> &str {
    raw.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn ctx_with(sections: &[(&str, &str)]) -> RenderContext {
        let map: BTreeMap<String, String> = sections
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut ctx = RenderContext::new().with_sections(map);
        ctx.insert("shop", json!({ "name": "Test Store" }));
        ctx
    }

    fn render(source: &str, ctx: &RenderContext) -> String {
        LiquidEngine::new().render_str(source, ctx).unwrap()
    }

    #[test]
    fn renders_registered_section() {
        let ctx = ctx_with(&[("header", "<h1>{{ shop.name }}</h1>")]);
        assert_eq!(
            render("{% section 'header' %}", &ctx),
            "<h1>Test Store</h1>"
        );
    }

    #[test]
    fn bare_and_double_quoted_names_accepted() {
        let ctx = ctx_with(&[("footer", "ok")]);
        assert_eq!(render("{% section footer %}", &ctx), "ok");
        assert_eq!(render("{% section \"footer\" %}", &ctx), "ok");
    }

    #[test]
    fn parsed_tag_exposes_its_name() {
        let tag = SectionTag::parse("'header'").unwrap();
        assert_eq!(tag.section_name(), "header");
        let tag = SectionTag::parse("footer").unwrap();
        assert_eq!(tag.section_name(), "footer");
    }

    #[test]
    fn missing_section_emits_comment() {
        let ctx = ctx_with(&[]);
        assert_eq!(
            render("{% section 'ghost' %}", &ctx),
            "<!-- Section 'ghost' not found -->"
        );
    }

    #[test]
    fn section_body_sees_its_own_id() {
        let ctx = ctx_with(&[("hero", "id={{ section.id }}")]);
        assert_eq!(render("{% section 'hero' %}", &ctx), "id=hero");
    }

    #[test]
    fn nested_sections_do_not_recurse() {
        let ctx = ctx_with(&[("a", "A{% section 'b' %}"), ("b", "B")]);
        let html = render("{% section 'a' %}", &ctx);
        assert!(html.starts_with('A'));
        assert!(html.contains("nested section rendering is disabled"));
        assert!(!html.contains("AB"));
    }

    #[test]
    fn missing_name_is_a_parse_error() {
        let err = SectionTag::parse("   ").unwrap_err();
        assert!(matches!(err, EngineError::MissingName { ref tag } if tag == "section"));
    }

    #[test]
    fn style_tag_inside_section_gets_section_id() {
        let ctx = ctx_with(&[("hero", "{% stylesheet %}.h{top:0}{% endstylesheet %}")]);
        let html = render("{% section 'hero' %}", &ctx);
        assert!(html.contains("data-section-id=\"hero\""));
    }
}
