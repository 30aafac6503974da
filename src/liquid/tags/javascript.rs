//! `{% javascript %}` tag and section script helpers.
//!
//! The tag emits a `<script>` element whose body is Liquid-evaluated
//! JavaScript. The code is deliberately not wrapped in a closure: functions
//! declared inside must stay callable from other inline scripts on the page.
//! Section-scoped behavior uses [`section_script`], which does wrap its code
//! in an IIFE with a small DOM-binding utility.

use std::collections::VecDeque;

use serde_json::Value;

use crate::core::EngineError;
use crate::liquid::capture::capture_until_close;
use crate::liquid::context::RenderContext;
use crate::liquid::filters::escape_script_string;
use crate::liquid::tokens::Token;
use crate::liquid::LiquidEngine;

/// A single `{% javascript %}...{% endjavascript %}` occurrence.
#[derive(Debug, Clone)]
pub struct JavascriptTag {
    js: String,
}

impl JavascriptTag {
    /// Captures the JavaScript body, depth-aware for nested pairs.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnclosedTag`] when `endjavascript` is missing.
    pub(crate) fn parse(stream: &mut VecDeque<Token>) -> Result<Self, EngineError> {
        let js = capture_until_close(stream, "javascript", "endjavascript")?;
        Ok(Self {
            js: js.trim().to_string(),
        })
    }

    /// Evaluates the captured body against a context snapshot and emits the
    /// script element. On evaluation failure the unevaluated source is
    /// emitted instead; the page keeps rendering.
    pub(crate) fn render(
        &self,
        engine: &LiquidEngine,
        ctx: &RenderContext,
        depth: usize,
        out: &mut String,
    ) {
        if self.js.is_empty() {
            return;
        }

        let snapshot = RenderContext::from_map(ctx.flatten());
        let code = match engine.evaluate_nested(&self.js, &snapshot, depth) {
            Ok(processed) => processed,
            Err(error) => {
                tracing::warn!(
                    "failed to evaluate javascript body, emitting unevaluated source: {error}"
                );
                self.js.clone()
            }
        };

        // No IIFE on purpose: declared functions must be reachable by id
        // from other script blocks.
        out.push_str(&format!(
            "<script type=\"text/javascript\">\n// Generated by the storefront javascript tag\n\n{code}\n</script>"
        ));
    }
}

/// Builds a section-scoped script block.
///
/// Wraps `code` in an IIFE that exposes `section.id` and `section.settings`
/// plus an `on(event, selector, callback)` utility scoped to the section's
/// `[data-section-id]` element, and auto-initializes on `DOMContentLoaded`
/// (or immediately when the DOM is already ready).
#[must_use]
pub fn section_script(section_id: &str, code: &str, settings: &Value) -> String {
    let id = escape_script_string(section_id);
    let settings_json = serde_json::to_string(settings).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"<script type="text/javascript" data-section-id="{section_id}">
(function() {{
  'use strict';

  var section = {{
    id: '{id}',
    settings: {settings_json}
  }};

  function getSectionElement() {{
    return document.querySelector('[data-section-id="' + section.id + '"]');
  }}

  function on(event, selector, callback) {{
    var element = typeof selector === 'string' ? getSectionElement().querySelector(selector) : selector;
    if (element) {{
      element.addEventListener(event, callback);
    }}
  }}

  function init() {{
{code}
  }}

  if (document.readyState === 'loading') {{
    document.addEventListener('DOMContentLoaded', init);
  }} else {{
    init();
  }}
}})();
</script>"#
    )
}
