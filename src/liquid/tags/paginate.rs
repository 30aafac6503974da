//! `{% paginate <path> by <n> %}` tag.
//!
//! Slices an array from the context into the requested page and renders the
//! captured body with two extra bindings: a `paginate` object (counts, parts,
//! previous/next links) and the sliced array re-rooted under the original
//! variable name, so `{% paginate collection.products by 12 %}` leaves
//! `collection.products` holding only the current page inside the block.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::core::EngineError;
use crate::liquid::capture::capture_until_close;
use crate::liquid::context::RenderContext;
use crate::liquid::tokens::Token;
use crate::liquid::LiquidEngine;
use crate::pagination::Paginate;

static PAGINATE_ARGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s+by\s+(.+)$").unwrap());

/// Most items one page may show. Arguments above this are clamped, not
/// rejected, matching how storefront themes expect oversized `by` values to
/// behave.
const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct PaginateTag {
    path: String,
    limit: usize,
    body: String,
}

impl PaginateTag {
    /// Parses `<path> by <n>` arguments and captures the block body.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidSyntax`] when the arguments do not match
    /// `<path> by <integer>`; [`EngineError::UnclosedTag`] when
    /// `endpaginate` is missing.
    pub(crate) fn parse(args: &str, stream: &mut VecDeque<Token>) -> Result<Self, EngineError> {
        let captures =
            PAGINATE_ARGS
                .captures(args.trim())
                .ok_or_else(|| EngineError::InvalidSyntax {
                    tag: "paginate".to_string(),
                    args: args.to_string(),
                    expected: "<array path> by <page size>",
                })?;

        let path = captures[1].trim().to_string();
        let limit: usize =
            captures[2]
                .trim()
                .parse()
                .map_err(|_| EngineError::InvalidSyntax {
                    tag: "paginate".to_string(),
                    args: args.to_string(),
                    expected: "<array path> by <page size>",
                })?;
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        let body = capture_until_close(stream, "paginate", "endpaginate")?;
        Ok(Self { path, limit, body })
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Slices the target array and renders the body against a derived
    /// context. A non-array (or missing) target renders as nothing.
    pub(crate) fn render(
        &self,
        engine: &LiquidEngine,
        ctx: &RenderContext,
        depth: usize,
        out: &mut String,
    ) {
        let Some(Value::Array(items)) = ctx.get_path(&self.path) else {
            tracing::debug!(path = %self.path, "paginate target is not an array, skipping");
            return;
        };

        let total = items.len();
        let paginate = Paginate::build(ctx.request.page(), self.limit, total);
        let start = paginate.current_offset.min(total);
        let end = (start + self.limit).min(total);
        let page_items: Vec<Value> = items[start..end].to_vec();
        let shown = page_items.len();

        let mut layer = Map::new();
        layer.insert("paginate".to_string(), paginate.to_value());
        insert_sliced(&mut layer, ctx, &self.path, Value::Array(page_items));

        let child = ctx.child_with(layer);
        match engine.evaluate_nested(&self.body, &child, depth) {
            Ok(html) if html.trim().is_empty() => {
                out.push_str(&format!(
                    "<div class=\"pagination-info\"><span>Page {} of {} ({} of {} items)</span></div>",
                    paginate.current_page, paginate.pages, shown, total
                ));
            }
            Ok(html) => out.push_str(&html),
            Err(error) => {
                tracing::warn!(path = %self.path, "paginate body render failed: {error}");
            }
        }
    }
}

/// Rebinds the paginated path to the sliced array. For a dotted path the
/// root object is cloned and only the addressed property is replaced, so
/// sibling properties stay visible inside the block.
fn insert_sliced(layer: &mut Map<String, Value>, ctx: &RenderContext, path: &str, sliced: Value) {
    let mut segments = path.split('.');
    let root = segments.next().unwrap_or(path);
    let rest: Vec<&str> = segments.collect();

    if rest.is_empty() {
        layer.insert(root.to_string(), sliced);
        return;
    }

    let mut rebuilt = ctx
        .get_path(root)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    let mut cursor = &mut rebuilt;
    for segment in &rest[..rest.len() - 1] {
        if !cursor.is_object() {
            *cursor = Value::Object(Map::new());
        }
        let Value::Object(map) = cursor else { return };
        cursor = map.entry((*segment).to_string()).or_insert(Value::Null);
    }
    if !cursor.is_object() {
        *cursor = Value::Object(Map::new());
    }
    if let Value::Object(map) = cursor {
        map.insert(rest[rest.len() - 1].to_string(), sliced);
    }
    layer.insert(root.to_string(), rebuilt);
}
