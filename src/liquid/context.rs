//! Render context: the key-value environment available to one render call.
//!
//! The context is a stack of scope layers over a closed value tree
//! ([`serde_json::Value`]). Tags treat it as read-only; a tag that needs to
//! expose computed values to its own nested block derives a child context
//! with an extra layer instead of mutating the parent. Section sources and
//! request state ride along so the `section` and `paginate` tags can resolve
//! without global state.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Request state threaded into a render: current page number, explicit
/// pagination cursor, search term.
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    pub current_page: Option<usize>,
    pub token: Option<String>,
    pub search_term: Option<String>,
}

impl RequestState {
    /// Effective 1-based page number, defaulting to 1.
    #[must_use]
    pub fn page(&self) -> usize {
        self.current_page.unwrap_or(1).max(1)
    }
}

/// The read-only environment for template evaluation.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    scopes: Vec<Map<String, Value>>,
    sections: BTreeMap<String, String>,
    sections_enabled: bool,
    pub request: RequestState,
}

impl RenderContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![Map::new()],
            sections: BTreeMap::new(),
            sections_enabled: true,
            request: RequestState::default(),
        }
    }

    /// Builds a context whose base layer is the given map.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            scopes: vec![map],
            ..Self::new()
        }
    }

    /// Registers resolved section sources (name → Liquid source) for the
    /// `section` tag to look up.
    #[must_use]
    pub fn with_sections(mut self, sections: BTreeMap<String, String>) -> Self {
        self.sections = sections;
        self
    }

    #[must_use]
    pub fn with_request(mut self, request: RequestState) -> Self {
        self.request = request;
        self
    }

    /// Inserts a value into the topmost scope layer. Used while assembling a
    /// context, never by tags during rendering.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        if let Some(top) = self.scopes.last_mut() {
            top.insert(key.into(), value);
        }
    }

    /// Resolves a value by path segments, topmost layer first.
    #[must_use]
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        for scope in self.scopes.iter().rev() {
            if let Some(root) = scope.get(*first) {
                return walk(root, rest);
            }
        }
        None
    }

    /// Resolves a dotted path (`"collection.products"`), one property per
    /// segment, returning `None` on any missing segment.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let segments: Vec<&str> = path.split('.').collect();
        self.get(&segments)
    }

    /// Snapshot of the context's current values, later layers shadowing
    /// earlier ones. This is what tags evaluate captured bodies against.
    #[must_use]
    pub fn flatten(&self) -> Map<String, Value> {
        let mut merged = Map::new();
        for scope in &self.scopes {
            for (key, value) in scope {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }

    /// Derives a child context with an additional scope layer. The parent is
    /// untouched; sections and request state carry over.
    #[must_use]
    pub fn child_with(&self, layer: Map<String, Value>) -> Self {
        let mut child = self.clone();
        child.scopes.push(layer);
        child
    }

    /// Source text for a named section, if one is registered.
    #[must_use]
    pub fn section_source(&self, name: &str) -> Option<&str> {
        self.sections.get(name).map(String::as_str)
    }

    /// Whether `{% section %}` tags may resolve in this context. Disabled for
    /// the nested render inside a section body so inclusion stays a bounded,
    /// single-level step.
    #[must_use]
    pub fn sections_enabled(&self) -> bool {
        self.sections_enabled
    }

    /// Derives a child context in which section tags no longer resolve.
    #[must_use]
    pub fn without_sections(&self) -> Self {
        let mut child = self.clone();
        child.sections_enabled = false;
        child
    }
}

fn walk<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
