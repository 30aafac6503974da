//! Core types shared across the engine and the data-loading pipeline.

mod error;

pub use error::EngineError;

use serde::{Deserialize, Serialize};

/// The kind of storefront page being rendered.
///
/// Drives template path resolution, page-type data inference in the analyzer
/// and the per-page context builders in the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Index,
    Product,
    Collection,
    Cart,
    Page,
    Policies,
    Search,
    #[serde(rename = "404")]
    NotFound,
    /// A page type without a dedicated template mapping; resolved as
    /// `templates/<name>.json`.
    Other(String),
}

impl PageType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Index => "index",
            Self::Product => "product",
            Self::Collection => "collection",
            Self::Cart => "cart",
            Self::Page => "page",
            Self::Policies => "policies",
            Self::Search => "search",
            Self::NotFound => "404",
            Self::Other(name) => name,
        }
    }

    /// Title used when no loaded data provides a better one: the page type
    /// with its first letter upper-cased.
    #[must_use]
    pub fn default_title(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-scoped search parameters plumbed into a page render.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    /// 1-based page number from the `page` query parameter.
    pub page: Option<usize>,
    /// Explicit pagination cursor from the `token` query parameter. When
    /// present it overrides any requirement-level token for every data kind.
    pub token: Option<String>,
    /// Search term from the `q` query parameter.
    pub q: Option<String>,
}

impl SearchParams {
    /// Effective 1-based page number, defaulting to 1.
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }
}

/// Options describing the page a render call is for.
#[derive(Debug, Clone)]
pub struct PageRenderOptions {
    pub page_type: PageType,
    /// URL handle of the current product/collection/page, when the route
    /// carries one.
    pub handle: Option<String>,
    pub product_id: Option<String>,
    pub collection_id: Option<String>,
    pub search_params: SearchParams,
}

impl PageRenderOptions {
    #[must_use]
    pub fn new(page_type: PageType) -> Self {
        Self {
            page_type,
            handle: None,
            product_id: None,
            collection_id: None,
            search_params: SearchParams::default(),
        }
    }

    #[must_use]
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }
}
