//! Storefront Engine - Liquid rendering and data loading for merchant stores
//!
//! A storefront template engine built around a Liquid dialect with custom
//! tags (`style`/`stylesheet`, `javascript`, `section`, `paginate`) and a
//! declarative data-loading pipeline that analyzes templates, fetches only
//! the store data a page actually needs, and assembles the render context.
//!
//! # Architecture Overview
//!
//! A page render runs in two phases:
//! - **Data loading**: [`loader::DataLoader`] loads the page's templates,
//!   runs [`analyzer::TemplateAnalyzer`] over them to detect data
//!   requirements, fetches every requirement kind in parallel through a
//!   [`fetcher::StoreDataFetcher`], and folds the results into a render
//!   context.
//! - **Rendering**: [`liquid::LiquidEngine`] parses the source into tokens
//!   and nodes, then renders against the context. Custom tags capture their
//!   balanced block content at parse time and re-enter the engine for nested
//!   evaluation at render time, under an explicit depth bound.
//!
//! Failures are contained at the narrowest useful scope: broken custom-tag
//! syntax fails the parse fast, while render-time and fetch-time errors
//! degrade to fallbacks (unevaluated source, HTML comments, empty data)
//! rather than failing the page.
//!
//! # Core Modules
//!
//! - [`liquid`] - Lexer, parser, render context, and the custom tags
//! - [`analyzer`] - Template walk producing `(data kind, load options)` pairs
//! - [`loader`] - Analysis → dispatch → response processing → context
//! - [`fetcher`] - Store data boundary trait and envelope types
//! - [`templates`] - Template source provider, path conventions, settings schema
//! - [`pagination`] - The `paginate` object shared by tag and loader
//! - [`core`] - Page types, render options, error taxonomy
//!
//! # Example
//!
//! ```
//! use storefront_engine::liquid::{LiquidEngine, RenderContext};
//! use serde_json::json;
//!
//! let engine = LiquidEngine::new();
//! let mut ctx = RenderContext::new();
//! ctx.insert("shop", json!({ "name": "Test Store" }));
//! let html = engine.render_str("<h1>{{ shop.name }}</h1>", &ctx).unwrap();
//! assert_eq!(html, "<h1>Test Store</h1>");
//! ```

pub mod analyzer;
pub mod core;
pub mod fetcher;
pub mod liquid;
pub mod loader;
pub mod pagination;
pub mod templates;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use analyzer::{DataKind, LoadOptions, TemplateAnalysis, TemplateAnalyzer};
pub use crate::core::{EngineError, PageRenderOptions, PageType, SearchParams};
pub use fetcher::StoreDataFetcher;
pub use liquid::{LiquidEngine, RenderContext, RequestState, Template};
pub use loader::{DataLoader, PageData};
pub use pagination::Paginate;
pub use templates::TemplateSourceProvider;
