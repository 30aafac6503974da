//! End-to-end pipeline tests: template analysis, parallel data loading, and
//! rendering against the assembled context.

use serde_json::json;
use storefront_engine::analyzer::{DataKind, LoadOptions, TemplateAnalysis};
use storefront_engine::liquid::{LiquidEngine, RequestState};
use storefront_engine::templates::SettingsSchema;
use storefront_engine::test_utils::{sample_collection, sample_product, InMemoryProvider, MockFetcher};
use storefront_engine::{DataLoader, PageRenderOptions, PageType};

fn storefront_provider() -> InMemoryProvider {
    InMemoryProvider::new(&[
        (
            "layout/theme.liquid",
            "{% section 'header' %}{{ content_for_layout }}",
        ),
        ("sections/header.liquid", "<h1>{{ page_title }}</h1>"),
        (
            "templates/index.json",
            r#"{"sections": {"main": {"type": "hero"}}}"#,
        ),
        (
            "sections/hero.liquid",
            "{% style %}.hero{color:red}{% endstyle %}",
        ),
    ])
}

#[tokio::test]
async fn index_page_loads_data_and_renders_sections() {
    let mut fetcher = MockFetcher::with_products(3);
    fetcher.collections = vec![sample_collection(1, vec![sample_product(1)])];
    let loader = DataLoader::new(fetcher, storefront_provider());

    let options = PageRenderOptions::new(PageType::Index);
    let data = loader.load_page_data("store-1", &options).await;

    assert_eq!(data.context["template"], json!("index"));
    assert_eq!(data.context["page_title"], json!("Home"));
    // Index pages infer a collections requirement; cart and navigation are
    // always loaded.
    assert!(data.context["collections"].is_array());
    assert_eq!(data.context["cart"]["item_count"], json!(1));
    assert!(data.sections.contains_key("header"));
    assert!(data.sections.contains_key("hero"));

    let ctx = data.into_render_context(RequestState::default());
    let html = LiquidEngine::new()
        .render_str("{% section 'header' %}{% section 'hero' %}", &ctx)
        .unwrap();
    assert!(html.contains("<h1>Home</h1>"));
    assert!(html.contains("<style data-shopify>"));
    assert!(html.contains(".hero { color: red; }"));
}

#[tokio::test]
async fn one_failing_kind_does_not_abort_siblings() {
    let mut fetcher = MockFetcher::with_products(3);
    fetcher.fail_products = true;
    fetcher.collections = vec![sample_collection(1, Vec::new())];
    let loader = DataLoader::new(fetcher, InMemoryProvider::default());

    let mut analysis = TemplateAnalysis::default();
    analysis.require(DataKind::Products, LoadOptions::with_limit(20));
    analysis.require(DataKind::Collections, LoadOptions::with_limit(10));

    let options = PageRenderOptions::new(PageType::Index);
    let (loaded, _) = loader
        .load_data_from_analysis("store-1", &analysis, &options, &SettingsSchema::default())
        .await;

    assert!(loaded.get("products").is_none());
    let collections = loaded.get("collections").expect("collections loaded");
    assert_eq!(collections.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn explicit_token_overrides_requirement_cursors() {
    let fetcher = MockFetcher::with_products(2);
    let loader = DataLoader::new(fetcher, InMemoryProvider::default());

    let mut analysis = TemplateAnalysis::default();
    analysis.require(DataKind::Products, LoadOptions::with_limit(20));

    let mut options = PageRenderOptions::new(PageType::Index);
    options.search_params.token = Some("cursor-abc".to_string());

    let _ = loader
        .load_data_from_analysis("store-1", &analysis, &options, &SettingsSchema::default())
        .await;

    let requests = loader.fetcher_ref().product_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].next_token.as_deref(), Some("cursor-abc"));
}

#[tokio::test]
async fn paginate_tag_in_section_builds_loader_paginate_object() {
    let mut provider = storefront_provider();
    provider.insert(
        "sections/hero.liquid",
        "{% paginate products by 10 %}{{ paginate.pages }}{% endpaginate %}",
    );
    let fetcher = MockFetcher {
        products: (1..=45).map(sample_product).collect(),
        next_token: Some("more".to_string()),
        ..MockFetcher::default()
    };
    let loader = DataLoader::new(fetcher, provider);

    let options = PageRenderOptions::new(PageType::Index);
    let data = loader.load_page_data("store-1", &options).await;

    let paginate = &data.context["paginate"];
    assert_eq!(paginate["pages"], json!(5));
    assert_eq!(paginate["items"], json!(45));
    assert_eq!(paginate["current_page"], json!(1));
}

#[tokio::test]
async fn search_loader_filters_products_by_term() {
    let fetcher = MockFetcher::with_products(5);
    let loader = DataLoader::new(fetcher, InMemoryProvider::default());

    let data = loader.load_search_data("store-1", Some("product 3")).await;
    assert_eq!(data.search_products.len(), 1);
    assert_eq!(data.search_products[0].name, "Product 3");
    assert_eq!(data.search_products_limit, 8);

    let data = loader.load_search_data("store-1", None).await;
    assert_eq!(data.search_products.len(), 5);
}

#[tokio::test]
async fn failing_template_store_still_yields_renderable_context() {
    let loader = DataLoader::new(MockFetcher::default(), InMemoryProvider::failing());

    let options = PageRenderOptions::new(PageType::Product);
    let data = loader.load_page_data("store-1", &options).await;

    assert_eq!(data.context["template"], json!("product"));
    assert_eq!(data.context["page_title"], json!("Product"));

    let ctx = data.into_render_context(RequestState::default());
    let html = LiquidEngine::new()
        .render_str("<title>{{ page_title }}</title>", &ctx)
        .unwrap();
    assert_eq!(html, "<title>Product</title>");
}

#[tokio::test]
async fn end_to_end_style_tag_uses_loaded_context() {
    let fetcher = MockFetcher::with_products(1);
    let loader = DataLoader::new(fetcher, storefront_provider());

    let options = PageRenderOptions::new(PageType::Index);
    let data = loader.load_page_data("store-1", &options).await;
    let mut ctx = data.into_render_context(RequestState::default());
    ctx.insert("shop", json!({ "theme": "dark" }));

    let html = LiquidEngine::new()
        .render_str("{% style %}.a{color:{{ shop.theme }}}{% endstyle %}", &ctx)
        .unwrap();
    assert!(html.contains("<style data-shopify>"));
    assert!(html.contains(".a { color: dark; }"));
}
