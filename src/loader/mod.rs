//! Page data loading: analysis → dispatch → response processing → context.
//!
//! [`DataLoader`] orchestrates one page render's data needs. It loads and
//! analyzes the page's templates, fetches every detected requirement kind in
//! parallel, folds the responses into a loaded-data bag, and assembles the
//! final render context. A single kind's fetch failure is logged and treated
//! as "no data for this kind"; a top-level failure degrades to a minimal
//! fallback context instead of propagating.

pub mod search;

use std::collections::BTreeMap;

use anyhow::Result;
use futures::future::join_all;
use serde_json::{json, Map, Value};

use crate::analyzer::{DataKind, LoadOptions, TemplateAnalysis, TemplateAnalyzer};
use crate::core::{PageRenderOptions, PageType};
use crate::fetcher::{
    transform_cart_to_context, Collection, CollectionPage, PageRequest, Product, ProductPage,
    StoreDataFetcher, StorePageList,
};
use crate::liquid::{RenderContext, RequestState};
use crate::pagination::Paginate;
use crate::templates::{
    extract_page_section_paths, extract_section_names, template_path, SettingsSchema,
    TemplateSourceProvider, MAIN_LAYOUT_PATH, SETTINGS_SCHEMA_PATH,
};

/// Accumulator for cursor data harvested from envelope responses. Folded
/// into the `paginate` object once every kind has settled.
#[derive(Debug, Clone, Default)]
pub struct PaginationInfo {
    pub next_token: Option<String>,
    pub total_items: Option<usize>,
}

/// The per-request loaded-data bag: requirement kind results keyed by the
/// context names templates address.
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    values: Map<String, Value>,
}

impl LoadedData {
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Merges handle→value pairs into a shared map entry instead of
    /// overwriting it, so multiple analyses of the same kind accumulate.
    fn merge_handle_map(&mut self, key: &str, entries: BTreeMap<String, Value>) {
        let slot = self
            .values
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = slot {
            for (handle, value) in entries {
                map.insert(handle, value);
            }
        }
    }
}

/// Raw result of one requirement kind's fetch, before response processing.
#[derive(Debug)]
enum FetchResponse {
    ProductPage(ProductPage),
    CollectionPage(CollectionPage),
    PageList(StorePageList),
    Products(Vec<Product>),
    Product(Option<Product>),
    Collection(Option<Collection>),
    HandleMap(BTreeMap<String, Value>),
    Value(Value),
    None,
}

/// Everything a render needs: the assembled context, the section sources
/// referenced by the page, and the analysis that drove the load.
#[derive(Debug, Clone)]
pub struct PageData {
    pub context: Map<String, Value>,
    pub sections: BTreeMap<String, String>,
    pub analysis: TemplateAnalysis,
}

impl PageData {
    /// Converts into a ready-to-render context with the given request state.
    #[must_use]
    pub fn into_render_context(self, request: RequestState) -> RenderContext {
        RenderContext::from_map(self.context)
            .with_sections(self.sections)
            .with_request(request)
    }
}

/// Orchestrates template analysis and data loading for one store page.
#[derive(Debug)]
pub struct DataLoader<F, P> {
    fetcher: F,
    provider: P,
    analyzer: TemplateAnalyzer,
}

impl<F: StoreDataFetcher, P: TemplateSourceProvider> DataLoader<F, P> {
    pub fn new(fetcher: F, provider: P) -> Self {
        Self {
            fetcher,
            provider,
            analyzer: TemplateAnalyzer::new(),
        }
    }

    /// The underlying fetcher, for callers that need direct access (tests
    /// asserting on recorded requests, mostly).
    pub fn fetcher_ref(&self) -> &F {
        &self.fetcher
    }

    /// Loads everything a page render needs. Never fails: any top-level
    /// error is logged and replaced by a minimal fallback context.
    pub async fn load_page_data(&self, store_id: &str, options: &PageRenderOptions) -> PageData {
        match self.try_load(store_id, options).await {
            Ok(data) => data,
            Err(error) => {
                tracing::error!(
                    store_id,
                    page_type = %options.page_type,
                    "page data loading failed, using fallback context: {error}"
                );
                fallback_page_data(options)
            }
        }
    }

    async fn try_load(&self, store_id: &str, options: &PageRenderOptions) -> Result<PageData> {
        let (analysis, templates) = self.analyze_required_templates(store_id, options).await;

        let settings_source = self
            .provider
            .get_template(store_id, SETTINGS_SCHEMA_PATH)
            .await
            .unwrap_or_else(|error| {
                tracing::warn!(store_id, "settings schema load failed: {error}");
                None
            });
        let settings = SettingsSchema::parse(settings_source.as_deref());

        let (loaded, pagination) = self
            .load_data_from_analysis(store_id, &analysis, options, &settings)
            .await;

        let mut context = build_context_data(options, &loaded);
        if analysis.has_pagination {
            let limit = effective_page_limit(&analysis, &settings);
            let request = request_state(options);
            let paginate = Paginate::from_cursor(
                pagination.next_token.as_deref(),
                pagination.total_items.unwrap_or(0),
                limit,
                &request,
            );
            context.insert("paginate".to_string(), paginate.to_value());
        }

        Ok(PageData {
            context,
            sections: section_sources(&templates),
            analysis,
        })
    }

    /// Loads the layout, the page's JSON template, and every section either
    /// references, then analyzes the whole set. Individual load failures are
    /// logged and skipped.
    pub async fn analyze_required_templates(
        &self,
        store_id: &str,
        options: &PageRenderOptions,
    ) -> (TemplateAnalysis, BTreeMap<String, String>) {
        let mut templates = BTreeMap::new();

        let page_path = template_path(&options.page_type);
        let root_paths = [MAIN_LAYOUT_PATH.to_string(), page_path];
        let roots = join_all(
            root_paths
                .iter()
                .map(|path| self.load_template_entry(store_id, path)),
        )
        .await;
        for entry in roots.into_iter().flatten() {
            templates.insert(entry.0, entry.1);
        }

        let mut section_paths: Vec<String> = Vec::new();
        for (path, source) in &templates {
            let referenced = if path.ends_with(".json") {
                extract_page_section_paths(source)
            } else {
                extract_section_names(source)
                    .into_iter()
                    .map(|name| format!("sections/{name}.liquid"))
                    .collect()
            };
            for section_path in referenced {
                if !section_paths.contains(&section_path) {
                    section_paths.push(section_path);
                }
            }
        }

        let sections = join_all(
            section_paths
                .iter()
                .map(|path| self.load_template_entry(store_id, path)),
        )
        .await;
        for entry in sections.into_iter().flatten() {
            templates.insert(entry.0, entry.1);
        }

        (self.analyzer.analyze_set(&templates), templates)
    }

    async fn load_template_entry(&self, store_id: &str, path: &str) -> Option<(String, String)> {
        match self.provider.get_template(store_id, path).await {
            Ok(Some(source)) => Some((path.to_string(), source)),
            Ok(None) => {
                tracing::debug!(store_id, path, "template not found");
                None
            }
            Err(error) => {
                tracing::warn!(store_id, path, "template load failed: {error}");
                None
            }
        }
    }

    /// Fetches every requirement kind in parallel and folds the responses.
    /// A kind's failure is contained: logged, treated as absent data.
    pub async fn load_data_from_analysis(
        &self,
        store_id: &str,
        analysis: &TemplateAnalysis,
        options: &PageRenderOptions,
        settings: &SettingsSchema,
    ) -> (LoadedData, PaginationInfo) {
        let requirements: Vec<(DataKind, LoadOptions)> = analysis
            .required_data
            .iter()
            .map(|(kind, load_options)| {
                let mut load_options = load_options.clone();
                if kind.is_paginable() {
                    if let Some(per_page) = settings.products_per_page {
                        load_options.limit = Some(per_page);
                    }
                }
                if let Some(token) = &options.search_params.token {
                    load_options.next_token = Some(token.clone());
                }
                (*kind, load_options)
            })
            .collect();

        let fetches = requirements.iter().map(|(kind, load_options)| async move {
            let result = self.dispatch(store_id, *kind, load_options, options).await;
            (*kind, result)
        });

        let mut loaded = LoadedData::default();
        let mut pagination = PaginationInfo::default();
        for (kind, result) in join_all(fetches).await {
            match result {
                Ok(response) => process_response(kind, response, &mut loaded, &mut pagination),
                Err(error) => {
                    tracing::warn!(store_id, kind = %kind, "data fetch failed: {error}");
                }
            }
        }
        (loaded, pagination)
    }

    /// One requirement kind → one store-scoped fetch.
    async fn dispatch(
        &self,
        store_id: &str,
        kind: DataKind,
        options: &LoadOptions,
        page: &PageRenderOptions,
    ) -> Result<FetchResponse> {
        match kind {
            DataKind::Products => {
                let request = PageRequest {
                    limit: options.limit.or(Some(20)),
                    next_token: options.next_token.clone(),
                };
                let page = self.fetcher.get_store_products(store_id, &request).await?;
                Ok(FetchResponse::ProductPage(page))
            }
            DataKind::Collections => {
                let request = PageRequest {
                    limit: options.limit.or(Some(10)),
                    next_token: options.next_token.clone(),
                };
                let page = self.fetcher.get_store_collections(store_id, &request).await?;
                Ok(FetchResponse::CollectionPage(page))
            }
            DataKind::CollectionProducts => {
                let products = self
                    .fetcher
                    .get_featured_products(store_id, options.limit.unwrap_or(8))
                    .await?;
                Ok(FetchResponse::Products(products))
            }
            DataKind::Product => {
                let Some(id) = page.product_id.as_deref().or(page.handle.as_deref()) else {
                    return Ok(FetchResponse::None);
                };
                Ok(FetchResponse::Product(
                    self.fetcher.get_product(store_id, id).await?,
                ))
            }
            DataKind::Collection => self.dispatch_current_collection(store_id, options, page).await,
            DataKind::SpecificProduct => {
                let mut map = BTreeMap::new();
                for handle in &options.handles {
                    if let Some(product) = self.fetcher.get_product(store_id, handle).await? {
                        map.insert(handle.clone(), serde_json::to_value(product)?);
                    }
                }
                Ok(FetchResponse::HandleMap(map))
            }
            DataKind::SpecificCollection => {
                let map = self
                    .collections_by_handle(store_id, options, |collection| {
                        serde_json::to_value(collection)
                    })
                    .await?;
                Ok(FetchResponse::HandleMap(map))
            }
            DataKind::ProductsByCollection => {
                let map = self
                    .collections_by_handle(store_id, options, |collection| {
                        serde_json::to_value(&collection.products)
                    })
                    .await?;
                Ok(FetchResponse::HandleMap(map))
            }
            DataKind::RelatedProducts => {
                let products = self.dispatch_related_products(store_id, options, page).await?;
                Ok(FetchResponse::Products(products))
            }
            DataKind::Cart => {
                let cart = self.fetcher.get_cart(store_id).await?;
                Ok(FetchResponse::Value(transform_cart_to_context(&cart)))
            }
            DataKind::Linklists => {
                let menus = self.fetcher.get_store_navigation_menus(store_id).await?;
                Ok(FetchResponse::Value(serde_json::to_value(menus)?))
            }
            DataKind::Page => {
                let Some(handle) = page.handle.as_deref() else {
                    return Ok(FetchResponse::None);
                };
                match self.fetcher.get_page_by_slug(store_id, handle).await? {
                    Some(store_page) => Ok(FetchResponse::Value(serde_json::to_value(store_page)?)),
                    None => Ok(FetchResponse::None),
                }
            }
            DataKind::SpecificPage => {
                let mut map = BTreeMap::new();
                for handle in &options.handles {
                    if let Some(store_page) = self.fetcher.get_page_by_slug(store_id, handle).await?
                    {
                        map.insert(handle.clone(), serde_json::to_value(store_page)?);
                    }
                }
                Ok(FetchResponse::HandleMap(map))
            }
            DataKind::Pages => {
                let request = PageRequest {
                    limit: options.limit.or(Some(50)),
                    next_token: options.next_token.clone(),
                };
                let list = self.fetcher.get_visible_store_pages(store_id, &request).await?;
                Ok(FetchResponse::PageList(list))
            }
            DataKind::Policies => {
                let policies = self.fetcher.get_policies_pages(store_id).await?;
                Ok(FetchResponse::Value(serde_json::to_value(policies)?))
            }
            // Shop data comes from the surrounding application's store
            // record; pagination is request state, not a fetch; blog has no
            // backing source yet.
            DataKind::Shop | DataKind::Pagination | DataKind::Blog => Ok(FetchResponse::None),
        }
    }

    /// The current page's collection, by explicit id or by route handle.
    async fn dispatch_current_collection(
        &self,
        store_id: &str,
        options: &LoadOptions,
        page: &PageRenderOptions,
    ) -> Result<FetchResponse> {
        let request = PageRequest {
            limit: options.limit,
            next_token: options.next_token.clone(),
        };
        if let Some(id) = page.collection_id.as_deref() {
            return Ok(FetchResponse::Collection(
                self.fetcher.get_collection(store_id, id, &request).await?,
            ));
        }
        let Some(handle) = page.handle.as_deref() else {
            return Ok(FetchResponse::None);
        };
        let listing = self
            .fetcher
            .get_store_collections(store_id, &PageRequest::default())
            .await?;
        let Some(reference) = listing
            .collections
            .iter()
            .find(|collection| collection.matches_handle(handle))
        else {
            return Ok(FetchResponse::Collection(None));
        };
        Ok(FetchResponse::Collection(
            self.fetcher
                .get_collection(store_id, &reference.id, &request)
                .await?,
        ))
    }

    /// Resolves each requested handle against the store's collection listing
    /// and projects the fully loaded collection through `project`.
    async fn collections_by_handle(
        &self,
        store_id: &str,
        options: &LoadOptions,
        project: impl Fn(&Collection) -> serde_json::Result<Value>,
    ) -> Result<BTreeMap<String, Value>> {
        let mut map = BTreeMap::new();
        if options.handles.is_empty() {
            return Ok(map);
        }

        let listing = self
            .fetcher
            .get_store_collections(store_id, &PageRequest::default())
            .await?;
        for handle in &options.handles {
            let Some(reference) = listing
                .collections
                .iter()
                .find(|collection| collection.matches_handle(handle))
            else {
                continue;
            };
            let request = PageRequest {
                limit: options.limit,
                next_token: None,
            };
            if let Some(collection) = self
                .fetcher
                .get_collection(store_id, &reference.id, &request)
                .await?
            {
                map.insert(handle.clone(), project(&collection)?);
            }
        }
        Ok(map)
    }

    /// Related products for the current product: same category preferred,
    /// any other product as fallback, the current product always excluded.
    async fn dispatch_related_products(
        &self,
        store_id: &str,
        options: &LoadOptions,
        page: &PageRenderOptions,
    ) -> Result<Vec<Product>> {
        let limit = options.limit.unwrap_or(4);
        let Some(id) = page.product_id.as_deref().or(page.handle.as_deref()) else {
            return Ok(Vec::new());
        };
        let Some(current) = self.fetcher.get_product(store_id, id).await? else {
            return Ok(Vec::new());
        };

        let listing = self
            .fetcher
            .get_store_products(store_id, &PageRequest::with_limit(limit + 1))
            .await?;

        let mut related: Vec<Product> = listing
            .products
            .iter()
            .filter(|product| {
                product.id != current.id
                    && current
                        .category
                        .as_ref()
                        .is_none_or(|category| product.category.as_ref() == Some(category))
            })
            .cloned()
            .collect();

        if related.is_empty() {
            related = listing
                .products
                .into_iter()
                .filter(|product| product.id != current.id)
                .collect();
        }
        related.truncate(limit);
        Ok(related)
    }
}

/// Folds one kind's raw response into the bag, unwrapping envelopes and
/// copying cursor data into the pagination accumulator.
fn process_response(
    kind: DataKind,
    response: FetchResponse,
    loaded: &mut LoadedData,
    pagination: &mut PaginationInfo,
) {
    match response {
        FetchResponse::ProductPage(page) => {
            // First non-empty cursor wins; kinds settle in requirement order.
            if pagination.next_token.is_none() {
                pagination.next_token = page.next_token.clone();
            }
            pagination.total_items = pagination.total_items.or(page.total_count);
            loaded.insert("products", json!(page.products));
        }
        FetchResponse::CollectionPage(page) => {
            if pagination.next_token.is_none() {
                pagination.next_token = page.next_token.clone();
            }
            pagination.total_items = pagination.total_items.or(page.total_count);
            loaded.insert("collections", json!(page.collections));
        }
        FetchResponse::PageList(list) => {
            if pagination.next_token.is_none() {
                pagination.next_token = list.next_token.clone();
            }
            pagination.total_items = pagination.total_items.or(list.total_count);
            loaded.insert("pages", json!(list.pages));
        }
        FetchResponse::Products(products) => loaded.insert(kind.as_str(), json!(products)),
        FetchResponse::Product(Some(product)) => loaded.insert("product", json!(product)),
        FetchResponse::Collection(Some(collection)) => {
            loaded.insert("collection", json!(collection));
        }
        FetchResponse::HandleMap(map) => match handle_map_key(kind) {
            Some(key) => loaded.merge_handle_map(key, map),
            None => tracing::warn!(kind = %kind, "handle map response for a non-handle kind"),
        },
        FetchResponse::Value(value) => loaded.insert(kind.as_str(), value),
        FetchResponse::Product(None) | FetchResponse::Collection(None) | FetchResponse::None => {}
    }
}

const fn handle_map_key(kind: DataKind) -> Option<&'static str> {
    match kind {
        DataKind::SpecificProduct => Some("products_map"),
        DataKind::SpecificCollection => Some("collections_map"),
        DataKind::SpecificPage => Some("pages_map"),
        DataKind::ProductsByCollection => Some("products_by_collection_map"),
        _ => None,
    }
}

/// Assembles the render context: every loaded value, page-type specific
/// fields on top, handle-addressed maps exposed under `*_by_handle` names.
fn build_context_data(options: &PageRenderOptions, loaded: &LoadedData) -> Map<String, Value> {
    let mut context = Map::new();
    for (key, value) in &loaded.values {
        if !key.ends_with("_map") {
            context.insert(key.clone(), value.clone());
        }
    }

    context.insert("template".to_string(), json!(options.page_type.as_str()));
    context.insert(
        "page_title".to_string(),
        json!(options.page_type.default_title()),
    );

    match &options.page_type {
        PageType::Index => {
            context.insert("page_title".to_string(), json!("Home"));
        }
        PageType::Product => {
            if let Some(name) = loaded.get("product").and_then(|p| p.get("name")) {
                context.insert("page_title".to_string(), name.clone());
            }
        }
        PageType::Collection => {
            if let Some(title) = loaded.get("collection").and_then(|c| c.get("title")) {
                context.insert("page_title".to_string(), title.clone());
            }
        }
        PageType::Cart => {
            context.insert("page_title".to_string(), json!("Shopping Cart"));
        }
        PageType::Page => {
            if let Some(page) = loaded.get("page") {
                if let Some(title) = page.get("title") {
                    context.insert("page_title".to_string(), title.clone());
                }
                let description = page
                    .get("meta_description")
                    .filter(|d| !d.is_null())
                    .or_else(|| page.get("body"));
                if let Some(description) = description {
                    context.insert("page_description".to_string(), description.clone());
                }
            }
        }
        PageType::Policies => {
            context.insert("page_title".to_string(), json!("Store Policies"));
        }
        PageType::Search => {
            context.insert("page_title".to_string(), json!("Search"));
        }
        PageType::NotFound => {
            context.insert("page_title".to_string(), json!("Page Not Found"));
            context.insert(
                "error_message".to_string(),
                json!("The page you are looking for does not exist"),
            );
        }
        PageType::Other(_) => {}
    }

    inject_handle_maps(&mut context, loaded);
    context
}

/// Handle-addressed lookups for templates: `collections_by_handle.featured`,
/// `products_by_handle['slug']`, and friends. The collections map also
/// indexes the full collections array by slug and slugified title.
fn inject_handle_maps(context: &mut Map<String, Value>, loaded: &LoadedData) {
    let mut collections_by_handle = Map::new();
    if let Some(Value::Array(collections)) = loaded.get("collections") {
        for collection in collections {
            if let Some(slug) = collection.get("slug").and_then(Value::as_str) {
                collections_by_handle.insert(slug.to_string(), collection.clone());
            }
            if let Some(title) = collection.get("title").and_then(Value::as_str) {
                let slugified = title.to_lowercase().replace(char::is_whitespace, "-");
                collections_by_handle
                    .entry(slugified)
                    .or_insert_with(|| collection.clone());
            }
        }
    }
    if let Some(Value::Object(map)) = loaded.get("collections_map") {
        for (handle, value) in map {
            collections_by_handle.insert(handle.clone(), value.clone());
        }
    }
    if !collections_by_handle.is_empty() {
        context.insert(
            "collections_by_handle".to_string(),
            Value::Object(collections_by_handle),
        );
    }

    if let Some(products_map) = loaded.get("products_map") {
        context.insert("products_by_handle".to_string(), products_map.clone());
    }
    if let Some(pages_map) = loaded.get("pages_map") {
        context.insert("pages_by_handle".to_string(), pages_map.clone());
    }
    if let Some(by_collection) = loaded.get("products_by_collection_map") {
        context.insert("products_by_collection".to_string(), by_collection.clone());
    }
}

/// Effective page size for the loader-built `paginate` object.
fn effective_page_limit(analysis: &TemplateAnalysis, settings: &SettingsSchema) -> usize {
    settings
        .products_per_page
        .or_else(|| {
            analysis
                .required_data
                .iter()
                .find(|(kind, _)| kind.is_paginable())
                .and_then(|(_, options)| options.limit)
        })
        .unwrap_or(20)
}

fn request_state(options: &PageRenderOptions) -> RequestState {
    RequestState {
        current_page: options.search_params.page,
        token: options.search_params.token.clone(),
        search_term: options.search_params.q.clone(),
    }
}

/// Section sources keyed by section name, for the `section` tag.
fn section_sources(templates: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    templates
        .iter()
        .filter_map(|(path, source)| {
            let name = path.strip_prefix("sections/")?.strip_suffix(".liquid")?;
            Some((name.to_string(), source.clone()))
        })
        .collect()
}

/// Minimal context when loading fails outright: template name, derived
/// title, empty data arrays.
fn fallback_page_data(options: &PageRenderOptions) -> PageData {
    let mut context = Map::new();
    context.insert("template".to_string(), json!(options.page_type.as_str()));
    context.insert(
        "page_title".to_string(),
        json!(options.page_type.default_title()),
    );
    context.insert("products".to_string(), json!([]));
    context.insert("collections".to_string(), json!([]));
    PageData {
        context,
        sections: BTreeMap::new(),
        analysis: TemplateAnalysis::default(),
    }
}
