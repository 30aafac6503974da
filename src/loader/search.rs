//! Search page data loading.
//!
//! The search page gets its own parallel path: product results filtered by
//! the search term (or a plain product listing when no term is given),
//! optional collection results, and the limits configured in the store's
//! settings schema.

use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::fetcher::{PageRequest, Product, StoreDataFetcher};
use crate::templates::{SettingsSchema, TemplateSourceProvider, SETTINGS_SCHEMA_PATH};

use super::DataLoader;

/// Fallback product limit when the settings schema is absent.
const DEFAULT_SEARCH_LIMIT: usize = 8;

/// Data loaded for a search-results page.
#[derive(Debug, Clone, Default)]
pub struct SearchData {
    pub search_products: Vec<Product>,
    pub search_products_limit: usize,
    pub search_collections: Vec<Value>,
    pub search_collections_limit: Option<usize>,
}

impl<F: StoreDataFetcher, P: TemplateSourceProvider> DataLoader<F, P> {
    /// Loads search results and their configured limits. Never fails: any
    /// error degrades to empty results with the default limit.
    pub async fn load_search_data(&self, store_id: &str, search_term: Option<&str>) -> SearchData {
        match self.try_load_search(store_id, search_term).await {
            Ok(data) => data,
            Err(error) => {
                tracing::error!(store_id, "search data loading failed: {error}");
                SearchData {
                    search_products_limit: DEFAULT_SEARCH_LIMIT,
                    ..SearchData::default()
                }
            }
        }
    }

    async fn try_load_search(
        &self,
        store_id: &str,
        search_term: Option<&str>,
    ) -> Result<SearchData> {
        let settings_source = self
            .provider
            .get_template(store_id, SETTINGS_SCHEMA_PATH)
            .await
            .unwrap_or_else(|error| {
                tracing::warn!(store_id, "settings schema load failed: {error}");
                None
            });
        let settings = SettingsSchema::parse(settings_source.as_deref());

        let listing = self
            .fetcher
            .get_store_products(
                store_id,
                &PageRequest::with_limit(settings.search_products_limit),
            )
            .await?;
        let search_products = match search_term {
            Some(term) if !term.is_empty() => {
                let needle = term.to_lowercase();
                listing
                    .products
                    .into_iter()
                    .filter(|product| product.name.to_lowercase().contains(&needle))
                    .collect()
            }
            _ => listing.products,
        };

        let mut search_collections = Vec::new();
        if let Some(limit) = settings.search_collections_limit {
            match self
                .fetcher
                .get_store_collections(store_id, &PageRequest::with_limit(limit))
                .await
            {
                Ok(page) => {
                    search_collections = page
                        .collections
                        .into_iter()
                        .filter_map(|collection| serde_json::to_value(collection).ok())
                        .collect();
                }
                Err(error) => {
                    tracing::warn!(store_id, "search collections load failed: {error}");
                }
            }
        }

        Ok(SearchData {
            search_products,
            search_products_limit: settings.search_products_limit,
            search_collections,
            search_collections_limit: settings.search_collections_limit,
        })
    }
}

/// Merges search results into a render context under the names search
/// templates address.
pub fn inject_search_data(context: &mut Map<String, Value>, data: &SearchData, term: Option<&str>) {
    context.insert("search_products".to_string(), json!(data.search_products));
    context.insert(
        "search_products_limit".to_string(),
        json!(data.search_products_limit),
    );
    context.insert(
        "search_collections".to_string(),
        json!(data.search_collections),
    );
    if let Some(limit) = data.search_collections_limit {
        context.insert("search_collections_limit".to_string(), json!(limit));
    }
    if let Some(term) = term {
        context.insert("search_term".to_string(), json!(term));
    }
}
