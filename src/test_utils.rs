//! Shared test fixtures: an in-memory template provider and a configurable
//! mock store fetcher.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::fetcher::{
    Cart, CartLine, Collection, CollectionPage, LinkList, PageRequest, Policy, Product,
    ProductPage, StoreDataFetcher, StorePage, StorePageList,
};
use crate::templates::TemplateSourceProvider;

/// Template provider backed by a path→source map. Paths not in the map are
/// "not found"; set `fail` to make every lookup error.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    templates: BTreeMap<String, String>,
    pub fail: bool,
}

impl InMemoryProvider {
    #[must_use]
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            templates: entries
                .iter()
                .map(|(path, source)| (path.to_string(), source.to_string()))
                .collect(),
            fail: false,
        }
    }

    pub fn insert(&mut self, path: &str, source: &str) {
        self.templates.insert(path.to_string(), source.to_string());
    }

    /// A provider whose every lookup errors, for outage tests.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl TemplateSourceProvider for InMemoryProvider {
    async fn get_template(&self, _store_id: &str, path: &str) -> Result<Option<String>> {
        if self.fail {
            bail!("template store unavailable");
        }
        Ok(self.templates.get(path).cloned())
    }
}

/// Builds a product with predictable fields (`p<i>`, `product-<i>`).
#[must_use]
pub fn sample_product(i: usize) -> Product {
    Product {
        id: format!("p{i}"),
        store_id: "store-1".to_string(),
        name: format!("Product {i}"),
        slug: format!("product-{i}"),
        description: String::new(),
        price: 10.0 * i as f64,
        compare_at_price: None,
        category: Some(if i % 2 == 0 { "even" } else { "odd" }.to_string()),
        images: Vec::new(),
        status: "active".to_string(),
    }
}

#[must_use]
pub fn sample_collection(i: usize, products: Vec<Product>) -> Collection {
    Collection {
        id: format!("col{i}"),
        store_id: "store-1".to_string(),
        title: format!("Collection {i}"),
        slug: format!("collection-{i}"),
        description: String::new(),
        products,
    }
}

/// Configurable fake store backend. Fetches are served from the in-memory
/// vectors; per-method fail flags simulate backend outages. Product page
/// requests are recorded for assertions on limits and cursors.
#[derive(Debug, Default)]
pub struct MockFetcher {
    pub products: Vec<Product>,
    pub collections: Vec<Collection>,
    pub pages: Vec<StorePage>,
    pub menus: Vec<LinkList>,
    pub policies: Vec<Policy>,
    pub cart: Cart,
    pub next_token: Option<String>,
    pub fail_products: bool,
    pub fail_collections: bool,
    pub product_requests: Mutex<Vec<PageRequest>>,
}

impl MockFetcher {
    #[must_use]
    pub fn with_products(count: usize) -> Self {
        Self {
            products: (1..=count).map(sample_product).collect(),
            cart: Cart {
                id: "cart-1".to_string(),
                store_id: "store-1".to_string(),
                items: vec![CartLine {
                    id: "line-1".to_string(),
                    product_id: "p1".to_string(),
                    title: "Product 1".to_string(),
                    quantity: 1,
                    price: 10.0,
                }],
            },
            ..Self::default()
        }
    }
}

impl StoreDataFetcher for MockFetcher {
    async fn get_store_products(
        &self,
        _store_id: &str,
        request: &PageRequest,
    ) -> Result<ProductPage> {
        if self.fail_products {
            bail!("product backend unavailable");
        }
        if let Ok(mut seen) = self.product_requests.lock() {
            seen.push(request.clone());
        }
        let limit = request.limit.unwrap_or(self.products.len());
        Ok(ProductPage {
            products: self.products.iter().take(limit).cloned().collect(),
            next_token: self.next_token.clone(),
            total_count: Some(self.products.len()),
        })
    }

    async fn get_featured_products(&self, _store_id: &str, limit: usize) -> Result<Vec<Product>> {
        if self.fail_products {
            bail!("product backend unavailable");
        }
        Ok(self.products.iter().take(limit).cloned().collect())
    }

    async fn get_store_collections(
        &self,
        _store_id: &str,
        request: &PageRequest,
    ) -> Result<CollectionPage> {
        if self.fail_collections {
            bail!("collection backend unavailable");
        }
        let limit = request.limit.unwrap_or(self.collections.len());
        Ok(CollectionPage {
            collections: self.collections.iter().take(limit).cloned().collect(),
            next_token: None,
            total_count: Some(self.collections.len()),
        })
    }

    async fn get_collection(
        &self,
        _store_id: &str,
        collection_id: &str,
        _request: &PageRequest,
    ) -> Result<Option<Collection>> {
        Ok(self
            .collections
            .iter()
            .find(|collection| collection.id == collection_id)
            .cloned())
    }

    async fn get_product(&self, _store_id: &str, product_id: &str) -> Result<Option<Product>> {
        Ok(self
            .products
            .iter()
            .find(|product| product.id == product_id || product.slug == product_id)
            .cloned())
    }

    async fn get_cart(&self, _store_id: &str) -> Result<Cart> {
        Ok(self.cart.clone())
    }

    async fn get_store_navigation_menus(&self, _store_id: &str) -> Result<Vec<LinkList>> {
        Ok(self.menus.clone())
    }

    async fn get_visible_store_pages(
        &self,
        _store_id: &str,
        request: &PageRequest,
    ) -> Result<StorePageList> {
        let limit = request.limit.unwrap_or(self.pages.len());
        Ok(StorePageList {
            pages: self.pages.iter().take(limit).cloned().collect(),
            next_token: None,
            total_count: Some(self.pages.len()),
        })
    }

    async fn get_page_by_slug(&self, _store_id: &str, slug: &str) -> Result<Option<StorePage>> {
        Ok(self.pages.iter().find(|page| page.slug == slug).cloned())
    }

    async fn get_policies_pages(&self, _store_id: &str) -> Result<Vec<Policy>> {
        Ok(self.policies.clone())
    }
}
