//! Store data fetcher boundary.
//!
//! The loader talks to storage through [`StoreDataFetcher`], a store-scoped
//! façade over whatever backend holds products, collections, carts, menus
//! and pages. Implementations own their transport; the loader only relies on
//! the envelope shapes in [`types`].

pub mod types;

use std::future::Future;

use anyhow::Result;

pub use types::{
    transform_cart_to_context, Cart, CartLine, Collection, CollectionPage, Link, LinkList,
    PageRequest, Policy, Product, ProductPage, StorePage, StorePageList,
};

/// Store-scoped data access used by the data loader.
///
/// Every method takes the store id explicitly; implementations must not
/// cache per-store state across calls unless that cache is store-keyed.
/// Absent entities are `Ok(None)`, not errors; errors are reserved for
/// transport and backend failures.
pub trait StoreDataFetcher: Send + Sync {
    fn get_store_products(
        &self,
        store_id: &str,
        request: &PageRequest,
    ) -> impl Future<Output = Result<ProductPage>> + Send;

    fn get_featured_products(
        &self,
        store_id: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Product>>> + Send;

    fn get_store_collections(
        &self,
        store_id: &str,
        request: &PageRequest,
    ) -> impl Future<Output = Result<CollectionPage>> + Send;

    fn get_collection(
        &self,
        store_id: &str,
        collection_id: &str,
        request: &PageRequest,
    ) -> impl Future<Output = Result<Option<Collection>>> + Send;

    fn get_product(
        &self,
        store_id: &str,
        product_id: &str,
    ) -> impl Future<Output = Result<Option<Product>>> + Send;

    fn get_cart(&self, store_id: &str) -> impl Future<Output = Result<Cart>> + Send;

    fn get_store_navigation_menus(
        &self,
        store_id: &str,
    ) -> impl Future<Output = Result<Vec<LinkList>>> + Send;

    fn get_visible_store_pages(
        &self,
        store_id: &str,
        request: &PageRequest,
    ) -> impl Future<Output = Result<StorePageList>> + Send;

    fn get_page_by_slug(
        &self,
        store_id: &str,
        slug: &str,
    ) -> impl Future<Output = Result<Option<StorePage>>> + Send;

    fn get_policies_pages(
        &self,
        store_id: &str,
    ) -> impl Future<Output = Result<Vec<Policy>>> + Send;
}
