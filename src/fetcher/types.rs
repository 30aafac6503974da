//! Store data types as they cross the fetcher boundary.
//!
//! Paged fetches return envelope types (`ProductPage`, `CollectionPage`,
//! `StorePageList`) carrying the item array plus an opaque `next_token`
//! cursor and an optional total count.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Cursor and limit for one paged fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<usize>,
    pub next_token: Option<String>,
}

impl PageRequest {
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            next_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub store_id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub compare_at_price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "active".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub store_id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Collection {
    /// Whether a handle addresses this collection: by slug, by the
    /// slugified title, or by raw id.
    #[must_use]
    pub fn matches_handle(&self, handle: &str) -> bool {
        self.slug == handle
            || self.id == handle
            || self.title.to_lowercase().replace(char::is_whitespace, "-") == handle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub product_id: String,
    pub title: String,
    pub quantity: usize,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub store_id: String,
    #[serde(default)]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkList {
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorePage {
    pub id: String,
    pub store_id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub body: String,
}

/// One page of products plus its cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub total_count: Option<usize>,
}

/// One page of collections plus its cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionPage {
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub total_count: Option<usize>,
}

/// One page of store pages plus its cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorePageList {
    pub pages: Vec<StorePage>,
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub total_count: Option<usize>,
}

/// Cart in the shape templates address: `cart.item_count`,
/// `cart.total_price`, `cart.items`.
#[must_use]
pub fn transform_cart_to_context(cart: &Cart) -> Value {
    let item_count: usize = cart.items.iter().map(|line| line.quantity).sum();
    let total_price: f64 = cart
        .items
        .iter()
        .map(|line| line.price * line.quantity as f64)
        .sum();
    json!({
        "id": cart.id,
        "item_count": item_count,
        "total_price": total_price,
        "items": cart.items,
    })
}
