//! Row types for the hosted backend's logical tables.
//!
//! These are the strongly-typed shapes of the `products` and `categories`
//! tables plus the object-storage listing response, keeping the rest of
//! the system away from the backend's loosely-typed client surface.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fernwood_core::{
    CategoryId, CurrencyCode, Price, ProductId, ProductSnapshot,
};

/// A row of the `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Backend identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Long-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in the shop currency.
    pub price: Decimal,
    /// Original/compare-at price when discounted.
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    /// Units available.
    pub stock: u32,
    /// Owning category, if filed under one.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Sizes this product is offered in.
    #[serde(default)]
    pub sizes: Vec<String>,
    /// Colors this product is offered in.
    #[serde(default)]
    pub colors: Vec<String>,
    /// Primary image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Whether the product is featured on the home page.
    #[serde(default)]
    pub is_featured: bool,
}

impl Product {
    /// Unit price as a typed [`Price`]. The shop trades in a single
    /// currency, so rows carry a bare decimal.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::new(self.price, CurrencyCode::USD)
    }

    /// Snapshot of this product for insertion into a cart.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.unit_price(),
            compare_at_price: self
                .compare_at_price
                .map(|amount| Price::new(amount, CurrencyCode::USD)),
            stock: self.stock,
            image_url: self.image_url.clone(),
        }
    }
}

/// A row of the `categories` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Backend identifier.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Banner image URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One object in a storage-bucket listing response.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageObject {
    /// Object name relative to the listing prefix.
    pub name: String,
}

/// A product image with its derived public URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductImage {
    /// Object name within the product's prefix.
    pub name: String,
    /// Public URL, derivable without authentication.
    pub url: String,
}
