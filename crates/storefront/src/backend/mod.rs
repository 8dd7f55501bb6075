//! Hosted backend client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for catalog data - no local sync,
//!   direct REST calls against the `products` and `categories` tables
//! - Filters are built with the typed [`ProductQuery`] builder, never by
//!   hand-assembling filter strings
//! - In-memory caching via `moka` for catalog reads (5 minute TTL)
//! - Product images live in an object-storage bucket namespaced by
//!   product id; public URLs are derived, not fetched
//!
//! The cart has no dependency on this module: it operates on product
//! snapshots handed to it by the client.
//!
//! # Example
//!
//! ```rust,ignore
//! use fernwood_storefront::backend::{BackendClient, ProductQuery, SortKey};
//!
//! let client = BackendClient::new(&config.backend);
//!
//! let products = client
//!     .list_products(&ProductQuery::new().search("beanie").sort(SortKey::PriceAsc))
//!     .await?;
//! let images = client.list_product_images(&products[0].id).await?;
//! ```

mod cache;
pub mod query;
pub mod types;

pub use query::{ProductQuery, SortKey};
pub use types::{Category, Product, ProductImage};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

use fernwood_core::ProductId;

use crate::config::BackendConfig;
use cache::{CacheKey, CacheValue};
use types::StorageObject;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("Backend returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// Cache TTL for catalog reads.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Maximum cached entries.
const CACHE_CAPACITY: u64 = 1000;

/// Client for the hosted backend's REST and storage interfaces.
///
/// Cheaply cloneable via `Arc`. Catalog reads are cached for 5 minutes.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    /// `{base}/rest/v1`
    rest_endpoint: String,
    /// `{base}/storage/v1`
    storage_endpoint: String,
    anon_key: String,
    bucket: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                rest_endpoint: format!("{}/rest/v1", config.base_url),
                storage_endpoint: format!("{}/storage/v1", config.base_url),
                anon_key: config.anon_key.clone(),
                bucket: config.storage_bucket.clone(),
                cache,
            }),
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List products matching a typed query.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        let key = CacheKey::Products(query.cache_key());
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            return Ok(products);
        }

        let products: Vec<Product> = self.fetch_rows("products", &query.to_query_pairs()).await?;
        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Look up a single product by id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no row matches.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            return Ok(*product);
        }

        let pairs = [
            ("select".to_string(), "*".to_string()),
            ("id".to_string(), format!("eq.{id}")),
            ("limit".to_string(), "1".to_string()),
        ];
        let mut rows: Vec<Product> = self.fetch_rows("products", &pairs).await?;
        let product = rows
            .pop()
            .ok_or_else(|| BackendError::NotFound(format!("product {id}")))?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Look up a single product by URL slug.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no row matches.
    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product, BackendError> {
        let key = CacheKey::ProductBySlug(slug.to_owned());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            return Ok(*product);
        }

        let pairs = [
            ("select".to_string(), "*".to_string()),
            ("slug".to_string(), format!("eq.{slug}")),
            ("limit".to_string(), "1".to_string()),
        ];
        let mut rows: Vec<Product> = self.fetch_rows("products", &pairs).await?;
        let product = rows
            .pop()
            .ok_or_else(|| BackendError::NotFound(format!("product slug {slug}")))?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// List all categories, sorted by name.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            return Ok(categories);
        }

        let pairs = [
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "name.asc".to_string()),
        ];
        let categories: Vec<Category> = self.fetch_rows("categories", &pairs).await?;
        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    // =========================================================================
    // Object Storage
    // =========================================================================

    /// List the images stored under a product's bucket prefix, with public
    /// URLs derived for each.
    #[instrument(skip(self))]
    pub async fn list_product_images(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<ProductImage>, BackendError> {
        let key = CacheKey::ProductImages(product_id.clone());
        if let Some(CacheValue::ProductImages(images)) = self.inner.cache.get(&key).await {
            return Ok(images);
        }

        let url = format!(
            "{}/object/list/{}",
            self.inner.storage_endpoint, self.inner.bucket
        );
        let body = json!({
            "prefix": product_id.as_str(),
            "limit": 100,
            "offset": 0,
            "sortBy": { "column": "name", "order": "asc" },
        });

        let response = self
            .inner
            .client
            .post(&url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(&self.inner.anon_key)
            .json(&body)
            .send()
            .await?;

        let objects: Vec<StorageObject> = read_response(response).await?;
        let images: Vec<ProductImage> = objects
            .into_iter()
            // Bucket listings include a placeholder entry for empty prefixes
            .filter(|object| !object.name.starts_with('.'))
            .map(|object| ProductImage {
                url: self.public_object_url(product_id, &object.name),
                name: object.name,
            })
            .collect();

        self.inner
            .cache
            .insert(key, CacheValue::ProductImages(images.clone()))
            .await;
        Ok(images)
    }

    /// Public URL for one object in the product-images bucket.
    fn public_object_url(&self, product_id: &ProductId, name: &str) -> String {
        format!(
            "{}/object/public/{}/{}/{}",
            self.inner.storage_endpoint, self.inner.bucket, product_id, name
        )
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Whether the backend answers at all. Used by the readiness probe.
    pub async fn ping(&self) -> bool {
        let url = format!("{}/categories", self.inner.rest_endpoint);
        self.inner
            .client
            .get(&url)
            .header("apikey", &self.inner.anon_key)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await
            .is_ok_and(|response| response.status().is_success())
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    /// Fetch rows from a logical table with the given filter pairs.
    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        pairs: &[(String, String)],
    ) -> Result<Vec<T>, BackendError> {
        let url = format!("{}/{table}", self.inner.rest_endpoint);
        let response = self
            .inner
            .client
            .get(&url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(&self.inner.anon_key)
            .query(pairs)
            .send()
            .await?;

        read_response(response).await
    }
}

/// Decode a backend response, mapping rate limits and non-success statuses
/// to typed errors. The body is read as text first so parse failures can
/// be logged with context.
async fn read_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(BackendError::RateLimited(retry_after));
    }

    let text = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %text.chars().take(500).collect::<String>(),
            "Backend returned non-success status"
        );
        return Err(BackendError::Status {
            status: status.as_u16(),
            detail: text.chars().take(200).collect(),
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        BackendError::Parse(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_messages_are_stable() {
        let err = BackendError::NotFound("product p1".to_string());
        assert_eq!(err.to_string(), "Not found: product p1");

        let err = BackendError::RateLimited(3);
        assert_eq!(err.to_string(), "Rate limited, retry after 3 seconds");

        let err = BackendError::Status {
            status: 500,
            detail: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Backend returned HTTP 500: boom");
    }

    #[test]
    fn public_object_url_is_derived_not_fetched() {
        let client = BackendClient::new(&crate::config::BackendConfig {
            base_url: "https://abc.backend.example".to_string(),
            anon_key: "anon".to_string(),
            storage_bucket: "product-images".to_string(),
        });

        let url = client.public_object_url(&ProductId::new("p1"), "front.jpg");
        assert_eq!(
            url,
            "https://abc.backend.example/storage/v1/object/public/product-images/p1/front.jpg"
        );
    }
}
