//! Cache types for hosted-backend responses.

use fernwood_core::ProductId;

use super::types::{Category, Product, ProductImage};

/// Cache key for backend reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    ProductBySlug(String),
    /// Canonical querystring of a [`super::ProductQuery`].
    Products(String),
    Categories,
    ProductImages(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Categories(Vec<Category>),
    ProductImages(Vec<ProductImage>),
}
