//! Product route handlers.
//!
//! Thin wrappers over the typed backend facade: parse the client's query
//! parameters into a [`ProductQuery`], fetch, return rows as JSON. Search
//! debouncing is a client concern; by the time a request lands here it is
//! just a filter.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use fernwood_core::{CategoryId, ProductId};

use crate::backend::{Product, ProductImage, ProductQuery, SortKey};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub featured: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ProductListParams {
    /// Convert to a typed backend query.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for an unknown sort key.
    fn into_query(self) -> Result<ProductQuery> {
        let mut query = ProductQuery::new();

        if let Some(category) = self.category {
            query = query.category(CategoryId::new(category));
        }
        if let Some(search) = &self.search {
            query = query.search(search);
        }
        if let Some(sort) = &self.sort {
            let key = SortKey::parse(sort)
                .ok_or_else(|| AppError::BadRequest(format!("unknown sort key '{sort}'")))?;
            query = query.sort(key);
        }
        if self.featured == Some(true) {
            query = query.featured_only();
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }

        Ok(query)
    }
}

/// List products, optionally filtered and paginated.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Vec<Product>>> {
    let query = params.into_query()?;
    let products = state.backend().list_products(&query).await?;
    Ok(Json(products))
}

/// Single product by id.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let product = state.backend().get_product(&ProductId::new(id)).await?;
    Ok(Json(product))
}

/// Single product by URL slug.
#[instrument(skip(state))]
pub async fn show_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>> {
    let product = state.backend().get_product_by_slug(&slug).await?;
    Ok(Json(product))
}

/// Gallery images for a product, public URLs included.
#[instrument(skip(state))]
pub async fn images(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ProductImage>>> {
    let images = state
        .backend()
        .list_product_images(&ProductId::new(id))
        .await?;
    Ok(Json(images))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ProductListParams {
        ProductListParams {
            category: None,
            search: None,
            sort: None,
            featured: None,
            limit: None,
            offset: None,
        }
    }

    #[test]
    fn unknown_sort_key_is_a_bad_request() {
        let result = ProductListParams {
            sort: Some("cheapest".to_string()),
            ..params()
        }
        .into_query();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn known_params_build_a_query() {
        let query = ProductListParams {
            category: Some("cat_1".to_string()),
            search: Some("beanie".to_string()),
            sort: Some("price_asc".to_string()),
            limit: Some(12),
            offset: Some(24),
            ..params()
        }
        .into_query()
        .expect("valid params");

        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("category_id".to_string(), "eq.cat_1".to_string())));
        assert!(pairs.contains(&("order".to_string(), "price.asc".to_string())));
    }
}
