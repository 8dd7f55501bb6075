//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness check
//! GET    /health/ready                  - Readiness check (pings backend)
//!
//! # Catalog
//! GET    /api/categories                - Category listing
//! GET    /api/products                  - Product listing (category, search,
//!                                         sort, featured, limit, offset)
//! GET    /api/products/{id}             - Product by id
//! GET    /api/products/slug/{slug}      - Product by URL slug
//! GET    /api/products/{id}/images      - Product gallery images
//!
//! # Cart (session-scoped, always 200 with the new cart state)
//! GET    /api/cart                      - Full cart view
//! DELETE /api/cart                      - Clear the cart
//! GET    /api/cart/count                - Badge count
//! POST   /api/cart/items                - Add an item (product snapshot in body)
//! PATCH  /api/cart/items/{product_id}   - Set quantity (<= 0 removes)
//! DELETE /api/cart/items/{product_id}   - Remove a line
//! ```

pub mod cart;
pub mod categories;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/slug/{slug}", get(products::show_by_slug))
        .route("/{id}", get(products::show))
        .route("/{id}/images", get(products::images))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new().route("/", get(categories::index))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            axum::routing::patch(cart::update).delete(cart::remove),
        )
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/categories", category_routes())
        .nest("/api/cart", cart_routes())
}
