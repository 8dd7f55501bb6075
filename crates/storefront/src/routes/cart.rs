//! Cart route handlers.
//!
//! The cart is session-scoped and independent of the hosted backend: the
//! client submits the product snapshot it already holds when adding, so
//! these handlers never issue a catalog read. Every operation is total and
//! responds 200 with the successor cart state; a persistence failure is
//! logged inside [`CartStore`] and never surfaces here.

use axum::{Json, extract::Path};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use fernwood_core::{Cart, CartCommand, CartLine, Price, ProductId, ProductSnapshot, VariantSelection};

use crate::cart::CartStore;

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub unit_price_display: String,
    pub line_total: Decimal,
    pub line_total_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: Decimal,
    pub total_display: String,
    pub item_count: u32,
}

/// Badge count for the header.
#[derive(Debug, Clone, Serialize)]
pub struct CartCountView {
    pub count: u32,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let currency = line.product.price.currency_code;
        let line_total = line.line_total();
        Self {
            product_id: line.product.id.clone(),
            name: line.product.name.clone(),
            quantity: line.quantity,
            unit_price: line.product.price.amount,
            unit_price_display: line.product.price.display(),
            line_total,
            line_total_display: Price::new(line_total, currency).display(),
            size: line.variant.size.clone(),
            color: line.variant.color.clone(),
            image_url: line.product.image_url.clone(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        // All lines share the shop currency; fall back to the default for
        // the empty cart's zero total.
        let currency = cart
            .lines()
            .first()
            .map(|line| line.product.price.currency_code)
            .unwrap_or_default();
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            total: cart.total(),
            total_display: Price::new(cart.total(), currency).display(),
            item_count: cart.item_count(),
        }
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Snapshot of the product as the client displays it.
    pub product: ProductSnapshot,
    /// Units to add. Defaults to 1.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Selected size, if the product has sizes.
    #[serde(default)]
    pub size: Option<String>,
    /// Selected color, if the product has colors.
    #[serde(default)]
    pub color: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

/// Set-quantity request body. Zero or negative removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

// =============================================================================
// Handlers
// =============================================================================

/// Current cart state.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Json<CartView> {
    let cart = CartStore::new(session).load().await;
    Json(CartView::from(&cart))
}

/// Cart badge count.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Json<CartCountView> {
    let cart = CartStore::new(session).load().await;
    Json(CartCountView {
        count: cart.item_count(),
    })
}

/// Add an item. Merges into an existing line when the composite key
/// (product id, size, color) matches.
#[instrument(skip(session, request))]
pub async fn add(session: Session, Json(request): Json<AddItemRequest>) -> Json<CartView> {
    let command = CartCommand::AddItem {
        product: request.product,
        quantity: request.quantity,
        variant: VariantSelection::new(request.size, request.color),
    };
    let cart = CartStore::new(session).dispatch(command).await;
    Json(CartView::from(&cart))
}

/// Set a line's quantity by product id. Quantity <= 0 removes the line;
/// an unknown id is a no-op.
#[instrument(skip(session, request))]
pub async fn update(
    session: Session,
    Path(product_id): Path<String>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Json<CartView> {
    let command = CartCommand::UpdateQuantity {
        product_id: ProductId::new(product_id),
        quantity: request.quantity,
    };
    let cart = CartStore::new(session).dispatch(command).await;
    Json(CartView::from(&cart))
}

/// Remove a line by product id. An unknown id is a no-op.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(product_id): Path<String>) -> Json<CartView> {
    let command = CartCommand::RemoveItem {
        product_id: ProductId::new(product_id),
    };
    let cart = CartStore::new(session).dispatch(command).await;
    Json(CartView::from(&cart))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Json<CartView> {
    let cart = CartStore::new(session).dispatch(CartCommand::Clear).await;
    Json(CartView::from(&cart))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fernwood_core::CurrencyCode;

    fn snapshot(id: &str, dollars: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::new(Decimal::new(dollars, 0), CurrencyCode::USD),
            compare_at_price: None,
            stock: 10,
            image_url: None,
        }
    }

    #[test]
    fn cart_view_formats_totals() {
        let cart = Cart::new().apply(CartCommand::AddItem {
            product: snapshot("P1", 10),
            quantity: 3,
            variant: VariantSelection::default(),
        });

        let view = CartView::from(&cart);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.total, Decimal::new(30, 0));
        assert_eq!(view.total_display, "$30.00");
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].line_total_display, "$30.00");
    }

    #[test]
    fn empty_cart_view_is_zeroed() {
        let view = CartView::from(&Cart::new());
        assert!(view.lines.is_empty());
        assert_eq!(view.total, Decimal::ZERO);
        assert_eq!(view.total_display, "$0.00");
        assert_eq!(view.item_count, 0);
    }

    #[test]
    fn add_item_request_defaults_quantity_to_one() {
        let json = r#"{
            "product": {
                "id": "P1",
                "name": "Product P1",
                "price": { "amount": "10", "currency_code": "USD" },
                "compare_at_price": null,
                "stock": 10,
                "image_url": null
            }
        }"#;
        let request: AddItemRequest = serde_json::from_str(json).expect("valid request");
        assert_eq!(request.quantity, 1);
        assert!(request.size.is_none());
    }
}
