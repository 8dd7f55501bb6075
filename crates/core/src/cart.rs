//! The cart entity and its state machine.
//!
//! The cart is a small key-value state machine: lines are unique by the
//! composite key (product id, selected size, selected color), and the
//! aggregate total and item count are recomputed from the lines after
//! every transition. Mutations are expressed as [`CartCommand`] values
//! folded through [`Cart::apply`], which keeps the transition logic
//! testable without a web framework in the loop.
//!
//! Every operation is total: out-of-range inputs degrade to no-ops or
//! removals, never errors. Stock limits are deliberately not enforced
//! here; the store is a pure state container and callers own that policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

// =============================================================================
// Line Types
// =============================================================================

/// A product as captured at the moment it was added to the cart.
///
/// The cart never revalidates price or stock against a live source after
/// insertion; totals are computed from this snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Backend product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price at add time.
    pub price: Price,
    /// Original/compare-at price, if the product was on sale.
    pub compare_at_price: Option<Price>,
    /// Available stock at add time. Informational only.
    pub stock: u32,
    /// Primary image URL, if any.
    pub image_url: Option<String>,
}

/// The (size, color) pair identifying which variant a line represents.
///
/// Both fields are optional; a product without variants has the default
/// (empty) selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantSelection {
    /// Selected size, e.g. "M".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Selected color, e.g. "Forest Green".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl VariantSelection {
    /// Create a selection from optional size and color.
    #[must_use]
    pub const fn new(size: Option<String>, color: Option<String>) -> Self {
        Self { size, color }
    }
}

/// One entry in the cart: a product/variant and its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product snapshot captured at add time.
    pub product: ProductSnapshot,
    /// Units of this variant in the cart. Always >= 1 while the line
    /// exists; a line is removed rather than set to zero.
    pub quantity: u32,
    /// Which variant this line represents.
    #[serde(default)]
    pub variant: VariantSelection,
}

impl CartLine {
    /// Price of this line (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price.line_total(self.quantity)
    }

    /// Whether this line matches the full composite key.
    fn matches_key(&self, product_id: &ProductId, variant: &VariantSelection) -> bool {
        self.product.id == *product_id && self.variant == *variant
    }
}

// =============================================================================
// Commands
// =============================================================================

/// A cart mutation, folded through [`Cart::apply`].
///
/// Commands are serializable so the HTTP layer can log and replay them in
/// tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartCommand {
    /// Add `quantity` units of a product variant. Merges into an existing
    /// line when the full composite key matches, otherwise appends.
    /// A quantity of zero is a no-op.
    AddItem {
        product: ProductSnapshot,
        quantity: u32,
        #[serde(default)]
        variant: VariantSelection,
    },
    /// Remove the first line whose product id matches, regardless of
    /// variant. Removing an absent id is a no-op.
    RemoveItem { product_id: ProductId },
    /// Set the first id-matching line's quantity (replace, not increment).
    /// A quantity of zero or below removes the line. No-op if absent.
    ///
    /// The quantity is signed so that clients sending negative values
    /// degrade to removal instead of failing deserialization.
    UpdateQuantity { product_id: ProductId, quantity: i64 },
    /// Reset to the empty cart.
    Clear,
}

// =============================================================================
// Cart
// =============================================================================

/// The cart: an ordered collection of lines unique by composite key, with
/// derived totals.
///
/// `total` and `item_count` are caches of a pure function of `lines`; they
/// are recomputed after every mutation and on deserialization, never
/// incrementally adjusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PersistedCart")]
pub struct Cart {
    lines: Vec<CartLine>,
    total: Decimal,
    item_count: u32,
}

/// Wire shape for a persisted cart. Only the lines are authoritative;
/// totals are rederived on hydration so tampered or drifted persisted
/// state cannot violate the consistency invariant.
#[derive(Deserialize)]
struct PersistedCart {
    #[serde(default)]
    lines: Vec<CartLine>,
}

impl From<PersistedCart> for Cart {
    fn from(persisted: PersistedCart) -> Self {
        let mut cart = Self::default();
        // Re-add through the state machine: drops zero-quantity lines and
        // merges any duplicate composite keys the persisted blob may carry.
        for line in persisted.lines {
            cart = cart.apply(CartCommand::AddItem {
                product: line.product,
                quantity: line.quantity,
                variant: line.variant,
            });
        }
        cart
    }
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a command, returning the successor cart.
    ///
    /// This is the single transition function: every operation is defined
    /// for every input and never fails.
    #[must_use]
    pub fn apply(self, command: CartCommand) -> Self {
        let mut next = match command {
            CartCommand::AddItem {
                product,
                quantity,
                variant,
            } => self.add_item(product, quantity, variant),
            CartCommand::RemoveItem { product_id } => self.remove_item(&product_id),
            CartCommand::UpdateQuantity {
                product_id,
                quantity,
            } => self.update_quantity(&product_id, quantity),
            CartCommand::Clear => Self::default(),
        };
        next.recompute_totals();
        next
    }

    fn add_item(mut self, product: ProductSnapshot, quantity: u32, variant: VariantSelection) -> Self {
        if quantity == 0 {
            return self;
        }
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.matches_key(&product.id, &variant))
        {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine {
                product,
                quantity,
                variant,
            });
        }
        self
    }

    // Keyed by product id alone, not the full composite key: with two
    // variants of the same product in the cart, the first matching line is
    // acted upon. Pinned by `remove_by_id_ignores_variant_distinction`.
    fn remove_item(mut self, product_id: &ProductId) -> Self {
        if let Some(index) = self.lines.iter().position(|line| line.product.id == *product_id) {
            self.lines.remove(index);
        }
        self
    }

    fn update_quantity(mut self, product_id: &ProductId, quantity: i64) -> Self {
        let Ok(quantity) = u32::try_from(quantity) else {
            // Negative (or absurdly large) quantities degrade to removal.
            return self.remove_item(product_id);
        };
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product.id == *product_id)
        {
            line.quantity = quantity;
        }
        self
    }

    fn recompute_totals(&mut self) {
        self.total = self.lines.iter().map(CartLine::line_total).sum();
        self.item_count = self
            .lines
            .iter()
            .map(|line| line.quantity)
            .fold(0, u32::saturating_add);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether any line carries this product id.
    #[must_use]
    pub fn is_in_cart(&self, product_id: &ProductId) -> bool {
        self.lines.iter().any(|line| line.product.id == *product_id)
    }

    /// Quantity of the first line carrying this product id, or 0 if absent.
    #[must_use]
    pub fn item_quantity(&self, product_id: &ProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product.id == *product_id)
            .map_or(0, |line| line.quantity)
    }

    /// The cart lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Sum over lines of unit price times quantity.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Sum over lines of quantity.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::CurrencyCode;

    fn product(id: &str, dollars: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::new(Decimal::new(dollars, 0), CurrencyCode::USD),
            compare_at_price: None,
            stock: 25,
            image_url: None,
        }
    }

    fn variant(size: &str, color: &str) -> VariantSelection {
        VariantSelection::new(Some(size.to_owned()), Some(color.to_owned()))
    }

    fn add(cart: Cart, snapshot: ProductSnapshot, quantity: u32, v: VariantSelection) -> Cart {
        cart.apply(CartCommand::AddItem {
            product: snapshot,
            quantity,
            variant: v,
        })
    }

    /// The consistency invariant: totals are a pure function of lines.
    fn assert_totals_consistent(cart: &Cart) {
        let expected_total: Decimal = cart.lines().iter().map(CartLine::line_total).sum();
        let expected_count: u32 = cart.lines().iter().map(|line| line.quantity).sum();
        assert_eq!(cart.total(), expected_total);
        assert_eq!(cart.item_count(), expected_count);
    }

    #[test]
    fn adds_with_same_composite_key_sum_quantities() {
        let cart = add(Cart::new(), product("P1", 10), 2, variant("M", "Blue"));
        let cart = add(cart, product("P1", 10), 3, variant("M", "Blue"));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_quantity(&ProductId::new("P1")), 5);
        assert_totals_consistent(&cart);
    }

    #[test]
    fn different_variants_produce_distinct_lines() {
        let cart = add(Cart::new(), product("P1", 10), 1, variant("M", "Blue"));
        let cart = add(cart, product("P1", 10), 1, variant("L", "Blue"));
        let cart = add(cart, product("P1", 10), 1, variant("M", "Red"));

        assert_eq!(cart.lines().len(), 3);
        assert_eq!(cart.item_count(), 3);
        assert_totals_consistent(&cart);
    }

    #[test]
    fn add_with_zero_quantity_is_a_no_op() {
        let cart = add(Cart::new(), product("P1", 10), 0, VariantSelection::default());
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn update_to_zero_removes_the_line() {
        let cart = add(Cart::new(), product("P1", 10), 4, VariantSelection::default());
        let cart = cart.apply(CartCommand::UpdateQuantity {
            product_id: ProductId::new("P1"),
            quantity: 0,
        });

        assert!(cart.is_empty());
        assert!(!cart.is_in_cart(&ProductId::new("P1")));
        assert_totals_consistent(&cart);
    }

    #[test]
    fn update_to_negative_removes_the_line() {
        let cart = add(Cart::new(), product("P1", 10), 4, VariantSelection::default());
        let cart = cart.apply(CartCommand::UpdateQuantity {
            product_id: ProductId::new("P1"),
            quantity: -5,
        });

        assert!(cart.is_empty());
        assert_totals_consistent(&cart);
    }

    #[test]
    fn update_replaces_rather_than_increments() {
        let cart = add(Cart::new(), product("P1", 10), 4, VariantSelection::default());
        let cart = cart.apply(CartCommand::UpdateQuantity {
            product_id: ProductId::new("P1"),
            quantity: 2,
        });

        assert_eq!(cart.item_quantity(&ProductId::new("P1")), 2);
        assert_eq!(cart.total(), Decimal::new(20, 0));
    }

    #[test]
    fn update_of_absent_id_is_a_no_op() {
        let cart = add(Cart::new(), product("P1", 10), 1, VariantSelection::default());
        let before = cart.clone();
        let cart = cart.apply(CartCommand::UpdateQuantity {
            product_id: ProductId::new("ghost"),
            quantity: 7,
        });
        assert_eq!(cart, before);
    }

    #[test]
    fn remove_of_absent_id_is_a_no_op() {
        let cart = add(Cart::new(), product("P1", 10), 1, VariantSelection::default());
        let before = cart.clone();
        let cart = cart.apply(CartCommand::RemoveItem {
            product_id: ProductId::new("ghost"),
        });
        assert_eq!(cart, before);
    }

    #[test]
    fn clear_empties_everything() {
        let cart = add(Cart::new(), product("P1", 10), 2, variant("M", "Blue"));
        let cart = add(cart, product("P2", 5), 1, VariantSelection::default());
        let cart = cart.apply(CartCommand::Clear);

        assert!(cart.is_empty());
        assert!(!cart.is_in_cart(&ProductId::new("P1")));
        assert_eq!(cart.item_quantity(&ProductId::new("P2")), 0);
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    /// Remove and update key by product id alone while add keys by the
    /// full composite key, so two variants of the same product cannot be
    /// independently removed: the first matching line wins. This mirrors
    /// the behavior the storefront shipped with; change it consciously or
    /// not at all.
    #[test]
    fn remove_by_id_ignores_variant_distinction() {
        let cart = add(Cart::new(), product("P1", 10), 1, variant("M", "Blue"));
        let cart = add(cart, product("P1", 10), 2, variant("L", "Red"));
        assert_eq!(cart.lines().len(), 2);

        let cart = cart.apply(CartCommand::RemoveItem {
            product_id: ProductId::new("P1"),
        });

        // The first (M, Blue) line was removed; (L, Red) survives.
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].variant, variant("L", "Red"));
        assert_eq!(cart.item_count(), 2);
        assert_totals_consistent(&cart);
    }

    #[test]
    fn update_by_id_hits_the_first_matching_variant() {
        let cart = add(Cart::new(), product("P1", 10), 1, variant("M", "Blue"));
        let cart = add(cart, product("P1", 10), 2, variant("L", "Red"));

        let cart = cart.apply(CartCommand::UpdateQuantity {
            product_id: ProductId::new("P1"),
            quantity: 9,
        });

        assert_eq!(cart.lines()[0].quantity, 9);
        assert_eq!(cart.lines()[1].quantity, 2);
        assert_totals_consistent(&cart);
    }

    /// The concrete walkthrough scenario.
    #[test]
    fn end_to_end_scenario() {
        let cart = add(Cart::new(), product("P1", 10), 2, VariantSelection::default());
        let cart = add(cart, product("P1", 10), 1, VariantSelection::default());

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_quantity(&ProductId::new("P1")), 3);
        assert_eq!(cart.total(), Decimal::new(30, 0));
        assert_eq!(cart.item_count(), 3);

        let cart = cart.apply(CartCommand::UpdateQuantity {
            product_id: ProductId::new("P1"),
            quantity: 1,
        });
        assert_eq!(cart.item_quantity(&ProductId::new("P1")), 1);
        assert_eq!(cart.total(), Decimal::new(10, 0));

        let cart = cart.apply(CartCommand::RemoveItem {
            product_id: ProductId::new("P1"),
        });
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn serde_round_trip_is_deep_equal() {
        let cart = add(Cart::new(), product("P1", 10), 2, variant("M", "Blue"));
        let cart = add(cart, product("P2", 7), 3, VariantSelection::default());

        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();

        assert_eq!(back, cart);
        assert_totals_consistent(&back);
    }

    /// Hydration rederives totals and sanitizes persisted state: drifted
    /// totals are ignored and zero-quantity lines are dropped.
    #[test]
    fn hydration_recomputes_totals_and_drops_invalid_lines() {
        let json = r#"{
            "lines": [
                {
                    "product": {
                        "id": "P1",
                        "name": "Product P1",
                        "price": { "amount": "10", "currency_code": "USD" },
                        "compare_at_price": null,
                        "stock": 25,
                        "image_url": null
                    },
                    "quantity": 2
                },
                {
                    "product": {
                        "id": "P2",
                        "name": "Product P2",
                        "price": { "amount": "5", "currency_code": "USD" },
                        "compare_at_price": null,
                        "stock": 25,
                        "image_url": null
                    },
                    "quantity": 0
                }
            ],
            "total": "999",
            "item_count": 42
        }"#;

        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total(), Decimal::new(20, 0));
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn hydration_merges_duplicate_composite_keys() {
        let persisted = PersistedCart {
            lines: vec![
                CartLine {
                    product: product("P1", 10),
                    quantity: 1,
                    variant: variant("M", "Blue"),
                },
                CartLine {
                    product: product("P1", 10),
                    quantity: 2,
                    variant: variant("M", "Blue"),
                },
            ],
        };

        let cart = Cart::from(persisted);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_quantity(&ProductId::new("P1")), 3);
    }
}
