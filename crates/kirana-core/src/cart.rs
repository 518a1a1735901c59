//! # Cart State
//!
//! Explicit cart state with reducer-style mutations.
//!
//! There is no global cart singleton anywhere in the system: the cart a
//! customer is building lives in their client session, and the server only
//! ever sees it as a value, either as the `items` array of a checkout
//! request or as a held-sale snapshot. This module defines that value and
//! the rules for mutating it.
//!
//! ## Invariants
//! - Items are unique by `product_id` (adding the same product merges
//!   quantities)
//! - Quantity is always > 0 (updating a line to 0 removes it)
//! - At most `MAX_CART_ITEMS` distinct lines, `MAX_ITEM_QUANTITY` per line
//! - Unit prices are frozen at the moment the product is added

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::totals::LineItem;
use crate::types::Product;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// An item in the shopping cart.
///
/// `sku`, `name`, and `unit_price_cents` are frozen copies of the product at
/// the time it was added, so the cart displays consistent data even if the
/// catalog changes underneath it. Checkout re-resolves live catalog data
/// server-side regardless.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a cart item from a product, freezing its price.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Line total (unit price × quantity).
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize, Default, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Adds a product to the cart, or merges into the existing line.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        crate::validation::validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of a line. Zero removes the line; negative
    /// quantities never enter the cart.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        crate::validation::validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
            Ok(())
        } else {
            Err(CoreError::ProductNotFound(product_id.to_string()))
        }
    }

    /// Removes a line from the cart by product ID.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::ProductNotFound(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The cart as calculator input.
    pub fn line_items(&self) -> Vec<LineItem> {
        self.items
            .iter()
            .map(|i| LineItem {
                product_id: i.product_id.clone(),
                unit_price: Money::from_cents(i.unit_price_cents),
                quantity: i.quantity,
            })
            .collect()
    }
}

/// A held sale: a named cart snapshot saved without finalizing a sale.
///
/// Holding consumes no stock and no invoice number; the snapshot is just
/// data until the cashier resumes it and checks out normally.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HeldSale {
    pub id: String,
    pub tenant_id: String,
    /// Cashier-facing label ("Table 4", customer name, ...).
    pub label: String,
    pub cart: Cart,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductStatus;

    fn test_product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            tenant_id: "tenant-1".to_string(),
            store_id: None,
            sku: format!("SKU-{id}"),
            barcode: None,
            name: format!("Product {id}"),
            category: None,
            price_cents,
            stock: 100,
            low_stock_threshold: 5,
            status: ProductStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_item() {
        let mut cart = Cart::new();
        let product = test_product("1", 999);

        cart.add_item(&product, 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.items[0].line_total().cents(), 1998);
    }

    #[test]
    fn test_add_same_product_merges_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 999);

        cart.add_item(&product, 2).unwrap();
        cart.add_item(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 999);

        assert!(cart.add_item(&product, 0).is_err());
        assert!(cart.add_item(&product, -1).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        let product = test_product("1", 999);

        cart.add_item(&product, 2).unwrap();
        cart.update_quantity("1", 0).unwrap();

        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_unknown_product_fails() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.update_quantity("missing", 3),
            Err(CoreError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_quantity_cap() {
        let mut cart = Cart::new();
        let product = test_product("1", 999);

        cart.add_item(&product, MAX_ITEM_QUANTITY).unwrap();
        assert!(matches!(
            cart.add_item(&product, 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
    }

    #[test]
    fn test_price_frozen_at_add_time() {
        let mut cart = Cart::new();
        let mut product = test_product("1", 999);

        cart.add_item(&product, 1).unwrap();
        product.price_cents = 1299; // catalog price changes afterwards

        assert_eq!(cart.items[0].unit_price_cents, 999);
    }

    #[test]
    fn test_line_items_for_calculator() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", 4000), 2).unwrap();
        cart.add_item(&test_product("2", 2000), 4).unwrap();

        let lines = cart.line_items();
        assert_eq!(lines.len(), 2);
        let subtotal: i64 = lines.iter().map(|l| l.line_total().cents()).sum();
        assert_eq!(subtotal, 16000);
    }

    #[test]
    fn test_held_sale_snapshot_roundtrip() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", 4000), 2).unwrap();

        let held = HeldSale {
            id: "h1".to_string(),
            tenant_id: "tenant-1".to_string(),
            label: "Table 4".to_string(),
            cart,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&held).unwrap();
        let back: HeldSale = serde_json::from_str(&json).unwrap();
        assert_eq!(back.label, "Table 4");
        assert_eq!(back.cart.total_quantity(), 2);
    }
}
