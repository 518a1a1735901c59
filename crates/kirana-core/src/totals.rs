//! # Sale Total Calculator
//!
//! Pure, side-effect-free computation of the monetary figures for a sale.
//! Both the frontend cart display and the server-side checkout derive their
//! numbers from this one code path, so the two can never disagree.
//!
//! ## Derivation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Totals Derivation                                   │
//! │                                                                         │
//! │  line items ──► subtotal = Σ unit_price × quantity   (exact)           │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  discount ────► discount_amount                       (rounded once)   │
//! │                     │     flat: min(amount, subtotal)                   │
//! │                     │     percentage: subtotal × bps / 10000            │
//! │                     ▼                                                   │
//! │  after = subtotal - discount_amount                                    │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  tax = after × tax_rate_bps / 10000                   (rounded once)   │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  total = after + tax                                                   │
//! │                                                                         │
//! │  change = max(0, paid - total)                        (cash only)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounding happens at exactly two points (the discount amount and the tax
//! amount), never per line: line totals are exact integer products.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentMethod, TaxRate};

// =============================================================================
// Inputs
// =============================================================================

/// One cart line as the calculator sees it: a resolved price and a quantity.
///
/// Quantities are validated (> 0) at the point of cart mutation; the
/// calculator assumes its inputs already passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl LineItem {
    /// Line total (unit price × quantity). Exact, no rounding.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// A discount applied once to the sum of line totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DiscountSpec {
    /// Absolute amount off the subtotal.
    Flat { amount: Money },
    /// Percentage of the subtotal, in basis points (1000 = 10%).
    Percentage { bps: u32 },
}

impl DiscountSpec {
    /// No discount.
    pub const fn none() -> Self {
        DiscountSpec::Flat {
            amount: Money::zero(),
        }
    }
}

impl Default for DiscountSpec {
    fn default() -> Self {
        DiscountSpec::none()
    }
}

// =============================================================================
// Output
// =============================================================================

/// The five monetary figures of a sale.
///
/// Invariant: `total == subtotal - discount + tax`, exactly, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl SaleTotals {
    /// Computes the totals for a set of line items.
    ///
    /// ## Behavior
    /// - `subtotal` is the exact sum of line totals.
    /// - A flat discount is clamped to `[0, subtotal]`, so the total after
    ///   discount is never negative.
    /// - A percentage discount is applied to the subtotal and rounded
    ///   half-up once.
    /// - Tax applies to the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    /// use kirana_core::totals::{DiscountSpec, LineItem, SaleTotals};
    /// use kirana_core::types::TaxRate;
    ///
    /// let items = vec![LineItem {
    ///     product_id: "p1".into(),
    ///     unit_price: Money::from_cents(10000),
    ///     quantity: 1,
    /// }];
    /// let totals = SaleTotals::compute(
    ///     &items,
    ///     DiscountSpec::Flat { amount: Money::from_cents(1000) },
    ///     TaxRate::from_bps(1800),
    /// );
    /// assert_eq!(totals.total.cents(), 10620); // (100 - 10) × 1.18
    /// ```
    pub fn compute(items: &[LineItem], discount: DiscountSpec, tax_rate: TaxRate) -> SaleTotals {
        let subtotal: Money = items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.line_total());

        let discount_amount = match discount {
            // Clamp: a flat discount larger than the subtotal reduces it to
            // zero, never below.
            DiscountSpec::Flat { amount } => amount.max(Money::zero()).min(subtotal),
            DiscountSpec::Percentage { bps } => subtotal.percent_of(bps),
        };

        let after_discount = subtotal - discount_amount;
        let tax = after_discount.calculate_tax(tax_rate);
        let total = after_discount + tax;

        SaleTotals {
            subtotal,
            discount: discount_amount,
            tax,
            total,
        }
    }

    /// Change owed to the customer: `max(0, paid - total)`.
    ///
    /// Only meaningful for cash; card and UPI tender exactly the total.
    pub fn change_for(&self, paid: Money) -> Money {
        (paid - self.total).max(Money::zero())
    }

    /// Resolves the (paid, change) pair for a payment method.
    ///
    /// Cash keeps whatever was tendered; card and UPI are fixed to the
    /// total with zero change regardless of the submitted amount.
    pub fn settle(&self, method: PaymentMethod, tendered: Money) -> (Money, Money) {
        match method {
            PaymentMethod::Cash => (tendered, self.change_for(tendered)),
            PaymentMethod::Card | PaymentMethod::Upi => (self.total, Money::zero()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price_cents: i64, quantity: i64) -> LineItem {
        LineItem {
            product_id: format!("p-{price_cents}"),
            unit_price: Money::from_cents(price_cents),
            quantity,
        }
    }

    #[test]
    fn test_subtotal_is_sum_of_line_totals() {
        let items = vec![item(4000, 2), item(2000, 4)];
        let totals = SaleTotals::compute(&items, DiscountSpec::none(), TaxRate::zero());
        assert_eq!(totals.subtotal.cents(), 16000);
        assert_eq!(totals.total.cents(), 16000);
    }

    /// Cart [{40.00 × 2}, {20.00 × 4}], no discount, 18% tax:
    /// subtotal 160.00, tax 28.80, total 188.80; 200.00 paid → 11.20 change.
    #[test]
    fn test_checkout_scenario_no_discount() {
        let items = vec![item(4000, 2), item(2000, 4)];
        let totals = SaleTotals::compute(&items, DiscountSpec::none(), TaxRate::from_bps(1800));

        assert_eq!(totals.subtotal.cents(), 16000);
        assert_eq!(totals.discount.cents(), 0);
        assert_eq!(totals.tax.cents(), 2880);
        assert_eq!(totals.total.cents(), 18880);
        assert_eq!(totals.change_for(Money::from_cents(20000)).cents(), 1120);
    }

    /// Cart [{100.00 × 1}], 10.00 flat discount, 18% tax:
    /// subtotal 100.00, discount 10.00, tax 16.20, total 106.20.
    #[test]
    fn test_checkout_scenario_flat_discount() {
        let items = vec![item(10000, 1)];
        let totals = SaleTotals::compute(
            &items,
            DiscountSpec::Flat {
                amount: Money::from_cents(1000),
            },
            TaxRate::from_bps(1800),
        );

        assert_eq!(totals.subtotal.cents(), 10000);
        assert_eq!(totals.discount.cents(), 1000);
        assert_eq!(totals.tax.cents(), 1620);
        assert_eq!(totals.total.cents(), 10620);
    }

    #[test]
    fn test_percentage_discount() {
        // 10% of 100.00 = 10.00
        let items = vec![item(10000, 1)];
        let totals = SaleTotals::compute(
            &items,
            DiscountSpec::Percentage { bps: 1000 },
            TaxRate::zero(),
        );
        assert_eq!(totals.discount.cents(), 1000);
        assert_eq!(totals.total.cents(), 9000);
    }

    #[test]
    fn test_flat_discount_is_clamped_to_subtotal() {
        // 15.00 flat on a 10.00 cart discounts 10.00, not 15.00
        let items = vec![item(1000, 1)];
        let totals = SaleTotals::compute(
            &items,
            DiscountSpec::Flat {
                amount: Money::from_cents(1500),
            },
            TaxRate::from_bps(1800),
        );
        assert_eq!(totals.discount.cents(), 1000);
        assert_eq!(totals.total.cents(), 0);
    }

    #[test]
    fn test_flat_discount_applies_in_full_when_covered() {
        // 15.00 flat discounts exactly 15.00 on any subtotal that covers it
        for subtotal_cents in [1500, 2000, 99999] {
            let items = vec![item(subtotal_cents, 1)];
            let totals = SaleTotals::compute(
                &items,
                DiscountSpec::Flat {
                    amount: Money::from_cents(1500),
                },
                TaxRate::zero(),
            );
            assert_eq!(totals.discount.cents(), 1500);
        }
    }

    #[test]
    fn test_total_monotonic_in_tax_rate() {
        let items = vec![item(3333, 3)];
        let discount = DiscountSpec::Percentage { bps: 750 };

        let mut last_total = i64::MIN;
        for bps in [0, 500, 825, 1200, 1800, 2800] {
            let totals = SaleTotals::compute(&items, discount, TaxRate::from_bps(bps));
            assert!(totals.total.cents() >= last_total);
            last_total = totals.total.cents();
        }
    }

    #[test]
    fn test_totals_invariant_holds() {
        let items = vec![item(4999, 3), item(125, 7), item(10000, 1)];
        let totals = SaleTotals::compute(
            &items,
            DiscountSpec::Percentage { bps: 1250 },
            TaxRate::from_bps(1800),
        );
        assert_eq!(
            totals.total.cents(),
            totals.subtotal.cents() - totals.discount.cents() + totals.tax.cents()
        );
    }

    #[test]
    fn test_change_semantics() {
        let items = vec![item(18880, 1)];
        let totals = SaleTotals::compute(&items, DiscountSpec::none(), TaxRate::zero());

        // Exact payment → zero change
        assert_eq!(totals.change_for(Money::from_cents(18880)).cents(), 0);
        // Overpayment → the difference
        assert_eq!(totals.change_for(Money::from_cents(20000)).cents(), 1120);
        // Underpayment never yields negative change (rejection happens in
        // validation, not here)
        assert_eq!(totals.change_for(Money::from_cents(10000)).cents(), 0);
    }

    #[test]
    fn test_settle_by_payment_method() {
        let items = vec![item(10620, 1)];
        let totals = SaleTotals::compute(&items, DiscountSpec::none(), TaxRate::zero());

        let (paid, change) = totals.settle(PaymentMethod::Cash, Money::from_cents(11000));
        assert_eq!(paid.cents(), 11000);
        assert_eq!(change.cents(), 380);

        // Card and UPI tender exactly the total
        let (paid, change) = totals.settle(PaymentMethod::Card, Money::from_cents(99999));
        assert_eq!(paid.cents(), 10620);
        assert_eq!(change.cents(), 0);

        let (paid, change) = totals.settle(PaymentMethod::Upi, Money::zero());
        assert_eq!(paid.cents(), 10620);
        assert_eq!(change.cents(), 0);
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let totals = SaleTotals::compute(&[], DiscountSpec::none(), TaxRate::from_bps(1800));
        assert!(totals.subtotal.is_zero());
        assert!(totals.total.is_zero());
    }
}
