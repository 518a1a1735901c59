//! # Domain Types
//!
//! Core domain types used throughout Kirana POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │   SaleItem      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  invoice_no     │   │  sale_id (FK)   │       │
//! │  │  price_cents    │   │  totals (cents) │   │  quantity       │       │
//! │  │  stock          │   │  payment_method │   │  unit_price     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │  PaymentMethod  │   │   UpiStatus     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Cash           │   │  Pending        │       │
//! │  │  1800 = 18%     │   │  Card           │   │  Completed      │       │
//! │  └─────────────────┘   │  Upi            │   │  Failed │ Na    │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, invoice_no, ...) - human-readable, tenant-scoped

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (e.g., Indian GST standard rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// Whether a product can currently be sold.
///
/// Soft delete: products are never removed, only deactivated, because
/// historical sale items still reference them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Active
    }
}

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this product belongs to.
    pub tenant_id: String,

    /// Store within the tenant (optional for single-store tenants).
    pub store_id: Option<String>,

    /// Stock Keeping Unit - business identifier, unique per tenant.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Display name shown to cashier and on the invoice.
    pub name: String,

    /// Free-form category label.
    pub category: Option<String>,

    /// Price in the smallest currency unit.
    pub price_cents: i64,

    /// Current stock level. Never negative.
    pub stock: i64,

    /// Per-product low-stock alert threshold.
    pub low_stock_threshold: i64,

    /// Whether product is sellable (soft delete).
    pub status: ProductStatus,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if the product is active (sellable).
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Checks if the product has enough stock for the given quantity.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// Checks if the product is at or below its low-stock threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid for.
///
/// UPI is India's real-time payment rail; the gateway itself is an opaque
/// external collaborator, only the resulting status is tracked here.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment; tendered amount may exceed the total.
    Cash,
    /// Card payment on an external terminal; amount equals the total.
    Card,
    /// UPI payment; amount equals the total, status may lag.
    Upi,
}

/// Status of a UPI payment attached to a sale.
///
/// `Na` for cash/card sales. The only mutation a completed sale permits
/// is `Pending → Completed | Failed`.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UpiStatus {
    Pending,
    Completed,
    Failed,
    Na,
}

impl Default for UpiStatus {
    fn default() -> Self {
        UpiStatus::Na
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a persisted sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Sale has been paid and finalized.
    Completed,
    /// Sale was refunded after completion.
    Refunded,
    /// Sale was cancelled.
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A finalized sale transaction.
///
/// ## Invariant
/// `total_cents == subtotal_cents - discount_cents + tax_cents`, exactly,
/// in integer cents. `paid_amount_cents >= total_cents` for cash sales.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    pub store_id: Option<String>,
    /// Human-readable invoice number, unique per tenant (`INV-YYYY-NNNN`).
    pub invoice_no: String,
    pub customer_id: Option<String>,
    pub cashier_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub upi_status: UpiStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub paid_amount_cents: i64,
    pub change_amount_cents: i64,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub tenant_id: String,
    pub sale_id: String,
    /// SET NULL on product delete; the snapshots below keep the history.
    pub product_id: Option<String>,
    /// SKU at time of sale (frozen).
    pub sku_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Quantity sold. Always > 0.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Line total (unit_price × quantity).
    pub total_cents: i64,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer record, attachable to sales for purchase history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    pub store_id: Option<String>,
    pub name: String,
    /// Normalized 10-digit mobile number, unique per tenant.
    pub phone: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Store Settings
// =============================================================================

/// Per-tenant store configuration.
///
/// Supplies the tax rate the calculator uses, the currency presentation
/// hints for the frontend, and the low-stock threshold for catalog alerts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StoreSettings {
    pub tenant_id: String,
    pub store_name: String,
    pub store_address: Option<String>,
    pub store_phone: Option<String>,
    /// Tax rate in basis points (1800 = 18%).
    pub tax_rate_bps: i64,
    pub currency_symbol: String,
    pub currency_code: String,
    /// Tenant UPI handle (VPA) shown on UPI checkout, if configured.
    pub upi_id: Option<String>,
    pub low_stock_threshold: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StoreSettings {
    /// Returns the configured tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps as u32)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(1800);
        assert_eq!(rate.bps(), 1800);
        assert!((rate.percentage() - 18.0).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(8.25);
        assert_eq!(rate.bps(), 825);
    }

    #[test]
    fn test_sale_status_default() {
        assert_eq!(SaleStatus::default(), SaleStatus::Completed);
    }

    #[test]
    fn test_upi_status_default() {
        assert_eq!(UpiStatus::default(), UpiStatus::Na);
    }

    #[test]
    fn test_product_stock_checks() {
        let product = Product {
            id: "p1".to_string(),
            tenant_id: "t1".to_string(),
            store_id: None,
            sku: "COKE-330".to_string(),
            barcode: None,
            name: "Coca-Cola 330ml".to_string(),
            category: None,
            price_cents: 4000,
            stock: 5,
            low_stock_threshold: 5,
            status: ProductStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(product.is_active());
        assert!(product.can_fulfill(5));
        assert!(!product.can_fulfill(6));
        assert!(product.is_low_stock());
    }
}
