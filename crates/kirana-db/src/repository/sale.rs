//! # Sale Repository
//!
//! The checkout transaction and sale queries.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Checkout Transaction (one unit)                        │
//! │                                                                         │
//! │  1. RE-VALIDATE                                                        │
//! │     └── Each product exists, is active, has stock ≥ quantity           │
//! │         (defense against stale client-side cart data)                  │
//! │                                                                         │
//! │  2. RE-DERIVE TOTALS                                                   │
//! │     └── SaleTotals::compute() over live catalog prices                 │
//! │         Client figures are display-only; the server's math is law      │
//! │                                                                         │
//! │  3. ALLOCATE INVOICE NUMBER                                            │
//! │     └── Atomic counter increment per (tenant, year)                    │
//! │         First write in the transaction → takes the write lock          │
//! │                                                                         │
//! │  4. INSERT sale + sale_items                                           │
//! │                                                                         │
//! │  5. DECREMENT STOCK                                                    │
//! │     └── UPDATE ... SET stock = stock - qty WHERE stock >= qty          │
//! │                                                                         │
//! │  6. COMMIT, or roll back the whole thing on any failure                │
//! │                                                                         │
//! │  Invoice conflicts and lock contention retry the full sequence,        │
//! │  bounded. Business-rule rejections never leave partial state.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kirana_core::{
    validation, CoreError, DiscountSpec, InvoiceNumber, LineItem, Money, PaymentMethod, Product,
    Sale, SaleItem, SaleStatus, SaleTotals, TaxRate, UpiStatus, MAX_CART_ITEMS,
};

/// Maximum attempts for a checkout when invoice allocation or the write
/// lock races with a concurrent checkout.
const MAX_CHECKOUT_ATTEMPTS: u32 = 3;

/// How many products the sales summary reports as top sellers.
const TOP_PRODUCT_LIMIT: u32 = 5;

// =============================================================================
// Inputs
// =============================================================================

/// One requested line of a checkout: the client sends product references
/// and quantities only; prices are resolved from the catalog server-side.
#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub product_id: String,
    pub quantity: i64,
}

/// A validated checkout request, ready for the transaction.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub store_id: Option<String>,
    pub customer_id: Option<String>,
    pub cashier_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub items: Vec<NewSaleItem>,
    pub discount: DiscountSpec,
    /// Tendered amount. For card/UPI this is fixed to the total.
    pub paid: Money,
}

/// Optional filters shared by the sale listing and the summary.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub customer_id: Option<String>,
    pub cashier_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Outputs
// =============================================================================

/// A sale together with its line items.
#[derive(Debug, Clone)]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Revenue per payment method.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentBreakdown {
    pub payment_method: PaymentMethod,
    pub total_cents: i64,
}

/// A top-selling product by quantity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

/// Aggregates over a tenant's completed sales.
#[derive(Debug, Clone)]
pub struct SalesSummary {
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    pub total_discount_cents: i64,
    pub average_order_value_cents: i64,
    pub payment_breakdown: Vec<PaymentBreakdown>,
    pub top_products: Vec<TopProduct>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Finalizes a checkout: validates, re-derives totals, allocates the
    /// invoice number, persists the sale, and moves stock, atomically.
    ///
    /// Retries the whole transaction on invoice conflicts and lock
    /// contention, up to [`MAX_CHECKOUT_ATTEMPTS`]. Business-rule
    /// rejections (`ProductNotFound`, `ProductInactive`,
    /// `InsufficientStock`, payment validation) are terminal and leave no
    /// partial state.
    pub async fn create_sale(
        &self,
        tenant_id: &str,
        new_sale: &NewSale,
        tax_rate: TaxRate,
    ) -> DbResult<SaleWithItems> {
        // Reject malformed input before touching the database
        if new_sale.items.is_empty() {
            return Err(CoreError::EmptySale.into());
        }
        if new_sale.items.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            }
            .into());
        }
        for item in &new_sale.items {
            validation::validate_quantity(item.quantity).map_err(CoreError::from)?;
        }
        validation::validate_discount(&new_sale.discount).map_err(CoreError::from)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_create_sale(tenant_id, new_sale, tax_rate).await {
                Err(err) if err.is_retryable() && attempt < MAX_CHECKOUT_ATTEMPTS => {
                    warn!(attempt, error = %err, "Checkout conflict, retrying");
                }
                other => return other,
            }
        }
    }

    /// One attempt at the checkout transaction. Dropping the transaction on
    /// any error path rolls everything back.
    async fn try_create_sale(
        &self,
        tenant_id: &str,
        new_sale: &NewSale,
        tax_rate: TaxRate,
    ) -> DbResult<SaleWithItems> {
        let mut tx = self.pool.begin().await?;

        // Aggregate requested quantities per product; BTreeMap keeps the
        // re-validation order deterministic.
        let mut requested: BTreeMap<&str, i64> = BTreeMap::new();
        for item in &new_sale.items {
            *requested.entry(item.product_id.as_str()).or_insert(0) += item.quantity;
        }

        // Re-validate every product against live catalog data
        let mut products: BTreeMap<&str, Product> = BTreeMap::new();
        for (&product_id, &quantity) in &requested {
            let product = sqlx::query_as::<_, Product>(
                r#"
                SELECT id, tenant_id, store_id, sku, barcode, name, category,
                       price_cents, stock, low_stock_threshold, status,
                       created_at, updated_at
                FROM products
                WHERE tenant_id = ?1 AND id = ?2
                "#,
            )
            .bind(tenant_id)
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

            if !product.is_active() {
                return Err(CoreError::ProductInactive(product.sku).into());
            }
            if !product.can_fulfill(quantity) {
                return Err(CoreError::InsufficientStock {
                    sku: product.sku,
                    available: product.stock,
                    requested: quantity,
                }
                .into());
            }
            products.insert(product_id, product);
        }

        // Server-side derivation from catalog prices; the client's figures
        // are display-only
        let lines: Vec<LineItem> = new_sale
            .items
            .iter()
            .map(|item| LineItem {
                product_id: item.product_id.clone(),
                unit_price: products[item.product_id.as_str()].price(),
                quantity: item.quantity,
            })
            .collect();
        let totals = SaleTotals::compute(&lines, new_sale.discount, tax_rate);

        validation::validate_paid_amount(new_sale.payment_method, new_sale.paid, totals.total)
            .map_err(CoreError::from)?;
        let (paid, change) = totals.settle(new_sale.payment_method, new_sale.paid);

        let now = Utc::now();
        let invoice = allocate_invoice(&mut tx, tenant_id, now.year()).await?;

        let upi_status = match new_sale.payment_method {
            PaymentMethod::Upi => UpiStatus::Pending,
            _ => UpiStatus::Na,
        };

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            store_id: new_sale.store_id.clone(),
            invoice_no: invoice.to_string(),
            customer_id: new_sale.customer_id.clone(),
            cashier_id: new_sale.cashier_id.clone(),
            payment_method: new_sale.payment_method,
            upi_status,
            subtotal_cents: totals.subtotal.cents(),
            discount_cents: totals.discount.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.total.cents(),
            paid_amount_cents: paid.cents(),
            change_amount_cents: change.cents(),
            status: SaleStatus::Completed,
            created_at: now,
        };

        debug!(id = %sale.id, invoice_no = %sale.invoice_no, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, store_id, invoice_no, customer_id, cashier_id,
                payment_method, upi_status,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                paid_amount_cents, change_amount_cents, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.tenant_id)
        .bind(&sale.store_id)
        .bind(&sale.invoice_no)
        .bind(&sale.customer_id)
        .bind(&sale.cashier_id)
        .bind(sale.payment_method)
        .bind(sale.upi_status)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.paid_amount_cents)
        .bind(sale.change_amount_cents)
        .bind(sale.status)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        // One sale_items row per requested line, with the product snapshot
        // frozen at sale time
        let mut sale_items = Vec::with_capacity(new_sale.items.len());
        for item in &new_sale.items {
            let product = &products[item.product_id.as_str()];
            let sale_item = SaleItem {
                id: Uuid::new_v4().to_string(),
                tenant_id: tenant_id.to_string(),
                sale_id: sale.id.clone(),
                product_id: Some(product.id.clone()),
                sku_snapshot: product.sku.clone(),
                name_snapshot: product.name.clone(),
                quantity: item.quantity,
                unit_price_cents: product.price_cents,
                total_cents: product.price_cents * item.quantity,
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, tenant_id, sale_id, product_id,
                    sku_snapshot, name_snapshot,
                    quantity, unit_price_cents, total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&sale_item.id)
            .bind(&sale_item.tenant_id)
            .bind(&sale_item.sale_id)
            .bind(&sale_item.product_id)
            .bind(&sale_item.sku_snapshot)
            .bind(&sale_item.name_snapshot)
            .bind(sale_item.quantity)
            .bind(sale_item.unit_price_cents)
            .bind(sale_item.total_cents)
            .execute(&mut *tx)
            .await?;

            sale_items.push(sale_item);
        }

        // Guarded decrement: zero rows affected means the stock moved under
        // us, despite the validation above
        for (&product_id, &quantity) in &requested {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?3, updated_at = ?4
                WHERE tenant_id = ?1 AND id = ?2 AND stock >= ?3
                "#,
            )
            .bind(tenant_id)
            .bind(product_id)
            .bind(quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let product = &products[product_id];
                return Err(CoreError::InsufficientStock {
                    sku: product.sku.clone(),
                    available: product.stock,
                    requested: quantity,
                }
                .into());
            }
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            invoice_no = %sale.invoice_no,
            total = %sale.total_cents,
            items = sale_items.len(),
            "Sale completed"
        );

        Ok(SaleWithItems {
            sale,
            items: sale_items,
        })
    }

    /// Gets a sale with its items.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<SaleWithItems>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, tenant_id, store_id, invoice_no, customer_id, cashier_id,
                   payment_method, upi_status,
                   subtotal_cents, discount_cents, tax_cents, total_cents,
                   paid_amount_cents, change_amount_cents, status, created_at
            FROM sales
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(sale) = sale else {
            return Ok(None);
        };

        let items = self.get_items(&sale.id).await?;
        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Gets all items for a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, tenant_id, sale_id, product_id,
                   sku_snapshot, name_snapshot,
                   quantity, unit_price_cents, total_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists sales for a tenant, newest first, with optional filters.
    pub async fn list(
        &self,
        tenant_id: &str,
        filter: &SaleFilter,
        limit: u32,
        offset: u32,
    ) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, tenant_id, store_id, invoice_no, customer_id, cashier_id,
                   payment_method, upi_status,
                   subtotal_cents, discount_cents, tax_cents, total_cents,
                   paid_amount_cents, change_amount_cents, status, created_at
            FROM sales
            WHERE tenant_id = ?1
              AND (?2 IS NULL OR customer_id = ?2)
              AND (?3 IS NULL OR cashier_id = ?3)
              AND (?4 IS NULL OR created_at >= ?4)
              AND (?5 IS NULL OR created_at <= ?5)
            ORDER BY created_at DESC
            LIMIT ?6 OFFSET ?7
            "#,
        )
        .bind(tenant_id)
        .bind(&filter.customer_id)
        .bind(&filter.cashier_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Aggregates completed sales: counts, revenue, discounts, payment
    /// breakdown, and top products by quantity.
    pub async fn summary(&self, tenant_id: &str, filter: &SaleFilter) -> DbResult<SalesSummary> {
        let (total_sales, total_revenue_cents, total_discount_cents): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT COUNT(id),
                       COALESCE(SUM(total_cents), 0),
                       COALESCE(SUM(discount_cents), 0)
                FROM sales
                WHERE tenant_id = ?1
                  AND status = 'completed'
                  AND (?2 IS NULL OR customer_id = ?2)
                  AND (?3 IS NULL OR cashier_id = ?3)
                  AND (?4 IS NULL OR created_at >= ?4)
                  AND (?5 IS NULL OR created_at <= ?5)
                "#,
            )
            .bind(tenant_id)
            .bind(&filter.customer_id)
            .bind(&filter.cashier_id)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_one(&self.pool)
            .await?;

        let payment_breakdown = sqlx::query_as::<_, PaymentBreakdown>(
            r#"
            SELECT payment_method, COALESCE(SUM(total_cents), 0) AS total_cents
            FROM sales
            WHERE tenant_id = ?1
              AND status = 'completed'
              AND (?2 IS NULL OR customer_id = ?2)
              AND (?3 IS NULL OR cashier_id = ?3)
              AND (?4 IS NULL OR created_at >= ?4)
              AND (?5 IS NULL OR created_at <= ?5)
            GROUP BY payment_method
            "#,
        )
        .bind(tenant_id)
        .bind(&filter.customer_id)
        .bind(&filter.cashier_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await?;

        let top_products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT si.product_id,
                   si.name_snapshot AS name,
                   COALESCE(SUM(si.quantity), 0) AS quantity,
                   COALESCE(SUM(si.total_cents), 0) AS revenue_cents
            FROM sale_items si
            INNER JOIN sales s ON s.id = si.sale_id
            WHERE s.tenant_id = ?1
              AND s.status = 'completed'
              AND (?2 IS NULL OR s.customer_id = ?2)
              AND (?3 IS NULL OR s.cashier_id = ?3)
              AND (?4 IS NULL OR s.created_at >= ?4)
              AND (?5 IS NULL OR s.created_at <= ?5)
            GROUP BY si.product_id, si.name_snapshot
            ORDER BY SUM(si.quantity) DESC
            LIMIT ?6
            "#,
        )
        .bind(tenant_id)
        .bind(&filter.customer_id)
        .bind(&filter.cashier_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(TOP_PRODUCT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let average_order_value_cents = if total_sales > 0 {
            total_revenue_cents / total_sales
        } else {
            0
        };

        Ok(SalesSummary {
            total_sales,
            total_revenue_cents,
            total_discount_cents,
            average_order_value_cents,
            payment_breakdown,
            top_products,
        })
    }

    /// Transitions a UPI sale's payment status.
    ///
    /// The only mutation a persisted sale permits: `pending → completed`
    /// or `pending → failed`, on UPI sales only.
    pub async fn update_upi_status(
        &self,
        tenant_id: &str,
        sale_id: &str,
        status: UpiStatus,
    ) -> DbResult<Sale> {
        if !matches!(status, UpiStatus::Completed | UpiStatus::Failed) {
            return Err(CoreError::Validation(kirana_core::ValidationError::InvalidFormat {
                field: "upi_status".to_string(),
                reason: "must be 'completed' or 'failed'".to_string(),
            })
            .into());
        }

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET upi_status = ?3
            WHERE tenant_id = ?1 AND id = ?2
              AND payment_method = 'upi' AND upi_status = 'pending'
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish "no such sale" from "not a pending UPI sale"
            let current = self.get_by_id(tenant_id, sale_id).await?;
            return match current {
                None => Err(DbError::not_found("Sale", sale_id)),
                Some(with_items) => Err(CoreError::InvalidSaleStatus {
                    sale_id: sale_id.to_string(),
                    current_status: format!(
                        "{:?}/{:?}",
                        with_items.sale.payment_method, with_items.sale.upi_status
                    ),
                }
                .into()),
            };
        }

        info!(sale_id = %sale_id, status = ?status, "UPI status updated");

        let updated = self
            .get_by_id(tenant_id, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;
        Ok(updated.sale)
    }
}

// =============================================================================
// Invoice Allocation
// =============================================================================

/// Allocates the next invoice number for a (tenant, year), atomically.
///
/// ## How The Race Is Closed
/// The counter `UPDATE` is the first write of the checkout transaction, so
/// it takes SQLite's write lock; a concurrent checkout for the same tenant
/// blocks until this transaction commits or rolls back, then reads the
/// now-current counter. A rolled-back checkout also rolls back its
/// increment, so sequences stay dense.
///
/// On first use of a (tenant, year) the counter is seeded from the highest
/// existing invoice of that year; with no prior sales the year starts at
/// `INV-<year>-0001`. A malformed stored invoice number fails the checkout
/// loudly rather than silently restarting the sequence.
async fn allocate_invoice(
    tx: &mut Transaction<'_, Sqlite>,
    tenant_id: &str,
    year: i32,
) -> DbResult<InvoiceNumber> {
    // Fast path: counter row exists, increment and claim
    let claimed: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE invoice_counters
        SET next_sequence = next_sequence + 1
        WHERE tenant_id = ?1 AND year = ?2
        RETURNING next_sequence - 1
        "#,
    )
    .bind(tenant_id)
    .bind(year)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(sequence) = claimed {
        return Ok(InvoiceNumber::new(year, sequence as u32));
    }

    // Seed path: find the highest invoice already issued this year.
    // The CAST orders by the numeric sequence, not lexicographically, so
    // INV-2026-10000 outranks INV-2026-9999.
    let prefix = InvoiceNumber::year_prefix(year);
    let latest: Option<String> = sqlx::query_scalar(
        r#"
        SELECT invoice_no
        FROM sales
        WHERE tenant_id = ?1 AND invoice_no LIKE ?2 || '%'
        ORDER BY CAST(SUBSTR(invoice_no, LENGTH(?2) + 1) AS INTEGER) DESC
        LIMIT 1
        "#,
    )
    .bind(tenant_id)
    .bind(&prefix)
    .fetch_optional(&mut **tx)
    .await?;

    let next = match latest {
        Some(raw) => InvoiceNumber::parse(&raw)
            .map_err(DbError::Domain)?
            .next(),
        None => InvoiceNumber::first(year),
    };

    sqlx::query(
        r#"
        INSERT INTO invoice_counters (tenant_id, year, next_sequence)
        VALUES (?1, ?2, ?3)
        "#,
    )
    .bind(tenant_id)
    .bind(year)
    .bind(next.sequence() as i64 + 1)
    .execute(&mut **tx)
    .await?;

    Ok(next)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use kirana_core::ProductStatus;

    const TENANT: &str = "tenant-1";

    async fn test_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query("INSERT INTO tenants (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(TENANT)
            .bind("Test Tenant")
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();
        db
    }

    async fn seed_product(db: &Database, sku: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            tenant_id: TENANT.to_string(),
            store_id: None,
            sku: sku.to_string(),
            barcode: None,
            name: format!("Product {sku}"),
            category: None,
            price_cents,
            stock,
            low_stock_threshold: 5,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    fn cash_sale(items: Vec<NewSaleItem>, paid_cents: i64) -> NewSale {
        NewSale {
            store_id: None,
            customer_id: None,
            cashier_id: Some("cashier-1".to_string()),
            payment_method: PaymentMethod::Cash,
            items,
            discount: DiscountSpec::none(),
            paid: Money::from_cents(paid_cents),
        }
    }

    fn current_year() -> i32 {
        Utc::now().year()
    }

    #[tokio::test]
    async fn test_checkout_happy_path() {
        let db = test_db().await;
        let a = seed_product(&db, "A", 4000, 10).await;
        let b = seed_product(&db, "B", 2000, 10).await;

        // [{40.00 × 2}, {20.00 × 4}], no discount, 18% tax, 200.00 tendered
        let new_sale = cash_sale(
            vec![
                NewSaleItem {
                    product_id: a.id.clone(),
                    quantity: 2,
                },
                NewSaleItem {
                    product_id: b.id.clone(),
                    quantity: 4,
                },
            ],
            20000,
        );

        let result = db
            .sales()
            .create_sale(TENANT, &new_sale, TaxRate::from_bps(1800))
            .await
            .unwrap();

        assert_eq!(
            result.sale.invoice_no,
            format!("INV-{}-0001", current_year())
        );
        assert_eq!(result.sale.subtotal_cents, 16000);
        assert_eq!(result.sale.discount_cents, 0);
        assert_eq!(result.sale.tax_cents, 2880);
        assert_eq!(result.sale.total_cents, 18880);
        assert_eq!(result.sale.paid_amount_cents, 20000);
        assert_eq!(result.sale.change_amount_cents, 1120);
        assert_eq!(result.sale.status, SaleStatus::Completed);
        assert_eq!(result.items.len(), 2);

        // Stock moved
        let a_after = db.products().get_by_id(TENANT, &a.id).await.unwrap().unwrap();
        let b_after = db.products().get_by_id(TENANT, &b.id).await.unwrap().unwrap();
        assert_eq!(a_after.stock, 8);
        assert_eq!(b_after.stock, 6);
    }

    #[tokio::test]
    async fn test_flat_discount_checkout() {
        let db = test_db().await;
        let p = seed_product(&db, "P", 10000, 10).await;

        let mut new_sale = cash_sale(
            vec![NewSaleItem {
                product_id: p.id.clone(),
                quantity: 1,
            }],
            10620,
        );
        new_sale.discount = DiscountSpec::Flat {
            amount: Money::from_cents(1000),
        };

        let result = db
            .sales()
            .create_sale(TENANT, &new_sale, TaxRate::from_bps(1800))
            .await
            .unwrap();

        assert_eq!(result.sale.subtotal_cents, 10000);
        assert_eq!(result.sale.discount_cents, 1000);
        assert_eq!(result.sale.tax_cents, 1620);
        assert_eq!(result.sale.total_cents, 10620);
        assert_eq!(result.sale.change_amount_cents, 0);
    }

    #[tokio::test]
    async fn test_invoice_numbers_are_sequential() {
        let db = test_db().await;
        let p = seed_product(&db, "P", 1000, 100).await;

        for expected_seq in 1..=3 {
            let result = db
                .sales()
                .create_sale(
                    TENANT,
                    &cash_sale(
                        vec![NewSaleItem {
                            product_id: p.id.clone(),
                            quantity: 1,
                        }],
                        1000,
                    ),
                    TaxRate::zero(),
                )
                .await
                .unwrap();
            assert_eq!(
                result.sale.invoice_no,
                format!("INV-{}-{:04}", current_year(), expected_seq)
            );
        }
    }

    #[tokio::test]
    async fn test_counter_seeds_from_existing_invoices() {
        let db = test_db().await;
        let p = seed_product(&db, "P", 1000, 100).await;

        // A pre-existing sale from before the counter table was in use
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, invoice_no, payment_method, upi_status,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                paid_amount_cents, change_amount_cents, status, created_at
            ) VALUES (?1, ?2, ?3, 'cash', 'na', 1000, 0, 0, 1000, 1000, 0, 'completed', ?4)
            "#,
        )
        .bind("legacy-sale")
        .bind(TENANT)
        .bind(format!("INV-{}-0041", current_year()))
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

        let result = db
            .sales()
            .create_sale(
                TENANT,
                &cash_sale(
                    vec![NewSaleItem {
                        product_id: p.id.clone(),
                        quantity: 1,
                    }],
                    1000,
                ),
                TaxRate::zero(),
            )
            .await
            .unwrap();

        assert_eq!(
            result.sale.invoice_no,
            format!("INV-{}-0042", current_year())
        );
    }

    #[tokio::test]
    async fn test_year_rollover_restarts_at_one() {
        let db = test_db().await;

        // Exhaust some numbers in the current year, then allocate directly
        // for the following year
        let mut tx = db.pool().begin().await.unwrap();
        let this_year = allocate_invoice(&mut tx, TENANT, 2025).await.unwrap();
        let again = allocate_invoice(&mut tx, TENANT, 2025).await.unwrap();
        let next_year = allocate_invoice(&mut tx, TENANT, 2026).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(this_year.to_string(), "INV-2025-0001");
        assert_eq!(again.to_string(), "INV-2025-0002");
        assert_eq!(next_year.to_string(), "INV-2026-0001");
    }

    #[tokio::test]
    async fn test_malformed_invoice_fails_loudly() {
        let db = test_db().await;
        let p = seed_product(&db, "P", 1000, 100).await;

        // A corrupted invoice number in this year's range
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, invoice_no, payment_method, upi_status,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                paid_amount_cents, change_amount_cents, status, created_at
            ) VALUES (?1, ?2, ?3, 'cash', 'na', 1000, 0, 0, 1000, 1000, 0, 'completed', ?4)
            "#,
        )
        .bind("corrupt-sale")
        .bind(TENANT)
        .bind(format!("INV-{}-QQQQ", current_year()))
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

        let err = db
            .sales()
            .create_sale(
                TENANT,
                &cash_sale(
                    vec![NewSaleItem {
                        product_id: p.id.clone(),
                        quantity: 1,
                    }],
                    1000,
                ),
                TaxRate::zero(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::MalformedInvoiceNumber(_))
        ));
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let db = test_db().await;
        let a = seed_product(&db, "A", 4000, 10).await;
        let b = seed_product(&db, "B", 2000, 3).await;

        // Second line exceeds stock; the whole checkout must fail
        let err = db
            .sales()
            .create_sale(
                TENANT,
                &cash_sale(
                    vec![
                        NewSaleItem {
                            product_id: a.id.clone(),
                            quantity: 2,
                        },
                        NewSaleItem {
                            product_id: b.id.clone(),
                            quantity: 5,
                        },
                    ],
                    100000,
                ),
                TaxRate::zero(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 3, requested: 5, .. })
        ));

        // No partial state: no sales, no items, stock untouched
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);

        let a_after = db.products().get_by_id(TENANT, &a.id).await.unwrap().unwrap();
        assert_eq!(a_after.stock, 10);

        // The rolled-back attempt did not burn an invoice number
        let p = seed_product(&db, "C", 1000, 10).await;
        let ok = db
            .sales()
            .create_sale(
                TENANT,
                &cash_sale(
                    vec![NewSaleItem {
                        product_id: p.id,
                        quantity: 1,
                    }],
                    1000,
                ),
                TaxRate::zero(),
            )
            .await
            .unwrap();
        assert_eq!(ok.sale.invoice_no, format!("INV-{}-0001", current_year()));
    }

    #[tokio::test]
    async fn test_inactive_product_rejected() {
        let db = test_db().await;
        let p = seed_product(&db, "P", 1000, 10).await;
        db.products().soft_delete(TENANT, &p.id).await.unwrap();

        let err = db
            .sales()
            .create_sale(
                TENANT,
                &cash_sale(
                    vec![NewSaleItem {
                        product_id: p.id,
                        quantity: 1,
                    }],
                    1000,
                ),
                TaxRate::zero(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::ProductInactive(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let db = test_db().await;

        let err = db
            .sales()
            .create_sale(
                TENANT,
                &cash_sale(
                    vec![NewSaleItem {
                        product_id: "missing".to_string(),
                        quantity: 1,
                    }],
                    1000,
                ),
                TaxRate::zero(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_sale_rejected() {
        let db = test_db().await;

        let err = db
            .sales()
            .create_sale(TENANT, &cash_sale(vec![], 1000), TaxRate::zero())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::EmptySale)));
    }

    #[tokio::test]
    async fn test_oversized_sale_rejected() {
        let db = test_db().await;

        let items = (0..=MAX_CART_ITEMS)
            .map(|i| NewSaleItem {
                product_id: format!("p-{i}"),
                quantity: 1,
            })
            .collect();

        let err = db
            .sales()
            .create_sale(TENANT, &cash_sale(items, 1000), TaxRate::zero())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::CartTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_cash_underpayment_rejected() {
        let db = test_db().await;
        let p = seed_product(&db, "P", 10000, 10).await;

        let err = db
            .sales()
            .create_sale(
                TENANT,
                &cash_sale(
                    vec![NewSaleItem {
                        product_id: p.id.clone(),
                        quantity: 1,
                    }],
                    // 50.00 against a 100.00 total
                    5000,
                ),
                TaxRate::zero(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        // Nothing persisted
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_upi_sale_fixes_paid_amount() {
        let db = test_db().await;
        let p = seed_product(&db, "P", 10000, 10).await;

        let new_sale = NewSale {
            store_id: None,
            customer_id: None,
            cashier_id: None,
            payment_method: PaymentMethod::Upi,
            items: vec![NewSaleItem {
                product_id: p.id.clone(),
                quantity: 1,
            }],
            discount: DiscountSpec::none(),
            paid: Money::zero(), // ignored for UPI
        };

        let result = db
            .sales()
            .create_sale(TENANT, &new_sale, TaxRate::from_bps(1800))
            .await
            .unwrap();

        assert_eq!(result.sale.paid_amount_cents, result.sale.total_cents);
        assert_eq!(result.sale.change_amount_cents, 0);
        assert_eq!(result.sale.upi_status, UpiStatus::Pending);
    }

    #[tokio::test]
    async fn test_upi_status_transition() {
        let db = test_db().await;
        let p = seed_product(&db, "P", 10000, 10).await;

        let new_sale = NewSale {
            store_id: None,
            customer_id: None,
            cashier_id: None,
            payment_method: PaymentMethod::Upi,
            items: vec![NewSaleItem {
                product_id: p.id.clone(),
                quantity: 1,
            }],
            discount: DiscountSpec::none(),
            paid: Money::zero(),
        };
        let created = db
            .sales()
            .create_sale(TENANT, &new_sale, TaxRate::zero())
            .await
            .unwrap();

        // pending → completed
        let updated = db
            .sales()
            .update_upi_status(TENANT, &created.sale.id, UpiStatus::Completed)
            .await
            .unwrap();
        assert_eq!(updated.upi_status, UpiStatus::Completed);

        // Already transitioned: refused
        let err = db
            .sales()
            .update_upi_status(TENANT, &created.sale.id, UpiStatus::Failed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidSaleStatus { .. })
        ));

        // Target status must be terminal
        let err = db
            .sales()
            .update_upi_status(TENANT, &created.sale.id, UpiStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_cash_sale_rejects_upi_transition() {
        let db = test_db().await;
        let p = seed_product(&db, "P", 1000, 10).await;

        let created = db
            .sales()
            .create_sale(
                TENANT,
                &cash_sale(
                    vec![NewSaleItem {
                        product_id: p.id,
                        quantity: 1,
                    }],
                    1000,
                ),
                TaxRate::zero(),
            )
            .await
            .unwrap();

        let err = db
            .sales()
            .update_upi_status(TENANT, &created.sale.id, UpiStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidSaleStatus { .. })
        ));
    }

    /// N parallel checkouts for one tenant produce N distinct invoice
    /// numbers and lose no stock updates.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_checkouts() {
        let db = test_db().await;
        let p = seed_product(&db, "P", 1000, 100).await;

        const N: usize = 8;
        let mut handles = Vec::with_capacity(N);
        for _ in 0..N {
            let db = db.clone();
            let product_id = p.id.clone();
            handles.push(tokio::spawn(async move {
                db.sales()
                    .create_sale(
                        TENANT,
                        &NewSale {
                            store_id: None,
                            customer_id: None,
                            cashier_id: None,
                            payment_method: PaymentMethod::Cash,
                            items: vec![NewSaleItem {
                                product_id,
                                quantity: 2,
                            }],
                            discount: DiscountSpec::none(),
                            paid: Money::from_cents(2000),
                        },
                        TaxRate::zero(),
                    )
                    .await
            }));
        }

        let mut invoice_numbers = std::collections::HashSet::new();
        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            invoice_numbers.insert(result.sale.invoice_no);
        }

        // All invoices distinct
        assert_eq!(invoice_numbers.len(), N);

        // final_stock == initial_stock - Σ quantities sold
        let after = db.products().get_by_id(TENANT, &p.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 100 - (N as i64) * 2);
    }

    #[tokio::test]
    async fn test_get_by_id_includes_items() {
        let db = test_db().await;
        let p = seed_product(&db, "P", 1000, 10).await;

        let created = db
            .sales()
            .create_sale(
                TENANT,
                &cash_sale(
                    vec![NewSaleItem {
                        product_id: p.id,
                        quantity: 3,
                    }],
                    3000,
                ),
                TaxRate::zero(),
            )
            .await
            .unwrap();

        let fetched = db
            .sales()
            .get_by_id(TENANT, &created.sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.items[0].quantity, 3);
        assert_eq!(fetched.items[0].sku_snapshot, "P");
        assert_eq!(fetched.items[0].total_cents, 3000);

        // Cross-tenant fetch sees nothing
        assert!(db
            .sales()
            .get_by_id("tenant-2", &created.sale.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_and_summary() {
        let db = test_db().await;
        let p = seed_product(&db, "P", 5000, 100).await;

        for _ in 0..3 {
            db.sales()
                .create_sale(
                    TENANT,
                    &cash_sale(
                        vec![NewSaleItem {
                            product_id: p.id.clone(),
                            quantity: 2,
                        }],
                        10000,
                    ),
                    TaxRate::zero(),
                )
                .await
                .unwrap();
        }

        let sales = db
            .sales()
            .list(TENANT, &SaleFilter::default(), 50, 0)
            .await
            .unwrap();
        assert_eq!(sales.len(), 3);

        let summary = db
            .sales()
            .summary(TENANT, &SaleFilter::default())
            .await
            .unwrap();
        assert_eq!(summary.total_sales, 3);
        assert_eq!(summary.total_revenue_cents, 30000);
        assert_eq!(summary.total_discount_cents, 0);
        assert_eq!(summary.average_order_value_cents, 10000);
        assert_eq!(summary.payment_breakdown.len(), 1);
        assert_eq!(summary.payment_breakdown[0].total_cents, 30000);
        assert_eq!(summary.top_products.len(), 1);
        assert_eq!(summary.top_products[0].quantity, 6);
        assert_eq!(summary.top_products[0].revenue_cents, 30000);
    }
}
