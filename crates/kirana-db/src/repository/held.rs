//! # Held Sale Repository
//!
//! Persistence for held sales: named cart snapshots a cashier can park and
//! resume later. A held sale is just data: it holds no stock, consumes no
//! invoice number, and only becomes a sale when resumed and checked out
//! through the normal flow.
//!
//! The cart travels as a JSON payload; the row carries only the columns
//! needed to list and find snapshots.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kirana_core::{Cart, HeldSale};

/// Raw row shape; the cart payload is deserialized on the way out.
#[derive(sqlx::FromRow)]
struct HeldSaleRow {
    id: String,
    tenant_id: String,
    label: String,
    payload: String,
    created_at: DateTime<Utc>,
}

impl HeldSaleRow {
    fn into_held_sale(self) -> DbResult<HeldSale> {
        let cart: Cart = serde_json::from_str(&self.payload)
            .map_err(|e| DbError::Internal(format!("corrupt held-sale payload: {e}")))?;
        Ok(HeldSale {
            id: self.id,
            tenant_id: self.tenant_id,
            label: self.label,
            cart,
            created_at: self.created_at,
        })
    }
}

/// Repository for held-sale snapshots.
#[derive(Debug, Clone)]
pub struct HeldSaleRepository {
    pool: SqlitePool,
}

impl HeldSaleRepository {
    /// Creates a new HeldSaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        HeldSaleRepository { pool }
    }

    /// Saves a cart snapshot under a label.
    pub async fn hold(&self, tenant_id: &str, label: &str, cart: &Cart) -> DbResult<HeldSale> {
        let held = HeldSale {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            label: label.to_string(),
            cart: cart.clone(),
            created_at: Utc::now(),
        };

        let payload = serde_json::to_string(&held.cart)
            .map_err(|e| DbError::Internal(format!("cart serialization failed: {e}")))?;

        debug!(id = %held.id, label = %held.label, "Holding sale");

        sqlx::query(
            r#"
            INSERT INTO held_sales (id, tenant_id, label, payload, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&held.id)
        .bind(&held.tenant_id)
        .bind(&held.label)
        .bind(payload)
        .bind(held.created_at)
        .execute(&self.pool)
        .await?;

        Ok(held)
    }

    /// Lists a tenant's held sales, newest first.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<HeldSale>> {
        let rows = sqlx::query_as::<_, HeldSaleRow>(
            r#"
            SELECT id, tenant_id, label, payload, created_at
            FROM held_sales
            WHERE tenant_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HeldSaleRow::into_held_sale).collect()
    }

    /// Gets one held sale.
    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<HeldSale>> {
        let row = sqlx::query_as::<_, HeldSaleRow>(
            r#"
            SELECT id, tenant_id, label, payload, created_at
            FROM held_sales
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(HeldSaleRow::into_held_sale).transpose()
    }

    /// Deletes a held sale (on resume, or when abandoned).
    pub async fn delete(&self, tenant_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM held_sales WHERE tenant_id = ?1 AND id = ?2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Held sale", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use kirana_core::{Product, ProductStatus};

    async fn test_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query("INSERT INTO tenants (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind("tenant-1")
            .bind("Test Tenant")
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();
        db
    }

    fn sample_cart() -> Cart {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            tenant_id: "tenant-1".to_string(),
            store_id: None,
            sku: "CHAI-100".to_string(),
            barcode: None,
            name: "Chai 100g".to_string(),
            category: None,
            price_cents: 5500,
            stock: 20,
            low_stock_threshold: 5,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let mut cart = Cart::new();
        cart.add_item(&product, 2).unwrap();
        cart
    }

    #[tokio::test]
    async fn test_hold_and_resume_roundtrip() {
        let db = test_db().await;
        let repo = db.held_sales();

        let held = repo.hold("tenant-1", "Table 4", &sample_cart()).await.unwrap();

        let fetched = repo.get("tenant-1", &held.id).await.unwrap().unwrap();
        assert_eq!(fetched.label, "Table 4");
        assert_eq!(fetched.cart.total_quantity(), 2);
        assert_eq!(fetched.cart.items[0].sku, "CHAI-100");

        // Resume deletes the snapshot
        repo.delete("tenant-1", &held.id).await.unwrap();
        assert!(repo.get("tenant-1", &held.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_tenant_scoped() {
        let db = test_db().await;
        let repo = db.held_sales();

        repo.hold("tenant-1", "Counter 1", &sample_cart()).await.unwrap();

        assert_eq!(repo.list("tenant-1").await.unwrap().len(), 1);
        assert!(repo.list("tenant-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let db = test_db().await;
        let err = db
            .held_sales()
            .delete("tenant-1", "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
