//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! Every query is scoped by `tenant_id`, explicitly, in each statement.
//! The contract: one tenant can never observe or mutate another tenant's
//! rows.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kirana_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// // Search the catalog
/// let results = repo.search(tenant_id, "coke", 20).await?;
///
/// // Get by ID
/// let product = repo.get_by_id(tenant_id, "uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products for a tenant, sorted by name.
    pub async fn list(&self, tenant_id: &str, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, store_id, sku, barcode, name, category,
                   price_cents, stock, low_stock_threshold, status,
                   created_at, updated_at
            FROM products
            WHERE tenant_id = ?1 AND status = 'active'
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches active products by SKU, name, or barcode prefix.
    ///
    /// An empty query falls back to the plain listing.
    pub async fn search(&self, tenant_id: &str, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list(tenant_id, limit).await;
        }

        let pattern = format!("{}%", query.replace('%', "").replace('_', ""));

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, store_id, sku, barcode, name, category,
                   price_cents, stock, low_stock_threshold, status,
                   created_at, updated_at
            FROM products
            WHERE tenant_id = ?1
              AND status = 'active'
              AND (sku LIKE ?2 OR name LIKE ?2 OR barcode LIKE ?2)
            ORDER BY name
            LIMIT ?3
            "#,
        )
        .bind(tenant_id)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Product>> {
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
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, tenant_id: &str, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, store_id, sku, barcode, name, category,
                   price_cents, stock, low_stock_threshold, status,
                   created_at, updated_at
            FROM products
            WHERE tenant_id = ?1 AND sku = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(())` - Inserted
    /// * `Err(DbError::UniqueViolation)` - SKU already exists for this tenant
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, store_id, sku, barcode, name, category,
                price_cents, stock, low_stock_threshold, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.store_id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.low_stock_threshold)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                store_id = ?3,
                sku = ?4,
                barcode = ?5,
                name = ?6,
                category = ?7,
                price_cents = ?8,
                stock = ?9,
                low_stock_threshold = ?10,
                status = ?11,
                updated_at = ?12
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&product.tenant_id)
        .bind(&product.id)
        .bind(&product.store_id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.low_stock_threshold)
        .bind(product.status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Adjusts product stock by a delta (positive for restock).
    ///
    /// The guard `stock + delta >= 0` keeps stock from going negative; a
    /// zero-row update on an existing product means the adjustment would
    /// have done exactly that.
    pub async fn adjust_stock(&self, tenant_id: &str, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?3, updated_at = ?4
            WHERE tenant_id = ?1 AND id = ?2 AND stock + ?3 >= 0
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting status = 'inactive'.
    ///
    /// Historical sale items still reference the row, so it is never
    /// physically removed.
    pub async fn soft_delete(&self, tenant_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET status = 'inactive', updated_at = ?3
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Lists active products at or below their low-stock threshold.
    pub async fn low_stock(&self, tenant_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, store_id, sku, barcode, name, category,
                   price_cents, stock, low_stock_threshold, status,
                   created_at, updated_at
            FROM products
            WHERE tenant_id = ?1
              AND status = 'active'
              AND stock <= low_stock_threshold
            ORDER BY stock ASC, name
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts active products for a tenant (for diagnostics).
    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE tenant_id = ?1 AND status = 'active'",
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use kirana_core::ProductStatus;

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

    fn test_product(sku: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            tenant_id: "tenant-1".to_string(),
            store_id: None,
            sku: sku.to_string(),
            barcode: None,
            name: format!("Product {sku}"),
            category: Some("drinks".to_string()),
            price_cents,
            stock,
            low_stock_threshold: 5,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        let product = test_product("COKE-330", 4000, 10);
        repo.insert(&product).await.unwrap();

        let fetched = repo
            .get_by_id("tenant-1", &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.sku, "COKE-330");
        assert_eq!(fetched.price_cents, 4000);
        assert_eq!(fetched.stock, 10);
        assert_eq!(fetched.status, ProductStatus::Active);

        let by_sku = repo
            .get_by_sku("tenant-1", "COKE-330")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_sku.id, product.id);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&test_product("COKE-330", 4000, 10))
            .await
            .unwrap();
        let err = repo
            .insert(&test_product("COKE-330", 5000, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let db = test_db().await;
        let repo = db.products();

        let product = test_product("COKE-330", 4000, 10);
        repo.insert(&product).await.unwrap();

        // A different tenant cannot see the row
        let other = repo.get_by_id("tenant-2", &product.id).await.unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_adjust_stock_never_negative() {
        let db = test_db().await;
        let repo = db.products();

        let product = test_product("COKE-330", 4000, 5);
        repo.insert(&product).await.unwrap();

        repo.adjust_stock("tenant-1", &product.id, -5).await.unwrap();
        let fetched = repo
            .get_by_id("tenant-1", &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.stock, 0);

        // Going below zero is refused
        assert!(repo.adjust_stock("tenant-1", &product.id, -1).await.is_err());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let db = test_db().await;
        let repo = db.products();

        let product = test_product("COKE-330", 4000, 10);
        repo.insert(&product).await.unwrap();
        assert_eq!(repo.list("tenant-1", 20).await.unwrap().len(), 1);

        repo.soft_delete("tenant-1", &product.id).await.unwrap();
        assert!(repo.list("tenant-1", 20).await.unwrap().is_empty());

        // Still fetchable by ID (history)
        let fetched = repo
            .get_by_id("tenant-1", &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.status, ProductStatus::Inactive);
    }

    #[tokio::test]
    async fn test_search() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&test_product("COKE-330", 4000, 10))
            .await
            .unwrap();
        repo.insert(&test_product("PEPSI-330", 3800, 10))
            .await
            .unwrap();

        let results = repo.search("tenant-1", "COKE", 20).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sku, "COKE-330");

        // Empty query lists everything
        let all = repo.search("tenant-1", "", 20).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_low_stock() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&test_product("LOW", 4000, 2)).await.unwrap();
        repo.insert(&test_product("OK", 4000, 50)).await.unwrap();

        let low = repo.low_stock("tenant-1").await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].sku, "LOW");
    }
}
