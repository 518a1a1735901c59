//! # Customer Repository
//!
//! Database operations for customer records. A customer is identified to
//! the cashier by phone number; the number is normalized before it gets
//! here and is unique per tenant, so a repeat customer is found rather
//! than duplicated.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kirana_core::Customer;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists a tenant's customers, sorted by name.
    pub async fn list(&self, tenant_id: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, tenant_id, store_id, name, phone, created_at, updated_at
            FROM customers
            WHERE tenant_id = ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, tenant_id, store_id, name, phone, created_at, updated_at
            FROM customers
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by normalized phone number.
    pub async fn get_by_phone(&self, tenant_id: &str, phone: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, tenant_id, store_id, name, phone, created_at, updated_at
            FROM customers
            WHERE tenant_id = ?1 AND phone = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Inserts a new customer.
    ///
    /// ## Returns
    /// * `Ok(())` - Inserted
    /// * `Err(DbError::UniqueViolation)` - Phone already registered for
    ///   this tenant
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(phone = %customer.phone, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, tenant_id, store_id, name, phone, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.tenant_id)
        .bind(&customer.store_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a customer's name and phone.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Updating customer");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = ?3, phone = ?4, updated_at = ?5
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&customer.tenant_id)
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }
}

/// Helper to generate a new customer ID.
pub fn generate_customer_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

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

    fn test_customer(name: &str, phone: &str) -> Customer {
        let now = Utc::now();
        Customer {
            id: generate_customer_id(),
            tenant_id: "tenant-1".to_string(),
            store_id: None,
            name: name.to_string(),
            phone: phone.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = test_db().await;
        let repo = db.customers();

        let customer = test_customer("Priya Sharma", "9820012345");
        repo.insert(&customer).await.unwrap();

        let by_id = repo
            .get_by_id("tenant-1", &customer.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.name, "Priya Sharma");

        let by_phone = repo
            .get_by_phone("tenant-1", "9820012345")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_phone.id, customer.id);
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let db = test_db().await;
        let repo = db.customers();

        repo.insert(&test_customer("Priya Sharma", "9820012345"))
            .await
            .unwrap();
        let err = repo
            .insert(&test_customer("Another Priya", "9820012345"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let db = test_db().await;
        let repo = db.customers();

        let customer = test_customer("Priya Sharma", "9820012345");
        repo.insert(&customer).await.unwrap();

        assert!(repo
            .get_by_id("tenant-2", &customer.id)
            .await
            .unwrap()
            .is_none());
        assert!(repo.list("tenant-2", 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update() {
        let db = test_db().await;
        let repo = db.customers();

        let mut customer = test_customer("Priya Sharma", "9820012345");
        repo.insert(&customer).await.unwrap();

        customer.name = "Priya Sharma-Patel".to_string();
        customer.phone = "9820098765".to_string();
        repo.update(&customer).await.unwrap();

        let fetched = repo
            .get_by_id("tenant-1", &customer.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.name, "Priya Sharma-Patel");
        assert_eq!(fetched.phone, "9820098765");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = test_db().await;
        let err = db
            .customers()
            .update(&test_customer("Ghost", "9111111111"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
