//! # Settings Repository
//!
//! Per-tenant store configuration: the tax rate the calculator uses, the
//! currency presentation hints, the low-stock threshold, and the tenant's
//! UPI handle. A tenant without a settings row gets the defaults.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use kirana_core::StoreSettings;

/// Default settings for a tenant that has never saved any.
fn default_settings(tenant_id: &str) -> StoreSettings {
    StoreSettings {
        tenant_id: tenant_id.to_string(),
        store_name: "My Store".to_string(),
        store_address: None,
        store_phone: None,
        tax_rate_bps: 0,
        currency_symbol: "Rs.".to_string(),
        currency_code: "INR".to_string(),
        upi_id: None,
        low_stock_threshold: 5,
        updated_at: Utc::now(),
    }
}

/// Repository for store settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Gets a tenant's settings, falling back to defaults when none are
    /// saved yet.
    pub async fn get(&self, tenant_id: &str) -> DbResult<StoreSettings> {
        let settings = sqlx::query_as::<_, StoreSettings>(
            r#"
            SELECT tenant_id, store_name, store_address, store_phone,
                   tax_rate_bps, currency_symbol, currency_code, upi_id,
                   low_stock_threshold, updated_at
            FROM settings
            WHERE tenant_id = ?1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings.unwrap_or_else(|| default_settings(tenant_id)))
    }

    /// Saves a tenant's settings, inserting or replacing the single row.
    pub async fn upsert(&self, settings: &StoreSettings) -> DbResult<StoreSettings> {
        debug!(tenant_id = %settings.tenant_id, "Saving settings");

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO settings (
                tenant_id, store_name, store_address, store_phone,
                tax_rate_bps, currency_symbol, currency_code, upi_id,
                low_stock_threshold, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(tenant_id) DO UPDATE SET
                store_name = excluded.store_name,
                store_address = excluded.store_address,
                store_phone = excluded.store_phone,
                tax_rate_bps = excluded.tax_rate_bps,
                currency_symbol = excluded.currency_symbol,
                currency_code = excluded.currency_code,
                upi_id = excluded.upi_id,
                low_stock_threshold = excluded.low_stock_threshold,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&settings.tenant_id)
        .bind(&settings.store_name)
        .bind(&settings.store_address)
        .bind(&settings.store_phone)
        .bind(settings.tax_rate_bps)
        .bind(&settings.currency_symbol)
        .bind(&settings.currency_code)
        .bind(&settings.upi_id)
        .bind(settings.low_stock_threshold)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(&settings.tenant_id).await
    }
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

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let db = test_db().await;

        let settings = db.settings().get("tenant-1").await.unwrap();
        assert_eq!(settings.tax_rate_bps, 0);
        assert_eq!(settings.currency_symbol, "Rs.");
        assert_eq!(settings.currency_code, "INR");
        assert_eq!(settings.low_stock_threshold, 5);
    }

    #[tokio::test]
    async fn test_upsert_roundtrip() {
        let db = test_db().await;

        let mut settings = db.settings().get("tenant-1").await.unwrap();
        settings.store_name = "Sharma General Store".to_string();
        settings.tax_rate_bps = 1800;
        settings.upi_id = Some("sharma@upi".to_string());

        let saved = db.settings().upsert(&settings).await.unwrap();
        assert_eq!(saved.store_name, "Sharma General Store");
        assert_eq!(saved.tax_rate_bps, 1800);
        assert_eq!(saved.tax_rate().bps(), 1800);

        // Second save updates in place
        settings.tax_rate_bps = 1200;
        let saved = db.settings().upsert(&settings).await.unwrap();
        assert_eq!(saved.tax_rate_bps, 1200);
    }
}
