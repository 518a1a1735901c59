//! # Settings Routes
//!
//! Per-tenant store configuration: tax rate, currency presentation, UPI
//! handle, low-stock threshold.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;
use crate::tenant::TenantId;
use kirana_core::{validation, StoreSettings};

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub store_name: String,
    pub store_address: Option<String>,
    pub store_phone: Option<String>,
    pub tax_rate_bps: i64,
    pub currency_symbol: String,
    pub currency_code: String,
    pub upi_id: Option<String>,
    pub low_stock_threshold: i64,
    pub updated_at: String,
}

impl From<StoreSettings> for SettingsResponse {
    fn from(s: StoreSettings) -> Self {
        SettingsResponse {
            store_name: s.store_name,
            store_address: s.store_address,
            store_phone: s.store_phone,
            tax_rate_bps: s.tax_rate_bps,
            currency_symbol: s.currency_symbol,
            currency_code: s.currency_code,
            upi_id: s.upi_id,
            low_stock_threshold: s.low_stock_threshold,
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

/// Full replacement of the mutable fields; absent optionals clear.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub store_name: String,
    pub store_address: Option<String>,
    pub store_phone: Option<String>,
    pub tax_rate_bps: i64,
    pub currency_symbol: Option<String>,
    pub currency_code: Option<String>,
    pub upi_id: Option<String>,
    pub low_stock_threshold: Option<i64>,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /settings`.
pub async fn get(
    State(state): State<AppState>,
    tenant: TenantId,
) -> Result<Json<SettingsResponse>, ApiError> {
    let settings = state.db.settings().get(tenant.as_str()).await?;
    Ok(Json(settings.into()))
}

/// `PUT /settings`.
pub async fn update(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    if body.store_name.trim().is_empty() {
        return Err(ApiError::validation("storeName is required"));
    }
    validation::validate_tax_rate_bps(body.tax_rate_bps)
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let current = state.db.settings().get(tenant.as_str()).await?;

    let settings = StoreSettings {
        tenant_id: tenant.as_str().to_string(),
        store_name: body.store_name.trim().to_string(),
        store_address: body.store_address,
        store_phone: body.store_phone,
        tax_rate_bps: body.tax_rate_bps,
        currency_symbol: body.currency_symbol.unwrap_or(current.currency_symbol),
        currency_code: body.currency_code.unwrap_or(current.currency_code),
        upi_id: body.upi_id,
        low_stock_threshold: body.low_stock_threshold.unwrap_or(current.low_stock_threshold),
        updated_at: current.updated_at,
    };

    let saved = state.db.settings().upsert(&settings).await?;
    Ok(Json(saved.into()))
}
