//! # Held Sale Routes
//!
//! Park a cart under a label, list the parked carts, resume one. Resuming
//! is fetch-then-delete; the resumed cart goes through the normal checkout
//! when the customer returns.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;
use crate::tenant::TenantId;
use kirana_core::{validation, Cart, CartItem, HeldSale};

// =============================================================================
// DTOs
// =============================================================================

/// A cart line as the client holds it: frozen price included, because a
/// held sale preserves the prices the customer saw.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldItemRequest {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldSaleRequest {
    pub label: String,
    pub items: Vec<HeldItemRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldItemResponse {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldSaleResponse {
    pub id: String,
    pub label: String,
    pub items: Vec<HeldItemResponse>,
    pub created_at: String,
}

impl From<HeldSale> for HeldSaleResponse {
    fn from(held: HeldSale) -> Self {
        HeldSaleResponse {
            id: held.id,
            label: held.label,
            items: held
                .cart
                .items
                .into_iter()
                .map(|i| HeldItemResponse {
                    product_id: i.product_id,
                    sku: i.sku,
                    name: i.name,
                    unit_price_cents: i.unit_price_cents,
                    quantity: i.quantity,
                })
                .collect(),
            created_at: held.created_at.to_rfc3339(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /held-sales`.
pub async fn hold(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(body): Json<HoldSaleRequest>,
) -> Result<Json<HeldSaleResponse>, ApiError> {
    validation::validate_label(&body.label).map_err(|e| ApiError::validation(e.to_string()))?;
    if body.items.is_empty() {
        return Err(ApiError::validation("Cannot hold an empty cart"));
    }
    for item in &body.items {
        validation::validate_quantity(item.quantity)
            .map_err(|e| ApiError::validation(e.to_string()))?;
        validation::validate_price_cents(item.unit_price_cents)
            .map_err(|e| ApiError::validation(e.to_string()))?;
    }

    let now = Utc::now();
    let cart = Cart {
        items: body
            .items
            .into_iter()
            .map(|i| CartItem {
                product_id: i.product_id,
                sku: i.sku,
                name: i.name,
                unit_price_cents: i.unit_price_cents,
                quantity: i.quantity,
                added_at: now,
            })
            .collect(),
    };

    let held = state
        .db
        .held_sales()
        .hold(tenant.as_str(), body.label.trim(), &cart)
        .await?;

    Ok(Json(held.into()))
}

/// `GET /held-sales`.
pub async fn list(
    State(state): State<AppState>,
    tenant: TenantId,
) -> Result<Json<Vec<HeldSaleResponse>>, ApiError> {
    let held = state.db.held_sales().list(tenant.as_str()).await?;
    Ok(Json(held.into_iter().map(Into::into).collect()))
}

/// `GET /held-sales/{id}`.
pub async fn get(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<String>,
) -> Result<Json<HeldSaleResponse>, ApiError> {
    let held = state
        .db
        .held_sales()
        .get(tenant.as_str(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Held sale", &id))?;

    Ok(Json(held.into()))
}

/// `DELETE /held-sales/{id}`: the second half of resuming, or abandoning.
pub async fn remove(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.db.held_sales().delete(tenant.as_str(), &id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
