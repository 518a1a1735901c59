//! # Customer Routes
//!
//! Customer records for attributing sales. The phone number is the
//! cashier-facing lookup key: it is normalized on the way in and unique
//! per tenant, so re-registering a regular customer surfaces a duplicate
//! error instead of a second row.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use crate::tenant::TenantId;
use kirana_core::{validation, Customer};
use kirana_db::repository::customer::generate_customer_id;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: String,
    pub store_id: Option<String>,
}

/// Partial update: absent fields keep their current value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListQuery {
    /// Exact lookup by phone number (normalized before matching).
    pub phone: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: String,
    pub store_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        CustomerResponse {
            id: c.id,
            store_id: c.store_id,
            name: c.name,
            phone: c.phone,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /customers`.
pub async fn create(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(body): Json<CreateCustomerRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    validation::validate_customer_name(&body.name)
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let phone = validation::validate_phone(&body.phone)
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let now = Utc::now();
    let customer = Customer {
        id: generate_customer_id(),
        tenant_id: tenant.as_str().to_string(),
        store_id: body.store_id,
        name: body.name.trim().to_string(),
        phone,
        created_at: now,
        updated_at: now,
    };

    debug!(phone = %customer.phone, "create customer");

    state.db.customers().insert(&customer).await?;
    Ok(Json(customer.into()))
}

/// `GET /customers`: the tenant's customers, or an exact phone lookup.
pub async fn list(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<CustomerListQuery>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let customers = match query.phone.as_deref() {
        Some(raw) => {
            let phone = validation::validate_phone(raw)
                .map_err(|e| ApiError::validation(e.to_string()))?;
            state
                .db
                .customers()
                .get_by_phone(tenant.as_str(), &phone)
                .await?
                .into_iter()
                .collect()
        }
        None => {
            state
                .db
                .customers()
                .list(tenant.as_str(), query.limit)
                .await?
        }
    };

    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// `GET /customers/{id}`.
pub async fn get(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = state
        .db
        .customers()
        .get_by_id(tenant.as_str(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &id))?;

    Ok(Json(customer.into()))
}

/// `PATCH /customers/{id}`: partial update.
pub async fn update(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<String>,
    Json(body): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let mut customer = state
        .db
        .customers()
        .get_by_id(tenant.as_str(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &id))?;

    if let Some(name) = body.name {
        validation::validate_customer_name(&name)
            .map_err(|e| ApiError::validation(e.to_string()))?;
        customer.name = name.trim().to_string();
    }
    if let Some(phone) = body.phone {
        customer.phone = validation::validate_phone(&phone)
            .map_err(|e| ApiError::validation(e.to_string()))?;
    }

    state.db.customers().update(&customer).await?;

    let updated = state
        .db
        .customers()
        .get_by_id(tenant.as_str(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &id))?;
    Ok(Json(updated.into()))
}
