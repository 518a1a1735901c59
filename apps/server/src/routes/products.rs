//! # Product Routes
//!
//! Catalog CRUD. Deletion is a soft delete: sale items keep their product
//! references, the row just stops being sellable.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use crate::tenant::TenantId;
use kirana_core::{validation, Product, ProductStatus};
use kirana_db::repository::product::generate_product_id;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub store_id: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
}

fn default_low_stock_threshold() -> i64 {
    5
}

/// Partial update: absent fields keep their current value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub low_stock_threshold: Option<i64>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    /// Search term matched against SKU, name, and barcode.
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub store_id: Option<String>,
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub low_stock_threshold: i64,
    pub status: ProductStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id,
            store_id: p.store_id,
            sku: p.sku,
            barcode: p.barcode,
            name: p.name,
            category: p.category,
            price_cents: p.price_cents,
            stock: p.stock,
            low_stock_threshold: p.low_stock_threshold,
            status: p.status,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /products`.
pub async fn create(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(body): Json<CreateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    validation::validate_sku(&body.sku).map_err(|e| ApiError::validation(e.to_string()))?;
    validation::validate_product_name(&body.name)
        .map_err(|e| ApiError::validation(e.to_string()))?;
    validation::validate_price_cents(body.price_cents)
        .map_err(|e| ApiError::validation(e.to_string()))?;
    if body.stock < 0 {
        return Err(ApiError::validation("stock must not be negative"));
    }

    let now = Utc::now();
    let product = Product {
        id: generate_product_id(),
        tenant_id: tenant.as_str().to_string(),
        store_id: body.store_id,
        sku: body.sku.trim().to_string(),
        barcode: body.barcode,
        name: body.name.trim().to_string(),
        category: body.category,
        price_cents: body.price_cents,
        stock: body.stock,
        low_stock_threshold: body.low_stock_threshold,
        status: ProductStatus::Active,
        created_at: now,
        updated_at: now,
    };

    debug!(sku = %product.sku, "create product");

    state.db.products().insert(&product).await?;
    Ok(Json(product.into()))
}

/// `GET /products`: active catalog, optionally filtered by a search term.
pub async fn list(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = match query.q.as_deref() {
        Some(q) => {
            state
                .db
                .products()
                .search(tenant.as_str(), q, query.limit)
                .await?
        }
        None => state.db.products().list(tenant.as_str(), query.limit).await?,
    };

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// `GET /products/low-stock`.
pub async fn low_stock(
    State(state): State<AppState>,
    tenant: TenantId,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.db.products().low_stock(tenant.as_str()).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// `GET /products/{id}`.
pub async fn get(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(tenant.as_str(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    Ok(Json(product.into()))
}

/// `PUT /products/{id}`: partial update.
pub async fn update(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<String>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let mut product = state
        .db
        .products()
        .get_by_id(tenant.as_str(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    if let Some(sku) = body.sku {
        validation::validate_sku(&sku).map_err(|e| ApiError::validation(e.to_string()))?;
        product.sku = sku.trim().to_string();
    }
    if let Some(name) = body.name {
        validation::validate_product_name(&name)
            .map_err(|e| ApiError::validation(e.to_string()))?;
        product.name = name.trim().to_string();
    }
    if let Some(price_cents) = body.price_cents {
        validation::validate_price_cents(price_cents)
            .map_err(|e| ApiError::validation(e.to_string()))?;
        product.price_cents = price_cents;
    }
    if let Some(stock) = body.stock {
        if stock < 0 {
            return Err(ApiError::validation("stock must not be negative"));
        }
        product.stock = stock;
    }
    if let Some(threshold) = body.low_stock_threshold {
        product.low_stock_threshold = threshold;
    }
    if let Some(status) = body.status {
        product.status = status;
    }
    if body.barcode.is_some() {
        product.barcode = body.barcode;
    }
    if body.category.is_some() {
        product.category = body.category;
    }

    state.db.products().update(&product).await?;

    let updated = state
        .db
        .products()
        .get_by_id(tenant.as_str(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;
    Ok(Json(updated.into()))
}

/// `DELETE /products/{id}`: soft delete.
pub async fn remove(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.db.products().soft_delete(tenant.as_str(), &id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
