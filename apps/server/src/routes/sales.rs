//! # Sales Routes
//!
//! Checkout, sale queries, the sales summary, and the UPI status
//! transition. The handlers translate DTOs and delegate: validation and
//! math live in kirana-core, the transaction lives in kirana-db.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use crate::tenant::TenantId;
use kirana_core::{DiscountSpec, Money, PaymentMethod, SaleStatus, UpiStatus};
use kirana_db::{NewSale, NewSaleItem, SaleFilter, SaleWithItems};

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// Checkout request body.
///
/// The client sends product references and quantities; prices and totals
/// are re-derived server-side from the catalog. `discountCents` and
/// `discountBps` are mutually exclusive.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub customer_id: Option<String>,
    pub cashier_id: Option<String>,
    pub store_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub items: Vec<SaleItemRequest>,
    #[serde(default)]
    pub discount_cents: Option<i64>,
    #[serde(default)]
    pub discount_bps: Option<u32>,
    #[serde(default)]
    pub paid_amount_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemResponse {
    pub id: String,
    pub product_id: Option<String>,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    pub id: String,
    pub invoice_number: String,
    pub store_id: Option<String>,
    pub customer_id: Option<String>,
    pub cashier_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub upi_status: UpiStatus,
    pub status: SaleStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub paid_amount_cents: i64,
    pub change_amount_cents: i64,
    pub items: Vec<SaleItemResponse>,
    pub created_at: String,
}

impl From<SaleWithItems> for SaleResponse {
    fn from(with_items: SaleWithItems) -> Self {
        let sale = with_items.sale;
        SaleResponse {
            id: sale.id,
            invoice_number: sale.invoice_no,
            store_id: sale.store_id,
            customer_id: sale.customer_id,
            cashier_id: sale.cashier_id,
            payment_method: sale.payment_method,
            upi_status: sale.upi_status,
            status: sale.status,
            subtotal_cents: sale.subtotal_cents,
            discount_cents: sale.discount_cents,
            tax_cents: sale.tax_cents,
            total_cents: sale.total_cents,
            paid_amount_cents: sale.paid_amount_cents,
            change_amount_cents: sale.change_amount_cents,
            items: with_items
                .items
                .into_iter()
                .map(|i| SaleItemResponse {
                    id: i.id,
                    product_id: i.product_id,
                    sku: i.sku_snapshot,
                    name: i.name_snapshot,
                    quantity: i.quantity,
                    unit_price_cents: i.unit_price_cents,
                    total_cents: i.total_cents,
                })
                .collect(),
            created_at: sale.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleListQuery {
    pub customer_id: Option<String>,
    pub cashier_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    50
}

impl SaleListQuery {
    fn filter(&self) -> SaleFilter {
        SaleFilter {
            customer_id: self.customer_id.clone(),
            cashier_id: self.cashier_id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdownResponse {
    pub payment_method: PaymentMethod,
    pub total_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProductResponse {
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummaryResponse {
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    pub total_discount_cents: i64,
    pub average_order_value_cents: i64,
    pub payment_breakdown: Vec<PaymentBreakdownResponse>,
    pub top_products: Vec<TopProductResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpiStatusRequest {
    pub status: UpiStatus,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /sales`: the checkout.
pub async fn create(
    State(state): State<AppState>,
    tenant: TenantId,
    Json(body): Json<CreateSaleRequest>,
) -> Result<Json<SaleResponse>, ApiError> {
    debug!(tenant_id = %tenant.as_str(), items = body.items.len(), "create sale");

    let discount = match (body.discount_cents, body.discount_bps) {
        (Some(_), Some(_)) => {
            return Err(ApiError::validation(
                "Provide either discountCents or discountBps, not both",
            ))
        }
        (Some(cents), None) => DiscountSpec::Flat {
            amount: Money::from_cents(cents),
        },
        (None, Some(bps)) => DiscountSpec::Percentage { bps },
        (None, None) => DiscountSpec::none(),
    };

    let new_sale = NewSale {
        store_id: body.store_id,
        customer_id: body.customer_id,
        cashier_id: body.cashier_id,
        payment_method: body.payment_method,
        items: body
            .items
            .into_iter()
            .map(|i| NewSaleItem {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect(),
        discount,
        paid: Money::from_cents(body.paid_amount_cents),
    };

    let settings = state.db.settings().get(tenant.as_str()).await?;
    let result = state
        .db
        .sales()
        .create_sale(tenant.as_str(), &new_sale, settings.tax_rate())
        .await?;

    Ok(Json(result.into()))
}

/// `GET /sales`: newest first, with optional filters. Items included,
/// matching what the invoice view needs.
pub async fn list(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<SaleListQuery>,
) -> Result<Json<Vec<SaleResponse>>, ApiError> {
    let sales = state
        .db
        .sales()
        .list(tenant.as_str(), &query.filter(), query.limit, query.offset)
        .await?;

    let mut responses = Vec::with_capacity(sales.len());
    for sale in sales {
        let items = state.db.sales().get_items(&sale.id).await?;
        responses.push(SaleWithItems { sale, items }.into());
    }

    Ok(Json(responses))
}

/// `GET /sales/{id}`.
pub async fn get(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<String>,
) -> Result<Json<SaleResponse>, ApiError> {
    let sale = state
        .db
        .sales()
        .get_by_id(tenant.as_str(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &id))?;

    Ok(Json(sale.into()))
}

/// `GET /sales/summary`.
pub async fn summary(
    State(state): State<AppState>,
    tenant: TenantId,
    Query(query): Query<SaleListQuery>,
) -> Result<Json<SaleSummaryResponse>, ApiError> {
    let summary = state
        .db
        .sales()
        .summary(tenant.as_str(), &query.filter())
        .await?;

    Ok(Json(SaleSummaryResponse {
        total_sales: summary.total_sales,
        total_revenue_cents: summary.total_revenue_cents,
        total_discount_cents: summary.total_discount_cents,
        average_order_value_cents: summary.average_order_value_cents,
        payment_breakdown: summary
            .payment_breakdown
            .into_iter()
            .map(|b| PaymentBreakdownResponse {
                payment_method: b.payment_method,
                total_cents: b.total_cents,
            })
            .collect(),
        top_products: summary
            .top_products
            .into_iter()
            .map(|p| TopProductResponse {
                product_id: p.product_id,
                name: p.name,
                quantity: p.quantity,
                revenue_cents: p.revenue_cents,
            })
            .collect(),
    }))
}

/// `PATCH /sales/{id}/upi-status`: the one mutation a persisted sale
/// allows: `pending → completed | failed`.
pub async fn update_upi_status(
    State(state): State<AppState>,
    tenant: TenantId,
    Path(id): Path<String>,
    Json(body): Json<UpiStatusRequest>,
) -> Result<Json<SaleResponse>, ApiError> {
    state
        .db
        .sales()
        .update_upi_status(tenant.as_str(), &id, body.status)
        .await?;

    let sale = state
        .db
        .sales()
        .get_by_id(tenant.as_str(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &id))?;

    Ok(Json(sale.into()))
}
