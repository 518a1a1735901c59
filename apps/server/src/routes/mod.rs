//! # Routes
//!
//! Route table for the Kirana POS API. Every business route expects the
//! `X-Tenant-Id` header (see [`crate::tenant::TenantId`]); `/health` is
//! the only unscoped endpoint.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::AppState;

pub mod customers;
pub mod health;
pub mod held;
pub mod products;
pub mod sales;
pub mod settings;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::check))
        // Catalog
        .route("/products", post(products::create).get(products::list))
        .route("/products/low-stock", get(products::low_stock))
        .route(
            "/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::remove),
        )
        // Customers
        .route("/customers", post(customers::create).get(customers::list))
        .route(
            "/customers/{id}",
            get(customers::get).patch(customers::update),
        )
        // Checkout and sales
        .route("/sales", post(sales::create).get(sales::list))
        .route("/sales/summary", get(sales::summary))
        .route("/sales/{id}", get(sales::get))
        .route("/sales/{id}/upi-status", patch(sales::update_upi_status))
        // Held sales
        .route("/held-sales", post(held::hold).get(held::list))
        .route("/held-sales/{id}", get(held::get).delete(held::remove))
        // Settings
        .route("/settings", get(settings::get).put(settings::update))
        .with_state(state)
}
