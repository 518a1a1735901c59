//! # Repository Module
//!
//! Database repository implementations for Kirana POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Axum Handler                                                          │
//! │       │                                                                 │
//! │       │  db.sales().create_sale(tenant_id, &new_sale, tax_rate)        │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── create_sale(&self, tenant_id, new_sale, tax_rate)                 │
//! │  ├── get_by_id(&self, tenant_id, id)                                   │
//! │  ├── list(&self, tenant_id, filter, limit, offset)                     │
//! │  └── summary(&self, tenant_id, filter)                                 │
//! │       │                                                                 │
//! │       │  SQL (every statement scoped by tenant_id)                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test against an in-memory database                          │
//! │  • SQL is isolated in one place                                        │
//! │  • Tenant isolation is enforced in exactly one layer                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD, search, stock
//! - [`sale::SaleRepository`] - Checkout transaction, queries, summary
//! - [`customer::CustomerRepository`] - Customer records
//! - [`settings::SettingsRepository`] - Per-tenant configuration
//! - [`held::HeldSaleRepository`] - Parked cart snapshots

pub mod customer;
pub mod held;
pub mod product;
pub mod sale;
pub mod settings;
