//! Shared application state.
//!
//! The server is stateless apart from the database handle: carts live in
//! the client, everything else lives in SQLite.

use kirana_db::Database;

/// State shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}
