//! # Kirana POS API Server
//!
//! Process bootstrap: logging, configuration, database, router, listener.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kirana_db::{Database, DbConfig};

mod config;
mod error;
mod routes;
mod state;
mod tenant;

use config::ServerConfig;
use state::AppState;

#[tokio::main]
async fn main() {
    // .env is optional; environment variables win either way
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::load().expect("Invalid server configuration");

    let db = Database::new(DbConfig::new(&config.database_path))
        .await
        .expect("Failed to initialize database");

    let app = routes::router(AppState::new(db));

    let addr = format!("{}:{}", config.bind_address, config.http_port);
    let listener = TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {addr}: {e}"));

    info!(addr = %addr, "Kirana POS API listening");

    axum::serve(listener, app).await.expect("Server error");
}
