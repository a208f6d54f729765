mod auth;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod routes;
mod services;
mod table;
mod text;
mod websocket;
mod ws;

use chrono::{DateTime, Utc};
use config::Config;
use routes::create_app;
use std::panic;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use ws::TableRegistry;

/// State shared by every request and connection
pub struct AppState {
    pub config: Config,
    pub registry: TableRegistry,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            registry: TableRegistry::new(config.table_defaults()),
            config,
            started_at: Utc::now(),
        }
    }
}

#[tokio::main]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Load configuration
    let config = Config::load();

    // Initialize tracing
    let default_filter = match &config {
        Ok(config) => format!("tablesync_server=debug,tower_http=debug,{}", config.log_level),
        Err(_) => "tablesync_server=debug,tower_http=debug,info".to_string(),
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();

    info!("Starting server...");

    let config = config.unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });
    info!("Environment: {}", config.environment);
    if config.auth_jwt_secret.is_none() {
        warn!("No JWT secret configured - authentication is disabled");
    }

    // Initialize database connection if URL is provided
    if let Some(db_url) = &config.db_url {
        match db::dbtables::init_db(db_url).await {
            Ok(_) => info!("Database initialized successfully"),
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                warn!("Tables will start empty");
            }
        }
    } else {
        warn!("No database URL configured - tables will start empty");
    }

    let address = config.server_address();
    let app_state = Arc::new(AppState::new(config));
    let app = create_app(app_state);

    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", address, e);
            std::process::exit(1);
        }
    };

    info!("🚀 Server running on http://{}", address);
    info!("📡 WebSocket available at ws://{}/ws/{{table_id}}", address);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!("Server error: {}", e);
    }
    info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
