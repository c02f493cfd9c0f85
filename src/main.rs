use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use shopfront_api::{
    auth::repository::{PgSessionStore, PgUserStore},
    config::{Config, StoreBackend},
    create_router, db, AppState,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Shopfront API - Starting...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Environment: {}", config.environment);

    let state = match build_state(config).await {
        Ok(state) => state,
        Err(message) => {
            tracing::error!("{}", message);
            std::process::exit(1);
        }
    };

    let addr = state.config.bind_address();
    let app = create_router(state);

    tracing::info!("Starting server on {}", addr);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Shopfront API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Connect the configured store backend and assemble the shared state
async fn build_state(config: Config) -> Result<AppState, String> {
    match (config.store, config.database_url.clone()) {
        (StoreBackend::Postgres, Some(database_url)) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(&database_url)
                .await
                .map_err(|e| format!("Failed to create database pool: {}", e))?;

            db::run_migrations(&pool)
                .await
                .map_err(|e| format!("Failed to run database migrations: {}", e))?;

            Ok(AppState::new(
                config,
                Arc::new(PgUserStore::new(pool.clone())),
                Arc::new(PgSessionStore::new(pool)),
            ))
        }
        (StoreBackend::Postgres, None) => Err("DATABASE_URL must be set in environment".to_string()),
        (StoreBackend::Memory, _) => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(AppState::in_memory(config))
        }
    }
}
