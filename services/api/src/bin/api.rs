//! services/api/src/bin/api.rs

use api_lib::{
    adapters, bootstrap,
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use axum::Router;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Store (optional) ---
    // The server still starts without a store; handlers then answer 503 or empty lists.
    let store = match adapters::connect(&config).await {
        Ok(Some(store)) => Some(store),
        Ok(None) => {
            warn!("DATABASE_URL / DATABASE_NAME not set; running without a database.");
            None
        }
        Err(e) => {
            warn!("Could not connect to the database, running without it: {}", e);
            None
        }
    };

    // --- 3. Indexes & Seed Data ---
    if let Some(store) = &store {
        bootstrap::run(store.as_ref()).await;
        info!("Bootstrap finished using the {} store.", store.describe());
    }

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(store, config.clone()));

    // --- 5. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
