//! Disaster Management Backend
//!
//! REST backend for alerts, resources, incidents, teams, evacuation plans,
//! messages, users and weather, persisted in an embedded SQLite document store.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod weather;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use models::Collection;
use weather::WeatherClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub weather: Arc<WeatherClient>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Disaster Management Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Weather provider: {}", config.weather_base_url);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.weather_api_key.is_none() {
        tracing::warn!("No weather API key configured (OPENWEATHER_API_KEY). Weather reads will fail!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool.clone()));

    let weather = Arc::new(WeatherClient::new(
        config.weather_base_url.clone(),
        config.weather_api_key.clone(),
    ));

    // Create application state
    let state = AppState { repo, weather };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Database pool closed");

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let crud_routes = Collection::CRUD
        .into_iter()
        .fold(Router::new(), |router, collection| {
            router.merge(api::collection_routes(collection))
        });

    let api_routes = Router::new()
        // Messages
        .route("/messages", get(api::list_messages).post(api::create_message))
        // Weather
        .route("/weather", post(api::update_weather))
        .route("/weather/{location}", get(api::get_weather))
        // Analytics
        .route("/analytics", get(api::get_analytics))
        // Users
        .route("/users", get(api::list_users))
        .route("/auth/login", post(api::login))
        // Health
        .route("/health", get(api::health_check))
        .merge(crud_routes);

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Resolve when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
    tracing::info!("Shutdown signal received");
}
