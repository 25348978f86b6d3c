//! Flarewatch REST API
//!
//! HTTP API layer for Flarewatch, built with Axum.
//!
//! # Endpoints
//!
//! ## Records
//! - `POST /api/v1/sleep` - Log a night of sleep
//! - `POST /api/v1/diet` - Log a meal
//! - `POST /api/v1/menstrual` - Log a cycle entry
//! - `POST /api/v1/symptoms` - Log symptom ratings
//! - `GET /api/v1/{sleep,diet,menstrual,symptoms}` - List records in storage order
//!
//! ## Analysis
//! - `GET /api/v1/analysis/triggers` - What preceded symptom spikes
//! - `GET /api/v1/analysis/flareup` - Flare-up risk from recent days
//! - `GET /api/v1/analysis/recommendations` - Three recommendations
//!
//! ## Health
//! - `GET /ping` - Reachability check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use flarewatch::analysis::AnalysisConfig;
//! use flarewatch::api::{serve, ApiConfig, AppState};
//! use flarewatch::storage::SqliteStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteStore::open("flarewatch.db")?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(store, AnalysisConfig::default(), config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{extract::DefaultBodyLimit, http::HeaderValue, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Record routes
        .route(
            "/sleep",
            get(routes::records::list_sleep).post(routes::records::create_sleep),
        )
        .route(
            "/diet",
            get(routes::records::list_diet).post(routes::records::create_diet),
        )
        .route(
            "/menstrual",
            get(routes::records::list_menstrual).post(routes::records::create_menstrual),
        )
        .route(
            "/symptoms",
            get(routes::records::list_symptoms).post(routes::records::create_symptoms),
        )
        // Analysis routes
        .route("/analysis/triggers", get(routes::analysis::get_triggers))
        .route("/analysis/flareup", get(routes::analysis::get_flareup))
        .route(
            "/analysis/recommendations",
            get(routes::analysis::get_recommendations),
        )
        .layer(DefaultBodyLimit::max(state.config.max_body_size));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .route("/ping", get(routes::health::ping))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS for the configured origins; any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    }
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Flarewatch API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Flarewatch API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
