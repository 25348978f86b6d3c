//! Flarewatch API Server
//!
//! Run with: cargo run --bin flarewatch-api
//!
//! # Configuration
//!
//! Loaded from the first config file found (see `flarewatch-cli config path`)
//! with `FLAREWATCH_*` environment overrides, e.g.:
//! - `FLAREWATCH_API_HOST`, `FLAREWATCH_API_PORT`
//! - `FLAREWATCH_DATA_DIR`: Directory holding the SQLite database
//! - `FLAREWATCH_RECOMMENDER_ENABLED`, `FLAREWATCH_RECOMMENDER_API_KEY`
//! - `RUST_LOG`: Log filter (default: flarewatch=info,tower_http=debug)

use anyhow::Context;
use flarewatch::api::{serve, ApiConfig, AppState};
use flarewatch::config::Config;
use flarewatch::recommend::{Recommender, RuleBasedRecommender, TextGenRecommender};
use flarewatch::storage::SqliteStore;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();

    config
        .logging
        .init("flarewatch={level},tower_http=debug")
        .context("initializing logging")?;

    tracing::info!("Starting Flarewatch API server v{}", env!("CARGO_PKG_VERSION"));

    let db_path = config.storage.database_path();
    tracing::info!("Database: {:?}", db_path);

    let store = Arc::new(
        SqliteStore::open(&db_path)
            .with_context(|| format!("opening record store at {}", db_path.display()))?,
    );

    let recommender: Arc<dyn Recommender> = if config.recommender.enabled {
        tracing::info!(
            base_url = %config.recommender.base_url,
            model = %config.recommender.model,
            "Text generation recommendations enabled"
        );
        Arc::new(TextGenRecommender::new(config.recommender.text_gen())?)
    } else {
        tracing::info!("Using rule-based recommendations (set FLAREWATCH_RECOMMENDER_ENABLED=true to change)");
        Arc::new(RuleBasedRecommender::new(config.analysis.low_sleep_hours))
    };

    let api_config = ApiConfig::from(&config.api);
    let state = AppState::with_recommender(
        store,
        config.analysis.clone(),
        api_config.clone(),
        recommender,
    );

    tracing::info!("Starting server on {}:{}", api_config.host, api_config.port);
    serve(state, &api_config).await?;

    tracing::info!("Flarewatch API server stopped");
    Ok(())
}
