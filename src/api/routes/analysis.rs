//! Analysis Routes
//!
//! Read-only views over the full record set. Each request fetches every
//! record once and runs the shared analysis engine on it.
//!
//! - GET /api/v1/analysis/triggers - Trigger report
//! - GET /api/v1/analysis/flareup - Flare-up prediction
//! - GET /api/v1/analysis/recommendations - Three recommendations

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::analysis::TriggerReport;
use crate::api::dto::{FlareupResponse, RecommendationsResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::recommend::RecommendationRequest;

/// GET /api/v1/analysis/triggers
pub async fn get_triggers(State(state): State<Arc<AppState>>) -> ApiResult<Json<TriggerReport>> {
    let records = state.store.fetch_all().await?;
    let report = state.engine.trigger_report(&records)?;

    tracing::info!(
        spike_days = report.spike_days.len(),
        threshold = report.threshold,
        "Computed trigger report"
    );

    Ok(Json(report))
}

/// GET /api/v1/analysis/flareup
pub async fn get_flareup(State(state): State<Arc<AppState>>) -> ApiResult<Json<FlareupResponse>> {
    let records = state.store.fetch_all().await?;
    let outcome = state.engine.predict_flareup(&records)?;

    tracing::info!(
        status = outcome.message(),
        probability = ?outcome.probability(),
        "Computed flareup prediction"
    );

    Ok(Json(FlareupResponse::from(outcome)))
}

/// GET /api/v1/analysis/recommendations
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RecommendationsResponse>> {
    let records = state.store.fetch_all().await?;
    let report = state.engine.trigger_report(&records)?;

    let recommendations = state
        .recommender
        .recommend(RecommendationRequest {
            report: &report,
            records: &records,
        })
        .await?;

    tracing::info!(
        source = state.recommender.name(),
        count = recommendations.len(),
        "Composed recommendations"
    );

    Ok(Json(RecommendationsResponse {
        recommendations,
        source: state.recommender.name().to_string(),
    }))
}
