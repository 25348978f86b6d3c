//! Record Routes
//!
//! Logging and listing of the four health record kinds.
//!
//! - POST /api/v1/{sleep,diet,menstrual,symptoms} - Store one record
//! - GET /api/v1/{sleep,diet,menstrual,symptoms} - All records in storage order

use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::api::dto::{DietRequest, MenstrualRequest, SleepRequest, SymptomRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::{
    parse_record_date, DietRecord, MenstrualRecord, SleepRecord, SymptomRecord,
};

const INVALID_DATE: &str = "invalid date format, expected RFC3339 or YYYY-MM-DD";

fn parse_date(raw: &str) -> ApiResult<NaiveDate> {
    parse_record_date(raw).ok_or_else(|| ApiError::Validation(INVALID_DATE.to_string()))
}

/// POST /api/v1/sleep
pub async fn create_sleep(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SleepRequest>,
) -> ApiResult<(StatusCode, Json<SleepRecord>)> {
    let record = SleepRecord {
        id: 0,
        date: parse_date(&req.date)?,
        duration_hours: req.duration,
        quality: req.quality,
        disruptions: req.disruptions,
        notes: req.notes,
    };

    let stored = state.store.insert_sleep(record).await?;
    tracing::debug!(id = stored.id, date = %stored.date, "Stored sleep record");

    Ok((StatusCode::CREATED, Json(stored)))
}

/// POST /api/v1/diet
pub async fn create_diet(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DietRequest>,
) -> ApiResult<(StatusCode, Json<DietRecord>)> {
    let record = DietRecord {
        id: 0,
        date: parse_date(&req.date)?,
        meal: req.meal,
        items: req
            .items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        notes: req.notes,
    };

    let stored = state.store.insert_diet(record).await?;
    tracing::debug!(id = stored.id, date = %stored.date, items = stored.items.len(), "Stored diet record");

    Ok((StatusCode::CREATED, Json(stored)))
}

/// POST /api/v1/menstrual
pub async fn create_menstrual(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MenstrualRequest>,
) -> ApiResult<(StatusCode, Json<MenstrualRecord>)> {
    let record = MenstrualRecord {
        id: 0,
        date: parse_date(&req.date)?,
        period_event: req.period_event,
        flow_level: req.flow_level,
        notes: req.notes,
    };

    let stored = state.store.insert_menstrual(record).await?;
    tracing::debug!(id = stored.id, date = %stored.date, "Stored menstrual record");

    Ok((StatusCode::CREATED, Json(stored)))
}

/// POST /api/v1/symptoms
///
/// Ratings are stored as given.
pub async fn create_symptoms(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SymptomRequest>,
) -> ApiResult<(StatusCode, Json<SymptomRecord>)> {
    let record = SymptomRecord {
        id: 0,
        date: parse_date(&req.date)?,
        nausea: req.nausea,
        fatigue: req.fatigue,
        pain: req.pain,
        notes: req.notes,
    };

    let stored = state.store.insert_symptoms(record).await?;
    tracing::debug!(id = stored.id, date = %stored.date, "Stored symptom record");

    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/v1/sleep
pub async fn list_sleep(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<SleepRecord>>> {
    Ok(Json(state.store.fetch_all().await?.sleep))
}

/// GET /api/v1/diet
pub async fn list_diet(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<DietRecord>>> {
    Ok(Json(state.store.fetch_all().await?.diet))
}

/// GET /api/v1/menstrual
pub async fn list_menstrual(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<MenstrualRecord>>> {
    Ok(Json(state.store.fetch_all().await?.menstrual))
}

/// GET /api/v1/symptoms
pub async fn list_symptoms(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SymptomRecord>>> {
    Ok(Json(state.store.fetch_all().await?.symptoms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_both_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(parse_date("2024-05-01").unwrap(), expected);
        assert_eq!(parse_date("2024-05-01T21:00:00Z").unwrap(), expected);
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        let err = parse_date("May 1st").unwrap_err();
        assert!(err.to_string().contains(INVALID_DATE));
    }
}
