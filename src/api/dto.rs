//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use crate::analysis::FlareupOutcome;
use crate::storage::RecordCounts;
use serde::{Deserialize, Serialize};

// ============================================
// RECORD DTOs
// ============================================

/// Sleep log request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepRequest {
    /// RFC 3339 timestamp or YYYY-MM-DD
    pub date: String,
    /// Hours slept
    pub duration: f64,
    #[serde(default)]
    pub quality: i32,
    #[serde(default)]
    pub disruptions: String,
    #[serde(default)]
    pub notes: String,
}

/// Diet log request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietRequest {
    pub date: String,
    pub meal: String,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

/// Menstrual log request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenstrualRequest {
    pub date: String,
    pub period_event: String,
    pub flow_level: String,
    #[serde(default)]
    pub notes: String,
}

/// Symptom log request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomRequest {
    pub date: String,
    pub nausea: i32,
    pub fatigue: i32,
    pub pain: i32,
    #[serde(default)]
    pub notes: String,
}

// ============================================
// ANALYSIS DTOs
// ============================================

/// Flare-up prediction response
#[derive(Debug, Serialize)]
pub struct FlareupResponse {
    #[serde(flatten)]
    pub outcome: FlareupOutcome,
    pub message: String,
}

impl From<FlareupOutcome> for FlareupResponse {
    fn from(outcome: FlareupOutcome) -> Self {
        let message = outcome.message().to_string();
        Self { outcome, message }
    }
}

/// Recommendations response
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<String>,
    /// Which recommender produced them
    pub source: String,
}

// ============================================
// SYSTEM DTOs
// ============================================

/// Ping response
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub message: String,
}

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// Record store status
    pub storage: String,
    /// Stored records per kind, when the store is reachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<RecordCounts>,
    /// Active recommender
    pub recommender: String,
    pub uptime_seconds: u64,
    pub version: String,
}
