//! Recommendation Composer
//!
//! Phrases advice from the trigger report. The analysis engine does not
//! call this module; request handlers pass the engine's `TriggerReport`
//! and the raw records to whichever `Recommender` the service was built
//! with.
//!
//! ## Implementations
//!
//! - **TextGenRecommender**: Calls an OpenAI-compatible text-generation service
//! - **RuleBasedRecommender**: Local, deterministic fallback
//!
//! Every recommender returns exactly three short strings.

mod client;
mod prompt;
mod rules;

pub use client::{TextGenConfig, TextGenRecommender};
pub use prompt::{build_prompt, parse_recommendations, SYSTEM_PROMPT};
pub use rules::RuleBasedRecommender;

use crate::analysis::TriggerReport;
use crate::storage::RecordSet;
use async_trait::async_trait;
use thiserror::Error;

/// Number of recommendations every recommender returns
pub const RECOMMENDATION_COUNT: usize = 3;

/// Input handed to a recommender
#[derive(Debug, Clone, Copy)]
pub struct RecommendationRequest<'a> {
    pub report: &'a TriggerReport,
    pub records: &'a RecordSet,
}

/// Produces phrased advice from a trigger report
#[async_trait]
pub trait Recommender: Send + Sync {
    /// Short identifier reported alongside the recommendations
    fn name(&self) -> &str;

    /// Exactly `RECOMMENDATION_COUNT` recommendations
    async fn recommend(
        &self,
        request: RecommendationRequest<'_>,
    ) -> Result<Vec<String>, RecommendError>;
}

/// Errors that can occur while composing recommendations
#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Text generation service unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited")]
    RateLimited,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
