//! # Flarewatch
//!
//! Personal health log analysis: finds which sleep, diet and menstrual
//! factors tend to precede symptom flare-ups, and how risky the last few
//! days look.
//!
//! ## Features
//!
//! - **Record store**: Sleep, diet, menstrual and symptom logs in SQLite
//! - **Spike detection**: Day-over-day severity jumps above the usual spread
//! - **Trigger correlation**: What was logged the day before each spike
//! - **Flare-up prediction**: Explanations and a bounded score for recent days
//! - **Recommendations**: Rule-based or from a text generation service
//!
//! ## Modules
//!
//! - [`storage`]: Record types and the record store
//! - [`analysis`]: The analysis pipeline
//! - [`recommend`]: Recommendation composers
//! - [`integrations`]: CSV import
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flarewatch::analysis::AnalysisEngine;
//! use flarewatch::storage::*;
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::open("flarewatch.db")?;
//!
//!     for (day, rating) in [(1, 2), (2, 2), (3, 9), (4, 9)] {
//!         let date = NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
//!         store.insert_symptoms(SymptomRecord::new(date, rating, rating, rating)).await?;
//!     }
//!
//!     let records = store.fetch_all().await?;
//!     let report = AnalysisEngine::default().trigger_report(&records)?;
//!
//!     println!("{} spike days above {:.2}", report.spike_days.len(), report.threshold);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod api;
pub mod config;
pub mod integrations;
pub mod recommend;
pub mod storage;

// Re-export top-level types for convenience
pub use storage::{
    DietRecord, MemoryStore, MenstrualRecord, RecordKind, RecordSet, RecordStore, SleepRecord,
    SqliteStore, StorageError, StorageResult, SymptomRecord,
};

pub use analysis::{
    AnalysisConfig, AnalysisEngine, AnalysisError, FlareupOutcome, FlareupPrediction,
    TriggerReport,
};

pub use recommend::{
    RecommendError, RecommendationRequest, Recommender, RuleBasedRecommender, TextGenRecommender,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{
    ApiConfig as ConfigApiConfig, Config, ConfigError, LoggingConfig, RecommenderConfig,
    StorageConfig,
};

pub use integrations::{CsvImporter, ImportError};
