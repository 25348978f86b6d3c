//! Flarewatch Analysis
//!
//! Finds what tends to precede symptom flare-ups and how risky the last
//! few days look.
//!
//! ## Pipeline
//!
//! - **severity**: Reduce each symptom record to one severity value
//! - **spikes**: Flag days whose severity rose more than usual
//! - **index**: Join all record kinds by calendar day
//! - **triggers**: Count what was logged on the day before each spike
//! - **flareup**: Explain the recent window and score flare-up risk
//! - **engine**: One entry point that runs the whole pipeline
//!
//! Everything here is synchronous and pure. Records are fetched by the
//! caller and passed in.

pub mod engine;
pub mod error;
pub mod flareup;
pub mod index;
pub mod severity;
pub mod spikes;
pub mod stats;
pub mod triggers;

pub use engine::{Analysis, AnalysisConfig, AnalysisEngine, TriggerReport};
pub use error::{AnalysisError, AnalysisResult};
pub use flareup::{
    explain_recent, flareup_probability, FlareupOutcome, FlareupPrediction, RecentOrder,
    RecentWindow,
};
pub use index::DayIndex;
pub use severity::{score_days, severity, ScoredDay};
pub use spikes::{detect_spikes, SpikeReport};
pub use triggers::{
    correlate_triggers, LowSleepTrigger, TriggerAggregate, TriggerCounts, TriggerExample,
};
