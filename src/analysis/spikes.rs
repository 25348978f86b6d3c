//! Spike Detector
//!
//! Flags days whose severity jumped unusually far above the previous
//! scored day.
//!
//! ```text
//! severity:  2    2    9    8
//! delta:          0    7   -1
//! threshold = mean(delta) + population_std(delta)
//! spike     = delta > threshold   (strict, rises only)
//! ```

use crate::analysis::error::{AnalysisError, AnalysisResult};
use crate::analysis::severity::score_days;
use crate::analysis::stats::{mean, population_std_dev, sample_std_dev};
use crate::storage::SymptomRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Slack on the spike comparison so rounding noise in equal deltas is not
/// read as a rise. Ratings move severity in steps of 1/3, far above this.
pub const DELTA_TOLERANCE: f64 = 1e-9;

/// Output of spike detection over a full symptom series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpikeReport {
    /// `mean_delta + std_delta`
    pub threshold: f64,
    /// Mean of the day-over-day deltas
    pub mean_delta: f64,
    /// Population standard deviation of the deltas
    pub std_delta: f64,
    /// Mean severity across all scored days
    pub symptom_average: f64,
    /// Sample standard deviation of severity across all scored days
    pub standard_deviation: f64,
    /// Number of scored days the report was built from
    pub scored_days: usize,
    /// Spike date → severity on that date
    pub spikes: BTreeMap<NaiveDate, f64>,
}

impl SpikeReport {
    /// Severity above which a single day counts as unusually bad
    pub fn high_severity_bound(&self) -> f64 {
        self.symptom_average + self.standard_deviation
    }

    pub fn spike_count(&self) -> usize {
        self.spikes.len()
    }
}

/// Detect spike days in an unordered symptom collection
pub fn detect_spikes(records: &[SymptomRecord]) -> AnalysisResult<SpikeReport> {
    if records.is_empty() {
        return Err(AnalysisError::NoData);
    }

    let days = score_days(records);
    if days.len() < 2 {
        return Err(AnalysisError::InsufficientSeries { found: days.len() });
    }

    let severities: Vec<f64> = days.iter().map(|d| d.severity).collect();
    let deltas: Vec<f64> = severities.windows(2).map(|w| w[1] - w[0]).collect();

    let mean_delta = mean(&deltas);
    let std_delta = population_std_dev(&deltas);
    let threshold = mean_delta + std_delta;

    let mut spikes = BTreeMap::new();
    for (i, delta) in deltas.iter().enumerate() {
        if *delta > threshold + DELTA_TOLERANCE {
            // Later positions overwrite earlier ones on the same date
            let day = &days[i + 1];
            spikes.insert(day.date, day.severity);
        }
    }

    Ok(SpikeReport {
        threshold,
        mean_delta,
        std_delta,
        symptom_average: mean(&severities),
        standard_deviation: sample_std_dev(&severities),
        scored_days: days.len(),
        spikes,
    })
}
