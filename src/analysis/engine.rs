//! Analysis Engine
//!
//! The single entry point for the analysis pipeline:
//!
//! ```text
//! RecordSet → Severity Scorer → Spike Detector → Trigger Correlator
//!                                                  ├→ TriggerReport
//!                                                  ├→ Flareup Predictor
//!                                                  └→ Recommender (outside the core)
//! ```
//!
//! The engine holds only configuration. Every call works on the records it
//! is given and keeps nothing afterwards, so one engine can be shared by
//! any number of concurrent requests.

use crate::analysis::error::AnalysisResult;
use crate::analysis::flareup::{predict_flareup, FlareupOutcome, RecentOrder, RecentWindow};
use crate::analysis::index::DayIndex;
use crate::analysis::spikes::{detect_spikes, SpikeReport};
use crate::analysis::triggers::{correlate_triggers, TriggerAggregate};
use crate::storage::RecordSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tunables for the analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Sleep strictly below this many hours is a trigger
    pub low_sleep_hours: f64,
    /// Records per kind in the recent window
    pub recent_window: usize,
    /// How the recent window is selected
    pub recent_order: RecentOrder,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            low_sleep_hours: 6.0,
            recent_window: 3,
            recent_order: RecentOrder::Storage,
        }
    }
}

/// Spike detection and trigger correlation over one record fetch
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub spikes: SpikeReport,
    pub triggers: TriggerAggregate,
}

impl Analysis {
    /// Shape the analysis as the trigger report returned to clients
    pub fn report(&self) -> TriggerReport {
        TriggerReport {
            threshold: self.spikes.threshold,
            mean: self.spikes.symptom_average,
            std_dev: self.spikes.standard_deviation,
            spike_days: self.spikes.spikes.clone(),
            triggers: self.triggers.clone(),
        }
    }
}

/// Trigger analysis output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerReport {
    /// Spike threshold on day-over-day severity deltas
    pub threshold: f64,
    /// Mean daily severity
    pub mean: f64,
    /// Sample standard deviation of daily severity
    pub std_dev: f64,
    /// Spike date → severity
    pub spike_days: BTreeMap<NaiveDate, f64>,
    #[serde(flatten)]
    pub triggers: TriggerAggregate,
}

/// Runs the analysis pipeline
#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    config: AnalysisConfig,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Score, detect spikes and correlate triggers
    ///
    /// Fails with `NoData` when there are no symptom records and with
    /// `InsufficientSeries` when fewer than two exist.
    pub fn analyze(&self, records: &RecordSet) -> AnalysisResult<Analysis> {
        let spikes = detect_spikes(&records.symptoms)?;

        tracing::debug!(
            scored_days = spikes.scored_days,
            spike_days = spikes.spike_count(),
            threshold = spikes.threshold,
            "Detected severity spikes"
        );

        let index = DayIndex::from_records(records);
        let triggers = correlate_triggers(&spikes.spikes, &index, self.config.low_sleep_hours);

        Ok(Analysis { spikes, triggers })
    }

    /// Trigger report for the records
    pub fn trigger_report(&self, records: &RecordSet) -> AnalysisResult<TriggerReport> {
        Ok(self.analyze(records)?.report())
    }

    /// Flare-up prediction for the records
    pub fn predict_flareup(&self, records: &RecordSet) -> AnalysisResult<FlareupOutcome> {
        let analysis = self.analyze(records)?;
        Ok(self.predict_from(&analysis, records))
    }

    /// Flare-up prediction from an analysis already run over `records`
    pub fn predict_from(&self, analysis: &Analysis, records: &RecordSet) -> FlareupOutcome {
        let window =
            RecentWindow::select(records, self.config.recent_window, self.config.recent_order);

        let outcome = predict_flareup(
            &window,
            &analysis.triggers,
            analysis.spikes.high_severity_bound(),
            self.config.low_sleep_hours,
        );

        tracing::debug!(
            status = outcome.message(),
            probability = ?outcome.probability(),
            "Predicted flareup"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::error::AnalysisError;
    use crate::analysis::triggers::TriggerExample;
    use crate::storage::{DietRecord, MenstrualRecord, SleepRecord, SymptomRecord};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    fn flat(d: u32, value: i32) -> SymptomRecord {
        SymptomRecord::new(day(d), value, value, value)
    }

    /// Severity 2, 2, 9 with low sleep and chocolate the day before the jump.
    /// A flat fourth day is appended: with only two deltas the threshold
    /// equals the larger delta and nothing is strictly above it.
    fn chocolate_scenario() -> RecordSet {
        let mut records = RecordSet::new();
        records.symptoms = vec![flat(1, 2), flat(2, 2), flat(3, 9), flat(4, 9)];
        records.sleep.push(SleepRecord::new(day(2), 5.0));
        records
            .diet
            .push(DietRecord::new(day(2), "dinner").item("chocolate"));
        records
    }

    #[test]
    fn test_end_to_end_trigger_report() {
        let engine = AnalysisEngine::default();
        let report = engine.trigger_report(&chocolate_scenario()).unwrap();

        assert_eq!(report.spike_days.len(), 1);
        assert_eq!(report.spike_days.get(&day(3)), Some(&9.0));

        let example = TriggerExample {
            date: day(2),
            severity: 9.0,
        };
        assert_eq!(report.triggers.low_sleep.count, 1);
        assert_eq!(report.triggers.low_sleep.examples, vec![example]);
        assert_eq!(report.triggers.food_items.count("chocolate"), 1);
        assert_eq!(report.triggers.food_items.examples["chocolate"], vec![example]);
        assert!(report.triggers.menstrual_events.is_empty());
        assert!(report.triggers.flow_levels.is_empty());
    }

    #[test]
    fn test_predict_from_reuses_analysis() {
        let engine = AnalysisEngine::default();
        let records = chocolate_scenario();

        let analysis = engine.analyze(&records).unwrap();
        let outcome = engine.predict_from(&analysis, &records);

        assert_eq!(outcome, engine.predict_flareup(&records).unwrap());
        assert_eq!(analysis.report(), engine.trigger_report(&records).unwrap());
    }

    #[test]
    fn test_single_symptom_record_is_insufficient() {
        let mut records = RecordSet::new();
        records.symptoms.push(flat(1, 5));
        records.sleep.push(SleepRecord::new(day(1), 3.0));

        let engine = AnalysisEngine::default();
        assert_eq!(
            engine.trigger_report(&records),
            Err(AnalysisError::InsufficientSeries { found: 1 })
        );
        assert_eq!(
            engine.predict_flareup(&records),
            Err(AnalysisError::InsufficientSeries { found: 1 })
        );
    }

    #[test]
    fn test_no_symptoms_is_no_data() {
        let mut records = RecordSet::new();
        records.sleep.push(SleepRecord::new(day(1), 3.0));

        let engine = AnalysisEngine::default();
        assert_eq!(engine.analyze(&records), Err(AnalysisError::NoData));
    }

    #[test]
    fn test_report_json_shape() {
        let engine = AnalysisEngine::default();
        let report = engine.trigger_report(&chocolate_scenario()).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["threshold"].is_number());
        assert!(json["mean"].is_number());
        assert!(json["std_dev"].is_number());
        assert_eq!(json["low_sleep"]["count"], 1);
        assert_eq!(json["low_sleep"]["examples"][0]["date"], "2024-08-02");
        assert_eq!(json["low_sleep"]["examples"][0]["severity"], 9.0);
        assert_eq!(json["food_items"]["counts"]["chocolate"], 1);
        assert_eq!(json["spike_days"]["2024-08-03"], 9.0);
        assert!(json["menstrual_events"]["counts"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_end_to_end_flareup() {
        let mut records = chocolate_scenario();
        // Recent activity
        records.sleep.push(SleepRecord::new(day(10), 4.0));
        records
            .diet
            .push(DietRecord::new(day(10), "lunch").item("chocolate").item("bread"));
        records
            .menstrual
            .push(MenstrualRecord::new(day(10), "start", "medium"));

        let engine = AnalysisEngine::default();
        let outcome = engine.predict_flareup(&records).unwrap();

        match outcome {
            FlareupOutcome::Predicted(prediction) => {
                // Recent sleep window covers days 2 and 10.
                // Day 2: low sleep + chocolate. Day 10: low sleep, chocolate,
                // bread, event, flow. 7 explanations, 2 triggers.
                assert_eq!(prediction.flareup_predictions.len(), 7);
                assert_eq!(prediction.flareup_probability, 28.57);
                assert_eq!(prediction.flareup_predictions[0], "Low sleep hours on 2024-08-02");
                assert!(prediction
                    .flareup_predictions
                    .contains(&"Medium flow on 2024-08-10".to_string()));
            }
            other => panic!("expected prediction, got {:?}", other),
        }
    }

    #[test]
    fn test_flareup_without_triggers() {
        let mut records = RecordSet::new();
        records.symptoms = (1..=4).map(|d| flat(d, 3)).collect();
        records.sleep.push(SleepRecord::new(day(4), 4.0));

        let engine = AnalysisEngine::default();
        let outcome = engine.predict_flareup(&records).unwrap();
        assert!(matches!(outcome, FlareupOutcome::NoTriggers { .. }));
    }

    #[test]
    fn test_custom_low_sleep_threshold() {
        let mut records = chocolate_scenario();
        records.sleep[0].duration_hours = 6.5;

        let strict = AnalysisEngine::default();
        assert_eq!(strict.analyze(&records).unwrap().triggers.low_sleep.count, 0);

        let lenient = AnalysisEngine::new(AnalysisConfig {
            low_sleep_hours: 7.0,
            ..Default::default()
        });
        assert_eq!(lenient.analyze(&records).unwrap().triggers.low_sleep.count, 1);
    }

    #[test]
    fn test_engine_does_not_depend_on_input_order() {
        let mut records = chocolate_scenario();
        let forward = AnalysisEngine::default().analyze(&records).unwrap();

        records.symptoms.reverse();
        let reversed = AnalysisEngine::default().analyze(&records).unwrap();

        assert_eq!(forward, reversed);
    }
}
