//! Flareup Predictor
//!
//! Turns recent activity into explanation strings and a bounded flare-up
//! score.
//!
//! The recent window is the last N records of each kind, taken
//! independently. Explanations are driven by the days in the recent sleep
//! window; the other windows are only looked up on those days.
//!
//! The score is a heuristic ratio, not a calibrated probability:
//!
//! ```text
//! score = min(total_triggers / explanations, 1.0) * 100
//! ```
//!
//! It saturates at 100 whenever the historical trigger count reaches the
//! number of recent explanations.

use crate::analysis::index::DayIndex;
use crate::analysis::severity::severity;
use crate::analysis::stats::round2;
use crate::analysis::triggers::TriggerAggregate;
use crate::storage::{
    format_date, DietRecord, MenstrualRecord, RecordSet, SleepRecord, SymptomRecord,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How the recent window picks its records
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecentOrder {
    /// Last N in storage (insertion) order
    #[default]
    Storage,
    /// Latest N by date, ties kept in storage order
    Date,
}

impl std::str::FromStr for RecentOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "storage" => Ok(RecentOrder::Storage),
            "date" => Ok(RecentOrder::Date),
            other => Err(format!("Unknown recent window order: {}", other)),
        }
    }
}

/// The last few records of each kind
#[derive(Debug, Clone)]
pub struct RecentWindow<'a> {
    pub sleep: Vec<&'a SleepRecord>,
    pub diet: Vec<&'a DietRecord>,
    pub menstrual: Vec<&'a MenstrualRecord>,
    pub symptoms: Vec<&'a SymptomRecord>,
}

impl<'a> RecentWindow<'a> {
    /// Select up to `size` records of each kind
    pub fn select(records: &'a RecordSet, size: usize, order: RecentOrder) -> Self {
        match order {
            RecentOrder::Storage => Self {
                sleep: last_n(&records.sleep, size),
                diet: last_n(&records.diet, size),
                menstrual: last_n(&records.menstrual, size),
                symptoms: last_n(&records.symptoms, size),
            },
            RecentOrder::Date => Self {
                sleep: latest_by_date(&records.sleep, size, |r| r.date),
                diet: latest_by_date(&records.diet, size, |r| r.date),
                menstrual: latest_by_date(&records.menstrual, size, |r| r.date),
                symptoms: latest_by_date(&records.symptoms, size, |r| r.date),
            },
        }
    }

    /// Index the window by day
    pub fn index(&self) -> DayIndex<'a> {
        DayIndex::build(
            self.sleep.iter().copied(),
            self.diet.iter().copied(),
            self.menstrual.iter().copied(),
            self.symptoms.iter().copied(),
        )
    }

    /// Distinct days in the sleep window, in window order
    pub fn sleep_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = Vec::with_capacity(self.sleep.len());
        for record in &self.sleep {
            if !dates.contains(&record.date) {
                dates.push(record.date);
            }
        }
        dates
    }
}

fn last_n<T>(items: &[T], n: usize) -> Vec<&T> {
    items[items.len().saturating_sub(n)..].iter().collect()
}

fn latest_by_date<T>(items: &[T], n: usize, date: impl Fn(&T) -> NaiveDate) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| date(*item));
    let start = sorted.len().saturating_sub(n);
    sorted.split_off(start)
}

/// Build the explanation strings for the recent window
///
/// Per sleep-window day, in order: low sleep, each diet item, menstrual
/// event and flow, and high symptom severity (strictly above
/// `high_severity_bound`).
pub fn explain_recent(
    window: &RecentWindow<'_>,
    high_severity_bound: f64,
    low_sleep_hours: f64,
) -> Vec<String> {
    let index = window.index();
    let mut explanations = Vec::new();

    for date in window.sleep_dates() {
        let day = format_date(date);

        if let Some(sleep) = index.sleep_on(date) {
            if sleep.is_low(low_sleep_hours) {
                explanations.push(format!("Low sleep hours on {}", day));
            }
        }

        for meal in index.diet_on(date) {
            for item in &meal.items {
                explanations.push(format!("{} consumed on {}", capitalize(item), day));
            }
        }

        if let Some(menstrual) = index.menstrual_on(date) {
            explanations.push(format!(
                "{} period event on {}",
                capitalize(&menstrual.period_event),
                day
            ));
            explanations.push(format!(
                "{} flow on {}",
                capitalize(&menstrual.flow_level),
                day
            ));
        }

        if let Some(symptoms) = index.symptoms_on(date) {
            let value = severity(symptoms);
            if value > high_severity_bound {
                explanations.push(format!("High symptom severity on {}: {:.2}", day, value));
            }
        }
    }

    explanations
}

/// Heuristic flare-up score in [0, 100], rounded to 2 decimals
///
/// `None` when there are no explanations to normalise against.
pub fn flareup_probability(total_triggers: usize, explanation_count: usize) -> Option<f64> {
    if explanation_count == 0 {
        return None;
    }

    let ratio = (total_triggers as f64 / explanation_count as f64).min(1.0);
    Some(round2(ratio * 100.0))
}

/// A computed flare-up prediction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlareupPrediction {
    pub flareup_probability: f64,
    pub flareup_predictions: Vec<String>,
}

/// Outcome of flare-up prediction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlareupOutcome {
    /// Explanations and triggers were both found
    Predicted(FlareupPrediction),
    /// The recent window produced no explanations
    NoPredictions,
    /// Explanations exist but no spike was ever preceded by a trigger
    NoTriggers { flareup_predictions: Vec<String> },
}

impl FlareupOutcome {
    /// User-facing summary of the outcome
    pub fn message(&self) -> &'static str {
        match self {
            FlareupOutcome::Predicted(_) => "flareup prediction computed",
            FlareupOutcome::NoPredictions => "no recent flareup predictions found",
            FlareupOutcome::NoTriggers { .. } => "no triggers found in recent data",
        }
    }

    pub fn probability(&self) -> Option<f64> {
        match self {
            FlareupOutcome::Predicted(p) => Some(p.flareup_probability),
            _ => None,
        }
    }
}

/// Predict flare-up risk from the recent window and historical triggers
pub fn predict_flareup(
    window: &RecentWindow<'_>,
    triggers: &TriggerAggregate,
    high_severity_bound: f64,
    low_sleep_hours: f64,
) -> FlareupOutcome {
    let explanations = explain_recent(window, high_severity_bound, low_sleep_hours);
    if explanations.is_empty() {
        return FlareupOutcome::NoPredictions;
    }

    let total_triggers = triggers.total_triggers();
    match flareup_probability(total_triggers, explanations.len()) {
        Some(probability) if total_triggers > 0 => FlareupOutcome::Predicted(FlareupPrediction {
            flareup_probability: probability,
            flareup_predictions: explanations,
        }),
        _ => FlareupOutcome::NoTriggers {
            flareup_predictions: explanations,
        },
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::triggers::TriggerExample;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn triggers_with_low_sleep(count: usize) -> TriggerAggregate {
        let mut aggregate = TriggerAggregate::default();
        aggregate.low_sleep.count = count;
        aggregate.low_sleep.examples = vec![
            TriggerExample {
                date: day(1),
                severity: 8.0
            };
            count
        ];
        aggregate
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("chocolate"), "Chocolate");
        assert_eq!(capitalize("Wine"), "Wine");
        assert_eq!(capitalize("éclair"), "Éclair");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_window_uses_storage_order() {
        let mut records = RecordSet::new();
        for d in [5, 1, 9, 2] {
            records.sleep.push(SleepRecord::new(day(d), 7.0));
        }

        let window = RecentWindow::select(&records, 3, RecentOrder::Storage);
        assert_eq!(window.sleep_dates(), vec![day(1), day(9), day(2)]);

        let window = RecentWindow::select(&records, 3, RecentOrder::Date);
        assert_eq!(window.sleep_dates(), vec![day(2), day(5), day(9)]);
    }

    #[test]
    fn test_window_shorter_than_size() {
        let mut records = RecordSet::new();
        records.sleep.push(SleepRecord::new(day(1), 7.0));

        let window = RecentWindow::select(&records, 3, RecentOrder::Storage);
        assert_eq!(window.sleep.len(), 1);
        assert!(window.diet.is_empty());
    }

    #[test]
    fn test_window_dates_are_distinct() {
        let mut records = RecordSet::new();
        records.sleep.push(SleepRecord::new(day(3), 7.0));
        records.sleep.push(SleepRecord::new(day(3), 4.0));
        records.sleep.push(SleepRecord::new(day(4), 8.0));

        let window = RecentWindow::select(&records, 3, RecentOrder::Storage);
        assert_eq!(window.sleep_dates(), vec![day(3), day(4)]);

        // Last write wins within the window
        let explanations = explain_recent(&window, 10.0, 6.0);
        assert_eq!(explanations, vec!["Low sleep hours on 2024-07-03"]);
    }

    #[test]
    fn test_explanations_per_sleep_day() {
        let mut records = RecordSet::new();
        records.sleep.push(SleepRecord::new(day(10), 5.0));
        records
            .diet
            .push(DietRecord::new(day(10), "lunch").item("chocolate").item("coffee"));
        records
            .diet
            .push(DietRecord::new(day(10), "dinner").item("chocolate"));
        records
            .menstrual
            .push(MenstrualRecord::new(day(10), "start", "heavy"));
        records.symptoms.push(SymptomRecord::new(day(10), 8, 9, 7));

        let window = RecentWindow::select(&records, 3, RecentOrder::Storage);
        let explanations = explain_recent(&window, 6.0, 6.0);

        assert_eq!(
            explanations,
            vec![
                "Low sleep hours on 2024-07-10",
                "Chocolate consumed on 2024-07-10",
                "Coffee consumed on 2024-07-10",
                "Chocolate consumed on 2024-07-10",
                "Start period event on 2024-07-10",
                "Heavy flow on 2024-07-10",
                "High symptom severity on 2024-07-10: 8.00",
            ]
        );
    }

    #[test]
    fn test_days_outside_sleep_window_are_ignored() {
        let mut records = RecordSet::new();
        records.sleep.push(SleepRecord::new(day(1), 8.0));
        records.diet.push(DietRecord::new(day(2), "lunch").item("cheese"));
        records
            .menstrual
            .push(MenstrualRecord::new(day(2), "start", "light"));

        let window = RecentWindow::select(&records, 3, RecentOrder::Storage);
        assert!(explain_recent(&window, 5.0, 6.0).is_empty());
    }

    #[test]
    fn test_severity_at_bound_is_not_high() {
        let mut records = RecordSet::new();
        records.sleep.push(SleepRecord::new(day(1), 8.0));
        records.symptoms.push(SymptomRecord::new(day(1), 6, 6, 6));

        let window = RecentWindow::select(&records, 3, RecentOrder::Storage);
        assert!(explain_recent(&window, 6.0, 6.0).is_empty());
        assert_eq!(explain_recent(&window, 5.99, 6.0).len(), 1);
    }

    #[test]
    fn test_probability_ratio_and_saturation() {
        assert_eq!(flareup_probability(1, 3), Some(33.33));
        assert_eq!(flareup_probability(2, 3), Some(66.67));
        assert_eq!(flareup_probability(3, 3), Some(100.0));
        assert_eq!(flareup_probability(10, 3), Some(100.0));
        assert_eq!(flareup_probability(0, 3), Some(0.0));
        assert_eq!(flareup_probability(4, 0), None);
    }

    #[test]
    fn test_predict_no_predictions() {
        let records = RecordSet::new();
        let window = RecentWindow::select(&records, 3, RecentOrder::Storage);
        let outcome = predict_flareup(&window, &triggers_with_low_sleep(2), 5.0, 6.0);

        assert_eq!(outcome, FlareupOutcome::NoPredictions);
        assert_eq!(outcome.message(), "no recent flareup predictions found");
        assert_eq!(outcome.probability(), None);
    }

    #[test]
    fn test_predict_no_triggers() {
        let mut records = RecordSet::new();
        records.sleep.push(SleepRecord::new(day(1), 4.0));

        let window = RecentWindow::select(&records, 3, RecentOrder::Storage);
        let outcome = predict_flareup(&window, &TriggerAggregate::default(), 5.0, 6.0);

        assert!(matches!(outcome, FlareupOutcome::NoTriggers { .. }));
        assert_eq!(outcome.message(), "no triggers found in recent data");
    }

    #[test]
    fn test_predict_with_triggers() {
        let mut records = RecordSet::new();
        records.sleep.push(SleepRecord::new(day(1), 4.0));
        records.diet.push(DietRecord::new(day(1), "lunch").item("cheese"));

        let window = RecentWindow::select(&records, 3, RecentOrder::Storage);
        let outcome = predict_flareup(&window, &triggers_with_low_sleep(1), 5.0, 6.0);

        match outcome {
            FlareupOutcome::Predicted(prediction) => {
                assert_eq!(prediction.flareup_probability, 50.0);
                assert_eq!(prediction.flareup_predictions.len(), 2);
            }
            other => panic!("expected prediction, got {:?}", other),
        }
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = FlareupOutcome::Predicted(FlareupPrediction {
            flareup_probability: 50.0,
            flareup_predictions: vec!["Low sleep hours on 2024-07-01".to_string()],
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "predicted");
        assert_eq!(json["flareup_probability"], 50.0);

        let json = serde_json::to_value(FlareupOutcome::NoPredictions).unwrap();
        assert_eq!(json["status"], "no_predictions");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// The score is bounded and carries at most 2 decimals
        #[test]
        fn prop_probability_bounded_and_rounded(
            total_triggers in 0usize..10_000,
            explanation_count in 1usize..500,
        ) {
            let probability = flareup_probability(total_triggers, explanation_count).unwrap();
            prop_assert!((0.0..=100.0).contains(&probability));
            prop_assert!(((probability * 100.0).round() - probability * 100.0).abs() < 1e-6);
        }
    }
}
