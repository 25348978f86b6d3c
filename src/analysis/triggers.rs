//! Trigger Correlator
//!
//! For every spike day, looks at the calendar day before it and counts the
//! lifestyle factors logged there:
//!
//! - low sleep (duration under the configured hours)
//! - every food item of every meal
//! - the menstrual period event
//! - the menstrual flow level
//!
//! Categories are independent. One antecedent day can feed all four, and a
//! day with no record in a category adds nothing to it. The spike day
//! itself is never inspected.

use crate::analysis::index::DayIndex;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One observed trigger instance: the antecedent day and the severity of
/// the spike that followed it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TriggerExample {
    pub date: NaiveDate,
    pub severity: f64,
}

/// Low sleep count with its examples
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LowSleepTrigger {
    pub count: usize,
    pub examples: Vec<TriggerExample>,
}

impl LowSleepTrigger {
    fn record(&mut self, example: TriggerExample) {
        self.count += 1;
        self.examples.push(example);
    }
}

/// Per-value counts and examples for a string-valued trigger category
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TriggerCounts {
    pub counts: BTreeMap<String, usize>,
    pub examples: BTreeMap<String, Vec<TriggerExample>>,
}

impl TriggerCounts {
    fn record(&mut self, value: &str, example: TriggerExample) {
        *self.counts.entry(value.to_string()).or_insert(0) += 1;
        self.examples
            .entry(value.to_string())
            .or_default()
            .push(example);
    }

    /// Sum of all counts in this category
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn count(&self, value: &str) -> usize {
        self.counts.get(value).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Values sorted by count, highest first (ties alphabetical)
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(value, count)| (value.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// Everything the correlator found across all spike days
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TriggerAggregate {
    pub low_sleep: LowSleepTrigger,
    pub food_items: TriggerCounts,
    pub menstrual_events: TriggerCounts,
    pub flow_levels: TriggerCounts,
}

impl TriggerAggregate {
    /// Trigger instances across all four categories
    pub fn total_triggers(&self) -> usize {
        self.low_sleep.count
            + self.food_items.total()
            + self.menstrual_events.total()
            + self.flow_levels.total()
    }

    pub fn is_empty(&self) -> bool {
        self.total_triggers() == 0
    }
}

/// Correlate spike days with the day before each of them
///
/// `spikes` maps spike date to the severity on that date.
pub fn correlate_triggers(
    spikes: &BTreeMap<NaiveDate, f64>,
    index: &DayIndex<'_>,
    low_sleep_hours: f64,
) -> TriggerAggregate {
    let mut aggregate = TriggerAggregate::default();

    for (&spike_date, &severity) in spikes {
        let Some(antecedent) = spike_date.pred_opt() else {
            continue;
        };

        let example = TriggerExample {
            date: antecedent,
            severity,
        };

        if let Some(sleep) = index.sleep_on(antecedent) {
            if sleep.is_low(low_sleep_hours) {
                aggregate.low_sleep.record(example);
            }
        }

        for meal in index.diet_on(antecedent) {
            for item in &meal.items {
                aggregate.food_items.record(item, example);
            }
        }

        if let Some(menstrual) = index.menstrual_on(antecedent) {
            aggregate
                .menstrual_events
                .record(&menstrual.period_event, example);
            aggregate.flow_levels.record(&menstrual.flow_level, example);
        }
    }

    tracing::debug!(
        spike_days = spikes.len(),
        total_triggers = aggregate.total_triggers(),
        "Correlated spike days with antecedent days"
    );

    aggregate
}
