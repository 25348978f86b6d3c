//! Severity Scorer
//!
//! Reduces a symptom record to one daily severity value.

use crate::storage::SymptomRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A symptom day reduced to its severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoredDay {
    pub date: NaiveDate,
    pub severity: f64,
}

impl ScoredDay {
    pub fn from_record(record: &SymptomRecord) -> Self {
        Self {
            date: record.date,
            severity: severity(record),
        }
    }
}

/// Mean of the nausea, fatigue and pain ratings
///
/// Ratings outside 1-10 are not clamped.
pub fn severity(record: &SymptomRecord) -> f64 {
    (record.nausea as f64 + record.fatigue as f64 + record.pain as f64) / 3.0
}

/// Score every record and sort ascending by date
///
/// The sort is stable, so same-date records keep their storage order.
pub fn score_days(records: &[SymptomRecord]) -> Vec<ScoredDay> {
    let mut days: Vec<ScoredDay> = records.iter().map(ScoredDay::from_record).collect();
    days.sort_by_key(|d| d.date);
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_severity_is_mean_of_ratings() {
        let record = SymptomRecord::new(day(1), 3, 6, 9);
        assert!((severity(&record) - 6.0).abs() < 1e-12);

        let record = SymptomRecord::new(day(1), 1, 1, 2);
        assert!((severity(&record) - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_severity_passes_out_of_range_through() {
        let record = SymptomRecord::new(day(1), 0, 15, -3);
        assert!((severity(&record) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_days_sorts_stably() {
        let records = vec![
            SymptomRecord::new(day(3), 9, 9, 9),
            SymptomRecord::new(day(1), 1, 1, 1),
            SymptomRecord::new(day(3), 3, 3, 3),
            SymptomRecord::new(day(2), 2, 2, 2),
        ];

        let days = score_days(&records);
        let dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3), day(3)]);
        // Same-date records stay in storage order
        assert_eq!(days[2].severity, 9.0);
        assert_eq!(days[3].severity, 3.0);
    }
}
