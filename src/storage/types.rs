//! Core record types for the Flarewatch health log
//!
//! This module defines the four daily log records the service stores:
//! - `SleepRecord`: Duration and quality of a night's sleep
//! - `DietRecord`: A meal and the food items it contained
//! - `MenstrualRecord`: Period event and flow level
//! - `SymptomRecord`: Nausea, fatigue and pain ratings
//!
//! All records are keyed by calendar day. `RecordSet` bundles one full
//! fetch of all four collections in storage order.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Date format used for every rendered date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A night of sleep
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SleepRecord {
    /// Storage id, assigned by the record store (0 until stored)
    #[serde(default)]
    pub id: i64,
    /// Calendar day the sleep is logged against
    pub date: NaiveDate,
    /// Hours slept
    pub duration_hours: f64,
    /// Self-rated quality
    #[serde(default)]
    pub quality: i32,
    /// Free-text disruptions (noise, waking up, ...)
    #[serde(default)]
    pub disruptions: String,
    #[serde(default)]
    pub notes: String,
}

impl SleepRecord {
    pub fn new(date: NaiveDate, duration_hours: f64) -> Self {
        Self {
            id: 0,
            date,
            duration_hours,
            quality: 0,
            disruptions: String::new(),
            notes: String::new(),
        }
    }

    /// Builder method: set quality
    pub fn quality(mut self, quality: i32) -> Self {
        self.quality = quality;
        self
    }

    /// Whether this night counts as low sleep
    pub fn is_low(&self, threshold_hours: f64) -> bool {
        self.duration_hours < threshold_hours
    }
}

/// A logged meal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DietRecord {
    #[serde(default)]
    pub id: i64,
    pub date: NaiveDate,
    /// Meal label ("breakfast", "dinner", ...)
    pub meal: String,
    /// Food items eaten, each one a separate trigger candidate
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl DietRecord {
    pub fn new(date: NaiveDate, meal: impl Into<String>) -> Self {
        Self {
            id: 0,
            date,
            meal: meal.into(),
            items: Vec::new(),
            notes: String::new(),
        }
    }

    /// Builder method: add a food item
    pub fn item(mut self, item: impl Into<String>) -> Self {
        self.items.push(item.into());
        self
    }
}

/// A menstrual cycle entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenstrualRecord {
    #[serde(default)]
    pub id: i64,
    pub date: NaiveDate,
    /// Cycle event ("start", "ongoing", "end", ...)
    pub period_event: String,
    /// Flow level ("light", "medium", "heavy", ...)
    pub flow_level: String,
    #[serde(default)]
    pub notes: String,
}

impl MenstrualRecord {
    pub fn new(
        date: NaiveDate,
        period_event: impl Into<String>,
        flow_level: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            date,
            period_event: period_event.into(),
            flow_level: flow_level.into(),
            notes: String::new(),
        }
    }
}

/// Daily symptom ratings, each nominally 1-10
///
/// Ratings are stored as given. Out-of-range values are not rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomRecord {
    #[serde(default)]
    pub id: i64,
    pub date: NaiveDate,
    pub nausea: i32,
    pub fatigue: i32,
    pub pain: i32,
    #[serde(default)]
    pub notes: String,
}

impl SymptomRecord {
    pub fn new(date: NaiveDate, nausea: i32, fatigue: i32, pain: i32) -> Self {
        Self {
            id: 0,
            date,
            nausea,
            fatigue,
            pain,
            notes: String::new(),
        }
    }
}

/// Kind of record, used for routing and CSV import
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Sleep,
    Diet,
    Menstrual,
    Symptoms,
}

impl RecordKind {
    /// Get all kinds for iteration
    pub fn all() -> &'static [RecordKind] {
        &[
            RecordKind::Sleep,
            RecordKind::Diet,
            RecordKind::Menstrual,
            RecordKind::Symptoms,
        ]
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Sleep => write!(f, "sleep"),
            RecordKind::Diet => write!(f, "diet"),
            RecordKind::Menstrual => write!(f, "menstrual"),
            RecordKind::Symptoms => write!(f, "symptoms"),
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sleep" => Ok(RecordKind::Sleep),
            "diet" => Ok(RecordKind::Diet),
            "menstrual" => Ok(RecordKind::Menstrual),
            "symptom" | "symptoms" => Ok(RecordKind::Symptoms),
            other => Err(format!("Unknown record kind: {}", other)),
        }
    }
}

/// One full fetch of every record collection, each in storage order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSet {
    pub sleep: Vec<SleepRecord>,
    pub diet: Vec<DietRecord>,
    pub menstrual: Vec<MenstrualRecord>,
    pub symptoms: Vec<SymptomRecord>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all collections
    pub fn len(&self) -> usize {
        self.sleep.len() + self.diet.len() + self.menstrual.len() + self.symptoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-kind record counts
    pub fn counts(&self) -> RecordCounts {
        RecordCounts {
            sleep: self.sleep.len(),
            diet: self.diet.len(),
            menstrual: self.menstrual.len(),
            symptoms: self.symptoms.len(),
        }
    }
}

/// Number of stored records per kind
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordCounts {
    pub sleep: usize,
    pub diet: usize,
    pub menstrual: usize,
    pub symptoms: usize,
}

/// Parse a record date
///
/// Accepts RFC 3339 timestamps (`2024-03-01T08:00:00Z`) or plain
/// `YYYY-MM-DD`. Only the calendar day is kept.
pub fn parse_record_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Render a date the way every report and explanation does
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
