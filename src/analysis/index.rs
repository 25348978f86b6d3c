//! Day Index - calendar-date lookup over one fetch of records
//!
//! Joins the four record kinds by day. Built once per analysis call from
//! borrowed records and dropped with it.
//!
//! # Design Notes
//! - Diet is one-to-many: every meal on a day is kept, in the order given
//! - Sleep, menstrual and symptom records are one-to-one: a later record on
//!   the same day replaces an earlier one

use crate::storage::{DietRecord, MenstrualRecord, RecordSet, SleepRecord, SymptomRecord};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Records of every kind keyed by calendar day
#[derive(Debug, Default)]
pub struct DayIndex<'a> {
    sleep: HashMap<NaiveDate, &'a SleepRecord>,
    diet: HashMap<NaiveDate, Vec<&'a DietRecord>>,
    menstrual: HashMap<NaiveDate, &'a MenstrualRecord>,
    symptoms: HashMap<NaiveDate, &'a SymptomRecord>,
}

impl<'a> DayIndex<'a> {
    /// Index arbitrary record sequences
    pub fn build(
        sleep: impl IntoIterator<Item = &'a SleepRecord>,
        diet: impl IntoIterator<Item = &'a DietRecord>,
        menstrual: impl IntoIterator<Item = &'a MenstrualRecord>,
        symptoms: impl IntoIterator<Item = &'a SymptomRecord>,
    ) -> Self {
        let mut index = Self::default();

        for record in sleep {
            index.sleep.insert(record.date, record);
        }
        for record in diet {
            index.diet.entry(record.date).or_default().push(record);
        }
        for record in menstrual {
            index.menstrual.insert(record.date, record);
        }
        for record in symptoms {
            index.symptoms.insert(record.date, record);
        }

        index
    }

    /// Index every record in a full fetch
    pub fn from_records(records: &'a RecordSet) -> Self {
        Self::build(
            &records.sleep,
            &records.diet,
            &records.menstrual,
            &records.symptoms,
        )
    }

    pub fn sleep_on(&self, date: NaiveDate) -> Option<&'a SleepRecord> {
        self.sleep.get(&date).copied()
    }

    /// All meals logged on a day, empty when none
    pub fn diet_on(&self, date: NaiveDate) -> &[&'a DietRecord] {
        self.diet.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn menstrual_on(&self, date: NaiveDate) -> Option<&'a MenstrualRecord> {
        self.menstrual.get(&date).copied()
    }

    pub fn symptoms_on(&self, date: NaiveDate) -> Option<&'a SymptomRecord> {
        self.symptoms.get(&date).copied()
    }
}
