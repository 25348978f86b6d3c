//! CSV Import
//!
//! Bulk import of one record kind from a CSV file with a header row.
//! Columns are matched by header name, in any order:
//!
//! | Kind | Columns |
//! |---|---|
//! | sleep | `date`, `duration` (or `duration_hours`, `hours`), `quality`, `disruptions`, `notes` |
//! | diet | `date`, `meal`, `items` (separated by `;`), `notes` |
//! | menstrual | `date`, `period_event` (or `event`), `flow_level` (or `flow`), `notes` |
//! | symptoms | `date`, `nausea`, `fatigue`, `pain`, `notes` |
//!
//! Rows that fail to parse are skipped and reported; the rest are kept.

use super::ImportError;
use crate::storage::{
    parse_record_date, DietRecord, MenstrualRecord, RecordKind, RecordSet, RecordStore,
    SleepRecord, SymptomRecord,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Maximum number of row errors kept in an import result
const MAX_REPORTED_ERRORS: usize = 100;

/// CSV importer for one record kind
pub struct CsvImporter {
    kind: RecordKind,
    /// Separator between food items in the diet `items` column
    item_separator: char,
    delimiter: u8,
}

/// Result of a CSV import operation
#[derive(Debug, Default)]
pub struct CsvImportResult {
    pub records: RecordSet,
    pub rows_processed: usize,
    pub rows_failed: usize,
    pub errors: Vec<String>,
}

impl CsvImportResult {
    fn push_error(&mut self, line: usize, message: impl std::fmt::Display) {
        self.rows_failed += 1;
        self.errors.push(format!("Line {}: {}", line, message));
    }
}

/// Header positions for the columns of one kind
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        Columns(
            headers
                .iter()
                .enumerate()
                .map(|(idx, h)| (h.trim().to_lowercase().replace(' ', "_"), idx))
                .collect(),
        )
    }

    fn find(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| self.0.get(*name).copied())
    }

    fn require(&self, names: &[&str]) -> Result<usize, ImportError> {
        self.find(names)
            .ok_or_else(|| ImportError::MissingColumn(names[0].to_string()))
    }
}

/// A parsed CSV row with its column lookup
struct Row<'a> {
    record: &'a csv::StringRecord,
    columns: &'a Columns,
}

impl Row<'_> {
    fn text(&self, names: &[&str]) -> String {
        self.columns
            .find(names)
            .and_then(|idx| self.record.get(idx))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    fn required_text(&self, names: &[&str]) -> Result<String, String> {
        let value = self.text(names);
        if value.is_empty() {
            Err(format!("missing {}", names[0]))
        } else {
            Ok(value)
        }
    }

    fn date(&self) -> Result<NaiveDate, String> {
        let raw = self.required_text(&["date"])?;
        parse_record_date(&raw).ok_or_else(|| format!("invalid date: {}", raw))
    }

    fn number<T: std::str::FromStr>(&self, names: &[&str]) -> Result<T, String> {
        let raw = self.required_text(names)?;
        raw.parse()
            .map_err(|_| format!("invalid {}: {}", names[0], raw))
    }

    fn optional_number<T: std::str::FromStr + Default>(&self, names: &[&str]) -> Result<T, String> {
        if self.text(names).is_empty() {
            Ok(T::default())
        } else {
            self.number(names)
        }
    }
}

impl CsvImporter {
    /// Create an importer for the given record kind
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            item_separator: ';',
            delimiter: b',',
        }
    }

    /// Set the separator between diet items
    pub fn with_item_separator(mut self, separator: char) -> Self {
        self.item_separator = separator;
        self
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Columns that must be present in the header
    fn required_columns(&self) -> &'static [&'static [&'static str]] {
        match self.kind {
            RecordKind::Sleep => &[&["date"], &["duration", "duration_hours", "hours"]],
            RecordKind::Diet => &[&["date"], &["meal"]],
            RecordKind::Menstrual => &[
                &["date"],
                &["period_event", "event"],
                &["flow_level", "flow"],
            ],
            RecordKind::Symptoms => &[&["date"], &["nausea"], &["fatigue"], &["pain"]],
        }
    }

    /// Import records from a CSV file
    pub fn import(&self, path: &Path) -> Result<CsvImportResult, ImportError> {
        let file = std::fs::File::open(path)?;
        self.import_reader(file)
    }

    /// Import from a CSV string
    pub fn import_str(&self, csv_data: &str) -> Result<CsvImportResult, ImportError> {
        self.import_reader(csv_data.as_bytes())
    }

    fn import_reader<R: Read>(&self, reader: R) -> Result<CsvImportResult, ImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(reader);

        let columns = Columns::from_headers(reader.headers()?);
        for names in self.required_columns() {
            columns.require(names)?;
        }

        let mut result = CsvImportResult::default();

        for (line_num, row) in reader.records().enumerate() {
            // Header is line 1
            let line = line_num + 2;

            let record = match row {
                Ok(r) => r,
                Err(e) => {
                    result.push_error(line, e);
                    continue;
                }
            };

            let row = Row {
                record: &record,
                columns: &columns,
            };

            match self.parse_row(&row, &mut result.records) {
                Ok(()) => result.rows_processed += 1,
                Err(e) => result.push_error(line, e),
            }
        }

        if result.errors.len() > MAX_REPORTED_ERRORS {
            let total = result.errors.len();
            result.errors.truncate(MAX_REPORTED_ERRORS);
            result
                .errors
                .push(format!("... and {} more errors", total - MAX_REPORTED_ERRORS));
        }

        tracing::debug!(
            kind = %self.kind,
            rows_processed = result.rows_processed,
            rows_failed = result.rows_failed,
            "Parsed CSV import"
        );

        Ok(result)
    }

    fn parse_row(&self, row: &Row<'_>, records: &mut RecordSet) -> Result<(), String> {
        let date = row.date()?;
        let notes = row.text(&["notes"]);

        match self.kind {
            RecordKind::Sleep => records.sleep.push(SleepRecord {
                id: 0,
                date,
                duration_hours: row.number(&["duration", "duration_hours", "hours"])?,
                quality: row.optional_number(&["quality"])?,
                disruptions: row.text(&["disruptions"]),
                notes,
            }),
            RecordKind::Diet => records.diet.push(DietRecord {
                id: 0,
                date,
                meal: row.required_text(&["meal"])?,
                items: row
                    .text(&["items"])
                    .split(self.item_separator)
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(String::from)
                    .collect(),
                notes,
            }),
            RecordKind::Menstrual => records.menstrual.push(MenstrualRecord {
                id: 0,
                date,
                period_event: row.required_text(&["period_event", "event"])?,
                flow_level: row.required_text(&["flow_level", "flow"])?,
                notes,
            }),
            RecordKind::Symptoms => records.symptoms.push(SymptomRecord {
                id: 0,
                date,
                nausea: row.number(&["nausea"])?,
                fatigue: row.number(&["fatigue"])?,
                pain: row.number(&["pain"])?,
                notes,
            }),
        }

        Ok(())
    }
}

/// Insert every imported record into a store, in file order
///
/// Returns the number of records stored.
pub async fn store_imported(
    store: &dyn RecordStore,
    records: RecordSet,
) -> Result<usize, ImportError> {
    let mut stored = 0;

    for record in records.sleep {
        store.insert_sleep(record).await?;
        stored += 1;
    }
    for record in records.diet {
        store.insert_diet(record).await?;
        stored += 1;
    }
    for record in records.menstrual {
        store.insert_menstrual(record).await?;
        stored += 1;
    }
    for record in records.symptoms {
        store.insert_symptoms(record).await?;
        stored += 1;
    }

    Ok(stored)
}
