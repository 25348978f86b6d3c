//! Flarewatch Record Storage
//!
//! This module provides persistence for the daily health logs:
//!
//! - **types**: Record structures (SleepRecord, DietRecord, MenstrualRecord, SymptomRecord)
//! - **store**: The `RecordStore` trait with SQLite and in-memory implementations
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use flarewatch::storage::{RecordStore, SqliteStore, SymptomRecord};
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::open("./flarewatch_data/flarewatch.db")?;
//!
//!     let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//!     store.insert_symptoms(SymptomRecord::new(date, 3, 5, 4)).await?;
//!
//!     let records = store.fetch_all().await?;
//!     println!("{} symptom entries", records.symptoms.len());
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod store;
pub mod types;

pub use error::{StorageError, StorageResult};
pub use store::{MemoryStore, RecordStore, SqliteStore};
pub use types::{
    format_date, parse_record_date, DietRecord, MenstrualRecord, RecordCounts, RecordKind,
    RecordSet, SleepRecord, SymptomRecord, DATE_FORMAT,
};
