//! External Integrations
//!
//! Bulk loading of health logs kept elsewhere:
//! - CSV import (one record kind per file)

mod csv_import;

pub use csv_import::{store_imported, CsvImportResult, CsvImporter};

use crate::storage::StorageError;

/// Errors that can occur during import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
