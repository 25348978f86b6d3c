//! Analysis error types

use thiserror::Error;

/// Conditions that stop an analysis before any result is produced
///
/// Both are terminal for the request. The engine is a pure function of the
/// records it was given, so retrying cannot change the outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// No symptom records at all
    #[error("No symptom data")]
    NoData,

    /// Fewer than two scored days, so no day-over-day delta exists
    #[error("Insufficient data for spike detection: need at least 2 symptom days, found {found}")]
    InsufficientSeries { found: usize },
}

/// Result type alias for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(AnalysisError::NoData.to_string(), "No symptom data");
        assert_eq!(
            AnalysisError::InsufficientSeries { found: 1 }.to_string(),
            "Insufficient data for spike detection: need at least 2 symptom days, found 1"
        );
    }
}
