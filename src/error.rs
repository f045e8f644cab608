//! Error types for loading, querying, aggregating and exporting.
//!
//! - [`LoadError`] - fatal problems with the source tables
//! - [`QueryError`] - recoverable "no data" conditions for a selection
//! - [`AggregationError`] - statistics requested over nothing
//! - [`ExportError`] - failures while writing the CSV export
//! - [`ConfigError`] - invalid dashboard configuration

use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::StockCode;

// =============================================================================
// Load errors (fatal for the session)
// =============================================================================

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("unsupported file extension '.{extension}' for {}", .path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// A required column is absent after header normalization.
    #[error("{} is missing required column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("{} has column '{column}' more than once", .path.display())]
    DuplicateColumn { path: PathBuf, column: String },

    /// `row` is the 1-based data row in the source (header excluded, blank
    /// rows counted).
    #[error("{}, row {row}, column '{column}': {reason} (value '{value}')", .path.display())]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("{} has conflicting records for ({code}, {year})", .path.display())]
    DuplicateKey {
        path: PathBuf,
        code: StockCode,
        year: i32,
    },
}

impl LoadError {
    pub(crate) fn unreadable(path: &std::path::Path, reason: impl ToString) -> Self {
        LoadError::Unreadable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Query errors (recoverable, view-scoped)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("no data found for company {0}")]
    NoDataForCompany(StockCode),

    #[error("no data found for company {code} in {year}")]
    NoDataForCompanyYear { code: StockCode, year: i32 },
}

// =============================================================================
// Aggregation errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("cannot aggregate '{metric}' over an empty subset")]
    EmptyInput { metric: &'static str },

    /// Every row in the subset has a null value for the metric.
    #[error("'{metric}' has no values among {rows} rows")]
    NoValues { metric: &'static str, rows: usize },
}

// =============================================================================
// Export errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export for company {0}")]
    EmptySlice(StockCode),

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Configuration errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("export window is inverted: {start} > {end}")]
    InvertedWindow { start: i32, end: i32 },
}
