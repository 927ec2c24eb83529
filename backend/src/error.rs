//! Error types for the kpiboard metrics pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - decoding and CSV splitting errors
//! - [`ValidationError`] - schema and cell-level rejections of an upload
//! - [`NumberError`] - why a numeric cell failed to parse
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP surface errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use serde::Serialize;
use thiserror::Error;

use crate::models::REQUIRED_HEADER_LINE;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while turning uploaded bytes into a raw table.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes could not be decoded as text.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// Malformed CSV record.
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    /// No header line at all.
    #[error("CSV file is empty")]
    EmptyFile,
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Rejection of an uploaded table.
///
/// Serialized with a `kind` tag so the presentation layer can branch on it
/// without parsing the message.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// One or more required columns are absent.
    #[error(
        "The uploaded file must contain the following columns: {} (missing: {})",
        REQUIRED_HEADER_LINE,
        .missing.join(", ")
    )]
    MissingColumns { missing: Vec<String> },

    /// A Date cell could not be read as a calendar date.
    #[error("Invalid date '{value}' in row {row} (line {line})")]
    DateParse {
        row: usize,
        line: usize,
        value: String,
    },

    /// A numeric cell holds non-numeric text.
    #[error("Invalid number '{value}' in column '{column}', row {row} (line {line})")]
    InvalidNumber {
        row: usize,
        line: usize,
        column: String,
        value: String,
    },
}

/// Why a numeric cell was rejected. Surfaces as
/// [`ValidationError::InvalidNumber`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    /// Not a number at all.
    #[error(transparent)]
    Parse(#[from] std::num::ParseFloatError),

    /// Parsed to an infinite value.
    #[error("value is not finite")]
    NotFinite,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is the error type returned by [`crate::metrics::pipeline::analyze_bytes`]
/// and friends. Any variant means no metric was computed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Upload rejected by the validator or normalizer.
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Csv(CsvError::Io(err))
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for validation and normalization.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
