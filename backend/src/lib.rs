//! # kpiboard - Sales KPI metrics from CSV uploads
//!
//! kpiboard reads a semicolon-delimited sales export, checks that it carries the
//! expected columns, normalizes dates and numbers, and computes the headline
//! indicators of a sales dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Validator  │────▶│ Normalizer  │────▶│ Aggregator  │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │  (columns)  │     │ (dates/nums)│     │  (Metrics)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kpiboard::{analyze_file, ReportOptions};
//!
//! let report = analyze_file("sales.csv".as_ref(), &ReportOptions::default()).unwrap();
//! println!("Total revenue: {}", report.metrics.total_revenue);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Record, Dataset, Metrics)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`validation`] - Required column check
//! - [`metrics`] - Date normalization, aggregation and the pipeline facade
//! - [`config`] - Environment-driven settings
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Validation
pub mod validation;

// Normalization and aggregation
pub mod metrics;

// Settings
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError,
    ValidationError,
    PipelineError,
    ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    RequiredColumn,
    Record,
    Dataset,
    Metrics,
    SalesSeries,
    PeriodSales,
    CustomerRevenue,
    REQUIRED_HEADER_LINE,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    parse_bytes,
    parse_file,
    parse_str,
    detect_encoding,
    detect_delimiter,
    decode_content,
    RawTable,
    RawRow,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid, missing_columns, validate, ValidTable};

// =============================================================================
// Re-exports - Metrics
// =============================================================================

pub use metrics::{
    aggregate,
    normalize,
    Granularity,
    MetricsOptions,
    PeriodKey,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use metrics::pipeline::{
    analyze_bytes,
    analyze_file,
    analyze_table,
    CsvInfo,
    Report,
    ReportOptions,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::logs::LOG_BROADCASTER;
pub use api::types::{CsvMetadata, ReportResponse, error_response};
pub use config::Settings;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
