//! High-level pipeline API: upload in, report out.
//!
//! Combines every stage in order: parsing, schema validation, normalization
//! and aggregation. A failing stage stops the run, so no partial metrics
//! are ever produced.
//!
//! # Example
//!
//! ```rust,ignore
//! use kpiboard::metrics::pipeline::{analyze_file, ReportOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = analyze_file(Path::new("sales.csv"), &ReportOptions::default())?;
//!     println!("Total sales: {}", report.metrics.total_sales);
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

use super::aggregate::{aggregate, MetricsOptions, DEFAULT_TOP_CUSTOMERS};
use super::normalize::normalize;
use super::period::Granularity;
use crate::api::logs::{log_error, log_info, log_info_indent, log_success};
use crate::error::{PipelineError, PipelineResult};
use crate::models::Metrics;
use crate::parser::{parse_bytes, parse_file, RawTable, DEFAULT_DELIMITER};
use crate::validation::validate;

/// Options for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    /// Bucket size for the sales-over-time series
    pub granularity: Granularity,

    /// Length of the top-customers ranking
    pub top_customers: usize,

    /// Field delimiter; `None` detects it from the header line
    pub delimiter: Option<char>,

    /// Number of raw rows echoed back in the report
    pub preview_rows: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            top_customers: DEFAULT_TOP_CUSTOMERS,
            delimiter: Some(DEFAULT_DELIMITER),
            preview_rows: 10,
        }
    }
}

impl ReportOptions {
    fn metrics_options(&self) -> MetricsOptions {
        MetricsOptions {
            granularity: self.granularity,
            top_customers: self.top_customers,
        }
    }
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
    /// True when Growth Rate came from the file instead of being derived
    pub growth_rate_supplied: bool,
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub metrics: Metrics,
    pub csv_info: CsvInfo,
    /// First rows of the upload, as loaded
    pub preview: Vec<Map<String, Value>>,
}

/// Run the pipeline on a CSV file.
pub fn analyze_file(path: &Path, options: &ReportOptions) -> PipelineResult<Report> {
    log_info(format!("📄 Reading {}", path.display()));
    let table = parse_file(path, options.delimiter)?;
    analyze_table(table, options)
}

/// Run the pipeline on uploaded bytes.
pub fn analyze_bytes(bytes: &[u8], options: &ReportOptions) -> PipelineResult<Report> {
    log_info(format!("📄 Reading upload ({} bytes)", bytes.len()));
    let table = parse_bytes(bytes, options.delimiter)?;
    analyze_table(table, options)
}

/// Run validation, normalization and aggregation on an already parsed table.
pub fn analyze_table(table: RawTable, options: &ReportOptions) -> PipelineResult<Report> {
    log_success(format!("Encoding: {}", table.encoding));
    log_success(format!("Separator: '{}'", format_delimiter(table.delimiter)));
    log_success(format!("Read {} rows", table.row_count()));

    log_info("✔️  Checking required columns...");
    let valid = validate(table).map_err(|e| {
        log_error(e.to_string());
        PipelineError::from(e)
    })?;

    log_info("📅 Normalizing dates and numbers...");
    let dataset = normalize(&valid).map_err(|e| {
        log_error(e.to_string());
        PipelineError::from(e)
    })?;
    if dataset.growth_rate_supplied() {
        log_info_indent("Using supplied Growth Rate column", 1);
    } else {
        log_info_indent("Deriving Growth Rate from Revenue (row order)", 1);
    }

    log_info(format!("📊 Aggregating ({}, top {})...", options.granularity, options.top_customers));
    let metrics = aggregate(&dataset, &options.metrics_options());
    if metrics.retention_rate.is_none() {
        log_info_indent("No records: rate metrics have no data", 1);
    }
    log_success(format!(
        "{} records, {} periods, {} regions",
        metrics.record_count,
        metrics.sales_over_time.points.len(),
        metrics.sales_by_region.len()
    ));

    let table = valid.into_table();
    Ok(Report {
        preview: table.preview(options.preview_rows),
        csv_info: CsvInfo {
            encoding: table.encoding,
            delimiter: table.delimiter,
            row_count: table.rows.len(),
            headers: table.headers,
            growth_rate_supplied: dataset.growth_rate_supplied(),
        },
        metrics,
    })
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
