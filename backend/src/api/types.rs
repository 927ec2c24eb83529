//! REST API types for dashboard frontends.
//!
//! A successful upload returns the full metrics report; a rejected one
//! returns the same envelope with `status: "error"` and a tagged `error`
//! object, never partial metrics.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::{CsvError, PipelineError, ServerError};
use crate::metrics::pipeline::{format_delimiter, Report};
use crate::models::Metrics;

/// Response sent to the frontend after a successful upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    /// Unique identifier of this run
    pub report_id: String,

    /// Always "ready"
    pub status: String,

    pub metrics: Metrics,

    pub csv_info: CsvMetadata,

    /// First rows of the upload, as loaded
    pub preview: Vec<Map<String, Value>>,
}

/// CSV file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub growth_rate_supplied: bool,
}

impl From<Report> for ReportResponse {
    fn from(report: Report) -> Self {
        ReportResponse {
            report_id: Uuid::new_v4().to_string(),
            status: "ready".to_string(),
            metrics: report.metrics,
            csv_info: CsvMetadata {
                encoding: report.csv_info.encoding,
                delimiter: format_delimiter(report.csv_info.delimiter),
                row_count: report.csv_info.row_count,
                columns: report.csv_info.headers,
                growth_rate_supplied: report.csv_info.growth_rate_supplied,
            },
            preview: report.preview,
        }
    }
}

/// Tagged description of a failure, for the `error` field of the envelope.
pub fn error_detail(err: &ServerError) -> Value {
    match err {
        ServerError::Pipeline(PipelineError::Validation(v)) => {
            serde_json::to_value(v).unwrap_or_else(|_| json!({ "kind": "validation" }))
        }
        ServerError::Pipeline(PipelineError::Csv(CsvError::EmptyFile)) => json!({ "kind": "empty_file" }),
        ServerError::Pipeline(PipelineError::Csv(CsvError::Parse { line, .. })) => {
            json!({ "kind": "csv_parse", "line": line })
        }
        ServerError::Pipeline(PipelineError::Csv(_)) => json!({ "kind": "csv" }),
        ServerError::BadRequest(_) => json!({ "kind": "bad_request" }),
    }
}

/// Create an error response
pub fn error_response(err: &ServerError) -> Value {
    json!({
        "reportId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error_detail(err),
        "message": err.to_string(),
    })
}
