//! Domain models for the kpiboard metrics pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`RequiredColumn`] - the fixed schema every upload must carry
//! - [`Record`] - one typed row of sales data
//! - [`Dataset`] - all records of one upload, with Growth Rate resolved
//! - [`Metrics`] - the aggregated output handed to the presentation layer

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metrics::growth::pct_change;
use crate::metrics::period::Granularity;

// =============================================================================
// Columns
// =============================================================================

/// The required header line, as shown to users in error messages.
pub const REQUIRED_HEADER_LINE: &str = "Date;Sales;Revenue;Customer_ID;Region;Retention Status";

/// Optional column holding a per-record growth percentage.
pub const GROWTH_RATE_COLUMN: &str = "Growth Rate";

/// Columns an upload must contain. Names match exactly (case-sensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequiredColumn {
    Date,
    Sales,
    Revenue,
    CustomerId,
    Region,
    RetentionStatus,
}

impl RequiredColumn {
    /// All required columns in canonical header order.
    pub const ALL: [RequiredColumn; 6] = [
        RequiredColumn::Date,
        RequiredColumn::Sales,
        RequiredColumn::Revenue,
        RequiredColumn::CustomerId,
        RequiredColumn::Region,
        RequiredColumn::RetentionStatus,
    ];

    /// Header name as it appears in the CSV.
    pub fn header(self) -> &'static str {
        match self {
            RequiredColumn::Date => "Date",
            RequiredColumn::Sales => "Sales",
            RequiredColumn::Revenue => "Revenue",
            RequiredColumn::CustomerId => "Customer_ID",
            RequiredColumn::Region => "Region",
            RequiredColumn::RetentionStatus => "Retention Status",
        }
    }
}

impl std::fmt::Display for RequiredColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

// =============================================================================
// Record / Dataset
// =============================================================================

/// One row of the uploaded dataset.
///
/// Numeric cells are `None` when the upload left them empty (or wrote an
/// NA marker such as `NaN`); missing values never count towards sums.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub date: NaiveDate,
    pub sales: Option<f64>,
    pub revenue: Option<f64>,
    pub customer_id: String,
    pub region: String,
    pub retention_status: String,
    /// Supplied by the upload, or derived when the dataset is built.
    pub growth_rate: Option<f64>,
}

impl Record {
    /// Whether the Retention Status reads "yes", ignoring case.
    pub fn is_retained(&self) -> bool {
        self.retention_status.trim().eq_ignore_ascii_case("yes")
    }
}

/// All records of one upload, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    growth_rate_supplied: bool,
}

impl Dataset {
    /// Build a dataset from records whose Growth Rate came from the upload.
    pub fn with_supplied_growth(records: Vec<Record>) -> Self {
        Self {
            records,
            growth_rate_supplied: true,
        }
    }

    /// Build a dataset and fill Growth Rate as the row-order percentage
    /// change of Revenue. The first record has no growth value.
    pub fn with_derived_growth(mut records: Vec<Record>) -> Self {
        let revenue: Vec<Option<f64>> = records.iter().map(|r| r.revenue).collect();
        for (record, growth) in records.iter_mut().zip(pct_change(&revenue)) {
            record.growth_rate = growth;
        }
        Self {
            records,
            growth_rate_supplied: false,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when Growth Rate was read from the upload rather than derived.
    pub fn growth_rate_supplied(&self) -> bool {
        self.growth_rate_supplied
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Sales summed over one time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSales {
    /// Display label (`2024-01-05`, `2024-W01`, `2024-01`).
    pub period: String,
    /// First calendar day of the bucket.
    pub start: NaiveDate,
    pub sales: f64,
}

/// Chronological sales series for one granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSeries {
    pub granularity: Granularity,
    pub points: Vec<PeriodSales>,
}

impl SalesSeries {
    /// Sum of every point in the series.
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.sales).sum()
    }
}

/// Revenue summed for one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRevenue {
    pub customer_id: String,
    pub revenue: f64,
}

/// Everything the presentation layer needs to draw the dashboard.
///
/// `retention_rate` and `average_growth_rate` are `None` when there is no
/// data to divide by; they serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub record_count: usize,
    pub total_sales: f64,
    pub total_revenue: f64,
    pub retention_rate: Option<f64>,
    pub sales_over_time: SalesSeries,
    pub sales_by_region: BTreeMap<String, f64>,
    pub average_growth_rate: Option<f64>,
    pub top_customers_by_revenue: Vec<CustomerRevenue>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(revenue: Option<f64>) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            sales: Some(1.0),
            revenue,
            customer_id: "C1".into(),
            region: "North".into(),
            retention_status: "No".into(),
            growth_rate: None,
        }
    }

    #[test]
    fn test_header_line_matches_column_order() {
        let joined: Vec<&str> = RequiredColumn::ALL.iter().map(|c| c.header()).collect();
        assert_eq!(joined.join(";"), REQUIRED_HEADER_LINE);
    }

    #[test]
    fn test_is_retained_ignores_case_and_padding() {
        let mut r = record(None);
        for status in ["yes", "YES", "Yes", " yEs "] {
            r.retention_status = status.into();
            assert!(r.is_retained(), "{status:?} should count as retained");
        }
        for status in ["no", "y", "yes please", ""] {
            r.retention_status = status.into();
            assert!(!r.is_retained(), "{status:?} should not count as retained");
        }
    }

    #[test]
    fn test_derived_growth_follows_row_order() {
        let ds = Dataset::with_derived_growth(vec![
            record(Some(100.0)),
            record(Some(150.0)),
            record(Some(75.0)),
        ]);
        let growth: Vec<Option<f64>> = ds.records().iter().map(|r| r.growth_rate).collect();
        assert_eq!(growth, vec![None, Some(50.0), Some(-50.0)]);
        assert!(!ds.growth_rate_supplied());
    }

    #[test]
    fn test_supplied_growth_kept_as_is() {
        let mut r = record(Some(10.0));
        r.growth_rate = Some(12.5);
        let ds = Dataset::with_supplied_growth(vec![r]);
        assert_eq!(ds.records()[0].growth_rate, Some(12.5));
        assert!(ds.growth_rate_supplied());
    }

    #[test]
    fn test_metrics_serialize_camel_case() {
        let metrics = Metrics {
            record_count: 0,
            total_sales: 0.0,
            total_revenue: 0.0,
            retention_rate: None,
            sales_over_time: SalesSeries {
                granularity: Granularity::Monthly,
                points: vec![],
            },
            sales_by_region: BTreeMap::new(),
            average_growth_rate: None,
            top_customers_by_revenue: vec![],
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json["retentionRate"].is_null());
        assert_eq!(json["salesOverTime"]["granularity"], "Monthly");
        assert!(json.get("topCustomersByRevenue").is_some());
    }
}
