//! Schema check for uploaded sales tables.
//!
//! An upload is accepted only when every [`RequiredColumn`] header is present,
//! matched exactly and case-sensitively. Extra columns are ignored; the
//! optional `Growth Rate` column is located when present.
//!
//! # Example
//!
//! ```rust,ignore
//! use kpiboard::{parser::parse_str, validation::validate};
//!
//! let table = parse_str("Date;Sales\n2024-01-01;3", ';', "utf-8")?;
//! let err = validate(table).unwrap_err();
//! // MissingColumns { missing: ["Revenue", "Customer_ID", "Region", "Retention Status"] }
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::models::{RequiredColumn, GROWTH_RATE_COLUMN};
use crate::parser::RawTable;

/// Header positions of every column the pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub date: usize,
    pub sales: usize,
    pub revenue: usize,
    pub customer_id: usize,
    pub region: usize,
    pub retention_status: usize,
    pub growth_rate: Option<usize>,
}

/// A raw table that passed the schema check.
#[derive(Debug, Clone)]
pub struct ValidTable {
    table: RawTable,
    columns: ColumnIndex,
}

impl ValidTable {
    pub fn table(&self) -> &RawTable {
        &self.table
    }

    pub fn columns(&self) -> ColumnIndex {
        self.columns
    }

    pub fn into_table(self) -> RawTable {
        self.table
    }
}

/// Required columns absent from `headers`, in canonical order.
pub fn missing_columns(headers: &[String]) -> Vec<RequiredColumn> {
    RequiredColumn::ALL
        .into_iter()
        .filter(|col| !headers.iter().any(|h| h == col.header()))
        .collect()
}

/// Quick check: does `headers` carry every required column?
pub fn is_valid(headers: &[String]) -> bool {
    missing_columns(headers).is_empty()
}

/// Check the table's headers against the required schema.
///
/// # Returns
/// * `Ok(ValidTable)` with resolved column positions
/// * `Err(ValidationError::MissingColumns)` listing every absent column
pub fn validate(table: RawTable) -> ValidationResult<ValidTable> {
    let missing = missing_columns(&table.headers);
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns {
            missing: missing.iter().map(|c| c.header().to_string()).collect(),
        });
    }

    let position = |col: RequiredColumn| table.column_index(col.header()).unwrap_or_default();
    let columns = ColumnIndex {
        date: position(RequiredColumn::Date),
        sales: position(RequiredColumn::Sales),
        revenue: position(RequiredColumn::Revenue),
        customer_id: position(RequiredColumn::CustomerId),
        region: position(RequiredColumn::Region),
        retention_status: position(RequiredColumn::RetentionStatus),
        growth_rate: table.column_index(GROWTH_RATE_COLUMN),
    };

    Ok(ValidTable { table, columns })
}
