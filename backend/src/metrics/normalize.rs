//! Typed conversion of a validated table into a [`Dataset`].
//!
//! Dates become naive calendar dates (no timezone handling). Sales, Revenue
//! and Growth Rate become `f64`, with empty and NA-marker cells read as
//! missing. The first bad cell rejects the whole upload.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{NumberError, ValidationError, ValidationResult};
use crate::models::{Dataset, Record, RequiredColumn, GROWTH_RATE_COLUMN};
use crate::parser::RawRow;
use crate::validation::ValidTable;

/// Tried in order: year-first, then month-first, then day-first. A day-first
/// form only matches when the leading field cannot be a month.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%m.%d.%Y",
    "%m-%d-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Cell spellings treated as a missing number.
const NA_VALUES: &[&str] = &[
    "na", "n/a", "nan", "-nan", "null", "none", "#n/a", "<na>",
];

/// Parse a calendar date, truncating datetime values to their date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Parse a numeric cell. `Ok(None)` means the value is missing.
///
/// Infinite values are rejected so totals always stay finite.
pub fn parse_number(value: &str) -> Result<Option<f64>, NumberError> {
    let value = value.trim();
    if value.is_empty() || NA_VALUES.contains(&value.to_lowercase().as_str()) {
        return Ok(None);
    }
    let n: f64 = value.parse()?;
    if n.is_nan() {
        Ok(None)
    } else if n.is_infinite() {
        Err(NumberError::NotFinite)
    } else {
        Ok(Some(n))
    }
}

/// Convert every row of `valid` into a [`Record`].
///
/// Growth Rate is taken from the upload when the column exists, otherwise it
/// is derived from Revenue in row order.
pub fn normalize(valid: &ValidTable) -> ValidationResult<Dataset> {
    let cols = valid.columns();
    let rows = &valid.table().rows;
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let date_cell = &row.cells[cols.date];
        let date = parse_date(date_cell).ok_or_else(|| ValidationError::DateParse {
            row: index,
            line: row.line,
            value: date_cell.clone(),
        })?;

        let growth_rate = match cols.growth_rate {
            Some(idx) => number_cell(row, index, idx, GROWTH_RATE_COLUMN)?,
            None => None,
        };

        records.push(Record {
            date,
            sales: number_cell(row, index, cols.sales, RequiredColumn::Sales.header())?,
            revenue: number_cell(row, index, cols.revenue, RequiredColumn::Revenue.header())?,
            customer_id: row.cells[cols.customer_id].clone(),
            region: row.cells[cols.region].clone(),
            retention_status: row.cells[cols.retention_status].clone(),
            growth_rate,
        });
    }

    Ok(if cols.growth_rate.is_some() {
        Dataset::with_supplied_growth(records)
    } else {
        Dataset::with_derived_growth(records)
    })
}

fn number_cell(row: &RawRow, index: usize, column: usize, name: &str) -> ValidationResult<Option<f64>> {
    let cell = &row.cells[column];
    parse_number(cell).map_err(|_| ValidationError::InvalidNumber {
        row: index,
        line: row.line,
        column: name.to_string(),
        value: cell.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use crate::validation::validate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn normalize_csv(csv: &str) -> ValidationResult<Dataset> {
        let valid = validate(parse_str(csv, ';', "utf-8").unwrap())?;
        normalize(&valid)
    }

    const HEADER: &str = "Date;Sales;Revenue;Customer_ID;Region;Retention Status";

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-05"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date("2024/01/05"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date("01/05/2024"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date("20240105"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date("01-05-2024"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05 13:45:00"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05T13:45:00.250"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05T23:30:00+05:00"), Some(date(2024, 1, 5)));
    }

    #[test]
    fn test_parse_date_is_month_first() {
        assert_eq!(parse_date("05.01.2024"), Some(date(2024, 5, 1)));
        assert_eq!(parse_date("05/01/2024"), Some(date(2024, 5, 1)));
        assert_eq!(parse_date("12.11.2024"), Some(date(2024, 12, 11)));
    }

    #[test]
    fn test_parse_date_falls_back_to_day_first() {
        assert_eq!(parse_date("31/01/2024"), Some(date(2024, 1, 31)));
        assert_eq!(parse_date("31.01.2024"), Some(date(2024, 1, 31)));
        assert_eq!(parse_date("13-02-2024"), Some(date(2024, 2, 13)));
        assert_eq!(parse_date("25/12/2023 08:00:00"), Some(date(2023, 12, 25)));
        assert_eq!(parse_date("13/13/2024"), None);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date("2023-02-29"), None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("12.5"), Ok(Some(12.5)));
        assert_eq!(parse_number(" -3 "), Ok(Some(-3.0)));
        assert_eq!(parse_number(""), Ok(None));
        assert_eq!(parse_number("NaN"), Ok(None));
        assert_eq!(parse_number("N/A"), Ok(None));
        assert!(matches!(parse_number("ten"), Err(NumberError::Parse(_))));
    }

    #[test]
    fn test_parse_number_rejects_infinity() {
        for cell in ["inf", "-inf", "Infinity", "1e400"] {
            assert_eq!(parse_number(cell), Err(NumberError::NotFinite), "{cell:?}");
        }
    }

    #[test]
    fn test_infinite_sales_rejected_as_invalid_number() {
        let csv = format!("{HEADER}\n2024-01-01;inf;1;A;North;Yes");
        match normalize_csv(&csv).unwrap_err() {
            ValidationError::InvalidNumber { column, value, line, .. } => {
                assert_eq!(column, "Sales");
                assert_eq!(value, "inf");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_normalize_rows() {
        let csv = format!("{HEADER}\n2024-01-01;10;100;A;North;Yes\n2024-01-02;;50;B;South;No");
        let ds = normalize_csv(&csv).unwrap();

        assert_eq!(ds.len(), 2);
        let first = &ds.records()[0];
        assert_eq!(first.date, date(2024, 1, 1));
        assert_eq!(first.sales, Some(10.0));
        assert_eq!(first.customer_id, "A");
        assert_eq!(ds.records()[1].sales, None);
        assert_eq!(ds.records()[1].growth_rate, Some(-50.0));
    }

    #[test]
    fn test_bad_date_rejects_whole_dataset() {
        let csv = format!(
            "{HEADER}\n2024-01-01;1;1;A;North;Yes\nnot-a-date;1;1;B;North;Yes\n2024-01-03;1;1;C;North;Yes"
        );
        let err = normalize_csv(&csv).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DateParse {
                row: 1,
                line: 3,
                value: "not-a-date".into(),
            }
        );
    }

    #[test]
    fn test_bad_number_rejected_with_column() {
        let csv = format!("{HEADER}\n2024-01-01;1;lots;A;North;Yes");
        match normalize_csv(&csv).unwrap_err() {
            ValidationError::InvalidNumber { row, column, value, .. } => {
                assert_eq!(row, 0);
                assert_eq!(column, "Revenue");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_supplied_growth_rate_used() {
        let csv = format!(
            "{HEADER};Growth Rate\n2024-01-01;1;100;A;North;Yes;4\n2024-01-02;1;300;B;North;Yes;"
        );
        let ds = normalize_csv(&csv).unwrap();
        assert!(ds.growth_rate_supplied());
        assert_eq!(ds.records()[0].growth_rate, Some(4.0));
        assert_eq!(ds.records()[1].growth_rate, None);
    }

    #[test]
    fn test_empty_table_normalizes() {
        let ds = normalize_csv(&format!("{HEADER}\n")).unwrap();
        assert!(ds.is_empty());
    }
}
