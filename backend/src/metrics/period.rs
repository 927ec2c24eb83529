//! Calendar bucketing for time-series aggregation.
//!
//! Each granularity truncates a date to the first day of its bucket. The
//! resulting [`PeriodKey`] orders chronologically, so a `BTreeMap` keyed by it
//! yields a sorted series for free.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Size of a time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Granularity {
    Daily,
    /// ISO weeks, Monday to Sunday.
    Weekly,
    #[default]
    Monthly,
}

impl Granularity {
    /// Truncate `date` to the first day of its bucket.
    pub fn truncate(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    /// Bucket key for `date`.
    pub fn key(self, date: NaiveDate) -> PeriodKey {
        PeriodKey {
            granularity: self,
            start: self.truncate(date),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "Daily",
            Granularity::Weekly => "Weekly",
            Granularity::Monthly => "Monthly",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" | "d" => Ok(Granularity::Daily),
            "weekly" | "week" | "w" => Ok(Granularity::Weekly),
            "monthly" | "month" | "m" => Ok(Granularity::Monthly),
            other => Err(format!(
                "unknown granularity '{}' (expected daily, weekly or monthly)",
                other
            )),
        }
    }
}

/// A time bucket: granularity plus the first day it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey {
    pub granularity: Granularity,
    pub start: NaiveDate,
}

impl PeriodKey {
    /// Human label: `2024-01-05`, `2024-W01` or `2024-01`.
    pub fn label(&self) -> String {
        match self.granularity {
            Granularity::Daily => self.start.format("%Y-%m-%d").to_string(),
            Granularity::Weekly => {
                let week = self.start.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Granularity::Monthly => self.start.format("%Y-%m").to_string(),
        }
    }
}
