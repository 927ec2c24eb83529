//! Metrics module.
//!
//! This module turns a validated upload into dashboard metrics:
//! - Normalize: typed records from raw cells
//! - Period: day / ISO week / month bucketing
//! - Growth: row-order percentage change
//! - Aggregate: totals, rates, series and rankings
//! - Pipeline: end-to-end entry points
//! - Format: terminal rendering of values

pub mod aggregate;
pub mod format;
pub mod growth;
pub mod normalize;
pub mod period;
pub mod pipeline;

pub use aggregate::{aggregate, MetricsOptions};
pub use normalize::normalize;
pub use period::{Granularity, PeriodKey};
pub use pipeline::*;
