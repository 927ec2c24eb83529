//! Pure reductions from a [`Dataset`] to [`Metrics`].
//!
//! ```text
//! Dataset (rows)                    Metrics
//! ┌──────────────────────────┐      ┌──────────────────────────────┐
//! │ 2024-01-01 North A  10   │      │ totals, retention, growth    │
//! │ 2024-01-02 South B   5   │  →   │ sales over time (bucketed)   │
//! │ 2024-01-09 North A   7   │      │ sales by region              │
//! └──────────────────────────┘      │ top customers by revenue     │
//!                                   └──────────────────────────────┘
//! ```
//!
//! Nothing here fails. An empty dataset gives zero totals, empty series and
//! `None` for the rate metrics.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::growth::mean;
use super::period::{Granularity, PeriodKey};
use crate::models::{CustomerRevenue, Dataset, Metrics, PeriodSales, SalesSeries};

/// Number of customers listed when nothing else is configured.
pub const DEFAULT_TOP_CUSTOMERS: usize = 5;

/// Knobs for [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsOptions {
    /// Bucket size for the sales-over-time series
    pub granularity: Granularity,
    /// How many customers to keep in the revenue ranking
    pub top_customers: usize,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            top_customers: DEFAULT_TOP_CUSTOMERS,
        }
    }
}

/// Compute every metric for `dataset`.
pub fn aggregate(dataset: &Dataset, options: &MetricsOptions) -> Metrics {
    Metrics {
        record_count: dataset.len(),
        total_sales: total_sales(dataset),
        total_revenue: total_revenue(dataset),
        retention_rate: retention_rate(dataset),
        sales_over_time: sales_over_time(dataset, options.granularity),
        sales_by_region: sales_by_region(dataset),
        average_growth_rate: average_growth_rate(dataset),
        top_customers_by_revenue: top_customers_by_revenue(dataset, options.top_customers),
    }
}

pub fn total_sales(dataset: &Dataset) -> f64 {
    dataset.records().iter().filter_map(|r| r.sales).sum()
}

pub fn total_revenue(dataset: &Dataset) -> f64 {
    dataset.records().iter().filter_map(|r| r.revenue).sum()
}

/// Share of records marked retained, as a percentage.
///
/// `None` for an empty dataset.
pub fn retention_rate(dataset: &Dataset) -> Option<f64> {
    if dataset.is_empty() {
        return None;
    }
    let retained = dataset.records().iter().filter(|r| r.is_retained()).count();
    Some(retained as f64 / dataset.len() as f64 * 100.0)
}

/// Sales summed per time bucket, oldest first.
pub fn sales_over_time(dataset: &Dataset, granularity: Granularity) -> SalesSeries {
    let mut buckets: BTreeMap<PeriodKey, f64> = BTreeMap::new();
    for record in dataset.records() {
        *buckets.entry(granularity.key(record.date)).or_insert(0.0) += record.sales.unwrap_or(0.0);
    }

    SalesSeries {
        granularity,
        points: buckets
            .into_iter()
            .map(|(key, sales)| PeriodSales {
                period: key.label(),
                start: key.start,
                sales,
            })
            .collect(),
    }
}

/// Sales summed per region, one entry per distinct region name.
pub fn sales_by_region(dataset: &Dataset) -> BTreeMap<String, f64> {
    let mut regions: BTreeMap<String, f64> = BTreeMap::new();
    for record in dataset.records() {
        *regions.entry(record.region.clone()).or_insert(0.0) += record.sales.unwrap_or(0.0);
    }
    regions
}

/// Mean of every defined Growth Rate; `None` when there is none.
pub fn average_growth_rate(dataset: &Dataset) -> Option<f64> {
    mean(dataset.records().iter().filter_map(|r| r.growth_rate))
}

/// The `n` customers with the highest summed revenue, highest first.
///
/// Equal revenues keep the order in which the customers first appear.
pub fn top_customers_by_revenue(dataset: &Dataset, n: usize) -> Vec<CustomerRevenue> {
    let mut order: Vec<CustomerRevenue> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in dataset.records() {
        let slot = *index.entry(record.customer_id.as_str()).or_insert_with(|| {
            order.push(CustomerRevenue {
                customer_id: record.customer_id.clone(),
                revenue: 0.0,
            });
            order.len() - 1
        });
        order[slot].revenue += record.revenue.unwrap_or(0.0);
    }

    // stable: ties stay in first-seen order
    order.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    order.truncate(n);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use chrono::NaiveDate;

    fn rec(date: &str, sales: f64, revenue: f64, customer: &str, region: &str, status: &str) -> Record {
        Record {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            sales: Some(sales),
            revenue: Some(revenue),
            customer_id: customer.into(),
            region: region.into(),
            retention_status: status.into(),
            growth_rate: None,
        }
    }

    fn sample() -> Dataset {
        Dataset::with_derived_growth(vec![
            rec("2024-01-01", 10.0, 100.0, "A", "North", "Yes"),
            rec("2024-01-02", 5.0, 50.0, "B", "South", "No"),
        ])
    }

    fn larger() -> Dataset {
        Dataset::with_derived_growth(vec![
            rec("2024-01-01", 3.0, 30.0, "C1", "North", "yes"),
            rec("2024-01-01", 4.0, 80.0, "C2", "South", "YES"),
            rec("2024-01-06", 1.0, 10.0, "C3", "East", "no"),
            rec("2024-01-08", 7.0, 70.0, "C1", "North", "Yes"),
            rec("2024-02-03", 2.0, 20.0, "C4", "West", "No"),
            rec("2024-02-29", 6.0, 60.0, "C5", "South", "maybe"),
            rec("2024-03-01", 9.0, 90.0, "C6", "North", "yes"),
            rec("2024-03-15", 8.0, 15.0, "C7", "East", "No"),
        ])
    }

    #[test]
    fn test_two_row_example() {
        let metrics = aggregate(&sample(), &MetricsOptions::default());

        assert_eq!(metrics.total_sales, 15.0);
        assert_eq!(metrics.total_revenue, 150.0);
        assert_eq!(metrics.retention_rate, Some(50.0));
        assert_eq!(metrics.sales_by_region.get("North"), Some(&10.0));
        assert_eq!(metrics.sales_by_region.get("South"), Some(&5.0));
        assert_eq!(metrics.sales_by_region.len(), 2);
        assert_eq!(
            metrics.top_customers_by_revenue,
            vec![
                CustomerRevenue { customer_id: "A".into(), revenue: 100.0 },
                CustomerRevenue { customer_id: "B".into(), revenue: 50.0 },
            ]
        );
        // one defined growth value: (50 - 100) / 100
        assert_eq!(metrics.average_growth_rate, Some(-50.0));
    }

    #[test]
    fn test_empty_dataset_is_no_data() {
        let metrics = aggregate(&Dataset::with_derived_growth(vec![]), &MetricsOptions::default());

        assert_eq!(metrics.record_count, 0);
        assert_eq!(metrics.total_sales, 0.0);
        assert_eq!(metrics.total_revenue, 0.0);
        assert_eq!(metrics.retention_rate, None);
        assert_eq!(metrics.average_growth_rate, None);
        assert!(metrics.sales_over_time.points.is_empty());
        assert!(metrics.sales_by_region.is_empty());
        assert!(metrics.top_customers_by_revenue.is_empty());
    }

    #[test]
    fn test_totals_match_reference_sums() {
        let ds = larger();
        let sales: f64 = ds.records().iter().map(|r| r.sales.unwrap()).sum();
        let revenue: f64 = ds.records().iter().map(|r| r.revenue.unwrap()).sum();
        assert_eq!(total_sales(&ds), sales);
        assert_eq!(total_revenue(&ds), revenue);
    }

    #[test]
    fn test_missing_values_skipped_in_sums() {
        let mut r = rec("2024-01-01", 0.0, 0.0, "A", "North", "Yes");
        r.sales = None;
        r.revenue = None;
        let ds = Dataset::with_derived_growth(vec![r, rec("2024-01-02", 2.0, 3.0, "B", "North", "No")]);

        assert_eq!(total_sales(&ds), 2.0);
        assert_eq!(total_revenue(&ds), 3.0);
        assert_eq!(sales_by_region(&ds).get("North"), Some(&2.0));
    }

    #[test]
    fn test_retention_is_case_insensitive() {
        let ds = larger();
        // yes, YES, Yes, yes out of 8
        assert_eq!(retention_rate(&ds), Some(50.0));
    }

    #[test]
    fn test_daily_series_partitions_total() {
        let ds = larger();
        let series = sales_over_time(&ds, Granularity::Daily);
        assert_eq!(series.total(), total_sales(&ds));
        assert_eq!(series.points.len(), 7);
        assert_eq!(series.points[0].period, "2024-01-01");
        assert_eq!(series.points[0].sales, 7.0);
    }

    #[test]
    fn test_weekly_series() {
        let series = sales_over_time(&larger(), Granularity::Weekly);
        let labels: Vec<&str> = series.points.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(labels, vec!["2024-W01", "2024-W02", "2024-W05", "2024-W09", "2024-W11"]);
        // 2024-01-01 (x2) and 2024-01-06 fall in W01
        assert_eq!(series.points[0].sales, 8.0);
        assert_eq!(series.total(), 40.0);
    }

    #[test]
    fn test_monthly_series_is_chronological() {
        let ds = Dataset::with_derived_growth(vec![
            rec("2024-03-01", 1.0, 1.0, "A", "N", "No"),
            rec("2023-12-31", 2.0, 1.0, "A", "N", "No"),
            rec("2024-03-20", 3.0, 1.0, "A", "N", "No"),
        ]);
        let series = sales_over_time(&ds, Granularity::Monthly);
        let points: Vec<(&str, f64)> = series.points.iter().map(|p| (p.period.as_str(), p.sales)).collect();
        assert_eq!(points, vec![("2023-12", 2.0), ("2024-03", 4.0)]);
        assert_eq!(series.granularity, Granularity::Monthly);
    }

    #[test]
    fn test_region_grouping_is_exact_match() {
        let ds = Dataset::with_derived_growth(vec![
            rec("2024-01-01", 1.0, 1.0, "A", "North", "No"),
            rec("2024-01-01", 2.0, 1.0, "A", "north", "No"),
            rec("2024-01-01", 3.0, 1.0, "A", "North", "No"),
        ]);
        let regions = sales_by_region(&ds);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions["North"], 4.0);
        assert_eq!(regions["north"], 2.0);
    }

    #[test]
    fn test_top_customers_sorted_and_bounded() {
        let ds = larger();
        let top = top_customers_by_revenue(&ds, 5);

        assert_eq!(top.len(), 5);
        assert!(top.windows(2).all(|w| w[0].revenue >= w[1].revenue));
        assert_eq!(top[0].customer_id, "C1");
        assert_eq!(top[0].revenue, 100.0);
        assert_eq!(top[1].customer_id, "C6");
    }

    #[test]
    fn test_top_customers_fewer_than_n() {
        let top = top_customers_by_revenue(&sample(), 5);
        assert_eq!(top.len(), 2);
        assert!(top_customers_by_revenue(&sample(), 0).is_empty());
    }

    #[test]
    fn test_top_customers_ties_keep_first_seen() {
        let ds = Dataset::with_derived_growth(vec![
            rec("2024-01-01", 1.0, 40.0, "Z", "N", "No"),
            rec("2024-01-01", 1.0, 10.0, "M", "N", "No"),
            rec("2024-01-01", 1.0, 40.0, "A", "N", "No"),
            rec("2024-01-01", 1.0, 30.0, "M", "N", "No"),
        ]);
        let ids: Vec<String> = top_customers_by_revenue(&ds, 3)
            .into_iter()
            .map(|c| c.customer_id)
            .collect();
        assert_eq!(ids, vec!["Z", "M", "A"]);
    }

    #[test]
    fn test_average_growth_excludes_first_row() {
        let ds = Dataset::with_derived_growth(vec![
            rec("2024-01-01", 1.0, 100.0, "A", "N", "No"),
            rec("2024-01-02", 1.0, 200.0, "A", "N", "No"),
            rec("2024-01-03", 1.0, 100.0, "A", "N", "No"),
        ]);
        // (100% + -50%) / 2, the undefined first value is not a zero
        assert_eq!(average_growth_rate(&ds), Some(25.0));
    }

    #[test]
    fn test_growth_follows_row_order_not_dates() {
        let ds = Dataset::with_derived_growth(vec![
            rec("2024-01-03", 1.0, 200.0, "A", "N", "No"),
            rec("2024-01-01", 1.0, 100.0, "A", "N", "No"),
        ]);
        assert_eq!(average_growth_rate(&ds), Some(-50.0));
    }

    #[test]
    fn test_single_row_has_no_growth() {
        let ds = Dataset::with_derived_growth(vec![rec("2024-01-01", 1.0, 100.0, "A", "N", "Yes")]);
        assert_eq!(average_growth_rate(&ds), None);
        assert_eq!(retention_rate(&ds), Some(100.0));
    }
}
