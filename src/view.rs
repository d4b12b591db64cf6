//! The aggregation pipeline that turns records into everything the dashboard displays.
//!
//! `compute_view` is a pure function of its input. It is called on the full set of records after
//! every interaction; there is no incremental path.

use crate::error::Res;
use crate::model::{Amount, Record};
use crate::store::Records;
use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{error, trace};

/// Displayed in place of a margin when there are no sales to divide by.
const ZERO_MARGIN: &str = "0%";

/// Everything the dashboard needs for one render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardView {
    /// The four formatted summary cards.
    pub summary: Summary,
    /// The unformatted values behind `summary`.
    pub totals: Totals,
    /// Sales, expenses and profit per calendar month, oldest first. Months without records are
    /// absent rather than zero.
    pub monthly: Vec<MonthlyPoint>,
    /// Sales per product, in the order products were first seen.
    pub product_sales: Vec<CategoryTotal>,
    /// Sales per region, in the order regions were first seen. These are raw sums; turning them
    /// into shares is left to the chart.
    pub region_sales: Vec<CategoryTotal>,
    /// Profit per product, in the order products were first seen.
    pub product_profit: Vec<CategoryTotal>,
    /// Every record, in storage order, with its profit.
    pub rows: Vec<TableRow>,
    /// How many stored rows could not be read and were left out.
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_sales: String,
    pub total_expenses: String,
    pub net_profit: String,
    pub profit_margin: String,
}

impl Default for Summary {
    fn default() -> Self {
        let zero = Amount::new(Decimal::ZERO).to_string();
        Self {
            total_sales: zero.clone(),
            total_expenses: zero.clone(),
            net_profit: zero,
            profit_margin: ZERO_MARGIN.to_string(),
        }
    }
}

impl Summary {
    fn new(totals: &Totals) -> Res<Self> {
        Ok(Self {
            total_sales: Amount::new(totals.sales).to_string(),
            total_expenses: Amount::new(totals.expenses).to_string(),
            net_profit: Amount::new(totals.profit).to_string(),
            profit_margin: format_margin(totals.profit, totals.sales)?,
        })
    }
}

/// Sums of sales, expenses and profit over some set of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(with = "rust_decimal::serde::float")]
    pub sales: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub expenses: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
}

impl Totals {
    fn add(&mut self, sales: Decimal, expenses: Decimal, profit: Decimal) -> Res<()> {
        self.sales = self.sales.checked_add(sales).context("Sales overflowed")?;
        self.expenses = self
            .expenses
            .checked_add(expenses)
            .context("Expenses overflowed")?;
        self.profit = self.profit.checked_add(profit).context("Profit overflowed")?;
        Ok(())
    }
}

/// One point of the monthly time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// The first day of the month.
    pub month: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub sales: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub expenses: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
}

/// The sum of some value for one group key (a product or a region).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

/// A record as shown in the dashboard's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub sales: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub expenses: Decimal,
    pub region: String,
    pub product: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
}

impl DashboardView {
    /// The view shown when there is nothing to show: zero totals, a `0%` margin and no series.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when there are no rows to display.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Computes the dashboard from `records`.
///
/// This never fails. If something goes wrong while aggregating, such as a sum overflowing, the
/// problem is logged and the empty view is returned for this render only.
pub fn compute_view(records: &[Record]) -> DashboardView {
    if records.is_empty() {
        return DashboardView::empty();
    }
    match aggregate(records) {
        Ok(view) => view,
        Err(e) => {
            error!(
                "Unable to aggregate {} records, showing an empty dashboard: {e:#}",
                records.len()
            );
            DashboardView::empty()
        }
    }
}

/// Computes the dashboard from the result of `Store::read_all`, carrying over the number of rows
/// that could not be read.
pub fn view_of(records: &Records) -> DashboardView {
    let mut view = compute_view(records.records());
    view.dropped_rows = records.dropped();
    view
}

fn aggregate(records: &[Record]) -> Res<DashboardView> {
    let mut totals = Totals::default();
    let mut monthly: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
    let mut product_sales = Groups::default();
    let mut region_sales = Groups::default();
    let mut product_profit = Groups::default();
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let profit = record
            .profit()
            .with_context(|| format!("Profit overflowed for {record:?}"))?;
        let (sales, expenses) = (record.sales(), record.expenses());

        totals.add(sales, expenses, profit)?;
        monthly
            .entry(month_of(record.date()))
            .or_default()
            .add(sales, expenses, profit)?;
        product_sales.add(record.product(), sales)?;
        region_sales.add(record.region(), sales)?;
        product_profit.add(record.product(), profit)?;

        rows.push(TableRow {
            date: record.date(),
            sales,
            expenses,
            region: record.region().to_string(),
            product: record.product().to_string(),
            profit,
        });
    }

    trace!(
        "Aggregated {} records into {} months",
        records.len(),
        monthly.len()
    );

    Ok(DashboardView {
        summary: Summary::new(&totals)?,
        totals,
        monthly: monthly
            .into_iter()
            .map(|(month, t)| MonthlyPoint {
                month,
                sales: t.sales,
                expenses: t.expenses,
                profit: t.profit,
            })
            .collect(),
        product_sales: product_sales.into_totals(),
        region_sales: region_sales.into_totals(),
        product_profit: product_profit.into_totals(),
        rows,
        dropped_rows: 0,
    })
}

fn month_of(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `profit / sales` as a percentage with one decimal place, e.g. `66.7%`. When there are no sales
/// the margin is `0%`.
fn format_margin(profit: Decimal, sales: Decimal) -> Res<String> {
    if sales <= Decimal::ZERO {
        return Ok(ZERO_MARGIN.to_string());
    }
    let mut pct = profit
        .checked_div(sales)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .context("Profit margin overflowed")?
        .round_dp(1);
    pct.rescale(1);
    Ok(format!("{pct}%"))
}

/// Sums values by a string key, remembering the order keys were first seen in.
#[derive(Debug, Default)]
struct Groups {
    index: HashMap<String, usize>,
    totals: Vec<CategoryTotal>,
}

impl Groups {
    fn add(&mut self, key: &str, value: Decimal) -> Res<()> {
        let ix = match self.index.get(key) {
            Some(&ix) => ix,
            None => {
                self.totals.push(CategoryTotal {
                    name: key.to_string(),
                    value: Decimal::ZERO,
                });
                self.index.insert(key.to_string(), self.totals.len() - 1);
                self.totals.len() - 1
            }
        };
        let total = &mut self.totals[ix].value;
        *total = total
            .checked_add(value)
            .with_context(|| format!("The total for '{key}' overflowed"))?;
        Ok(())
    }

    fn into_totals(self) -> Vec<CategoryTotal> {
        self.totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(d: &str, sales: &str, expenses: &str, region: &str, product: &str) -> Record {
        Record::new(date(d), dec(sales), dec(expenses), region, product)
    }

    fn total(name: &str, value: &str) -> CategoryTotal {
        CategoryTotal {
            name: name.to_string(),
            value: dec(value),
        }
    }

    fn example() -> Vec<Record> {
        vec![
            record("2023-01-05", "1000", "400", "North", "Electronics"),
            record("2023-01-20", "500", "100", "South", "Apparel"),
        ]
    }

    #[test]
    fn test_worked_example() {
        let view = compute_view(&example());
        assert_eq!(view.summary.total_sales, "$1,500.00");
        assert_eq!(view.summary.total_expenses, "$500.00");
        assert_eq!(view.summary.net_profit, "$1,000.00");
        assert_eq!(view.summary.profit_margin, "66.7%");
        assert_eq!(
            view.monthly,
            vec![MonthlyPoint {
                month: date("2023-01-01"),
                sales: dec("1500"),
                expenses: dec("500"),
                profit: dec("1000"),
            }]
        );
        assert_eq!(
            view.product_sales,
            vec![total("Electronics", "1000"), total("Apparel", "500")]
        );
        assert_eq!(
            view.region_sales,
            vec![total("North", "1000"), total("South", "500")]
        );
        assert_eq!(
            view.product_profit,
            vec![total("Electronics", "600"), total("Apparel", "400")]
        );
    }

    #[test]
    fn test_empty_input() {
        let view = compute_view(&[]);
        assert_eq!(view.summary.total_sales, "$0.00");
        assert_eq!(view.summary.total_expenses, "$0.00");
        assert_eq!(view.summary.net_profit, "$0.00");
        assert_eq!(view.summary.profit_margin, "0%");
        assert_eq!(view.totals, Totals::default());
        assert!(view.monthly.is_empty());
        assert!(view.product_sales.is_empty());
        assert!(view.region_sales.is_empty());
        assert!(view.product_profit.is_empty());
        assert!(view.is_empty());
    }

    #[test]
    fn test_totals_are_exact_sums() {
        let records = vec![
            record("2023-01-05", "0.10", "0.05", "North", "Electronics"),
            record("2023-02-05", "0.20", "0.30", "East", "Furniture"),
            record("2023-03-05", "1234.56", "99.99", "West", "Apparel"),
        ];
        let view = compute_view(&records);
        let sales: Decimal = records.iter().map(|r| r.sales()).sum();
        let expenses: Decimal = records.iter().map(|r| r.expenses()).sum();
        assert_eq!(view.totals.sales, sales);
        assert_eq!(view.totals.expenses, expenses);
        assert_eq!(view.totals.profit, sales - expenses);
        assert_eq!(view.totals.sales, dec("1234.86"));
    }

    #[test]
    fn test_large_totals_format_exactly() {
        let records = vec![
            record("2023-01-05", "12345678901234567.89", "0.10", "North", "Electronics"),
            record("2023-01-06", "10000000000000000", "0", "South", "Apparel"),
        ];
        let summary = compute_view(&records).summary;
        assert_eq!(summary.total_sales, "$22,345,678,901,234,567.89");
        assert_eq!(summary.total_expenses, "$0.10");
        assert_eq!(summary.net_profit, "$22,345,678,901,234,567.79");
    }

    #[test]
    fn test_idempotent() {
        let records = example();
        assert_eq!(compute_view(&records), compute_view(&records));
    }

    #[test]
    fn test_zero_sales_margin() {
        let records = vec![record("2023-01-05", "0", "250", "North", "Electronics")];
        let view = compute_view(&records);
        assert_eq!(view.summary.profit_margin, "0%");
        assert_eq!(view.summary.net_profit, "-$250.00");
    }

    #[test]
    fn test_negative_and_round_margins() {
        let loss = vec![record("2023-01-05", "1000", "1200", "North", "Electronics")];
        assert_eq!(compute_view(&loss).summary.profit_margin, "-20.0%");
        let half = vec![record("2023-01-05", "1000", "500", "North", "Electronics")];
        assert_eq!(compute_view(&half).summary.profit_margin, "50.0%");
    }

    #[test]
    fn test_monthly_is_sparse_and_sorted() {
        let records = vec![
            record("2023-05-10", "10", "1", "North", "Electronics"),
            record("2023-01-31", "20", "2", "North", "Electronics"),
            record("2023-05-01", "30", "3", "North", "Electronics"),
        ];
        let view = compute_view(&records);
        let months: Vec<NaiveDate> = view.monthly.iter().map(|p| p.month).collect();
        assert_eq!(months, vec![date("2023-01-01"), date("2023-05-01")]);
        assert_eq!(view.monthly[1].sales, dec("40"));
        assert_eq!(view.monthly[1].profit, dec("36"));
    }

    #[test]
    fn test_months_are_distinct_across_years() {
        let records = vec![
            record("2024-01-15", "1", "0", "North", "Electronics"),
            record("2023-01-15", "1", "0", "North", "Electronics"),
        ];
        let view = compute_view(&records);
        assert_eq!(view.monthly.len(), 2);
        assert_eq!(view.monthly[0].month, date("2023-01-01"));
    }

    #[test]
    fn test_grouping_is_case_sensitive_and_first_seen() {
        let records = vec![
            record("2023-01-05", "1", "0", "West", "furniture"),
            record("2023-01-05", "2", "0", "East", "Furniture"),
            record("2023-01-05", "4", "0", "West", "furniture"),
        ];
        let view = compute_view(&records);
        assert_eq!(
            view.product_sales,
            vec![total("furniture", "5"), total("Furniture", "2")]
        );
        assert_eq!(
            view.region_sales,
            vec![total("West", "5"), total("East", "2")]
        );
    }

    #[test]
    fn test_rows_keep_order_and_carry_profit() {
        let view = compute_view(&example());
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].date, date("2023-01-05"));
        assert_eq!(view.rows[0].profit, dec("600"));
        assert_eq!(view.rows[1].product, "Apparel");
    }

    #[test]
    fn test_overflow_falls_back_to_empty_view() {
        let records = vec![
            Record::new(date("2023-01-05"), Decimal::MAX, Decimal::ZERO, "N", "E"),
            Record::new(date("2023-01-06"), Decimal::MAX, Decimal::ZERO, "N", "E"),
        ];
        assert_eq!(compute_view(&records), DashboardView::empty());
    }

    #[test]
    fn test_view_of_carries_dropped_rows() {
        let records = Records::new(example(), 3);
        let view = view_of(&records);
        assert_eq!(view.dropped_rows, 3);
        assert_eq!(view.summary.total_sales, "$1,500.00");
    }

    #[test]
    fn test_serializes_numbers() {
        let view = compute_view(&example());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["monthly"][0]["month"], "2023-01-01");
        assert_eq!(json["monthly"][0]["sales"], 1500.0);
        assert_eq!(json["product_sales"][0]["name"], "Electronics");
        assert_eq!(json["summary"]["profit_margin"], "66.7%");
    }
}
