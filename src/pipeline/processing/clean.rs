use crate::constants::{COL_ORDER_DATE, COL_QUANTITY, COL_SALES, COL_SHIP_DATE, UNKNOWN_LABEL};
use crate::dates::cell_to_datetime;
use crate::error::{ReportError, Result};
use crate::types::{Cell, OrderRecord, RawOrders};
use chrono::NaiveDateTime;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// What the cleaner changed, for logging and the run manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub duplicates_removed: usize,
    pub customer_names_filled: usize,
    pub regions_filled: usize,
    pub sales_filled: usize,
    pub quantities_filled: usize,
    /// Median of the original sales column, when it had any values
    pub sales_median: Option<f64>,
    pub quantity_median: Option<f64>,
}

/// Cleaned orders plus the report describing how they were produced
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedOrders {
    pub records: Vec<OrderRecord>,
    pub report: CleanReport,
}

/// Normalizes types, applies the default-fill rules and drops exact duplicates
#[derive(Debug, Clone)]
pub struct OrderCleaner {
    /// Label written into missing customer names and regions
    pub unknown_label: String,
}

impl Default for OrderCleaner {
    fn default() -> Self {
        Self {
            unknown_label: UNKNOWN_LABEL.to_string(),
        }
    }
}

impl OrderCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean the raw orders. Steps run in a fixed order: dates, text fills,
    /// median fills, then duplicate removal. `raw` is never modified.
    #[instrument(skip(self, raw), fields(rows = raw.rows.len()))]
    pub fn clean(&self, raw: &RawOrders) -> Result<CleanedOrders> {
        let mut report = CleanReport {
            rows_in: raw.rows.len(),
            ..CleanReport::default()
        };

        // Timestamps first: everything downstream sorts and buckets on them.
        let mut dates = Vec::with_capacity(raw.rows.len());
        for order in &raw.rows {
            let order_date = parse_date(&order.order_date, COL_ORDER_DATE, order.row)?;
            let ship_date = parse_date(&order.ship_date, COL_SHIP_DATE, order.row)?;
            dates.push((order_date, ship_date));
        }

        // Medians come from the untouched columns, computed once.
        let sales_median = median_fill(raw.rows.iter().map(|o| o.sales), COL_SALES)?;
        let quantity_median = median_fill(raw.rows.iter().map(|o| o.quantity), COL_QUANTITY)?;
        report.sales_median = sales_median;
        report.quantity_median = quantity_median;

        let mut records = Vec::with_capacity(raw.rows.len());
        for (order, (order_date, ship_date)) in raw.rows.iter().zip(dates) {
            let customer_name = match &order.customer_name {
                Some(name) => name.clone(),
                None => {
                    report.customer_names_filled += 1;
                    self.unknown_label.clone()
                }
            };
            let region = match &order.region {
                Some(region) => region.clone(),
                None => {
                    report.regions_filled += 1;
                    self.unknown_label.clone()
                }
            };

            // A missing value implies the column had a median; see median_fill.
            let sales = match order.sales {
                Some(v) => v,
                None => {
                    report.sales_filled += 1;
                    sales_median.unwrap_or_default()
                }
            };
            let quantity = match order.quantity {
                Some(v) => v,
                None => {
                    report.quantities_filled += 1;
                    quantity_median.unwrap_or_default()
                }
            };

            records.push(OrderRecord {
                row: order.row,
                order_id: order.order_id.clone(),
                order_date,
                ship_date,
                customer_name,
                region,
                city: order.city.clone(),
                category: order.category.clone(),
                sub_category: order.sub_category.clone(),
                sales,
                quantity,
                discount: order.discount,
                profit: order.profit,
                extras: order.extras.clone(),
            });
        }

        // Duplicates are judged on the fully filled rows.
        let (records, removed) = drop_duplicates(records);
        report.duplicates_removed = removed;
        report.rows_out = records.len();

        counter!("sales_reports_duplicates_removed_total").increment(removed as u64);
        counter!("sales_reports_values_filled_total", "column" => COL_SALES)
            .increment(report.sales_filled as u64);
        counter!("sales_reports_values_filled_total", "column" => COL_QUANTITY)
            .increment(report.quantities_filled as u64);

        info!(
            "🧹 Cleaned {} rows -> {} ({} duplicates, {} sales and {} quantities median-filled)",
            report.rows_in,
            report.rows_out,
            report.duplicates_removed,
            report.sales_filled,
            report.quantities_filled
        );

        Ok(CleanedOrders { records, report })
    }
}

fn parse_date(cell: &Cell, column: &str, row: usize) -> Result<NaiveDateTime> {
    cell_to_datetime(cell).ok_or_else(|| ReportError::MalformedDate {
        column: column.to_string(),
        row,
        value: cell.as_text().unwrap_or_default(),
    })
}

/// Median used to fill a column. Errors when the column has gaps but no
/// values to take a median from.
fn median_fill(values: impl Iterator<Item = Option<f64>>, column: &str) -> Result<Option<f64>> {
    let (present, missing): (Vec<Option<f64>>, Vec<Option<f64>>) =
        values.partition(Option::is_some);
    let present: Vec<f64> = present.into_iter().flatten().collect();
    let median = median(&present);
    if median.is_none() && !missing.is_empty() {
        return Err(ReportError::SchemaMismatch(format!(
            "column '{}' has {} missing values and none to take a median from",
            column,
            missing.len()
        )));
    }
    Ok(median)
}

/// Median of the values; the mean of the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Remove exact full-row duplicates, keeping the first occurrence in order.
/// Returns the survivors and how many rows were dropped.
pub fn drop_duplicates(records: Vec<OrderRecord>) -> (Vec<OrderRecord>, usize) {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<OrderRecord> = records
        .into_iter()
        .filter(|r| {
            let fresh = seen.insert(r.row_key());
            if !fresh {
                debug!("Dropping duplicate of an earlier row at source row {}", r.row);
            }
            fresh
        })
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}
