use super::enrich::{DatasetScalars, EnrichedDataset, EnrichedOrder};
use crate::constants::NO_TOP_SUB_CATEGORY;
use metrics::histogram;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// (region, year-month)
pub type RegionMonth = (String, String);

/// One executive report row: a (region, year-month) group plus the broadcast scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveRow {
    pub region: String,
    pub year_month: String,
    pub total_sales: f64,
    pub total_profit: f64,
    /// Mean of the defined per-row margins; `None` if the group has none
    pub profit_margin_pct: Option<f64>,
    pub sales_growth_pct: Option<f64>,
    pub top_sub_category: String,
    pub discount_impact: f64,
    pub return_rate_pct: f64,
    pub average_order_value: f64,
}

/// Per-region totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTotals {
    pub region: String,
    pub orders: usize,
    pub total_sales: f64,
    pub total_profit: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Default)]
struct GroupAccumulator {
    sales: f64,
    profit: f64,
    margin: Mean,
    growth: Mean,
}

/// Best-selling sub-category per (region, year-month).
///
/// Sales are summed per (region, year-month, sub-category); the largest sum
/// wins and equal sums go to the alphabetically first sub-category. Rows
/// without a sub-category take no part.
pub fn top_sub_categories(rows: &[EnrichedOrder]) -> BTreeMap<RegionMonth, String> {
    let mut sums: BTreeMap<(String, String, String), f64> = BTreeMap::new();
    for row in rows {
        let Some(sub_category) = &row.order.sub_category else {
            continue;
        };
        *sums
            .entry((
                row.order.region.clone(),
                row.year_month.clone(),
                sub_category.clone(),
            ))
            .or_default() += row.order.sales;
    }

    // BTreeMap iterates sub-categories ascending within a group, so a strict
    // comparison keeps the alphabetically first on ties.
    let mut best: BTreeMap<RegionMonth, (String, f64)> = BTreeMap::new();
    for ((region, year_month, sub_category), sales) in sums {
        match best.get_mut(&(region.clone(), year_month.clone())) {
            Some(current) if sales > current.1 => *current = (sub_category, sales),
            Some(_) => {}
            None => {
                best.insert((region, year_month), (sub_category, sales));
            }
        }
    }

    best.into_iter().map(|(key, (name, _))| (key, name)).collect()
}

/// Group by (region, year-month) in ascending key order and attach the top
/// sub-category and the dataset scalars to every group.
#[instrument(skip(dataset), fields(rows = dataset.rows.len()))]
pub fn executive_rollup(dataset: &EnrichedDataset) -> Vec<ExecutiveRow> {
    let started = std::time::Instant::now();
    let top = top_sub_categories(&dataset.rows);

    let mut groups: BTreeMap<RegionMonth, GroupAccumulator> = BTreeMap::new();
    for row in &dataset.rows {
        let acc = groups
            .entry((row.order.region.clone(), row.year_month.clone()))
            .or_default();
        acc.sales += row.order.sales;
        acc.profit += row.order.profit.unwrap_or_default();
        acc.margin.add(row.profit_margin_pct);
        acc.growth.add(Some(row.sales_growth_pct));
    }

    let rows: Vec<ExecutiveRow> = groups
        .into_iter()
        .map(|(key, acc)| {
            let top_sub_category = top
                .get(&key)
                .cloned()
                .unwrap_or_else(|| NO_TOP_SUB_CATEGORY.to_string());
            executive_row(key, acc, top_sub_category, &dataset.scalars)
        })
        .collect();

    histogram!("sales_reports_rollup_duration_seconds").record(started.elapsed().as_secs_f64());
    info!("📊 Executive rollup produced {} region-month groups", rows.len());
    rows
}

fn executive_row(
    (region, year_month): RegionMonth,
    acc: GroupAccumulator,
    top_sub_category: String,
    scalars: &DatasetScalars,
) -> ExecutiveRow {
    ExecutiveRow {
        region,
        year_month,
        total_sales: acc.sales,
        total_profit: acc.profit,
        profit_margin_pct: acc.margin.value(),
        sales_growth_pct: acc.growth.value(),
        top_sub_category,
        discount_impact: scalars.total_discount_impact,
        return_rate_pct: scalars.return_rate_pct,
        average_order_value: scalars.average_order_value,
    }
}

/// Order count, sales and profit per region, ascending by region name.
pub fn region_totals(rows: &[EnrichedOrder]) -> Vec<RegionTotals> {
    let mut totals: BTreeMap<&str, RegionTotals> = BTreeMap::new();
    for row in rows {
        let entry = totals
            .entry(row.order.region.as_str())
            .or_insert_with(|| RegionTotals {
                region: row.order.region.clone(),
                orders: 0,
                total_sales: 0.0,
                total_profit: 0.0,
            });
        entry.orders += 1;
        entry.total_sales += row.order.sales;
        entry.total_profit += row.order.profit.unwrap_or_default();
    }
    for t in totals.values() {
        debug!(
            "Region {}: {} orders, sales {:.2}, profit {:.2}",
            t.region, t.orders, t.total_sales, t.total_profit
        );
    }
    totals.into_values().collect()
}
