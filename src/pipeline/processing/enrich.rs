use crate::constants::{RETURNED_NO, RETURNED_YES, YEAR_MONTH_FORMAT};
use crate::error::{ReportError, Result};
use crate::types::{OrderRecord, RawReturn};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// An order joined with its return flag and carrying the per-row derived metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedOrder {
    /// The cleaned order this row was built from
    pub order: OrderRecord,
    /// Return flag literal; "No" when the order has no return record
    pub returned: String,
    /// `profit / sales * 100`; `None` when sales is zero or profit is missing
    pub profit_margin_pct: Option<f64>,
    /// `discount * sales`; `None` when discount is missing
    pub discount_impact: Option<f64>,
    /// Sales of the preceding row in order-timestamp order
    pub previous_sales: Option<f64>,
    /// Growth against `previous_sales`; 0 for the first row and zero denominators
    pub sales_growth_pct: f64,
    /// Order date bucket, e.g. `2017-03`
    pub year_month: String,
}

impl EnrichedOrder {
    pub fn is_returned(&self) -> bool {
        self.returned == RETURNED_YES
    }
}

/// Dataset-wide figures, computed once and handed to the executive rollup by value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetScalars {
    pub total_orders: usize,
    pub returned_orders: usize,
    pub return_rate_pct: f64,
    pub average_order_value: f64,
    pub total_discount_impact: f64,
}

impl DatasetScalars {
    /// Fails with `DivisionByZero` on an empty dataset instead of producing NaN.
    pub fn compute(rows: &[EnrichedOrder]) -> Result<Self> {
        let total_orders = rows.len();
        if total_orders == 0 {
            return Err(ReportError::DivisionByZero(
                "no orders to compute return rate and average order value from".to_string(),
            ));
        }
        let returned_orders = rows.iter().filter(|r| r.is_returned()).count();
        let total_sales: f64 = rows.iter().map(|r| r.order.sales).sum();
        let total_discount_impact: f64 = rows.iter().filter_map(|r| r.discount_impact).sum();

        Ok(Self {
            total_orders,
            returned_orders,
            return_rate_pct: returned_orders as f64 / total_orders as f64 * 100.0,
            average_order_value: total_sales / total_orders as f64,
            total_discount_impact,
        })
    }
}

/// Enriched rows in order-timestamp order, plus the scalars computed over them
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedDataset {
    pub rows: Vec<EnrichedOrder>,
    pub scalars: DatasetScalars,
}

/// Joins return flags into orders and derives the per-row metrics
pub struct OrderEnricher {
    /// Order ID -> return flag literal
    returns: HashMap<String, String>,
}

impl OrderEnricher {
    /// Build the return lookup. The first record for an order ID wins.
    pub fn new(returns: &[RawReturn]) -> Self {
        let mut lookup: HashMap<String, String> = HashMap::with_capacity(returns.len());
        let mut duplicates = 0usize;
        for ret in returns {
            let Some(order_id) = &ret.order_id else {
                continue;
            };
            let Some(flag) = &ret.returned else {
                continue;
            };
            if lookup.contains_key(order_id) {
                duplicates += 1;
                continue;
            }
            lookup.insert(order_id.clone(), flag.clone());
        }
        if duplicates > 0 {
            warn!("{} duplicate return records ignored (first one per order ID kept)", duplicates);
        }
        Self { returns: lookup }
    }

    #[instrument(skip(self, orders), fields(orders = orders.len(), returns = self.returns.len()))]
    pub fn enrich(&self, orders: &[OrderRecord]) -> Result<EnrichedDataset> {
        let mut rows: Vec<EnrichedOrder> = orders
            .iter()
            .map(|order| {
                let returned = order
                    .order_id
                    .as_ref()
                    .and_then(|id| self.returns.get(id))
                    .cloned()
                    .unwrap_or_else(|| RETURNED_NO.to_string());
                EnrichedOrder {
                    returned,
                    profit_margin_pct: profit_margin_pct(order.profit, order.sales),
                    discount_impact: order.discount.map(|d| d * order.sales),
                    previous_sales: None,
                    sales_growth_pct: 0.0,
                    year_month: order.order_date.format(YEAR_MONTH_FORMAT).to_string(),
                    order: order.clone(),
                }
            })
            .collect();

        // sort_by_key is stable: equal timestamps keep their source order
        rows.sort_by_key(|r| r.order.order_date);

        let mut previous: Option<f64> = None;
        for row in rows.iter_mut() {
            row.previous_sales = previous;
            row.sales_growth_pct = sales_growth_pct(row.order.sales, previous);
            previous = Some(row.order.sales);
        }

        let scalars = DatasetScalars::compute(&rows)?;

        let matched = rows.iter().filter(|r| r.is_returned()).count();
        counter!("sales_reports_rows_enriched_total").increment(rows.len() as u64);
        info!(
            "🔗 Enriched {} orders: {} returned ({:.2}%), AOV {:.2}",
            rows.len(),
            matched,
            scalars.return_rate_pct,
            scalars.average_order_value
        );

        Ok(EnrichedDataset { rows, scalars })
    }
}

/// Profit as a percentage of sales. Undefined for zero sales.
pub fn profit_margin_pct(profit: Option<f64>, sales: f64) -> Option<f64> {
    match profit {
        Some(p) if sales != 0.0 => Some(p / sales * 100.0),
        _ => None,
    }
}

/// Period-over-period growth; 0 without a previous value or when it is zero.
pub fn sales_growth_pct(sales: f64, previous: Option<f64>) -> f64 {
    match previous {
        Some(prev) if prev != 0.0 => (sales - prev) / prev * 100.0,
        _ => 0.0,
    }
}
