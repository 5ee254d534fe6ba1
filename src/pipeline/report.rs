use crate::constants::{EXECUTIVE_REPORT_NAME, OPERATIONAL_REPORT_NAME, REPORT_DATE_FORMAT};
use crate::pipeline::processing::{EnrichedDataset, ExecutiveRow};
use crate::types::format_number;
use serde::Serialize;
use std::fmt;

pub const OPERATIONAL_COLUMNS: [&str; 10] = [
    "Date",
    "Region",
    "City",
    "Product Category",
    "Sub-Category",
    "Total Sales",
    "Quantity",
    "Discount",
    "Profit Margin (%)",
    "Sales Growth (%)",
];

pub const EXECUTIVE_COLUMNS: [&str; 10] = [
    "Region",
    "Year-Month",
    "Total_Sales",
    "Total_Profit",
    "Profit_Margin_Percent",
    "Sales_Growth_Percent",
    "Top-Performing Products",
    "Discount Impact",
    "Return Rate (%)",
    "Average Order Value (AOV)",
];

/// A report cell. Serializes as a bare JSON string, number or null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportValue {
    Text(String),
    Number(f64),
    Empty,
}

impl ReportValue {
    fn text(value: Option<&String>) -> Self {
        value.map_or(ReportValue::Empty, |s| ReportValue::Text(s.clone()))
    }

    fn number(value: Option<f64>) -> Self {
        value.map_or(ReportValue::Empty, ReportValue::Number)
    }
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportValue::Text(s) => f.write_str(s),
            ReportValue::Number(n) => f.write_str(&format_number(*n)),
            ReportValue::Empty => Ok(()),
        }
    }
}

/// A named, column-ordered table ready to hand to a writer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ReportValue>>,
}

impl ReportTable {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column by name, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&ReportValue>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }
}

/// The first `limit` enriched rows in timestamp order, projected onto the operational columns.
pub fn operational_table(dataset: &EnrichedDataset, limit: usize) -> ReportTable {
    let mut table = ReportTable::new(OPERATIONAL_REPORT_NAME, &OPERATIONAL_COLUMNS);
    table.rows = dataset
        .rows
        .iter()
        .take(limit)
        .map(|r| {
            let o = &r.order;
            vec![
                ReportValue::Text(o.order_date.format(REPORT_DATE_FORMAT).to_string()),
                ReportValue::Text(o.region.clone()),
                ReportValue::text(o.city.as_ref()),
                ReportValue::text(o.category.as_ref()),
                ReportValue::text(o.sub_category.as_ref()),
                ReportValue::Number(o.sales),
                ReportValue::Number(o.quantity),
                ReportValue::number(o.discount),
                ReportValue::number(r.profit_margin_pct),
                ReportValue::Number(r.sales_growth_pct),
            ]
        })
        .collect();
    table
}

/// The first `limit` executive groups, in the order the rollup produced them.
pub fn executive_table(rows: &[ExecutiveRow], limit: usize) -> ReportTable {
    let mut table = ReportTable::new(EXECUTIVE_REPORT_NAME, &EXECUTIVE_COLUMNS);
    table.rows = rows
        .iter()
        .take(limit)
        .map(|r| {
            vec![
                ReportValue::Text(r.region.clone()),
                ReportValue::Text(r.year_month.clone()),
                ReportValue::Number(r.total_sales),
                ReportValue::Number(r.total_profit),
                ReportValue::number(r.profit_margin_pct),
                ReportValue::number(r.sales_growth_pct),
                ReportValue::Text(r.top_sub_category.clone()),
                ReportValue::Number(r.discount_impact),
                ReportValue::Number(r.return_rate_pct),
                ReportValue::Number(r.average_order_value),
            ]
        })
        .collect();
    table
}

/// Plain-text grid of the first `max_rows` rows, for console display.
pub fn render_preview(table: &ReportTable, max_rows: usize) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .take(max_rows)
        .map(|row| row.iter().map(preview_cell).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<&str> = table.columns.iter().map(String::as_str).collect();
    out.push_str(&pad_line(&header, &widths));
    out.push('\n');
    for row in &cells {
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&pad_line(&values, &widths));
        out.push('\n');
    }
    if table.rows.len() > max_rows {
        out.push_str(&format!("... {} more rows\n", table.rows.len() - max_rows));
    }
    out
}

fn pad_line(values: &[&str], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(v, w)| format!("{:<width$}", v, width = *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn preview_cell(value: &ReportValue) -> String {
    match value {
        ReportValue::Number(n) if n.fract() != 0.0 => format!("{:.2}", n),
        ReportValue::Empty => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::{executive_rollup, OrderEnricher};
    use crate::types::OrderRecord;
    use chrono::{Duration, NaiveDate};

    fn orders(n: usize) -> Vec<OrderRecord> {
        let start = NaiveDate::from_ymd_opt(2016, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        (0..n)
            .map(|i| {
                let date = start + Duration::days(i as i64 * 3);
                OrderRecord {
                    row: i + 2,
                    order_id: Some(format!("US-{i}")),
                    order_date: date,
                    ship_date: date,
                    customer_name: "Brosina Hoffman".to_string(),
                    region: if i % 2 == 0 { "West" } else { "East" }.to_string(),
                    city: Some("Los Angeles".to_string()),
                    category: Some("Technology".to_string()),
                    sub_category: Some("Phones".to_string()),
                    sales: 10.0 + i as f64,
                    quantity: 1.0,
                    discount: None,
                    profit: Some(1.0),
                    extras: vec![],
                }
            })
            .collect()
    }

    #[test]
    fn test_operational_table_shape() {
        let ds = OrderEnricher::new(&[]).enrich(&orders(25)).unwrap();
        let table = operational_table(&ds, 10);

        assert_eq!(table.name, "Operational Report");
        assert_eq!(table.columns.len(), 10);
        assert_eq!(table.len(), 10);
        assert_eq!(table.rows[0][0], ReportValue::Text("2016-01-01".to_string()));
        assert_eq!(table.rows[0][5], ReportValue::Number(10.0));
        assert_eq!(table.rows[0][7], ReportValue::Empty);
        assert_eq!(table.column("Sales Growth (%)").unwrap()[0], &ReportValue::Number(0.0));
    }

    #[test]
    fn test_operational_table_keeps_short_datasets_whole() {
        let ds = OrderEnricher::new(&[]).enrich(&orders(3)).unwrap();
        assert_eq!(operational_table(&ds, 10).len(), 3);
    }

    #[test]
    fn test_executive_table_caps_rows_in_group_order() {
        // 400 orders every 3 days span ~40 months, two regions each
        let ds = OrderEnricher::new(&[]).enrich(&orders(400)).unwrap();
        let rollup = executive_rollup(&ds);
        assert!(rollup.len() > 40);

        let table = executive_table(&rollup, 40);
        assert_eq!(table.len(), 40);
        assert_eq!(table.columns.len(), 10);
        assert_eq!(table.rows[0][0], ReportValue::Text("East".to_string()));
        assert_eq!(table.rows[0][1], ReportValue::Text("2016-01".to_string()));
        assert_eq!(table.rows[0][6], ReportValue::Text("Phones".to_string()));
    }

    #[test]
    fn test_render_preview() {
        let ds = OrderEnricher::new(&[]).enrich(&orders(5)).unwrap();
        let table = operational_table(&ds, 10);
        let preview = render_preview(&table, 2);
        let lines: Vec<&str> = preview.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Date"));
        assert!(lines[1].contains("Los Angeles"));
        assert_eq!(lines[3], "... 3 more rows");
    }

    #[test]
    fn test_values_serialize_untagged() {
        let json = serde_json::to_string(&vec![
            ReportValue::Text("West".to_string()),
            ReportValue::Number(1.5),
            ReportValue::Empty,
        ])
        .unwrap();
        assert_eq!(json, r#"["West",1.5,null]"#);
    }
}
