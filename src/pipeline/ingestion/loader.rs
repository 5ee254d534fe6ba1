use super::{RawTable, TabularSource};
use crate::constants::*;
use crate::error::{ReportError, Result};
use crate::types::{Cell, RawOrder, RawOrders, RawReturn};
use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Both record sets as read from the source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadedData {
    pub orders: RawOrders,
    pub returns: Vec<RawReturn>,
}

/// Reads the Orders and Returns sheets and maps them onto typed raw records
#[derive(Debug, Clone)]
pub struct Loader {
    pub orders_sheet: String,
    pub returns_sheet: String,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            orders_sheet: ORDERS_SHEET.to_string(),
            returns_sheet: RETURNS_SHEET.to_string(),
        }
    }
}

impl Loader {
    pub fn new(orders_sheet: impl Into<String>, returns_sheet: impl Into<String>) -> Self {
        Self {
            orders_sheet: orders_sheet.into(),
            returns_sheet: returns_sheet.into(),
        }
    }

    #[instrument(skip(self, source), fields(source = %source.describe()))]
    pub fn load(&self, source: &mut dyn TabularSource) -> Result<LoadedData> {
        let available = source.sheet_names();
        for required in [&self.orders_sheet, &self.returns_sheet] {
            if !available.iter().any(|s| s == required) {
                return Err(ReportError::SourceUnavailable(format!(
                    "{} has no '{}' sheet (found: {})",
                    source.describe(),
                    required,
                    available.join(", ")
                )));
            }
        }

        let orders_table = source.read_sheet(&self.orders_sheet)?;
        let returns_table = source.read_sheet(&self.returns_sheet)?;

        let orders = map_orders(&orders_table)?;
        let returns = map_returns(&returns_table)?;

        counter!("sales_reports_rows_loaded_total", "sheet" => self.orders_sheet.clone())
            .increment(orders.rows.len() as u64);
        counter!("sales_reports_rows_loaded_total", "sheet" => self.returns_sheet.clone())
            .increment(returns.len() as u64);
        info!(
            "📥 Loaded {} orders and {} returns ({} extra order columns)",
            orders.rows.len(),
            returns.len(),
            orders.extra_columns.len()
        );

        Ok(LoadedData { orders, returns })
    }
}

/// Map the Orders sheet. Columns not named in [`REQUIRED_ORDER_COLUMNS`] are
/// carried along as extras.
pub fn map_orders(table: &RawTable) -> Result<RawOrders> {
    let mut idx = [0usize; REQUIRED_ORDER_COLUMNS.len()];
    for (slot, column) in idx.iter_mut().zip(REQUIRED_ORDER_COLUMNS) {
        *slot = table.require_column(column)?;
    }
    let [
        order_id,
        order_date,
        ship_date,
        customer_name,
        region,
        city,
        category,
        sub_category,
        sales,
        quantity,
        discount,
        profit,
    ] = idx;

    let extra_indices: Vec<usize> = (0..table.headers.len())
        .filter(|i| !idx.contains(i))
        .collect();
    let extra_columns = extra_indices
        .iter()
        .map(|&i| table.headers[i].clone())
        .collect();

    let mut rows = Vec::with_capacity(table.rows.len());
    for (i, cells) in table.rows.iter().enumerate() {
        if cells.iter().all(Cell::is_empty) {
            debug!("Skipping blank row {}", i + 2);
            continue;
        }
        let text = |col: usize| table.cell(i, col).as_text();
        let number = |col: usize| numeric(table, i, col);

        rows.push(RawOrder {
            row: i + 2,
            order_id: text(order_id),
            order_date: table.cell(i, order_date).clone(),
            ship_date: table.cell(i, ship_date).clone(),
            customer_name: text(customer_name),
            region: text(region),
            city: text(city),
            category: text(category),
            sub_category: text(sub_category),
            sales: number(sales)?,
            quantity: number(quantity)?,
            discount: number(discount)?,
            profit: number(profit)?,
            extras: extra_indices.iter().map(|&c| table.cell(i, c).clone()).collect(),
        });
    }

    Ok(RawOrders {
        extra_columns,
        rows,
    })
}

pub fn map_returns(table: &RawTable) -> Result<Vec<RawReturn>> {
    let order_id = table.require_column(COL_ORDER_ID)?;
    let returned = table.require_column(COL_RETURNED)?;

    Ok((0..table.rows.len())
        .filter(|&i| !table.rows[i].iter().all(Cell::is_empty))
        .map(|i| RawReturn {
            order_id: table.cell(i, order_id).as_text(),
            returned: table.cell(i, returned).as_text(),
        })
        .collect())
}

fn numeric(table: &RawTable, row: usize, col: usize) -> Result<Option<f64>> {
    table.cell(row, col).as_number().map_err(|raw| {
        ReportError::SchemaMismatch(format!(
            "sheet '{}' column '{}' row {}: expected a number, found {:?}",
            table.name,
            table.headers[col],
            row + 2,
            raw
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingestion::InMemorySource;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn orders_table(extra_header: Option<&str>) -> RawTable {
        let mut headers: Vec<String> = REQUIRED_ORDER_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect();
        let mut row = vec![
            text("CA-1"),
            text("2017-01-03"),
            text("2017-01-05"),
            Cell::Empty,
            text("West"),
            text("Seattle"),
            text("Furniture"),
            text("Chairs"),
            Cell::Number(120.5),
            text("3"),
            Cell::Number(0.2),
            Cell::Number(-4.0),
        ];
        if let Some(h) = extra_header {
            headers.insert(0, h.to_string());
            row.insert(0, Cell::Number(1.0));
        }
        RawTable::new(ORDERS_SHEET, headers, vec![row, vec![Cell::Empty; 2]])
    }

    fn returns_table() -> RawTable {
        RawTable::new(
            RETURNS_SHEET,
            vec![COL_RETURNED.to_string(), COL_ORDER_ID.to_string()],
            vec![vec![text("Yes"), text("CA-1")]],
        )
    }

    #[test]
    fn test_maps_orders_and_skips_blank_rows() {
        let orders = map_orders(&orders_table(Some("Row ID"))).unwrap();
        assert_eq!(orders.extra_columns, vec!["Row ID"]);
        assert_eq!(orders.rows.len(), 1);

        let row = &orders.rows[0];
        assert_eq!(row.row, 2);
        assert_eq!(row.order_id.as_deref(), Some("CA-1"));
        assert_eq!(row.customer_name, None);
        assert_eq!(row.sales, Some(120.5));
        assert_eq!(row.quantity, Some(3.0));
        assert_eq!(row.extras, vec![Cell::Number(1.0)]);
    }

    #[test]
    fn test_missing_order_column_is_schema_mismatch() {
        let mut table = orders_table(None);
        table.headers[9] = "Qty".to_string();
        assert!(matches!(map_orders(&table), Err(ReportError::SchemaMismatch(_))));
    }

    #[test]
    fn test_non_numeric_sales_is_schema_mismatch() {
        let mut table = orders_table(None);
        table.rows[0][8] = text("lots");
        let err = map_orders(&table).unwrap_err();
        assert!(err.to_string().contains("Sales"));
    }

    #[test]
    fn test_load_requires_both_sheets() {
        let mut source = InMemorySource::new().with_sheet(orders_table(None));
        let err = Loader::default().load(&mut source).unwrap_err();
        assert!(matches!(err, ReportError::SourceUnavailable(_)));
    }

    #[test]
    fn test_load_reads_both_sheets() {
        let mut source = InMemorySource::new()
            .with_sheet(orders_table(None))
            .with_sheet(returns_table());
        let loaded = Loader::default().load(&mut source).unwrap();
        assert_eq!(loaded.orders.rows.len(), 1);
        assert_eq!(
            loaded.returns,
            vec![RawReturn {
                order_id: Some("CA-1".to_string()),
                returned: Some("Yes".to_string()),
            }]
        );
    }
}
