use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single source cell, independent of whether it came from a workbook or a CSV file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

/// Hashable view of a [`Cell`], used for full-row duplicate detection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKey {
    Empty,
    Text(String),
    Number(u64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl Cell {
    /// Build a cell from text, treating the empty string as a missing value.
    pub fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Render the cell as text. Whole numbers lose their trailing `.0` so
    /// numeric identifiers read the same as they do in the sheet.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Date(dt) => Some(dt.to_string()),
        }
    }

    /// Interpret the cell as a number. `Ok(None)` means missing; `Err` carries
    /// the offending raw value.
    pub fn as_number(&self) -> std::result::Result<Option<f64>, String> {
        match self {
            Cell::Empty => Ok(None),
            Cell::Number(n) if n.is_nan() => Ok(None),
            Cell::Number(n) => Ok(Some(*n)),
            Cell::Text(s) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_nan() => Ok(None),
                Ok(v) => Ok(Some(v)),
                Err(_) => Err(s.clone()),
            },
            Cell::Bool(b) => Err(b.to_string()),
            Cell::Date(dt) => Err(dt.to_string()),
        }
    }

    pub fn key(&self) -> CellKey {
        match self {
            Cell::Empty => CellKey::Empty,
            Cell::Text(s) => CellKey::Text(s.clone()),
            Cell::Number(n) => CellKey::Number(float_bits(*n)),
            Cell::Bool(b) => CellKey::Bool(*b),
            Cell::Date(dt) => CellKey::Date(*dt),
        }
    }
}

/// Bit pattern of a float with `-0.0` folded onto `0.0`.
pub fn float_bits(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// One Orders row as the loader saw it, before any cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOrder {
    /// Source row number (the header is row 1)
    pub row: usize,
    pub order_id: Option<String>,
    pub order_date: Cell,
    pub ship_date: Cell,
    pub customer_name: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub sales: Option<f64>,
    pub quantity: Option<f64>,
    pub discount: Option<f64>,
    pub profit: Option<f64>,
    /// Every other column of the sheet, in `RawOrders::extra_columns` order
    pub extras: Vec<Cell>,
}

/// The Orders record set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOrders {
    pub extra_columns: Vec<String>,
    pub rows: Vec<RawOrder>,
}

/// One Returns row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReturn {
    pub order_id: Option<String>,
    pub returned: Option<String>,
}

/// An order after timestamp parsing, default fills and duplicate removal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub row: usize,
    pub order_id: Option<String>,
    pub order_date: NaiveDateTime,
    pub ship_date: NaiveDateTime,
    pub customer_name: String,
    pub region: String,
    pub city: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub sales: f64,
    pub quantity: f64,
    pub discount: Option<f64>,
    pub profit: Option<f64>,
    pub extras: Vec<Cell>,
}

/// Every field of an [`OrderRecord`] except its source row number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    order_id: Option<String>,
    order_date: NaiveDateTime,
    ship_date: NaiveDateTime,
    customer_name: String,
    region: String,
    city: Option<String>,
    category: Option<String>,
    sub_category: Option<String>,
    sales: u64,
    quantity: u64,
    discount: Option<u64>,
    profit: Option<u64>,
    extras: Vec<CellKey>,
}

impl OrderRecord {
    pub fn row_key(&self) -> RowKey {
        RowKey {
            order_id: self.order_id.clone(),
            order_date: self.order_date,
            ship_date: self.ship_date,
            customer_name: self.customer_name.clone(),
            region: self.region.clone(),
            city: self.city.clone(),
            category: self.category.clone(),
            sub_category: self.sub_category.clone(),
            sales: float_bits(self.sales),
            quantity: float_bits(self.quantity),
            discount: self.discount.map(float_bits),
            profit: self.profit.map(float_bits),
            extras: self.extras.iter().map(Cell::key).collect(),
        }
    }
}
