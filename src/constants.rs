//! Sheet and column names shared by the loader and the report projections.
//! These are fixed keys: the loader rejects a source that is missing any of them.

// Sheet names
pub const ORDERS_SHEET: &str = "Orders";
pub const RETURNS_SHEET: &str = "Returns";

// Orders columns
pub const COL_ORDER_ID: &str = "Order ID";
pub const COL_ORDER_DATE: &str = "Order Date";
pub const COL_SHIP_DATE: &str = "Ship Date";
pub const COL_CUSTOMER_NAME: &str = "Customer Name";
pub const COL_REGION: &str = "Region";
pub const COL_CITY: &str = "City";
pub const COL_CATEGORY: &str = "Category";
pub const COL_SUB_CATEGORY: &str = "Sub-Category";
pub const COL_SALES: &str = "Sales";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_DISCOUNT: &str = "Discount";
pub const COL_PROFIT: &str = "Profit";

// Returns columns
pub const COL_RETURNED: &str = "Returned";

/// Every column the Orders sheet must provide, in the order they are mapped.
pub const REQUIRED_ORDER_COLUMNS: [&str; 12] = [
    COL_ORDER_ID,
    COL_ORDER_DATE,
    COL_SHIP_DATE,
    COL_CUSTOMER_NAME,
    COL_REGION,
    COL_CITY,
    COL_CATEGORY,
    COL_SUB_CATEGORY,
    COL_SALES,
    COL_QUANTITY,
    COL_DISCOUNT,
    COL_PROFIT,
];

pub const REQUIRED_RETURN_COLUMNS: [&str; 2] = [COL_ORDER_ID, COL_RETURNED];

// Default-fill business rules
pub const UNKNOWN_LABEL: &str = "Unknown";
pub const RETURNED_YES: &str = "Yes";
pub const RETURNED_NO: &str = "No";
pub const NO_TOP_SUB_CATEGORY: &str = "N/A";

/// Year-month bucket format, e.g. `2017-03`.
pub const YEAR_MONTH_FORMAT: &str = "%Y-%m";
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";

// Report names and row caps
pub const OPERATIONAL_REPORT_NAME: &str = "Operational Report";
pub const EXECUTIVE_REPORT_NAME: &str = "Executive Report";
pub const DEFAULT_OPERATIONAL_ROWS: usize = 10;
pub const DEFAULT_EXECUTIVE_ROWS: usize = 100;

pub const OPERATIONAL_FILE_STEM: &str = "Operational_Report";
pub const EXECUTIVE_FILE_STEM: &str = "Executive_Report";
pub const MANIFEST_FILE: &str = "run_manifest.json";
pub const METRICS_FILE: &str = "metrics.prom";

/// Workbook extensions handed to calamine; anything else must be a CSV directory.
pub const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];
