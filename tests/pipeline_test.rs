use anyhow::Result;
use sales_reports::config::Config;
use sales_reports::pipeline::output::OutputFormat;
use sales_reports::pipeline::report::ReportValue;
use sales_reports::{ReportError, ReportPipeline};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const ORDERS_HEADER: &str = "Row ID,Order ID,Order Date,Ship Date,Customer Name,Segment,Region,City,Category,Sub-Category,Sales,Quantity,Discount,Profit";

fn write_input(dir: &Path, orders: &[&str], returns: &[&str]) {
    let mut orders_csv = String::from(ORDERS_HEADER);
    for line in orders {
        orders_csv.push('\n');
        orders_csv.push_str(line);
    }
    fs::write(dir.join("Orders.csv"), orders_csv).unwrap();

    let mut returns_csv = String::from("Returned,Order ID");
    for line in returns {
        returns_csv.push('\n');
        returns_csv.push_str(line);
    }
    fs::write(dir.join("Returns.csv"), returns_csv).unwrap();
}

fn config_for(input: &Path, output: &Path) -> Config {
    let mut config = Config::default();
    config.input.path = input.to_path_buf();
    config.output.dir = output.to_path_buf();
    config
}

#[test]
fn test_full_run_writes_reports_and_manifest() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    write_input(
        input.path(),
        &[
            "1,CA-2016-152156,11/8/2016,11/11/2016,Claire Gute,Consumer,South,Henderson,Furniture,Bookcases,261.96,2,0,41.9136",
            "2,CA-2016-152156,11/8/2016,11/11/2016,Claire Gute,Consumer,South,Henderson,Furniture,Chairs,731.94,3,0,219.582",
            "3,CA-2016-138688,6/12/2016,6/16/2016,Darrin Van Huff,Corporate,West,Los Angeles,Office Supplies,Labels,14.62,2,0,6.8714",
            "4,US-2015-108966,10/11/2015,10/18/2015,Sean O'Donnell,Consumer,South,Fort Lauderdale,Furniture,Tables,957.5775,5,0.45,-383.031",
        ],
        &["Yes,CA-2016-152156", "Yes,CA-2099-000000"],
    );

    let result = ReportPipeline::run(&config_for(input.path(), output.path()))?;

    assert!(result.operational_file.ends_with("Operational_Report.csv"));
    assert!(result.executive_file.ends_with("Executive_Report.csv"));

    let operational = fs::read_to_string(&result.operational_file)?;
    let lines: Vec<&str> = operational.lines().collect();
    assert_eq!(
        lines[0],
        "Date,Region,City,Product Category,Sub-Category,Total Sales,Quantity,Discount,Profit Margin (%),Sales Growth (%)"
    );
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("2015-10-11,South,Fort Lauderdale,Furniture,Tables,957.5775,5,0.45,"));
    assert!(lines[1].ends_with(",0"));

    let executive = fs::read_to_string(&result.executive_file)?;
    let lines: Vec<&str> = executive.lines().collect();
    assert_eq!(
        lines[0],
        "Region,Year-Month,Total_Sales,Total_Profit,Profit_Margin_Percent,Sales_Growth_Percent,Top-Performing Products,Discount Impact,Return Rate (%),Average Order Value (AOV)"
    );
    // South 2015-10, South 2016-11, West 2016-06
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("South,2015-10,"));
    assert!(lines[2].starts_with("South,2016-11,"));
    assert!(lines[2].contains(",Chairs,"));
    let south_nov = &result.reports.executive_rows[1];
    assert!((south_nov.total_sales - 993.9).abs() < 1e-9);
    assert!(lines[3].starts_with("West,2016-06,"));

    let scalars = result.reports.dataset.scalars;
    assert_eq!(scalars.total_orders, 4);
    assert_eq!(scalars.returned_orders, 2);
    assert_eq!(scalars.return_rate_pct, 50.0);

    let manifest_path = result.manifest_file.expect("manifest written");
    let manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(manifest_path)?)?;
    assert_eq!(manifest["input_files"].as_array().unwrap().len(), 2);
    assert_eq!(manifest["clean"]["rows_out"], 4);
    assert_eq!(manifest["executive_groups"], 3);
    assert_eq!(manifest["region_totals"][0]["region"], "South");
    assert_eq!(manifest["region_totals"][0]["orders"], 3);
    Ok(())
}

#[test]
fn test_median_fill_and_growth_scenario() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    write_input(
        input.path(),
        &[
            "1,A-1,2017-01-01,2017-01-02,Ann,Consumer,East,Boston,Technology,Phones,100,1,0,10",
            "2,A-2,2017-01-02,2017-01-03,Ann,Consumer,East,Boston,Technology,Phones,200,1,0,10",
            "3,A-3,2017-01-03,2017-01-04,Ann,Consumer,East,Boston,Technology,Phones,,1,0,10",
        ],
        &[],
    );

    let result = ReportPipeline::run(&config_for(input.path(), output.path()))?;
    let rows = &result.reports.dataset.rows;

    assert_eq!(result.reports.clean_report.sales_median, Some(150.0));
    assert_eq!(rows[2].order.sales, 150.0);
    assert_eq!(rows[0].sales_growth_pct, 0.0);
    assert_eq!(rows[1].sales_growth_pct, 100.0);
    assert_eq!(rows[2].sales_growth_pct, -25.0);
    assert!(rows.iter().all(|r| r.returned == "No"));
    Ok(())
}

#[test]
fn test_identical_rows_collapse_but_row_ids_keep_rows_apart() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    let line = "7,B-1,2017-05-01,2017-05-03,Bo,Consumer,West,Seattle,Furniture,Chairs,50,1,0,5";
    write_input(
        input.path(),
        &[
            line,
            line,
            "8,B-1,2017-05-01,2017-05-03,Bo,Consumer,West,Seattle,Furniture,Chairs,50,1,0,5",
        ],
        &[],
    );

    let result = ReportPipeline::run(&config_for(input.path(), output.path()))?;
    assert_eq!(result.reports.clean_report.duplicates_removed, 1);
    assert_eq!(result.reports.dataset.rows.len(), 2);
    Ok(())
}

#[test]
fn test_order_time_separates_rows_and_drives_growth() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    write_input(
        input.path(),
        &[
            "9,G-1,2017-01-01 10:00:00,2017-01-03,Gil,Consumer,East,Boston,Technology,Phones,50,1,0,5",
            "9,G-1,2017-01-01 09:00:00,2017-01-03,Gil,Consumer,East,Boston,Technology,Phones,50,1,0,5",
            "10,G-2,2017-01-01 12:30:00,2017-01-03,Gil,Consumer,East,Boston,Technology,Phones,25,1,0,5",
        ],
        &[],
    );

    let result = ReportPipeline::run(&config_for(input.path(), output.path()))?;
    let rows = &result.reports.dataset.rows;

    assert_eq!(result.reports.clean_report.duplicates_removed, 0);
    assert_eq!(rows.len(), 3);
    let times: Vec<String> = rows
        .iter()
        .map(|r| r.order.order_date.format("%H:%M").to_string())
        .collect();
    assert_eq!(times, vec!["09:00", "10:00", "12:30"]);
    assert_eq!(rows[2].previous_sales, Some(50.0));
    assert_eq!(rows[2].sales_growth_pct, -50.0);

    let operational = fs::read_to_string(&result.operational_file)?;
    assert!(operational.lines().nth(1).unwrap().starts_with("2017-01-01,East,"));
    Ok(())
}

#[test]
fn test_windows_1252_byte_in_extra_column_does_not_stop_the_run() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    let mut orders = format!("{ORDERS_HEADER},Product Name\n").into_bytes();
    orders.extend_from_slice(
        b"1,H-1,2017-04-01,2017-04-02,Hal,Consumer,West,Seattle,Furniture,Chairs,40,1,0,4,Caf",
    );
    orders.push(0xE9);
    orders.extend_from_slice(b" Chair\n");
    fs::write(input.path().join("Orders.csv"), orders)?;
    fs::write(input.path().join("Returns.csv"), "Returned,Order ID\n")?;

    let result = ReportPipeline::run(&config_for(input.path(), output.path()))?;
    assert_eq!(result.reports.dataset.rows.len(), 1);
    assert_eq!(result.reports.executive_rows[0].top_sub_category, "Chairs");
    Ok(())
}

#[test]
fn test_profit_margin_matches_definition() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    write_input(
        input.path(),
        &[
            "1,C-1,2017-02-01,2017-02-02,Cy,Consumer,Central,Chicago,Technology,Copiers,80,1,0.2,-12",
            "2,C-2,2017-02-02,2017-02-02,Cy,Consumer,Central,Chicago,Technology,Copiers,0,1,0,3",
        ],
        &[],
    );

    let result = ReportPipeline::run(&config_for(input.path(), output.path()))?;
    for row in &result.reports.dataset.rows {
        if row.order.sales != 0.0 {
            let expected = row.order.profit.unwrap() / row.order.sales * 100.0;
            assert_eq!(row.profit_margin_pct, Some(expected));
        } else {
            assert_eq!(row.profit_margin_pct, None);
        }
    }
    let margins = result.reports.operational.column("Profit Margin (%)").unwrap();
    assert_eq!(margins[1], &ReportValue::Empty);
    Ok(())
}

#[test]
fn test_executive_rows_capped_at_one_hundred() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    // 4 regions x 30 months = 120 distinct groups
    let mut lines = Vec::new();
    let mut row_id = 0;
    for region in ["Central", "East", "South", "West"] {
        for month in 0..30 {
            row_id += 1;
            let year = 2015 + month / 12;
            let m = month % 12 + 1;
            lines.push(format!(
                "{row_id},D-{row_id},{year}-{m:02}-15,{year}-{m:02}-20,Di,Consumer,{region},Austin,Furniture,Chairs,10,1,0,1"
            ));
        }
    }
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_input(input.path(), &refs, &[]);

    let result = ReportPipeline::run(&config_for(input.path(), output.path()))?;
    assert_eq!(result.reports.executive_rows.len(), 120);
    assert_eq!(result.reports.executive.len(), 100);
    assert_eq!(result.reports.operational.len(), 10);

    let written = fs::read_to_string(&result.executive_file)?;
    assert_eq!(written.lines().count(), 101);
    Ok(())
}

#[test]
fn test_json_output_without_manifest() -> Result<()> {
    let input = tempdir()?;
    let output = tempdir()?;
    write_input(
        input.path(),
        &["1,E-1,2017-03-01,2017-03-02,Ed,Consumer,East,Newark,Technology,Phones,10,1,0,1"],
        &[],
    );

    let mut config = config_for(input.path(), output.path());
    config.output.format = OutputFormat::Json;
    config.output.write_manifest = false;
    let result = ReportPipeline::run(&config)?;

    assert!(result.manifest_file.is_none());
    assert!(!output.path().join("run_manifest.json").exists());
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.path().join("Executive_Report.json"))?)?;
    assert_eq!(json["name"], "Executive Report");
    assert_eq!(json["rows"][0][6], "Phones");
    Ok(())
}

#[test]
fn test_empty_orders_fail_with_division_by_zero() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_input(input.path(), &[], &["Yes,X-1"]);

    let err = ReportPipeline::run(&config_for(input.path(), output.path())).unwrap_err();
    assert!(matches!(err, ReportError::DivisionByZero(_)));
    assert!(!output.path().join("Executive_Report.csv").exists());
}

#[test]
fn test_missing_returns_sheet_is_source_unavailable() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_input(input.path(), &[], &[]);
    fs::remove_file(input.path().join("Returns.csv")).unwrap();

    let err = ReportPipeline::run(&config_for(input.path(), output.path())).unwrap_err();
    assert!(matches!(err, ReportError::SourceUnavailable(_)));
}

#[test]
fn test_missing_column_is_schema_mismatch() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    fs::write(input.path().join("Orders.csv"), "Order ID,Order Date\nA,2017-01-01\n").unwrap();
    fs::write(input.path().join("Returns.csv"), "Returned,Order ID\n").unwrap();

    let err = ReportPipeline::run(&config_for(input.path(), output.path())).unwrap_err();
    assert!(matches!(err, ReportError::SchemaMismatch(_)));
}

#[test]
fn test_unparsable_date_is_malformed_date() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_input(
        input.path(),
        &["1,F-1,someday,2017-03-02,Fi,Consumer,East,Newark,Technology,Phones,10,1,0,1"],
        &[],
    );

    let err = ReportPipeline::run(&config_for(input.path(), output.path())).unwrap_err();
    match err {
        ReportError::MalformedDate { column, row, .. } => {
            assert_eq!(column, "Order Date");
            assert_eq!(row, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}
