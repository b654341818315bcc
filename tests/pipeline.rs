//! End-to-end: raw CSV files → DuckDB tables → vendor_sales_summary.

use anyhow::Result;
use std::{fs, path::Path};
use tempfile::tempdir;
use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use vendorperf::{ingest, summary, Settings, Store};

fn write_sources(dir: &Path) -> Result<()> {
    fs::write(
        dir.join("purchases.csv"),
        "InventoryId,Store,Brand,Description,Size,VendorNumber,VendorName,PONumber,PurchasePrice,Quantity,Dollars\n\
         1_A_1,1,1001,Bourbon Small Batch  ,750mL,1,   NORTHWIND SPIRITS ,8124,10.00,10,100.00\n\
         2_A_2,1,1002,Dry Gin,750mL,1,NORTHWIND SPIRITS,8125,5.00,4,20.00\n\
         3_A_3,2,1003,House Red,1.5L,2,CONTOSO WINES,8126,0,50,0\n\
         4_A_4,2,1004,Rosé,750mL,2,CONTOSO WINES,8127,7.50,2,15.00\n",
    )?;
    fs::write(
        dir.join("purchase_prices.csv"),
        "Brand,Description,Price,Size,Volume,Classification,PurchasePrice,VendorNumber,VendorName\n\
         1001,Bourbon Small Batch,12.00,750mL,750,1,10.00,1,NORTHWIND SPIRITS\n\
         1002,Dry Gin,7.99,750mL,750,1,5.00,1,NORTHWIND SPIRITS\n\
         1003,House Red,9.99,1.5L,1500,2,0,2,CONTOSO WINES\n\
         1004,Rosé,11.49,750mL,750,2,7.50,2,CONTOSO WINES\n",
    )?;
    fs::write(
        dir.join("sales.csv"),
        "InventoryId,Store,Brand,Description,SalesQuantity,SalesDollars,SalesPrice,SalesDate,Volume,Classification,ExciseTax,VendorNo,VendorName\n\
         1_A_1,1,1001,Bourbon Small Batch,5,60.00,12.00,2024-01-02,750,1,0.40,1,NORTHWIND SPIRITS\n\
         1_A_1,1,1001,Bourbon Small Batch,3,60.00,20.00,2024-01-03,750,1,0.39,1,NORTHWIND SPIRITS\n\
         2_A_2,1,1002,Dry Gin,1,7.99,7.99,2024-01-03,750,1,0.08,1,NORTHWIND SPIRITS\n",
    )?;
    fs::write(
        dir.join("vendor_invoice.csv"),
        "VendorNumber,VendorName,InvoiceDate,PONumber,PODate,PayDate,Quantity,Dollars,Freight,Approval\n\
         1,NORTHWIND SPIRITS,2024-01-04,8124,2023-12-21,2024-02-16,10,100.00,3.00,None\n\
         1,NORTHWIND SPIRITS,2024-01-05,8125,2023-12-22,2024-02-17,4,20.00,2.00,None\n",
    )?;
    Ok(())
}

fn row_of(batch: &RecordBatch, brand: i64) -> usize {
    let brands = batch.column_by_name("Brand").unwrap();
    let brands = brands.as_any().downcast_ref::<Int64Array>().unwrap();
    brands
        .iter()
        .position(|b| b == Some(brand))
        .unwrap_or_else(|| panic!("no row for brand {}", brand))
}

fn float(batch: &RecordBatch, name: &str, row: usize) -> f64 {
    let col = batch.column_by_name(name).unwrap();
    col.as_any().downcast_ref::<Float64Array>().unwrap().value(row)
}

fn text(batch: &RecordBatch, name: &str, row: usize) -> String {
    let col = batch.column_by_name(name).unwrap();
    col.as_any()
        .downcast_ref::<StringArray>()
        .unwrap()
        .value(row)
        .to_string()
}

#[test]
fn ingest_then_summarize() -> Result<()> {
    let dir = tempdir()?;
    let data_dir = dir.path().join("data");
    fs::create_dir(&data_dir)?;
    write_sources(&data_dir)?;

    let settings = Settings::default()
        .with_data_dir(&data_dir)
        .with_db_path(dir.path().join("inventory.db"))
        .with_chunk_size(2);

    let store = Store::open(&settings.db_path)?;
    let report = ingest::load_raw_data(&settings, &store)?;
    assert_eq!(report.tables.len(), 4);
    assert_eq!(store.row_count("purchases")?, 4);
    assert_eq!(store.row_count("sales")?, 3);

    let rows = summary::create_vendor_summary(&store)?;
    // the zero-price purchase is filtered out
    assert_eq!(rows.num_rows(), 3);
    let brands = rows.column_by_name("Brand").unwrap();
    let brands = brands.as_any().downcast_ref::<Int64Array>().unwrap();
    assert!(brands.iter().all(|b| b != Some(1003)));

    let cleaned = summary::clean_data(&rows)?;
    let bourbon = row_of(&cleaned, 1001);
    assert_eq!(text(&cleaned, "VendorName", bourbon), "NORTHWIND SPIRITS");
    assert_eq!(text(&cleaned, "Description", bourbon), "Bourbon Small Batch");
    assert_eq!(float(&cleaned, "Volume", bourbon), 750.0);
    assert_eq!(float(&cleaned, "TotalPurchaseDollars", bourbon), 100.0);
    assert_eq!(float(&cleaned, "TotalSalesDollars", bourbon), 120.0);
    assert_eq!(float(&cleaned, "FreightCost", bourbon), 5.0);
    assert_eq!(float(&cleaned, "GrossProfit", bourbon), 20.0);
    assert!((float(&cleaned, "ProfitMargin", bourbon) - 16.67).abs() < 0.01);
    assert!((float(&cleaned, "StockTurnOver", bourbon) - 80.0).abs() < 1e-9);
    assert!((float(&cleaned, "SalesToPurchaseRatio", bourbon) - 1.2).abs() < 1e-9);

    let rose = row_of(&cleaned, 1004);
    assert_eq!(float(&cleaned, "TotalSalesDollars", rose), 0.0);
    assert_eq!(float(&cleaned, "TotalSalesQuantity", rose), 0.0);
    assert_eq!(float(&cleaned, "FreightCost", rose), 0.0);
    assert_eq!(float(&cleaned, "GrossProfit", rose), -15.0);

    let written = summary::build_vendor_summary(&settings, &store)?;
    assert_eq!(written, 3);
    store.close()?;

    // the summary survives the handle being closed and reopened
    let store = Store::open(&settings.db_path)?;
    assert_eq!(store.row_count(&settings.summary_table)?, 3);
    let top: f64 = store.connection().query_row(
        "SELECT TotalPurchaseDollars FROM vendor_sales_summary LIMIT 1",
        [],
        |r| r.get(0),
    )?;
    assert_eq!(top, 100.0);
    store.close()?;
    Ok(())
}

#[test]
fn reingesting_replaces_raw_tables() -> Result<()> {
    let dir = tempdir()?;
    write_sources(dir.path())?;
    let settings = Settings::default()
        .with_data_dir(dir.path())
        .with_chunk_size(1);
    let store = Store::open_in_memory()?;

    ingest::load_raw_data(&settings, &store)?;
    ingest::load_raw_data(&settings, &store)?;
    assert_eq!(store.row_count("purchases")?, 4);
    assert_eq!(store.row_count("vendor_invoice")?, 2);
    Ok(())
}
