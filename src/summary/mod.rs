// src/summary/mod.rs

pub mod clean;

pub use clean::clean_data;

use anyhow::{Context, Result};
use arrow::{compute::concat_batches, record_batch::RecordBatch, util::pretty::pretty_format_batches};
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::config::Settings;
use crate::store::{ingest_db, Store, WriteMode};

/// Freight per vendor, purchases per (vendor, brand, price point) and sales per (vendor, brand),
/// joined onto purchases. Purchases with no sales or freight keep null measures.
pub const VENDOR_SUMMARY_SQL: &str = r#"
WITH FreightSummary AS (
    SELECT
        VendorNumber,
        SUM(Freight) AS FreightCost
    FROM vendor_invoice
    GROUP BY VendorNumber
),

PurchaseSummary AS (
    SELECT
        p.VendorNumber,
        p.VendorName,
        p.Brand,
        p.Description,
        p.PurchasePrice,
        pp.Volume,
        pp.Price AS ActualPrice,
        SUM(p.Quantity) AS TotalPurchaseQuantity,
        SUM(p.Dollars) AS TotalPurchaseDollars
    FROM purchases p
    JOIN purchase_prices pp
        ON p.Brand = pp.Brand
    WHERE p.PurchasePrice > 0
    GROUP BY p.VendorNumber, p.VendorName, p.Brand, p.Description, p.PurchasePrice, pp.Price, pp.Volume
),

SalesSummary AS (
    SELECT
        VendorNo,
        Brand,
        SUM(SalesQuantity) AS TotalSalesQuantity,
        SUM(SalesDollars) AS TotalSalesDollars,
        SUM(SalesPrice) AS TotalSalesPrice,
        SUM(ExciseTax) AS TotalExciseTax
    FROM sales
    GROUP BY VendorNo, Brand
)

SELECT
    ps.VendorNumber,
    ps.VendorName,
    ps.Brand,
    ps.Description,
    CAST(ps.PurchasePrice AS DOUBLE) AS PurchasePrice,
    CAST(ps.ActualPrice AS DOUBLE) AS ActualPrice,
    ps.Volume,
    CAST(ps.TotalPurchaseQuantity AS DOUBLE) AS TotalPurchaseQuantity,
    CAST(ps.TotalPurchaseDollars AS DOUBLE) AS TotalPurchaseDollars,
    CAST(ss.TotalSalesQuantity AS DOUBLE) AS TotalSalesQuantity,
    CAST(ss.TotalSalesDollars AS DOUBLE) AS TotalSalesDollars,
    CAST(ss.TotalSalesPrice AS DOUBLE) AS TotalSalesPrice,
    CAST(ss.TotalExciseTax AS DOUBLE) AS TotalExciseTax,
    CAST(fs.FreightCost AS DOUBLE) AS FreightCost
FROM PurchaseSummary ps
LEFT JOIN SalesSummary ss
    ON ps.VendorNumber = ss.VendorNo
    AND ps.Brand = ss.Brand
LEFT JOIN FreightSummary fs
    ON ps.VendorNumber = fs.VendorNumber
ORDER BY ps.TotalPurchaseDollars DESC
"#;

/// Rows logged as a preview after each stage.
const PREVIEW_ROWS: usize = 5;

/// Run the summary query and gather the result into one batch.
///
/// Read-only; the derived columns are added by `clean_data`.
pub fn create_vendor_summary(store: &Store) -> Result<RecordBatch> {
    let mut stmt = store
        .connection()
        .prepare(VENDOR_SUMMARY_SQL)
        .context("preparing vendor summary query")?;

    let result = stmt
        .query_arrow([])
        .context("running vendor summary query")?;
    let schema = result.get_schema();
    let batches: Vec<RecordBatch> = result.collect();
    let summary = concat_batches(&schema, &batches).context("gathering vendor summary batches")?;

    debug!(rows = summary.num_rows(), "vendor summary query returned");
    Ok(summary)
}

fn preview(batch: &RecordBatch) -> String {
    let head = batch.slice(0, batch.num_rows().min(PREVIEW_ROWS));
    match pretty_format_batches(&[head]) {
        Ok(table) => format!("\n{}", table),
        Err(e) => format!("<unprintable preview: {}>", e),
    }
}

/// Query → clean → write `settings.summary_table` (replacing it). Returns the rows written.
#[instrument(level = "info", skip(settings, store), fields(table = %settings.summary_table))]
pub fn build_vendor_summary(settings: &Settings, store: &Store) -> Result<usize> {
    let start = Instant::now();

    info!("Creating Vendor Summary Table......");
    let summary = create_vendor_summary(store)?;
    info!("{}", preview(&summary));

    info!("Cleaning data......");
    let cleaned = clean_data(&summary)?;
    info!("{}", preview(&cleaned));

    info!("Ingesting data......");
    let written = ingest_db(&cleaned, &settings.summary_table, store, WriteMode::Replace)
        .with_context(|| format!("writing `{}`", settings.summary_table))?;
    info!(rows = written, "Completed");

    info!(
        "Total Time taken: {:.3}",
        start.elapsed().as_secs_f64() / 60.0
    );
    Ok(written)
}
