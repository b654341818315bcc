use anyhow::Result;
use tracing::info;
use vendorperf::{ingest, logging, summary, Settings, Store};

/// Full run: ingest every raw file, then rebuild the vendor summary, on one store handle.
fn main() -> Result<()> {
    let settings = Settings::default();
    logging::init_file_logging(&settings.log_dir, "vendorperf.log")?;
    info!("startup");

    let store = Store::open(&settings.db_path)?;

    let report = ingest::load_raw_data(&settings, &store)?;
    info!(
        tables = report.tables.len(),
        rows = report.total_rows(),
        "raw data loaded"
    );

    summary::build_vendor_summary(&settings, &store)?;
    info!(
        rows = store.row_count(&settings.summary_table)?,
        table = %settings.summary_table,
        "summary built"
    );

    store.close()?;
    info!("all done");
    Ok(())
}
