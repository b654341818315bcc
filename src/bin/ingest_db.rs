use anyhow::Result;
use vendorperf::{ingest, logging, Settings, Store};

fn main() -> Result<()> {
    let settings = Settings::default();
    logging::init_file_logging(&settings.log_dir, "ingestion_db.log")?;

    let store = Store::open(&settings.db_path)?;
    ingest::load_raw_data(&settings, &store)?;
    store.close()
}
