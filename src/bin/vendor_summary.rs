use anyhow::Result;
use vendorperf::{logging, summary, Settings, Store};

fn main() -> Result<()> {
    let settings = Settings::default();
    logging::init_file_logging(&settings.log_dir, "get_vendor_summary.log")?;

    let store = Store::open(&settings.db_path)?;
    summary::build_vendor_summary(&settings, &store)?;
    store.close()
}
