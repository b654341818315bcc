// src/logging.rs

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::Mutex,
};
use tracing::Subscriber;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "debug";

/// Route `tracing` output to `<log_dir>/<file_name>`, opened in append mode.
///
/// `RUST_LOG` overrides the default `debug` filter. Calling this twice in one process is a no-op.
pub fn init_file_logging(log_dir: &Path, file_name: &str) -> Result<()> {
    let subscriber = file_subscriber(log_dir, file_name)?;
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}

fn file_subscriber(log_dir: &Path, file_name: &str) -> Result<impl Subscriber + Send + Sync> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {:?}", log_dir))?;
    let path = log_dir.join(file_name);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {:?}", path))?;

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    Ok(fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish())
}
