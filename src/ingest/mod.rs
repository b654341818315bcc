// src/ingest/mod.rs

pub mod batch;
pub mod convert;

pub use batch::{scan_schema, CsvBatchReader};

use anyhow::{anyhow, Context, Result};
use glob::{glob, Pattern};
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument};

use crate::config::Settings;
use crate::store::{ingest_db, Store, WriteMode};

/// Rows and batches written for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLoad {
    pub table: String,
    pub rows: usize,
    pub batches: usize,
}

/// Outcome of a full `load_raw_data` run.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub tables: Vec<TableLoad>,
    pub elapsed: Duration,
}

impl LoadReport {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// All regular files in `dir` ending in `.<extension>`, sorted by path.
pub fn discover_sources(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(anyhow!(
            "data dir `{}` does not exist or is not a directory",
            dir.display()
        ));
    }
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(extension)
    );
    let mut files = Vec::new();
    for entry in glob(&pattern).context("invalid glob pattern for source discovery")? {
        let path = entry.context("reading data directory entry")?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Table name for a source file: its file name without the extension.
pub fn table_name_for(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("cannot derive a table name from {:?}", path))
}

/// Stream one file into `table`: the first batch replaces the table, the rest append.
pub fn ingest_file(path: &Path, table: &str, store: &Store, chunk_size: usize) -> Result<TableLoad> {
    let mut reader = CsvBatchReader::from_path(path, table, chunk_size)?;
    let mut load = TableLoad {
        table: table.to_string(),
        rows: 0,
        batches: 0,
    };

    while let Some(batch) = reader.next_batch()? {
        let mode = if load.batches == 0 {
            WriteMode::Replace
        } else {
            WriteMode::Append
        };
        load.rows += ingest_db(&batch, table, store, mode)
            .with_context(|| format!("writing batch {} of {:?}", load.batches, path))?;
        load.batches += 1;
        debug!(table, batch = load.batches, rows = load.rows, "batch written");
    }

    Ok(load)
}

/// Loads every source file under `settings.data_dir` into its own table.
///
/// The first failing file aborts the run; tables written before it stay in the store.
#[instrument(level = "info", skip(settings, store), fields(data_dir = %settings.data_dir.display()))]
pub fn load_raw_data(settings: &Settings, store: &Store) -> Result<LoadReport> {
    let start = Instant::now();
    let mut report = LoadReport::default();

    for path in discover_sources(&settings.data_dir, &settings.extension)? {
        let table = table_name_for(&path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        info!("Ingesting {} into db", file_name);

        let load = ingest_file(&path, &table, store, settings.chunk_size)?;
        info!(table = %load.table, rows = load.rows, batches = load.batches, "ingested");
        report.tables.push(load);
    }

    report.elapsed = start.elapsed();
    info!("----------Ingestion Complete----------");
    info!(
        "Total time taken: {:.3} minutes",
        report.elapsed.as_secs_f64() / 60.0
    );
    Ok(report)
}
