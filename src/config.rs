// src/config.rs

use std::path::PathBuf;

/// Run settings shared by the loader and the summarizer.
///
/// There is no config file or CLI surface; the binaries use `Settings::default()`.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory scanned for source files.
    pub data_dir: PathBuf,
    /// DuckDB database file.
    pub db_path: PathBuf,
    /// Directory holding the append-mode log files.
    pub log_dir: PathBuf,
    /// Rows per batch read from a source file and written to the store.
    pub chunk_size: usize,
    /// Source file extension, without the dot.
    pub extension: String,
    /// Output table for the vendor summary.
    pub summary_table: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            db_path: PathBuf::from("inventory.db"),
            log_dir: PathBuf::from("logs"),
            chunk_size: 50_000,
            extension: "csv".into(),
            summary_table: "vendor_sales_summary".into(),
        }
    }
}

impl Settings {
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_chunk_size(mut self, rows: usize) -> Self {
        self.chunk_size = rows;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_layout() {
        let s = Settings::default();
        assert_eq!(s.data_dir, PathBuf::from("data"));
        assert_eq!(s.db_path, PathBuf::from("inventory.db"));
        assert_eq!(s.chunk_size, 50_000);
        assert_eq!(s.extension, "csv");
        assert_eq!(s.summary_table, "vendor_sales_summary");
    }

    #[test]
    fn builders_override_fields() {
        let s = Settings::default()
            .with_data_dir("/tmp/in")
            .with_db_path("/tmp/x.db")
            .with_chunk_size(3);
        assert_eq!(s.data_dir, PathBuf::from("/tmp/in"));
        assert_eq!(s.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(s.chunk_size, 3);
    }
}
