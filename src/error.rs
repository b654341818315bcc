// src/error.rs

use thiserror::Error;

/// Failures raised at the store/ingestion seam.
///
/// Everything else (I/O, CSV parsing, DuckDB) travels as `anyhow::Error` with context attached.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("unknown write mode `{0}` (expected replace, append or fail)")]
    InvalidWriteMode(String),

    #[error("table `{0}` already exists")]
    TableExists(String),

    #[error("table `{table}` has columns {existing:?}, batch has {incoming:?}")]
    SchemaMismatch {
        table: String,
        existing: Vec<String>,
        incoming: Vec<String>,
    },

    #[error("`{table}`.`{column}` row {row}: cannot store {value:?} as {expected}")]
    Coercion {
        table: String,
        column: String,
        row: usize,
        value: String,
        expected: &'static str,
    },

    #[error("column `{column}` has type {data_type}, which the store cannot hold")]
    UnsupportedType { column: String, data_type: String },

    #[error("`{table}`: row {row} has {found} fields, header has {expected}")]
    RowWidth {
        table: String,
        row: usize,
        found: usize,
        expected: usize,
    },
}
