// src/store/mod.rs

pub mod mode;

pub use mode::WriteMode;

use anyhow::{Context, Result};
use arrow::{
    datatypes::{DataType, Schema},
    record_batch::RecordBatch,
};
use duckdb::{params, Connection};
use std::path::Path;
use tracing::debug;

use crate::error::IngestError;

/// Handle on the DuckDB database shared by every step of a run.
///
/// The connection is released on `close` (or on drop).
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open a DuckDB database on disk at `path`, creating the file if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("opening DuckDB database {:?}", path))?;
        debug!(db = %path.display(), "opened store");
        Ok(Self { conn })
    }

    /// Open a DuckDB in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("opening in-memory DuckDB")?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Release the connection, surfacing any error DuckDB reports while closing.
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .context("closing store")
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let n: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE lower(table_name) = lower(?)",
                params![table],
                |r| r.get(0),
            )
            .with_context(|| format!("looking up table `{}`", table))?;
        Ok(n > 0)
    }

    /// Column names of `table` in declaration order; empty when the table is absent.
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT column_name FROM information_schema.columns \
             WHERE lower(table_name) = lower(?) ORDER BY ordinal_position",
        )?;
        let names = stmt
            .query_map(params![table], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("reading columns of `{}`", table))?;
        Ok(names)
    }

    pub fn row_count(&self, table: &str) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
                [],
                |r| r.get(0),
            )
            .with_context(|| format!("counting rows of `{}`", table))?;
        Ok(n as u64)
    }

    pub fn drop_table(&self, table: &str) -> Result<()> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_ident(table)))
            .with_context(|| format!("dropping table `{}`", table))
    }

    pub fn create_table(&self, table: &str, schema: &Schema) -> Result<()> {
        let sql = create_table_sql(table, schema)?;
        debug!(table, sql = %sql, "creating table");
        self.conn
            .execute_batch(&sql)
            .with_context(|| format!("creating table `{}`", table))
    }

    /// Append `batch` to `table` through DuckDB's Arrow appender, preserving row order.
    pub fn append_batch(&self, table: &str, batch: &RecordBatch) -> Result<usize> {
        if batch.num_rows() == 0 {
            return Ok(0);
        }
        let mut appender = self
            .conn
            .appender(table)
            .with_context(|| format!("opening appender on `{}`", table))?;
        appender
            .append_record_batch(batch.clone())
            .with_context(|| format!("appending batch to `{}`", table))?;
        appender
            .flush()
            .with_context(|| format!("flushing appender on `{}`", table))?;
        Ok(batch.num_rows())
    }
}

/// Double-quote an identifier for DuckDB.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// DuckDB column type for an Arrow dtype.
fn sql_type(dt: &DataType) -> Option<&'static str> {
    Some(match dt {
        DataType::Boolean => "BOOLEAN",
        DataType::Int8 => "TINYINT",
        DataType::Int16 => "SMALLINT",
        DataType::Int32 => "INTEGER",
        DataType::Int64 => "BIGINT",
        DataType::UInt8 => "UTINYINT",
        DataType::UInt16 => "USMALLINT",
        DataType::UInt32 => "UINTEGER",
        DataType::UInt64 => "UBIGINT",
        DataType::Float32 => "FLOAT",
        DataType::Float64 => "DOUBLE",
        DataType::Utf8 | DataType::LargeUtf8 => "VARCHAR",
        _ => return None,
    })
}

fn create_table_sql(table: &str, schema: &Schema) -> Result<String> {
    let mut cols = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let ty = sql_type(field.data_type()).ok_or_else(|| IngestError::UnsupportedType {
            column: field.name().clone(),
            data_type: field.data_type().to_string(),
        })?;
        cols.push(format!("{} {}", quote_ident(field.name()), ty));
    }
    Ok(format!(
        "CREATE TABLE {} ({});",
        quote_ident(table),
        cols.join(", ")
    ))
}

/// Write `data` into `table_name` following `if_exists`.
///
/// - `Replace`: drop the table if present, recreate it from the batch schema, insert.
/// - `Append`: create the table if absent; otherwise column names must line up.
/// - `Fail`: error if the table exists, else create and insert.
///
/// Returns the number of rows written.
pub fn ingest_db(
    data: &RecordBatch,
    table_name: &str,
    store: &Store,
    if_exists: WriteMode,
) -> Result<usize> {
    let exists = store.table_exists(table_name)?;
    let schema = data.schema();

    match (if_exists, exists) {
        (WriteMode::Fail, true) => {
            return Err(IngestError::TableExists(table_name.to_string()).into());
        }
        (WriteMode::Replace, true) => {
            store.drop_table(table_name)?;
            store.create_table(table_name, &schema)?;
        }
        (WriteMode::Append, true) => {
            let existing = store.table_columns(table_name)?;
            let incoming: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
            let same = existing.len() == incoming.len()
                && existing
                    .iter()
                    .zip(&incoming)
                    .all(|(a, b)| a.eq_ignore_ascii_case(b));
            if !same {
                return Err(IngestError::SchemaMismatch {
                    table: table_name.to_string(),
                    existing,
                    incoming,
                }
                .into());
            }
        }
        (_, false) => store.create_table(table_name, &schema)?,
    }

    let written = store.append_batch(table_name, data)?;
    debug!(table = table_name, mode = %if_exists, rows = written, "ingested batch");
    Ok(written)
}
