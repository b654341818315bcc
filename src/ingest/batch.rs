// src/ingest/batch.rs

use anyhow::{anyhow, Context, Result};
use arrow::{datatypes::SchemaRef, record_batch::RecordBatch};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::{fs::File, io::Read, path::Path};
use tracing::debug;

use super::convert::records_to_batch;
use crate::schema::SchemaScan;

fn csv_reader<R: Read>(source: R) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // width checks happen downstream, with the table name attached
        .from_reader(source)
}

/// First pass: stream every record of `source` through a `SchemaScan`.
///
/// Memory use is one record; malformed rows surface here, before anything is written.
pub fn scan_schema<R: Read>(source: R, table_name: &str) -> Result<SchemaRef> {
    let mut reader = csv_reader(source);
    let headers: Vec<String> = reader
        .headers()
        .context("CSV header parse error")?
        .iter()
        .map(str::to_string)
        .collect();
    let mut scan = SchemaScan::new(table_name, &headers)?;

    let mut record = StringRecord::new();
    while reader
        .read_record(&mut record)
        .with_context(|| format!("CSV parse error in `{}` at record {}", table_name, scan.rows()))?
    {
        scan.observe(&record)?;
    }
    debug!(table = table_name, rows = scan.rows(), "schema scan done");
    Ok(scan.finish())
}

/// Second pass: streams a CSV source as `RecordBatch`es of at most `chunk_size` rows, all
/// sharing the schema from `scan_schema`.
pub struct CsvBatchReader<R: Read> {
    reader: Reader<R>,
    table_name: String,
    schema: SchemaRef,
    chunk_size: usize,
    rows_read: usize,
    batches: usize,
    done: bool,
}

impl CsvBatchReader<File> {
    /// Scan `path` for its schema, then reopen it for batched reading.
    pub fn from_path(path: &Path, table_name: &str, chunk_size: usize) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let schema = scan_schema(file, table_name)
            .with_context(|| format!("Failed to scan {:?}", path))?;
        let file = File::open(path).with_context(|| format!("Failed to reopen {:?}", path))?;
        Self::with_schema(file, table_name, schema, chunk_size)
    }
}

impl<R: Read> CsvBatchReader<R> {
    pub fn with_schema(
        source: R,
        table_name: &str,
        schema: SchemaRef,
        chunk_size: usize,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(anyhow!("chunk size must be at least 1"));
        }
        let mut reader = csv_reader(source);
        let width = reader.headers().context("CSV header parse error")?.len();
        if width != schema.fields().len() {
            return Err(anyhow!(
                "`{}` header has {} columns, schema has {}",
                table_name,
                width,
                schema.fields().len()
            ));
        }

        Ok(Self {
            reader,
            table_name: table_name.to_string(),
            schema,
            chunk_size,
            rows_read: 0,
            batches: 0,
            done: false,
        })
    }

    /// Next batch in file order; `None` once the source is exhausted.
    ///
    /// A header-only source still yields one empty batch so its table gets created.
    pub fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
        if self.done {
            return Ok(None);
        }

        let mut records: Vec<StringRecord> = Vec::with_capacity(self.chunk_size);
        while records.len() < self.chunk_size {
            let mut record = StringRecord::new();
            let more = self.reader.read_record(&mut record).with_context(|| {
                format!(
                    "CSV parse error in `{}` at record {}",
                    self.table_name,
                    self.rows_read + records.len()
                )
            })?;
            if !more {
                self.done = true;
                break;
            }
            records.push(record);
        }

        if records.is_empty() && self.batches > 0 {
            return Ok(None);
        }

        let batch = records_to_batch(&self.table_name, &self.schema, &records, self.rows_read)?;
        self.rows_read += batch.num_rows();
        self.batches += 1;
        debug!(
            table = %self.table_name,
            batch = self.batches,
            rows = batch.num_rows(),
            "read batch"
        );
        Ok(Some(batch))
    }
}

impl<R: Read> Iterator for CsvBatchReader<R> {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch().transpose()
    }
}
