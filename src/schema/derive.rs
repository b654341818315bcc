// src/schema/derive.rs

use anyhow::{anyhow, Result};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use csv::StringRecord;
use std::sync::Arc;
use tracing::debug;

use crate::error::IngestError;

/// Cell spellings read as missing values.
const NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null", "None"];

pub fn is_null_token(raw: &str) -> bool {
    NULL_TOKENS.contains(&raw.trim())
}

/// Infer Arrow dtype from a single non-null cell.
pub fn infer_arrow_dtype_from_str(raw: &str) -> DataType {
    let v = raw.trim();
    if v.parse::<i64>().is_ok() {
        DataType::Int64
    } else if v.parse::<f64>().is_ok() {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}

/// Smallest dtype holding values of both `a` and `b`. `Null` means "nothing seen yet".
pub fn widen(a: &DataType, b: &DataType) -> DataType {
    match (a, b) {
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),
        (DataType::Utf8, _) | (_, DataType::Utf8) => DataType::Utf8,
        (DataType::Float64, _) | (_, DataType::Float64) => DataType::Float64,
        (DataType::Int64, DataType::Int64) => DataType::Int64,
        _ => DataType::Utf8,
    }
}

/// Running type inference over every record of a source, one column type per header.
///
/// Every record is observed before anything is written, so the resulting schema does not depend
/// on how the source is later split into batches:
///  - all non-null cells parse as i64 ⇒ Int64
///  - all parse as f64 ⇒ Float64
///  - anything else ⇒ Utf8
///  - no non-null cells at all ⇒ Float64 (an all-missing column stays numeric)
pub struct SchemaScan {
    table_name: String,
    headers: Vec<String>,
    types: Vec<DataType>,
    rows: usize,
}

impl SchemaScan {
    pub fn new(table_name: &str, header_names: &[String]) -> Result<Self> {
        if header_names.is_empty() {
            return Err(anyhow!("schema scan: `{}` has no headers", table_name));
        }

        let mut headers = Vec::with_capacity(header_names.len());
        for (idx, raw_name) in header_names.iter().enumerate() {
            // Strip all leading/trailing whitespace (spaces, tabs, \r, \n, etc.)
            let col_name = raw_name.trim();
            if col_name.is_empty() {
                return Err(anyhow!(
                    "schema scan: header at index {} in `{}` is empty after trimming",
                    idx,
                    table_name
                ));
            }
            headers.push(col_name.to_string());
        }

        Ok(Self {
            table_name: table_name.to_string(),
            types: vec![DataType::Null; headers.len()],
            headers,
            rows: 0,
        })
    }

    /// Fold one record into the column types. Records wider than the header are rejected.
    pub fn observe(&mut self, record: &StringRecord) -> Result<(), IngestError> {
        if record.len() > self.headers.len() {
            return Err(IngestError::RowWidth {
                table: self.table_name.clone(),
                row: self.rows,
                found: record.len(),
                expected: self.headers.len(),
            });
        }
        for (ty, cell) in self.types.iter_mut().zip(record.iter()) {
            if *ty == DataType::Utf8 || is_null_token(cell) {
                continue;
            }
            *ty = widen(ty, &infer_arrow_dtype_from_str(cell));
        }
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(self) -> SchemaRef {
        let fields: Vec<Field> = self
            .headers
            .iter()
            .zip(self.types)
            .map(|(name, ty)| {
                let ty = if ty == DataType::Null {
                    debug!(
                        "schema scan: no samples for `{}` in `{}`, defaulting to float",
                        name, self.table_name
                    );
                    DataType::Float64
                } else {
                    ty
                };
                Field::new(name, ty, /* nullable = */ true)
            })
            .collect();
        Arc::new(Schema::new(fields))
    }
}
