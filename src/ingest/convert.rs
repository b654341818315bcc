// src/ingest/convert.rs

use anyhow::Result;
use arrow::{
    array::{ArrayRef, Float64Builder, Int64Builder, StringBuilder},
    datatypes::{DataType, SchemaRef},
    record_batch::RecordBatch,
};
use csv::StringRecord;
use std::sync::Arc;

use crate::error::IngestError;
use crate::schema::is_null_token;

/// Convert raw CSV records into a `RecordBatch` with the given (already inferred) schema.
///
/// Missing trailing fields and null tokens become nulls. `first_row` is the file-level index of
/// `records[0]`, used only for error reporting.
pub fn records_to_batch(
    table_name: &str,
    schema: &SchemaRef,
    records: &[StringRecord],
    first_row: usize,
) -> Result<RecordBatch> {
    let width = schema.fields().len();
    if let Some((offset, r)) = records.iter().enumerate().find(|(_, r)| r.len() > width) {
        return Err(IngestError::RowWidth {
            table: table_name.to_string(),
            row: first_row + offset,
            found: r.len(),
            expected: width,
        }
        .into());
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(width);

    for (idx, field) in schema.fields().iter().enumerate() {
        let cells = records
            .iter()
            .map(|r| r.get(idx).filter(|v| !is_null_token(v)));

        let coercion = |offset: usize, value: &str| IngestError::Coercion {
            table: table_name.to_string(),
            column: field.name().clone(),
            row: first_row + offset,
            value: value.to_string(),
            expected: "number",
        };

        let array: ArrayRef = match field.data_type() {
            DataType::Int64 => {
                let mut b = Int64Builder::with_capacity(records.len());
                for (offset, cell) in cells.enumerate() {
                    match cell {
                        None => b.append_null(),
                        Some(v) => b.append_value(
                            v.trim().parse().map_err(|_| coercion(offset, v))?,
                        ),
                    }
                }
                Arc::new(b.finish())
            }
            DataType::Float64 => {
                let mut b = Float64Builder::with_capacity(records.len());
                for (offset, cell) in cells.enumerate() {
                    match cell {
                        None => b.append_null(),
                        Some(v) => b.append_value(
                            v.trim().parse().map_err(|_| coercion(offset, v))?,
                        ),
                    }
                }
                Arc::new(b.finish())
            }
            DataType::Utf8 => {
                let mut b = StringBuilder::with_capacity(records.len(), records.len() * 16);
                for cell in cells {
                    b.append_option(cell);
                }
                Arc::new(b.finish())
            }
            other => {
                return Err(IngestError::UnsupportedType {
                    column: field.name().clone(),
                    data_type: other.to_string(),
                }
                .into())
            }
        };
        columns.push(array);
    }

    RecordBatch::try_new(schema.clone(), columns).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("Brand", DataType::Int64, true),
            Field::new("Price", DataType::Float64, true),
            Field::new("Description", DataType::Utf8, true),
        ]))
    }

    #[test]
    fn pads_short_rows_and_types_cells() -> Result<()> {
        let records = vec![
            StringRecord::from(vec!["58", "3"]),
            StringRecord::from(vec!["", "NaN", " Gin "]),
        ];
        let batch = records_to_batch("t", &schema(), &records, 0)?;
        assert_eq!(batch.num_rows(), 2);

        let brand = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(brand.value(0), 58);
        assert!(brand.is_null(1));

        let price = batch.column(1).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(price.value(0), 3.0);
        assert!(price.is_null(1));

        let desc = batch.column(2).as_any().downcast_ref::<StringArray>().unwrap();
        assert!(desc.is_null(0));
        // text keeps its surrounding whitespace
        assert_eq!(desc.value(1), " Gin ");
        Ok(())
    }

    #[test]
    fn reports_coercion_with_file_row() {
        let records = vec![StringRecord::from(vec!["lots", "1", "x"])];
        let err = records_to_batch("purchases", &schema(), &records, 40).unwrap_err();
        match err.downcast_ref::<IngestError>() {
            Some(IngestError::Coercion { column, row, .. }) => {
                assert_eq!(column, "Brand");
                assert_eq!(*row, 40);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn rejects_wide_rows() {
        let records = vec![StringRecord::from(vec!["1", "2", "x", "extra"])];
        let err = records_to_batch("t", &schema(), &records, 3).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IngestError>(),
            Some(IngestError::RowWidth { row: 3, found: 4, .. })
        ));
    }
}
