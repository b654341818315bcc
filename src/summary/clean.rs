// src/summary/clean.rs

use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, Int64Array, StringArray},
    compute::{cast, cast_with_options, kernels::arity::binary, CastOptions},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Columns `clean_data` computes; any incoming copies are dropped and recomputed.
pub const DERIVED_COLUMNS: [&str; 4] = [
    "GrossProfit",
    "ProfitMargin",
    "StockTurnOver",
    "SalesToPurchaseRatio",
];

/// Trimmed text columns.
const TEXT_COLUMNS: [&str; 2] = ["VendorName", "Description"];

/// Normalise query output and add the derived performance columns:
///
/// 1. Volume coerced to float (text that is not a number is an error)
/// 2. every null (and NaN) replaced with 0
/// 3. VendorName / Description trimmed
/// 4. GrossProfit = TotalSalesDollars - TotalPurchaseDollars
/// 5. ProfitMargin = GrossProfit / TotalSalesDollars * 100
/// 6. StockTurnOver = TotalSalesQuantity / TotalPurchaseQuantity * 100
/// 7. SalesToPurchaseRatio = TotalSalesDollars / TotalPurchaseDollars
///
/// Zero denominators are not special-cased: the ratios come out as ±inf or NaN.
pub fn clean_data(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = Vec::with_capacity(schema.fields().len() + DERIVED_COLUMNS.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());

    for (field, col) in schema.fields().iter().zip(batch.columns()) {
        let name = field.name().as_str();
        if DERIVED_COLUMNS.contains(&name) {
            continue;
        }

        let col = if name == "Volume" {
            let strict = CastOptions {
                safe: false,
                ..Default::default()
            };
            cast_with_options(col, &DataType::Float64, &strict)
                .with_context(|| format!("Volume column of type {} is not numeric", col.data_type()))?
        } else if TEXT_COLUMNS.contains(&name) {
            cast(col, &DataType::Utf8)?
        } else {
            col.clone()
        };

        let col = fill_nulls(name, &col)?;
        let col = if TEXT_COLUMNS.contains(&name) {
            trim(&col)?
        } else {
            col
        };

        fields.push(field.as_ref().clone().with_data_type(col.data_type().clone()));
        columns.push(col);
    }

    let filled = RecordBatch::try_new(Arc::new(Schema::new(fields.clone())), columns.clone())?;

    let purchase_qty = measure(&filled, "TotalPurchaseQuantity")?;
    let purchase_dollars = measure(&filled, "TotalPurchaseDollars")?;
    let sales_qty = measure(&filled, "TotalSalesQuantity")?;
    let sales_dollars = measure(&filled, "TotalSalesDollars")?;

    let gross_profit: Float64Array = binary(&sales_dollars, &purchase_dollars, |s, p| s - p)?;
    let profit_margin: Float64Array = binary(&gross_profit, &sales_dollars, |g, s| g / s * 100.0)?;
    let stock_turn_over: Float64Array = binary(&sales_qty, &purchase_qty, |s, p| s / p * 100.0)?;
    let sales_to_purchase: Float64Array = binary(&sales_dollars, &purchase_dollars, |s, p| s / p)?;

    let derived: [ArrayRef; 4] = [
        Arc::new(gross_profit),
        Arc::new(profit_margin),
        Arc::new(stock_turn_over),
        Arc::new(sales_to_purchase),
    ];
    for (name, col) in DERIVED_COLUMNS.iter().zip(derived) {
        fields.push(Field::new(*name, DataType::Float64, false));
        columns.push(col);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(Into::into)
}

/// Replace nulls (and NaN) with 0, keeping the column's type.
fn fill_nulls(name: &str, col: &ArrayRef) -> Result<ArrayRef> {
    let filled: ArrayRef = match col.data_type() {
        DataType::Float64 => {
            let arr = downcast::<Float64Array>(name, col)?;
            Arc::new(Float64Array::from_iter_values(arr.iter().map(|v| match v {
                Some(x) if !x.is_nan() => x,
                _ => 0.0,
            })))
        }
        DataType::Int64 => {
            let arr = downcast::<Int64Array>(name, col)?;
            Arc::new(Int64Array::from_iter_values(arr.iter().map(|v| v.unwrap_or(0))))
        }
        DataType::Utf8 => {
            let arr = downcast::<StringArray>(name, col)?;
            Arc::new(StringArray::from_iter_values(
                arr.iter().map(|v| v.unwrap_or("0")),
            ))
        }
        // a column with no values at all
        DataType::Null => Arc::new(Float64Array::from(vec![0.0; col.len()])),
        _ if col.null_count() == 0 => col.clone(),
        other => {
            return Err(anyhow!(
                "cannot fill nulls in `{}` of type {}",
                name,
                other
            ))
        }
    };
    Ok(filled)
}

fn trim(col: &ArrayRef) -> Result<ArrayRef> {
    let arr = downcast::<StringArray>("text", col)?;
    Ok(Arc::new(StringArray::from_iter(
        arr.iter().map(|v| v.map(str::trim)),
    )))
}

fn measure(batch: &RecordBatch, name: &str) -> Result<Float64Array> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("summary has no `{}` column", name))?;
    let col = cast(col, &DataType::Float64)?;
    Ok(downcast::<Float64Array>(name, &col)?.clone())
}

fn downcast<'a, T: 'static>(name: &str, col: &'a ArrayRef) -> Result<&'a T> {
    col.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("`{}` has unexpected type {}", name, col.data_type()))
}
