use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    Array, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array, Int16Array,
    Int32Array, Int64Array, LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{Row, Table, Value};

// ---------------------------------------------------------------------------
// Format dispatch
// ---------------------------------------------------------------------------

/// Physical encoding of a dataset in object storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Parquet,
}

impl DataFormat {
    /// File extension used both for decoding and for picking part files
    /// out of a partitioned directory listing.
    pub fn extension(self) -> &'static str {
        match self {
            DataFormat::Csv => ".csv",
            DataFormat::Parquet => ".parquet",
        }
    }
}

/// Decode a fetched payload into a [`Table`].
pub fn decode_table(bytes: &[u8], format: DataFormat) -> Result<Table> {
    match format {
        DataFormat::Csv => decode_csv(bytes),
        DataFormat::Parquet => decode_parquet(bytes),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per row. Cell
/// types are guessed per cell (int, float, bool, date, string); empty
/// cells become nulls.
fn decode_csv(bytes: &[u8]) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = Table::new(headers.clone());

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let mut row = Row::new();
        for (col_idx, cell) in record.iter().enumerate() {
            if let Some(name) = headers.get(col_idx) {
                row.insert(name.clone(), guess_cell_type(cell));
            }
        }
        table.rows.push(row);
    }

    Ok(table)
}

fn guess_cell_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    // Spark writes true/false, pandas True/False.
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if looks_like_iso_date(s) {
        return Value::Date(s.to_string());
    }
    Value::Str(s.to_string())
}

/// `YYYY-MM-DD`, optionally followed by a time component.
fn looks_like_iso_date(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() < 10 {
        return false;
    }
    b[0..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
        && (b.len() == 10 || b[10] == b'T' || b[10] == b' ')
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Decode a Parquet payload. Scalar columns only; every batch column is
/// widened into the dynamic [`Value`] space. Works with files written by
/// Spark, Pandas and Polars alike.
fn decode_parquet(bytes: &[u8]) -> Result<Table> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(bytes))
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut table = Table::default();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        if table.columns.is_empty() {
            table.columns = schema.fields().iter().map(|f| f.name().clone()).collect();
        }

        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();

        for row_idx in 0..batch.num_rows() {
            let mut row = Row::new();
            for (col_idx, name) in names.iter().enumerate() {
                let value = extract_value(batch.column(col_idx), row_idx);
                row.insert(name.to_string(), value);
            }
            table.rows.push(row);
        }
    }

    Ok(table)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>().unwrap();
            Value::Str(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => {
            let arr = col.as_any().downcast_ref::<LargeStringArray>().unwrap();
            Value::Str(arr.value(row).to_string())
        }
        DataType::Int16 => {
            let arr = col.as_any().downcast_ref::<Int16Array>().unwrap();
            Value::Int(arr.value(row) as i64)
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            Value::Int(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            Value::Int(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            Value::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            Value::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
            Value::Bool(arr.value(row))
        }
        DataType::Date32 => {
            let arr = col.as_any().downcast_ref::<Date32Array>().unwrap();
            date32_to_value(arr.value(row))
        }
        DataType::Date64 => {
            let arr = col.as_any().downcast_ref::<Date64Array>().unwrap();
            match DateTime::from_timestamp_millis(arr.value(row)) {
                Some(dt) => Value::Date(dt.date_naive().to_string()),
                None => Value::Null,
            }
        }
        other => {
            log::warn!("unsupported parquet column type {other:?}, reading as null");
            Value::Null
        }
    }
}

/// Days since the Unix epoch → ISO date string.
fn date32_to_value(days: i32) -> Value {
    let epoch = DateTime::<Utc>::UNIX_EPOCH.date_naive();
    match epoch.checked_add_signed(TimeDelta::days(days as i64)) {
        Some(date) => Value::Date(date.to_string()),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Date32Array, Float64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    #[test]
    fn csv_cells_get_types_guessed() {
        let bytes = b"company_id,hiring_score,momentum_rank,has_job_postings,name,founded_date\n\
                      c1,71.5,3,true,ACME Corp,2019-05-01\n\
                      c2,,12,False,,\n";
        let table = decode_table(bytes, DataFormat::Csv).unwrap();

        assert_eq!(table.columns.len(), 6);
        assert_eq!(table.len(), 2);

        let first = &table.rows[0];
        assert_eq!(first.str_at("company_id"), Some("c1"));
        assert_eq!(first.f64_at("hiring_score"), Some(71.5));
        assert_eq!(first.i64_at("momentum_rank"), Some(3));
        assert_eq!(first.bool_at("has_job_postings"), Some(true));
        assert_eq!(first.str_at("founded_date"), Some("2019-05-01"));
        assert_eq!(first.get("founded_date"), Some(&Value::Date("2019-05-01".into())));

        let second = &table.rows[1];
        assert_eq!(second.f64_at("hiring_score"), None);
        assert_eq!(second.bool_at("has_job_postings"), Some(false));
        assert_eq!(second.str_at("name"), None);
    }

    #[test]
    fn iso_date_detection_is_narrow() {
        assert!(matches!(guess_cell_type("2024-01-31"), Value::Date(_)));
        assert!(matches!(
            guess_cell_type("2024-01-31T08:00:00"),
            Value::Date(_)
        ));
        assert!(matches!(guess_cell_type("2024-01"), Value::Str(_)));
        assert!(matches!(guess_cell_type("not-a-date"), Value::Str(_)));
        // Plain integers must stay integers even at 8+ digits.
        assert!(matches!(guess_cell_type("20240131"), Value::Int(_)));
    }

    #[test]
    fn parquet_scalar_columns_decode() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("company_id", DataType::Utf8, false),
            Field::new("signal_job_posting", DataType::Float64, true),
            Field::new("ind_ai", DataType::Boolean, true),
            Field::new("founded_date", DataType::Date32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["c1", "c2"])),
                Arc::new(Float64Array::from(vec![Some(88.0), None])),
                Arc::new(BooleanArray::from(vec![Some(true), Some(false)])),
                // 19723 days after 1970-01-01 is 2024-01-01.
                Arc::new(Date32Array::from(vec![Some(19723), None])),
            ],
        )
        .unwrap();

        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = decode_table(&buf, DataFormat::Parquet).unwrap();
        assert_eq!(table.columns, vec![
            "company_id",
            "signal_job_posting",
            "ind_ai",
            "founded_date"
        ]);
        assert_eq!(table.rows[0].f64_at("signal_job_posting"), Some(88.0));
        assert_eq!(table.rows[0].bool_at("ind_ai"), Some(true));
        assert_eq!(table.rows[0].str_at("founded_date"), Some("2024-01-01"));
        assert_eq!(table.rows[1].f64_at("signal_job_posting"), None);
        assert_eq!(table.rows[1].str_at("founded_date"), None);
    }
}
