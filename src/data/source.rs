use std::fs::File;
use std::io::Read;
use std::path::Path;

use arrow::array::{Array, AsArray, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::RawRow;
use crate::error::SourceError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read raw rows from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one car per line
/// * `.json`    – `[{ "Car": "...", "MPG": 18, ... }, ...]`
/// * `.parquet` – flat columns of any primitive type
///
/// Every cell comes back as a string; JSON and Parquet nulls become
/// `missing` so the normalizer treats them like the CSV sentinel.
pub fn load_file(path: &Path, missing: &str) -> Result<Vec<RawRow>, SourceError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => read_csv(open(path)?),
        "json" => load_json(path, missing),
        "parquet" | "pq" => load_parquet(path, missing),
        other => Err(SourceError::UnsupportedFormat(other.to_string())),
    }?;

    info!("loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn open(path: &Path) -> Result<File, SourceError> {
    File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Read CSV with a header row from any reader (file, stdin, embedded text).
///
/// Ragged rows are kept: a short row lacks its trailing columns and is
/// rejected per row by the normalizer, extra cells past the header are
/// ignored.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RawRow>, SourceError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), cell.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn load_json(path: &Path, missing: &str) -> Result<Vec<RawRow>, SourceError> {
    let mut text = String::new();
    open(path)?
        .read_to_string(&mut text)
        .map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_json(&text, missing)
}

/// Parse a records-oriented JSON array into raw rows.
pub fn parse_json(text: &str, missing: &str) -> Result<Vec<RawRow>, SourceError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root.as_array().ok_or(SourceError::NotAnArray)?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec.as_object().ok_or(SourceError::RowNotObject(i))?;
            Ok(obj
                .iter()
                .map(|(key, val)| (key.clone(), json_cell(val, missing)))
                .collect())
        })
        .collect()
}

fn json_cell(val: &JsonValue, missing: &str) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => missing.to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

fn load_parquet(path: &Path, missing: &str) -> Result<Vec<RawRow>, SourceError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?;
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();

        // Cast every column to text up front; nulls survive the cast.
        let columns: Vec<StringArray> = batch
            .columns()
            .iter()
            .map(|col| Ok(cast(col, &DataType::Utf8)?.as_string::<i32>().clone()))
            .collect::<Result<_, ArrowError>>()?;

        for row in 0..batch.num_rows() {
            let raw: RawRow = schema
                .fields()
                .iter()
                .zip(&columns)
                .map(|(field, col)| {
                    let cell = if col.is_null(row) {
                        missing.to_string()
                    } else {
                        col.value(row).to_string()
                    };
                    (field.name().clone(), cell)
                })
                .collect();
            rows.push(raw);
        }
    }
    Ok(rows)
}
