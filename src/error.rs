use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Source errors – the raw rows could not be obtained
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a top-level JSON array of objects")]
    NotAnArray,
    #[error("JSON row {0} is not an object")]
    RowNotObject(usize),
    #[error("unreadable parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("cannot convert column to text: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}

// ---------------------------------------------------------------------------
// Schema violations – one raw row does not fit the declared schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    MissingColumn,
    Empty,
    NotANumber,
    NonFinite,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ViolationKind::MissingColumn => "column missing from row",
            ViolationKind::Empty => "empty numeric cell",
            ViolationKind::NotANumber => "not a number",
            ViolationKind::NonFinite => "number is not finite",
        };
        f.write_str(text)
    }
}

/// A raw row rejected by the normalizer, with enough context to report it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row}{}: field '{field}' {}: {kind}", id_suffix(.id), raw_suffix(.raw))]
pub struct SchemaViolation {
    /// 0-based index of the data row in the source.
    pub row: usize,
    pub id: Option<String>,
    pub field: String,
    pub raw: Option<String>,
    pub kind: ViolationKind,
}

fn id_suffix(id: &Option<String>) -> String {
    id.as_ref().map(|id| format!(" ({id})")).unwrap_or_default()
}

fn raw_suffix(raw: &Option<String>) -> String {
    match raw {
        Some(raw) => format!("= {raw:?}"),
        None => "unset".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Field errors – caller selections that do not fit the schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown field '{0}'")]
    Unknown(String),
    #[error("field '{0}' is not numeric")]
    NotNumeric(String),
    #[error("'{value}' is not a valid value for numeric field '{field}'")]
    InvalidSelection { field: String, value: String },
    #[error("grouping takes one or two key fields, got {0}")]
    KeyArity(usize),
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("field '{0}' is declared twice")]
    DuplicateField(String),
    #[error("identifier '{0}' must be a declared categorical field")]
    BadIdentifier(String),
    #[error("required field '{0}' must be a declared numeric field")]
    BadRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_message_names_row_field_and_value() {
        let err = SchemaViolation {
            row: 4,
            id: Some("amc rebel sst".into()),
            field: "Horsepower".into(),
            raw: Some("abc".into()),
            kind: ViolationKind::NotANumber,
        };
        assert_eq!(
            err.to_string(),
            "row 4 (amc rebel sst): field 'Horsepower' = \"abc\": not a number"
        );
    }

    #[test]
    fn violation_message_for_missing_column() {
        let err = SchemaViolation {
            row: 0,
            id: None,
            field: "MPG".into(),
            raw: None,
            kind: ViolationKind::MissingColumn,
        };
        assert_eq!(
            err.to_string(),
            "row 0: field 'MPG' unset: column missing from row"
        );
    }
}
