use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

/// One row straight from the source: column name → raw string cell.
pub type RawRow = BTreeMap<String, String>;

/// Default missing-value marker used by the cars data.
pub const DEFAULT_MISSING: &str = "NA";

// ---------------------------------------------------------------------------
// Finite – a number that is never NaN or infinite
// ---------------------------------------------------------------------------

/// An `f64` guaranteed to be finite. `-0.0` is stored as `0.0` so equal
/// numbers always have the same bits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Finite(f64);

impl Finite {
    pub fn new(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Some(Finite(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Eq for Finite {}

impl PartialOrd for Finite {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Finite {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for Finite {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Finite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// FieldValue – a single typed cell of a Record
// ---------------------------------------------------------------------------

/// A normalized cell. Categorical fields are always `Text`; numeric fields
/// are either `Number` or `Absent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Text(String),
    Number(Finite),
    /// Explicit "no data"; distinct from zero.
    Absent,
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// Numbers sort numerically, text lexicographically; mixed kinds never
// occur within one field but still need a total order.
impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use FieldValue::*;
        fn discriminant(v: &FieldValue) -> u8 {
            match v {
                Absent => 0,
                Number(_) => 1,
                Text(_) => 2,
            }
        }
        match (self, other) {
            (Number(a), Number(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Absent => write!(f, "<absent>"),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(n) => serializer.serialize_f64(n.get()),
            FieldValue::Absent => serializer.serialize_none(),
        }
    }
}

impl FieldValue {
    pub fn is_present(&self) -> bool {
        !matches!(self, FieldValue::Absent)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(n.get()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    /// Non-finite input becomes `Absent`.
    fn from(value: f64) -> Self {
        Finite::new(value).map_or(FieldValue::Absent, FieldValue::Number)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Schema – which columns exist and how to type them
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Categorical,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn categorical(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            kind: FieldKind::Categorical,
        }
    }

    pub fn numeric(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            kind: FieldKind::Numeric,
        }
    }
}

fn default_missing() -> String {
    DEFAULT_MISSING.to_string()
}

/// Declared columns plus the missing-value sentinel shared by all numeric
/// columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<FieldSpec>,
    /// Categorical column naming each record (used in error reports).
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default = "default_missing")]
    pub missing: String,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Schema {
            fields,
            identifier: None,
            missing: default_missing(),
        }
    }

    pub fn with_identifier(mut self, name: &str) -> Self {
        self.identifier = Some(name.to_string());
        self
    }

    pub fn with_missing(mut self, sentinel: &str) -> Self {
        self.missing = sentinel.to_string();
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.field(name).map(|f| f.kind)
    }
}

// ---------------------------------------------------------------------------
// Record – one normalized car
// ---------------------------------------------------------------------------

/// A normalized row: field name → typed value, one entry per schema field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(values: BTreeMap<String, FieldValue>) -> Self {
        Record { values }
    }

    /// Value of `field`; unknown fields read as `Absent`.
    pub fn get(&self, field: &str) -> &FieldValue {
        self.values.get(field).unwrap_or(&FieldValue::Absent)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).as_f64()
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).as_str()
    }

    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// Dataset – ordered records sharing one schema
// ---------------------------------------------------------------------------

/// Records in source order. Operations never mutate a dataset; they return
/// a new one sharing the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: Arc<Schema>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(schema: Arc<Schema>, records: Vec<Record>) -> Self {
        Dataset { schema, records }
    }

    pub fn empty(schema: Arc<Schema>) -> Self {
        Dataset::new(schema, Vec::new())
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Identifier of a record, if the schema declares one.
    pub fn id_of<'a>(&self, record: &'a Record) -> Option<&'a str> {
        self.schema
            .identifier
            .as_deref()
            .and_then(|field| record.text(field))
    }

    /// Keep the records for which `keep` holds, preserving order.
    pub fn retain_where<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&Record) -> bool,
    {
        let records = self.records.iter().filter(|r| keep(r)).cloned().collect();
        Dataset::new(Arc::clone(&self.schema), records)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}
