use std::collections::BTreeMap;
use std::sync::Arc;

use log::{info, warn};

use super::model::{Dataset, FieldKind, FieldValue, Finite, RawRow, Record, Schema};
use crate::error::{SchemaViolation, ViolationKind};

/// Result of normalizing a batch: the records that fit the schema plus one
/// violation per rejected row.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub dataset: Dataset,
    pub rejected: Vec<SchemaViolation>,
}

/// Convert one raw row into a typed [`Record`].
///
/// Categorical cells are copied verbatim. Numeric cells equal to the
/// schema's sentinel become [`FieldValue::Absent`]; everything else must
/// parse to a finite number or the whole row is rejected.
pub fn normalize_row(
    schema: &Schema,
    row: usize,
    raw: &RawRow,
) -> Result<Record, SchemaViolation> {
    let mut values = BTreeMap::new();

    for spec in &schema.fields {
        let violation = |raw_value: Option<&str>, kind| SchemaViolation {
            row,
            id: schema
                .identifier
                .as_ref()
                .and_then(|id| raw.get(id))
                .cloned(),
            field: spec.name.clone(),
            raw: raw_value.map(str::to_string),
            kind,
        };

        let cell = raw
            .get(&spec.name)
            .ok_or_else(|| violation(None, ViolationKind::MissingColumn))?;

        let value = match spec.kind {
            FieldKind::Categorical => FieldValue::Text(cell.clone()),
            FieldKind::Numeric if *cell == schema.missing => FieldValue::Absent,
            FieldKind::Numeric => {
                let number =
                    parse_number(cell).map_err(|kind| violation(Some(cell.as_str()), kind))?;
                FieldValue::Number(number)
            }
        };
        values.insert(spec.name.clone(), value);
    }

    Ok(Record::new(values))
}

fn parse_number(cell: &str) -> Result<Finite, ViolationKind> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Err(ViolationKind::Empty);
    }
    let value: f64 = trimmed.parse().map_err(|_| ViolationKind::NotANumber)?;
    Finite::new(value).ok_or(ViolationKind::NonFinite)
}

/// Normalize every row, collecting violations instead of stopping at the
/// first bad row.
pub fn normalize_rows(schema: Arc<Schema>, rows: &[RawRow]) -> Normalized {
    let mut records = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for (i, raw) in rows.iter().enumerate() {
        match normalize_row(&schema, i, raw) {
            Ok(record) => records.push(record),
            Err(violation) => {
                warn!("dropping {violation}");
                rejected.push(violation);
            }
        }
    }

    info!(
        "normalized {} rows ({} rejected)",
        records.len(),
        rejected.len()
    );

    Normalized {
        dataset: Dataset::new(schema, records),
        rejected,
    }
}
