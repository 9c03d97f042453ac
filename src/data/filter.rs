use std::collections::BTreeMap;

use log::debug;

use super::model::{Dataset, FieldKind, FieldValue, Finite, Record, Schema};
use crate::error::FieldError;

/// Selection string meaning "no constraint on this field".
pub const ALL: &str = "all";

// ---------------------------------------------------------------------------
// Validity filter: drop records missing a required numeric field
// ---------------------------------------------------------------------------

/// Keep records where every `required` field is present. Order is preserved;
/// an empty result is valid.
pub fn retain_complete<S: AsRef<str>>(dataset: &Dataset, required: &[S]) -> Dataset {
    let out = dataset.retain_where(|record| {
        required
            .iter()
            .all(|field| record.get(field.as_ref()).is_present())
    });
    debug!(
        "validity filter kept {} of {} records",
        out.len(),
        dataset.len()
    );
    out
}

// ---------------------------------------------------------------------------
// Criteria: per-field selections, "all" meaning unconstrained
// ---------------------------------------------------------------------------

/// What the caller picked for one field, before typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Value(String),
}

impl Selection {
    /// `"all"` maps to [`Selection::All`], anything else is a value.
    pub fn parse(raw: &str) -> Self {
        if raw == ALL {
            Selection::All
        } else {
            Selection::Value(raw.to_string())
        }
    }
}

/// Typed per-field constraints. Fields set to "all" are not stored, so an
/// empty `Criteria` accepts every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    constraints: BTreeMap<String, FieldValue>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type each selection against `schema` once. Numeric selections are
    /// parsed so `"70"` matches a stored `70.0`.
    pub fn build<I, K>(schema: &Schema, selections: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (K, Selection)>,
        K: AsRef<str>,
    {
        let mut criteria = Criteria::new();
        for (field, selection) in selections {
            criteria.set(schema, field.as_ref(), selection)?;
        }
        Ok(criteria)
    }

    /// Convenience over [`Criteria::build`] for `(field, "value" | "all")` pairs.
    pub fn from_pairs(schema: &Schema, pairs: &[(&str, &str)]) -> Result<Self, FieldError> {
        Self::build(
            schema,
            pairs
                .iter()
                .map(|(field, raw)| (*field, Selection::parse(raw))),
        )
    }

    /// Replace the constraint on `field`.
    pub fn set(
        &mut self,
        schema: &Schema,
        field: &str,
        selection: Selection,
    ) -> Result<(), FieldError> {
        let kind = schema
            .kind_of(field)
            .ok_or_else(|| FieldError::Unknown(field.to_string()))?;

        let raw = match selection {
            Selection::All => {
                self.constraints.remove(field);
                return Ok(());
            }
            Selection::Value(raw) => raw,
        };

        let value = match kind {
            FieldKind::Categorical => FieldValue::Text(raw),
            FieldKind::Numeric => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Finite::new)
                .map(FieldValue::Number)
                .ok_or_else(|| FieldError::InvalidSelection {
                    field: field.to_string(),
                    value: raw.clone(),
                })?,
        };
        self.constraints.insert(field.to_string(), value);
        Ok(())
    }

    /// True when no field is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.constraints.is_empty()
    }

    /// The record passes when it equals every constrained value. Absent
    /// values never match.
    pub fn matches(&self, record: &Record) -> bool {
        self.constraints
            .iter()
            .all(|(field, wanted)| record.get(field) == wanted)
    }
}

/// The records of `dataset` that satisfy `criteria`, in their original order.
pub fn apply(dataset: &Dataset, criteria: &Criteria) -> Dataset {
    if criteria.is_unconstrained() {
        return dataset.clone();
    }
    let out = dataset.retain_where(|record| criteria.matches(record));
    debug!("filtered data points: {} of {}", out.len(), dataset.len());
    out
}
