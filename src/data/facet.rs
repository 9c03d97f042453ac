use std::collections::{BTreeMap, BTreeSet};

use super::model::{Dataset, FieldValue};

/// Sorted distinct values of `field`, absent values excluded.
///
/// Numeric fields come back in numeric order, categorical fields in
/// lexicographic order. Unknown fields yield an empty list.
pub fn facet_values(dataset: &Dataset, field: &str) -> Vec<FieldValue> {
    dataset
        .iter()
        .map(|record| record.get(field))
        .filter(|value| value.is_present())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Facets for several fields at once, keyed by field name.
pub fn facets<S: AsRef<str>>(
    dataset: &Dataset,
    fields: &[S],
) -> BTreeMap<String, Vec<FieldValue>> {
    fields
        .iter()
        .map(|field| {
            let field = field.as_ref();
            (field.to_string(), facet_values(dataset, field))
        })
        .collect()
}
