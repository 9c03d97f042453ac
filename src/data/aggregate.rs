use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;
use serde::{Serialize, Serializer};

use super::model::{Dataset, FieldKind, FieldValue, Finite, Record, Schema};
use crate::error::FieldError;

// ---------------------------------------------------------------------------
// Group specification
// ---------------------------------------------------------------------------

/// How each group is reduced to one number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reduction {
    /// Arithmetic mean of a numeric field over records where it is present.
    Mean(String),
    /// Number of records in the group.
    Count,
}

/// Ordering of the groups at one nesting level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyOrder {
    /// Order of first appearance in the dataset.
    #[default]
    FirstSeen,
    Ascending,
    Descending,
}

/// Ordering for outer groups and, in two-level groupings, for the inner
/// groups of each outer group (the tie-break).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupOrder {
    pub outer: KeyOrder,
    pub inner: KeyOrder,
}

impl GroupOrder {
    /// Ascending by the first key, ties broken by the second key ascending.
    pub fn sorted() -> Self {
        GroupOrder {
            outer: KeyOrder::Ascending,
            inner: KeyOrder::Ascending,
        }
    }
}

/// One or two key fields, a reduction and an output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    keys: Vec<String>,
    reduction: Reduction,
    order: GroupOrder,
}

impl GroupSpec {
    /// Check the selectors against `schema`: keys must exist and a mean
    /// needs a numeric value field.
    pub fn new<S: AsRef<str>>(
        schema: &Schema,
        keys: &[S],
        reduction: Reduction,
    ) -> Result<Self, FieldError> {
        if keys.is_empty() || keys.len() > 2 {
            return Err(FieldError::KeyArity(keys.len()));
        }
        let keys: Vec<String> = keys.iter().map(|k| k.as_ref().to_string()).collect();
        for key in &keys {
            if schema.field(key).is_none() {
                return Err(FieldError::Unknown(key.clone()));
            }
        }
        if let Reduction::Mean(field) = &reduction {
            match schema.kind_of(field) {
                None => return Err(FieldError::Unknown(field.clone())),
                Some(FieldKind::Categorical) => return Err(FieldError::NotNumeric(field.clone())),
                Some(FieldKind::Numeric) => {}
            }
        }
        Ok(GroupSpec {
            keys,
            reduction,
            order: GroupOrder::default(),
        })
    }

    pub fn with_order(mut self, order: GroupOrder) -> Self {
        self.order = order;
        self
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn reduction(&self) -> &Reduction {
        &self.reduction
    }

    pub fn order(&self) -> GroupOrder {
        self.order
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The reduced value of a group. `NoData` is never equal to, nor ordered
/// against, any number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Summary {
    Mean(f64),
    Count(usize),
    NoData,
}

impl Summary {
    pub fn value(&self) -> Option<f64> {
        match self {
            Summary::Mean(v) => Some(*v),
            Summary::Count(n) => Some(*n as f64),
            Summary::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Summary::NoData)
    }
}

impl PartialEq<f64> for Summary {
    fn eq(&self, other: &f64) -> bool {
        self.value().is_some_and(|v| v == *other)
    }
}

impl PartialOrd<f64> for Summary {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.value().and_then(|v| v.partial_cmp(other))
    }
}

impl Serialize for Summary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Summary::Mean(v) => serializer.serialize_f64(*v),
            Summary::Count(n) => serializer.serialize_u64(*n as u64),
            Summary::NoData => serializer.serialize_none(),
        }
    }
}

/// One group: its key value, how many records it holds, how many of them
/// carried the aggregated value, and the reduced summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub key: FieldValue,
    pub size: usize,
    pub observations: usize,
    pub summary: Summary,
    /// Groups by the second key, empty for single-key groupings.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subgroups: Vec<Group>,
}

/// A leaf of the grouping with its full key tuple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupRow<'a> {
    pub outer: &'a FieldValue,
    pub inner: Option<&'a FieldValue>,
    pub group: &'a Group,
}

impl Group {
    /// Leaf rows in output order: the inner groups of each outer group, or
    /// the group itself when it has none.
    pub fn flatten(groups: &[Group]) -> Vec<GroupRow<'_>> {
        let mut rows = Vec::new();
        for outer in groups {
            if outer.subgroups.is_empty() {
                rows.push(GroupRow {
                    outer: &outer.key,
                    inner: None,
                    group: outer,
                });
            }
            for inner in &outer.subgroups {
                rows.push(GroupRow {
                    outer: &outer.key,
                    inner: Some(&inner.key),
                    group: inner,
                });
            }
        }
        rows
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Group `dataset` by the spec's keys and reduce each group.
///
/// Records whose key value is absent are left out. Never fails; an empty
/// dataset yields no groups.
pub fn aggregate(dataset: &Dataset, spec: &GroupSpec) -> Vec<Group> {
    let records: Vec<&Record> = dataset.iter().collect();
    let orders = [spec.order.outer, spec.order.inner];
    let groups = group_level(&records, &spec.keys, &orders, &spec.reduction);
    debug!(
        "grouped {} records by {:?} into {} groups",
        records.len(),
        spec.keys,
        groups.len()
    );
    groups
}

fn group_level<'a>(
    records: &[&'a Record],
    keys: &[String],
    orders: &[KeyOrder],
    reduction: &Reduction,
) -> Vec<Group> {
    let (Some((key, rest_keys)), Some((order, rest_orders))) =
        (keys.split_first(), orders.split_first())
    else {
        return Vec::new();
    };

    let mut index: HashMap<&'a FieldValue, usize> = HashMap::new();
    let mut buckets: Vec<(&'a FieldValue, Vec<&'a Record>)> = Vec::new();
    for &record in records {
        let value = record.get(key);
        if !value.is_present() {
            continue;
        }
        let slot = *index.entry(value).or_insert_with(|| {
            buckets.push((value, Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(record);
    }

    let mut groups: Vec<Group> = buckets
        .into_iter()
        .map(|(value, members)| {
            let mut group = summarize(value.clone(), &members, reduction);
            group.subgroups = group_level(&members, rest_keys, rest_orders, reduction);
            group
        })
        .collect();

    match order {
        KeyOrder::FirstSeen => {}
        KeyOrder::Ascending => groups.sort_by(|a, b| key_cmp(&a.key, &b.key)),
        KeyOrder::Descending => groups.sort_by(|a, b| key_cmp(&b.key, &a.key)),
    }
    groups
}

fn summarize(key: FieldValue, members: &[&Record], reduction: &Reduction) -> Group {
    let size = members.len();
    let (observations, summary) = match reduction {
        Reduction::Count => (size, Summary::Count(size)),
        Reduction::Mean(field) => {
            let values: Vec<f64> = members.iter().filter_map(|r| r.number(field)).collect();
            (values.len(), mean(&values))
        }
    };
    Group {
        key,
        size,
        observations,
        summary,
        subgroups: Vec::new(),
    }
}

fn mean(values: &[f64]) -> Summary {
    if values.is_empty() {
        return Summary::NoData;
    }
    let n = values.len() as f64;
    let direct = values.iter().sum::<f64>() / n;
    if direct.is_finite() {
        return Summary::Mean(direct);
    }
    // The plain sum overflowed; scaling each term first keeps it finite.
    let scaled: f64 = values.iter().map(|v| v / n).sum();
    Finite::new(scaled).map_or(Summary::NoData, |m| Summary::Mean(m.get()))
}

/// Numbers and numeric-looking text compare numerically and sort before
/// other text, which compares lexicographically.
fn key_cmp(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (numeric_reading(a), numeric_reading(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn numeric_reading(value: &FieldValue) -> Option<Finite> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(s) => s.trim().parse().ok().and_then(Finite::new),
        FieldValue::Absent => None,
    }
}
