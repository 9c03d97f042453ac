use serde::Serialize;

use super::model::Dataset;

/// One mark of a scatter or bubble chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub id: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

/// Project records onto `x`/`y` (and optionally `size`), skipping records
/// that lack any requested field.
pub fn project_points(dataset: &Dataset, x: &str, y: &str, size: Option<&str>) -> Vec<Point> {
    dataset
        .iter()
        .filter_map(|record| {
            let size = match size {
                Some(field) => Some(record.number(field)?),
                None => None,
            };
            Some(Point {
                id: dataset.id_of(record).map(str::to_string),
                x: record.number(x)?,
                y: record.number(y)?,
                size,
            })
        })
        .collect()
}

/// `(min, max)` over the present values of `field`, `None` when there are
/// none.
pub fn extent(dataset: &Dataset, field: &str) -> Option<(f64, f64)> {
    dataset
        .iter()
        .filter_map(|record| record.number(field))
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
