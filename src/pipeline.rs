use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::data::aggregate::{aggregate, Group, GroupSpec};
use crate::data::facet::facets;
use crate::data::filter::{apply, retain_complete, Criteria};
use crate::data::model::{Dataset, FieldKind, FieldValue, RawRow, Schema};
use crate::data::normalize::normalize_rows;
use crate::data::project::{extent, project_points, Point};
use crate::error::{FieldError, SchemaViolation};

// ---------------------------------------------------------------------------
// Preparation: raw rows → valid dataset
// ---------------------------------------------------------------------------

/// The valid dataset plus what was dropped on the way.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub dataset: Dataset,
    /// Rows that did not fit the schema.
    pub rejected: Vec<SchemaViolation>,
    /// Normalized records dropped for lacking a required field.
    pub incomplete: usize,
}

/// Normalize `rows` under the config's schema, then drop records missing a
/// required field.
pub fn prepare(config: &PipelineConfig, rows: &[RawRow]) -> Prepared {
    let normalized = normalize_rows(Arc::new(config.schema.clone()), rows);
    let dataset = retain_complete(&normalized.dataset, &config.required);
    let incomplete = normalized.dataset.len() - dataset.len();
    info!(
        "prepared {} records ({} rejected, {} incomplete)",
        dataset.len(),
        normalized.rejected.len(),
        incomplete
    );
    Prepared {
        dataset,
        rejected: normalized.rejected,
        incomplete,
    }
}

// ---------------------------------------------------------------------------
// Chart input: what a renderer needs for one view
// ---------------------------------------------------------------------------

/// Numeric fields for a scatter (`x`, `y`) or bubble (`size`) chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointSpec {
    x: String,
    y: String,
    size: Option<String>,
}

impl PointSpec {
    pub fn new(
        schema: &Schema,
        x: &str,
        y: &str,
        size: Option<&str>,
    ) -> Result<Self, FieldError> {
        for field in [Some(x), Some(y), size].into_iter().flatten() {
            match schema.kind_of(field) {
                Some(FieldKind::Numeric) => {}
                Some(FieldKind::Categorical) => {
                    return Err(FieldError::NotNumeric(field.to_string()))
                }
                None => return Err(FieldError::Unknown(field.to_string())),
            }
        }
        Ok(PointSpec {
            x: x.to_string(),
            y: y.to_string(),
            size: size.map(str::to_string),
        })
    }

    fn fields(&self) -> impl Iterator<Item = &str> {
        [Some(self.x.as_str()), Some(self.y.as_str()), self.size.as_deref()]
            .into_iter()
            .flatten()
    }
}

/// One view's worth of selections.
#[derive(Debug, Clone, Default)]
pub struct ChartRequest {
    pub criteria: Criteria,
    /// Fields whose distinct values populate the filter dropdowns.
    pub facet_fields: Vec<String>,
    pub groups: Option<GroupSpec>,
    pub points: Option<PointSpec>,
}

/// Everything a renderer consumes, ready to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct ChartInput {
    /// Valid records before criteria were applied.
    pub total: usize,
    pub records: Dataset,
    pub facets: BTreeMap<String, Vec<FieldValue>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Point>,
    /// Axis domains for the point fields, omitted when there is no data.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extents: BTreeMap<String, (f64, f64)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,
}

/// Apply the request to a prepared dataset.
///
/// Facets come from the whole valid dataset so dropdowns keep offering every
/// option; groups, points and extents come from the filtered records.
pub fn chart_input(prepared: &Prepared, request: &ChartRequest) -> ChartInput {
    let filtered = apply(&prepared.dataset, &request.criteria);

    let groups = request
        .groups
        .as_ref()
        .map(|spec| aggregate(&filtered, spec))
        .unwrap_or_default();

    let (points, extents) = match &request.points {
        Some(spec) => {
            let points = project_points(&filtered, &spec.x, &spec.y, spec.size.as_deref());
            let extents: BTreeMap<String, (f64, f64)> = spec
                .fields()
                .filter_map(|field| extent(&filtered, field).map(|e| (field.to_string(), e)))
                .collect();
            (points, extents)
        }
        None => (Vec::new(), BTreeMap::new()),
    };

    ChartInput {
        total: prepared.dataset.len(),
        facets: facets(&prepared.dataset, &request.facet_fields),
        records: filtered,
        groups,
        points,
        extents,
        rejected: prepared.rejected.iter().map(ToString::to_string).collect(),
    }
}
