//! Data layer: typed records, normalization, filtering, facets and grouping.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  source   │  read file → Vec<RawRow>
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ normalize  │  RawRow → Record, sentinel → Absent, bad rows rejected
//!   └───────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  required fields, then per-field criteria → Dataset
//!   └──────────┘
//!        │
//!        ├──────────────┬───────────────┐
//!        ▼              ▼               ▼
//!   ┌─────────┐   ┌───────────┐   ┌──────────┐
//!   │  facet   │   │ aggregate  │   │ project   │
//!   └─────────┘   └───────────┘   └──────────┘
//!   dropdowns       bar / heatmap    scatter / bubble
//! ```

pub mod aggregate;
pub mod facet;
pub mod filter;
pub mod model;
pub mod normalize;
pub mod project;
pub mod source;
