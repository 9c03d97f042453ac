//! Typed preparation of the cars dataset for chart renderers.
//!
//! Raw string rows are normalized against a [`Schema`](data::model::Schema),
//! filtered, faceted, grouped and projected by pure functions; the result is
//! handed to a renderer as a serializable [`ChartInput`](pipeline::ChartInput).

pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
