use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::warn;

use rusty_autos::config::PipelineConfig;
use rusty_autos::data::aggregate::{GroupOrder, GroupSpec, Reduction};
use rusty_autos::data::filter::{Criteria, Selection};
use rusty_autos::data::source::load_file;
use rusty_autos::pipeline::{chart_input, prepare, ChartRequest, PointSpec};

/// Prepare the cars dataset for a chart and print it as JSON.
#[derive(Parser, Debug)]
#[command(version, about = "rusty-autos")]
struct Args {
    /// Data file (.csv, .json or .parquet)
    path: PathBuf,

    /// JSON file describing the schema and required fields
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Keep records where FIELD equals VALUE ("all" for no constraint)
    #[arg(long = "filter", value_name = "FIELD=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, Selection)>,

    /// Required numeric field; replaces the configured set when given
    #[arg(long = "require", value_name = "FIELD")]
    required: Vec<String>,

    /// Field whose distinct values should be listed
    #[arg(long = "facet", value_name = "FIELD")]
    facets: Vec<String>,

    /// Group by this field (repeat once for a two-level grouping)
    #[arg(long = "group-by", value_name = "FIELD")]
    group_by: Vec<String>,

    /// Average this numeric field within each group
    #[arg(long = "mean", value_name = "FIELD", conflicts_with = "count")]
    mean: Option<String>,

    /// Count records within each group
    #[arg(long = "count", action)]
    count: bool,

    /// Sort groups by key instead of first appearance
    #[arg(long = "sorted", action)]
    sorted: bool,

    /// Project points onto X,Y[,SIZE]
    #[arg(long = "points", value_name = "X,Y[,SIZE]", value_delimiter = ',')]
    points: Vec<String>,

    /// Pretty-print the JSON output
    #[arg(long = "pretty", action)]
    pretty: bool,
}

fn parse_filter(raw: &str) -> Result<(String, Selection), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    if field.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((field.to_string(), Selection::parse(value)))
}

fn build_request(args: &Args, config: &PipelineConfig) -> Result<ChartRequest> {
    let schema = &config.schema;

    let criteria = Criteria::build(schema, args.filters.iter().cloned())
        .context("invalid --filter")?;

    let groups = if args.group_by.is_empty() {
        if args.mean.is_some() || args.count {
            bail!("--mean/--count need at least one --group-by");
        }
        None
    } else {
        let reduction = match &args.mean {
            Some(field) => Reduction::Mean(field.clone()),
            None => Reduction::Count,
        };
        let mut spec = GroupSpec::new(schema, &args.group_by, reduction)
            .context("invalid grouping")?;
        if args.sorted {
            spec = spec.with_order(GroupOrder::sorted());
        }
        Some(spec)
    };

    let points = match args.points.as_slice() {
        [] => None,
        [x, y] => Some(PointSpec::new(schema, x, y, None)?),
        [x, y, size] => Some(PointSpec::new(schema, x, y, Some(size.as_str()))?),
        other => bail!("--points takes 2 or 3 fields, got {}", other.len()),
    };

    Ok(ChartRequest {
        criteria,
        facet_fields: args.facets.clone(),
        groups,
        points,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if !args.required.is_empty() {
        config.required = args.required.clone();
        config.validate().context("invalid --require")?;
    }

    let request = build_request(&args, &config)?;

    let rows = load_file(&args.path, &config.schema.missing)
        .with_context(|| format!("loading {}", args.path.display()))?;
    let prepared = prepare(&config, &rows);
    if prepared.dataset.is_empty() {
        warn!("no valid records in {}", args.path.display());
    }

    let input = chart_input(&prepared, &request);
    let json = if args.pretty {
        serde_json::to_string_pretty(&input)?
    } else {
        serde_json::to_string(&input)?
    };
    println!("{json}");
    Ok(())
}
