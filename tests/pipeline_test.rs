use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use rusty_autos::config::PipelineConfig;
use rusty_autos::data::aggregate::{aggregate, GroupOrder, GroupSpec, Reduction, Summary};
use rusty_autos::data::facet::facet_values;
use rusty_autos::data::filter::{apply, retain_complete, Criteria};
use rusty_autos::data::model::{Dataset, FieldSpec, FieldValue, Record, Schema};
use rusty_autos::data::normalize::normalize_rows;
use rusty_autos::data::source::load_file;
use rusty_autos::error::ViolationKind;
use rusty_autos::pipeline::{chart_input, prepare, ChartRequest, PointSpec};

const CARS_CSV: &str = "\
Car,Manufacturer,MPG,Cylinders,Displacement,Horsepower,Weight,Acceleration,Model_Year,Origin
chevrolet chevelle malibu,chevrolet,18,8,307,130,3504,12,70,American
buick skylark 320,buick,15,8,350,165,3693,11.5,70,American
toyota corona mark ii,toyota,24,4,113,95,2372,15,70,Japanese
datsun pl510,datsun,27,4,97,88,2130,14.5,70,Japanese
ford pinto,ford,25,4,98,NA,2046,19,71,American
volkswagen super beetle,volkswagen,26,4,97,46,1950,21,73,European
toyota corolla,toyota,32,4,71,65,1836,21,74,Japanese
honda civic,honda,33,4,91,53,1795,17.5,75,Japanese
renault 18i,renault,34.5,4,100,NA,2320,15.8,81,European
ford mustang,ford,?,8,302,140,3449,10.5,70,American
";

fn write_csv(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("a1-cars.csv");
    fs::write(&path, CARS_CSV).unwrap();
    path
}

fn simple_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        FieldSpec::categorical("Manufacturer"),
        FieldSpec::categorical("Origin"),
        FieldSpec::numeric("MPG"),
    ]))
}

fn record(manufacturer: &str, origin: &str, mpg: Option<f64>) -> Record {
    Record::new(BTreeMap::from([
        ("Manufacturer".to_string(), FieldValue::from(manufacturer)),
        ("Origin".to_string(), FieldValue::from(origin)),
        (
            "MPG".to_string(),
            mpg.map_or(FieldValue::Absent, FieldValue::from),
        ),
    ]))
}

#[test]
fn test_csv_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::default();
    let rows = load_file(&write_csv(&dir), &config.schema.missing).unwrap();
    assert_eq!(rows.len(), 10);

    let prepared = prepare(&config, &rows);
    assert_eq!(prepared.rejected.len(), 1);
    assert_eq!(prepared.rejected[0].id.as_deref(), Some("ford mustang"));
    assert_eq!(prepared.rejected[0].kind, ViolationKind::NotANumber);
    assert_eq!(prepared.incomplete, 2);
    assert_eq!(prepared.dataset.len(), 7);
    assert!(prepared
        .dataset
        .iter()
        .all(|r| r.number("Horsepower").is_some()));

    let schema = prepared.dataset.schema().clone();
    let request = ChartRequest {
        criteria: Criteria::from_pairs(&schema, &[("Origin", "Japanese")]).unwrap(),
        facet_fields: vec!["Manufacturer".into(), "Model_Year".into()],
        groups: Some(
            GroupSpec::new(&schema, &["Manufacturer"], Reduction::Mean("MPG".into())).unwrap(),
        ),
        points: Some(PointSpec::new(&schema, "Horsepower", "MPG", Some("Weight")).unwrap()),
    };
    let input = chart_input(&prepared, &request);

    assert_eq!(input.records.len(), 4);
    let years: Vec<f64> = input.facets["Model_Year"]
        .iter()
        .filter_map(FieldValue::as_f64)
        .collect();
    assert_eq!(years, vec![70.0, 73.0, 74.0, 75.0]);
    let makers: Vec<_> = input.groups.iter().map(|g| g.key.to_string()).collect();
    assert_eq!(makers, vec!["toyota", "datsun", "honda"]);
    assert_eq!(input.groups[0].summary, Summary::Mean(28.0));
    assert_eq!(input.extents["MPG"], (24.0, 33.0));
}

#[test]
fn test_json_file_matches_csv() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("cars.json");
    fs::write(
        &json_path,
        r#"[
            {"Car": "datsun pl510", "Manufacturer": "datsun", "MPG": 27, "Cylinders": 4,
             "Displacement": 97, "Horsepower": 88, "Weight": 2130, "Acceleration": 14.5,
             "Model_Year": 70, "Origin": "Japanese"},
            {"Car": "ford pinto", "Manufacturer": "ford", "MPG": 25, "Cylinders": 4,
             "Displacement": 98, "Horsepower": null, "Weight": 2046, "Acceleration": 19,
             "Model_Year": 71, "Origin": "American"}
        ]"#,
    )
    .unwrap();

    let config = PipelineConfig::default();
    let rows = load_file(&json_path, &config.schema.missing).unwrap();
    let prepared = prepare(&config, &rows);
    assert!(prepared.rejected.is_empty());
    assert_eq!(prepared.incomplete, 1);
    assert_eq!(prepared.dataset.len(), 1);
    assert_eq!(prepared.dataset.records()[0].number("Acceleration"), Some(14.5));
}

#[test]
fn test_chart_input_serializes_for_renderer() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::default();
    let rows = load_file(&write_csv(&dir), &config.schema.missing).unwrap();
    let prepared = prepare(&config, &rows);
    let schema = prepared.dataset.schema().clone();
    let request = ChartRequest {
        groups: Some(
            GroupSpec::new(&schema, &["Origin"], Reduction::Count)
                .unwrap()
                .with_order(GroupOrder::sorted()),
        ),
        ..Default::default()
    };
    let json = serde_json::to_value(chart_input(&prepared, &request)).unwrap();

    assert_eq!(json["total"], 7);
    assert_eq!(json["records"][0]["Car"], "chevrolet chevelle malibu");
    assert_eq!(json["groups"][0]["key"], "American");
    assert_eq!(json["groups"][0]["summary"], 2);
    assert_eq!(json["groups"][2]["key"], "Japanese");
    assert_eq!(json["groups"][2]["size"], 4);
    assert_eq!(json["rejected"].as_array().unwrap().len(), 1);
}

#[test]
fn test_sentinel_normalizes_to_absent() {
    let schema = simple_schema();
    let rows = vec![BTreeMap::from([
        ("Manufacturer".to_string(), "amc".to_string()),
        ("Origin".to_string(), "American".to_string()),
        ("MPG".to_string(), "NA".to_string()),
    ])];
    let out = normalize_rows(schema, &rows);
    assert_eq!(out.dataset.records()[0].get("MPG"), &FieldValue::Absent);
}

#[test]
fn test_validity_filter_three_missing_a_two_missing_b() {
    let schema = Arc::new(Schema::new(vec![
        FieldSpec::numeric("A"),
        FieldSpec::numeric("B"),
    ]));
    let records = (0..10)
        .map(|i| {
            let mut values = BTreeMap::new();
            values.insert(
                "A".to_string(),
                if i < 3 { FieldValue::Absent } else { FieldValue::from(i as f64) },
            );
            values.insert(
                "B".to_string(),
                if (3..5).contains(&i) { FieldValue::Absent } else { FieldValue::from(1.0) },
            );
            Record::new(values)
        })
        .collect();
    let ds = Dataset::new(schema, records);
    assert_eq!(retain_complete(&ds, &["A", "B"]).len(), 5);
}

#[test]
fn test_origin_facet_sorted_and_deduplicated() {
    let ds = Dataset::new(
        simple_schema(),
        vec![
            record("toyota", "Japanese", Some(30.0)),
            record("ford", "American", Some(20.0)),
            record("chevrolet", "American", Some(15.0)),
            record("vw", "European", Some(26.0)),
        ],
    );
    assert_eq!(
        facet_values(&ds, "Origin"),
        vec![
            FieldValue::from("American"),
            FieldValue::from("European"),
            FieldValue::from("Japanese"),
        ]
    );
}

#[test]
fn test_all_sentinel_with_origin_constraint() {
    let ds = Dataset::new(
        simple_schema(),
        vec![
            record("toyota", "Japanese", Some(30.0)),
            record("ford", "American", Some(20.0)),
            record("chevrolet", "American", Some(15.0)),
            record("vw", "European", Some(26.0)),
        ],
    );
    let criteria =
        Criteria::from_pairs(ds.schema(), &[("Manufacturer", "all"), ("Origin", "Japanese")])
            .unwrap();
    let out = apply(&ds, &criteria);
    assert_eq!(out.len(), 1);
    assert_eq!(out.records()[0].text("Manufacturer"), Some("toyota"));

    // Filtering the result again changes nothing.
    assert_eq!(apply(&out, &criteria), out);
}

#[test]
fn test_mean_mpg_by_manufacturer() {
    let ds = Dataset::new(
        simple_schema(),
        vec![
            record("Toyota", "Japanese", Some(30.0)),
            record("Toyota", "Japanese", Some(20.0)),
            record("Honda", "Japanese", Some(40.0)),
        ],
    );
    let spec =
        GroupSpec::new(ds.schema(), &["Manufacturer"], Reduction::Mean("MPG".into())).unwrap();
    let groups: Vec<(String, Summary, usize)> = aggregate(&ds, &spec)
        .into_iter()
        .map(|g| (g.key.to_string(), g.summary, g.size))
        .collect();
    assert_eq!(
        groups,
        vec![
            ("Toyota".to_string(), Summary::Mean(25.0), 2),
            ("Honda".to_string(), Summary::Mean(40.0), 1),
        ]
    );
}

#[test]
fn test_all_absent_group_is_no_data_not_zero() {
    let ds = Dataset::new(
        simple_schema(),
        vec![record("citroen", "European", None), record("citroen", "European", None)],
    );
    let spec =
        GroupSpec::new(ds.schema(), &["Manufacturer"], Reduction::Mean("MPG".into())).unwrap();
    let groups = aggregate(&ds, &spec);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].summary, Summary::NoData);
    assert!(groups[0].summary != 0.0);
    assert!(groups[0].summary.partial_cmp(&0.0).is_none());

    let json = serde_json::to_value(&groups[0]).unwrap();
    assert!(json["summary"].is_null());
}
