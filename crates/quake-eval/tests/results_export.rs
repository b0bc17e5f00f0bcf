use quake_core::catalog::{Catalog, Event};
use quake_core::filter::CatalogFilter;
use quake_core::region::{BoundingBox, GriddedRegion};
use quake_eval::export::{results_table, write_results_csv, write_results_json};
use quake_eval::{
    AccumulatorRegistry, BValueTest, EvaluationRun, NullProgress, NumberTest, RunMetadata,
};

fn region() -> GriddedRegion {
    GriddedRegion::new(
        BoundingBox {
            min_longitude: -118.0,
            max_longitude: -117.0,
            min_latitude: 35.0,
            max_latitude: 36.0,
        },
        0.1,
    )
}

fn catalog(index: usize, count: usize) -> Catalog {
    let events = (0..count)
        .map(|step| Event {
            time_ms: 1_000 + step as i64,
            longitude: -117.5,
            latitude: 35.5,
            depth_km: 8.0,
            magnitude: 2.6 + step as f64 * 0.2,
        })
        .collect();
    Catalog::new("synthetic", Some(index), events)
}

fn sample_output() -> quake_eval::EvaluationOutput {
    let mut registry = AccumulatorRegistry::new();
    registry
        .register("n-test", Box::new(NumberTest::new()))
        .expect("register");
    registry
        .register("bv-test", Box::new(BValueTest::new(2.5)))
        .expect("register");
    let mut run = EvaluationRun::new(
        registry,
        CatalogFilter::new(1_000_000, region()),
        RunMetadata::new(0, 1_000_000, 3),
    )
    .expect("wire run");
    let catalogs = (0..3).map(|index| Ok(catalog(index, 5 + index))).collect::<Vec<_>>();
    run.run(catalogs, &catalog(9, 6), &mut NullProgress)
        .expect("run")
}

#[test]
fn json_export_is_canonical_and_reloadable() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("out/results.json");
    let output = sample_output();
    write_results_json(&path, &output).expect("write");

    let first = std::fs::read(&path).expect("read");
    write_results_json(&path, &output).expect("rewrite");
    let second = std::fs::read(&path).expect("read");
    assert_eq!(first, second);

    let value: serde_json::Value = serde_json::from_slice(&first).expect("parse");
    assert!(value["results"]["n-test"]["quantile"].is_number());
    assert_eq!(value["stream"]["consumed"], 3);
}

#[test]
fn csv_export_writes_one_row_per_test() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("results.csv");
    let output = sample_output();
    write_results_csv(&path, &output.results).expect("write");

    let text = std::fs::read_to_string(&path).expect("read");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "test,status,observed,quantile");
    assert!(lines[1].starts_with("n-test,normal,"));
    assert!(lines[2].starts_with("bv-test,"));
}

#[test]
fn table_rows_follow_registration_order() {
    let output = sample_output();
    let table = results_table(&output.results);
    assert_eq!(table.len(), 2);
    assert_eq!(table[0][0], "n-test");
    assert_eq!(table[1][0], "bv-test");
}
