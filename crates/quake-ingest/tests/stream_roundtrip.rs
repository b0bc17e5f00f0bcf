use std::io::Write;

use quake_core::catalog::Event;
use quake_ingest::{load_stochastic_event_sets, write_event_sets, CatalogSetFormat};

fn event(time_ms: i64, magnitude: f64) -> Event {
    Event {
        time_ms,
        longitude: -117.5,
        latitude: 35.7,
        depth_km: 8.0,
        magnitude,
    }
}

fn sample_sets() -> Vec<Vec<Event>> {
    vec![
        vec![event(100, 3.0), event(200, 4.1)],
        vec![],
        vec![event(50, 2.6), event(60, 2.7), event(70, 5.0)],
    ]
}

#[test]
fn json_lines_round_trip_assigns_sequential_indices() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("sets.jsonl");
    write_event_sets(&path, CatalogSetFormat::JsonLines, &sample_sets()).expect("write");

    let stream =
        load_stochastic_event_sets(&path, CatalogSetFormat::JsonLines, "roundtrip").expect("open");
    let catalogs: Vec<_> = stream.map(|item| item.expect("decode")).collect();
    assert_eq!(catalogs.len(), 3);
    assert_eq!(catalogs[0].index, Some(0));
    assert_eq!(catalogs[1].index, Some(1));
    assert_eq!(catalogs[1].event_count(), 0);
    assert_eq!(catalogs[2].index, Some(2));
    assert_eq!(catalogs[2].event_count(), 3);
    assert_eq!(catalogs[0].name, "roundtrip");
}

#[test]
fn binary_round_trip_preserves_events() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("sets.bin");
    write_event_sets(&path, CatalogSetFormat::Binary, &sample_sets()).expect("write");

    let stream =
        load_stochastic_event_sets(&path, CatalogSetFormat::Binary, "roundtrip").expect("open");
    let catalogs: Vec<_> = stream.map(|item| item.expect("decode")).collect();
    assert_eq!(catalogs.len(), 3);
    assert_eq!(catalogs[0].events()[1].magnitude, 4.1);
    assert_eq!(catalogs[2].events()[0].time_ms, 50);
}

#[test]
fn stream_is_pull_driven_and_stops_at_consumer_cap() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("sets.jsonl");
    write_event_sets(&path, CatalogSetFormat::JsonLines, &sample_sets()).expect("write");

    let mut stream =
        load_stochastic_event_sets(&path, CatalogSetFormat::JsonLines, "capped").expect("open");
    // consumer pulls two of three; the stream never decodes the rest
    let first = stream.next().expect("first").expect("decode");
    let second = stream.next().expect("second").expect("decode");
    assert_eq!(first.index, Some(0));
    assert_eq!(second.index, Some(1));
    drop(stream);
}

#[test]
fn decode_error_fuses_the_stream() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("sets.jsonl");
    let mut file = std::fs::File::create(&path).expect("create");
    writeln!(file, "[]").expect("write");
    writeln!(file, "not json").expect("write");
    writeln!(file, "[]").expect("write");
    drop(file);

    let mut stream =
        load_stochastic_event_sets(&path, CatalogSetFormat::JsonLines, "broken").expect("open");
    assert!(stream.next().expect("first item").is_ok());
    let err = stream.next().expect("second item").expect_err("must fail");
    assert_eq!(err.info().code, "quake_ingest.decode_json");
    assert_eq!(
        err.info().context.get("ensemble_index").map(String::as_str),
        Some("1")
    );
    // fused: the valid third line is never surfaced
    assert!(stream.next().is_none());
}

#[test]
fn unknown_format_label_is_rejected() {
    let err = CatalogSetFormat::parse("parquet").expect_err("must fail");
    assert_eq!(err.info().code, "quake_ingest.unknown_format");
    assert_eq!(
        CatalogSetFormat::parse("json-lines").expect("parse"),
        CatalogSetFormat::JsonLines
    );
    assert_eq!(
        CatalogSetFormat::parse("binary").expect("parse"),
        CatalogSetFormat::Binary
    );
}
