use quake_core::catalog::{Catalog, Event};
use quake_core::errors::QuakeError;
use quake_core::filter::CatalogFilter;
use quake_core::region::{BoundingBox, GriddedRegion};
use quake_eval::{
    AccumulatorRegistry, EvaluationRun, NullProgress, NumberTest, RunMetadata, RunPhase,
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

fn new_run(n_cat: usize) -> EvaluationRun {
    let mut registry = AccumulatorRegistry::new();
    registry
        .register("n-test", Box::new(NumberTest::new()))
        .expect("register");
    EvaluationRun::new(
        registry,
        CatalogFilter::new(1_000_000, region()),
        RunMetadata::new(0, 1_000_000, n_cat),
    )
    .expect("wire run")
}

fn good_catalog(index: usize) -> Result<Catalog, QuakeError> {
    Ok(Catalog::new(
        "synthetic",
        Some(index),
        vec![Event {
            time_ms: 1_000,
            longitude: -117.5,
            latitude: 35.5,
            depth_km: 8.0,
            magnitude: 3.0,
        }],
    ))
}

fn observed() -> Catalog {
    good_catalog(9).expect("observed")
}

#[test]
fn phases_progress_in_order() {
    let mut run = new_run(1);
    assert_eq!(run.phase(), RunPhase::Created);
    run.stream(vec![good_catalog(0)], &mut NullProgress)
        .expect("stream");
    assert_eq!(run.phase(), RunPhase::Streaming);
    let mut output = run.finalize(&observed(), &mut NullProgress).expect("finalize");
    assert_eq!(run.phase(), RunPhase::Done);

    let dir = tempfile::tempdir().expect("tmp dir");
    run.render_artifacts(&mut output, dir.path(), false)
        .expect("render");
    assert!(!output.results["n-test"].artifacts.is_empty());
}

#[test]
fn finalize_before_streaming_is_rejected() {
    let mut run = new_run(1);
    let err = run
        .finalize(&observed(), &mut NullProgress)
        .expect_err("must fail");
    assert_eq!(err.info().code, "quake_eval.invalid_phase");
    assert_eq!(run.phase(), RunPhase::Created);
}

#[test]
fn the_stream_cannot_be_driven_twice() {
    let mut run = new_run(1);
    run.stream(vec![good_catalog(0)], &mut NullProgress)
        .expect("stream");
    let err = run
        .stream(vec![good_catalog(1)], &mut NullProgress)
        .expect_err("must fail");
    assert_eq!(err.info().code, "quake_eval.invalid_phase");
}

#[test]
fn done_is_terminal() {
    let mut run = new_run(1);
    run.stream(vec![good_catalog(0)], &mut NullProgress)
        .expect("stream");
    run.finalize(&observed(), &mut NullProgress).expect("finalize");
    // neither streaming nor finalizing may re-enter after Done
    assert!(run.stream(vec![good_catalog(1)], &mut NullProgress).is_err());
    assert!(run.finalize(&observed(), &mut NullProgress).is_err());
    assert_eq!(run.phase(), RunPhase::Done);
}

#[test]
fn rendering_requires_a_finished_run() {
    let mut complete = new_run(1);
    complete
        .stream(vec![good_catalog(0)], &mut NullProgress)
        .expect("stream");
    let mut output = complete
        .finalize(&observed(), &mut NullProgress)
        .expect("finalize");

    let fresh = new_run(1);
    let dir = tempfile::tempdir().expect("tmp dir");
    let err = fresh
        .render_artifacts(&mut output, dir.path(), false)
        .expect_err("must fail");
    assert_eq!(err.info().code, "quake_eval.invalid_phase");
}

#[test]
fn malformed_catalog_aborts_the_whole_run() {
    let mut run = new_run(3);
    let broken = Catalog::new(
        "broken",
        Some(1),
        vec![Event {
            time_ms: 1_000,
            longitude: f64::NAN,
            latitude: 35.5,
            depth_km: 8.0,
            magnitude: 3.0,
        }],
    );
    let err = run
        .stream(vec![good_catalog(0), Ok(broken)], &mut NullProgress)
        .expect_err("must fail");
    assert_eq!(err.info().code, "quake_core.malformed_event");
    // the aborted pass left partially accumulated state; finalizing over it
    // is refused
    let err = run
        .finalize(&observed(), &mut NullProgress)
        .expect_err("must fail");
    assert_eq!(err.info().code, "quake_eval.aborted_stream");
}

#[test]
fn stream_decode_errors_propagate_as_fatal() {
    let mut run = new_run(3);
    let failure = Err(QuakeError::Stream(
        quake_core::errors::ErrorInfo::new("quake_ingest.decode_json", "bad frame"),
    ));
    let err = run
        .stream(vec![good_catalog(0), failure], &mut NullProgress)
        .expect_err("must fail");
    assert_eq!(err.info().code, "quake_ingest.decode_json");
}
