use quake_core::filter::CatalogFilter;
use quake_core::region::{masked_region, GriddedRegion, Polygon};
use quake_eval::hash::stable_hash_string;
use quake_eval::{
    AccumulatorRegistry, BValueTest, ConditionalRatePlot, CumulativeEventPlot, EvaluationOutput,
    EvaluationRun, LikelihoodSpatialTest, MagnitudeHistogram, MagnitudeTest, NullProgress,
    NumberTest, RunMetadata, SpatialLikelihoodPlot,
};
use quake_ingest::{synthesize_ensemble, synthesize_observed, SynthesisSpec};

fn spec() -> SynthesisSpec {
    SynthesisSpec {
        seed: 20_190_706,
        n_catalogs: 40,
        mean_events: 30.0,
        ..SynthesisSpec::default()
    }
}

fn evaluation_region(spec: &SynthesisSpec) -> GriddedRegion {
    let base = quake_core::region::california_relm_region();
    let polygon = Polygon::from_great_circle_radius(
        (spec.center_longitude, spec.center_latitude),
        150_000.0,
        100,
    );
    masked_region(&base, &polygon)
}

fn run_pipeline(spec: &SynthesisSpec) -> EvaluationOutput {
    let region = evaluation_region(spec);
    let metadata = RunMetadata::new(spec.start_epoch_ms, spec.end_epoch_ms, spec.n_catalogs);

    let mut registry = AccumulatorRegistry::new();
    registry
        .register("n-test", Box::new(NumberTest::new()))
        .expect("register");
    registry
        .register("m-test", Box::new(MagnitudeTest::new(spec.min_magnitude)))
        .expect("register");
    registry
        .register("l-test", Box::new(LikelihoodSpatialTest::new(region.clone())))
        .expect("register");
    registry
        .register(
            "cum-plot",
            Box::new(CumulativeEventPlot::new(spec.start_epoch_ms, spec.end_epoch_ms)),
        )
        .expect("register");
    registry
        .register(
            "mag-hist",
            Box::new(MagnitudeHistogram::new(false, spec.min_magnitude)),
        )
        .expect("register");
    registry
        .register(
            "crd-plot",
            Box::new(ConditionalRatePlot::new(false, region.clone())),
        )
        .expect("register");
    registry
        .register("bv-test", Box::new(BValueTest::new(spec.min_magnitude)))
        .expect("register");
    registry
        .register(
            "like-plot",
            Box::new(SpatialLikelihoodPlot::new(false, region.clone())),
        )
        .expect("register");
    registry.link_shared("m-test", "mag-hist");
    registry.link_shared("l-test", "crd-plot");
    registry.link_shared("l-test", "like-plot");

    let mut run = EvaluationRun::new(
        registry,
        CatalogFilter::new(spec.end_epoch_ms, region),
        metadata,
    )
    .expect("wire run");

    let catalogs = synthesize_ensemble(spec).into_iter().map(Ok);
    let observed = synthesize_observed(spec).filter_spatial(&evaluation_region(spec));
    run.run(catalogs, &observed, &mut NullProgress).expect("run")
}

#[test]
fn identical_inputs_produce_bit_identical_results() {
    let first = run_pipeline(&spec());
    let second = run_pipeline(&spec());
    assert_eq!(
        stable_hash_string(&first.results).expect("hash"),
        stable_hash_string(&second.results).expect("hash")
    );
    assert_eq!(first.results, second.results);
}

#[test]
fn results_preserve_registration_order() {
    let output = run_pipeline(&spec());
    let order: Vec<&str> = output.results.keys().map(String::as_str).collect();
    assert_eq!(
        order,
        vec![
            "n-test", "m-test", "l-test", "cum-plot", "mag-hist", "crd-plot", "bv-test",
            "like-plot"
        ]
    );
}

#[test]
fn full_pipeline_defines_every_product_on_a_healthy_ensemble() {
    let output = run_pipeline(&spec());
    for (name, result) in &output.results {
        assert!(result.is_defined(), "{name} unexpectedly undefined");
    }
    let l_result = &output.results["l-test"];
    assert!(l_result.named_quantiles.contains_key("l-test"));
    assert!(l_result.named_quantiles.contains_key("s-test"));
}
