use proptest::prelude::*;
use quake_core::catalog::{Catalog, Event};
use quake_core::region::{BoundingBox, GriddedRegion};
use quake_eval::{
    BValueTest, CatalogAccumulator, LikelihoodSpatialTest, MagnitudeTest, NumberTest, RunMetadata,
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

fn catalog_from_counts(index: usize, count: u8) -> Catalog {
    let events = (0..count)
        .map(|step| Event {
            time_ms: 1_000 + step as i64,
            longitude: -117.95 + (step as f64 * 0.07) % 0.9,
            latitude: 35.05 + (step as f64 * 0.13) % 0.9,
            depth_km: 8.0,
            magnitude: 2.5 + (step as f64 * 0.31) % 3.0,
        })
        .collect();
    Catalog::new("synthetic", Some(index), events)
}

fn metadata() -> RunMetadata {
    RunMetadata::new(0, 1_000_000, 16)
}

/// Streams the whole sequence through one accumulator instance, and the same
/// sequence split at `split` through another; both finalize results must
/// agree exactly.
fn assert_split_invariant<A>(mut single: A, mut first: A, counts: &[u8], split: usize)
where
    A: CatalogAccumulator,
{
    let catalogs: Vec<Catalog> = counts
        .iter()
        .enumerate()
        .map(|(index, &count)| catalog_from_counts(index, count))
        .collect();
    let observed = catalog_from_counts(usize::MAX, 6);

    for catalog in &catalogs {
        single.process_catalog(catalog).expect("process");
    }
    for catalog in &catalogs[..split] {
        first.process_catalog(catalog).expect("process");
    }
    // state carries over between the two sub-sequences
    for catalog in &catalogs[split..] {
        first.process_catalog(catalog).expect("process");
    }

    let lhs = single.evaluate(&observed, &metadata()).expect("evaluate");
    let rhs = first.evaluate(&observed, &metadata()).expect("evaluate");
    assert_eq!(lhs, rhs);
}

#[test]
fn number_test_is_split_invariant() {
    assert_split_invariant(
        NumberTest::new(),
        NumberTest::new(),
        &[5, 7, 6, 0, 12],
        2,
    );
}

#[test]
fn magnitude_test_is_split_invariant() {
    assert_split_invariant(
        MagnitudeTest::new(2.5),
        MagnitudeTest::new(2.5),
        &[5, 7, 6, 3, 9, 1],
        4,
    );
}

#[test]
fn b_value_test_is_split_invariant() {
    assert_split_invariant(
        BValueTest::new(2.5),
        BValueTest::new(2.5),
        &[4, 0, 11, 2, 8],
        1,
    );
}

#[test]
fn likelihood_test_is_split_invariant() {
    assert_split_invariant(
        LikelihoodSpatialTest::new(region()),
        LikelihoodSpatialTest::new(region()),
        &[5, 7, 6, 3, 9],
        3,
    );
}

proptest! {
    #[test]
    fn number_test_split_invariance_holds_for_random_sequences(
        counts in prop::collection::vec(0u8..32, 1..24),
        split_fraction in 0.0f64..1.0,
    ) {
        let split = ((counts.len() as f64) * split_fraction) as usize;
        assert_split_invariant(
            NumberTest::new(),
            NumberTest::new(),
            &counts,
            split.min(counts.len()),
        );
    }

    #[test]
    fn magnitude_test_split_invariance_holds_for_random_sequences(
        counts in prop::collection::vec(0u8..32, 1..16),
        split_fraction in 0.0f64..1.0,
    ) {
        let split = ((counts.len() as f64) * split_fraction) as usize;
        assert_split_invariant(
            MagnitudeTest::new(2.5),
            MagnitudeTest::new(2.5),
            &counts,
            split.min(counts.len()),
        );
    }
}
