use quake_core::catalog::{Catalog, Event};
use quake_core::filter::CatalogFilter;
use quake_core::region::{BoundingBox, GriddedRegion};

fn event(time_ms: i64, longitude: f64, latitude: f64, magnitude: f64) -> Event {
    Event {
        time_ms,
        longitude,
        latitude,
        depth_km: 5.0,
        magnitude,
    }
}

fn test_region() -> GriddedRegion {
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

#[test]
fn temporal_filter_is_strict_and_order_preserving() {
    let catalog = Catalog::new(
        "synthetic",
        Some(0),
        vec![
            event(100, -117.5, 35.5, 3.0),
            event(200, -117.4, 35.4, 4.0),
            event(300, -117.3, 35.3, 5.0),
        ],
    );
    let filtered = catalog.filter_time_before(300);
    assert_eq!(filtered.event_count(), 2);
    assert_eq!(filtered.events()[0].time_ms, 100);
    assert_eq!(filtered.events()[1].time_ms, 200);
    // the source catalog is untouched
    assert_eq!(catalog.event_count(), 3);
}

#[test]
fn spatial_filter_drops_events_outside_the_region() {
    let catalog = Catalog::new(
        "synthetic",
        Some(1),
        vec![
            event(100, -117.5, 35.5, 3.0),
            event(200, -120.0, 35.5, 3.0),
            event(300, -117.5, 40.0, 3.0),
        ],
    );
    let filtered = catalog.filter_spatial(&test_region());
    assert_eq!(filtered.event_count(), 1);
    assert_eq!(filtered.events()[0].time_ms, 100);
}

#[test]
fn combined_filter_applies_time_then_region() {
    let filter = CatalogFilter::new(250, test_region());
    let catalog = Catalog::new(
        "synthetic",
        Some(2),
        vec![
            event(100, -117.5, 35.5, 3.0),
            event(200, -120.0, 35.5, 3.0),
            event(300, -117.5, 35.5, 3.0),
        ],
    );
    let filtered = filter.apply(&catalog);
    assert_eq!(filtered.event_count(), 1);
    assert_eq!(filtered.index, Some(2));
}

#[test]
fn validate_rejects_non_finite_fields() {
    let catalog = Catalog::new(
        "broken",
        Some(7),
        vec![event(100, f64::NAN, 35.5, 3.0)],
    );
    let err = catalog.validate().expect_err("validation must fail");
    assert_eq!(err.info().code, "quake_core.malformed_event");
    assert_eq!(
        err.info().context.get("ensemble_index").map(String::as_str),
        Some("7")
    );
}

#[test]
fn magnitude_filter_keeps_threshold_events() {
    let catalog = Catalog::new(
        "synthetic",
        None,
        vec![
            event(100, -117.5, 35.5, 2.4),
            event(200, -117.5, 35.5, 2.5),
            event(300, -117.5, 35.5, 4.0),
        ],
    );
    let filtered = catalog.filter_min_magnitude(2.5);
    assert_eq!(filtered.event_count(), 2);
}
