use std::fs;
use std::path::{Path, PathBuf};

use quake_core::errors::{ErrorInfo, QuakeError};
use quake_core::region::{masked_region, BoundingBox, GriddedRegion, Polygon, WellsAndCoppersmith};
use serde::{Deserialize, Serialize};

/// YAML-configurable parameters governing an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Human readable simulation label used as the report title.
    pub simulation_name: String,
    /// Forecast name stamped onto every simulated catalog.
    pub forecast_name: String,
    /// Hard cap on the number of catalogs consumed from the stream.
    #[serde(default = "default_n_cat")]
    pub n_cat: usize,
    /// Completeness magnitude applied to the observed record.
    #[serde(default = "default_min_magnitude")]
    pub min_magnitude: f64,
    /// Mainshock the aftershock region is built around.
    pub mainshock: MainshockSpec,
    /// Evaluation region construction knobs.
    #[serde(default)]
    pub region: RegionSpec,
    /// Simulated catalog source.
    pub catalogs: CatalogSourceSpec,
    /// Observed catalog source.
    pub observed: ObservedSourceSpec,
    /// Evaluation end time (RFC 3339). Defaults to now when omitted.
    #[serde(default)]
    pub end_time: Option<String>,
    /// Test names to run. Empty means the full default suite.
    #[serde(default)]
    pub tests: Vec<String>,
}

/// Mainshock parameters the evaluation is anchored to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainshockSpec {
    /// Epicentral longitude in decimal degrees.
    pub longitude: f64,
    /// Epicentral latitude in decimal degrees.
    pub latitude: f64,
    /// Mainshock moment magnitude.
    pub magnitude: f64,
    /// Origin time as an RFC 3339 timestamp.
    pub origin_time: String,
}

/// Evaluation region construction knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSpec {
    /// Base testing-region bounding box.
    #[serde(default = "default_bounds")]
    pub bounds: BoundingBox,
    /// Grid cell size in decimal degrees.
    #[serde(default = "default_cell_size")]
    pub cell_size_deg: f64,
    /// Buffer radius as a multiple of the mainshock rupture length.
    #[serde(default = "default_rupture_multiplier")]
    pub rupture_length_multiplier: f64,
    /// Vertex count of the buffer polygon.
    #[serde(default = "default_polygon_points")]
    pub polygon_points: usize,
}

impl Default for RegionSpec {
    fn default() -> Self {
        Self {
            bounds: default_bounds(),
            cell_size_deg: default_cell_size(),
            rupture_length_multiplier: default_rupture_multiplier(),
            polygon_points: default_polygon_points(),
        }
    }
}

impl RegionSpec {
    /// Builds the aftershock evaluation region around the mainshock.
    pub fn build(&self, mainshock: &MainshockSpec) -> GriddedRegion {
        let rupture_length_m =
            WellsAndCoppersmith::mag_length_strike_slip(mainshock.magnitude) * 1_000.0;
        let polygon = Polygon::from_great_circle_radius(
            (mainshock.longitude, mainshock.latitude),
            self.rupture_length_multiplier * rupture_length_m,
            self.polygon_points,
        );
        let base = GriddedRegion::new(self.bounds, self.cell_size_deg);
        masked_region(&base, &polygon)
    }
}

/// Simulated catalog source location and layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSourceSpec {
    /// Event-set file holding the simulated ensemble.
    pub path: PathBuf,
    /// Stream format label (`json-lines` or `binary`).
    #[serde(default = "default_format")]
    pub format: String,
}

/// Observed catalog source location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedSourceSpec {
    /// Pre-fetched observed events file.
    pub path: PathBuf,
}

fn default_n_cat() -> usize {
    1_000
}

fn default_min_magnitude() -> f64 {
    2.5
}

fn default_cell_size() -> f64 {
    0.1
}

fn default_rupture_multiplier() -> f64 {
    3.0
}

fn default_polygon_points() -> usize {
    100
}

fn default_format() -> String {
    "binary".to_string()
}

fn default_bounds() -> BoundingBox {
    // the California RELM testing region footprint
    BoundingBox {
        min_longitude: -125.4,
        max_longitude: -113.1,
        min_latitude: 31.5,
        max_latitude: 43.0,
    }
}

/// Loads an evaluation configuration from YAML.
pub fn load_config(path: &Path) -> Result<EvalConfig, QuakeError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        QuakeError::Serde(
            ErrorInfo::new("quake_sim.config_read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    serde_yaml::from_str(&contents).map_err(|err| {
        QuakeError::Serde(
            ErrorInfo::new("quake_sim.config_parse", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "\
simulation_name: Ridgecrest Mw 7.1
forecast_name: synthetic-etas
mainshock:
  longitude: -117.599
  latitude: 35.77
  magnitude: 7.1
  origin_time: 2019-07-06T03:19:53Z
catalogs:
  path: catalogs.bin
observed:
  path: observed.json
";

    #[test]
    fn minimal_config_fills_defaults() {
        let config: EvalConfig = serde_yaml::from_str(MINIMAL).expect("parse");
        assert_eq!(config.n_cat, 1_000);
        assert_eq!(config.min_magnitude, 2.5);
        assert_eq!(config.catalogs.format, "binary");
        assert_eq!(config.region.cell_size_deg, 0.1);
        assert_eq!(config.region.rupture_length_multiplier, 3.0);
        assert!(config.tests.is_empty());
        assert!(config.end_time.is_none());
    }

    #[test]
    fn region_spec_builds_a_masked_region_around_the_mainshock() {
        let config: EvalConfig = serde_yaml::from_str(MINIMAL).expect("parse");
        let region = config.region.build(&config.mainshock);
        assert!(region.contains(
            config.mainshock.longitude,
            config.mainshock.latitude
        ));
        assert!(region.cell_count() > 0);
        // the mask is a buffer, not the whole testing region
        assert!(!region.contains(-124.0, 41.0));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let yaml = format!("{MINIMAL}n_cat: 25\nmin_magnitude: 3.0\n");
        let config: EvalConfig = serde_yaml::from_str(&yaml).expect("parse");
        assert_eq!(config.n_cat, 25);
        assert_eq!(config.min_magnitude, 3.0);
    }

    #[test]
    fn load_config_reads_yaml_from_disk() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("evaluation.yaml");
        std::fs::write(&path, MINIMAL).expect("write");
        let config = load_config(&path).expect("load");
        assert_eq!(config.forecast_name, "synthetic-etas");

        let err = load_config(&dir.path().join("missing.yaml")).expect_err("must fail");
        assert_eq!(err.info().code, "quake_sim.config_read");
    }
}
