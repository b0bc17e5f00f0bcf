//! Geographic regions: buffer polygons, gridded testing regions, masking.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres, used for great-circle constructions.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographic bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western edge.
    pub min_longitude: f64,
    /// Eastern edge.
    pub max_longitude: f64,
    /// Southern edge.
    pub min_latitude: f64,
    /// Northern edge.
    pub max_latitude: f64,
}

impl BoundingBox {
    /// Returns true when the point lies inside the box (inclusive edges).
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        longitude >= self.min_longitude
            && longitude <= self.max_longitude
            && latitude >= self.min_latitude
            && latitude <= self.max_latitude
    }
}

/// A simple closed polygon over (longitude, latitude) vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<(f64, f64)>,
}

impl Polygon {
    /// Creates a polygon from an ordered vertex list.
    pub fn new(vertices: Vec<(f64, f64)>) -> Self {
        Self { vertices }
    }

    /// Approximates a great-circle buffer of the given radius around an
    /// epicenter by sampling `num_points` bearings.
    pub fn from_great_circle_radius(
        origin: (f64, f64),
        radius_m: f64,
        num_points: usize,
    ) -> Self {
        let (lon0, lat0) = origin;
        let lat0_rad = lat0.to_radians();
        let angular = radius_m / EARTH_RADIUS_M;
        let count = num_points.max(3);
        let mut vertices = Vec::with_capacity(count);
        for step in 0..count {
            let bearing = 2.0 * std::f64::consts::PI * step as f64 / count as f64;
            let lat = (lat0_rad.sin() * angular.cos()
                + lat0_rad.cos() * angular.sin() * bearing.cos())
            .asin();
            let lon = lon0.to_radians()
                + (bearing.sin() * angular.sin() * lat0_rad.cos())
                    .atan2(angular.cos() - lat0_rad.sin() * lat.sin());
            vertices.push((lon.to_degrees(), lat.to_degrees()));
        }
        Self { vertices }
    }

    /// Returns the vertex list in construction order.
    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    /// Point-in-polygon test via ray casting in the lon/lat plane.
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = self.vertices[i];
            let (xj, yj) = self.vertices[j];
            let crosses = (yi > latitude) != (yj > latitude)
                && longitude < (xj - xi) * (latitude - yi) / (yj - yi) + xi;
            if crosses {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// A regular lon/lat grid with a per-cell activity mask.
///
/// Constructed once per run and shared read-only across every catalog
/// filter and spatial accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GriddedRegion {
    bounds: BoundingBox,
    cell_size_deg: f64,
    n_lon: usize,
    n_lat: usize,
    active: Vec<bool>,
}

impl GriddedRegion {
    /// Creates a fully active grid covering the bounding box.
    pub fn new(bounds: BoundingBox, cell_size_deg: f64) -> Self {
        let span_lon = (bounds.max_longitude - bounds.min_longitude).max(0.0);
        let span_lat = (bounds.max_latitude - bounds.min_latitude).max(0.0);
        let n_lon = (span_lon / cell_size_deg).ceil().max(1.0) as usize;
        let n_lat = (span_lat / cell_size_deg).ceil().max(1.0) as usize;
        Self {
            bounds,
            cell_size_deg,
            n_lon,
            n_lat,
            active: vec![true; n_lon * n_lat],
        }
    }

    /// Total number of grid cells, active or not.
    pub fn grid_size(&self) -> usize {
        self.n_lon * self.n_lat
    }

    /// Number of active cells after masking.
    pub fn cell_count(&self) -> usize {
        self.active.iter().filter(|flag| **flag).count()
    }

    /// Grid cell size in decimal degrees.
    pub fn cell_size_deg(&self) -> f64 {
        self.cell_size_deg
    }

    /// Flat index of the active cell covering the point, if any.
    pub fn cell_index(&self, longitude: f64, latitude: f64) -> Option<usize> {
        if !self.bounds.contains(longitude, latitude) {
            return None;
        }
        let col = (((longitude - self.bounds.min_longitude) / self.cell_size_deg) as usize)
            .min(self.n_lon - 1);
        let row = (((latitude - self.bounds.min_latitude) / self.cell_size_deg) as usize)
            .min(self.n_lat - 1);
        let index = row * self.n_lon + col;
        self.active[index].then_some(index)
    }

    /// Returns true when the point falls inside an active cell.
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        self.cell_index(longitude, latitude).is_some()
    }

    /// Center coordinates of the cell at the given flat index.
    pub fn cell_center(&self, index: usize) -> (f64, f64) {
        let row = index / self.n_lon;
        let col = index % self.n_lon;
        (
            self.bounds.min_longitude + (col as f64 + 0.5) * self.cell_size_deg,
            self.bounds.min_latitude + (row as f64 + 0.5) * self.cell_size_deg,
        )
    }

    /// Iterates over active cells as `(flat index, center lon, center lat)`.
    pub fn active_cells(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.active
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag)
            .map(|(index, _)| {
                let (lon, lat) = self.cell_center(index);
                (index, lon, lat)
            })
    }
}

/// Restricts a base region to the cells whose centers fall inside the
/// polygon, producing the evaluation region for a run.
pub fn masked_region(base: &GriddedRegion, polygon: &Polygon) -> GriddedRegion {
    let mut masked = base.clone();
    for index in 0..masked.active.len() {
        if masked.active[index] {
            let (lon, lat) = masked.cell_center(index);
            masked.active[index] = polygon.contains(lon, lat);
        }
    }
    masked
}

/// The California RELM testing region at 0.1 degree resolution.
pub fn california_relm_region() -> GriddedRegion {
    GriddedRegion::new(
        BoundingBox {
            min_longitude: -125.4,
            max_longitude: -113.1,
            min_latitude: 31.5,
            max_latitude: 43.0,
        },
        0.1,
    )
}

/// Wells and Coppersmith (1994) magnitude scaling relationships.
#[derive(Debug, Clone, Copy)]
pub struct WellsAndCoppersmith;

impl WellsAndCoppersmith {
    /// Subsurface rupture length in kilometres for a strike-slip event.
    pub fn mag_length_strike_slip(magnitude: f64) -> f64 {
        10f64.powf(-2.57 + 0.62 * magnitude)
    }
}
