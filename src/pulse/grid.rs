use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::orbit::frames::geodetic_to_ecef;
use crate::orbit::GeodeticPosition;
use crate::swath::{offset_from_center, SwathGeometry};

/// Upper bound on targets per batch; finer grids are coarsened to fit.
pub const MAX_TARGETS: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PointTarget {
    #[schema(value_type = Vec<f64>)]
    pub position: [f64; 3],
    pub reflectivity: f64,
    pub phase: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GridSettings {
    #[serde(default = "default_resolution")]
    pub range_resolution_m: f64,
    #[serde(default = "default_resolution")]
    pub azimuth_resolution_m: f64,
    #[serde(default = "default_reflectivity")]
    pub reflectivity: f64,
}

fn default_resolution() -> f64 {
    1000.0
}

fn default_reflectivity() -> f64 {
    1.0
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            range_resolution_m: default_resolution(),
            azimuth_resolution_m: default_resolution(),
            reflectivity: default_reflectivity(),
        }
    }
}

/// Cells along one axis: `max(1, floor(extent / resolution))`.
pub fn cell_count(extent_m: f64, resolution_m: f64) -> usize {
    if !(resolution_m.is_finite() && resolution_m > 0.0) {
        return 1;
    }
    let n = (extent_m / resolution_m).floor();
    if n.is_finite() && n >= 1.0 {
        n as usize
    } else {
        1
    }
}

/// Range and azimuth cell counts for a footprint, coarsened evenly along
/// both axes when their product would exceed [`MAX_TARGETS`].
pub fn grid_shape(width_m: f64, azimuth_m: f64, settings: &GridSettings) -> (usize, usize) {
    let num_range = cell_count(width_m, settings.range_resolution_m);
    let num_azimuth = cell_count(azimuth_m, settings.azimuth_resolution_m);
    if num_range
        .checked_mul(num_azimuth)
        .is_some_and(|n| n <= MAX_TARGETS)
    {
        return (num_range, num_azimuth);
    }

    let scale = ((num_range as f64) * (num_azimuth as f64) / MAX_TARGETS as f64).sqrt();
    let coarse_range = ((num_range as f64 / scale).floor() as usize).clamp(1, MAX_TARGETS);
    let coarse_azimuth =
        ((num_azimuth as f64 / scale).floor() as usize).clamp(1, MAX_TARGETS / coarse_range);
    log::warn!(
        "Target grid {} x {} exceeds {} cells, coarsened to {} x {}",
        num_range,
        num_azimuth,
        MAX_TARGETS,
        coarse_range,
        coarse_azimuth
    );
    (coarse_range, coarse_azimuth)
}

/// Sample a footprint into a uniform grid of ground-level point targets,
/// one per cell center, in WGS-84 ECEF.
pub fn to_targets(geometry: &SwathGeometry, settings: &GridSettings) -> Vec<PointTarget> {
    let near = geometry.near_range_m;
    let width = geometry.swath_width();
    let azimuth = geometry.azimuth_length_m;

    let (num_range, num_azimuth) = grid_shape(width, azimuth, settings);
    let range_step = width / num_range as f64;
    let azimuth_step = azimuth / num_azimuth as f64;

    let mut targets = Vec::with_capacity(num_range * num_azimuth);
    for i in 0..num_range {
        let cross = near + (i as f64 + 0.5) * range_step;
        for j in 0..num_azimuth {
            let along = -azimuth / 2.0 + (j as f64 + 0.5) * azimuth_step;
            let point = offset_from_center(geometry, cross, along);
            let position = geodetic_to_ecef(&GeodeticPosition {
                longitude_deg: point.lon_deg,
                latitude_deg: point.lat_deg,
                altitude_m: 0.0,
            });
            if position.iter().any(|c| !c.is_finite()) {
                continue;
            }
            targets.push(PointTarget {
                position,
                reflectivity: settings.reflectivity,
                phase: 0.0,
            });
        }
    }

    log::debug!(
        "Generated {} targets ({} range x {} azimuth)",
        targets.len(),
        num_range,
        num_azimuth
    );
    targets
}
