//! Swath footprint geometry.
//!
//! Corner offsets use a small-angle composition: each range or azimuth
//! offset becomes an angle `offset / EARTH_RADIUS_M` and is split into
//! independent latitude/longitude deltas that are summed in degree space.
//! This is not a geodesic. For footprints under ~500 km in extent and
//! |latitude| below ~80° the corner error stays within about 1% of the
//! footprint size; outside that range the corners are only indicative.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const EARTH_RADIUS_M: f64 = 6_378_137.0;
/// Side of the fallback square emitted when corner math fails.
pub const FALLBACK_SQUARE_DEG: f64 = 0.001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SwathGeometry {
    pub near_range_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub far_range_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swath_width_m: Option<f64>,
    pub azimuth_length_m: f64,
    pub center_lat_deg: f64,
    pub center_lon_deg: f64,
    pub heading_deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satellite_altitude_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub look_angle_deg: Option<f64>,
}

impl SwathGeometry {
    /// Geometry with both range edges known, keeping `swath_width == far - near`.
    #[allow(dead_code)]
    pub fn with_ranges(
        near_range_m: f64,
        far_range_m: f64,
        azimuth_length_m: f64,
        center_lat_deg: f64,
        center_lon_deg: f64,
        heading_deg: f64,
    ) -> Self {
        let far = far_range_m.max(near_range_m);
        Self {
            near_range_m,
            far_range_m: Some(far),
            swath_width_m: Some(far - near_range_m),
            azimuth_length_m: azimuth_length_m.max(0.0),
            center_lat_deg,
            center_lon_deg,
            heading_deg,
            satellite_altitude_m: None,
            look_angle_deg: None,
        }
    }

    /// Far edge: `far_range` when supplied, else `near_range + swath_width`,
    /// else `near_range`.
    pub fn far_range(&self) -> f64 {
        match (self.far_range_m, self.swath_width_m) {
            (Some(far), _) => far,
            (None, Some(width)) => self.near_range_m + width,
            (None, None) => self.near_range_m,
        }
    }

    pub fn swath_width(&self) -> f64 {
        self.far_range() - self.near_range_m
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LonLat {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl LonLat {
    pub fn is_finite(&self) -> bool {
        self.lon_deg.is_finite() && self.lat_deg.is_finite()
    }
}

/// Degree-space offset from the swath center for a cross-track distance
/// `cross_m` and an along-track distance `along_m`.
pub fn offset_from_center(geometry: &SwathGeometry, cross_m: f64, along_m: f64) -> LonLat {
    let heading = geometry.heading_deg.to_radians();
    let cross_dir = heading + std::f64::consts::FRAC_PI_2;
    let cos_lat = geometry.center_lat_deg.to_radians().cos();

    let (dlat_c, dlon_c) = angular_delta(cross_m / EARTH_RADIUS_M, cross_dir, cos_lat);
    let (dlat_a, dlon_a) = angular_delta(along_m / EARTH_RADIUS_M, heading, cos_lat);

    LonLat {
        lon_deg: geometry.center_lon_deg + (dlon_c + dlon_a).to_degrees(),
        lat_deg: geometry.center_lat_deg + (dlat_c + dlat_a).to_degrees(),
    }
}

fn angular_delta(offset_rad: f64, direction_rad: f64, cos_lat: f64) -> (f64, f64) {
    (
        offset_rad * direction_rad.cos(),
        offset_rad * direction_rad.sin() / cos_lat,
    )
}

/// Corners ordered near/-azimuth, near/+azimuth, far/+azimuth, far/-azimuth,
/// or `None` when any coordinate comes out non-finite.
pub fn try_corners(geometry: &SwathGeometry) -> Option<[LonLat; 4]> {
    let near = geometry.near_range_m;
    let far = geometry.far_range();
    let half_az = geometry.azimuth_length_m / 2.0;

    let corners = [
        offset_from_center(geometry, near, -half_az),
        offset_from_center(geometry, near, half_az),
        offset_from_center(geometry, far, half_az),
        offset_from_center(geometry, far, -half_az),
    ];

    corners.iter().all(LonLat::is_finite).then_some(corners)
}

/// Footprint corners, degrading to a minimal square at the origin when the
/// inputs produce invalid coordinates.
pub fn corners(geometry: &SwathGeometry) -> [LonLat; 4] {
    match try_corners(geometry) {
        Some(corners) => corners,
        None => {
            log::error!(
                "Non-finite swath corners, using fallback footprint: {:?}",
                geometry
            );
            fallback_corners()
        }
    }
}

pub fn fallback_corners() -> [LonLat; 4] {
    let s = FALLBACK_SQUARE_DEG;
    [
        LonLat { lon_deg: 0.0, lat_deg: 0.0 },
        LonLat { lon_deg: 0.0, lat_deg: s },
        LonLat { lon_deg: s, lat_deg: s },
        LonLat { lon_deg: s, lat_deg: 0.0 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> SwathGeometry {
        SwathGeometry::with_ranges(100_000.0, 150_000.0, 50_000.0, 0.0, 0.0, 0.0)
    }

    #[test]
    fn equatorial_north_heading_corners() {
        let c = corners(&reference());
        let near = (100_000.0 / EARTH_RADIUS_M).to_degrees();
        let far = (150_000.0 / EARTH_RADIUS_M).to_degrees();
        let half = (25_000.0 / EARTH_RADIUS_M).to_degrees();

        assert!((c[0].lon_deg - near).abs() < 1e-9 && (c[0].lat_deg + half).abs() < 1e-9);
        assert!((c[1].lon_deg - near).abs() < 1e-9 && (c[1].lat_deg - half).abs() < 1e-9);
        assert!((c[2].lon_deg - far).abs() < 1e-9 && (c[2].lat_deg - half).abs() < 1e-9);
        assert!((c[3].lon_deg - far).abs() < 1e-9 && (c[3].lat_deg + half).abs() < 1e-9);
    }

    #[test]
    fn azimuth_pairs_mirror_and_near_precedes_far() {
        let c = corners(&reference());
        // -azimuth and +azimuth corners mirror each other across the
        // cross-track line through the center
        assert!((c[0].lat_deg + c[1].lat_deg).abs() < 1e-12);
        assert!((c[2].lat_deg + c[3].lat_deg).abs() < 1e-12);
        assert!((c[0].lon_deg - c[1].lon_deg).abs() < 1e-12);
        assert!((c[2].lon_deg - c[3].lon_deg).abs() < 1e-12);
        // near edge is closer to the ground track than the far edge
        assert!(c[0].lon_deg < c[3].lon_deg);
        assert!(c[1].lon_deg < c[2].lon_deg);
    }

    #[test]
    fn swath_width_derives_far_range() {
        let mut g = reference();
        g.far_range_m = None;
        g.swath_width_m = Some(50_000.0);
        assert_eq!(g.far_range(), 150_000.0);
        assert_eq!(corners(&g), corners(&reference()));

        g.far_range_m = Some(120_000.0);
        assert_eq!(g.far_range(), 120_000.0);
        assert_eq!(g.swath_width(), 20_000.0);
    }

    #[test]
    fn heading_rotates_cross_track_direction() {
        let mut g = reference();
        g.heading_deg = 90.0;
        let c = corners(&g);
        // heading east: cross-track points south, along-track points east
        assert!(c[0].lat_deg < 0.0 && c[3].lat_deg < c[0].lat_deg);
        assert!(c[0].lon_deg < 0.0 && c[1].lon_deg > 0.0);
    }

    #[test]
    fn non_finite_input_falls_back() {
        let mut g = reference();
        g.center_lat_deg = f64::NAN;
        assert!(try_corners(&g).is_none());
        assert_eq!(corners(&g), fallback_corners());
    }

    #[test]
    fn with_ranges_keeps_invariants() {
        let g = SwathGeometry::with_ranges(200.0, 100.0, -5.0, 0.0, 0.0, 0.0);
        assert_eq!(g.far_range(), 200.0);
        assert_eq!(g.swath_width(), 0.0);
        assert_eq!(g.azimuth_length_m, 0.0);
    }
}
