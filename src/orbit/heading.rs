use chrono::{DateTime, Duration, Utc};

use crate::orbit::{GeodeticPosition, OrbitError, OrbitPropagator};

/// Look-ahead used to sample the ground track direction.
pub const HEADING_LOOKAHEAD: Duration = Duration::seconds(10);

/// Initial great-circle bearing from `from` to `to`, in [0, 360).
pub fn initial_bearing_deg(from: &GeodeticPosition, to: &GeodeticPosition) -> f64 {
    let phi1 = from.latitude_deg.to_radians();
    let phi2 = to.latitude_deg.to_radians();
    let delta_lambda = (to.longitude_deg - from.longitude_deg).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();
    normalize_degrees(y.atan2(x).to_degrees())
}

/// Wrap any angle into [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

pub struct HeadingCalculator {
    offset_deg: f64,
}

impl HeadingCalculator {
    pub fn new(offset_deg: f64) -> Self {
        Self { offset_deg }
    }

    /// Ground-track heading at `timestamp`, including the mounting offset.
    pub fn heading(
        &self,
        propagator: &OrbitPropagator,
        timestamp: DateTime<Utc>,
    ) -> Result<f64, OrbitError> {
        let now = propagator.propagate(timestamp)?;
        let ahead = propagator.propagate(timestamp + HEADING_LOOKAHEAD)?;
        Ok(self.heading_between(&now.position, &ahead.position))
    }

    pub fn heading_between(&self, from: &GeodeticPosition, to: &GeodeticPosition) -> f64 {
        normalize_degrees(initial_bearing_deg(from, to) + self.offset_deg)
    }
}
