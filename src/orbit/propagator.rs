use chrono::{DateTime, Duration, Utc};
use sgp4::{Constants, Elements};

use crate::orbit::frames::{ecef_to_geodetic, teme_to_ecef_position, teme_to_ecef_velocity};
use crate::orbit::parsing::parse_tle_lines;
use crate::orbit::{OrbitError, SatelliteState};

/// Extrapolation span after which a manual state is considered stale.
/// Linear ECEF motion ignores gravity, so a LEO track drifts by kilometres
/// within a few minutes.
pub const MANUAL_STATE_VALIDITY: Duration = Duration::seconds(60);

pub struct TleOrbit {
    elements: Elements,
    constants: Constants,
}

impl TleOrbit {
    pub fn from_tle(tle: &str) -> Result<Self, OrbitError> {
        let (name, line1, line2) = parse_tle_lines(tle)?;
        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())?;
        Self::from_elements(elements)
    }

    pub fn from_elements(elements: Elements) -> Result<Self, OrbitError> {
        let constants = Constants::from_elements(&elements)?;
        Ok(Self {
            elements,
            constants,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.elements.object_name.as_deref()
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }

    pub fn propagate(&self, timestamp: DateTime<Utc>) -> Result<SatelliteState, OrbitError> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
            .map_err(|e| OrbitError::Propagation(e.to_string()))?;

        let prediction = self.constants.propagate(minutes)?;

        let sidereal = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(
            &timestamp.naive_utc(),
        ));

        let pos_km = teme_to_ecef_position(prediction.position, sidereal);
        let vel_km_s = teme_to_ecef_velocity(prediction.position, prediction.velocity, sidereal);
        let position_ecef_m = pos_km.map(|c| c * 1000.0);
        let velocity_ecef_m_s = vel_km_s.map(|c| c * 1000.0);

        let position = ecef_to_geodetic(position_ecef_m);
        if !position.is_finite() || velocity_ecef_m_s.iter().any(|c| !c.is_finite()) {
            return Err(OrbitError::Propagation(format!(
                "non-finite state at {timestamp}"
            )));
        }

        Ok(SatelliteState {
            timestamp,
            position,
            position_ecef_m,
            velocity_ecef_m_s,
            beam_direction: None,
        })
    }
}

/// Directly supplied position and velocity, advanced by first-order Euler steps.
#[derive(Debug, Clone)]
pub struct ManualState {
    position_ecef_m: [f64; 3],
    velocity_ecef_m_s: [f64; 3],
    last_tick: DateTime<Utc>,
    supplied_at: DateTime<Utc>,
    stale_warned: bool,
}

impl ManualState {
    pub fn new(
        position_ecef_m: [f64; 3],
        velocity_ecef_m_s: [f64; 3],
        supplied_at: DateTime<Utc>,
    ) -> Self {
        Self {
            position_ecef_m,
            velocity_ecef_m_s,
            last_tick: supplied_at,
            supplied_at,
            stale_warned: false,
        }
    }

    fn state(&self) -> SatelliteState {
        SatelliteState {
            timestamp: self.last_tick,
            position: ecef_to_geodetic(self.position_ecef_m),
            position_ecef_m: self.position_ecef_m,
            velocity_ecef_m_s: self.velocity_ecef_m_s,
            beam_direction: None,
        }
    }

    /// Position `timestamp` would have without mutating the stored state.
    fn sample(&self, timestamp: DateTime<Utc>) -> SatelliteState {
        let dt = seconds_between(self.last_tick, timestamp);
        let position_ecef_m = euler_step(self.position_ecef_m, self.velocity_ecef_m_s, dt);
        SatelliteState {
            timestamp,
            position: ecef_to_geodetic(position_ecef_m),
            position_ecef_m,
            velocity_ecef_m_s: self.velocity_ecef_m_s,
            beam_direction: None,
        }
    }

    fn step(&mut self, now: DateTime<Utc>) -> SatelliteState {
        let dt = seconds_between(self.last_tick, now);
        if dt <= 0.0 {
            return self.state();
        }

        self.position_ecef_m = euler_step(self.position_ecef_m, self.velocity_ecef_m_s, dt);
        self.last_tick = now;

        if !self.stale_warned && now - self.supplied_at > MANUAL_STATE_VALIDITY {
            log::warn!(
                "manual state extrapolated for {}s without refresh; position accuracy degrades",
                (now - self.supplied_at).num_seconds()
            );
            self.stale_warned = true;
        }

        self.state()
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_microseconds().unwrap_or(0) as f64 / 1e6
}

fn euler_step(position: [f64; 3], velocity: [f64; 3], dt: f64) -> [f64; 3] {
    [
        position[0] + velocity[0] * dt,
        position[1] + velocity[1] * dt,
        position[2] + velocity[2] * dt,
    ]
}

pub enum OrbitSource {
    Tle(TleOrbit),
    Manual(ManualState),
}

pub struct OrbitPropagator {
    source: OrbitSource,
}

impl OrbitPropagator {
    pub fn new(source: OrbitSource) -> Self {
        Self { source }
    }

    pub fn from_tle(tle: &str) -> Result<Self, OrbitError> {
        Ok(Self::new(OrbitSource::Tle(TleOrbit::from_tle(tle)?)))
    }

    pub fn from_manual(
        position_ecef_m: [f64; 3],
        velocity_ecef_m_s: [f64; 3],
        supplied_at: DateTime<Utc>,
    ) -> Self {
        Self::new(OrbitSource::Manual(ManualState::new(
            position_ecef_m,
            velocity_ecef_m_s,
            supplied_at,
        )))
    }

    pub fn source(&self) -> &OrbitSource {
        &self.source
    }

    pub fn describe(&self) -> String {
        match &self.source {
            OrbitSource::Tle(orbit) => match orbit.name() {
                Some(name) => format!("tle {} ({})", name, orbit.norad_id()),
                None => format!("tle NORAD {}", orbit.norad_id()),
            },
            OrbitSource::Manual(_) => "manual state".to_string(),
        }
    }

    /// Sample the orbit at `timestamp` without advancing any state.
    pub fn propagate(&self, timestamp: DateTime<Utc>) -> Result<SatelliteState, OrbitError> {
        match &self.source {
            OrbitSource::Tle(orbit) => orbit.propagate(timestamp),
            OrbitSource::Manual(manual) => Ok(manual.sample(timestamp)),
        }
    }

    /// Per-tick update. Manual states are integrated forward to `now`;
    /// element sets are propagated afresh.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<SatelliteState, OrbitError> {
        match &mut self.source {
            OrbitSource::Tle(orbit) => orbit.propagate(now),
            OrbitSource::Manual(manual) => Ok(manual.step(now)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub const ISS_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

    pub fn iss_epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 7, 12, 21, 16, 1).unwrap()
    }

    #[test]
    fn tle_propagation_yields_leo_geodetic_position() {
        let propagator = OrbitPropagator::from_tle(ISS_TLE).unwrap();
        for minutes in [0, 10, 45, 90, 600] {
            let state = propagator
                .propagate(iss_epoch() + Duration::minutes(minutes))
                .unwrap();
            let p = state.position;
            assert!((-180.0..=180.0).contains(&p.longitude_deg));
            assert!((-90.0..=90.0).contains(&p.latitude_deg));
            assert!(p.latitude_deg.abs() <= 52.5, "inclination bound");
            assert!(
                (350_000.0..=480_000.0).contains(&p.altitude_m),
                "altitude {}",
                p.altitude_m
            );
            let speed = crate::orbit::frames::norm(state.velocity_ecef_m_s);
            assert!((6_500.0..8_000.0).contains(&speed), "speed {speed}");
        }
    }

    #[test]
    fn two_line_set_without_name_propagates() {
        let two_line: String = ISS_TLE.lines().skip(1).collect::<Vec<_>>().join("\n");
        let propagator = OrbitPropagator::from_tle(&two_line).unwrap();
        assert!(propagator.propagate(iss_epoch()).is_ok());
        assert!(propagator.describe().contains("25544"));
    }

    #[test]
    fn malformed_element_set_is_rejected() {
        let one_line = ISS_TLE.lines().nth(1).unwrap();
        assert!(matches!(
            OrbitPropagator::from_tle(one_line),
            Err(OrbitError::InvalidTleFormat(1))
        ));
    }

    #[test]
    fn manual_state_advances_linearly() {
        let t0 = iss_epoch();
        let mut propagator =
            OrbitPropagator::from_manual([7_000_000.0, 0.0, 0.0], [0.0, 7_500.0, 0.0], t0);

        let state = propagator.advance(t0 + Duration::seconds(2)).unwrap();
        assert_eq!(state.position_ecef_m, [7_000_000.0, 15_000.0, 0.0]);
        assert_eq!(state.velocity_ecef_m_s, [0.0, 7_500.0, 0.0]);

        let expected_lon = (15_000.0f64).atan2(7_000_000.0).to_degrees();
        assert!((state.position.longitude_deg - expected_lon).abs() < 1e-9);
        assert!(state.position.latitude_deg.abs() < 1e-9);
    }

    #[test]
    fn manual_state_ignores_non_positive_steps() {
        let t0 = iss_epoch();
        let mut propagator =
            OrbitPropagator::from_manual([7_000_000.0, 0.0, 0.0], [0.0, 7_500.0, 0.0], t0);
        propagator.advance(t0 + Duration::seconds(1)).unwrap();

        let same = propagator.advance(t0 + Duration::seconds(1)).unwrap();
        let earlier = propagator.advance(t0).unwrap();
        assert_eq!(same.position_ecef_m, [7_000_000.0, 7_500.0, 0.0]);
        assert_eq!(earlier.position_ecef_m, same.position_ecef_m);
    }

    #[test]
    fn manual_sampling_does_not_mutate_state() {
        let t0 = iss_epoch();
        let mut propagator =
            OrbitPropagator::from_manual([7_000_000.0, 0.0, 0.0], [0.0, 7_500.0, 0.0], t0);
        let ahead = propagator.propagate(t0 + Duration::seconds(10)).unwrap();
        assert_eq!(ahead.position_ecef_m[1], 75_000.0);

        let now = propagator.advance(t0 + Duration::seconds(1)).unwrap();
        assert_eq!(now.position_ecef_m[1], 7_500.0);
    }
}
