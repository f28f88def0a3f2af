use std::collections::VecDeque;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::orbit::SatelliteState;
use crate::swath::{SwathGeometry, EARTH_RADIUS_M};

/// One radar firing with the geometry and state it was fired under.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pulse {
    pub pulse_id: u64,
    pub timestamp_ms: i64,
    pub swath_id: String,
    pub state: SatelliteState,
    pub geometry: SwathGeometry,
}

/// FIFO of pulses awaiting batch dispatch.
#[derive(Debug, Default)]
pub struct PulseBatchAccumulator {
    pulses: VecDeque<Pulse>,
    next_id: u64,
}

impl PulseBatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn add_pulse(
        &mut self,
        swath_id: String,
        geometry: SwathGeometry,
        state: SatelliteState,
    ) -> u64 {
        self.add_pulse_at(swath_id, geometry, state, Utc::now().timestamp_millis())
    }

    pub fn add_pulse_at(
        &mut self,
        swath_id: String,
        geometry: SwathGeometry,
        state: SatelliteState,
        timestamp_ms: i64,
    ) -> u64 {
        let pulse_id = self.next_id;
        self.next_id += 1;
        self.pulses.push_back(Pulse {
            pulse_id,
            timestamp_ms,
            swath_id,
            state,
            geometry,
        });
        pulse_id
    }

    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    pub fn is_batch_ready(&self, batch_size: usize) -> bool {
        self.pulses.len() >= batch_size
    }

    #[allow(dead_code)]
    pub fn is_batch_ready_by_time(&self, prf: f64, batch_time_s: f64) -> bool {
        self.is_batch_ready_by_time_at(prf, batch_time_s, Utc::now().timestamp_millis())
    }

    /// Time-based readiness measured from the oldest queued pulse. A
    /// non-positive PRF never triggers.
    pub fn is_batch_ready_by_time_at(&self, prf: f64, batch_time_s: f64, now_ms: i64) -> bool {
        if prf.is_nan() || prf <= 0.0 {
            return false;
        }
        match self.pulses.front() {
            Some(first) => (now_ms - first.timestamp_ms) as f64 / 1000.0 >= batch_time_s,
            None => false,
        }
    }

    /// The first `batch_size` pulses, or nothing when fewer are queued.
    #[allow(dead_code)]
    pub fn get_pulse_batch(&self, batch_size: usize) -> Vec<&Pulse> {
        if batch_size == 0 || self.pulses.len() < batch_size {
            return Vec::new();
        }
        self.pulses.range(..batch_size).collect()
    }

    /// Drop the first `batch_size` pulses when at least that many exist.
    #[allow(dead_code)]
    pub fn clear_batch(&mut self, batch_size: usize) -> bool {
        if self.pulses.len() < batch_size {
            return false;
        }
        self.pulses.drain(..batch_size);
        true
    }

    /// Read and clear a full batch in one step.
    pub fn take_batch(&mut self, batch_size: usize) -> Option<Vec<Pulse>> {
        if batch_size == 0 || self.pulses.len() < batch_size {
            return None;
        }
        Some(self.pulses.drain(..batch_size).collect())
    }

    #[allow(dead_code)]
    pub fn get_merged_swath_geometry(&self, batch_size: usize) -> Option<SwathGeometry> {
        let batch = self.get_pulse_batch(batch_size);
        merge_geometries(batch.iter().map(|p| &p.geometry))
    }

    /// Empty the queue and restart pulse ids.
    pub fn clear_pulses(&mut self) {
        self.pulses.clear();
        self.next_id = 0;
    }
}

/// Merge a batch of footprints into one: range extremes, mean center,
/// along-track extent spanning first to last center plus the mean pulse
/// azimuth length. Heading, altitude and look angle come from the first.
pub fn merge_geometries<'a, I>(geometries: I) -> Option<SwathGeometry>
where
    I: IntoIterator<Item = &'a SwathGeometry>,
{
    let geometries: Vec<&SwathGeometry> = geometries.into_iter().collect();
    let first = *geometries.first()?;
    let last = *geometries.last()?;
    let n = geometries.len() as f64;

    let near = geometries
        .iter()
        .map(|g| g.near_range_m)
        .fold(f64::INFINITY, f64::min);
    let far = geometries
        .iter()
        .map(|g| g.far_range())
        .fold(f64::NEG_INFINITY, f64::max);

    let center_lat = geometries.iter().map(|g| g.center_lat_deg).sum::<f64>() / n;
    let center_lon = geometries.iter().map(|g| g.center_lon_deg).sum::<f64>() / n;
    let mean_azimuth = geometries.iter().map(|g| g.azimuth_length_m).sum::<f64>() / n;

    let dlat = (last.center_lat_deg - first.center_lat_deg).to_radians() * EARTH_RADIUS_M;
    let dlon = (last.center_lon_deg - first.center_lon_deg).to_radians()
        * EARTH_RADIUS_M
        * center_lat.to_radians().cos();
    let track_length = (dlat * dlat + dlon * dlon).sqrt();

    Some(SwathGeometry {
        near_range_m: near,
        far_range_m: Some(far),
        swath_width_m: Some(far - near),
        azimuth_length_m: track_length + mean_azimuth,
        center_lat_deg: center_lat,
        center_lon_deg: center_lon,
        heading_deg: first.heading_deg,
        satellite_altitude_m: first.satellite_altitude_m,
        look_angle_deg: first.look_angle_deg,
    })
}

/// Pulses per batch for a PRF and batch duration.
pub fn calculate_batch_size(prf: f64, batch_time_s: f64) -> usize {
    let size = (prf * batch_time_s).floor();
    if size.is_finite() && size > 0.0 {
        size as usize
    } else {
        0
    }
}

/// Batch duration in seconds; zero when the PRF is zero.
pub fn calculate_batch_time(prf: f64, batch_size: usize) -> f64 {
    if prf == 0.0 || !prf.is_finite() {
        return 0.0;
    }
    batch_size as f64 / prf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::GeodeticPosition;
    use chrono::TimeZone;

    fn state() -> SatelliteState {
        SatelliteState::from_geodetic(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            GeodeticPosition {
                longitude_deg: 0.0,
                latitude_deg: 0.0,
                altitude_m: 519_000.0,
            },
            [0.0, 0.0, 7_600.0],
        )
    }

    fn geometry(near: f64, far: f64, lat: f64) -> SwathGeometry {
        let mut g = SwathGeometry::with_ranges(near, far, 5_000.0, lat, 10.0, 12.0);
        g.satellite_altitude_m = Some(519_000.0);
        g.look_angle_deg = Some(30.0);
        g
    }

    fn fill(acc: &mut PulseBatchAccumulator, n: usize) {
        for i in 0..n {
            acc.add_pulse_at(
                format!("swath-{i}"),
                geometry(100_000.0 + i as f64, 150_000.0 + i as f64, i as f64 * 0.001),
                state(),
                1_000 + i as i64,
            );
        }
    }

    #[test]
    fn batch_is_hidden_until_full() {
        let mut acc = PulseBatchAccumulator::new();
        fill(&mut acc, 4);
        assert!(!acc.is_batch_ready(5));
        assert!(acc.get_pulse_batch(5).is_empty());
        assert!(acc.get_merged_swath_geometry(5).is_none());
        assert!(!acc.clear_batch(5));
        assert_eq!(acc.len(), 4);

        fill(&mut acc, 1);
        assert!(acc.is_batch_ready(5));
        let ids: Vec<_> = acc.get_pulse_batch(5).iter().map(|p| p.pulse_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn read_then_clear_restores_previous_length() {
        let mut acc = PulseBatchAccumulator::new();
        fill(&mut acc, 3);
        let before = acc.len();
        fill(&mut acc, 7);
        assert_eq!(acc.get_pulse_batch(7).len(), 7);
        assert!(acc.clear_batch(7));
        assert_eq!(acc.len(), before);
        // FIFO: the oldest pulses were removed
        assert_eq!(acc.get_pulse_batch(1)[0].pulse_id, 7);
    }

    #[test]
    fn take_batch_drains_in_order() {
        let mut acc = PulseBatchAccumulator::new();
        fill(&mut acc, 3);
        assert!(acc.take_batch(4).is_none());
        let batch = acc.take_batch(2).unwrap();
        assert_eq!(batch.iter().map(|p| p.pulse_id).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn time_readiness_uses_oldest_pulse() {
        let mut acc = PulseBatchAccumulator::new();
        assert!(!acc.is_batch_ready_by_time_at(5930.0, 0.01, 10_000));
        acc.add_pulse_at("s".into(), geometry(1.0, 2.0, 0.0), state(), 1_000);
        acc.add_pulse_at("s".into(), geometry(1.0, 2.0, 0.0), state(), 1_009);
        assert!(!acc.is_batch_ready_by_time_at(5930.0, 0.01, 1_009));
        assert!(acc.is_batch_ready_by_time_at(5930.0, 0.01, 1_010));
        assert!(!acc.is_batch_ready_by_time_at(0.0, 0.01, 1_000_000));
    }

    #[test]
    fn clear_pulses_resets_ids() {
        let mut acc = PulseBatchAccumulator::new();
        fill(&mut acc, 3);
        acc.clear_pulses();
        assert!(acc.is_empty());
        let id = acc.add_pulse("s".into(), geometry(1.0, 2.0, 0.0), state());
        assert_eq!(id, 0);
    }

    #[test]
    fn batch_size_and_time() {
        assert_eq!(calculate_batch_size(5930.0, 0.01), 59);
        assert_eq!(calculate_batch_size(0.0, 0.01), 0);
        assert_eq!(calculate_batch_size(1000.0, -1.0), 0);
        assert_eq!(calculate_batch_time(0.0, 59), 0.0);
        assert_eq!(calculate_batch_time(0.0, 0), 0.0);
        assert!((calculate_batch_time(5930.0, 59) - 59.0 / 5930.0).abs() < 1e-15);
    }

    #[test]
    fn prf_5930_scenario_merges_range_extremes() {
        let batch_size = calculate_batch_size(5930.0, 0.01);
        let mut acc = PulseBatchAccumulator::new();
        fill(&mut acc, batch_size);
        assert!(acc.is_batch_ready(59));

        let merged = acc.get_merged_swath_geometry(59).unwrap();
        assert_eq!(merged.near_range_m, 100_000.0);
        assert_eq!(merged.far_range_m, Some(150_058.0));
        assert_eq!(merged.swath_width_m, Some(50_058.0));
        assert_eq!(merged.heading_deg, 12.0);
        assert_eq!(merged.look_angle_deg, Some(30.0));
        assert!((merged.center_lat_deg - 0.029).abs() < 1e-12);
        assert!((merged.center_lon_deg - 10.0).abs() < 1e-12);

        let track = (0.058f64).to_radians() * EARTH_RADIUS_M;
        assert!((merged.azimuth_length_m - (track + 5_000.0)).abs() < 1e-6);
    }

    #[test]
    fn merge_uses_cosine_of_mean_latitude_for_longitude_span() {
        let mut a = geometry(1.0, 2.0, 60.0);
        let mut b = geometry(1.0, 2.0, 60.0);
        a.center_lon_deg = 0.0;
        b.center_lon_deg = 1.0;
        a.azimuth_length_m = 0.0;
        b.azimuth_length_m = 0.0;
        let merged = merge_geometries([&a, &b]).unwrap();
        let expected = (1.0f64).to_radians() * EARTH_RADIUS_M * 0.5;
        assert!((merged.azimuth_length_m - expected).abs() < 1e-6);
        assert!(merge_geometries(std::iter::empty()).is_none());
    }
}
