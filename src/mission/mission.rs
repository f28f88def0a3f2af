use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::{BatchTrigger, ConfigError, MissionConfig, RadarConfig, TrackingConfig};
use crate::echo::EchoError;
use crate::mission::observer::{BatchReady, Observers, PositionUpdate};
use crate::orbit::frames::{direction, geodetic_to_ecef};
use crate::orbit::{
    GeodeticPosition, HeadingCalculator, OrbitError, OrbitPropagator, PositionSmoother,
    SatelliteState,
};
use crate::pulse::{merge_geometries, to_targets, GridSettings, PulseBatchAccumulator};
use crate::swath::{
    self, offset_from_center, SwathGeometry, SwathGroup, SwathGroupManager, SwathInstance,
    SwathManager, SwathMode, SyncReport, VisualizationOptions,
};

#[derive(Debug, Error)]
pub enum MissionError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("orbit error: {0}")]
    Orbit(#[from] OrbitError),
    #[error("echo client error: {0}")]
    Echo(#[from] EchoError),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MissionStatus {
    Idle,
    Tracking {
        started_at: DateTime<Utc>,
        group_id: String,
    },
}

/// Result of one tick that produced a position update.
#[derive(Debug, Clone)]
pub struct TickReport {
    /// `None` when the batch settings can never fire, so nothing is queued.
    pub pulse_id: Option<u64>,
    pub update: PositionUpdate,
    pub batch: Option<BatchReady>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MissionSnapshot {
    pub status: MissionStatus,
    pub orbit: String,
    pub last_update: Option<PositionUpdate>,
    pub queued_pulses: usize,
    pub swaths: usize,
    pub batch_size: usize,
    pub batch_time_s: f64,
    pub batches_emitted: u64,
    pub skipped_ticks: u64,
}

/// Per-tick pipeline: propagation, heading, smoothing, footprint, pulse
/// queueing and batch dispatch, in that order.
pub struct Mission {
    radar: RadarConfig,
    tracking: TrackingConfig,
    grid: GridSettings,
    propagator: OrbitPropagator,
    heading: HeadingCalculator,
    smoother: PositionSmoother,
    accumulator: PulseBatchAccumulator,
    swaths: SwathManager,
    groups: SwathGroupManager,
    realtime_swaths: VecDeque<String>,
    observers: Observers,
    status: MissionStatus,
    last_update: Option<PositionUpdate>,
    batch_size: usize,
    batch_time_s: f64,
    batches_emitted: u64,
    skipped_ticks: u64,
}

impl Mission {
    pub fn new(config: &MissionConfig, propagator: OrbitPropagator) -> Self {
        let grid = config
            .echo
            .as_ref()
            .map(|e| e.grid)
            .unwrap_or_default();
        Self {
            radar: config.radar.clone(),
            tracking: config.tracking.clone(),
            grid,
            heading: HeadingCalculator::new(config.tracking.heading_offset_deg),
            propagator,
            smoother: PositionSmoother::new(),
            accumulator: PulseBatchAccumulator::new(),
            swaths: SwathManager::new(),
            groups: SwathGroupManager::new(),
            realtime_swaths: VecDeque::new(),
            observers: Observers::new(),
            status: MissionStatus::Idle,
            last_update: None,
            batch_size: config.batch_size(),
            batch_time_s: config.batch_time_s(),
            batches_emitted: 0,
            skipped_ticks: 0,
        }
    }

    pub fn from_config(config: &MissionConfig, now: DateTime<Utc>) -> Result<Self, MissionError> {
        let propagator = config.build_propagator(now)?;
        Ok(Self::new(config, propagator))
    }

    pub fn status(&self) -> &MissionStatus {
        &self.status
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.status, MissionStatus::Tracking { .. })
    }

    pub fn observers_mut(&mut self) -> &mut Observers {
        &mut self.observers
    }

    pub fn queued_pulses(&self) -> usize {
        self.accumulator.len()
    }

    /// Begin tracking. Calling it while tracking returns the running group.
    pub fn start_tracking(&mut self, now: DateTime<Utc>) -> String {
        if let MissionStatus::Tracking { group_id, .. } = &self.status {
            return group_id.clone();
        }

        let group_id = self.groups.start_realtime_group();
        self.accumulator.clear_pulses();
        self.smoother.reset();
        if !self.can_batch() {
            log::warn!(
                "{:?} trigger cannot fire at PRF {} Hz, pulses will not be queued",
                self.tracking.batch_trigger,
                self.radar.prf
            );
        }
        self.status = MissionStatus::Tracking {
            started_at: now,
            group_id: group_id.clone(),
        };
        log::info!(
            "Tracking started ({}), realtime group {}, {} observers",
            self.propagator.describe(),
            group_id,
            self.observers.len()
        );
        group_id
    }

    /// Stop tracking: end the realtime group and discard queued pulses.
    pub fn stop_tracking(&mut self) -> Option<String> {
        if !self.is_tracking() {
            return None;
        }
        self.status = MissionStatus::Idle;
        let ended = self.groups.end_realtime_group();
        let dropped = self.accumulator.len();
        self.accumulator.clear_pulses();
        self.smoother.reset();
        log::info!("Tracking stopped, {} queued pulses dropped", dropped);
        ended
    }

    /// Run one tick. Returns `None` when idle or when this tick's update had
    /// to be skipped; the previous state is kept in that case.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<TickReport> {
        if !self.is_tracking() {
            return None;
        }

        let (mut state, heading_deg) = match self.propagate(now) {
            Ok(result) => result,
            Err(e) => {
                self.skipped_ticks += 1;
                log::warn!("No position for tick at {}: {}", now, e);
                return None;
            }
        };

        let displayed_ecef_m = self.smoother.update(state.position_ecef_m);

        let geometry = self.tracking.swath.geometry_at(
            state.position.latitude_deg,
            state.position.longitude_deg,
            heading_deg,
            Some(state.position.altitude_m),
        );
        let corners = swath::corners(&geometry);
        state.beam_direction = beam_direction(&state, &geometry);

        let group_id = self.groups.start_realtime_group();
        if let MissionStatus::Tracking { group_id: current, .. } = &mut self.status {
            if *current != group_id {
                log::info!("Realtime group {} replaced by {}", current, group_id);
                *current = group_id.clone();
            }
        }

        let swath_id = self.swaths.add(
            SwathMode::RealtimeTracking,
            geometry.clone(),
            VisualizationOptions::for_mode(SwathMode::RealtimeTracking),
            None,
        );
        self.groups
            .add_swath_to_group(&group_id, &swath_id, &mut self.swaths);
        self.retain_realtime_swath(swath_id.clone());

        let pulse_id = self.can_batch().then(|| {
            self.accumulator.add_pulse_at(
                swath_id,
                geometry.clone(),
                state.clone(),
                now.timestamp_millis(),
            )
        });

        let update = PositionUpdate {
            state,
            displayed_ecef_m,
            heading_deg,
            geometry,
            corners,
        };

        let batch = self.take_ready_batch(now, &group_id);
        if let Some(batch) = &batch {
            self.observers.notify_batch(batch);
        }
        self.observers.notify_position(&update);
        self.last_update = Some(update.clone());

        Some(TickReport {
            pulse_id,
            update,
            batch,
        })
    }

    fn propagate(&mut self, now: DateTime<Utc>) -> Result<(SatelliteState, f64), OrbitError> {
        let state = self.propagator.advance(now)?;
        let heading = self.heading.heading(&self.propagator, now)?;
        Ok((state, heading))
    }

    /// Whether the configured trigger can ever release a batch.
    fn can_batch(&self) -> bool {
        match self.tracking.batch_trigger {
            BatchTrigger::Count => self.batch_size > 0,
            BatchTrigger::Time => self.radar.prf.is_finite() && self.radar.prf > 0.0,
        }
    }

    /// Keep at most `max_realtime_swaths` realtime footprints, evicting the
    /// oldest from both the swath manager and its group.
    fn retain_realtime_swath(&mut self, swath_id: String) {
        self.realtime_swaths.push_back(swath_id);
        while self.realtime_swaths.len() > self.tracking.max_realtime_swaths {
            let Some(oldest) = self.realtime_swaths.pop_front() else {
                break;
            };
            self.groups.remove_swath(&oldest, &mut self.swaths);
        }
    }

    /// Read, merge and clear a ready batch in a single step so no pulse can
    /// be queued between reading and clearing.
    fn take_ready_batch(&mut self, now: DateTime<Utc>, group_id: &str) -> Option<BatchReady> {
        let take = match self.tracking.batch_trigger {
            BatchTrigger::Count => {
                if self.batch_size == 0 || !self.accumulator.is_batch_ready(self.batch_size) {
                    return None;
                }
                self.batch_size
            }
            BatchTrigger::Time => {
                if !self.accumulator.is_batch_ready_by_time_at(
                    self.radar.prf,
                    self.tracking.batch_time_s,
                    now.timestamp_millis(),
                ) {
                    return None;
                }
                self.accumulator.len()
            }
        };

        let pulses = self.accumulator.take_batch(take)?;
        let geometry = merge_geometries(pulses.iter().map(|p| &p.geometry))?;
        let targets = to_targets(&geometry, &self.grid);
        self.batches_emitted += 1;

        log::info!(
            "Batch {} ready: {} pulses, {} targets, swath {:.0} m x {:.0} m",
            self.batches_emitted,
            pulses.len(),
            targets.len(),
            geometry.swath_width(),
            geometry.azimuth_length_m
        );

        Some(BatchReady {
            group_id: Some(group_id.to_string()),
            pulses,
            geometry,
            targets,
        })
    }

    pub fn snapshot(&self) -> MissionSnapshot {
        MissionSnapshot {
            status: self.status.clone(),
            orbit: self.propagator.describe(),
            last_update: self.last_update.clone(),
            queued_pulses: self.accumulator.len(),
            swaths: self.swaths.len(),
            batch_size: self.batch_size,
            batch_time_s: self.batch_time_s,
            batches_emitted: self.batches_emitted,
            skipped_ticks: self.skipped_ticks,
        }
    }

    pub fn list_groups(&self) -> Vec<SwathGroup> {
        self.groups.list_groups().into_iter().cloned().collect()
    }

    pub fn get_group(&self, id: &str) -> Option<SwathGroup> {
        self.groups.get_group(id).cloned()
    }

    pub fn create_group(&mut self, mode: SwathMode, name: Option<String>) -> String {
        self.groups.create_group(mode, name)
    }

    pub fn end_group(&mut self, id: &str) -> bool {
        self.groups.end_group(id)
    }

    pub fn remove_group(&mut self, id: &str) -> bool {
        self.groups.remove_group(id, &mut self.swaths)
    }

    pub fn add_swath(
        &mut self,
        mode: SwathMode,
        geometry: SwathGeometry,
        group_id: Option<&str>,
    ) -> Option<String> {
        let id = self
            .swaths
            .add(mode, geometry, VisualizationOptions::for_mode(mode), None);
        if let Some(group_id) = group_id {
            if !self.groups.add_swath_to_group(group_id, &id, &mut self.swaths) {
                self.swaths.remove(&id);
                return None;
            }
        }
        Some(id)
    }

    pub fn remove_swath(&mut self, id: &str) -> bool {
        self.groups.remove_swath(id, &mut self.swaths)
    }

    pub fn list_swaths(&self) -> Vec<SwathInstance> {
        self.swaths.list().into_iter().cloned().collect()
    }

    pub fn sync_groups(&mut self) -> SyncReport {
        self.groups.sync_swaths_from_manager(&self.swaths)
    }
}

/// Unit vector from the satellite to the mid-range point of the swath.
fn beam_direction(state: &SatelliteState, geometry: &SwathGeometry) -> Option<[f64; 3]> {
    let mid_range = (geometry.near_range_m + geometry.far_range()) / 2.0;
    let aim = offset_from_center(geometry, mid_range, 0.0);
    if !aim.is_finite() {
        return None;
    }
    let ground = geodetic_to_ecef(&GeodeticPosition {
        longitude_deg: aim.lon_deg,
        latitude_deg: aim.lat_deg,
        altitude_m: 0.0,
    });
    direction(state.position_ecef_m, ground)
}
