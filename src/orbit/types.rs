use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::orbit::frames::geodetic_to_ecef;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeodeticPosition {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub altitude_m: f64,
}

impl GeodeticPosition {
    pub fn is_finite(&self) -> bool {
        self.longitude_deg.is_finite()
            && self.latitude_deg.is_finite()
            && self.altitude_m.is_finite()
    }
}

/// Satellite state emitted once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SatelliteState {
    pub timestamp: DateTime<Utc>,
    pub position: GeodeticPosition,
    #[schema(value_type = Vec<f64>)]
    pub position_ecef_m: [f64; 3],
    #[schema(value_type = Vec<f64>)]
    pub velocity_ecef_m_s: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<f64>>)]
    pub beam_direction: Option<[f64; 3]>,
}

impl SatelliteState {
    #[allow(dead_code)]
    pub fn from_geodetic(
        timestamp: DateTime<Utc>,
        position: GeodeticPosition,
        velocity_ecef_m_s: [f64; 3],
    ) -> Self {
        Self {
            timestamp,
            position,
            position_ecef_m: geodetic_to_ecef(&position),
            velocity_ecef_m_s,
            beam_direction: None,
        }
    }
}
