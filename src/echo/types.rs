use serde::{Deserialize, Serialize};

use crate::config::RadarConfig;
use crate::orbit::SatelliteState;
use crate::pulse::PointTarget;

#[derive(Debug, Clone, Serialize)]
pub struct TargetRequest {
    pub position: [f64; 3],
    pub reflectivity: f64,
    pub phase: f64,
}

impl From<&PointTarget> for TargetRequest {
    fn from(target: &PointTarget) -> Self {
        Self {
            position: target.position,
            reflectivity: target.reflectivity,
            phase: target.phase,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SatelliteStateRequest {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beam_direction: Option<[f64; 3]>,
}

impl From<&SatelliteState> for SatelliteStateRequest {
    fn from(state: &SatelliteState) -> Self {
        Self {
            position: state.position_ecef_m,
            velocity: state.velocity_ecef_m_s,
            beam_direction: state.beam_direction,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EchoRequest {
    pub config: RadarConfig,
    pub targets: Vec<TargetRequest>,
    pub satellite_state: SatelliteStateRequest,
}

impl EchoRequest {
    pub fn new(config: &RadarConfig, targets: &[PointTarget], state: &SatelliteState) -> Self {
        Self {
            config: config.clone(),
            targets: targets.iter().map(TargetRequest::from).collect(),
            satellite_state: state.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EchoResponse {
    pub shape: Vec<usize>,
    pub data: String,
}
