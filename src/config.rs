use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::orbit::{OrbitError, OrbitPropagator, OrbitSource, TleCatalog, TleOrbit};
use crate::pulse::{calculate_batch_size, calculate_batch_time, GridSettings};
use crate::swath::SwathGeometry;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MissionConfig {
    pub radar: RadarConfig,
    pub orbit: OrbitConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub echo: Option<EchoConfig>,
    #[serde(default)]
    pub web: WebConfig,
}

/// Radar parameters forwarded verbatim to the echo simulation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RadarConfig {
    pub fc: f64,
    pub bw: f64,
    pub fs: f64,
    pub taup: f64,
    pub prf: f64,
    pub swst: f64,
    pub swl: f64,
    pub orbit_height: f64,
    pub antenna_width: f64,
    pub antenna_height: f64,
    pub antenna_roll_angle: f64,
    pub antenna_pitch_angle: f64,
    pub antenna_yaw_angle: f64,
    #[serde(rename = "Pt")]
    pub pt: f64,
    #[serde(rename = "G_recv")]
    pub g_recv: f64,
    #[serde(rename = "NF")]
    pub nf: f64,
    #[serde(rename = "Loss")]
    pub loss: f64,
    #[serde(rename = "Tsys")]
    pub tsys: f64,
    pub adc_bits: u32,
    pub beam_id: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OrbitConfig {
    Tle {
        tle: String,
    },
    TleFile {
        tle_file: PathBuf,
        #[serde(default)]
        norad_id: Option<u64>,
    },
    Manual {
        manual: ManualStateConfig,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManualStateConfig {
    pub position_ecef_m: [f64; 3],
    pub velocity_ecef_m_s: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchTrigger {
    #[default]
    Count,
    Time,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_tick_interval", deserialize_with = "deserialize_duration")]
    pub tick_interval: Duration,
    #[serde(default)]
    pub heading_offset_deg: f64,
    #[serde(default = "default_batch_time")]
    pub batch_time_s: f64,
    #[serde(default)]
    pub batch_trigger: BatchTrigger,
    #[serde(default)]
    pub swath: SwathConfig,
    /// Realtime footprints kept before the oldest are evicted.
    #[serde(default = "default_max_realtime_swaths")]
    pub max_realtime_swaths: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            heading_offset_deg: 0.0,
            batch_time_s: default_batch_time(),
            batch_trigger: BatchTrigger::default(),
            swath: SwathConfig::default(),
            max_realtime_swaths: default_max_realtime_swaths(),
        }
    }
}

fn default_max_realtime_swaths() -> usize {
    2000
}

fn default_tick_interval() -> Duration {
    Duration::from_millis(50)
}

fn default_batch_time() -> f64 {
    0.01
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwathConfig {
    pub near_range_m: f64,
    #[serde(default)]
    pub far_range_m: Option<f64>,
    #[serde(default)]
    pub swath_width_m: Option<f64>,
    pub azimuth_length_m: f64,
    #[serde(default)]
    pub look_angle_deg: Option<f64>,
}

impl Default for SwathConfig {
    fn default() -> Self {
        Self {
            near_range_m: 100_000.0,
            far_range_m: Some(150_000.0),
            swath_width_m: None,
            azimuth_length_m: 50_000.0,
            look_angle_deg: None,
        }
    }
}

impl SwathConfig {
    /// Footprint template centered on the given sub-satellite point.
    pub fn geometry_at(
        &self,
        center_lat_deg: f64,
        center_lon_deg: f64,
        heading_deg: f64,
        satellite_altitude_m: Option<f64>,
    ) -> SwathGeometry {
        let mut geometry = SwathGeometry {
            near_range_m: self.near_range_m,
            far_range_m: self.far_range_m,
            swath_width_m: self.swath_width_m,
            azimuth_length_m: self.azimuth_length_m,
            center_lat_deg,
            center_lon_deg,
            heading_deg,
            satellite_altitude_m,
            look_angle_deg: self.look_angle_deg,
        };
        let far = geometry.far_range();
        geometry.far_range_m = Some(far);
        geometry.swath_width_m = Some(far - geometry.near_range_m);
        geometry
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EchoConfig {
    pub url: String,
    #[serde(default = "default_echo_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(flatten)]
    pub grid: GridSettings,
}

fn default_echo_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl MissionConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: MissionConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if !self.radar.prf.is_finite() || self.radar.prf < 0.0 {
            return invalid("radar.prf must be a non-negative number");
        }
        if self.tracking.batch_time_s < 0.0 {
            return invalid("tracking.batch_time_s must be non-negative");
        }
        if self.tracking.tick_interval.is_zero() {
            return invalid("tracking.tick_interval must be positive");
        }
        if self.tracking.max_realtime_swaths == 0 {
            return invalid("tracking.max_realtime_swaths must be positive");
        }

        let swath = &self.tracking.swath;
        if swath.near_range_m < 0.0 || swath.azimuth_length_m < 0.0 {
            return invalid("swath ranges must be non-negative");
        }
        if let Some(far) = swath.far_range_m {
            if far < swath.near_range_m {
                return invalid("swath.far_range_m must not be below near_range_m");
            }
        }
        if let Some(width) = swath.swath_width_m {
            if width < 0.0 {
                return invalid("swath.swath_width_m must be non-negative");
            }
        }

        if let Some(echo) = &self.echo {
            if echo.grid.range_resolution_m <= 0.0 || echo.grid.azimuth_resolution_m <= 0.0 {
                return invalid("echo resolutions must be positive");
            }
        }
        Ok(())
    }

    pub fn batch_size(&self) -> usize {
        calculate_batch_size(self.radar.prf, self.tracking.batch_time_s)
    }

    pub fn batch_time_s(&self) -> f64 {
        calculate_batch_time(self.radar.prf, self.batch_size())
    }

    /// Build the propagator described by the `orbit` section. Manual states
    /// are anchored at `now`.
    pub fn build_propagator(&self, now: DateTime<Utc>) -> Result<OrbitPropagator, OrbitError> {
        match &self.orbit {
            OrbitConfig::Tle { tle } => OrbitPropagator::from_tle(tle),
            OrbitConfig::TleFile { tle_file, norad_id } => {
                let mut catalog = TleCatalog::new(tle_file.clone());
                catalog.load_all()?;
                let orbit: TleOrbit = catalog.orbit(*norad_id)?;
                Ok(OrbitPropagator::new(OrbitSource::Tle(orbit)))
            }
            OrbitConfig::Manual { manual } => Ok(OrbitPropagator::from_manual(
                manual.position_ecef_m,
                manual.velocity_ecef_m_s,
                now,
            )),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::orbit::fixtures::ISS_TLE;

    pub fn radar() -> RadarConfig {
        RadarConfig {
            fc: 5.4e9,
            bw: 1.0e8,
            fs: 1.2e8,
            taup: 2.0e-5,
            prf: 5930.0,
            swst: 1.0e-4,
            swl: 5.0e-5,
            orbit_height: 519_000.0,
            antenna_width: 5.0,
            antenna_height: 1.0,
            antenna_roll_angle: 30.0,
            antenna_pitch_angle: 0.0,
            antenna_yaw_angle: 0.0,
            pt: 1000.0,
            g_recv: 30.0,
            nf: 3.0,
            loss: 3.0,
            tsys: 290.0,
            adc_bits: 12,
            beam_id: 0,
        }
    }

    const RADAR_YAML: &str = "
radar:
  fc: 5.4e9
  bw: 1.0e8
  fs: 1.2e8
  taup: 2.0e-5
  prf: 5930
  swst: 1.0e-4
  swl: 5.0e-5
  orbit_height: 519000
  antenna_width: 5.0
  antenna_height: 1.0
  antenna_roll_angle: 30
  antenna_pitch_angle: 0
  antenna_yaw_angle: 0
  Pt: 1000
  G_recv: 30
  NF: 3
  Loss: 3
  Tsys: 290
  adc_bits: 12
  beam_id: 0
";

    fn indent(text: &str) -> String {
        text.lines().map(|l| format!("    {l}\n")).collect()
    }

    #[test]
    fn full_config_parses_with_durations_and_defaults() {
        let yaml = format!(
            "{RADAR_YAML}
orbit:
  tle: |
{}
tracking:
  tick_interval: 100ms
  batch_trigger: time
  swath:
    near_range_m: 100000
    swath_width_m: 40000
    azimuth_length_m: 50000
echo:
  url: http://127.0.0.1:9000/simulate
  timeout: 5s
  range_resolution_m: 500
",
            indent(ISS_TLE)
        );
        let config = MissionConfig::from_str(&yaml).unwrap();

        assert_eq!(config.radar, radar());
        assert_eq!(config.tracking.tick_interval, Duration::from_millis(100));
        assert_eq!(config.tracking.batch_trigger, BatchTrigger::Time);
        assert_eq!(config.tracking.max_realtime_swaths, 2000);
        assert_eq!(config.batch_size(), 59);
        assert!((config.batch_time_s() - 59.0 / 5930.0).abs() < 1e-15);

        let echo = config.echo.as_ref().unwrap();
        assert_eq!(echo.timeout, Duration::from_secs(5));
        assert_eq!(echo.grid.range_resolution_m, 500.0);
        assert_eq!(echo.grid.azimuth_resolution_m, 1000.0);
        assert_eq!(config.web.bind, "0.0.0.0:8080");

        let g = config.tracking.swath.geometry_at(1.0, 2.0, 3.0, None);
        assert_eq!(g.far_range_m, Some(140_000.0));
        assert!(config.build_propagator(Utc::now()).is_ok());
    }

    #[test]
    fn manual_orbit_section() {
        let yaml = format!(
            "{RADAR_YAML}
orbit:
  manual:
    position_ecef_m: [7000000, 0, 0]
    velocity_ecef_m_s: [0, 7500, 0]
"
        );
        let config = MissionConfig::from_str(&yaml).unwrap();
        let propagator = config.build_propagator(Utc::now()).unwrap();
        assert!(matches!(propagator.source(), OrbitSource::Manual(_)));
        assert!(config.echo.is_none());
    }

    #[test]
    fn radar_fields_serialize_with_service_names() {
        let json = serde_json::to_value(radar()).unwrap();
        assert_eq!(json["Pt"], 1000.0);
        assert_eq!(json["G_recv"], 30.0);
        assert_eq!(json["Tsys"], 290.0);
        assert!(json.get("pt").is_none());
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let yaml = format!(
            "{RADAR_YAML}
orbit:
  tle: x
tracking:
  swath:
    near_range_m: 200000
    far_range_m: 100000
    azimuth_length_m: 1000
"
        );
        assert!(matches!(
            MissionConfig::from_str(&yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn zero_swath_retention_is_rejected() {
        let yaml = format!(
            "{RADAR_YAML}
orbit:
  tle: x
tracking:
  max_realtime_swaths: 0
"
        );
        assert!(matches!(
            MissionConfig::from_str(&yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn config_loads_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            format!("{RADAR_YAML}\norbit:\n  tle_file: /tmp/none.tle\n"),
        )
        .unwrap();
        let config = MissionConfig::from_file(file.path()).unwrap();
        assert!(matches!(config.orbit, OrbitConfig::TleFile { .. }));
        assert!(config.build_propagator(Utc::now()).is_err());
    }
}
