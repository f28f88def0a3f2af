use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{EchoConfig, RadarConfig};
use crate::echo::{EchoClient, EchoError, EchoRequest};
use crate::mission::observer::{BatchReady, BatchSink, PositionSink, PositionUpdate};
use crate::mission::Mission;

/// Ships ready batches to the echo service on detached tasks.
pub struct EchoDispatcher {
    client: EchoClient,
    radar: RadarConfig,
    handle: Handle,
}

impl EchoDispatcher {
    /// Must be called from within a tokio runtime.
    pub fn new(config: &EchoConfig, radar: RadarConfig) -> Result<Self, EchoError> {
        Ok(Self {
            client: EchoClient::new(config.url.clone(), config.timeout)?,
            radar,
            handle: Handle::current(),
        })
    }
}

impl BatchSink for EchoDispatcher {
    fn on_batch(&mut self, batch: &BatchReady) {
        let Some(state) = batch.state() else {
            return;
        };
        let request = EchoRequest::new(&self.radar, &batch.targets, state);
        let client = self.client.clone();
        let (first, last) = batch.pulse_range().unwrap_or_default();

        self.handle.spawn(async move {
            let started = std::time::Instant::now();
            let result = client.simulate(&request).await.and_then(|r| r.decode());
            match result {
                Ok(samples) => log::info!(
                    "Echo for pulses {}..={}: shape {:?}, peak {:.3e}, {:?}",
                    first,
                    last,
                    samples.shape,
                    samples.peak_magnitude(),
                    started.elapsed()
                ),
                Err(e) => log::warn!("Echo request for pulses {}..={} failed: {}", first, last, e),
            }
        });
    }
}

/// Logs every `every`-th position update.
pub struct PositionLogger {
    every: u64,
    seen: u64,
}

impl PositionLogger {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            seen: 0,
        }
    }
}

impl PositionSink for PositionLogger {
    fn on_position(&mut self, update: &PositionUpdate) {
        if self.seen % self.every == 0 {
            let p = &update.state.position;
            log::info!(
                "lon {:.4} lat {:.4} alt {:.0} m heading {:.2}",
                p.longitude_deg,
                p.latitude_deg,
                p.altitude_m,
                update.heading_deg
            );
        }
        self.seen += 1;
    }
}

/// Handle to a running tick loop.
pub struct TickLoop {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<u64>,
}

impl TickLoop {
    pub fn spawn(mission: Arc<Mutex<Mission>>, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_tick_loop(mission, interval, stop_rx));
        Self { stop_tx, join }
    }

    /// Stop the loop and return how many ticks it ran.
    pub async fn stop(self) -> u64 {
        let _ = self.stop_tx.send(());
        self.join.await.unwrap_or_else(|e| {
            log::error!("tick loop task failed: {}", e);
            0
        })
    }
}

async fn run_tick_loop(
    mission: Arc<Mutex<Mission>>,
    interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) -> u64 {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = 0;

    loop {
        let should_stop = tokio::select! {
            _ = ticker.tick() => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            break;
        }

        let mut locked = mission.lock().await;
        locked.tick(Utc::now());
        ticks += 1;
    }

    log::debug!("tick loop stopped after {} ticks", ticks);
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{http::StatusCode, routing::post, Router};

    use crate::config::tests::radar;
    use crate::config::{ManualStateConfig, MissionConfig, OrbitConfig, TrackingConfig, WebConfig};
    use crate::orbit::{GeodeticPosition, SatelliteState};
    use crate::pulse::{to_targets, GridSettings, Pulse};
    use crate::swath::SwathGeometry;

    fn mission() -> Mission {
        let config = MissionConfig {
            radar: radar(),
            orbit: OrbitConfig::Manual {
                manual: ManualStateConfig {
                    position_ecef_m: [6_897_137.0, 0.0, 0.0],
                    velocity_ecef_m_s: [0.0, 1_000.0, 7_500.0],
                },
            },
            tracking: TrackingConfig {
                // 5 pulses per batch at the fixture PRF
                batch_time_s: 0.001,
                ..TrackingConfig::default()
            },
            echo: None,
            web: WebConfig::default(),
        };
        Mission::from_config(&config, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn tick_loop_runs_until_stopped() {
        let mut m = mission();
        m.observers_mut()
            .subscribe_position(Box::new(PositionLogger::new(10)));
        m.start_tracking(Utc::now());
        let mission = Arc::new(Mutex::new(m));

        let ticks = TickLoop::spawn(mission.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(60)).await;
        let count = ticks.stop().await;

        assert!(count > 0);
        let snapshot = mission.lock().await.snapshot();
        assert!(snapshot.last_update.is_some());
        assert!(snapshot.queued_pulses as u64 <= count);
    }

    fn batch_with_state() -> BatchReady {
        let geometry = SwathGeometry::with_ranges(100_000.0, 150_000.0, 50_000.0, 0.0, 0.0, 0.0);
        let state = SatelliteState::from_geodetic(
            Utc::now(),
            GeodeticPosition {
                longitude_deg: 0.0,
                latitude_deg: 0.0,
                altitude_m: 519_000.0,
            },
            [0.0, 0.0, 7_600.0],
        );
        let pulse = Pulse {
            pulse_id: 7,
            timestamp_ms: state.timestamp.timestamp_millis(),
            swath_id: "s".to_string(),
            state,
            geometry: geometry.clone(),
        };
        BatchReady {
            group_id: None,
            pulses: vec![pulse],
            targets: to_targets(&geometry, &GridSettings::default()),
            geometry,
        }
    }

    fn echo_config(url: String) -> EchoConfig {
        EchoConfig {
            url,
            timeout: Duration::from_secs(5),
            grid: Default::default(),
        }
    }

    #[tokio::test]
    async fn dispatch_does_not_wait_for_the_echo_service() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let app = Router::new().route(
            "/simulate",
            post(move || {
                let seen = seen.clone();
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut dispatcher =
            EchoDispatcher::new(&echo_config(format!("http://{addr}/simulate")), radar()).unwrap();
        let started = std::time::Instant::now();
        dispatcher.on_batch(&batch_with_state());
        assert!(started.elapsed() < Duration::from_millis(200));

        let deadline = std::time::Instant::now() + Duration::from_secs(3);
        while hits.load(Ordering::SeqCst) == 0 && std::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_service_leaves_the_tick_loop_running() {
        let mut m = mission();
        let dispatcher =
            EchoDispatcher::new(&echo_config("http://127.0.0.1:9/simulate".into()), radar())
                .unwrap();
        m.observers_mut().subscribe_batch(Box::new(dispatcher));
        m.start_tracking(Utc::now());
        let mission = Arc::new(Mutex::new(m));

        let ticks = TickLoop::spawn(mission.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(150)).await;
        let count = ticks.stop().await;

        assert!(count > 0);
        let snapshot = mission.lock().await.snapshot();
        assert!(snapshot.batches_emitted > 0);
        assert!(mission.lock().await.is_tracking());
    }
}
