use serde::Serialize;
use utoipa::ToSchema;

use crate::orbit::SatelliteState;
use crate::pulse::{PointTarget, Pulse};
use crate::swath::{LonLat, SwathGeometry};

/// Position published to the scene once per tick.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PositionUpdate {
    pub state: SatelliteState,
    #[schema(value_type = Vec<f64>)]
    pub displayed_ecef_m: [f64; 3],
    pub heading_deg: f64,
    pub geometry: SwathGeometry,
    #[schema(value_type = Vec<LonLat>)]
    pub corners: [LonLat; 4],
}

/// A drained batch with its merged footprint and target grid.
#[derive(Debug, Clone)]
pub struct BatchReady {
    pub group_id: Option<String>,
    pub pulses: Vec<Pulse>,
    pub geometry: SwathGeometry,
    pub targets: Vec<PointTarget>,
}

impl BatchReady {
    /// State the batch is simulated from: the first pulse's snapshot.
    pub fn state(&self) -> Option<&SatelliteState> {
        self.pulses.first().map(|p| &p.state)
    }

    pub fn pulse_range(&self) -> Option<(u64, u64)> {
        Some((self.pulses.first()?.pulse_id, self.pulses.last()?.pulse_id))
    }
}

pub trait PositionSink: Send {
    fn on_position(&mut self, update: &PositionUpdate);
}

pub trait BatchSink: Send {
    fn on_batch(&mut self, batch: &BatchReady);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct Observers {
    next_id: u64,
    position: Vec<(SubscriptionId, Box<dyn PositionSink>)>,
    batch: Vec<(SubscriptionId, Box<dyn BatchSink>)>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn subscribe_position(&mut self, sink: Box<dyn PositionSink>) -> SubscriptionId {
        let id = self.next();
        self.position.push((id, sink));
        id
    }

    pub fn subscribe_batch(&mut self, sink: Box<dyn BatchSink>) -> SubscriptionId {
        let id = self.next();
        self.batch.push((id, sink));
        id
    }

    #[allow(dead_code)]
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.position.len() + self.batch.len();
        self.position.retain(|(sid, _)| *sid != id);
        self.batch.retain(|(sid, _)| *sid != id);
        before != self.position.len() + self.batch.len()
    }

    pub fn len(&self) -> usize {
        self.position.len() + self.batch.len()
    }

    pub fn notify_position(&mut self, update: &PositionUpdate) {
        for (_, sink) in &mut self.position {
            sink.on_position(update);
        }
    }

    pub fn notify_batch(&mut self, batch: &BatchReady) {
        for (_, sink) in &mut self.batch {
            sink.on_batch(batch);
        }
    }
}
