use crate::orbit::frames::distance;

/// Below this distance (m) the displayed position snaps to the target.
pub const SNAP_DISTANCE_M: f64 = 0.1;
/// Upper bound on the per-tick interpolation factor.
pub const MAX_CATCH_UP: f64 = 0.15;
/// Distance (m) at which the catch-up factor saturates.
pub const CATCH_UP_SCALE_M: f64 = 5000.0;

/// Per-tick interpolation of a displayed Cartesian position toward a target.
#[derive(Debug, Default, Clone)]
pub struct PositionSmoother {
    displayed: Option<[f64; 3]>,
}

impl PositionSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn displayed(&self) -> Option<[f64; 3]> {
        self.displayed
    }

    pub fn reset(&mut self) {
        self.displayed = None;
    }

    /// Advance the displayed position one tick toward `target`. The first
    /// call after construction or `reset` snaps.
    pub fn update(&mut self, target: [f64; 3]) -> [f64; 3] {
        let next = match self.displayed {
            Some(displayed) => smooth(displayed, target),
            None => target,
        };
        self.displayed = Some(next);
        next
    }
}

pub fn catch_up_factor(distance_m: f64) -> f64 {
    MAX_CATCH_UP.min(distance_m / CATCH_UP_SCALE_M)
}

pub fn smooth(displayed: [f64; 3], target: [f64; 3]) -> [f64; 3] {
    let d = distance(displayed, target);
    if d <= SNAP_DISTANCE_M || !d.is_finite() {
        return target;
    }
    let f = catch_up_factor(d);
    [
        displayed[0] + (target[0] - displayed[0]) * f,
        displayed[1] + (target[1] - displayed[1]) * f,
        displayed[2] + (target[2] - displayed[2]) * f,
    ]
}
