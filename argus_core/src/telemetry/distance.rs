/// Pose deltas at or below this distance (meters) are treated as
/// localization jitter and left out of the running total.
pub const NOISE_FLOOR_M: f64 = 0.001;

/// Running traveled-distance odometer fed by consecutive pose samples.
///
/// The reference point is replaced on every sample, counted or not:
/// noise rejection suppresses accumulation, never the reference update.
/// Sustained sub-floor creep therefore never accumulates, by contract.
#[derive(Debug, Default)]
pub struct DistanceTracker {
    total_m: f64,
    prev: Option<(f64, f64)>,
    frozen: bool,
}

impl DistanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next pose position. The first sample only seeds the
    /// reference point.
    pub fn observe(&mut self, x: f64, y: f64) {
        if let Some((px, py)) = self.prev {
            let delta = ((x - px).powi(2) + (y - py).powi(2)).sqrt();
            if !self.frozen && delta > NOISE_FLOOR_M {
                self.total_m += delta;
            }
        }
        self.prev = Some((x, y));
    }

    /// Zero the total and resume accumulation. Called when a new patrol
    /// run starts.
    pub fn reset(&mut self) {
        self.total_m = 0.0;
        self.frozen = false;
    }

    /// Keep the current total but stop counting further movement. The
    /// reference point keeps tracking incoming samples so a later
    /// [`reset`](Self::reset) starts from the robot's actual position.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn total_m(&self) -> f64 {
        self.total_m
    }
}
