use serde::{Deserialize, Serialize};

/// Velocity magnitude below which an axis reads as not moving.
pub const MOTION_EPSILON: f64 = 0.01;

/// Coarse motion label derived from the latest velocity sample.
///
/// Classification is deliberately memoryless: no hysteresis, no
/// smoothing. A velocity stream oscillating around the threshold will
/// reclassify on every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotionState {
    #[default]
    Stopped,
    MovingForward,
    MovingBackward,
    Turning,
}

impl MotionState {
    /// Classify a (linear.x, angular.z) pair.
    ///
    /// Both axes inside the epsilon band read as stopped. Otherwise the
    /// dominant axis wins, with ties going to turning.
    pub fn classify(linear: f64, angular: f64) -> Self {
        if linear.abs() < MOTION_EPSILON && angular.abs() < MOTION_EPSILON {
            MotionState::Stopped
        } else if linear.abs() > angular.abs() {
            if linear > 0.0 {
                MotionState::MovingForward
            } else {
                MotionState::MovingBackward
            }
        } else {
            MotionState::Turning
        }
    }

    /// Dashboard text for this state.
    pub fn label(&self) -> &'static str {
        match self {
            MotionState::Stopped => "Stopped",
            MotionState::MovingForward => "Moving forward",
            MotionState::MovingBackward => "Moving backward",
            MotionState::Turning => "Turning",
        }
    }
}

impl std::fmt::Display for MotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
