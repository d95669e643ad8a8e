use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::debug;

use crate::messages::{BatteryState, OccupancyGrid, PatrolAction, Pose, Twist};
use crate::telemetry::distance::DistanceTracker;
use crate::telemetry::motion::MotionState;

/// Mission phase set by the command router when it accepts a patrol
/// verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatrolStatus {
    Idle,
    SinglePatrol,
    RepeatPatrol,
    Returning,
    Stopped,
}

impl PatrolStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PatrolStatus::Idle => "Idle",
            PatrolStatus::SinglePatrol => "Single patrol",
            PatrolStatus::RepeatPatrol => "Repeat patrol",
            PatrolStatus::Returning => "Returning",
            PatrolStatus::Stopped => "Stopped",
        }
    }
}

impl From<PatrolAction> for PatrolStatus {
    fn from(action: PatrolAction) -> Self {
        match action {
            PatrolAction::Single => PatrolStatus::SinglePatrol,
            PatrolAction::Repeat => PatrolStatus::RepeatPatrol,
            PatrolAction::Return => PatrolStatus::Returning,
            PatrolAction::Stop => PatrolStatus::Stopped,
        }
    }
}

/// The single status slot shared by both writers: patrol commands and
/// motion reclassification. Last writer wins, matching the one status
/// badge the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLabel {
    Patrol(PatrolStatus),
    Motion(MotionState),
}

impl StatusLabel {
    pub fn text(&self) -> &'static str {
        match self {
            StatusLabel::Patrol(status) => status.label(),
            StatusLabel::Motion(state) => state.label(),
        }
    }
}

impl Default for StatusLabel {
    fn default() -> Self {
        StatusLabel::Patrol(PatrolStatus::Idle)
    }
}

/// Latest-wins cache of robot telemetry plus derived display state.
///
/// Writers are the bus pump tasks and the command router; readers are
/// session loops taking snapshots. Each field carries its own lock so a
/// busy telemetry stream never stalls an unrelated one. Readers may see
/// fields from slightly different instants; the broadcast contract does
/// not require a cross-field atomic view.
#[derive(Debug, Default)]
pub struct RobotState {
    pose: Mutex<Option<Pose>>,
    map: Mutex<Option<Arc<OccupancyGrid>>>,
    battery: Mutex<Option<BatteryState>>,
    motion: Mutex<MotionState>,
    status: Mutex<StatusLabel>,
    distance: Mutex<DistanceTracker>,
    patrol_started: Mutex<Option<Instant>>,
}

impl RobotState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pose fix and feed the odometer.
    pub fn update_pose(&self, pose: Pose) {
        self.distance.lock().observe(pose.position.x, pose.position.y);
        *self.pose.lock() = Some(pose);
    }

    /// Record a map sample. Grids whose payload length disagrees with
    /// the declared dimensions are dropped here so raster code never
    /// sees them.
    pub fn update_map(&self, grid: OccupancyGrid) {
        if !grid.is_well_formed() {
            debug!(
                width = grid.width,
                height = grid.height,
                cells = grid.data.len(),
                "dropping malformed occupancy grid"
            );
            return;
        }
        *self.map.lock() = Some(Arc::new(grid));
    }

    pub fn update_battery(&self, battery: BatteryState) {
        *self.battery.lock() = Some(battery);
    }

    /// Reclassify motion from an echoed velocity sample.
    ///
    /// Returns the new state when it changed so the caller can push the
    /// fresh label to sessions without waiting for the next tick.
    pub fn update_velocity(&self, velocity: Twist) -> Option<MotionState> {
        let next = MotionState::classify(velocity.linear.x, velocity.angular.z);
        {
            let mut motion = self.motion.lock();
            if *motion == next {
                return None;
            }
            *motion = next;
        }
        *self.status.lock() = StatusLabel::Motion(next);
        Some(next)
    }

    /// Apply an accepted patrol verb: distance bookkeeping, patrol
    /// timer, status label. Returns the label text to broadcast.
    pub fn apply_patrol(&self, action: PatrolAction) -> &'static str {
        if action.starts_run() {
            self.distance.lock().reset();
            *self.patrol_started.lock() = Some(Instant::now());
        } else {
            self.distance.lock().freeze();
            *self.patrol_started.lock() = None;
        }
        let status = StatusLabel::Patrol(action.into());
        *self.status.lock() = status;
        status.text()
    }

    pub fn status_text(&self) -> &'static str {
        self.status.lock().text()
    }

    /// Point-in-time view for one broadcast tick.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            pose: *self.pose.lock(),
            map: self.map.lock().clone(),
            battery: *self.battery.lock(),
            distance_m: self.distance.lock().total_m(),
            patrol_min: self
                .patrol_started
                .lock()
                .map_or(0.0, |started| started.elapsed().as_secs_f64() / 60.0),
            status: self.status.lock().text(),
        }
    }
}

/// One tick's view of the cache.
#[derive(Debug, Clone)]
pub struct TelemetrySnapshot {
    pub pose: Option<Pose>,
    pub map: Option<Arc<OccupancyGrid>>,
    pub battery: Option<BatteryState>,
    pub distance_m: f64,
    /// Minutes since the current patrol run started, 0 when idle.
    pub patrol_min: f64,
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_snapshot_before_any_sample() {
        let state = RobotState::new();
        let snap = state.snapshot();
        assert!(snap.pose.is_none());
        assert!(snap.map.is_none());
        assert!(snap.battery.is_none());
        assert_relative_eq!(snap.distance_m, 0.0);
        assert_relative_eq!(snap.patrol_min, 0.0);
        assert_eq!(snap.status, "Idle");
    }

    #[test]
    fn test_pose_feeds_odometer() {
        let state = RobotState::new();
        state.update_pose(Pose::new(0.0, 0.0));
        state.update_pose(Pose::new(3.0, 4.0));
        let snap = state.snapshot();
        assert_relative_eq!(snap.distance_m, 5.0);
        assert_relative_eq!(snap.pose.unwrap().position.x, 3.0);
    }

    #[test]
    fn test_patrol_start_resets_distance_mid_run() {
        let state = RobotState::new();
        state.update_pose(Pose::new(0.0, 0.0));
        state.update_pose(Pose::new(2.0, 0.0));
        assert_eq!(state.apply_patrol(PatrolAction::Single), "Single patrol");
        assert_relative_eq!(state.snapshot().distance_m, 0.0);
        assert!(state.snapshot().patrol_min >= 0.0);

        state.update_pose(Pose::new(2.0, 1.0));
        assert_relative_eq!(state.snapshot().distance_m, 1.0);
    }

    #[test]
    fn test_stop_freezes_broadcast_distance() {
        let state = RobotState::new();
        state.update_pose(Pose::new(0.0, 0.0));
        state.update_pose(Pose::new(1.0, 0.0));
        assert_eq!(state.apply_patrol(PatrolAction::Stop), "Stopped");
        state.update_pose(Pose::new(7.0, 0.0));
        assert_relative_eq!(state.snapshot().distance_m, 1.0);
        assert_relative_eq!(state.snapshot().patrol_min, 0.0);
    }

    #[test]
    fn test_velocity_transition_fires_once() {
        let state = RobotState::new();
        assert_eq!(
            state.update_velocity(Twist::new(0.4, 0.0)),
            Some(MotionState::MovingForward)
        );
        assert_eq!(state.update_velocity(Twist::new(0.5, 0.0)), None);
        assert_eq!(
            state.update_velocity(Twist::zero()),
            Some(MotionState::Stopped)
        );
        assert_eq!(state.status_text(), "Stopped");
    }

    #[test]
    fn test_status_last_writer_wins() {
        let state = RobotState::new();
        state.apply_patrol(PatrolAction::Repeat);
        assert_eq!(state.status_text(), "Repeat patrol");
        state.update_velocity(Twist::new(0.4, 0.0));
        assert_eq!(state.status_text(), "Moving forward");
        state.apply_patrol(PatrolAction::Return);
        assert_eq!(state.status_text(), "Returning");
    }

    #[test]
    fn test_malformed_grid_dropped() {
        let state = RobotState::new();
        state.update_map(OccupancyGrid::new(4, 4, 0.05, vec![0; 3]));
        assert!(state.snapshot().map.is_none());

        state.update_map(OccupancyGrid::new(2, 1, 0.05, vec![0, -1]));
        assert!(state.snapshot().map.is_some());
    }
}
