//! Derived robot state: the latest-wins telemetry cache and the pure
//! conversions the broadcast loop applies to it every tick.

pub mod distance;
pub mod motion;
pub mod raster;
pub mod state;

pub use distance::{DistanceTracker, NOISE_FLOOR_M};
pub use motion::{MotionState, MOTION_EPSILON};
pub use raster::{rasterize, SHADE_FREE, SHADE_OCCUPIED, SHADE_UNKNOWN};
pub use state::{PatrolStatus, RobotState, StatusLabel, TelemetrySnapshot};
