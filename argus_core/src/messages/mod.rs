//! Bus message types for the ARGUS gateway.
//!
//! Messages are organized by domain:
//! - Geometry: spatial primitives (Vec3, Quaternion, Pose, Twist)
//! - Nav: mapping data (OccupancyGrid)
//! - Sensor: robot health (BatteryState)
//! - Patrol: mission commands (PatrolAction, PatrolCommand)
//!
//! Every type (de)serializes to the JSON shapes used on the robot bus,
//! so a sample pulled off a rosbridge topic decodes directly into the
//! matching struct here.

pub mod geometry;
pub mod nav;
pub mod patrol;
pub mod sensor;

// Re-export all message types for convenience
pub use geometry::{Pose, PoseEstimate, PoseWithCovariance, Quaternion, Twist, Vec3};
pub use nav::{OccupancyGrid, CELL_UNKNOWN};
pub use patrol::{PatrolAction, PatrolCommand};
pub use sensor::BatteryState;
