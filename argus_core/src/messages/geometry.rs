use serde::{Deserialize, Serialize};

/// 3D vector component block.
///
/// Field layout matches the ROS `geometry_msgs/Vector3` JSON shape so
/// samples arriving through a rosbridge connection deserialize directly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Orientation quaternion (`geometry_msgs/Quaternion` shape).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        // Identity rotation
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

impl Quaternion {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Yaw (rotation about z) in radians, range (-pi, pi].
    pub fn yaw(&self) -> f64 {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z))
    }
}

/// Position plus orientation (`geometry_msgs/Pose` shape).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quaternion,
}

impl Pose {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Vec3::new(x, y, 0.0),
            ..Self::default()
        }
    }
}

/// Pose wrapped the way covariance-carrying estimators publish it. The
/// covariance matrix itself is not kept.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseWithCovariance {
    pub pose: Pose,
}

/// Localization estimate as it arrives on the pose topic
/// (`geometry_msgs/PoseWithCovarianceStamped` shape, header and
/// covariance ignored).
///
/// The nesting is required on decode: a payload without the `pose`
/// envelope is malformed and gets skipped upstream rather than silently
/// read as the origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseEstimate {
    pub pose: PoseWithCovariance,
}

impl PoseEstimate {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose: PoseWithCovariance { pose },
        }
    }
}

/// Velocity message (`geometry_msgs/Twist` shape).
///
/// Standard command type for driving the robot base: forward speed on
/// `linear.x`, turn rate on `angular.z`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Twist {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Twist {
    /// Velocity with forward speed on x and turn rate on z, all other
    /// axes zero.
    pub fn new(linear_x: f64, angular_z: f64) -> Self {
        Self {
            linear: Vec3::new(linear_x, 0.0, 0.0),
            angular: Vec3::new(0.0, 0.0, angular_z),
        }
    }

    /// Full stop command.
    pub fn zero() -> Self {
        Self::default()
    }
}
