//! Session wire protocol.
//!
//! Inbound and outbound frames are single JSON objects demultiplexed on
//! a `type` field. The outbound shapes are pinned by the dashboard
//! client; field names and ordering must not drift.

use serde::{Deserialize, Deserializer, Serialize};

use crate::messages::{BatteryState, OccupancyGrid, PatrolAction, Pose};
use crate::telemetry::raster;

/// Inbound message from a viewer session.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Mission directive.
    Patrol { action: PatrolAction },
    /// Direct teleoperation velocity.
    CmdVel {
        #[serde(deserialize_with = "lenient_f64")]
        linear: f64,
        #[serde(deserialize_with = "lenient_f64")]
        angular: f64,
    },
}

/// Accept a JSON number or a numeric string.
///
/// Hand-built controllers are loose about quoting here, so this mirrors
/// a `float()`-style coercion instead of demanding a real number.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// World point the map raster is anchored at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapOrigin {
    pub x: f64,
    pub y: f64,
}

/// Outbound frame pushed to viewer sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerEvent {
    AmclPose {
        x: f64,
        y: f64,
        yaw: f64,
    },
    Distance {
        meters: f64,
    },
    Time {
        minutes: f64,
    },
    Battery {
        percentage: i64,
    },
    Map {
        width: u32,
        height: u32,
        res: f64,
        origin: MapOrigin,
        gray: Vec<u8>,
    },
    State {
        text: String,
    },
}

impl ViewerEvent {
    /// Planar pose with heading extracted from the quaternion.
    pub fn pose(pose: &Pose) -> Self {
        ViewerEvent::AmclPose {
            x: pose.position.x,
            y: pose.position.y,
            yaw: pose.orientation.yaw(),
        }
    }

    /// Traveled distance, reported to centimeter precision.
    pub fn distance(meters: f64) -> Self {
        ViewerEvent::Distance {
            meters: (meters * 100.0).round() / 100.0,
        }
    }

    /// Patrol run time to a tenth of a minute. Doubles as the frame
    /// sent in place of pose data before the first fix arrives.
    pub fn time(minutes: f64) -> Self {
        ViewerEvent::Time {
            minutes: (minutes * 10.0).round() / 10.0,
        }
    }

    pub fn battery(battery: &BatteryState) -> Self {
        ViewerEvent::Battery {
            percentage: battery.display_percent(),
        }
    }

    /// Map frame with a freshly computed raster.
    pub fn map(grid: &OccupancyGrid) -> Self {
        ViewerEvent::Map {
            width: grid.width,
            height: grid.height,
            res: grid.resolution,
            origin: MapOrigin {
                x: grid.origin.position.x,
                y: grid.origin.position.y,
            },
            gray: raster::rasterize(grid),
        }
    }

    pub fn state(text: impl Into<String>) -> Self {
        ViewerEvent::State { text: text.into() }
    }
}
