use serde::{Deserialize, Serialize};

use crate::messages::geometry::Pose;

/// Cell value for space that has not been observed yet.
pub const CELL_UNKNOWN: i8 = -1;

/// Mapped environment as a row-major grid of cell values.
///
/// Cells follow the ROS occupancy convention: `-1` unknown, `0` free,
/// `1..=100` occupied with rising confidence. Row 0 sits at the map
/// origin, which display code treats as the bottom of the image.
///
/// Deserialization accepts both this flat layout and the nested
/// `nav_msgs/OccupancyGrid` layout (`info` block plus `data`) that
/// rosbridge peers publish.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "GridWire")]
pub struct OccupancyGrid {
    pub width: u32,
    pub height: u32,
    /// Meters per cell.
    pub resolution: f64,
    pub origin: Pose,
    pub data: Vec<i8>,
}

impl OccupancyGrid {
    pub fn new(width: u32, height: u32, resolution: f64, data: Vec<i8>) -> Self {
        Self {
            width,
            height,
            resolution,
            origin: Pose::default(),
            data,
        }
    }

    /// Number of cells the declared dimensions call for.
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when the payload length matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() == self.cell_count()
    }

    /// Cell value at column `x`, row `y` (row 0 first in storage order).
    pub fn cell(&self, x: u32, y: u32) -> Option<i8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y as usize * self.width as usize + x as usize).copied()
    }
}

#[derive(Deserialize)]
struct GridMeta {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    resolution: f64,
    #[serde(default)]
    origin: Pose,
}

#[derive(Deserialize)]
struct GridWire {
    #[serde(default)]
    info: Option<GridMeta>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    resolution: f64,
    #[serde(default)]
    origin: Pose,
    #[serde(default)]
    data: Vec<i8>,
}

impl From<GridWire> for OccupancyGrid {
    fn from(wire: GridWire) -> Self {
        match wire.info {
            Some(info) => Self {
                width: info.width,
                height: info.height,
                resolution: info.resolution,
                origin: info.origin,
                data: wire.data,
            },
            None => Self {
                width: wire.width,
                height: wire.height,
                resolution: wire.resolution,
                origin: wire.origin,
                data: wire.data,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cell_lookup() {
        let grid = OccupancyGrid::new(3, 2, 0.05, vec![CELL_UNKNOWN, 0, 100, 0, 50, CELL_UNKNOWN]);
        assert!(grid.is_well_formed());
        assert_eq!(grid.cell(0, 0), Some(CELL_UNKNOWN));
        assert_eq!(grid.cell(2, 0), Some(100));
        assert_eq!(grid.cell(1, 1), Some(50));
        assert_eq!(grid.cell(3, 0), None);
        assert_eq!(grid.cell(0, 2), None);
    }

    #[test]
    fn test_short_payload_not_well_formed() {
        let grid = OccupancyGrid::new(4, 4, 0.05, vec![0; 15]);
        assert!(!grid.is_well_formed());
    }

    #[test]
    fn test_decodes_rosbridge_layout() {
        let raw = r#"{
            "info": {
                "width": 2, "height": 1, "resolution": 0.1,
                "origin": {"position": {"x": -5.0, "y": -5.0, "z": 0.0}}
            },
            "data": [-1, 0]
        }"#;
        let grid: OccupancyGrid = serde_json::from_str(raw).unwrap();
        assert_eq!(grid.width, 2);
        assert_eq!(grid.height, 1);
        assert_relative_eq!(grid.resolution, 0.1);
        assert_relative_eq!(grid.origin.position.x, -5.0);
        assert_eq!(grid.data, vec![-1, 0]);
    }

    #[test]
    fn test_decodes_flat_layout() {
        let grid = OccupancyGrid::new(2, 2, 0.05, vec![0, 0, -1, 100]);
        let raw = serde_json::to_string(&grid).unwrap();
        let back: OccupancyGrid = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, grid);
    }
}
