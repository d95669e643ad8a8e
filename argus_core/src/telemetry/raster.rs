//! Occupancy grid to grayscale raster conversion.
//!
//! Map viewers draw a top-to-bottom image while the grid stores row 0
//! at the map origin (bottom), so rows are emitted in reverse storage
//! order. The conversion is stateless and recomputed per broadcast so
//! a fresh map sample is always reflected immediately.

use crate::messages::OccupancyGrid;

/// Shade for cells never observed.
pub const SHADE_UNKNOWN: u8 = 205;
/// Shade for cells known to be free.
pub const SHADE_FREE: u8 = 255;
/// Shade for cells holding an obstacle at any confidence.
pub const SHADE_OCCUPIED: u8 = 0;

fn shade(cell: i8) -> u8 {
    match cell {
        0 => SHADE_FREE,
        c if c > 0 => SHADE_OCCUPIED,
        _ => SHADE_UNKNOWN,
    }
}

/// Flatten a grid into a vertically flipped grayscale raster.
///
/// Output length equals the payload length. A ragged final row (payload
/// shorter than `width * height`) is passed through rather than padded;
/// ingestion rejects such grids before they reach here.
pub fn rasterize(grid: &OccupancyGrid) -> Vec<u8> {
    let width = grid.width as usize;
    if width == 0 {
        return Vec::new();
    }
    let mut gray = Vec::with_capacity(grid.data.len());
    for row in grid.data.chunks(width).rev() {
        gray.extend(row.iter().map(|&cell| shade(cell)));
    }
    gray
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::CELL_UNKNOWN;

    #[test]
    fn test_palette() {
        assert_eq!(shade(CELL_UNKNOWN), SHADE_UNKNOWN);
        assert_eq!(shade(0), SHADE_FREE);
        assert_eq!(shade(1), SHADE_OCCUPIED);
        assert_eq!(shade(100), SHADE_OCCUPIED);
        // Out-of-convention negatives also read as unobserved.
        assert_eq!(shade(-2), SHADE_UNKNOWN);
    }

    #[test]
    fn test_vertical_flip() {
        // Bottom storage row [-1, 0] must come out last.
        let grid = OccupancyGrid::new(2, 2, 0.05, vec![-1, 0, 50, 100]);
        assert_eq!(rasterize(&grid), vec![0, 0, 205, 255]);
    }

    #[test]
    fn test_single_row_unchanged() {
        let grid = OccupancyGrid::new(4, 1, 0.05, vec![-1, 0, 25, 0]);
        assert_eq!(rasterize(&grid), vec![205, 255, 0, 255]);
    }

    #[test]
    fn test_empty_grid() {
        let grid = OccupancyGrid::new(0, 0, 0.05, Vec::new());
        assert!(rasterize(&grid).is_empty());
    }
}
