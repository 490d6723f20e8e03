//! Board coordinate system
//!
//! Converts between grid cells, screen pixels, and world meters. Pixel
//! coordinates are `(x, y)` with `x` along columns and `y` along rows.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::sim::Cell;

/// Grid dimensions and scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub width_cells: i32,
    pub height_cells: i32,
    pub cell_width_px: i32,
    pub cell_height_px: i32,
    pub cell_width_m: f32,
    pub cell_height_m: f32,
}

impl Board {
    /// Create a board, rejecting non-positive dimensions or cell sizes
    pub fn new(
        width_cells: i32,
        height_cells: i32,
        cell_width_px: i32,
        cell_height_px: i32,
        cell_width_m: f32,
        cell_height_m: f32,
    ) -> Result<Self, LoadError> {
        if width_cells <= 0 || height_cells <= 0 {
            return Err(LoadError::InvalidBoard(format!(
                "dimensions must be positive, got {width_cells}x{height_cells}"
            )));
        }
        if cell_width_px <= 0 || cell_height_px <= 0 {
            return Err(LoadError::InvalidBoard(format!(
                "cell size in pixels must be positive, got {cell_width_px}x{cell_height_px}"
            )));
        }
        // NaN fails this too
        if !(cell_width_m > 0.0 && cell_height_m > 0.0) {
            return Err(LoadError::InvalidBoard(format!(
                "cell size in meters must be positive, got {cell_width_m}x{cell_height_m}"
            )));
        }
        Ok(Self {
            width_cells,
            height_cells,
            cell_width_px,
            cell_height_px,
            cell_width_m,
            cell_height_m,
        })
    }

    /// `(width, height)` in cells
    #[inline]
    pub fn dims(&self) -> (i32, i32) {
        (self.width_cells, self.height_cells)
    }

    /// Whether a cell lies on the board
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.height_cells).contains(&cell.row) && (0..self.width_cells).contains(&cell.col)
    }

    /// Top-left pixel of a cell
    #[inline]
    pub fn cell_to_px(&self, cell: Cell) -> IVec2 {
        IVec2::new(cell.col * self.cell_width_px, cell.row * self.cell_height_px)
    }

    /// Cell containing a pixel
    #[inline]
    pub fn px_to_cell(&self, px: IVec2) -> Cell {
        Cell::new(
            px.y.div_euclid(self.cell_height_px),
            px.x.div_euclid(self.cell_width_px),
        )
    }

    /// Convert a distance in meters to pixels, per axis, truncated
    pub fn meters_to_pixels(&self, dx_m: f32, dy_m: f32) -> IVec2 {
        let dx = dx_m / self.cell_width_m * self.cell_width_px as f32;
        let dy = dy_m / self.cell_height_m * self.cell_height_px as f32;
        IVec2::new(dx as i32, dy as i32)
    }

    /// Mean of the horizontal and vertical scale
    pub fn pixels_per_meter(&self) -> f32 {
        let x = self.cell_width_px as f32 / self.cell_width_m;
        let y = self.cell_height_px as f32 / self.cell_height_m;
        (x + y) / 2.0
    }

    /// Total size of the board in pixels
    pub fn size_px(&self) -> IVec2 {
        IVec2::new(
            self.width_cells * self.cell_width_px,
            self.height_cells * self.cell_height_px,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new(8, 8, 100, 100, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_cell_px_roundtrip() {
        let b = board();
        let cell = Cell::new(3, 5);
        let px = b.cell_to_px(cell);
        assert_eq!(px, IVec2::new(500, 300));
        assert_eq!(b.px_to_cell(px + IVec2::new(99, 99)), cell);
    }

    #[test]
    fn test_pixels_per_meter_is_mean() {
        let b = Board::new(4, 4, 100, 50, 1.0, 1.0).unwrap();
        assert!((b.pixels_per_meter() - 75.0).abs() < 1e-4);
    }

    #[test]
    fn test_meters_to_pixels() {
        let b = Board::new(4, 4, 100, 60, 2.0, 1.0).unwrap();
        assert_eq!(b.meters_to_pixels(1.0, 0.5), IVec2::new(50, 30));
    }

    #[test]
    fn test_rejects_zero_scale() {
        assert!(Board::new(8, 8, 0, 100, 1.0, 1.0).is_err());
        assert!(Board::new(8, 8, 100, 100, 0.0, 1.0).is_err());
        assert!(Board::new(0, 8, 100, 100, 1.0, 1.0).is_err());
        assert!(Board::new(8, 8, 100, 100, f32::NAN, 1.0).is_err());
    }

    #[test]
    fn test_contains() {
        let b = board();
        assert!(b.contains(Cell::new(0, 0)));
        assert!(b.contains(Cell::new(7, 7)));
        assert!(!b.contains(Cell::new(8, 0)));
        assert!(!b.contains(Cell::new(0, -1)));
    }
}
