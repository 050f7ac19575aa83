//! Quantized placement grid
//!
//! Rows are integer vertical cells; spans cover inclusive horizontal cell
//! ranges. World coordinates are derived from the grid origin and cell size.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::Aabb;

/// Inclusive horizontal cell range `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub min: i32,
    pub max: i32,
}

impl CellRange {
    pub fn new(min: i32, max: i32) -> Self {
        debug_assert!(min <= max, "inverted cell range {min}..={max}");
        Self { min, max }
    }

    /// Number of cells covered
    #[inline]
    pub fn len(&self) -> i32 {
        self.max - self.min + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    #[inline]
    pub fn contains(&self, cell: i32) -> bool {
        cell >= self.min && cell <= self.max
    }

    /// Ranges overlap iff neither lies entirely to one side of the other
    #[inline]
    pub fn overlaps(&self, other: &CellRange) -> bool {
        !(self.max < other.min || self.min > other.max)
    }
}

/// Grid geometry shared by the generator and the collision layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub origin: Vec2,
    pub cell_size: f32,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            cell_size: 1.0,
        }
    }
}

impl Grid {
    pub fn new(origin: Vec2, cell_size: f32) -> Self {
        Self {
            origin,
            cell_size: cell_size.max(0.01),
        }
    }

    /// Row containing world `y`
    #[inline]
    pub fn row_of(&self, y: f32) -> i32 {
        ((y - self.origin.y) / self.cell_size).floor() as i32
    }

    /// Column containing world `x`
    #[inline]
    pub fn column_of(&self, x: f32) -> i32 {
        ((x - self.origin.x) / self.cell_size).floor() as i32
    }

    /// World y of a row's center line
    #[inline]
    pub fn row_center_y(&self, row: i32) -> f32 {
        self.origin.y + (row as f32 + 0.5) * self.cell_size
    }

    /// World y of a row's top edge
    #[inline]
    pub fn row_top_y(&self, row: i32) -> f32 {
        self.origin.y + (row + 1) as f32 * self.cell_size
    }

    /// World x of a column's left edge
    #[inline]
    pub fn column_left_x(&self, column: i32) -> f32 {
        self.origin.x + column as f32 * self.cell_size
    }

    /// Convert a world-space gap into a whole number of rows (at least one)
    #[inline]
    pub fn rows_for_gap(&self, gap: f32) -> i32 {
        ((gap / self.cell_size).round() as i32).max(1)
    }

    /// Cells covered by a run of `width` world units centered on `center_x`
    pub fn range_centered(&self, center_x: f32, width: f32) -> CellRange {
        let cells = ((width / self.cell_size).round() as i32).max(1);
        let left = center_x - cells as f32 * self.cell_size * 0.5;
        let min = ((left - self.origin.x) / self.cell_size).round() as i32;
        CellRange::new(min, min + cells - 1)
    }

    /// World-space box of a cell range within one row
    pub fn range_aabb(&self, row: i32, cells: CellRange) -> Aabb {
        Aabb::new(
            Vec2::new(self.column_left_x(cells.min), self.origin.y + row as f32 * self.cell_size),
            Vec2::new(self.column_left_x(cells.max + 1), self.row_top_y(row)),
        )
    }

    /// Horizontal world center of a cell range
    pub fn range_center_x(&self, cells: CellRange) -> f32 {
        (self.column_left_x(cells.min) + self.column_left_x(cells.max + 1)) * 0.5
    }
}
