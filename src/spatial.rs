//! Spatial hashing using Morton encoding (Z-order curve).
//!
//! A uniform grid over the field whose cells are at least as wide as the
//! query radius, so every neighbor within the radius lives in the 3x3 block
//! of cells around a point. Points are sorted by the Morton code of their
//! cell, and each occupied cell maps to a contiguous run of the sorted
//! index list.

use glam::Vec2;

use crate::particle::{Point, FIELD_SIZE};

/// Offsets for the 9 cells around (and including) a cell.
#[rustfmt::skip]
const NEIGHBOR_OFFSETS: [(i32, i32); 9] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0), (0,  0), (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

/// Configuration for the spatial hashing grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialConfig {
    /// Size of each cell in field units.
    pub cell_size: f32,
    /// Number of cells per axis (grid is `grid_resolution^2`).
    pub grid_resolution: u32,
}

impl SpatialConfig {
    /// Grid covering the whole field with cells of at least `radius`.
    pub fn for_radius(radius: f32) -> Self {
        let cell_size = radius.max(f32::EPSILON);
        let grid_resolution = ((FIELD_SIZE / cell_size).ceil() as u32 + 1).clamp(1, 1 << 15);
        Self {
            cell_size,
            grid_resolution,
        }
    }

    /// Total number of cells in the grid.
    pub fn total_cells(&self) -> u32 {
        self.grid_resolution * self.grid_resolution
    }

    /// Convert a field position to cell coordinates.
    pub fn pos_to_cell(&self, pos: Vec2) -> (u32, u32) {
        let max = (self.grid_resolution - 1) as f32;
        let normalized = pos / self.cell_size;
        (normalized.x.clamp(0.0, max) as u32, normalized.y.clamp(0.0, max) as u32)
    }
}

/// Expand a 16-bit integer to 32 bits by inserting a zero between each bit.
fn expand_bits(v: u32) -> u32 {
    let mut x = v & 0x0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333;
    x = (x | (x << 1)) & 0x5555_5555;
    x
}

/// Compact 32 bits to 16 by extracting every second bit.
fn compact_bits(v: u32) -> u32 {
    let mut x = v & 0x5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF;
    x
}

/// 32-bit Morton code for a 2D cell (each coordinate 0..65535).
pub fn morton_encode(x: u32, y: u32) -> u32 {
    expand_bits(x) | (expand_bits(y) << 1)
}

/// Decode a Morton code back to cell coordinates.
pub fn morton_decode(code: u32) -> (u32, u32) {
    (compact_bits(code), compact_bits(code >> 1))
}

/// Point indices bucketed by cell, sorted in Z-order.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    config: SpatialConfig,
    /// `(morton, point_index)` sorted by morton code.
    entries: Vec<(u32, u32)>,
}

impl SpatialGrid {
    /// Bucket `points` into a grid with the given configuration.
    pub fn build(points: &[Point], config: SpatialConfig) -> Self {
        let mut entries: Vec<(u32, u32)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let (cx, cy) = config.pos_to_cell(p.position);
                (morton_encode(cx, cy), i as u32)
            })
            .collect();
        entries.sort_unstable();
        Self { config, entries }
    }

    #[inline]
    pub fn config(&self) -> SpatialConfig {
        self.config
    }

    /// Indices of the points in the cell with this Morton code.
    pub fn cell(&self, code: u32) -> impl Iterator<Item = u32> + '_ {
        let start = self.entries.partition_point(|&(c, _)| c < code);
        self.entries[start..]
            .iter()
            .take_while(move |&&(c, _)| c == code)
            .map(|&(_, i)| i)
    }

    /// Indices of all points in the 3x3 block of cells around `pos`.
    pub fn neighbors(&self, pos: Vec2) -> impl Iterator<Item = u32> + '_ {
        let (cx, cy) = self.config.pos_to_cell(pos);
        let res = self.config.grid_resolution as i32;
        NEIGHBOR_OFFSETS
            .into_iter()
            .filter_map(move |(dx, dy)| {
                let nx = cx as i32 + dx;
                let ny = cy as i32 + dy;
                if nx < 0 || ny < 0 || nx >= res || ny >= res {
                    None
                } else {
                    Some(morton_encode(nx as u32, ny as u32))
                }
            })
            .flat_map(move |code| self.cell(code))
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        let mut count = 0;
        let mut last = None;
        for &(code, _) in &self.entries {
            if last != Some(code) {
                count += 1;
                last = Some(code);
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_morton_roundtrip_corners() {
        assert_eq!(morton_encode(0, 0), 0);
        assert_eq!(morton_encode(1, 0), 1);
        assert_eq!(morton_encode(0, 1), 2);
        assert_eq!(morton_encode(1, 1), 3);
        assert_eq!(morton_decode(morton_encode(65535, 1234)), (65535, 1234));
    }

    #[test]
    fn test_config_covers_field() {
        let config = SpatialConfig::for_radius(15.0);
        assert!(config.cell_size * config.grid_resolution as f32 >= FIELD_SIZE);
        assert_eq!(config.pos_to_cell(Vec2::new(100.0, 100.0)), (6, 6));
        assert_eq!(config.pos_to_cell(Vec2::new(-5.0, 14.9)), (0, 0));
    }

    #[test]
    fn test_neighbors_include_own_cell() {
        let points = vec![
            Point::new(0, Vec2::new(5.0, 5.0), Vec2::ZERO),
            Point::new(1, Vec2::new(20.0, 5.0), Vec2::ZERO),
            Point::new(2, Vec2::new(90.0, 90.0), Vec2::ZERO),
        ];
        let grid = SpatialGrid::build(&points, SpatialConfig::for_radius(15.0));
        let mut near: Vec<u32> = grid.neighbors(points[0].position).collect();
        near.sort_unstable();
        assert_eq!(near, vec![0, 1]);
        assert_eq!(grid.occupied_cells(), 3);
    }
}
