//! Connectivity between nearby particles.
//!
//! Two points are connected when their Euclidean distance is strictly below
//! the threshold `15 + recursion / 5`. Connections are derived from the
//! current frame every time they are needed; nothing here is stored between
//! frames.
//!
//! The reference strategy is the exact O(n²) scan over unordered pairs.
//! [`ConnectionStrategy::Grid`] buckets points with [`SpatialGrid`] first and
//! yields the same pairs in the same order.

use serde::{Deserialize, Serialize};

use crate::params::{Param, ParameterSet};
use crate::particle::Point;
use crate::spatial::{SpatialConfig, SpatialGrid};

/// Base connection radius, in field units.
const BASE_THRESHOLD: f32 = 15.0;

/// Connection radius for the given recursion level.
pub fn threshold(recursion: f32) -> f32 {
    BASE_THRESHOLD + Param::Recursion.sanitize(recursion) / 5.0
}

/// How to enumerate candidate pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStrategy {
    /// Check every unordered pair.
    #[default]
    Pairwise,
    /// Only check pairs sharing a neighborhood in a uniform grid.
    Grid,
}

/// A line between two points of the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    /// Index of the first point in the frame's point slice (`a < b`).
    pub a: usize,
    /// Index of the second point.
    pub b: usize,
    pub distance: f32,
    /// `1 - distance / threshold`, in `(0, 1]`.
    pub strength: f32,
}

impl Connection {
    /// Whether this connection joins point index `i` and `j` in either order.
    pub fn joins(&self, i: usize, j: usize) -> bool {
        (self.a == i && self.b == j) || (self.a == j && self.b == i)
    }
}

fn connect(points: &[Point], a: usize, b: usize, threshold: f32) -> Option<Connection> {
    let distance = points[a].distance(&points[b]);
    (distance < threshold).then(|| Connection {
        a,
        b,
        distance,
        strength: 1.0 - distance / threshold,
    })
}

/// Every unordered pair closer than `threshold`, ordered by `(a, b)`.
pub fn find_pairwise(points: &[Point], threshold: f32) -> Vec<Connection> {
    let mut out = Vec::new();
    for a in 0..points.len() {
        for b in (a + 1)..points.len() {
            if let Some(c) = connect(points, a, b, threshold) {
                out.push(c);
            }
        }
    }
    out
}

/// Same result as [`find_pairwise`], candidates taken from a spatial grid.
pub fn find_with_grid(points: &[Point], threshold: f32) -> Vec<Connection> {
    if threshold.is_nan() || threshold <= 0.0 {
        return Vec::new();
    }
    let grid = SpatialGrid::build(points, SpatialConfig::for_radius(threshold));
    let mut out = Vec::new();
    for (a, p) in points.iter().enumerate() {
        for b in grid.neighbors(p.position) {
            let b = b as usize;
            if b <= a {
                continue;
            }
            if let Some(c) = connect(points, a, b, threshold) {
                out.push(c);
            }
        }
    }
    out.sort_unstable_by_key(|c| (c.a, c.b));
    out
}

/// Find connections with the chosen strategy.
pub fn find_connections(
    points: &[Point],
    threshold: f32,
    strategy: ConnectionStrategy,
) -> Vec<Connection> {
    match strategy {
        ConnectionStrategy::Pairwise => find_pairwise(points, threshold),
        ConnectionStrategy::Grid => find_with_grid(points, threshold),
    }
}

/// Connections for the current frame under `params`.
pub fn connections_for(
    points: &[Point],
    params: &ParameterSet,
    strategy: ConnectionStrategy,
) -> Vec<Connection> {
    find_connections(points, threshold(params.recursion), strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn at(id: u32, x: f32, y: f32) -> Point {
        Point::new(id, Vec2::new(x, y), Vec2::ZERO)
    }

    #[test]
    fn test_threshold() {
        assert_eq!(threshold(0.0), 15.0);
        assert_eq!(threshold(20.0), 19.0);
        assert_eq!(threshold(100.0), 35.0);
    }

    #[test]
    fn test_strictly_below_threshold() {
        let points = vec![at(0, 0.0, 0.0), at(1, 15.0, 0.0), at(2, 0.0, 14.0)];
        let conns = find_pairwise(&points, 15.0);
        assert_eq!(conns.len(), 1);
        assert!(conns[0].joins(0, 2));
        assert!((conns[0].strength - (1.0 - 14.0 / 15.0)).abs() < 1e-6);
    }

    #[test]
    fn test_no_self_connections() {
        let points = vec![at(0, 50.0, 50.0), at(1, 50.0, 50.0)];
        let conns = find_pairwise(&points, 15.0);
        assert_eq!(conns.len(), 1);
        assert_eq!((conns[0].a, conns[0].b), (0, 1));
        assert_eq!(conns[0].strength, 1.0);
    }

    #[test]
    fn test_grid_matches_pairwise_on_lattice() {
        let mut points = Vec::new();
        for i in 0..11 {
            for j in 0..11 {
                points.push(at(points.len() as u32, i as f32 * 10.0, j as f32 * 10.0));
            }
        }
        for t in [15.0, 19.0, 25.0, 35.0] {
            assert_eq!(find_pairwise(&points, t), find_with_grid(&points, t));
        }
    }

    #[test]
    fn test_zero_threshold_connects_nothing() {
        let points = vec![at(0, 1.0, 1.0), at(1, 1.0, 1.0)];
        assert!(find_pairwise(&points, 0.0).is_empty());
        assert!(find_with_grid(&points, 0.0).is_empty());
    }
}
