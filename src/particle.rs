//! Point-mass type shared by the simulator and the renderer.

use glam::Vec2;

/// Side length of the normalized field. Coordinates are percent of viewport.
pub const FIELD_SIZE: f32 = 100.0;

/// Center of the field, target of the recursion pull.
pub const FIELD_CENTER: Vec2 = Vec2::new(FIELD_SIZE * 0.5, FIELD_SIZE * 0.5);

/// A single particle.
///
/// `id` is unique within one field generation only; pair it with
/// [`ParticleField::generation`](crate::ParticleField::generation) to tell
/// points from different generations apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub id: u32,
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Point {
    pub fn new(id: u32, position: Vec2, velocity: Vec2) -> Self {
        Self {
            id,
            position,
            velocity,
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.position.y
    }

    /// Whether the point lies inside `[0, FIELD_SIZE]` on both axes.
    #[inline]
    pub fn in_bounds(&self) -> bool {
        (0.0..=FIELD_SIZE).contains(&self.position.x)
            && (0.0..=FIELD_SIZE).contains(&self.position.y)
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> f32 {
        self.position.distance(other.position)
    }
}
