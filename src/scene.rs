//! Per-frame draw list and its tessellation.
//!
//! [`Scene::build`] reads the simulator's points and the current parameters
//! and produces an immutable description of what to draw. [`Scene::tessellate`]
//! turns that into a flat triangle list ready for the GPU. Neither touches the
//! point set.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};

use crate::connections::{connections_for, ConnectionStrategy};
use crate::params::ParameterSet;
use crate::particle::{Point, FIELD_SIZE};
use crate::visuals::{
    CoherenceBand, FrameStyle, PulseRing, CONNECTION_MAX_WIDTH, CONNECTION_OPACITY,
};

/// Segments used to approximate a particle disc.
const DISC_SEGMENTS: usize = 12;
/// Segments used to approximate the pulse ring.
const RING_SEGMENTS: usize = 96;

/// A clip-space vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// A line between two connected points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Vec2,
    pub to: Vec2,
    pub width: f32,
    pub color: Vec4,
}

/// A filled particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disc {
    pub center: Vec2,
    pub radius: f32,
    pub color: Vec4,
}

/// Everything the renderer draws for one frame, in field coordinates.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub segments: Vec<Segment>,
    /// Soft halos behind particles; empty unless the field glows.
    pub halos: Vec<Disc>,
    pub discs: Vec<Disc>,
    pub ring: Option<PulseRing>,
    /// Band the frame was styled with.
    pub band: CoherenceBand,
}

impl Scene {
    /// Build the draw list for the current frame.
    pub fn build(
        points: &[Point],
        params: &ParameterSet,
        time: f32,
        strategy: ConnectionStrategy,
    ) -> Self {
        let style = FrameStyle::resolve(params, time);

        let line_color = style.line_color.extend(CONNECTION_OPACITY);
        let segments = connections_for(points, params, strategy)
            .into_iter()
            .map(|c| Segment {
                from: points[c.a].position,
                to: points[c.b].position,
                width: CONNECTION_MAX_WIDTH * c.strength,
                color: line_color,
            })
            .collect();

        let halos = match style.glow {
            Some(glow) => points
                .iter()
                .map(|p| Disc {
                    center: p.position,
                    radius: style.particle.radius * glow.spread,
                    color: glow.color * Vec4::new(1.0, 1.0, 1.0, 0.25),
                })
                .collect(),
            None => Vec::new(),
        };

        let particle_color = style.particle.color.extend(1.0);
        let discs = points
            .iter()
            .map(|p| Disc {
                center: p.position,
                radius: style.particle.radius,
                color: particle_color,
            })
            .collect();

        Self {
            segments,
            halos,
            discs,
            ring: style.pulse,
            band: style.band,
        }
    }

    /// Flatten the scene into clip-space triangles, back to front.
    pub fn tessellate(&self) -> Vec<Vertex> {
        let mut out = Vec::with_capacity(
            self.segments.len() * 6
                + (self.halos.len() + self.discs.len()) * DISC_SEGMENTS * 3
                + RING_SEGMENTS * 6,
        );
        for s in &self.segments {
            push_segment(&mut out, s.from, s.to, s.width, s.color);
        }
        for d in &self.halos {
            push_disc(&mut out, d, Vec4::new(d.color.x, d.color.y, d.color.z, 0.0));
        }
        for d in &self.discs {
            push_disc(&mut out, d, d.color);
        }
        if let Some(ring) = &self.ring {
            push_ring(&mut out, ring);
        }
        out
    }
}

/// Map field coordinates to clip space, y down, stretched to fill the target.
#[inline]
pub fn to_clip(p: Vec2) -> [f32; 2] {
    let half = FIELD_SIZE * 0.5;
    [p.x / half - 1.0, 1.0 - p.y / half]
}

fn vertex(p: Vec2, color: Vec4) -> Vertex {
    Vertex {
        position: to_clip(p),
        color: color.to_array(),
    }
}

fn push_quad(out: &mut Vec<Vertex>, corners: [Vec2; 4], color: Vec4) {
    let [a, b, c, d] = corners;
    for p in [a, b, c, a, c, d] {
        out.push(vertex(p, color));
    }
}

fn push_segment(out: &mut Vec<Vertex>, from: Vec2, to: Vec2, width: f32, color: Vec4) {
    let dir = (to - from).normalize_or_zero();
    if dir == Vec2::ZERO || width <= 0.0 {
        return;
    }
    let n = dir.perp() * (width * 0.5);
    push_quad(out, [from + n, to + n, to - n, from - n], color);
}

/// Triangle fan around the center; `rim` colors the outer edge.
fn push_disc(out: &mut Vec<Vertex>, disc: &Disc, rim: Vec4) {
    let step = std::f32::consts::TAU / DISC_SEGMENTS as f32;
    for i in 0..DISC_SEGMENTS {
        let a0 = i as f32 * step;
        let a1 = a0 + step;
        out.push(vertex(disc.center, disc.color));
        let r0 = disc.center + Vec2::from_angle(a0) * disc.radius;
        let r1 = disc.center + Vec2::from_angle(a1) * disc.radius;
        out.push(vertex(r0, rim));
        out.push(vertex(r1, rim));
    }
}

fn push_ring(out: &mut Vec<Vertex>, ring: &PulseRing) {
    let step = std::f32::consts::TAU / RING_SEGMENTS as f32;
    let inner = ring.radius - ring.stroke_width * 0.5;
    let outer = ring.radius + ring.stroke_width * 0.5;
    for i in 0..RING_SEGMENTS {
        let d0 = Vec2::from_angle(i as f32 * step);
        let d1 = Vec2::from_angle((i + 1) as f32 * step);
        push_quad(
            out,
            [
                ring.center + d0 * inner,
                ring.center + d0 * outer,
                ring.center + d1 * outer,
                ring.center + d1 * inner,
            ],
            ring.color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(id: u32, x: f32, y: f32) -> Point {
        Point::new(id, Vec2::new(x, y), Vec2::ZERO)
    }

    #[test]
    fn test_to_clip_corners() {
        assert_eq!(to_clip(Vec2::new(0.0, 0.0)), [-1.0, 1.0]);
        assert_eq!(to_clip(Vec2::new(100.0, 100.0)), [1.0, -1.0]);
        assert_eq!(to_clip(Vec2::new(50.0, 50.0)), [0.0, 0.0]);
    }

    #[test]
    fn test_scene_counts() {
        let points = vec![at(0, 10.0, 10.0), at(1, 15.0, 10.0), at(2, 90.0, 90.0)];
        let params = ParameterSet::default();
        let scene = Scene::build(&points, &params, 0.0, ConnectionStrategy::Pairwise);
        assert_eq!(scene.segments.len(), 1);
        assert_eq!(scene.discs.len(), 3);
        assert!(scene.halos.is_empty());
        assert!(scene.ring.is_none());
        assert_eq!(scene.band, CoherenceBand::Inert);
    }

    #[test]
    fn test_segment_width_scales_with_strength() {
        let points = vec![at(0, 10.0, 10.0), at(1, 10.0, 19.5)];
        // recursion 20 -> threshold 19, distance 9.5 -> strength 0.5
        let params = ParameterSet::default();
        let scene = Scene::build(&points, &params, 0.0, ConnectionStrategy::Pairwise);
        assert!((scene.segments[0].width - 0.1).abs() < 1e-6);
        assert!((scene.segments[0].color.w - CONNECTION_OPACITY).abs() < 1e-6);
    }

    #[test]
    fn test_awakened_scene_has_halos_and_ring() {
        let points = vec![at(0, 10.0, 10.0)];
        let params = ParameterSet::new(50.0, 200.0, 100.0);
        let scene = Scene::build(&points, &params, 0.0, ConnectionStrategy::Pairwise);
        assert_eq!(scene.halos.len(), 1);
        assert!(scene.ring.is_some());
    }

    #[test]
    fn test_tessellation_is_triangles_in_clip_space() {
        let points: Vec<Point> = (0..20)
            .map(|i| at(i, (i * 5) as f32, 100.0 - (i * 5) as f32))
            .collect();
        let params = ParameterSet::new(50.0, 200.0, 100.0);
        let scene = Scene::build(&points, &params, 1.0, ConnectionStrategy::Pairwise);
        let vertices = scene.tessellate();
        assert!(!vertices.is_empty());
        assert_eq!(vertices.len() % 3, 0);
        // Discs and halos may poke past the edge by their radius only
        let margin = 0.1;
        for v in &vertices {
            assert!(v.position[0].abs() <= 1.0 + margin);
            assert!(v.position[1].abs() <= 1.0 + margin);
        }
    }

    #[test]
    fn test_degenerate_segment_skipped() {
        let mut out = Vec::new();
        push_segment(&mut out, Vec2::ONE, Vec2::ONE, 0.2, Vec4::ONE);
        assert!(out.is_empty());
    }
}
