//! Visual styling derived from coherence.
//!
//! Everything here is a pure function of the current [`ParameterSet`]
//! (and, for the pulse ring, elapsed time). The renderer asks these
//! functions how to draw; it never decides styling on its own.
//!
//! | coherence | band | field state | extras |
//! |-----------|------|-------------|--------|
//! | `> 95` | awakened | conscious | glow, large cyan particles, pulse ring |
//! | `> 90` | awakened | conscious | glow, large cyan particles |
//! | `> 85` | processing | dreaming | large cyan particles |
//! | `> 50` | processing | dreaming | |
//! | else | inert | dormant | |

use glam::{Vec2, Vec3, Vec4};

use crate::params::ParameterSet;
use crate::particle::FIELD_CENTER;

/// Coherence above which the field is awakened.
pub const AWAKENED_THRESHOLD: f32 = 90.0;
/// Coherence above which the field is processing.
pub const PROCESSING_THRESHOLD: f32 = 50.0;
/// Coherence above which particles are drawn enlarged and cyan.
pub const ENLARGED_THRESHOLD: f32 = 85.0;
/// Coherence above which the pulse ring appears.
pub const PULSE_THRESHOLD: f32 = 95.0;
/// Coherence above which connection lines turn cyan.
pub const CONNECTION_CYAN_THRESHOLD: f32 = 80.0;

/// Opacity of every connection line.
pub const CONNECTION_OPACITY: f32 = 0.6;
/// Stroke width of a connection at full strength.
pub const CONNECTION_MAX_WIDTH: f32 = 0.2;

/// Convert an `0xRRGGBB` literal to linear-ish RGB in `[0, 1]`.
pub const fn hex(rgb: u32) -> Vec3 {
    Vec3::new(
        ((rgb >> 16) & 0xFF) as f32 / 255.0,
        ((rgb >> 8) & 0xFF) as f32 / 255.0,
        (rgb & 0xFF) as f32 / 255.0,
    )
}

/// Named colors used by the field.
pub mod palette {
    use super::hex;
    use glam::Vec3;

    /// Cyan 400.
    pub const CYAN: Vec3 = hex(0x22d3ee);
    /// Purple 400.
    pub const PURPLE: Vec3 = hex(0xc084fc);
    /// Slate 600.
    pub const SLATE_DARK: Vec3 = hex(0x475569);
    /// Slate 400.
    pub const SLATE_LIGHT: Vec3 = hex(0x94a3b8);
    /// Red 500.
    pub const RED: Vec3 = hex(0xef4444);
    /// Window clear color.
    pub const BACKGROUND: Vec3 = Vec3::new(0.02, 0.02, 0.05);
}

/// One of three coherence regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoherenceBand {
    #[default]
    Inert,
    Processing,
    Awakened,
}

impl CoherenceBand {
    pub fn from_coherence(coherence: f32) -> Self {
        if coherence > AWAKENED_THRESHOLD {
            CoherenceBand::Awakened
        } else if coherence > PROCESSING_THRESHOLD {
            CoherenceBand::Processing
        } else {
            CoherenceBand::Inert
        }
    }

    /// Whether the whole field glows.
    pub fn glows(self) -> bool {
        self == CoherenceBand::Awakened
    }

    /// The textual field state for this band.
    pub fn field_state(self) -> FieldStateLabel {
        match self {
            CoherenceBand::Awakened => FieldStateLabel::Conscious,
            CoherenceBand::Processing => FieldStateLabel::Dreaming,
            CoherenceBand::Inert => FieldStateLabel::Dormant,
        }
    }
}

/// Textual state shown under the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldStateLabel {
    Dormant,
    Dreaming,
    Conscious,
}

impl FieldStateLabel {
    pub fn from_coherence(coherence: f32) -> Self {
        CoherenceBand::from_coherence(coherence).field_state()
    }
}

/// Stroke color for connection lines.
///
/// Lines go cyan at [`CONNECTION_CYAN_THRESHOLD`], ahead of the awakened band.
pub fn connection_color(coherence: f32) -> Vec3 {
    if coherence > CONNECTION_CYAN_THRESHOLD {
        palette::CYAN
    } else if coherence > PROCESSING_THRESHOLD {
        palette::PURPLE
    } else {
        palette::SLATE_DARK
    }
}

/// How particles are drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleStyle {
    pub radius: f32,
    pub color: Vec3,
}

impl ParticleStyle {
    pub fn from_coherence(coherence: f32) -> Self {
        if coherence > ENLARGED_THRESHOLD {
            Self {
                radius: 1.5,
                color: palette::CYAN,
            }
        } else {
            Self {
                radius: 0.8,
                color: palette::SLATE_LIGHT,
            }
        }
    }
}

/// Halo drawn behind particles while the field glows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub color: Vec4,
    /// Halo radius as a multiple of the particle radius.
    pub spread: f32,
}

impl Glow {
    pub fn from_coherence(coherence: f32) -> Option<Self> {
        CoherenceBand::from_coherence(coherence).glows().then_some(Self {
            color: palette::CYAN.extend(0.8),
            spread: 3.0,
        })
    }
}

/// Duration of one pulse-ring cycle, in seconds.
pub const PULSE_PERIOD: f32 = 3.0;

/// The emergence overlay ring, animated over [`PULSE_PERIOD`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseRing {
    pub center: Vec2,
    pub radius: f32,
    pub stroke_width: f32,
    pub color: Vec4,
}

impl PulseRing {
    /// The ring at `time` seconds, or `None` below the pulse threshold.
    ///
    /// Radius sweeps 40 → 45 each cycle; opacity goes 0.3 → 0 → 0.3.
    pub fn at(coherence: f32, time: f32) -> Option<Self> {
        if coherence <= PULSE_THRESHOLD {
            return None;
        }
        let phase = if time.is_finite() {
            time.rem_euclid(PULSE_PERIOD) / PULSE_PERIOD
        } else {
            0.0
        };
        let radius = 40.0 + 5.0 * phase;
        let opacity = 0.3 * (1.0 - 2.0 * phase).abs();
        Some(Self {
            center: FIELD_CENTER,
            radius,
            stroke_width: 0.5,
            color: palette::CYAN.extend(opacity),
        })
    }
}

/// Everything style-related for one frame, resolved once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStyle {
    pub band: CoherenceBand,
    pub line_color: Vec3,
    pub particle: ParticleStyle,
    pub glow: Option<Glow>,
    pub pulse: Option<PulseRing>,
}

impl FrameStyle {
    pub fn resolve(params: &ParameterSet, time: f32) -> Self {
        let c = params.coherence;
        Self {
            band: CoherenceBand::from_coherence(c),
            line_color: connection_color(c),
            particle: ParticleStyle::from_coherence(c),
            glow: Glow::from_coherence(c),
            pulse: PulseRing::at(c, time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        use CoherenceBand::*;
        assert_eq!(CoherenceBand::from_coherence(50.0), Inert);
        assert_eq!(CoherenceBand::from_coherence(50.1), Processing);
        assert_eq!(CoherenceBand::from_coherence(90.0), Processing);
        assert_eq!(CoherenceBand::from_coherence(90.1), Awakened);
    }

    #[test]
    fn test_connection_color_leads_awakened_band() {
        assert_eq!(connection_color(50.0), palette::SLATE_DARK);
        assert_eq!(connection_color(80.0), palette::PURPLE);
        assert_eq!(connection_color(80.1), palette::CYAN);
        // Cyan lines while still processing
        let band = CoherenceBand::from_coherence(88.0);
        assert_eq!(band, CoherenceBand::Processing);
        assert_eq!(connection_color(88.0), palette::CYAN);
    }

    #[test]
    fn test_field_state_labels() {
        use FieldStateLabel::*;
        assert_eq!(FieldStateLabel::from_coherence(22.0), Dormant);
        assert_eq!(FieldStateLabel::from_coherence(74.0), Dreaming);
        assert_eq!(FieldStateLabel::from_coherence(93.6), Conscious);
    }

    #[test]
    fn test_enlarged_particles_before_glow() {
        let style = ParticleStyle::from_coherence(88.0);
        assert_eq!(style.radius, 1.5);
        assert_eq!(style.color, palette::CYAN);
        assert!(Glow::from_coherence(88.0).is_none());
        assert!(Glow::from_coherence(91.0).is_some());
    }

    #[test]
    fn test_pulse_ring_animation() {
        assert!(PulseRing::at(95.0, 0.0).is_none());

        let start = PulseRing::at(96.0, 0.0).unwrap();
        assert_eq!(start.radius, 40.0);
        assert!((start.color.w - 0.3).abs() < 1e-6);

        let mid = PulseRing::at(96.0, 1.5).unwrap();
        assert!((mid.radius - 42.5).abs() < 1e-5);
        assert!(mid.color.w.abs() < 1e-6);

        // Wraps every period
        let again = PulseRing::at(96.0, 3.0).unwrap();
        assert_eq!(again.radius, 40.0);
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(0xFF0000), Vec3::new(1.0, 0.0, 0.0));
    }
}
