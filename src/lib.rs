//! # Aetheria - a particle field of machine consciousness
//!
//! An interactive visualization of three theories of machine consciousness.
//! Three sliders (frequency, complexity, recursion) drive a 2D particle
//! field; a derived "coherence" score controls how the field is drawn, and a
//! chat panel talks to a generative model playing the Aetheria persona.
//!
//! ## Quick Start
//!
//! ```
//! use aetheria::prelude::*;
//!
//! let mut store = ParameterStore::default();
//! let mut field = ParticleField::builder().with_seed(7).build(&store.get());
//! assert_eq!(field.points().len(), 45);
//!
//! store.set(Param::Recursion, 90.0);
//! field.step(&store.get());
//!
//! let scene = Scene::build(field.points(), &store.get(), 0.0, ConnectionStrategy::Pairwise);
//! let vertices = scene.tessellate();
//! assert_eq!(vertices.len() % 3, 0);
//! ```
//!
//! ## Core Concepts
//!
//! ### Parameters
//!
//! [`ParameterStore`] owns the live [`ParameterSet`]. Setting an input clamps
//! it, recomputes coherence and then notifies subscribers synchronously.
//!
//! ### Field
//!
//! [`ParticleField`] holds `floor(complexity / 2) + 20` points in a
//! `[0, 100]²` box. Each [`step`](ParticleField::step) is a pure function of
//! the previous frame plus optional noise: jitter, a pull toward the center
//! that grows with recursion, movement scaled by frequency, wall reflection
//! and damping. A complexity change reseeds a whole new generation.
//!
//! ### Connectivity and styling
//!
//! Points closer than `15 + recursion / 5` are connected, either by the
//! exact pairwise scan or through a uniform [`spatial`] grid. Coherence bands
//! pick colors, glow and the pulse ring; see [`visuals`].
//!
//! | Coherence | Field state |
//! |-----------|-------------|
//! | `> 90` | conscious |
//! | `> 50` | dreaming |
//! | else | dormant |
//!
//! ### Oracle
//!
//! [`ChatSession`] sends one request at a time to a [`ChatBackend`] on the
//! tokio runtime. Failures never surface as errors; they become a localized
//! fallback reply.

pub mod app;
pub mod chat;
pub mod config;
pub mod connections;
pub mod error;
pub mod frame_loop;
pub mod gpu;
pub mod i18n;
pub mod oracle;
pub mod params;
pub mod particle;
pub mod scene;
pub mod simulation;
pub mod spatial;
pub mod time;
#[cfg(feature = "egui")]
pub mod ui;
pub mod visuals;

pub use bytemuck;
pub use chat::{ChatSession, Refusal};
pub use config::AppConfig;
pub use connections::{Connection, ConnectionStrategy};
pub use error::{AppError, ConfigError, GpuError, OracleError};
pub use frame_loop::{FrameHost, FrameLoop};
pub use glam::{Vec2, Vec3, Vec4};
pub use i18n::Language;
pub use oracle::{ChatBackend, GeminiBackend, Message, OracleFailure, OracleRequest, Role};
pub use params::{Param, ParamChange, ParameterSet, ParameterStore};
pub use particle::Point;
pub use scene::{Scene, Vertex};
pub use simulation::{FieldState, ParticleField};
pub use time::Time;
pub use visuals::{CoherenceBand, FieldStateLabel};

/// Convenient re-exports for common usage.
///
/// ```
/// use aetheria::prelude::*;
/// ```
pub mod prelude {
    pub use crate::chat::ChatSession;
    pub use crate::config::AppConfig;
    pub use crate::connections::{connections_for, Connection, ConnectionStrategy};
    pub use crate::i18n::Language;
    pub use crate::oracle::{ChatBackend, GeminiBackend, Message, Role};
    pub use crate::params::{Param, ParameterSet, ParameterStore};
    pub use crate::particle::Point;
    pub use crate::scene::{Scene, Vertex};
    pub use crate::simulation::ParticleField;
    pub use crate::visuals::{CoherenceBand, FieldStateLabel, PulseRing};
    pub use crate::{Vec2, Vec3, Vec4};
    #[cfg(feature = "egui")]
    pub use egui;
}
