//! The particle field simulator.
//!
//! [`ParticleField`] owns the live point set and advances it one frame at a
//! time. Each step is computed from the previous frame's complete point set
//! into a second buffer, which is then swapped in, so no point ever sees a
//! neighbor that was already updated this frame.
//!
//! ```
//! use aetheria::prelude::*;
//!
//! let params = ParameterSet::new(30.0, 50.0, 20.0);
//! let mut field = ParticleField::builder().with_seed(7).build(&params);
//! assert_eq!(field.points().len(), 45);
//!
//! for _ in 0..100 {
//!     field.step(&params);
//! }
//! assert!(field.points().iter().all(|p| p.in_bounds()));
//! ```

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::params::{Param, ParamChange, ParameterSet};
use crate::particle::{Point, FIELD_CENTER, FIELD_SIZE};

/// Half-width of the initial velocity distribution.
const INITIAL_SPEED: f32 = 0.25;
/// Amplitude of the per-frame velocity noise.
const NOISE_AMPLITUDE: f32 = 0.02;
/// Velocity retained per frame.
const DAMPING: f32 = 0.99;
/// Recursion level above which the center pull is active.
const GRAVITY_RECURSION_FLOOR: f32 = 10.0;

/// Number of points for a given complexity: `floor(complexity / 2) + 20`.
pub fn point_count(complexity: f32) -> usize {
    let complexity = Param::Complexity.sanitize(complexity);
    (complexity / 2.0).floor() as usize + 20
}

/// Lifecycle of the current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// Freshly generated, not yet stepped.
    Seeded,
    /// At least one step has run since the last reseed.
    Running,
}

/// Tunables for the integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepConfig {
    /// Add the random velocity jitter each frame.
    pub noise: bool,
    /// Velocity multiplier applied at the end of each step.
    pub damping: f32,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            noise: true,
            damping: DAMPING,
        }
    }
}

/// Builder for [`ParticleField`].
#[derive(Debug, Clone, Default)]
pub struct FieldBuilder {
    seed: Option<u64>,
    step: StepConfig,
}

impl FieldBuilder {
    /// Use a fixed RNG seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Optionally fix the RNG seed.
    pub fn with_optional_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable the per-frame velocity noise.
    pub fn with_noise(mut self, enabled: bool) -> Self {
        self.step.noise = enabled;
        self
    }

    /// Override the whole step configuration.
    pub fn with_step_config(mut self, step: StepConfig) -> Self {
        self.step = step;
        self
    }

    /// Seed the first generation from `params`.
    pub fn build(self, params: &ParameterSet) -> ParticleField {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut field = ParticleField {
            points: Vec::new(),
            scratch: Vec::new(),
            rng,
            step_config: self.step,
            complexity: f32::NAN,
            generation: 0,
            frame: 0,
            state: FieldState::Seeded,
        };
        field.reseed(params.complexity);
        field
    }
}

/// Owner of the live point set.
#[derive(Debug)]
pub struct ParticleField {
    points: Vec<Point>,
    scratch: Vec<Point>,
    rng: StdRng,
    step_config: StepConfig,
    /// Complexity the current generation was seeded for.
    complexity: f32,
    generation: u64,
    frame: u64,
    state: FieldState,
}

impl ParticleField {
    pub fn builder() -> FieldBuilder {
        FieldBuilder::default()
    }

    /// Field seeded from OS entropy with default step settings.
    pub fn new(params: &ParameterSet) -> Self {
        Self::builder().build(params)
    }

    /// Read-only view of the current frame.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Generation number, incremented on every reseed.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Steps run since the last reseed.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn state(&self) -> FieldState {
        self.state
    }

    #[inline]
    pub fn step_config(&self) -> StepConfig {
        self.step_config
    }

    pub fn set_step_config(&mut self, step: StepConfig) {
        self.step_config = step;
    }

    /// Replace the whole point set with a fresh generation.
    ///
    /// Positions are uniform over the field, velocities uniform in
    /// `[-0.25, 0.25]` per axis, ids run `0..n`.
    pub fn reseed(&mut self, complexity: f32) {
        let complexity = Param::Complexity.sanitize(complexity);
        let count = point_count(complexity);

        let rng = &mut self.rng;
        self.points = (0..count)
            .map(|i| {
                let position = Vec2::new(
                    rng.gen_range(0.0..=FIELD_SIZE),
                    rng.gen_range(0.0..=FIELD_SIZE),
                );
                let velocity = Vec2::new(
                    rng.gen_range(-INITIAL_SPEED..=INITIAL_SPEED),
                    rng.gen_range(-INITIAL_SPEED..=INITIAL_SPEED),
                );
                Point::new(i as u32, position, velocity)
            })
            .collect();
        self.scratch.clear();
        self.scratch.reserve(count);

        self.complexity = complexity;
        self.generation += 1;
        self.frame = 0;
        self.state = FieldState::Seeded;

        tracing::debug!(
            generation = self.generation,
            count,
            complexity,
            "field reseeded"
        );
    }

    /// React to a parameter change. Only complexity triggers a reseed.
    ///
    /// Returns `true` if a new generation was created.
    pub fn on_param_change(&mut self, change: &ParamChange) -> bool {
        if change.param == Param::Complexity {
            self.reseed(change.new);
            true
        } else {
            false
        }
    }

    /// Reseed if `params` carries a different complexity than the current
    /// generation was built for.
    pub fn sync(&mut self, params: &ParameterSet) -> bool {
        let complexity = Param::Complexity.sanitize(params.complexity);
        if complexity != self.complexity {
            self.reseed(complexity);
            true
        } else {
            false
        }
    }

    /// Advance one frame.
    pub fn step(&mut self, params: &ParameterSet) {
        let params = params.sanitized();
        let config = self.step_config;
        let rng = &mut self.rng;

        self.scratch.clear();
        self.scratch.extend(
            self.points
                .iter()
                .map(|p| integrate(p, &params, &config, &mut || noise_sample(rng))),
        );
        std::mem::swap(&mut self.points, &mut self.scratch);

        self.frame += 1;
        self.state = FieldState::Running;
    }
}

fn noise_sample(rng: &mut StdRng) -> Vec2 {
    Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5)
}

/// Compute one point's next state from its previous state.
///
/// `noise` yields a jitter sample with both components in `[-0.5, 0.5)`;
/// it is only drawn when `config.noise` is set.
pub fn integrate(
    point: &Point,
    params: &ParameterSet,
    config: &StepConfig,
    noise: &mut dyn FnMut() -> Vec2,
) -> Point {
    let speed_factor = (params.frequency / 50.0) * 0.5;
    let center_gravity = (params.recursion / 100.0) * 0.05;

    let mut velocity = point.velocity;

    if params.recursion > GRAVITY_RECURSION_FLOOR {
        velocity += (FIELD_CENTER - point.position) * center_gravity * speed_factor;
    }

    if config.noise {
        velocity += noise() * NOISE_AMPLITUDE * speed_factor;
    }

    let mut position = point.position + velocity * speed_factor;

    if position.x < 0.0 || position.x > FIELD_SIZE {
        velocity.x = -velocity.x;
        position.x = position.x.clamp(0.0, FIELD_SIZE);
    }
    if position.y < 0.0 || position.y > FIELD_SIZE {
        velocity.y = -velocity.y;
        position.y = position.y.clamp(0.0, FIELD_SIZE);
    }

    velocity *= config.damping;

    Point {
        id: point.id,
        position,
        velocity,
    }
}
