//! Simulation parameters and the coherence reactor.
//!
//! Three scalars are user-tunable: `frequency`, `complexity` and `recursion`.
//! A fourth, `coherence`, is derived from them and is never set directly.
//! Every setter on [`ParameterStore`] clamps its input, recomputes coherence
//! synchronously and only then notifies subscribers, so an observer always
//! sees a consistent set.
//!
//! # Example
//!
//! ```
//! use aetheria::params::{Param, ParameterStore};
//!
//! let mut store = ParameterStore::default();
//! assert_eq!(store.get().coherence, 22.0);
//!
//! store.set(Param::Complexity, 120.0);
//! store.set(Param::Recursion, 90.0);
//! assert!((store.get().coherence - 93.6).abs() < 1e-3);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Valid range for `frequency` (Hz).
pub const FREQUENCY_RANGE: RangeInclusive<f32> = 1.0..=100.0;
/// Valid range for `complexity` (nodes).
pub const COMPLEXITY_RANGE: RangeInclusive<f32> = 10.0..=200.0;
/// Valid range for `recursion` (self-model depth).
pub const RECURSION_RANGE: RangeInclusive<f32> = 0.0..=100.0;
/// Range of the derived `coherence` value.
pub const COHERENCE_RANGE: RangeInclusive<f32> = 0.0..=100.0;

/// One of the three user-adjustable inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    Frequency,
    Complexity,
    Recursion,
}

impl Param {
    /// All inputs, in control-panel order.
    pub const ALL: [Param; 3] = [Param::Frequency, Param::Complexity, Param::Recursion];

    /// Documented range for this input.
    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            Param::Frequency => FREQUENCY_RANGE,
            Param::Complexity => COMPLEXITY_RANGE,
            Param::Recursion => RECURSION_RANGE,
        }
    }

    /// Clamp `value` into range. Non-finite values map to the range minimum.
    pub fn sanitize(self, value: f32) -> f32 {
        let range = self.range();
        if value.is_finite() {
            value.clamp(*range.start(), *range.end())
        } else {
            *range.start()
        }
    }
}

/// The full parameter record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub frequency: f32,
    pub complexity: f32,
    pub recursion: f32,
    /// Derived; see [`coherence`].
    #[serde(skip_deserializing)]
    pub coherence: f32,
}

impl ParameterSet {
    /// Build a set from raw inputs, clamping each and deriving coherence.
    pub fn new(frequency: f32, complexity: f32, recursion: f32) -> Self {
        let frequency = Param::Frequency.sanitize(frequency);
        let complexity = Param::Complexity.sanitize(complexity);
        let recursion = Param::Recursion.sanitize(recursion);
        Self {
            frequency,
            complexity,
            recursion,
            coherence: coherence(frequency, complexity, recursion),
        }
    }

    /// Read one input.
    pub fn value(&self, param: Param) -> f32 {
        match param {
            Param::Frequency => self.frequency,
            Param::Complexity => self.complexity,
            Param::Recursion => self.recursion,
        }
    }

    /// Re-clamp every input and recompute coherence.
    ///
    /// Deserialized or hand-built sets may carry out-of-range values.
    pub fn sanitized(&self) -> Self {
        Self::new(self.frequency, self.complexity, self.recursion)
    }

    /// Entropy readout shown next to the field: `(100 - recursion) / 10`.
    pub fn entropy(&self) -> f32 {
        (100.0 - self.recursion) / 10.0
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::new(30.0, 50.0, 20.0)
    }
}

/// Derive coherence from the three inputs.
///
/// `frequency` does not contribute; it only sets the simulation speed.
pub fn coherence(_frequency: f32, complexity: f32, recursion: f32) -> f32 {
    let norm_comp = complexity / 200.0;
    let norm_rec = recursion / 100.0;

    let mut raw = (norm_comp * 0.4 + norm_rec * 0.6) * 100.0;
    if recursion > 80.0 && complexity > 100.0 {
        raw *= 1.2;
    }

    if raw.is_nan() {
        return *COHERENCE_RANGE.start();
    }
    raw.clamp(*COHERENCE_RANGE.start(), *COHERENCE_RANGE.end())
}

/// An effective change to one input, delivered after coherence is updated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamChange {
    pub param: Param,
    pub old: f32,
    pub new: f32,
    /// Snapshot of the whole set after the change.
    pub params: ParameterSet,
}

/// Handle returned by [`ParameterStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ParamChange)>;

/// Owner of the live [`ParameterSet`].
///
/// Listeners run synchronously inside [`ParameterStore::set`], after the
/// derived value has been stored.
pub struct ParameterStore {
    params: ParameterSet,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl ParameterStore {
    pub fn new(params: ParameterSet) -> Self {
        Self {
            params: params.sanitized(),
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Current parameter set.
    #[inline]
    pub fn get(&self) -> ParameterSet {
        self.params
    }

    /// Set one input.
    ///
    /// Returns the change if the clamped value differs from the current one.
    /// Non-finite input is ignored.
    pub fn set(&mut self, param: Param, value: f32) -> Option<ParamChange> {
        if !value.is_finite() {
            tracing::warn!(?param, value, "ignoring non-finite parameter input");
            return None;
        }

        let new = param.sanitize(value);
        let old = self.params.value(param);
        if new == old {
            return None;
        }

        let (frequency, complexity, recursion) = match param {
            Param::Frequency => (new, self.params.complexity, self.params.recursion),
            Param::Complexity => (self.params.frequency, new, self.params.recursion),
            Param::Recursion => (self.params.frequency, self.params.complexity, new),
        };
        self.params = ParameterSet::new(frequency, complexity, recursion);

        let change = ParamChange {
            param,
            old,
            new,
            params: self.params,
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
        Some(change)
    }

    /// Register a listener called on every effective change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ParamChange) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(ParameterSet::default())
    }
}

impl std::fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStore")
            .field("params", &self.params)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_default_scenario() {
        let params = ParameterSet::default();
        assert!((params.coherence - 22.0).abs() < 1e-4);
    }

    #[test]
    fn test_boosted_scenario() {
        let params = ParameterSet::new(30.0, 120.0, 90.0);
        assert!((params.coherence - 93.6).abs() < 1e-3);
    }

    #[test]
    fn test_boost_requires_both_conditions() {
        // recursion > 80 but complexity == 100: no boost
        let params = ParameterSet::new(30.0, 100.0, 90.0);
        assert!((params.coherence - 74.0).abs() < 1e-3);
    }

    #[test]
    fn test_coherence_clamped_at_max() {
        let params = ParameterSet::new(100.0, 200.0, 100.0);
        assert_eq!(params.coherence, 100.0);
    }

    #[test]
    fn test_frequency_does_not_affect_coherence() {
        let a = ParameterSet::new(1.0, 80.0, 40.0);
        let b = ParameterSet::new(100.0, 80.0, 40.0);
        assert_eq!(a.coherence, b.coherence);
    }

    #[test]
    fn test_coherence_in_range_over_grid() {
        for f in (1..=100).step_by(9) {
            for c in (10..=200).step_by(7) {
                for r in (0..=100).step_by(5) {
                    let p = ParameterSet::new(f as f32, c as f32, r as f32);
                    assert!(COHERENCE_RANGE.contains(&p.coherence), "{:?}", p);
                }
            }
        }
    }

    #[test]
    fn test_set_clamps_and_notifies() {
        let mut store = ParameterStore::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |change| sink.borrow_mut().push(*change));

        let change = store.set(Param::Recursion, 500.0).unwrap();
        assert_eq!(change.new, 100.0);
        assert_eq!(store.get().recursion, 100.0);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        // Listener observed the recomputed coherence
        assert_eq!(seen[0].params.coherence, store.get().coherence);
    }

    #[test]
    fn test_unchanged_value_is_silent() {
        let mut store = ParameterStore::default();
        assert!(store.set(Param::Frequency, 30.0).is_none());
    }

    #[test]
    fn test_non_finite_input_ignored() {
        let mut store = ParameterStore::default();
        let before = store.get();
        assert!(store.set(Param::Complexity, f32::NAN).is_none());
        assert!(store.set(Param::Frequency, f32::INFINITY).is_none());
        assert_eq!(store.get(), before);
    }

    #[test]
    fn test_unsubscribe() {
        let mut store = ParameterStore::default();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = store.subscribe(move |_| *sink.borrow_mut() += 1);

        store.set(Param::Frequency, 40.0);
        assert!(store.unsubscribe(id));
        store.set(Param::Frequency, 50.0);

        assert_eq!(*count.borrow(), 1);
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn test_entropy_readout() {
        let params = ParameterSet::new(30.0, 50.0, 20.0);
        assert!((params.entropy() - 8.0).abs() < 1e-6);
    }
}
