//! ---
//! fz_section: "11-simulation"
//! fz_subsection: "module"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Simulation runtime helpers and synthetic telemetry."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use rand::prelude::*;

/// Largest value a [`RandomSource`] may return.
pub const MAX_UNIT: f64 = 1.0 - f64::EPSILON;

/// Uniform `[0, 1)` sampler threaded through every randomised computation.
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;

    /// `(U - 0.5) * span`, a symmetric perturbation.
    fn centered(&mut self, span: f64) -> f64 {
        (self.next_unit() - 0.5) * span
    }

    /// `base + U * spread`; a negative spread walks downward from `base`.
    fn spread(&mut self, base: f64, spread: f64) -> f64 {
        base + self.next_unit() * spread
    }
}

impl RandomSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Seedable source backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is set, entropy otherwise.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map(Self::new).unwrap_or_else(Self::from_entropy)
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Cycles through a fixed list of samples. Values are clamped into `[0, 1)`;
/// an empty script always yields 0.5.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of samples handed out so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.5;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, MAX_UNIT)
    }
}
