//! Injectable randomness for the probabilistic filters.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Strategy for uniform draws. Constructor-supplied so tests can script the
/// exact sequence of decisions a filter makes.
pub trait UniformSource: Send {
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Deterministic generator seeded per proxy session, so a failing test run
/// can be replayed from its seed.
pub struct SeededRng {
    rng: StdRng,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl UniformSource for SeededRng {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.rng.random_range(low..high)
    }
}

#[cfg(test)]
pub(crate) struct ScriptedSource {
    draws: std::collections::VecDeque<f64>,
}

#[cfg(test)]
impl ScriptedSource {
    pub(crate) fn new(draws: &[f64]) -> Self {
        Self {
            draws: draws.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl UniformSource for ScriptedSource {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        let unit = self.draws.pop_front().expect("scripted draws exhausted");
        low + unit * (high - low)
    }
}
