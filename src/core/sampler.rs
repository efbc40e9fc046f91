use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};

/// Source of every random draw the simulation makes.
///
/// Servers and the simulator never touch a global generator; they receive a
/// sampler, so a fixed seed (or a scripted implementation in tests) makes a
/// run fully reproducible.
pub trait DistributionSampler {
    /// Exponentially distributed value with the given mean.
    /// A non-positive mean yields 0.0.
    fn exponential(&mut self, mean: f64) -> f64;

    /// Uniform value in `[min, max)`. Returns `min` when the range is empty.
    fn uniform(&mut self, min: f64, max: f64) -> f64;

    /// Uniform integer in `[min, max]`. Returns `min` when `max < min`.
    fn uniform_int(&mut self, min: u32, max: u32) -> u32;

    /// Raw bytes for identifiers
    fn random_bytes(&mut self) -> [u8; 16];
}

/// `StdRng`-backed sampler
#[derive(Debug, Clone)]
pub struct SeededSampler {
    rng: StdRng,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Sampler seeded from OS entropy, for non-reproducible runs
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl DistributionSampler for SeededSampler {
    fn exponential(&mut self, mean: f64) -> f64 {
        if mean.is_nan() || mean <= 0.0 {
            return 0.0;
        }
        match Exp::new(1.0 / mean) {
            Ok(exp) => exp.sample(&mut self.rng),
            Err(_) => 0.0,
        }
    }

    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if min.is_nan() || max.is_nan() || max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    fn uniform_int(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn random_bytes(&mut self) -> [u8; 16] {
        self.rng.gen()
    }
}
