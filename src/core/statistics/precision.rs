use serde::{Deserialize, Serialize};

/// Confidence and relative precision wanted for the rejection-rate estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisionTarget {
    /// Student coefficient for the confidence level (1.643 for 0.9)
    pub t_alpha: f64,
    /// Relative precision, e.g. 0.1 for 10%
    pub delta: f64,
}

impl Default for PrecisionTarget {
    fn default() -> Self {
        Self {
            t_alpha: 1.643,
            delta: 0.1,
        }
    }
}

pub const MIN_ITERATIONS: u64 = 100;

/// Used while nothing has been rejected yet
pub const NO_REJECTION_ITERATIONS: u64 = 1000;

/// Number of jobs needed so the rejection probability `p` is estimated
/// within `delta` at the `t_alpha` confidence level:
/// `N = ceil(t_alpha^2 * (1 - p) / (p * delta^2))`, at least 100.
pub fn required_iterations(p: f64, target: &PrecisionTarget) -> u64 {
    if p.is_nan() || p <= 0.0 {
        return NO_REJECTION_ITERATIONS;
    }
    if target.delta.is_nan() || target.delta <= 0.0 {
        return MIN_ITERATIONS;
    }
    let n = target.t_alpha.powi(2) * (1.0 - p) / (p * target.delta.powi(2));
    let n = n.ceil();
    if n.is_finite() && n > MIN_ITERATIONS as f64 {
        n as u64
    } else {
        MIN_ITERATIONS
    }
}
