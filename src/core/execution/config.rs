//! Configuration for a kitchen simulation run
//!
//! Covers the shape of the system (sources, servers, buffer), the timing
//! distributions, optional periodic events and how replica batches execute.

use crate::core::errors::SimulationError;
use crate::core::statistics::PrecisionTarget;
use serde::{Deserialize, Serialize};

/// Enumeration of supported concurrency modes for replica batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Replicas run one after another on the calling thread
    Sequential,
    /// Replicas run on a Rayon thread pool, each owning its own simulator
    Rayon,
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::Sequential
    }
}

/// How inter-arrival intervals are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrivalDistribution {
    /// `U(max(0.1, mean - 1), mean + 1)`
    Uniform,
    /// `Exp(1 / mean)`
    Exponential,
}

impl Default for ArrivalDistribution {
    fn default() -> Self {
        ArrivalDistribution::Uniform
    }
}

/// Configuration for simulation execution
///
/// Construction never validates: zero or negative values give degenerate
/// runs rather than panics. Call [`SimulationConfig::validate`] to refuse them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub num_sources: usize,
    pub num_servers: usize,
    pub buffer_capacity: usize,
    /// Mean time between arrivals from one source, in minutes
    pub mean_arrival_time: f64,
    /// Mean service time of one server, in minutes
    pub mean_service_time: f64,
    pub arrival_distribution: ArrivalDistribution,
    /// First arrival of each source falls uniformly in `[0, window)`
    pub initial_arrival_window: f64,
    /// `None` seeds from OS entropy
    pub random_seed: Option<u64>,
    /// Interval of periodic statistics-update events, if any
    pub statistics_interval: Option<f64>,
    /// Interval of periodic system-check events, if any
    pub system_check_interval: Option<f64>,
    pub precision: PrecisionTarget,
    /// The concurrency mode to use for replica batches
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel replicas
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
}

/// False for NaN as well as for zero and negatives
fn is_positive(value: f64) -> bool {
    value > 0.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_sources: 1,
            num_servers: 3,
            buffer_capacity: 20,
            mean_arrival_time: 2.0,
            mean_service_time: 10.0,
            arrival_distribution: ArrivalDistribution::default(),
            initial_arrival_window: 5.0,
            random_seed: Some(42),
            statistics_interval: None,
            system_check_interval: None,
            precision: PrecisionTarget::default(),
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sources(mut self, count: usize) -> Self {
        self.num_sources = count;
        self
    }

    pub fn with_servers(mut self, count: usize) -> Self {
        self.num_servers = count;
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn with_mean_arrival_time(mut self, minutes: f64) -> Self {
        self.mean_arrival_time = minutes;
        self
    }

    pub fn with_mean_service_time(mut self, minutes: f64) -> Self {
        self.mean_service_time = minutes;
        self
    }

    pub fn with_arrival_distribution(mut self, distribution: ArrivalDistribution) -> Self {
        self.arrival_distribution = distribution;
        self
    }

    pub fn with_initial_arrival_window(mut self, minutes: f64) -> Self {
        self.initial_arrival_window = minutes;
        self
    }

    pub fn with_random_seed(mut self, seed: Option<u64>) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_statistics_interval(mut self, minutes: Option<f64>) -> Self {
        self.statistics_interval = minutes;
        self
    }

    pub fn with_system_check_interval(mut self, minutes: Option<f64>) -> Self {
        self.system_check_interval = minutes;
        self
    }

    pub fn with_precision(mut self, precision: PrecisionTarget) -> Self {
        self.precision = precision;
        self
    }

    /// Set the concurrency mode for replica batches
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the thread pool size for parallel replicas
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |msg: &str| Err(SimulationError::InvalidConfig(msg.to_string()));

        if self.num_sources == 0 {
            return invalid("at least one source is required");
        }
        if self.num_servers == 0 {
            return invalid("at least one server is required");
        }
        if self.buffer_capacity == 0 {
            return invalid("buffer capacity must be greater than 0");
        }
        if !is_positive(self.mean_arrival_time) {
            return invalid("mean arrival time must be greater than 0");
        }
        if !is_positive(self.mean_service_time) {
            return invalid("mean service time must be greater than 0");
        }
        if self.initial_arrival_window < 0.0 {
            return invalid("initial arrival window cannot be negative");
        }
        for interval in [self.statistics_interval, self.system_check_interval]
            .into_iter()
            .flatten()
        {
            if !is_positive(interval) {
                return invalid("periodic event intervals must be greater than 0");
            }
        }
        if !is_positive(self.precision.delta) || !is_positive(self.precision.t_alpha) {
            return invalid("precision target must be positive");
        }
        if self.thread_pool_size == Some(0) {
            return invalid("thread pool size must be greater than 0");
        }
        Ok(())
    }
}
