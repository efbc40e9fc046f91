pub mod config;
pub mod replicas;

// Re-export commonly used types
pub use config::{ArrivalDistribution, ConcurrencyMode, SimulationConfig};
pub use replicas::{run_replicas, ReplicaBatch, ReplicaSummary};
