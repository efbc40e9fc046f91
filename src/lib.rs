pub mod core;

// Re-export commonly used types
pub use crate::core::buffer::CircularBuffer;
pub use crate::core::dispatch::{Placement, PlacementDispatcher, SelectionDispatcher};
pub use crate::core::errors::SimulationError;
pub use crate::core::event::{Event, EventKind};
pub use crate::core::event_calendar::EventCalendar;
pub use crate::core::execution::{ArrivalDistribution, ConcurrencyMode, SimulationConfig};
pub use crate::core::job::{Job, JobStatus};
pub use crate::core::sampler::{DistributionSampler, SeededSampler};
pub use crate::core::server::Server;
pub use crate::core::simulation_engine::{LoadClass, RunCounters, RunSummary, Simulator, SystemSnapshot};
pub use crate::core::statistics::{StatisticsCollector, StatisticsSink};
pub use crate::core::types::{JobId, ServerId, SimulationTime, SourceId};
