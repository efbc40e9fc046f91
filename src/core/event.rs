use super::types::{ServerId, SimulationTime, SourceId};
use serde::Serialize;

/// What happens when an event fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    /// A job arrives from this source
    Arrival { source_id: SourceId },
    /// This server finishes its current job
    Completion { server_id: ServerId },
    /// Periodic interval sample for the statistics sink, on top of the
    /// state pushed after every event
    StatisticsUpdate,
    /// Periodic invariant check of the buffer and servers
    SystemCheck,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Arrival { .. } => "job_arrival",
            EventKind::Completion { .. } => "server_completion",
            EventKind::StatisticsUpdate => "statistics_update",
            EventKind::SystemCheck => "system_check",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Event {
    pub time: SimulationTime,
    pub kind: EventKind,
}

impl Event {
    pub fn new(time: SimulationTime, kind: EventKind) -> Self {
        Self { time, kind }
    }

    pub fn arrival(time: SimulationTime, source_id: SourceId) -> Self {
        Self::new(time, EventKind::Arrival { source_id })
    }

    pub fn completion(time: SimulationTime, server_id: ServerId) -> Self {
        Self::new(time, EventKind::Completion { server_id })
    }
}
