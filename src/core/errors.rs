use std::fmt;

/// Faults that stop a simulation run.
///
/// Routine outcomes such as a rejected job or a no-op on a busy server are
/// reported through return values instead; anything surfacing here means an
/// internal invariant was broken or the configuration was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// No empty slot was found even though eviction should have freed one.
    NoFreeSlot { capacity: usize, count: usize },
    /// The occupied-slot counter disagrees with the slot array.
    BufferCorrupted { count: usize, occupied: usize },
    /// A server is busy without a job, or holds a job while marked free.
    ServerCorrupted(usize),
    /// An event referenced a server index that does not exist.
    UnknownServer(usize),
    InvalidConfig(String),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::NoFreeSlot { capacity, count } => write!(
                f,
                "no free buffer slot found (capacity {}, count {})",
                capacity, count
            ),
            SimulationError::BufferCorrupted { count, occupied } => write!(
                f,
                "buffer count {} does not match {} occupied slots",
                count, occupied
            ),
            SimulationError::ServerCorrupted(id) => {
                write!(f, "server {} busy flag does not match its held job", id)
            }
            SimulationError::UnknownServer(id) => write!(f, "unknown server index {}", id),
            SimulationError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for SimulationError {}
