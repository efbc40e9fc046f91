use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Simulated time in minutes since the start of the run
pub type SimulationTime = f64;

/// Index of an arrival source
pub type SourceId = usize;

/// Index of a server, which is also its position in the server list
pub type ServerId = usize;

/// Unique job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Build an id from 16 random bytes so ids follow the injected random stream
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight hex characters, used in log lines
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_is_deterministic() {
        let a = JobId::from_random_bytes([7; 16]);
        let b = JobId::from_random_bytes([7; 16]);
        assert_eq!(a, b);
        assert_eq!(a.short().len(), 8);
        assert_eq!(a.as_uuid().get_version_num(), 4);
    }
}
