use super::types::{JobId, SimulationTime, SourceId};
use serde::{Deserialize, Serialize};

/// Lifecycle of a job. Every edge is taken at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Cooking,
    Completed,
    Rejected,
}

impl JobStatus {
    /// Whether moving from `self` to `next` is a legal lifecycle edge
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Cooking)
                | (JobStatus::Pending, JobStatus::Rejected)
                | (JobStatus::Cooking, JobStatus::Completed)
        )
    }
}

/// One unit of work flowing through the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub source_id: SourceId,
    pub arrived_at: SimulationTime,
    pub items: Vec<String>,
    pub address: String,
    status: JobStatus,
    cooking_started_at: Option<SimulationTime>,
    completed_at: Option<SimulationTime>,
}

impl Job {
    pub fn new(
        id: JobId,
        source_id: SourceId,
        arrived_at: SimulationTime,
        items: Vec<String>,
        address: String,
    ) -> Self {
        Self {
            id,
            source_id,
            arrived_at,
            items,
            address,
            status: JobStatus::Pending,
            cooking_started_at: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn cooking_started_at(&self) -> Option<SimulationTime> {
        self.cooking_started_at
    }

    pub fn completed_at(&self) -> Option<SimulationTime> {
        self.completed_at
    }

    /// Pending -> Cooking. Timestamps never precede the arrival time.
    pub fn start_cooking(&mut self, now: SimulationTime) -> bool {
        if !self.status.can_transition_to(JobStatus::Cooking) {
            return false;
        }
        self.status = JobStatus::Cooking;
        self.cooking_started_at = Some(now.max(self.arrived_at));
        true
    }

    /// Cooking -> Completed
    pub fn complete(&mut self, now: SimulationTime) -> bool {
        if !self.status.can_transition_to(JobStatus::Completed) {
            return false;
        }
        let started = self.cooking_started_at.unwrap_or(self.arrived_at);
        self.status = JobStatus::Completed;
        self.completed_at = Some(now.max(started));
        true
    }

    /// Pending -> Rejected
    pub fn reject(&mut self) -> bool {
        if !self.status.can_transition_to(JobStatus::Rejected) {
            return false;
        }
        self.status = JobStatus::Rejected;
        true
    }

    /// Time spent waiting before service; still counting while pending
    pub fn waiting_time(&self, now: SimulationTime) -> SimulationTime {
        match self.cooking_started_at {
            Some(started) => started - self.arrived_at,
            None => (now - self.arrived_at).max(0.0),
        }
    }

    /// Time spent in service, once completed
    pub fn service_time(&self) -> Option<SimulationTime> {
        match (self.cooking_started_at, self.completed_at) {
            (Some(started), Some(done)) => Some(done - started),
            _ => None,
        }
    }

    pub fn is_expired(&self, now: SimulationTime, max_wait: SimulationTime) -> bool {
        now - self.arrived_at > max_wait
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Job {} from source {}", self.id.short(), self.source_id)
    }
}
