use super::job::Job;
use super::sampler::DistributionSampler;
use super::types::{ServerId, SimulationTime};
use log::debug;

/// Single-capacity processing unit (a kitchen line).
///
/// `busy` always equals `job.is_some()`, and the completion time is set
/// exactly while busy.
#[derive(Debug, Clone)]
pub struct Server {
    id: ServerId,
    mean_service_time: f64,
    busy: bool,
    job: Option<Job>,
    started_at: Option<SimulationTime>,
    completion_time: Option<SimulationTime>,
}

impl Server {
    pub fn new(id: ServerId, mean_service_time: f64) -> Self {
        Self {
            id,
            mean_service_time,
            busy: false,
            job: None,
            started_at: None,
            completion_time: None,
        }
    }

    pub fn id(&self) -> ServerId {
        self.id
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_available(&self) -> bool {
        !self.busy
    }

    pub fn current_job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn started_at(&self) -> Option<SimulationTime> {
        self.started_at
    }

    pub fn completion_time(&self) -> Option<SimulationTime> {
        self.completion_time
    }

    /// Start serving `job` at `now`.
    ///
    /// A busy server refuses and hands the job back untouched. Otherwise the
    /// service duration is drawn from an exponential distribution with the
    /// configured mean.
    pub fn assign(
        &mut self,
        mut job: Job,
        now: SimulationTime,
        sampler: &mut dyn DistributionSampler,
    ) -> Result<(), Job> {
        if self.busy {
            return Err(job);
        }

        let duration = sampler.exponential(self.mean_service_time);
        job.start_cooking(now);

        debug!(
            "[Server {}] Assigned {} at {:.3}, service {:.3} min",
            self.id, job, now, duration
        );

        self.busy = true;
        self.job = Some(job);
        self.started_at = Some(now);
        self.completion_time = Some(now + duration);
        Ok(())
    }

    /// Finish the held job and free the server. Returns `None` when idle.
    pub fn complete(&mut self, now: SimulationTime) -> Option<Job> {
        if !self.busy {
            return None;
        }
        let mut job = self.job.take()?;
        job.complete(now);

        debug!("[Server {}] Completed {} at {:.3}", self.id, job, now);

        self.busy = false;
        self.started_at = None;
        self.completion_time = None;
        Some(job)
    }

    pub fn is_due(&self, now: SimulationTime) -> bool {
        match self.completion_time {
            Some(done) => self.busy && now >= done,
            None => false,
        }
    }

    /// Time left until completion; zero when idle or overdue
    pub fn remaining_time(&self, now: SimulationTime) -> SimulationTime {
        match self.completion_time {
            Some(done) if self.busy => (done - now).max(0.0),
            _ => 0.0,
        }
    }

    /// Whether the busy flag agrees with the held job and completion time
    pub fn is_consistent(&self) -> bool {
        self.busy == self.job.is_some() && self.busy == self.completion_time.is_some()
    }
}

#[cfg(test)]
impl Server {
    /// Overwrite the busy flag without touching the held job
    pub(crate) fn force_busy(&mut self, busy: bool) {
        self.busy = busy;
    }
}

impl std::fmt::Display for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.job {
            Some(job) => write!(f, "Server {}: BUSY - {}", self.id, job),
            None => write!(f, "Server {}: FREE", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::job::JobStatus;
    use crate::core::types::JobId;

    struct FixedSampler(f64);

    impl DistributionSampler for FixedSampler {
        fn exponential(&mut self, _mean: f64) -> f64 {
            self.0
        }
        fn uniform(&mut self, min: f64, _max: f64) -> f64 {
            min
        }
        fn uniform_int(&mut self, min: u32, _max: u32) -> u32 {
            min
        }
        fn random_bytes(&mut self) -> [u8; 16] {
            [0; 16]
        }
    }

    fn job(n: u8, arrived_at: f64) -> Job {
        Job::new(JobId::from_random_bytes([n; 16]), 0, arrived_at, vec![], String::new())
    }

    #[test]
    fn test_assign_sets_completion() {
        let mut server = Server::new(0, 10.0);
        let mut sampler = FixedSampler(4.0);
        assert!(server.assign(job(1, 1.0), 2.0, &mut sampler).is_ok());
        assert!(server.is_busy());
        assert_eq!(server.started_at(), Some(2.0));
        assert_eq!(server.completion_time(), Some(6.0));
        let held = server.current_job().unwrap();
        assert_eq!(held.status(), JobStatus::Cooking);
        assert_eq!(held.cooking_started_at(), Some(2.0));
        assert!(server.is_consistent());
    }

    #[test]
    fn test_busy_server_hands_job_back() {
        let mut server = Server::new(0, 10.0);
        let mut sampler = FixedSampler(4.0);
        server.assign(job(1, 0.0), 0.0, &mut sampler).unwrap();
        let refused = server.assign(job(2, 1.0), 1.0, &mut sampler).unwrap_err();
        assert_eq!(refused.status(), JobStatus::Pending);
        assert_eq!(server.current_job().unwrap().id, JobId::from_random_bytes([1; 16]));
        assert_eq!(server.completion_time(), Some(4.0));
    }

    #[test]
    fn test_complete_frees_server() {
        let mut server = Server::new(3, 10.0);
        let mut sampler = FixedSampler(4.0);
        assert!(server.complete(1.0).is_none());
        server.assign(job(1, 0.0), 0.0, &mut sampler).unwrap();
        let done = server.complete(4.0).unwrap();
        assert_eq!(done.status(), JobStatus::Completed);
        assert_eq!(done.completed_at(), Some(4.0));
        assert!(server.is_available());
        assert_eq!(server.completion_time(), None);
        assert!(server.is_consistent());
    }

    #[test]
    fn test_inconsistent_flags_detected() {
        let mut server = Server::new(0, 10.0);
        let mut sampler = FixedSampler(4.0);
        server.assign(job(1, 0.0), 0.0, &mut sampler).unwrap();
        server.force_busy(false);
        assert!(!server.is_consistent());

        let mut idle = Server::new(1, 10.0);
        idle.force_busy(true);
        assert!(!idle.is_consistent());
        // A server marked busy without a job has nothing to complete.
        assert!(idle.complete(1.0).is_none());
    }

    #[test]
    fn test_due_and_remaining() {
        let mut server = Server::new(0, 10.0);
        let mut sampler = FixedSampler(5.0);
        assert!(!server.is_due(100.0));
        assert_eq!(server.remaining_time(0.0), 0.0);
        server.assign(job(1, 0.0), 1.0, &mut sampler).unwrap();
        assert!(!server.is_due(5.9));
        assert!(server.is_due(6.0));
        assert_eq!(server.remaining_time(4.0), 2.0);
        assert_eq!(server.remaining_time(9.0), 0.0);
    }
}
