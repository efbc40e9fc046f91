
use crate::core::job::{Job, JobStatus};
use crate::core::sampler::DistributionSampler;
use crate::core::server::Server;
use crate::core::types::{JobId, ServerId, SimulationTime};
use crate::core::statistics::StatisticsSink;

/// Sampler with fixed draws: every uniform draw is `interval`, every
/// exponential draw is `service`, and ids count up from 1.
pub(crate) struct ScriptedSampler {
    pub interval: f64,
    pub service: f64,
    next_id: u8,
}

impl ScriptedSampler {
    pub fn new(interval: f64, service: f64) -> Self {
        Self {
            interval,
            service,
            next_id: 1,
        }
    }
}

impl DistributionSampler for ScriptedSampler {
    fn exponential(&mut self, _mean: f64) -> f64 {
        self.service
    }

    fn uniform(&mut self, _min: f64, _max: f64) -> f64 {
        self.interval
    }

    fn uniform_int(&mut self, min: u32, _max: u32) -> u32 {
        min
    }

    fn random_bytes(&mut self) -> [u8; 16] {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        [id; 16]
    }
}

pub(crate) fn job_id(n: u8) -> JobId {
    JobId::from_random_bytes([n; 16])
}

pub(crate) fn job(n: u8, arrived_at: SimulationTime) -> Job {
    Job::new(job_id(n), 0, arrived_at, vec!["Item_1".to_string()], "Address_1".to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Record {
    Arrival(JobId),
    Buffered(JobId),
    Dispatched(JobId, ServerId),
    Completed(JobId, JobStatus),
    Rejected(JobId, JobStatus),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub records: Vec<Record>,
    pub updates: Vec<(SimulationTime, usize, usize)>,
    pub intervals: Vec<SimulationTime>,
}

impl StatisticsSink for RecordingSink {
    fn record_arrival(&mut self, job: &Job) {
        self.records.push(Record::Arrival(job.id));
    }

    fn record_buffered(&mut self, job: &Job) {
        self.records.push(Record::Buffered(job.id));
    }

    fn record_dispatched(&mut self, job: &Job, server: ServerId) {
        self.records.push(Record::Dispatched(job.id, server));
    }

    fn record_completed(&mut self, job: &Job) {
        self.records.push(Record::Completed(job.id, job.status()));
    }

    fn record_rejected(&mut self, job: &Job) {
        self.records.push(Record::Rejected(job.id, job.status()));
    }

    fn update_system_state(
        &mut self,
        now: SimulationTime,
        buffer_occupancy: usize,
        busy_servers: usize,
        _servers: &[Server],
    ) {
        self.updates.push((now, buffer_occupancy, busy_servers));
    }

    fn record_interval(&mut self, now: SimulationTime, _buffer_occupancy: usize, _busy_servers: usize) {
        self.intervals.push(now);
    }
}
