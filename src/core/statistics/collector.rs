use super::precision::{required_iterations, PrecisionTarget};
use super::sink::StatisticsSink;
use crate::core::job::Job;
use crate::core::server::Server;
use crate::core::types::{ServerId, SimulationTime, SourceId};
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counters and samples for one arrival source
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceStatistics {
    pub source_id: SourceId,
    pub generated: u64,
    pub dispatched: u64,
    pub buffered: u64,
    pub completed: u64,
    pub rejected: u64,
    pub total_wait_time: f64,
    pub total_service_time: f64,
    pub wait_times: Vec<f64>,
    pub service_times: Vec<f64>,
}

impl SourceStatistics {
    fn new(source_id: SourceId) -> Self {
        Self {
            source_id,
            ..Default::default()
        }
    }
}

/// Point-in-time aggregate view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_jobs: u64,
    pub completed_jobs: u64,
    pub rejected_jobs: u64,
    pub buffered_jobs: u64,
    pub server_utilization: f64,
    pub buffer_utilization: f64,
    pub avg_wait_time: f64,
    pub rejection_rate: f64,
    pub jobs_per_minute: f64,
}

/// Activity over one statistics interval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalSample {
    pub time: SimulationTime,
    pub buffer_occupancy: usize,
    pub busy_servers: usize,
    pub arrivals: u64,
    pub completions: u64,
    pub rejections: u64,
    /// Completions per minute since the previous sample
    pub throughput: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source_id: SourceId,
    pub generated: u64,
    pub p_reject: f64,
    pub t_system: f64,
    pub t_wait: f64,
    pub t_service: f64,
    pub d_wait: f64,
    pub d_service: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerReport {
    pub server_id: ServerId,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalReport {
    pub sources: Vec<SourceReport>,
    pub servers: Vec<ServerReport>,
    pub system_load: f64,
}

impl FinalReport {
    /// Write the report tables to the log
    pub fn log(&self) {
        info!("=== SOURCE CHARACTERISTICS ===");
        info!(
            "{:<8} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10}",
            "Source", "Generated", "P_reject", "T_system", "T_wait", "T_service", "D_wait", "D_service"
        );
        for s in &self.sources {
            info!(
                "{:<8} {:<10} {:<10.3} {:<10.2} {:<10.2} {:<10.2} {:<10.2} {:<10.2}",
                format!("S{}", s.source_id),
                s.generated,
                s.p_reject,
                s.t_system,
                s.t_wait,
                s.t_service,
                s.d_wait,
                s.d_service
            );
        }
        info!("=== SERVER UTILIZATION ===");
        for s in &self.servers {
            info!("{:<10} {:<12.3}", format!("K{}", s.server_id), s.utilization);
        }
        info!("System load (rho): {:.3}", self.system_load);
    }
}

/// Default statistics sink: per-source counters, server busy time measured in
/// simulated minutes, and per-step histories.
#[derive(Debug, Clone)]
pub struct StatisticsCollector {
    buffer_capacity: usize,
    start_time: SimulationTime,
    last_update_time: SimulationTime,
    sources: BTreeMap<SourceId, SourceStatistics>,
    server_busy_time: Vec<f64>,
    server_states: Vec<bool>,

    total_jobs: u64,
    completed_jobs: u64,
    rejected_jobs: u64,
    buffered_jobs: u64,

    pub timestamps: Vec<SimulationTime>,
    pub buffer_usage_history: Vec<usize>,
    pub utilization_history: Vec<f64>,
    pub wait_time_history: Vec<f64>,
    pub rejection_history: Vec<u64>,
    pub interval_history: Vec<IntervalSample>,
    /// Time and cumulative (arrivals, completions, rejections) at the last sample
    last_interval: (SimulationTime, u64, u64, u64),
}

impl StatisticsCollector {
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            buffer_capacity,
            start_time: 0.0,
            last_update_time: 0.0,
            sources: BTreeMap::new(),
            server_busy_time: Vec::new(),
            server_states: Vec::new(),
            total_jobs: 0,
            completed_jobs: 0,
            rejected_jobs: 0,
            buffered_jobs: 0,
            timestamps: Vec::new(),
            buffer_usage_history: Vec::new(),
            utilization_history: Vec::new(),
            wait_time_history: Vec::new(),
            rejection_history: Vec::new(),
            interval_history: Vec::new(),
            last_interval: (0.0, 0, 0, 0),
        }
    }

    fn source_stats(&mut self, source_id: SourceId) -> &mut SourceStatistics {
        self.sources
            .entry(source_id)
            .or_insert_with(|| SourceStatistics::new(source_id))
    }

    pub fn sources(&self) -> impl Iterator<Item = &SourceStatistics> {
        self.sources.values()
    }

    pub fn total_jobs(&self) -> u64 {
        self.total_jobs
    }

    pub fn completed_jobs(&self) -> u64 {
        self.completed_jobs
    }

    pub fn rejected_jobs(&self) -> u64 {
        self.rejected_jobs
    }

    pub fn rejection_rate(&self) -> f64 {
        self.rejected_jobs as f64 / self.total_jobs.max(1) as f64
    }

    fn elapsed(&self) -> f64 {
        self.last_update_time - self.start_time
    }

    fn total_wait_time(&self) -> f64 {
        self.sources.values().map(|s| s.total_wait_time).sum()
    }

    pub fn current_stats(&self) -> StatsSnapshot {
        let elapsed = self.elapsed();
        let servers = self.server_busy_time.len();

        let server_utilization = if elapsed > 0.0 && servers > 0 {
            self.server_busy_time.iter().sum::<f64>() / (servers as f64 * elapsed)
        } else {
            0.0
        };

        // Relative to the configured capacity, not a fixed size.
        let buffer_utilization = match self.buffer_usage_history.last() {
            Some(&occupied) if self.buffer_capacity > 0 => {
                occupied as f64 / self.buffer_capacity as f64
            }
            _ => 0.0,
        };

        let avg_wait_time = if self.completed_jobs > 0 {
            self.total_wait_time() / self.completed_jobs as f64
        } else {
            0.0
        };

        let jobs_per_minute = if elapsed > 0.0 {
            self.total_jobs as f64 / elapsed
        } else {
            0.0
        };

        StatsSnapshot {
            total_jobs: self.total_jobs,
            completed_jobs: self.completed_jobs,
            rejected_jobs: self.rejected_jobs,
            buffered_jobs: self.buffered_jobs,
            server_utilization,
            buffer_utilization,
            avg_wait_time,
            rejection_rate: self.rejection_rate(),
            jobs_per_minute,
        }
    }

    pub fn required_iterations(&self, target: &PrecisionTarget) -> u64 {
        required_iterations(self.rejection_rate(), target)
    }

    pub fn final_report(&self, system_load: f64) -> FinalReport {
        let sources = self
            .sources
            .values()
            .map(|stats| {
                let completed = stats.completed as f64;
                let (t_wait, t_service) = if stats.completed > 0 {
                    (
                        stats.total_wait_time / completed,
                        stats.total_service_time / completed,
                    )
                } else {
                    (0.0, 0.0)
                };
                SourceReport {
                    source_id: stats.source_id,
                    generated: stats.generated,
                    p_reject: stats.rejected as f64 / stats.generated.max(1) as f64,
                    t_system: t_wait + t_service,
                    t_wait,
                    t_service,
                    d_wait: sample_variance(&stats.wait_times),
                    d_service: sample_variance(&stats.service_times),
                }
            })
            .collect();

        let elapsed = self.elapsed();
        let servers = self
            .server_busy_time
            .iter()
            .enumerate()
            .map(|(server_id, busy)| ServerReport {
                server_id,
                utilization: if elapsed > 0.0 { busy / elapsed } else { 0.0 },
            })
            .collect();

        FinalReport {
            sources,
            servers,
            system_load,
        }
    }
}

/// Unbiased sample variance; zero for fewer than two samples
pub(crate) fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

impl StatisticsSink for StatisticsCollector {
    fn record_arrival(&mut self, job: &Job) {
        self.total_jobs += 1;
        self.source_stats(job.source_id).generated += 1;
    }

    fn record_buffered(&mut self, job: &Job) {
        self.buffered_jobs += 1;
        self.source_stats(job.source_id).buffered += 1;
    }

    fn record_dispatched(&mut self, job: &Job, server: ServerId) {
        debug!("[Statistics] {} dispatched to server {}", job, server);
        self.source_stats(job.source_id).dispatched += 1;
    }

    fn record_completed(&mut self, job: &Job) {
        self.completed_jobs += 1;
        let stats = self.source_stats(job.source_id);
        stats.completed += 1;

        if let (Some(started), Some(service)) = (job.cooking_started_at(), job.service_time()) {
            let wait = started - job.arrived_at;
            stats.total_wait_time += wait;
            stats.total_service_time += service;
            stats.wait_times.push(wait);
            stats.service_times.push(service);
        }
    }

    fn record_rejected(&mut self, job: &Job) {
        self.rejected_jobs += 1;
        self.source_stats(job.source_id).rejected += 1;
    }

    fn update_system_state(
        &mut self,
        now: SimulationTime,
        buffer_occupancy: usize,
        busy_servers: usize,
        servers: &[Server],
    ) {
        let delta = (now - self.last_update_time).max(0.0);

        if self.server_busy_time.len() < servers.len() {
            self.server_busy_time.resize(servers.len(), 0.0);
            self.server_states.resize(servers.len(), false);
        }

        // Busy time accrues for the state held since the previous update.
        for (i, server) in servers.iter().enumerate() {
            if self.server_states[i] {
                self.server_busy_time[i] += delta;
            }
            self.server_states[i] = server.is_busy();
        }
        self.last_update_time = self.last_update_time.max(now);

        self.timestamps.push(now);
        self.buffer_usage_history.push(buffer_occupancy);
        self.utilization_history.push(if servers.is_empty() {
            0.0
        } else {
            busy_servers as f64 / servers.len() as f64
        });
        self.wait_time_history.push(if self.completed_jobs > 0 {
            self.total_wait_time() / self.completed_jobs as f64
        } else {
            0.0
        });
        self.rejection_history.push(self.rejected_jobs);
    }

    fn record_interval(
        &mut self,
        now: SimulationTime,
        buffer_occupancy: usize,
        busy_servers: usize,
    ) {
        let (since, arrivals, completions, rejections) = self.last_interval;
        let sample = IntervalSample {
            time: now,
            buffer_occupancy,
            busy_servers,
            arrivals: self.total_jobs - arrivals,
            completions: self.completed_jobs - completions,
            rejections: self.rejected_jobs - rejections,
            throughput: if now > since {
                (self.completed_jobs - completions) as f64 / (now - since)
            } else {
                0.0
            },
        };
        debug!(
            "[Statistics] Interval at {:.2}: {} arrivals, {} completions, {} rejections",
            now, sample.arrivals, sample.completions, sample.rejections
        );
        self.interval_history.push(sample);
        self.last_interval = (now, self.total_jobs, self.completed_jobs, self.rejected_jobs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampler::DistributionSampler;
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

    fn job(n: u8, source: SourceId, arrived_at: f64) -> Job {
        Job::new(JobId::from_random_bytes([n; 16]), source, arrived_at, vec![], String::new())
    }

    #[test]
    fn test_counts_per_source() {
        let mut stats = StatisticsCollector::new(5);
        let a = job(1, 0, 0.0);
        let b = job(2, 1, 0.0);
        stats.record_arrival(&a);
        stats.record_arrival(&b);
        stats.record_rejected(&b);
        assert_eq!(stats.total_jobs(), 2);
        assert_eq!(stats.rejected_jobs(), 1);
        assert_eq!(stats.rejection_rate(), 0.5);
        let report = stats.final_report(1.0);
        assert_eq!(report.sources.len(), 2);
        assert_eq!(report.sources[0].p_reject, 0.0);
        assert_eq!(report.sources[1].p_reject, 1.0);
    }

    #[test]
    fn test_wait_and_service_times() {
        let mut stats = StatisticsCollector::new(5);
        let mut server = Server::new(0, 1.0);
        let mut sampler = FixedSampler(3.0);
        let j = job(1, 0, 1.0);
        stats.record_arrival(&j);
        server.assign(j, 2.0, &mut sampler).unwrap();
        let done = server.complete(5.0).unwrap();
        stats.record_completed(&done);

        let snapshot = stats.current_stats();
        assert_eq!(snapshot.completed_jobs, 1);
        assert_eq!(snapshot.avg_wait_time, 1.0);
        let report = stats.final_report(0.0);
        assert_eq!(report.sources[0].t_wait, 1.0);
        assert_eq!(report.sources[0].t_service, 3.0);
        assert_eq!(report.sources[0].t_system, 4.0);
    }

    #[test]
    fn test_busy_time_integrates_previous_state() {
        let mut stats = StatisticsCollector::new(4);
        let mut servers = vec![Server::new(0, 1.0), Server::new(1, 1.0)];
        let mut sampler = FixedSampler(10.0);

        stats.update_system_state(0.0, 0, 0, &servers);
        servers[0].assign(job(1, 0, 0.0), 0.0, &mut sampler).unwrap();
        stats.update_system_state(0.0, 0, 1, &servers);
        stats.update_system_state(4.0, 2, 1, &servers);

        let report = stats.final_report(0.0);
        assert_eq!(report.servers[0].utilization, 1.0);
        assert_eq!(report.servers[1].utilization, 0.0);
        let snapshot = stats.current_stats();
        assert_eq!(snapshot.server_utilization, 0.5);
        assert_eq!(snapshot.buffer_utilization, 0.5);
        assert_eq!(snapshot.jobs_per_minute, 0.0);
    }

    #[test]
    fn test_empty_collector_is_all_zero() {
        let stats = StatisticsCollector::new(0);
        let snapshot = stats.current_stats();
        assert_eq!(snapshot.server_utilization, 0.0);
        assert_eq!(snapshot.buffer_utilization, 0.0);
        assert_eq!(snapshot.rejection_rate, 0.0);
        assert_eq!(stats.required_iterations(&PrecisionTarget::default()), 1000);
    }

    #[test]
    fn test_interval_samples_count_since_previous() {
        let mut stats = StatisticsCollector::new(4);
        let mut server = Server::new(0, 1.0);
        let mut sampler = FixedSampler(1.0);

        let a = job(1, 0, 0.0);
        stats.record_arrival(&a);
        server.assign(a, 0.0, &mut sampler).unwrap();
        let done = server.complete(1.0).unwrap();
        stats.record_completed(&done);
        stats.record_interval(2.0, 0, 0);

        let b = job(2, 0, 2.5);
        stats.record_arrival(&b);
        stats.record_rejected(&b);
        stats.record_interval(4.0, 1, 1);

        assert_eq!(stats.interval_history.len(), 2);
        let first = &stats.interval_history[0];
        assert_eq!((first.arrivals, first.completions, first.rejections), (1, 1, 0));
        assert_eq!(first.throughput, 0.5);
        let second = &stats.interval_history[1];
        assert_eq!((second.arrivals, second.completions, second.rejections), (1, 0, 1));
        assert_eq!(second.throughput, 0.0);
        assert_eq!((second.buffer_occupancy, second.busy_servers), (1, 1));
    }

    #[test]
    fn test_sample_variance() {
        assert_eq!(sample_variance(&[]), 0.0);
        assert_eq!(sample_variance(&[3.0]), 0.0);
        assert_eq!(sample_variance(&[1.0, 3.0]), 2.0);
    }
}
