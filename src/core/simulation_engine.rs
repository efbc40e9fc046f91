use super::buffer::{BufferSnapshot, CircularBuffer};
use super::dispatch::{Placement, PlacementDispatcher, SelectionDispatcher};
use super::errors::SimulationError;
use super::event::{Event, EventKind};
use super::event_calendar::EventCalendar;
use super::execution::config::{ArrivalDistribution, SimulationConfig};
use super::job::Job;
use super::sampler::{DistributionSampler, SeededSampler};
use super::server::Server;
use super::statistics::{required_iterations, FinalReport, StatisticsCollector, StatisticsSink};
use super::types::{JobId, ServerId, SimulationTime, SourceId};
use log::{debug, info, warn};
use serde::Serialize;

/// How often automatic runs log their progress, in generated jobs
const PROGRESS_EVERY: u64 = 50;

/// Aggregate counters kept by the simulator itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub generated: u64,
    pub completed: u64,
    /// Jobs that ended rejected, including evicted ones
    pub rejected: u64,
    pub buffered: u64,
    pub evicted: u64,
    pub dispatched_from_buffer: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadClass {
    /// rho > 1.2
    Overloaded,
    /// rho < 0.8
    Underloaded,
    Balanced,
}

impl LoadClass {
    pub fn from_load(rho: f64) -> Self {
        if rho > 1.2 {
            LoadClass::Overloaded
        } else if rho < 0.8 {
            LoadClass::Underloaded
        } else {
            LoadClass::Balanced
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub jobs_generated: u64,
    pub simulated_minutes: f64,
    pub system_load: f64,
    pub load_class: LoadClass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerSnapshot {
    pub id: ServerId,
    pub busy: bool,
    pub job: Option<JobId>,
    pub remaining_time: f64,
}

/// Everything a renderer needs after a step
#[derive(Debug, Clone, Serialize)]
pub struct SystemSnapshot {
    pub now: SimulationTime,
    pub step: u64,
    pub upcoming: Vec<Event>,
    pub buffer: BufferSnapshot,
    pub servers: Vec<ServerSnapshot>,
    pub counters: RunCounters,
}

/// Special-events simulator.
///
/// Each [`Simulator::step`] pops the earliest event, moves the clock to it,
/// applies its handler and schedules the follow-up events. Arrivals are
/// self-perpetuating: every arrival schedules the next one from its source.
pub struct Simulator<S: StatisticsSink = StatisticsCollector, R: DistributionSampler = SeededSampler> {
    config: SimulationConfig,
    servers: Vec<Server>,
    buffer: CircularBuffer,
    placement: PlacementDispatcher,
    selection: SelectionDispatcher,
    calendar: EventCalendar,
    sink: S,
    sampler: R,
    now: SimulationTime,
    start_time: SimulationTime,
    step_count: u64,
    counters: RunCounters,
}

impl Simulator<StatisticsCollector, SeededSampler> {
    /// Simulator with the default statistics collector and a sampler seeded
    /// from `config.random_seed`
    pub fn new(config: SimulationConfig) -> Self {
        let sampler = match config.random_seed {
            Some(seed) => SeededSampler::new(seed),
            None => SeededSampler::from_entropy(),
        };
        let sink = StatisticsCollector::new(config.buffer_capacity);
        Self::with_parts(config, sink, sampler)
    }
}

impl<R: DistributionSampler> Simulator<StatisticsCollector, R> {
    pub fn final_report(&self) -> FinalReport {
        self.sink.final_report(self.system_load())
    }
}

impl<S: StatisticsSink, R: DistributionSampler> Simulator<S, R> {
    /// Build a simulator around an explicit sink and sampler and schedule the
    /// first arrival of every source.
    pub fn with_parts(config: SimulationConfig, sink: S, sampler: R) -> Self {
        let servers = (0..config.num_servers)
            .map(|id| Server::new(id, config.mean_service_time))
            .collect();
        let buffer = CircularBuffer::new(config.buffer_capacity);

        let mut simulator = Self {
            config,
            servers,
            buffer,
            placement: PlacementDispatcher::new(),
            selection: SelectionDispatcher::new(),
            calendar: EventCalendar::new(),
            sink,
            sampler,
            now: 0.0,
            start_time: 0.0,
            step_count: 0,
            counters: RunCounters::default(),
        };
        simulator.schedule_initial_events();
        simulator
    }

    fn schedule_initial_events(&mut self) {
        for source_id in 0..self.config.num_sources {
            let offset = self.sampler.uniform(0.0, self.config.initial_arrival_window);
            self.calendar.push(Event::arrival(self.now + offset, source_id));
        }
        if let Some(interval) = self.config.statistics_interval {
            self.schedule_periodic(EventKind::StatisticsUpdate, interval);
        }
        if let Some(interval) = self.config.system_check_interval {
            self.schedule_periodic(EventKind::SystemCheck, interval);
        }
        info!(
            "[Simulator] Initialised: {} sources, {} servers, buffer capacity {}",
            self.config.num_sources,
            self.servers.len(),
            self.buffer.capacity()
        );
    }

    fn schedule_periodic(&mut self, kind: EventKind, interval: f64) {
        if interval > 0.0 {
            self.calendar.push(Event::new(self.now + interval, kind));
        }
    }

    /// Schedule `count` extra arrivals from `source_id` spread uniformly over
    /// `[now, now + window)`. Each of them continues its own arrival chain.
    pub fn schedule_arrival_burst(&mut self, source_id: SourceId, count: usize, window: f64) {
        for _ in 0..count {
            let offset = self.sampler.uniform(0.0, window);
            self.calendar.push(Event::arrival(self.now + offset, source_id));
        }
        info!(
            "[Simulator] Scheduled burst of {} arrivals from source {} within {:.2} min",
            count, source_id, window
        );
    }

    /// Process one event. Returns `Ok(false)` when the calendar is empty.
    pub fn step(&mut self) -> Result<bool, SimulationError> {
        let event = match self.calendar.pop() {
            Some(event) => event,
            None => {
                debug!("[Simulator] No more events in calendar");
                return Ok(false);
            }
        };

        self.now = self.now.max(event.time);
        self.step_count += 1;
        debug!(
            "=== Step {} at {:.3}: {} ===",
            self.step_count,
            self.now,
            event.kind.label()
        );

        match event.kind {
            EventKind::Arrival { source_id } => self.handle_arrival(source_id)?,
            EventKind::Completion { server_id } => self.handle_completion(server_id)?,
            EventKind::StatisticsUpdate => {
                let busy = self.busy_servers();
                self.sink.record_interval(self.now, self.buffer.len(), busy);
                if let Some(interval) = self.config.statistics_interval {
                    self.schedule_periodic(EventKind::StatisticsUpdate, interval);
                }
            }
            EventKind::SystemCheck => {
                self.check_invariants()?;
                if let Some(interval) = self.config.system_check_interval {
                    self.schedule_periodic(EventKind::SystemCheck, interval);
                }
            }
        }

        self.report_state();
        Ok(true)
    }

    fn create_job(&mut self, source_id: SourceId) -> Job {
        let id = JobId::from_random_bytes(self.sampler.random_bytes());
        let item_count = self.sampler.uniform_int(1, 3);
        let items = (0..item_count)
            .map(|_| format!("Item_{}", self.sampler.uniform_int(1, 10)))
            .collect();
        let address = format!("Address_{}", self.sampler.uniform_int(1, 100));
        Job::new(id, source_id, self.now, items, address)
    }

    fn next_arrival_interval(&mut self) -> f64 {
        let mean = self.config.mean_arrival_time;
        match self.config.arrival_distribution {
            ArrivalDistribution::Uniform => {
                let min = (mean - 1.0).max(0.1);
                self.sampler.uniform(min, mean + 1.0)
            }
            ArrivalDistribution::Exponential => self.sampler.exponential(mean),
        }
    }

    fn handle_arrival(&mut self, source_id: SourceId) -> Result<(), SimulationError> {
        let job = self.create_job(source_id);
        debug!("[Simulator] Arrival: {}", job);
        self.counters.generated += 1;
        self.sink.record_arrival(&job);

        let placement = self.placement.route(
            job,
            &mut self.buffer,
            &mut self.servers,
            self.now,
            &mut self.sampler,
        );

        match placement {
            Placement::AssignedToServer(server_id) => {
                if let Some(job) = self.servers[server_id].current_job() {
                    self.sink.record_dispatched(job, server_id);
                }
                self.schedule_completion(server_id);
            }
            Placement::Buffered(position) => {
                self.counters.buffered += 1;
                if let Some(job) = self.buffer.slot(position) {
                    self.sink.record_buffered(job);
                }
            }
            Placement::ReplacedOldest {
                position,
                mut evicted,
            } => {
                evicted.reject();
                self.counters.evicted += 1;
                self.counters.rejected += 1;
                self.sink.record_rejected(&evicted);

                self.counters.buffered += 1;
                if let Some(job) = self.buffer.slot(position) {
                    self.sink.record_buffered(job);
                }
            }
            Placement::Rejected(mut job) => {
                job.reject();
                self.counters.rejected += 1;
                self.sink.record_rejected(&job);
                // A rejection with room left means the slot array is corrupted.
                if self.buffer.len() < self.buffer.capacity() {
                    return Err(SimulationError::NoFreeSlot {
                        capacity: self.buffer.capacity(),
                        count: self.buffer.len(),
                    });
                }
            }
        }

        let interval = self.next_arrival_interval();
        self.calendar.push(Event::arrival(self.now + interval, source_id));
        Ok(())
    }

    fn handle_completion(&mut self, server_id: ServerId) -> Result<(), SimulationError> {
        let server = self
            .servers
            .get_mut(server_id)
            .ok_or(SimulationError::UnknownServer(server_id))?;

        if !server.is_due(self.now) {
            warn!(
                "[Simulator] Completion event for server {} fired before its completion time",
                server_id
            );
        }

        if let Some(job) = server.complete(self.now) {
            self.counters.completed += 1;
            self.sink.record_completed(&job);
        }

        let moved = self.selection.drain_buffer(
            &mut self.buffer,
            std::slice::from_mut(&mut self.servers[server_id]),
            self.now,
            &mut self.sampler,
        );

        for result in moved {
            self.counters.dispatched_from_buffer += 1;
            if let Some(job) = self.servers[result.server].current_job() {
                self.sink.record_dispatched(job, result.server);
            }
            self.schedule_completion(result.server);
        }
        Ok(())
    }

    fn schedule_completion(&mut self, server_id: ServerId) {
        if let Some(done) = self.servers[server_id].completion_time() {
            self.calendar.push(Event::completion(done, server_id));
        }
    }

    fn report_state(&mut self) {
        let busy = self.busy_servers();
        self.sink
            .update_system_state(self.now, self.buffer.len(), busy, &self.servers);
    }

    /// Verify buffer and server invariants
    pub fn check_invariants(&self) -> Result<(), SimulationError> {
        self.buffer.check_invariants()?;
        match self.servers.iter().find(|s| !s.is_consistent()) {
            Some(server) => Err(SimulationError::ServerCorrupted(server.id())),
            None => Ok(()),
        }
    }

    /// Observed rejection probability so far
    pub fn rejection_rate(&self) -> f64 {
        self.counters.rejected as f64 / self.counters.generated.max(1) as f64
    }

    /// Step until `target_jobs` new jobs have been generated or the calendar
    /// runs dry. With `use_precision_target` the target is raised to the job
    /// count required by the configured precision.
    pub fn run_automatic(
        &mut self,
        target_jobs: u64,
        use_precision_target: bool,
    ) -> Result<RunSummary, SimulationError> {
        let mut target = target_jobs;
        if use_precision_target {
            let required = required_iterations(self.rejection_rate(), &self.config.precision);
            info!(
                "[Simulator] Precision target: delta {} at t_alpha {}, {} jobs required",
                self.config.precision.delta, self.config.precision.t_alpha, required
            );
            target = target.max(required);
        }

        info!("[Simulator] Automatic run started, target {} jobs", target);
        let start_count = self.counters.generated;
        let start_time = self.now;
        let mut last_logged = start_count;

        while self.counters.generated - start_count < target {
            if !self.step()? {
                break;
            }
            let generated = self.counters.generated;
            if generated != last_logged && generated % PROGRESS_EVERY == 0 {
                last_logged = generated;
                let done = generated - start_count;
                info!(
                    "[Simulator] Progress: {:.1}% ({}/{} jobs)",
                    done as f64 / target.max(1) as f64 * 100.0,
                    done,
                    target
                );
            }
        }

        let system_load = self.system_load();
        let summary = RunSummary {
            jobs_generated: self.counters.generated - start_count,
            simulated_minutes: self.now - start_time,
            system_load,
            load_class: LoadClass::from_load(system_load),
        };
        info!(
            "[Simulator] Automatic run completed: {} jobs over {:.1} min, rho {:.3} ({:?})",
            summary.jobs_generated, summary.simulated_minutes, summary.system_load, summary.load_class
        );
        Ok(summary)
    }

    /// Input intensity over output intensity; zero while undefined
    pub fn system_load(&self) -> f64 {
        let elapsed = self.now - self.start_time;
        if elapsed.is_nan() || elapsed <= 0.0 {
            return 0.0;
        }
        let input = self.counters.generated as f64 / elapsed;
        let output = (self.counters.completed + self.counters.rejected) as f64 / elapsed;
        if output == 0.0 {
            return 0.0;
        }
        input / output
    }

    pub fn snapshot(&self, upcoming: usize) -> SystemSnapshot {
        SystemSnapshot {
            now: self.now,
            step: self.step_count,
            upcoming: self.calendar.upcoming(upcoming),
            buffer: self.buffer.snapshot(),
            servers: self
                .servers
                .iter()
                .map(|s| ServerSnapshot {
                    id: s.id(),
                    busy: s.is_busy(),
                    job: s.current_job().map(|j| j.id),
                    remaining_time: s.remaining_time(self.now),
                })
                .collect(),
            counters: self.counters,
        }
    }

    pub fn busy_servers(&self) -> usize {
        self.servers.iter().filter(|s| s.is_busy()).count()
    }

    pub fn now(&self) -> SimulationTime {
        self.now
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn buffer(&self) -> &CircularBuffer {
        &self.buffer
    }

    pub fn calendar(&self) -> &EventCalendar {
        &self.calendar
    }

    pub fn placement_dispatcher(&self) -> &PlacementDispatcher {
        &self.placement
    }

    pub fn selection_dispatcher(&self) -> &SelectionDispatcher {
        &self.selection
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
