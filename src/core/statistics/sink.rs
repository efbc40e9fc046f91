use crate::core::job::Job;
use crate::core::server::Server;
use crate::core::types::{ServerId, SimulationTime};

/// Observer of job lifecycle events.
///
/// The simulator calls these while stepping; a sink only records and never
/// feeds back into simulation state.
pub trait StatisticsSink {
    fn record_arrival(&mut self, job: &Job);

    fn record_buffered(&mut self, job: &Job);

    fn record_dispatched(&mut self, job: &Job, server: ServerId);

    fn record_completed(&mut self, job: &Job);

    fn record_rejected(&mut self, job: &Job);

    /// Called after every processed event with the current occupancy
    fn update_system_state(
        &mut self,
        now: SimulationTime,
        buffer_occupancy: usize,
        busy_servers: usize,
        servers: &[Server],
    );

    /// Called on periodic statistics events only
    fn record_interval(
        &mut self,
        _now: SimulationTime,
        _buffer_occupancy: usize,
        _busy_servers: usize,
    ) {
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatisticsSink for NullSink {
    fn record_arrival(&mut self, _job: &Job) {}
    fn record_buffered(&mut self, _job: &Job) {}
    fn record_dispatched(&mut self, _job: &Job, _server: ServerId) {}
    fn record_completed(&mut self, _job: &Job) {}
    fn record_rejected(&mut self, _job: &Job) {}
    fn update_system_state(
        &mut self,
        _now: SimulationTime,
        _buffer_occupancy: usize,
        _busy_servers: usize,
        _servers: &[Server],
    ) {
    }
}
