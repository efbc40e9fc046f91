use crate::core::buffer::{CircularBuffer, InsertFailure};
use crate::core::job::Job;
use crate::core::sampler::DistributionSampler;
use crate::core::server::Server;
use crate::core::types::{ServerId, SimulationTime};
use log::{debug, error, info, warn};

/// Where an arriving job ended up
#[derive(Debug)]
pub enum Placement {
    /// Started service immediately on this server
    AssignedToServer(ServerId),
    /// Parked in the buffer at this slot
    Buffered(usize),
    /// Took the slot of the oldest buffered job, which is handed back
    ReplacedOldest { position: usize, evicted: Job },
    /// Could not be placed anywhere; the job is handed back
    Rejected(Job),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementStats {
    pub direct_to_server: u64,
    pub to_buffer: u64,
    pub replacements: u64,
    pub rejections: u64,
}

/// Routes arriving jobs: first free server (lowest index wins), then the
/// buffer, then replacement of the oldest buffered job.
#[derive(Debug, Default)]
pub struct PlacementDispatcher {
    stats: PlacementStats,
}

impl PlacementDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &PlacementStats {
        &self.stats
    }

    pub fn route(
        &mut self,
        job: Job,
        buffer: &mut CircularBuffer,
        servers: &mut [Server],
        now: SimulationTime,
        sampler: &mut dyn DistributionSampler,
    ) -> Placement {
        let job = match Self::find_first_free(servers) {
            Some(index) => match servers[index].assign(job, now, sampler) {
                Ok(()) => {
                    self.stats.direct_to_server += 1;
                    return Placement::AssignedToServer(servers[index].id());
                }
                Err(job) => job,
            },
            None => job,
        };

        debug!(
            "[Dispatcher] All {} servers busy, buffer {}/{}",
            servers.len(),
            buffer.len(),
            buffer.capacity()
        );

        if !buffer.is_full() {
            match buffer.insert(job) {
                Ok(insertion) => {
                    self.stats.to_buffer += 1;
                    return Placement::Buffered(insertion.position);
                }
                Err(failure) => {
                    error!(
                        "[Dispatcher] No free slot in non-full buffer ({}/{})",
                        buffer.len(),
                        buffer.capacity()
                    );
                    self.stats.rejections += 1;
                    return Placement::Rejected(failure.job);
                }
            }
        }

        self.handle_buffer_full(job, buffer)
    }

    fn find_first_free(servers: &[Server]) -> Option<usize> {
        servers.iter().position(|s| s.is_available())
    }

    /// Evict the oldest buffered job and put `job` in its place. If the new
    /// job still does not fit, the evicted job is restored and `job` is
    /// rejected.
    fn handle_buffer_full(&mut self, job: Job, buffer: &mut CircularBuffer) -> Placement {
        let evicted = buffer.remove_oldest();
        match (buffer.insert(job), evicted) {
            (Ok(insertion), Some(evicted)) => {
                info!("[Dispatcher] Replaced oldest {} with new job", evicted);
                self.stats.replacements += 1;
                Placement::ReplacedOldest {
                    position: insertion.position,
                    evicted,
                }
            }
            (Ok(insertion), None) => {
                self.stats.to_buffer += 1;
                Placement::Buffered(insertion.position)
            }
            (Err(failure), evicted) => {
                let InsertFailure { job, evicted: inner } = failure;
                self.reject_and_restore(job, evicted.into_iter().chain(inner), buffer)
            }
        }
    }

    /// Return evicted jobs to the buffer and reject `job`
    fn reject_and_restore(
        &mut self,
        job: Job,
        evicted: impl IntoIterator<Item = Job>,
        buffer: &mut CircularBuffer,
    ) -> Placement {
        for old in evicted {
            if let Err(lost) = buffer.restore(old) {
                error!("[Dispatcher] Could not restore evicted {}", lost);
            }
        }
        warn!("[Dispatcher] {} rejected, no room in buffer", job);
        self.stats.rejections += 1;
        Placement::Rejected(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tests::{job, job_id};

    #[test]
    fn test_failed_replacement_restores_evicted_job() {
        let mut buffer = CircularBuffer::new(2);
        buffer.insert(job(1, 1.0)).unwrap();
        buffer.insert(job(2, 2.0)).unwrap();
        let mut dispatcher = PlacementDispatcher::new();

        let evicted = buffer.remove_oldest();
        let placement = dispatcher.reject_and_restore(job(3, 3.0), evicted, &mut buffer);

        match placement {
            Placement::Rejected(job) => assert_eq!(job.id, job_id(3)),
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.peek_oldest().unwrap().id, job_id(1));
        assert_eq!(dispatcher.stats().rejections, 1);
        buffer.check_invariants().unwrap();
    }

    #[test]
    fn test_full_buffer_replaces_oldest() {
        let mut buffer = CircularBuffer::new(1);
        buffer.insert(job(1, 1.0)).unwrap();
        let mut dispatcher = PlacementDispatcher::new();

        match dispatcher.handle_buffer_full(job(2, 2.0), &mut buffer) {
            Placement::ReplacedOldest { position, evicted } => {
                assert_eq!(position, 0);
                assert_eq!(evicted.id, job_id(1));
            }
            other => panic!("expected replacement, got {:?}", other),
        }
        assert_eq!(buffer.len(), 1);
    }
}
