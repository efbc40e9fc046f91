use crate::core::buffer::CircularBuffer;
use crate::core::sampler::DistributionSampler;
use crate::core::server::Server;
use crate::core::types::{JobId, ServerId, SimulationTime};
use log::{debug, error};

/// One buffered job moved into service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    pub server: ServerId,
    pub job_id: JobId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStats {
    pub dispatched_from_buffer: u64,
}

/// Pulls the oldest buffered jobs onto servers that have become free
#[derive(Debug, Default)]
pub struct SelectionDispatcher {
    stats: SelectionStats,
}

impl SelectionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &SelectionStats {
        &self.stats
    }

    /// Pair free servers (in index order) with the oldest buffered jobs until
    /// either runs out. Returns one entry per job moved into service.
    pub fn drain_buffer(
        &mut self,
        buffer: &mut CircularBuffer,
        servers: &mut [Server],
        now: SimulationTime,
        sampler: &mut dyn DistributionSampler,
    ) -> Vec<DispatchResult> {
        let mut moved = Vec::new();

        for server in servers.iter_mut() {
            if buffer.is_empty() {
                break;
            }
            if !server.is_available() {
                continue;
            }
            if let Some(result) = self.dispatch_from_buffer(buffer, server, now, sampler) {
                moved.push(result);
            }
        }

        moved
    }

    fn dispatch_from_buffer(
        &mut self,
        buffer: &mut CircularBuffer,
        server: &mut Server,
        now: SimulationTime,
        sampler: &mut dyn DistributionSampler,
    ) -> Option<DispatchResult> {
        let job = buffer.remove_oldest()?;
        let job_id = job.id;

        match server.assign(job, now, sampler) {
            Ok(()) => {
                debug!(
                    "[Dispatcher] Moved {} from buffer to server {}",
                    job_id.short(),
                    server.id()
                );
                self.stats.dispatched_from_buffer += 1;
                Some(DispatchResult {
                    server: server.id(),
                    job_id,
                })
            }
            Err(job) => {
                // Checked free above, so this only happens on a corrupted server.
                error!(
                    "[Dispatcher] Server {} refused {}, returning it to the buffer",
                    server.id(),
                    job_id.short()
                );
                if let Err(lost) = buffer.restore(job) {
                    error!("[Dispatcher] Could not return {} to the buffer", lost);
                }
                None
            }
        }
    }
}
