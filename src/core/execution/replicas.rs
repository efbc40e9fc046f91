use super::config::{ConcurrencyMode, SimulationConfig};
use crate::core::errors::SimulationError;
use crate::core::simulation_engine::{RunSummary, Simulator};
use crate::core::statistics::collector::sample_variance;
use log::info;
use rayon::prelude::*;
use serde::Serialize;

/// Outcome of one independent replica
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicaSummary {
    pub seed: u64,
    pub summary: RunSummary,
    pub completed: u64,
    pub rejected: u64,
    pub rejection_rate: f64,
}

/// Results of a replica batch, in seed order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicaBatch {
    pub replicas: Vec<ReplicaSummary>,
    pub mean_rejection_rate: f64,
    pub rejection_rate_variance: f64,
}

fn run_replica(
    config: &SimulationConfig,
    seed: u64,
    target_jobs: u64,
) -> Result<ReplicaSummary, SimulationError> {
    let mut simulator = Simulator::new(config.clone().with_random_seed(Some(seed)));
    let summary = simulator.run_automatic(target_jobs, false)?;
    let counters = *simulator.counters();
    Ok(ReplicaSummary {
        seed,
        summary,
        completed: counters.completed,
        rejected: counters.rejected,
        rejection_rate: simulator.rejection_rate(),
    })
}

/// Run one simulator per seed and aggregate the rejection-rate estimate.
///
/// Every replica owns its own servers, buffer, calendar, sampler and
/// collector; nothing is shared between them.
pub fn run_replicas(
    config: &SimulationConfig,
    seeds: &[u64],
    target_jobs: u64,
) -> Result<ReplicaBatch, SimulationError> {
    info!(
        "[Replicas] Running {} replicas of {} jobs ({:?})",
        seeds.len(),
        target_jobs,
        config.concurrency_mode
    );

    let replicas: Vec<ReplicaSummary> = match config.concurrency_mode {
        ConcurrencyMode::Sequential => seeds
            .iter()
            .map(|&seed| run_replica(config, seed, target_jobs))
            .collect::<Result<_, _>>()?,
        ConcurrencyMode::Rayon => {
            let run_all = || {
                seeds
                    .par_iter()
                    .map(|&seed| run_replica(config, seed, target_jobs))
                    .collect::<Result<Vec<_>, _>>()
            };
            match config.thread_pool_size {
                Some(threads) => rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| SimulationError::InvalidConfig(e.to_string()))?
                    .install(run_all)?,
                None => run_all()?,
            }
        }
    };

    let rates: Vec<f64> = replicas.iter().map(|r| r.rejection_rate).collect();
    let mean_rejection_rate = if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    };

    Ok(ReplicaBatch {
        rejection_rate_variance: sample_variance(&rates),
        mean_rejection_rate,
        replicas,
    })
}
