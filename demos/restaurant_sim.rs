use kitchen_sim::core::execution::run_replicas;
use kitchen_sim::{ArrivalDistribution, ConcurrencyMode, SimulationConfig, Simulator, SystemSnapshot};
use log::info;

/// Number of events stepped by hand before the automatic run
const MANUAL_STEPS: usize = 8;

fn print_snapshot(snapshot: &SystemSnapshot) {
    println!("--- Step {} at {:.2} min ---", snapshot.step, snapshot.now);
    for event in &snapshot.upcoming {
        println!("  next: {:>8.2}  {}", event.time, event.kind.label());
    }
    let slots: Vec<String> = snapshot
        .buffer
        .slots
        .iter()
        .map(|slot| match slot {
            Some(id) => id.short(),
            None => "--------".to_string(),
        })
        .collect();
    println!(
        "  buffer [{}] ({}/{})",
        slots.join(" | "),
        snapshot.buffer.count,
        snapshot.buffer.capacity
    );
    for server in &snapshot.servers {
        match server.job {
            Some(id) => println!(
                "  K{}: cooking {} ({:.2} min left)",
                server.id,
                id.short(),
                server.remaining_time
            ),
            None => println!("  K{}: idle", server.id),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    println!("Starting restaurant kitchen simulation");

    let config = SimulationConfig::new()
        .with_sources(2)
        .with_servers(3)
        .with_buffer_capacity(5)
        .with_mean_arrival_time(2.0)
        .with_mean_service_time(5.0)
        .with_arrival_distribution(ArrivalDistribution::Exponential)
        .with_statistics_interval(Some(10.0))
        .with_system_check_interval(Some(30.0));
    config.validate()?;

    println!("Configuration:");
    println!(
        "  sources={}, cooks={}, buffer={}",
        config.num_sources, config.num_servers, config.buffer_capacity
    );
    println!(
        "  mean arrival={:.1} min ({:?}), mean service={:.1} min",
        config.mean_arrival_time, config.arrival_distribution, config.mean_service_time
    );
    println!();

    let mut sim = Simulator::new(config.clone());

    for _ in 0..MANUAL_STEPS {
        if !sim.step()? {
            break;
        }
        print_snapshot(&sim.snapshot(3));
    }

    // Lunch rush: a burst of orders from the first source.
    sim.schedule_arrival_burst(0, 6, 3.0);
    let summary = sim.run_automatic(500, true)?;
    sim.check_invariants()?;

    let stats = sim.sink().current_stats();
    info!(
        "Orders: {} total, {} completed, {} rejected ({:.1}%)",
        stats.total_jobs,
        stats.completed_jobs,
        stats.rejected_jobs,
        stats.rejection_rate * 100.0
    );
    info!(
        "Utilization: cooks {:.1}%, buffer {:.1}%, avg wait {:.2} min",
        stats.server_utilization * 100.0,
        stats.buffer_utilization * 100.0,
        stats.avg_wait_time
    );
    info!(
        "Run: {} orders over {:.1} min, load {:.3} ({:?})",
        summary.jobs_generated, summary.simulated_minutes, summary.system_load, summary.load_class
    );
    sim.final_report().log();

    println!();
    println!("Replica batch");
    let seeds: Vec<u64> = (1..=8).collect();
    let batch = run_replicas(
        &config.with_concurrency(ConcurrencyMode::Rayon),
        &seeds,
        1000,
    )?;
    for replica in &batch.replicas {
        println!(
            "  seed {:>2}: P_reject {:.3}, load {:.3}",
            replica.seed, replica.rejection_rate, replica.summary.system_load
        );
    }
    println!(
        "  mean P_reject {:.4}, variance {:.6}",
        batch.mean_rejection_rate, batch.rejection_rate_variance
    );

    Ok(())
}
